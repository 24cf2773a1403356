use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use acid_harness::logging::init_logging;
use acid_harness::{Harness, HarnessConfig, ScenarioId, Sleeper, VirtualClock};
use acid_memstore::{IsolationMode, MemoryStore};
use acid_types::TransactionalStore;
use tracing::info;

#[derive(Debug, Default, PartialEq, Eq)]
struct CliConfig {
    config_path: Option<PathBuf>,
    isolation: Option<IsolationMode>,
    pool_size: Option<usize>,
    seed: Option<u64>,
    scenarios: Vec<String>,
    settle_ms: Option<u64>,
    virtual_delays: bool,
    report_json: Option<PathBuf>,
    log_dir: Option<PathBuf>,
    verbose: bool,
    list: bool,
}

fn print_help() {
    let help = "\
acid-verify: run the isolation-anomaly scenario catalog against the in-memory store

USAGE:
    acid-verify [OPTIONS]

OPTIONS:
    --config <PATH>          TOML harness configuration
    --isolation <MODE>       serializable|snapshot-isolation|read-uncommitted (default serializable)
    --pool-size <N>          Worker threads (default 8)
    --seed <N>               Base seed, decimal or 0x-prefixed hex
    --scenario <NAME>        Run only this scenario; repeatable
    --settle-ms <N>          Pause before and after each wipe (default 3000)
    --virtual-delays         Record in-transaction delays instead of sleeping
    --report-json <PATH>     Write the JSON report to PATH
    --log-dir <PATH>         Also write JSON-lines logs under PATH
    --list                   Print the scenario catalog and exit
    -v, --verbose            Debug-level logging
    -h, --help               Show this help

EXIT STATUS:
    0 every scenario passed, 1 at least one did not, 2 usage or setup error
";
    println!("{help}");
}

fn parse_u64(flag: &str, value: &str) -> Result<u64, String> {
    let parsed = match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => value.parse::<u64>(),
    };
    parsed.map_err(|_| format!("invalid {flag} value: {value}"))
}

fn parse_args(args: &[String]) -> Result<CliConfig, String> {
    let mut config = CliConfig::default();

    let mut index = 0;
    while index < args.len() {
        let flag = args[index].as_str();
        let mut value = || {
            index += 1;
            args.get(index)
                .cloned()
                .ok_or_else(|| format!("{flag} requires a value"))
        };
        match flag {
            "--config" => config.config_path = Some(PathBuf::from(value()?)),
            "--isolation" => {
                let raw = value()?;
                config.isolation = Some(IsolationMode::parse(&raw).ok_or_else(|| {
                    format!(
                        "invalid --isolation value: {raw} (expected serializable|snapshot-isolation|read-uncommitted)"
                    )
                })?);
            }
            "--pool-size" => {
                let raw = value()?;
                config.pool_size = Some(
                    raw.parse::<usize>()
                        .map_err(|_| format!("invalid --pool-size value: {raw}"))?,
                );
            }
            "--seed" => config.seed = Some(parse_u64(flag, &value()?)?),
            "--scenario" => {
                let raw = value()?;
                if ScenarioId::from_name(&raw).is_none() {
                    return Err(format!("unknown scenario: {raw}"));
                }
                config.scenarios.push(raw);
            }
            "--settle-ms" => config.settle_ms = Some(parse_u64(flag, &value()?)?),
            "--report-json" => config.report_json = Some(PathBuf::from(value()?)),
            "--log-dir" => config.log_dir = Some(PathBuf::from(value()?)),
            "--virtual-delays" => config.virtual_delays = true,
            "--list" => config.list = true,
            "-v" | "--verbose" => config.verbose = true,
            "-h" | "--help" => {
                print_help();
                return Err(String::new());
            }
            unknown => return Err(format!("unknown option: {unknown}")),
        }
        index += 1;
    }
    Ok(config)
}

/// File configuration with command-line flags layered on top.
fn harness_config(cli: &CliConfig) -> Result<HarnessConfig, String> {
    let mut config = match &cli.config_path {
        Some(path) => HarnessConfig::load(path).map_err(|e| e.to_string())?,
        None => HarnessConfig::default(),
    };
    if let Some(pool_size) = cli.pool_size {
        config.pool_size = pool_size;
    }
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }
    if let Some(settle_ms) = cli.settle_ms {
        config.settle_delay_ms = settle_ms;
    }
    if !cli.scenarios.is_empty() {
        config.scenarios = Some(cli.scenarios.clone());
    }
    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

fn print_catalog(config: &HarnessConfig) -> Result<(), String> {
    let catalog = config.catalog().map_err(|e| e.to_string())?;
    for scenario in catalog.iter() {
        let plan = &scenario.plan;
        println!(
            "{:<12} {:<28} writers={} readers={} rounds={} delay_ms={} pairs={}",
            scenario.id.name(),
            scenario.id.anomaly(),
            plan.writers,
            plan.readers,
            plan.rounds,
            plan.delay_ms,
            plan.pairs
        );
    }
    Ok(())
}

fn run(args: &[String]) -> Result<bool, String> {
    let cli = parse_args(args)?;
    let config = harness_config(&cli)?;
    if cli.list {
        print_catalog(&config)?;
        return Ok(true);
    }

    let _log_guard = init_logging(cli.log_dir.as_deref(), cli.verbose).map_err(|e| e.to_string())?;

    let mode = cli.isolation.unwrap_or(IsolationMode::Serializable);
    let store: Arc<dyn TransactionalStore> = Arc::new(MemoryStore::new(mode));
    let mut harness = Harness::new(store, &config).map_err(|e| e.to_string())?;
    if cli.virtual_delays {
        harness = harness.with_sleeper(Arc::new(VirtualClock::new()) as Arc<dyn Sleeper>);
    }

    let report = harness.run();
    println!("{}", report.render_summary());
    if let Some(path) = &cli.report_json {
        report.write_json(path).map_err(|e| e.to_string())?;
        info!(path = %path.display(), "report written");
    }
    Ok(report.passed())
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().skip(1).collect();
    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(error) if error.is_empty() => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("ERROR acid-verify failed: {error}");
            ExitCode::from(2)
        }
    }
}
