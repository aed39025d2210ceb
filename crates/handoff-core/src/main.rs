use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use handoff_core::simulation::parse_rate;
use handoff_core::{init_tracing, simulate, HandoffConfig, SimulationConfig};
use std::path::PathBuf;
use std::time::Duration;

fn config_arg() -> Arg {
    Arg::new("config")
        .long("config")
        .short('c')
        .value_parser(value_parser!(PathBuf))
        .help("Path to a TOML configuration file")
}

fn load_config(args: &ArgMatches) -> anyhow::Result<HandoffConfig> {
    match args.get_one::<PathBuf>("config") {
        Some(path) => HandoffConfig::load(path)
            .with_context(|| format!("loading {}", path.display())),
        None => Ok(HandoffConfig::default()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Command::new("handoff")
        .version(handoff_core::VERSION)
        .about("Worker-to-human intervention broker and navigation tools")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("simulate")
                .about("Run the worker/responder pipeline simulator")
                .arg(config_arg())
                .arg(
                    Arg::new("workers")
                        .long("workers")
                        .default_value("4")
                        .value_parser(value_parser!(usize))
                        .help("Number of worker threads"),
                )
                .arg(
                    Arg::new("stages")
                        .long("stages")
                        .default_value("25")
                        .value_parser(value_parser!(usize))
                        .help("Pipeline stages per worker"),
                )
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .default_value("42")
                        .value_parser(value_parser!(u64))
                        .help("Random seed for reproducibility"),
                )
                .arg(
                    Arg::new("timeout-ms")
                        .long("timeout-ms")
                        .value_parser(value_parser!(u64))
                        .help("Intervention timeout; defaults to the configured broker timeout or 50"),
                )
                .arg(
                    Arg::new("intervention-rate")
                        .long("intervention-rate")
                        .default_value("0.3")
                        .value_parser(parse_rate)
                        .help("Probability that a stage raises an intervention"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output the report as JSON"),
                ),
        )
        .subcommand(
            Command::new("config")
                .about("Print the effective configuration")
                .arg(config_arg()),
        );

    let matches = cli.get_matches();

    match matches.subcommand() {
        Some(("simulate", args)) => {
            let config = load_config(args)?;
            init_tracing(&config.logging);

            let defaults = SimulationConfig::default();
            let timeout = args
                .get_one::<u64>("timeout-ms")
                .map(|ms| Duration::from_millis(*ms))
                .or(config.broker.default_timeout)
                .unwrap_or(defaults.timeout);
            let sim = SimulationConfig {
                seed: args.get_one::<u64>("seed").copied().unwrap_or(defaults.seed),
                workers: args.get_one::<usize>("workers").copied().unwrap_or(defaults.workers),
                stages_per_worker: args
                    .get_one::<usize>("stages")
                    .copied()
                    .unwrap_or(defaults.stages_per_worker),
                intervention_rate: args
                    .get_one::<f64>("intervention-rate")
                    .copied()
                    .unwrap_or(defaults.intervention_rate),
                timeout,
                ..defaults
            };

            let report = simulate(sim).await;
            if args.get_flag("json") {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", report.generate_text());
            }

            std::process::exit(if report.passed() { 0 } else { 1 });
        }
        Some(("config", args)) => {
            let config = load_config(args)?;
            print!("{}", config.to_toml_string()?);
        }
        _ => unreachable!("clap enforces a subcommand"),
    }

    Ok(())
}
