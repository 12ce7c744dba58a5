//! `switchgen` command-line entry point

use anyhow::Context;
use clap::{value_parser, Arg, ArgMatches, Command};
use std::path::PathBuf;
use std::sync::Arc;
use switchgen_core::{RatioCalculator, RunConfig, ScenarioExpander, TargetRatio};
use switchgen_engine::{offline, telemetry, JsonlSink, Orchestrator};

fn cli() -> Command {
    let config_arg = Arg::new("config")
        .long("config")
        .short('c')
        .value_parser(value_parser!(PathBuf))
        .help("Run configuration (.toml, .yaml or .yml); defaults apply when omitted");

    Command::new("switchgen")
        .version(switchgen_engine::VERSION)
        .about("Code-switched sample generation and evaluation engine")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .global(true)
                .help("Log filter used when RUST_LOG is unset"),
        )
        .subcommand(
            Command::new("expand")
                .about("Print the scenario count and scenario records")
                .arg(config_arg.clone())
                .arg(
                    Arg::new("limit")
                        .long("limit")
                        .value_parser(value_parser!(usize))
                        .help("Print at most this many records"),
                ),
        )
        .subcommand(
            Command::new("ratio")
                .about("Score text against a target code-switching ratio")
                .arg(
                    Arg::new("matrix")
                        .long("matrix")
                        .default_value("Arabic")
                        .help("Matrix (first) language"),
                )
                .arg(
                    Arg::new("embedded")
                        .long("embedded")
                        .default_value("English")
                        .help("Embedded (second) language"),
                )
                .arg(
                    Arg::new("target")
                        .long("target")
                        .default_value("30%")
                        .value_parser(value_parser!(TargetRatio))
                        .help("Target embedded-language share, e.g. 30%"),
                )
                .arg(
                    Arg::new("text")
                        .required(true)
                        .num_args(1..)
                        .help("Text units to score"),
                ),
        )
        .subcommand(
            Command::new("dry-run")
                .about("Run the engine offline with scripted collaborators")
                .arg(config_arg)
                .arg(
                    Arg::new("output")
                        .long("output")
                        .short('o')
                        .value_parser(value_parser!(PathBuf))
                        .help("Output directory; overrides the configured one"),
                )
                .arg(
                    Arg::new("score")
                        .long("score")
                        .default_value("9.0")
                        .value_parser(value_parser!(f64))
                        .help("Score returned by every scripted judge"),
                ),
        )
}

fn load_config(args: &ArgMatches) -> anyhow::Result<RunConfig> {
    match args.get_one::<PathBuf>("config") {
        Some(path) => RunConfig::load(path)
            .with_context(|| format!("loading configuration from {}", path.display())),
        None => Ok(RunConfig::default()),
    }
}

fn expand(args: &ArgMatches, config: &RunConfig) -> anyhow::Result<()> {
    let expander = ScenarioExpander::new(&config.scenarios)?;
    let limit = args.get_one::<usize>("limit").copied().unwrap_or(usize::MAX);

    println!("{} scenarios", expander.scenario_count());
    for parameters in expander.iter().take(limit) {
        println!("{}", serde_json::to_string(&parameters)?);
    }
    Ok(())
}

fn ratio(args: &ArgMatches) -> anyhow::Result<()> {
    let matrix = args.get_one::<String>("matrix").context("missing --matrix")?;
    let embedded = args.get_one::<String>("embedded").context("missing --embedded")?;
    let target = *args.get_one::<TargetRatio>("target").context("missing --target")?;
    let texts: Vec<&String> = args.get_many::<String>("text").context("missing text")?.collect();

    let assessment = RatioCalculator::assess(texts, matrix, embedded, target);
    println!("{}", serde_json::to_string_pretty(&assessment)?);
    Ok(())
}

async fn dry_run(args: &ArgMatches, config: RunConfig) -> anyhow::Result<()> {
    let score = *args.get_one::<f64>("score").context("missing --score")?;
    let output = args
        .get_one::<PathBuf>("output")
        .cloned()
        .unwrap_or(config.output_dir);

    let sink = Arc::new(JsonlSink::create(&output).await?);
    let orchestrator = Orchestrator::new(
        config.engine,
        Arc::new(offline::ScriptedGenerator),
        offline::scripted_panel(score),
        sink,
    )?;

    let shutdown = orchestrator.shutdown_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, shutting down");
            shutdown.shutdown();
        }
    });

    let report = orchestrator.run_config(&config.scenarios).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    println!("output written to {}", output.display());
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = cli().get_matches();
    let (name, args) = matches.subcommand().context("no subcommand given")?;

    let config = match name {
        "ratio" => RunConfig::default(),
        _ => load_config(args)?,
    };
    let level = args
        .get_one::<String>("log-level")
        .or_else(|| matches.get_one::<String>("log-level"))
        .cloned()
        .unwrap_or_else(|| config.log_level.clone());
    telemetry::init(&level)?;

    match name {
        "expand" => expand(args, &config),
        "ratio" => ratio(args),
        "dry-run" => dry_run(args, config).await,
        other => anyhow::bail!("unknown subcommand {other}"),
    }
}
