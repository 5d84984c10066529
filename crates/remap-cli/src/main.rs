//! `remap`: apply a rule file to an unpacked archive

use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use remap_core::codec::ModelCodec;
use remap_core::{MissingPolicy, RemapConfig, RemapReport, Remapper};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    Command::new("remap")
        .version(remap_core::VERSION)
        .about("Rename classes, fields and methods across an archive")
        .arg(
            Arg::new("maps")
                .long("maps")
                .value_parser(value_parser!(PathBuf))
                .help("Rule file (YAML)"),
        )
        .arg(
            Arg::new("input")
                .long("input")
                .value_parser(value_parser!(PathBuf))
                .help("Unpacked input archive"),
        )
        .arg(
            Arg::new("output")
                .long("output")
                .value_parser(value_parser!(PathBuf))
                .help("Output archive; defaults to the input"),
        )
        .arg(
            Arg::new("original")
                .long("original")
                .value_parser(value_parser!(PathBuf))
                .help("Keep an untouched copy of the input here"),
        )
        .arg(
            Arg::new("cores")
                .long("cores")
                .value_parser(value_parser!(usize))
                .help("Parallelism, including the main thread"),
        )
        .arg(
            Arg::new("missing")
                .long("missing")
                .help("Missing symbol policy: warn, fail, ignore or verbose"),
        )
        .arg(
            Arg::new("find-parents")
                .long("find-parents")
                .action(ArgAction::SetTrue)
                .help("Report parent classes that declare a renamed method"),
        )
        .arg(
            Arg::new("no-correct-enums")
                .long("no-correct-enums")
                .action(ArgAction::SetTrue)
                .help("Leave enum constant name literals untouched"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file; flags take precedence"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .help("Debug logging"),
        )
}

/// Configuration file overlaid with command-line flags
fn build_config(args: &ArgMatches) -> anyhow::Result<RemapConfig> {
    let mut config = match args.get_one::<PathBuf>("config") {
        Some(path) => RemapConfig::load(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => RemapConfig::default(),
    };

    if let Some(maps) = args.get_one::<PathBuf>("maps") {
        config = config.with_maps(maps);
    }
    if let Some(input) = args.get_one::<PathBuf>("input") {
        config = config.with_input(input);
    }
    if let Some(output) = args.get_one::<PathBuf>("output") {
        config = config.with_output(output);
    }
    if let Some(original) = args.get_one::<PathBuf>("original") {
        config = config.with_original(original);
    }
    if let Some(cores) = args.get_one::<usize>("cores") {
        config = config.with_cores(*cores);
    }
    if let Some(missing) = args.get_one::<String>("missing") {
        config = config.with_missing(MissingPolicy::parse_lenient(missing));
    }
    if args.get_flag("find-parents") {
        config = config.with_find_parents(true);
    }
    if args.get_flag("no-correct-enums") {
        config = config.with_correct_enums(false);
    }
    Ok(config)
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: &ArgMatches) -> anyhow::Result<RemapReport> {
    let config = build_config(args)?;
    tracing::debug!(?config, "configuration");
    Remapper::new(config, ModelCodec)
        .run()
        .context("remapping failed")
}

fn main() -> ExitCode {
    let args = cli().get_matches();
    init_tracing(args.get_flag("verbose"));

    match run(&args) {
        Ok(report) => {
            tracing::info!(
                classes = report.classes,
                renamed_classes = report.renamed_classes,
                renamed_members = report.renamed_members,
                "done"
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
