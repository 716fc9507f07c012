use std::path::{Path, PathBuf};

use a11y_probe::config::{load_config, AppConfig};
use a11y_probe::output::{render_suite, OutputFormat};
use a11y_probe::plan::ProbePlan;
use a11y_probe::{metrics, run_plan};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::json;
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// a11yprobe - accessibility probes against live pages
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    /// Enable debug mode
    #[arg(short, long, global = true)]
    debug: bool,

    /// Output format (defaults to the config file's `output.format`, then human)
    #[arg(short, long, value_enum, global = true)]
    output: Option<OutputFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open a page and run every probe of a plan against it
    Run(RunArgs),

    /// Parse and validate a plan without starting a browser
    CheckPlan(CheckPlanArgs),

    /// Print the effective configuration as YAML
    Config,
}

#[derive(Args)]
struct RunArgs {
    /// Page to probe
    #[arg(long)]
    url: String,

    /// Plan file (YAML, or JSON with a .json extension)
    #[arg(long, value_name = "FILE")]
    plan: PathBuf,

    /// Write the report to this file instead of stdout
    #[arg(long, value_name = "FILE")]
    out: Option<PathBuf>,

    /// Print Prometheus metrics to stderr after the run
    #[arg(long)]
    metrics_dump: bool,
}

#[derive(Args)]
struct CheckPlanArgs {
    /// Plan file (YAML, or JSON with a .json extension)
    #[arg(long, value_name = "FILE")]
    plan: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli.log_level, cli.debug)?;
    metrics::register_metrics();

    info!("Starting a11yprobe v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(cli.config.as_deref())
        .await
        .context("Failed to load configuration")?;
    let output = cli
        .output
        .or(config.output.format)
        .unwrap_or_default();

    let result = match cli.command {
        Commands::Run(args) => cmd_run(args, &config, output).await,
        Commands::CheckPlan(args) => cmd_check_plan(args, output).await,
        Commands::Config => cmd_config(&config),
    };

    match result {
        Ok(()) => {
            info!("Command completed successfully");
            Ok(())
        }
        Err(e) => {
            error!("Command failed: {:#}", e);
            std::process::exit(1);
        }
    }
}

fn init_logging(level: &str, debug: bool) -> Result<()> {
    let level = if debug {
        tracing::Level::DEBUG
    } else {
        level.parse().context("Invalid log level")?
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.to_string())),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    Ok(())
}

async fn cmd_run(args: RunArgs, config: &AppConfig, output: OutputFormat) -> Result<()> {
    let plan = ProbePlan::load(&args.plan).await?;
    info!(plan = %args.plan.display(), probes = plan.len(), "loaded plan");

    let report = run_plan(config, &args.url, &plan)
        .await
        .with_context(|| format!("Probe run against {} failed", args.url))?;
    let rendered = render_suite(&report, output)?;

    match args.out {
        Some(out) => {
            let path = resolve_out_path(&out, config.output.dir.as_deref());
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            tokio::fs::write(&path, rendered)
                .await
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            info!("Report written to {}", path.display());
        }
        None => print!("{rendered}"),
    }

    if args.metrics_dump {
        eprintln!("{}", metrics::dump()?);
        eprintln!("{}", metrics::cdp_summary());
    }
    Ok(())
}

async fn cmd_check_plan(args: CheckPlanArgs, output: OutputFormat) -> Result<()> {
    let plan = ProbePlan::load(&args.plan).await?;
    let warnings = plan.validate().unwrap_or_default();
    let summary = json!({
        "plan": args.plan.display().to_string(),
        "probes": plan.len(),
        "interactions": plan.probes.iter().filter(|p| p.interaction.is_some()).count(),
        "warnings": warnings,
    });

    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(&summary)?),
        OutputFormat::Human => {
            println!("plan OK: {} probe(s) in {}", plan.len(), args.plan.display());
            for warning in &warnings {
                println!("warning: {warning}");
            }
        }
    }
    Ok(())
}

fn cmd_config(config: &AppConfig) -> Result<()> {
    print!("{}", serde_yaml::to_string(config)?);
    Ok(())
}

fn resolve_out_path(out: &Path, dir: Option<&Path>) -> PathBuf {
    match dir {
        Some(dir) if out.is_relative() => dir.join(out),
        _ => out.to_path_buf(),
    }
}
