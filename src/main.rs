//! codestd CLI
//!
//! Entry point for the `codestd` command-line tool.

use clap::{Args, Parser, Subcommand, ValueEnum};
use codestd::emit;
use codestd::pipeline::{self, PipelineConfig, PipelineError};
use codestd::ProcessEnv;
use std::fs;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "codestd")]
#[command(about = "Resolve coding-standards configuration for a build", version)]
struct Cli {
    #[command(flatten)]
    inputs: Inputs,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Inputs {
    /// Package defaults layer (default: .codestd/defaults.toml)
    #[arg(long, global = true)]
    defaults: Option<PathBuf>,

    /// Organization layer (default: .codestd/org.toml)
    #[arg(long, global = true)]
    org: Option<PathBuf>,

    /// Project layer (default: codestd.toml)
    #[arg(long, global = true)]
    project: Option<PathBuf>,

    /// Command-line property assignment, highest precedence (repeatable)
    #[arg(short = 'p', long = "property", value_name = "KEY=VALUE", global = true)]
    properties: Vec<String>,

    /// Rule table (default: .codestd/rules.toml)
    #[arg(long, global = true)]
    rules: Option<PathBuf>,

    /// Override file, directive list or editorconfig (repeatable, applied in order)
    #[arg(long = "overrides", value_name = "PATH", global = true)]
    overrides: Vec<PathBuf>,

    /// Treat this as a CI build regardless of environment
    #[arg(long, global = true, conflicts_with = "no_ci")]
    ci: bool,

    /// Treat this as a local build regardless of environment
    #[arg(long, global = true)]
    no_ci: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the effective configuration
    Resolve {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Show the value of one property and where it came from
    Explain {
        /// Property name (case-insensitive)
        key: String,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Check guardrails without loading rules
    Check {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Resolve rule severities for the analyzer front end
    Rules {
        #[arg(long, value_enum, default_value_t = RulesFormat::Globalconfig)]
        format: RulesFormat,

        /// Write to a file instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Run the whole pipeline and print the build plan as JSON
    Plan,
}

#[derive(Clone, Copy, ValueEnum)]
enum RulesFormat {
    Globalconfig,
    Json,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let cfg = pipeline_config(&cli.inputs);

    let result = match cli.command {
        Commands::Resolve { json } => run_resolve(&cfg, json),
        Commands::Explain { key, json } => run_explain(&cfg, &key, json),
        Commands::Check { json } => run_check(&cfg, json),
        Commands::Rules { format, output } => run_rules(&cfg, format, output),
        Commands::Plan => run_plan(&cfg),
    };

    if let Err(e) = result {
        eprintln!("error: {}", e);
        process::exit(e.exit_code());
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_env("CODESTD_LOG").unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .init();
}

fn pipeline_config(inputs: &Inputs) -> PipelineConfig {
    let defaults = PipelineConfig::with_default_paths(&PathBuf::from("."));
    PipelineConfig {
        defaults_path: inputs.defaults.clone().or(defaults.defaults_path),
        org_path: inputs.org.clone().or(defaults.org_path),
        project_path: inputs.project.clone().or(defaults.project_path),
        assignments: inputs.properties.clone(),
        rules_path: inputs.rules.clone().or(defaults.rules_path),
        override_paths: inputs.overrides.clone(),
        explicit_ci: match (inputs.ci, inputs.no_ci) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        },
        probe_env_only: false,
    }
}

fn run_resolve(cfg: &PipelineConfig, json: bool) -> Result<(), PipelineError> {
    let config = pipeline::resolve_config(cfg)?;
    if json {
        println!("{}", config.to_json()?);
    } else {
        print!("{}", emit::render_config_human(&config));
    }
    Ok(())
}

fn run_explain(cfg: &PipelineConfig, key: &str, json: bool) -> Result<(), PipelineError> {
    let config = pipeline::resolve_config(cfg)?;
    let resolved = config.explain(key);
    if json {
        println!("{}", emit::to_json(&resolved)?);
    } else {
        println!("{}", emit::render_explain_human(&resolved));
    }
    Ok(())
}

fn run_check(cfg: &PipelineConfig, json: bool) -> Result<(), PipelineError> {
    let (_, probe, report) = pipeline::check(cfg, &ProcessEnv)?;

    if json {
        println!("{}", emit::to_json(&report)?);
        return Ok(());
    }

    let toolchain = probe
        .toolchain_version
        .map(|v| v.to_string())
        .unwrap_or_else(|| "undetected".to_string());
    match report.required {
        Some(required) => println!("toolchain: {} (>= {} required)", toolchain, required),
        None => println!("toolchain: {} (no minimum enforced)", toolchain),
    }
    match &report.ci.vendor {
        Some(vendor) => println!("ci: yes ({})", vendor),
        None => println!("ci: no"),
    }
    for note in &report.notes {
        println!("note: {}", note);
    }
    println!("guardrails passed");
    Ok(())
}

fn run_rules(
    cfg: &PipelineConfig,
    format: RulesFormat,
    output: Option<PathBuf>,
) -> Result<(), PipelineError> {
    let plan = pipeline::run(cfg, &ProcessEnv)?;
    let rules = plan.rule_severities();

    let rendered = match format {
        RulesFormat::Globalconfig => emit::render_globalconfig(&rules),
        RulesFormat::Json => emit::render_rules_json(&rules)?,
    };

    let written = match output {
        Some(path) => fs::write(&path, rendered).map_err(|source| PipelineError::Io {
            path: path.display().to_string(),
            source,
        }),
        None => {
            print!("{}", rendered);
            Ok(())
        }
    };

    report_warnings(&plan);
    written
}

fn run_plan(cfg: &PipelineConfig) -> Result<(), PipelineError> {
    let plan = pipeline::run(cfg, &ProcessEnv)?;
    println!("{}", emit::to_json(&plan.summary())?);
    report_warnings(&plan);
    Ok(())
}

/// Unknown-rule warnings go to stderr as one batch after the output
fn report_warnings(plan: &codestd::BuildPlan) {
    let warnings = plan.warnings();
    if warnings.is_empty() {
        return;
    }
    eprintln!("{} override(s) named unknown rules:", warnings.len());
    for warning in warnings {
        eprintln!("  warning: {}", warning);
    }
}
