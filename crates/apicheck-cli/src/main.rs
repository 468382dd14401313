//! apicheck CLI - contract-level HTTP API testing

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use apicheck_core::Config;
use apicheck_runner::{Logger, TestRunner, load};

#[derive(Parser)]
#[command(name = "apicheck")]
#[command(about = "Run sequenced HTTP test cases against an API contract")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, global = true, default_value = "terminal")]
    output: OutputFormat,

    /// Verbose output (request/response and failure detail)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a test set against the contract
    Run {
        /// Config file (default: .apicheck.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Contract path (overrides config)
        #[arg(long)]
        contract: Option<PathBuf>,

        /// Test-set path (overrides config)
        #[arg(long)]
        tests: Option<PathBuf>,

        /// Base URL when a test case has no contextPath (overrides config)
        #[arg(long)]
        base_url: Option<String>,
    },

    /// Initialize config file
    Init,

    /// Check config, contract and test set without sending requests
    Doctor {
        /// Config file (default: .apicheck.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Export JSON Schema for the run report
    Schema,
}

#[derive(Clone, Copy, ValueEnum, PartialEq, Eq)]
enum OutputFormat {
    Terminal,
    Json,
    Silent,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(3)
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    Ok(match path {
        Some(path) => Config::load(path)?,
        None => Config::load_default()?,
    })
}

fn init_tracing(level: &str, verbose: bool, output: OutputFormat) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else if output == OutputFormat::Silent {
        EnvFilter::new("off")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Commands::Run {
            config,
            contract,
            tests,
            base_url,
        } => {
            let mut cfg = load_config(config.as_deref())?;
            if let Some(contract) = contract {
                cfg.contract = contract;
            }
            if let Some(tests) = tests {
                cfg.tests = tests;
            }
            if base_url.is_some() {
                cfg.base_url = base_url;
            }

            init_tracing(&cfg.log_level, cli.verbose, cli.output);

            if cli.output == OutputFormat::Terminal {
                eprintln!("Config:");
                eprintln!("  contract: {}", cfg.contract.display());
                eprintln!("  tests:    {}", cfg.tests.display());
                if let Some(base_url) = &cfg.base_url {
                    eprintln!("  base_url: {base_url}");
                }
                if !cfg.headers.is_empty() {
                    eprintln!("  headers:  {} configured", cfg.headers.len());
                }
                eprintln!();
            }

            let runner = TestRunner::from_config(&cfg, Logger::tracing(cli.verbose))?;
            let test_set = load::load_test_set(&cfg.tests)?;
            let report = runner.run(&test_set)?;

            match cli.output {
                OutputFormat::Terminal => print!("{}", report.to_terminal()),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
                OutputFormat::Silent => {}
            }

            Ok(report.exit_code())
        }

        Commands::Init => {
            let config_path = ".apicheck.toml";
            if Path::new(config_path).exists() {
                eprintln!("{config_path} already exists");
                return Ok(1);
            }

            std::fs::write(config_path, Config::example())?;
            println!("Created {config_path}");
            println!("\nEdit the file to configure:");
            println!("  - contract: path to your OpenAPI-like contract");
            println!("  - tests: path to your test set");
            println!("  - base_url: server to test");
            println!("  - headers: default headers for every request");
            Ok(0)
        }

        Commands::Doctor { config } => {
            println!("apicheck doctor");
            println!("===============\n");

            let cfg = match load_config(config.as_deref()) {
                Ok(cfg) => {
                    println!("[OK] Config");
                    cfg
                }
                Err(e) => {
                    println!("[NG] Config: {e:#}");
                    return Ok(1);
                }
            };

            let mut healthy = true;
            match load::load_contract(&cfg.contract) {
                Ok(contract) => println!(
                    "[OK] Contract ({}): {} paths, {} component schemas",
                    cfg.contract.display(),
                    contract.paths().count(),
                    contract.components().len()
                ),
                Err(e) => {
                    healthy = false;
                    println!("[NG] Contract ({}): {e}", cfg.contract.display());
                }
            }
            match load::load_test_set(&cfg.tests) {
                Ok(set) => println!(
                    "[OK] Test set ({}): {} cases",
                    cfg.tests.display(),
                    set.test_cases.len()
                ),
                Err(e) => {
                    healthy = false;
                    println!("[NG] Test set ({}): {e}", cfg.tests.display());
                }
            }
            for (name, path) in &cfg.canned {
                if let Err(e) = load::load_document(path) {
                    healthy = false;
                    println!("[NG] Canned {name} ({}): {e}", path.display());
                }
            }

            if healthy {
                println!("\nReady to run!");
                Ok(0)
            } else {
                Ok(1)
            }
        }

        Commands::Schema => {
            let schema = apicheck_core::report::generate_schema();
            println!("{schema}");
            Ok(0)
        }
    }
}
