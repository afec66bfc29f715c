//! # careguard CLI
//!
//! Prescription screening and care-plan generation from the command line.
//!
//! ## Commands
//!
//! - `careguard analyze <FILE>` - Risk analysis only
//! - `careguard generate <FILE> [--provider ID]` - One care plan
//! - `careguard compare <FILE>` - One care plan per registered provider
//! - `careguard providers` - List the provider table
//! - `careguard access-check` - Check which providers answer
//! - `careguard extract <FILE>` - Convert an entity-extraction document into a prescription
//!
//! Results are JSON on stdout. Logs go to stderr.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{debug, info};

use careguard_core::{normalize, DoctorPrescription, ExtractedDocument, RiskEngine};
use careguard_runtime::{
    CarePlanOrchestrator, HttpTransport, ModelTransport, RuntimeConfig, ScriptedReply,
    ScriptedTransport,
};

mod demo;

/// Prescription safety screening and care-plan generation
#[derive(Parser)]
#[command(name = "careguard")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to runtime configuration (YAML)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Answer with a canned care plan instead of calling providers
    #[arg(long, global = true)]
    offline: bool,

    /// Debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Screen a prescription without generating anything
    Analyze {
        /// Prescription file (.json, .yaml, .yml) or - for JSON on stdin
        input: PathBuf,

        /// Input is an entity-extraction document
        #[arg(long)]
        extracted: bool,
    },

    /// Generate a care plan with one provider
    Generate {
        input: PathBuf,

        /// Provider id (defaults to the configured default provider)
        #[arg(short, long)]
        provider: Option<String>,

        #[arg(long)]
        extracted: bool,
    },

    /// Generate a care plan with every provider and compare
    Compare {
        input: PathBuf,

        #[arg(long)]
        extracted: bool,
    },

    /// List registered providers
    Providers,

    /// Send a minimal request to every provider and report which answer
    AccessCheck,

    /// Convert an entity-extraction document into a normalized prescription
    Extract { input: PathBuf },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    let config = load_config(cli.config.as_deref())?;
    debug!(config = ?config, "Loaded configuration");

    match cli.command {
        Commands::Analyze { input, extracted } => {
            let prescription = read_prescription(&input, extracted)?;
            let engine = RiskEngine::with_tables(config.rule_tables()?);
            let analysis = engine.analyze(&prescription);
            print_json(&analysis)?;
            Ok(exit_code(analysis.is_safe))
        }
        Commands::Generate {
            input,
            provider,
            extracted,
        } => {
            let prescription = read_prescription(&input, extracted)?;
            let offline_reply = cli.offline.then(|| demo::care_plan(&prescription));
            let orchestrator = build_orchestrator(config, offline_reply)?;
            let provider = provider.unwrap_or_else(|| orchestrator.default_provider().to_string());
            let result = orchestrator.generate(&prescription, &provider).await?;
            print_json(&result)?;
            Ok(exit_code(result.success))
        }
        Commands::Compare { input, extracted } => {
            let prescription = read_prescription(&input, extracted)?;
            let offline_reply = cli.offline.then(|| demo::care_plan(&prescription));
            let orchestrator = build_orchestrator(config, offline_reply)?;
            let comparison = orchestrator.compare_all(&prescription).await;
            print_json(&comparison)?;
            Ok(exit_code(comparison.success))
        }
        Commands::Providers => {
            let registry = config.registry()?;
            let profiles: Vec<_> = registry.iter().collect();
            print_json(&profiles)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::AccessCheck => {
            let offline_reply = cli.offline.then(|| "Hello".to_string());
            let orchestrator = build_orchestrator(config, offline_reply)?;
            let report = orchestrator.check_access().await;
            print_json(&report)?;
            Ok(exit_code(report.overall_access))
        }
        Commands::Extract { input } => {
            let prescription = read_prescription(&input, true)?;
            print_json(&prescription)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Initialize tracing subscriber on stderr so stdout stays pure JSON.
fn init_logging(verbose: bool) -> Result<()> {
    let level = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<RuntimeConfig> {
    match path {
        Some(path) => RuntimeConfig::from_yaml_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => Ok(RuntimeConfig::default()),
    }
}

fn read_input(input: &Path) -> Result<String> {
    if input == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read stdin")?;
        Ok(buf)
    } else {
        std::fs::read_to_string(input)
            .with_context(|| format!("Failed to read {}", input.display()))
    }
}

fn read_prescription(input: &Path, extracted: bool) -> Result<DoctorPrescription> {
    if extracted {
        let document = ExtractedDocument::from_json(&read_input(input)?)
            .context("Invalid extraction document")?;
        info!(
            medications = document.medications().count(),
            "Converted extraction document"
        );
        return Ok(normalize(&document.to_raw_prescription())?);
    }

    if input == Path::new("-") {
        let raw: serde_json::Value =
            serde_json::from_str(&read_input(input)?).context("stdin is not valid JSON")?;
        return Ok(normalize(&raw)?);
    }

    Ok(careguard_core::normalize_file(input)?)
}

/// Build an orchestrator. With an offline reply, every provider answers with
/// it instead of calling the endpoint.
fn build_orchestrator(
    config: RuntimeConfig,
    offline_reply: Option<String>,
) -> Result<CarePlanOrchestrator> {
    let transport: Arc<dyn ModelTransport> = if let Some(reply) = offline_reply {
        info!("Offline mode: providers answer with a canned reply");
        Arc::new(ScriptedTransport::new().with_fallback(ScriptedReply::text(reply)))
    } else {
        let credential = config
            .credential()
            .context("No API key available (use --offline to run without one)")?;
        Arc::new(HttpTransport::new(
            credential,
            config.endpoint.clone(),
            config.provider_timeout,
        ))
    };

    Ok(CarePlanOrchestrator::builder()
        .config(config)
        .transport(transport)
        .build()?)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_demo_files_load() {
        let demos = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos");
        load_config(Some(&demos.join("careguard.yaml"))).unwrap();

        let engine = RiskEngine::new();
        let safe = read_prescription(&demos.join("bronchitis.json"), false).unwrap();
        assert!(engine.analyze(&safe).is_safe);

        let blocked = read_prescription(&demos.join("allergy_conflict.yaml"), false).unwrap();
        assert!(!engine.analyze(&blocked).is_safe);

        let extracted = read_prescription(&demos.join("extracted.json"), true).unwrap();
        assert_eq!(extracted.prescriptions[0].medication_name, "Amoxicillin");
        assert_eq!(extracted.diagnosis, "Sinusitis");
    }

    #[tokio::test]
    async fn test_offline_access_check() {
        let orchestrator =
            build_orchestrator(RuntimeConfig::default(), Some("Hello".to_string())).unwrap();
        let report = orchestrator.check_access().await;
        assert!(report.overall_access);
        assert_eq!(report.accessible_models, report.total_models);
    }

    #[test]
    fn test_parse_access_check() {
        let cli = Cli::try_parse_from(["careguard", "access-check", "--offline"]).unwrap();
        assert!(matches!(cli.command, Commands::AccessCheck));
    }

    #[test]
    fn test_parse_generate() {
        let cli = Cli::try_parse_from([
            "careguard",
            "generate",
            "rx.json",
            "--provider",
            "nova_micro",
            "--offline",
        ])
        .unwrap();
        assert!(cli.offline);
        match cli.command {
            Commands::Generate { provider, .. } => assert_eq!(provider.as_deref(), Some("nova_micro")),
            _ => panic!("expected generate"),
        }
    }
}
