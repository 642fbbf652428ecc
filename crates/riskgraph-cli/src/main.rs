//! Riskgraph - entity risk profiling CLI
//!
//! ## Commands
//!
//! - `run`: Profile one entity and print the resulting state as JSON
//! - `categories`: List the risk categories and ESG pillars that are analysed

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use riskgraph_core::{
    init_tracing, EsgPillar, OperationalLog, PipelineConfig, PipelineRun, RiskCategory,
    RiskPipeline, RunStatus,
};
use riskgraph_gemini::{GeminiClient, GeminiConfig};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "riskgraph")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Risk, ESG and risk-dependency profiling for listed companies", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline for one entity
    Run {
        /// Entity (company) name
        entity: String,

        /// Worker pool size of each category dispatcher (overrides RISKGRAPH_WORKERS)
        #[arg(long)]
        workers: Option<usize>,

        /// Delay before each risk category call (overrides RISKGRAPH_PACING_SECS)
        #[arg(long)]
        pacing_secs: Option<u64>,

        /// Attempt budget per retry loop (overrides RISKGRAPH_MAX_ATTEMPTS)
        #[arg(long)]
        max_attempts: Option<u32>,

        /// Gemini model
        #[arg(long, env = "RISKGRAPH_MODEL")]
        model: Option<String>,

        /// Write the JSON to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Emit the full run report (stages, failures) instead of the state only
        #[arg(long)]
        report: bool,

        /// Print the operational log after the run
        #[arg(long)]
        show_log: bool,
    },

    /// List risk categories and ESG pillars
    Categories,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    init_tracing(cli.json, level);

    match cli.command {
        Commands::Run {
            entity,
            workers,
            pacing_secs,
            max_attempts,
            model,
            output,
            report,
            show_log,
        } => {
            let mut config = PipelineConfig::from_env();
            if let Some(workers) = workers {
                config = config.with_workers(workers);
            }
            if let Some(secs) = pacing_secs {
                config = config.with_risk_pacing(Duration::from_secs(secs));
            }
            if let Some(attempts) = max_attempts {
                config = config.with_max_attempts(attempts);
            }
            cmd_run(&entity, config, model, output.as_deref(), report, show_log).await
        }
        Commands::Categories => {
            cmd_categories();
            Ok(())
        }
    }
}

async fn cmd_run(
    entity: &str,
    config: PipelineConfig,
    model: Option<String>,
    output: Option<&Path>,
    report: bool,
    show_log: bool,
) -> Result<()> {
    let mut gemini = GeminiConfig::from_env().context("Failed to configure Gemini")?;
    if let Some(model) = model {
        gemini = gemini.with_model(model);
    }
    info!(model = %gemini.model, "using Gemini model");
    let client = GeminiClient::new(gemini).context("Failed to build Gemini client")?;

    let log = Arc::new(OperationalLog::new());
    let pipeline = RiskPipeline::new(Arc::new(client), config).with_observer(log.clone());

    let run = pipeline
        .run_with_report(entity)
        .await
        .context(format!("Pipeline run for '{}' failed", entity))?;

    let json = if report {
        serde_json::to_string_pretty(&run)?
    } else {
        serde_json::to_string_pretty(&run.state)?
    };

    if let Some(path) = output {
        std::fs::write(path, &json).context(format!("Failed to write to {:?}", path))?;
        eprintln!("Wrote {:?}", path);
    } else {
        println!("{}", json);
    }

    print_summary(&run);

    if show_log {
        eprintln!("\nOperational log:");
        eprintln!("{}", log.render());
    }

    if run.status == RunStatus::Failed {
        bail!("run {} failed", run.run_id);
    }
    Ok(())
}

fn print_summary(run: &PipelineRun) {
    eprintln!("\nRun {} ({})", run.run_id, run.status);
    for stage in &run.stages {
        let timing = stage
            .duration_ms
            .map(|ms| format!(" in {ms} ms"))
            .unwrap_or_default();
        eprintln!("  {:<18} {}{}", stage.stage.name(), stage.status, timing);
    }
    for failure in &run.category_failures {
        eprintln!("  ! {}: {}", failure.category, failure.error);
    }
    eprintln!(
        "  {} risk findings, {} ESG findings, {} graph nodes, {} links",
        run.state.risk_findings.len(),
        run.state.esg_findings.len(),
        run.state.dependency_graph.nodes.len(),
        run.state.dependency_graph.links.len()
    );
}

fn cmd_categories() {
    println!("Risk categories:");
    for category in RiskCategory::DISPATCH_ORDER {
        println!("  {}", category);
    }
    println!("ESG pillars:");
    for pillar in EsgPillar::DISPATCH_ORDER {
        println!("  {}", pillar);
    }
}
