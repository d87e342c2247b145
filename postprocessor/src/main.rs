use anyhow::bail;
use clap::Parser;
use generator::project::{generate_project, SyntheticProjectConfig};
use log::{error, info};
use sarmapcore::telemetry::MetricsRecorder;
use std::path::PathBuf;
use std::time::Instant;
use workflow::config::WorkflowConfig;
use workflow::partition::{discover_projects, partition};
use workflow::runner::{ProjectOutcome, Runner};

mod generator;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Turns simulated projects into MSF/SAR image datasets")]
struct Args {
    /// Directory containing the `project*` folders
    #[arg(long)]
    root: Option<PathBuf>,
    #[arg(long, default_value_t = 0)]
    job_id: usize,
    #[arg(long, default_value_t = 1)]
    n_jobs: usize,
    /// Cluster partition the job runs on, only logged
    #[arg(long, default_value_t = 0)]
    partition_id: usize,
    /// Load a workflow config from YAML
    #[arg(long)]
    workflow: Option<PathBuf>,
    /// Number of random excitations per project
    #[arg(long)]
    samples: Option<usize>,
    #[arg(long)]
    seed: Option<u64>,
    /// Write a synthetic project into this directory and process it
    #[arg(long)]
    demo: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let workflow_config = match &args.workflow {
        Some(path) => {
            let mut config = WorkflowConfig::load(path)?;
            config.apply_overrides(args.root.clone(), args.samples, args.seed);
            config
        }
        None => WorkflowConfig::from_args(
            args.root.clone().unwrap_or_else(|| WorkflowConfig::default().root),
            args.samples,
            args.seed,
        ),
    };
    info!(
        "job_id = {}, n_jobs = {}, partition_id = {}",
        args.job_id, args.n_jobs, args.partition_id
    );

    let projects = if let Some(dir) = &args.demo {
        let project = dir.join("project_demo");
        generate_project(&project, &SyntheticProjectConfig::default())?;
        info!("synthetic project written to {}", project.display());
        vec![project]
    } else {
        let all = discover_projects(&workflow_config.root)?;
        partition(&all, args.job_id, args.n_jobs)?
    };

    let runner = Runner::new(workflow_config)?;
    let metrics = MetricsRecorder::new();
    for (idx, project) in projects.iter().enumerate() {
        let timer = Instant::now();
        info!(
            "processing project ({}/{}) {}",
            idx + 1,
            projects.len(),
            project.display()
        );
        match runner.process(project) {
            Ok(ProjectOutcome::Processed { samples }) => {
                metrics.record_processed(samples);
                info!(
                    "finished in {:.2} minutes",
                    timer.elapsed().as_secs_f64() / 60.0
                );
            }
            Ok(ProjectOutcome::Skipped) => metrics.record_skipped(),
            Err(err) => {
                metrics.record_error();
                error!("{:#}", err);
            }
        }
    }

    let summary = metrics.snapshot();
    info!(
        "processed {} projects ({} samples), skipped {}, failed {}",
        summary.processed, summary.samples, summary.skipped, summary.errors
    );
    if summary.errors > 0 {
        bail!("{} of {} projects failed", summary.errors, projects.len());
    }
    Ok(())
}
