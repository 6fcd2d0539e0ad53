use anyhow::{bail, Context};
use clap::Parser;
use generator::profile::build_snapshot;
use gui_bridge::bridge::GuiBridge;
use gui_bridge::model::VisualizationModel;
use skyplotcore::feed::StateSnapshot;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use workflow::config::WorkflowConfig;
use workflow::fetch::{fetch_snapshot, load_snapshot};
use workflow::runner::{RenderOutcome, Runner, WorkflowResult};

mod generator;
mod gui_bridge;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Flight-state scatter plot pipeline driver")]
struct Args {
    /// Render a saved snapshot (JSON as returned by the states endpoint)
    #[arg(long)]
    snapshot: Option<PathBuf>,
    /// Fetch the current snapshot from the upstream feed and render it
    #[arg(long, default_value_t = false)]
    fetch: bool,
    /// Render a seeded synthetic snapshot
    #[arg(long, default_value_t = false)]
    synthetic: bool,
    #[arg(long, default_value_t = 400)]
    flights: usize,
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Load a workflow config from YAML
    #[arg(long)]
    workflow: Option<PathBuf>,
    #[arg(long, default_value_t = 1000, conflicts_with = "workflow")]
    width: u32,
    #[arg(long, default_value_t = 500, conflicts_with = "workflow")]
    height: u32,
    /// Climb/descent rate (m/s) rendered at full color saturation
    #[arg(long, default_value_t = 10.0, conflicts_with = "workflow")]
    vertical_rate_scale: f64,
    /// Override the upstream snapshot URL
    #[arg(long)]
    url: Option<String>,
    /// Override the bridge bind address
    #[arg(long)]
    bind: Option<SocketAddr>,
    /// Write the rendered visualization model as JSON
    #[arg(long)]
    output: Option<PathBuf>,
    /// Keep the GUI bridge alive for the visualizer
    #[arg(long, default_value_t = false)]
    serve: bool,
}

enum Source<'a> {
    File(&'a Path),
    Upstream,
    Synthetic,
}

fn select_source(args: &Args) -> anyhow::Result<Option<Source<'_>>> {
    let mut sources = Vec::new();
    if let Some(path) = args.snapshot.as_deref() {
        sources.push(Source::File(path));
    }
    if args.fetch {
        sources.push(Source::Upstream);
    }
    if args.synthetic {
        sources.push(Source::Synthetic);
    }
    if sources.len() > 1 {
        bail!("choose at most one of --snapshot, --fetch and --synthetic");
    }
    Ok(sources.pop())
}

fn summarize(result: &WorkflowResult) -> String {
    let diagnostics = &result.diagnostics;
    match &result.outcome {
        RenderOutcome::Rendered { projection, .. } => format!(
            "time={:?} accepted={} total={} markers={} emphasized={} missing_alt={} missing_vel={} grounded={}",
            result.snapshot_time,
            diagnostics.accepted,
            diagnostics.total,
            projection.markers.len(),
            projection.emphasized_count(),
            diagnostics.altitude_missing,
            diagnostics.ground_speed_missing,
            diagnostics.grounded
        ),
        RenderOutcome::Empty => format!(
            "time={:?} accepted=0 total={} empty missing_alt={} missing_vel={} grounded={}",
            result.snapshot_time,
            diagnostics.total,
            diagnostics.altitude_missing,
            diagnostics.ground_speed_missing,
            diagnostics.grounded
        ),
    }
}

fn append_report(path: &Path, line: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating report directory {}", parent.display()))?;
    }
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening report {}", path.display()))?;
    writeln!(file, "{line}")?;
    Ok(())
}

fn build_config(args: &Args) -> anyhow::Result<WorkflowConfig> {
    let mut workflow_config = if let Some(path) = &args.workflow {
        WorkflowConfig::load(path)?
    } else {
        WorkflowConfig::from_args(args.width, args.height, args.vertical_rate_scale)
    };
    if let Some(url) = &args.url {
        workflow_config.source_url = url.clone();
    }
    if let Some(bind) = args.bind {
        workflow_config.bind_address = bind;
    }
    workflow_config
        .plot
        .validate()
        .context("validating plot config")?;
    Ok(workflow_config)
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();
    let workflow_config = build_config(&args)?;

    let source = select_source(&args)?;
    if source.is_none() && !args.serve {
        bail!("nothing to do: pass --snapshot, --fetch, --synthetic or --serve");
    }

    let runtime = TokioBuilder::new_multi_thread()
        .enable_all()
        .build()
        .context("creating runtime")?;
    let runner = Arc::new(Runner::new(workflow_config.clone()));
    let gui_bridge = args
        .serve
        .then(|| GuiBridge::new(runner.clone(), workflow_config.bind_address));

    let snapshot: Option<StateSnapshot> = match source {
        Some(Source::File(path)) => Some(load_snapshot(path)?),
        Some(Source::Upstream) => {
            let fetched = runtime.block_on(fetch_snapshot(&workflow_config.source_url));
            if fetched.is_err() {
                runner.record_upstream_failure();
            }
            Some(fetched?)
        }
        Some(Source::Synthetic) => Some(build_snapshot(args.flights, args.seed)?),
        None => None,
    };

    if let Some(snapshot) = snapshot {
        let result = runner.execute(snapshot)?;
        let summary = summarize(&result);
        println!("Render pass -> {summary}");
        if matches!(result.outcome, RenderOutcome::Empty) {
            println!("No usable flight data in this snapshot; nothing to draw.");
        }

        let model = VisualizationModel::from_result(&result);
        if let Some(bridge) = &gui_bridge {
            bridge.publish(&model)?;
            bridge.publish_status("Render pass ready.");
        }
        if let Some(path) = &args.output {
            let json = serde_json::to_string_pretty(&model).context("encoding model")?;
            fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        }
        append_report(&workflow_config.report_path, &summary)?;
    }

    if let Some(bridge) = &gui_bridge {
        bridge.publish_status("HTTP bridge running (Ctrl+C to stop)...");
        runtime.block_on(async {
            signal::ctrl_c().await.context("awaiting Ctrl+C to exit")?;
            Ok::<(), anyhow::Error>(())
        })?;
    }

    Ok(())
}
