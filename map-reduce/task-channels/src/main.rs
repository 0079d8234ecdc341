// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

mod jobs;
mod task_worker;

use clap::Parser;
use jobs::{GroupJob, MapJob};
use map_reduce_core::cli::RunArgs;
use map_reduce_core::config::available_workers;
use map_reduce_core::error::Result;
use map_reduce_core::orchestrator::Orchestrator;
use map_reduce_core::telemetry::init_tracing;
use std::process::ExitCode;
use std::sync::Arc;
use task_worker::TaskWorker;
use tokio::signal;
use tracing::{error, info, warn};

/// Word count with map and group workers running as tokio tasks
#[derive(Parser)]
#[command(name = "map-reduce-task-channels", version)]
struct Cli {
    #[command(flatten)]
    run: RunArgs,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.run.verbose);

    match run(cli.run).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Word count failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: RunArgs) -> Result<()> {
    let config = args.load_config()?;
    let options = args.run_options(&config, available_workers())?;
    info!(
        workers = options.num_workers,
        grouping = %options.grouping,
        strategy = ?options.partition_strategy,
        base_dir = %config.base_dir.display(),
        "=== MAP-REDUCE WORD COUNT (tokio tasks) ==="
    );

    let base_dir = Arc::new(config.base_dir.clone());
    let map_factory = move |worker_id: usize| -> Result<TaskWorker<MapJob>> {
        Ok(TaskWorker::spawn(worker_id, MapJob::new(base_dir.clone())))
    };
    let group_factory = |worker_id: usize| -> Result<TaskWorker<GroupJob>> {
        Ok(TaskWorker::spawn(worker_id, GroupJob))
    };

    let orchestrator = Orchestrator::new(options, map_factory, group_factory);

    // Setup Ctrl+C handler
    let ctrl_c_token = orchestrator.cancellation_token();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            warn!("Ctrl+C received, initiating shutdown");
            ctrl_c_token.cancel();
        }
    });

    let report = orchestrator.run(args.files).await?;
    report.print_summary(config.top_words);
    Ok(())
}
