// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

mod process_worker;
mod wire;

use clap::Parser;
use map_reduce_core::cli::RunArgs;
use map_reduce_core::config::available_workers;
use map_reduce_core::error::{MapReduceError, Result};
use map_reduce_core::orchestrator::Orchestrator;
use map_reduce_core::telemetry::init_tracing;
use map_reduce_core::types::{Assignment, GroupedCounts, Phase, WordCount};
use process_worker::ProcessWorker;
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::{io, signal};
use tracing::{error, info, warn};

type MapWorker = ProcessWorker<Assignment, Vec<WordCount>>;
type GroupWorker = ProcessWorker<Vec<WordCount>, GroupedCounts>;

/// First argument that switches the binary into worker mode
pub(crate) const WORKER_COMMAND: &str = "worker";

/// Word count with map and group workers running as child processes
#[derive(Parser)]
#[command(name = "map-reduce-process-stdio", version)]
struct Cli {
    #[command(flatten)]
    run: RunArgs,
}

/// Serves a single assignment over stdin/stdout
#[derive(Parser)]
#[command(name = "map-reduce-process-stdio worker")]
struct WorkerCli {
    #[arg(value_enum)]
    role: Phase,

    /// Directory relative file names are resolved against
    #[arg(long, default_value = ".")]
    base_dir: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    if env::args_os().nth(1).is_some_and(|arg| arg == WORKER_COMMAND) {
        let worker = WorkerCli::parse_from(env::args_os().skip(1));
        return serve_worker(worker).await;
    }

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

async fn serve_worker(worker: WorkerCli) -> ExitCode {
    init_tracing(0);
    match wire::serve(worker.role, &worker.base_dir, io::stdin(), io::stdout()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(phase = %worker.role, error = %e, "Worker failed to serve its assignment");
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
        "=== MAP-REDUCE WORD COUNT (child processes) ==="
    );

    let map_base_dir = config.base_dir.clone();
    let map_factory = move |worker_id: usize| -> Result<MapWorker> {
        let program = current_exe(worker_id)?;
        ProcessWorker::spawn(worker_id, Phase::Map, &program, &map_base_dir)
    };
    let group_base_dir = config.base_dir.clone();
    let group_factory = move |worker_id: usize| -> Result<GroupWorker> {
        let program = current_exe(worker_id)?;
        ProcessWorker::spawn(worker_id, Phase::Group, &program, &group_base_dir)
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

fn current_exe(worker_id: usize) -> Result<PathBuf> {
    env::current_exe().map_err(|source| MapReduceError::WorkerSpawn { worker_id, source })
}
