use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dbt_rpc_runner::cli::{Cli, Command};
use dbt_rpc_runner::rpc::RpcClient;
use dbt_rpc_runner::ui::{JobProgress, print_tasks};
use dbt_rpc_runner::{JobRequest, JobRunner, PollSettings, RunnerConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = match &cli.config {
        Some(path) => RunnerConfig::load_from(path),
        None => RunnerConfig::load(),
    }
    .context("failed to load configuration")?;
    if let Some(url) = &cli.endpoint {
        config.apply_endpoint_override(url);
    }

    match &cli.command {
        Command::Run {
            log_level,
            poll_interval_ms,
            max_wait_secs,
            ..
        } => {
            if let Some(level) = log_level {
                config.log_level = (*level).into();
            }
            if let Some(ms) = poll_interval_ms {
                config.poll_interval_ms = *ms;
            }
            if max_wait_secs.is_some() {
                config.max_wait_secs = *max_wait_secs;
            }
            config.validate()?;

            let request = cli
                .command
                .job_request()
                .context("run command without a task")?;
            run(&config, request, cli.verbose).await
        }
        Command::Ps { all } => {
            let runner = JobRunner::new(connect(&config).await?, PollSettings::from_config(&config));
            let rows = runner.list(*all).await?;
            print_tasks(&rows);
            Ok(())
        }
        Command::Probe => {
            let client = connect(&config).await?;
            println!("{}", client.url());
            Ok(())
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "dbt_rpc_runner=debug"
    } else {
        "dbt_rpc_runner=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn connect(config: &RunnerConfig) -> Result<RpcClient> {
    RpcClient::connect(&config.endpoints, config.transport())
        .await
        .context("failed to reach the dbt RPC server")
}

async fn run(config: &RunnerConfig, request: JobRequest, verbose: bool) -> Result<()> {
    let runner = JobRunner::new(connect(config).await?, PollSettings::from_config(config));

    let cancel = runner.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, stopping (the remote job keeps running)");
            cancel.cancel();
        }
    });

    info!(task = %request.task, level = %config.log_level, "starting job");
    let mut progress = JobProgress::start(&request);
    match runner.execute(&request, &mut progress).await {
        Ok(report) => {
            progress.complete(&report);
            if verbose {
                progress.print_report(&report);
            }
            if !report.succeeded() {
                bail!("{} finished in state `{}`", report.task, report.final_state);
            }
            Ok(())
        }
        Err(err) => {
            progress.abort(&err);
            Err(err.into())
        }
    }
}
