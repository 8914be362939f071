//! Daemon entry point: wires configuration, the Recorder, the control
//! plane websocket + static file server, and the Scheduler together.

use std::path::PathBuf;
use std::str::FromStr;

use clap::Parser;
use mediawatch::config::Config;
use mediawatch::control;
use mediawatch::errors::{CoreError, CoreResult};
use mediawatch::recorder::Recorder;
use mediawatch::scheduler::Scheduler;
use mediawatch::segment::SegmentArchive;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mediawatchd", about = "Broadcast capture and archive daemon")]
struct Cli {
    #[arg(long)]
    config: Option<PathBuf>,
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

#[tokio::main]
async fn main() -> CoreResult<()> {
    init_logging();
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    let archive = SegmentArchive::new(config.get("INGEST_DATADIR")?);
    std::fs::create_dir_all(archive.root())?;
    std::fs::create_dir_all(archive.tmp_dir())?;
    std::fs::create_dir_all(archive.timelines_dir())?;

    let recorder = Recorder::new(config.clone(), archive, None)?;
    recorder.start().await;

    let timezone_name = config.get("TIMEZONE")?;
    let timezone = chrono_tz::Tz::from_str(&timezone_name)
        .map_err(|_| CoreError::Internal(format!("unknown TIMEZONE '{timezone_name}'")))?;
    let mut scheduler = Scheduler::with_default_triggers(&config, recorder.clone())?;
    scheduler.start(timezone);

    let web_rootdir = config.get("WEB_ROOTDIR")?;
    let listen_addr = format!("{}:{}", config.get("WEB_LISTENADDR")?, config.get("WEB_PORT")?);
    let app = control::router(recorder.clone(), &web_rootdir);

    let listener = tokio::net::TcpListener::bind(&listen_addr).await?;
    tracing::info!(addr = %listen_addr, "listening");

    let serve = axum::serve(listener, app);
    tokio::select! {
        result = serve => {
            if let Err(err) = result {
                tracing::error!(error = %err, "http server exited with error");
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown signal received");
        }
    }

    scheduler.stop();
    recorder.stop().await;
    Ok(())
}
