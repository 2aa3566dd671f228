use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use homecam_api::{ApiClient, Role, StatusPoller};
use homecam_playback::activator::{Activation, RoleActivator, RoleControl};
use homecam_playback::config::ProberConfig;
use homecam_playback::error::PlaybackError;
use homecam_playback::prober::ReadinessProber;
use tokio_util::sync::CancellationToken;
use tracing::Level;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(name = "homecam", version, about = "HomeCam NVR client")]
struct Args {
    /// Base URL of the HomeCam server.
    #[arg(
        long,
        global = true,
        env = "HOMECAM_SERVER",
        default_value = "http://127.0.0.1:8000/"
    )]
    server: String,

    #[arg(short, long, global = true)]
    verbose: bool,

    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List cameras with their playback URLs.
    Cameras,

    /// Start a role if needed and wait until its playlist is servable.
    ///
    /// Exit code 0 when the playlist is ready, 2 when the server (or the
    /// camera's configuration) refused the role, 3 on a readiness timeout.
    Activate { camera_id: u64, role: Role },

    /// Ask the server to start an on-demand role (medium or high).
    Start { camera_id: u64, role: Role },

    /// Ask the server to stop an on-demand role (medium or high).
    Stop { camera_id: u64, role: Role },

    /// Show which roles are actually running on a camera.
    Status {
        camera_id: u64,
        /// Keep polling every 5 seconds until interrupted.
        #[arg(long)]
        watch: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    match run(args).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(1)
        }
    }
}

async fn run(args: Args) -> Result<ExitCode> {
    let client =
        Arc::new(ApiClient::new(&args.server).context("invalid --server base URL")?);

    match args.command {
        Commands::Cameras => {
            let cameras = client.cameras().await?;
            for cam in cameras {
                println!("{:>4}  {}", cam.id, cam.name);
                println!("      grid:    {}", cam.grid_url);
                if let Some(url) = &cam.medium_url {
                    println!("      medium:  {url}");
                }
                if let Some(url) = &cam.high_url {
                    println!("      high:    {url}");
                }
            }
            Ok(ExitCode::SUCCESS)
        }

        Commands::Activate { camera_id, role } => {
            let camera = client
                .admin_camera(camera_id)
                .await
                .with_context(|| format!("camera {camera_id} not found"))?;

            let token = CancellationToken::new();
            let cancel = token.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    cancel.cancel();
                }
            });

            let probe_http = reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(10))
                .build()
                .context("building probe HTTP client")?;
            let activator = RoleActivator::new(
                Arc::clone(&client) as Arc<dyn RoleControl>,
                ReadinessProber::new(Arc::new(probe_http), ProberConfig::default()),
                client.base().clone(),
            );

            match activator
                .activate(camera_id, &camera.name, Some(&camera.roles), role, &token)
                .await
            {
                Ok(Activation::Ready(url)) => {
                    println!("{url}");
                    Ok(ExitCode::SUCCESS)
                }
                Ok(Activation::Rejected(reason)) => {
                    eprintln!("rejected: {reason}");
                    Ok(ExitCode::from(2))
                }
                Ok(Activation::TimedOut) => {
                    eprintln!("timed out waiting for the playlist");
                    Ok(ExitCode::from(3))
                }
                Err(PlaybackError::Cancelled) => {
                    eprintln!("cancelled");
                    Ok(ExitCode::from(130))
                }
                Err(err) => Err(err.into()),
            }
        }

        Commands::Start { camera_id, role } => {
            let resp = client.start_role(camera_id, role).await?;
            report_control(resp)
        }

        Commands::Stop { camera_id, role } => {
            let resp = client.stop_role(camera_id, role).await?;
            report_control(resp)
        }

        Commands::Status { camera_id, watch } => {
            if !watch {
                let status = client.camera_status(camera_id).await?;
                print_status(&status);
                return Ok(ExitCode::SUCCESS);
            }

            let token = CancellationToken::new();
            let poller = StatusPoller::spawn(
                Arc::clone(&client),
                camera_id,
                homecam_api::status::DEFAULT_POLL_INTERVAL,
                token.clone(),
            );
            let mut rx = poller.subscribe();
            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => break,
                    changed = rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        print_status(&rx.borrow());
                    }
                }
            }
            poller.shutdown().await;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn report_control(resp: homecam_api::StartResponse) -> Result<ExitCode> {
    if resp.ok {
        println!("ok");
        Ok(ExitCode::SUCCESS)
    } else {
        eprintln!("refused: {}", resp.reason.as_deref().unwrap_or("no reason given"));
        Ok(ExitCode::from(2))
    }
}

fn print_status(status: &homecam_api::RoleStatus) {
    for role in [Role::Medium, Role::High] {
        let state = if status.is_running(role) { "running" } else { "stopped" };
        println!("{role:<8} {state}");
    }
}

fn init_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .init();
}
