use clap::Parser;
use playattest::config::Config;
use playattest::service::{self, AppState};
use std::error::Error;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
enum PlayAttestCli {
    Serve(ServeArgs),
    AuthorityKey(AuthorityKeyArgs),
}

#[derive(Debug, clap::Args)]
#[command(author, version, long_about = None,
    about = "Serve the nonce and check endpoints using the supplied \
    configuration")]
struct ServeArgs {
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    #[arg(short, long, default_value = "0.0.0.0:8080")]
    listen: SocketAddr,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

#[derive(Debug, clap::Args)]
#[command(author, version, long_about = None,
    about = "Print the trusted authority public key that clients must pin")]
struct AuthorityKeyArgs {
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    match PlayAttestCli::parse() {
        PlayAttestCli::Serve(args) => {
            init_tracing(args.json_logs);

            match serve(&args).await {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    error!("serving failed: {e}");
                    ExitCode::FAILURE
                }
            }
        }

        PlayAttestCli::AuthorityKey(args) => match authority_key(&args) {
            Ok(k) => {
                println!("{k}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("authority key derivation failed: {e}");
                ExitCode::FAILURE
            }
        },
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);

    if json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

async fn serve(args: &ServeArgs) -> Result<(), Box<dyn Error>> {
    let config = Config::load(&args.config)?;

    let state = Arc::new(AppState::from_config(&config).await?);

    info!(
        package = %config.package_name,
        error_level = %config.error_level,
        authority_key = %state.issuer.authority_key(),
        "configuration loaded"
    );

    let app = service::router(state);

    let listener = TcpListener::bind(args.listen).await?;
    info!("listening on {}", args.listen);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("installing the shutdown handler failed: {e}");
        std::future::pending::<()>().await;
    }

    info!("shutting down");
}

fn authority_key(args: &AuthorityKeyArgs) -> Result<String, Box<dyn Error>> {
    let config = Config::load(&args.config)?;

    let ta = config.trusted_authority()?;

    Ok(ta.authority_key())
}
