use std::time::Duration;

use clap::Parser;
use faceoff::prelude::*;

#[derive(Parser, Debug)]
#[command(name = "faceoff-server", version, about = "Real-time Faceoff card game server")]
struct Args {
    /// WebSocket listener address.
    #[arg(long, env = "FACEOFF_WS_ADDR", default_value = "0.0.0.0:8000")]
    ws_addr: String,

    /// HTTP API listener address.
    #[arg(long, env = "FACEOFF_HTTP_ADDR", default_value = "0.0.0.0:8001")]
    http_addr: String,

    #[arg(long, default_value_t = 8)]
    max_players: usize,

    /// Rooms idle for longer than this are destroyed.
    #[arg(long, default_value_t = 24)]
    room_ttl_hours: u64,

    #[arg(long, default_value_t = 30)]
    sweep_interval_mins: u64,

    /// Connections silent for longer than this are closed.
    #[arg(long, default_value_t = 1800)]
    idle_timeout_secs: u64,
}

impl Args {
    fn room_config(&self) -> RoomConfig {
        RoomConfig {
            max_players: self.max_players,
            room_ttl: Duration::from_secs(self.room_ttl_hours * 3600),
            sweep_interval: Duration::from_secs(self.sweep_interval_mins * 60),
            ..RoomConfig::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), FaceoffError> {
    faceoff::setup_logging();
    let args = Args::parse();

    let builder = FaceoffServer::builder()
        .bind(&args.ws_addr)
        .http_bind(&args.http_addr)
        .room_config(args.room_config())
        .idle_timeout(Duration::from_secs(args.idle_timeout_secs));

    match OpenAiCategories::from_env() {
        Some(source) => {
            tracing::info!(model = source.model(), "generating categories with a chat model");
            serve(builder, source).await
        }
        None => {
            tracing::warn!("OPENAI_API_KEY not set, using built-in categories");
            serve(builder, StaticCategories::new()).await
        }
    }
}

async fn serve<S: CategorySource>(
    builder: FaceoffServerBuilder,
    source: S,
) -> Result<(), FaceoffError> {
    let server = builder.build(source).await?;
    server
        .run_until(async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => tracing::info!("ctrl-c received"),
                Err(e) => {
                    tracing::error!(error = %e, "cannot listen for ctrl-c");
                    std::future::pending::<()>().await;
                }
            }
        })
        .await
}
