//! # Faceoff
//!
//! Authoritative real-time server for Faceoff, a party card game where
//! players flip cards onto personal stacks and race to name an example of
//! the category on an opponent's card when the symbols match.
//!
//! Clients open a WebSocket at `/ws/{ROOM_CODE}` and send JSON commands;
//! the server owns every room's game and pushes state snapshots back.
//! Rooms are created over a small HTTP API on a second listener.
//!
//! Category labels come from [`StaticCategories`](faceoff_game::StaticCategories)
//! or, when an API key is configured, from [`OpenAiCategories`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use faceoff::prelude::*;
//!
//! # async fn start() -> Result<(), FaceoffError> {
//! let server = FaceoffServer::builder()
//!     .bind("0.0.0.0:8000")
//!     .http_bind("0.0.0.0:8001")
//!     .build(StaticCategories::new())
//!     .await?;
//! server.run().await
//! # }
//! ```

mod categories;
mod config;
mod error;
mod handler;
mod http;
mod server;

pub use categories::OpenAiCategories;
pub use config::ServerConfig;
pub use error::FaceoffError;
pub use server::{FaceoffServer, FaceoffServerBuilder};

use tracing_subscriber::prelude::*;

/// Installs the global `tracing` subscriber: `RUST_LOG` if set, otherwise
/// `faceoff=info,tower_http=info`, printed in compact form.
pub fn setup_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "faceoff=info,tower_http=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_file(false)
                .with_target(false),
        )
        .init();
}

pub mod prelude {
    pub use crate::{
        FaceoffError, FaceoffServer, FaceoffServerBuilder, OpenAiCategories, ServerConfig,
    };
    pub use faceoff_game::{CategoryConfig, CategorySource, GameConfig, StaticCategories};
    pub use faceoff_room::RoomConfig;
}
