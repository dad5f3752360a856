//! The player capability the web page needs, and the adapters that provide it.
//!
//! Request handling only ever sees `Arc<dyn Controller>`.  Everything that
//! knows how MPD reports its state (mpc's text output, the `mpd` client's
//! status structs) stays inside an adapter.

pub mod mpc;
pub mod mpd;

use async_trait::async_trait;
use rad10_proto::config::{Backend, ControllerConfig};
use rad10_proto::platform;
use rad10_proto::protocol::StatusSnapshot;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub use mpc::MpcController;
pub use mpd::MpdController;

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("cannot start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{what} timed out after {after:?}")]
    Timeout { what: String, after: Duration },
    #[error("{what} exited with {code:?}: {stderr}")]
    Exit {
        what: String,
        code: Option<i32>,
        stderr: String,
    },
    #[error("mpd i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("unexpected mpd response: {0}")]
    Protocol(String),
    #[error("mpd refused command: {0}")]
    Ack(String),
    #[error("mpd has no mixer, volume cannot be changed")]
    NoMixer,
}

#[async_trait]
pub trait Controller: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Pause when playing, play otherwise.
    async fn toggle(&self) -> Result<(), ControllerError>;

    /// Change volume by `delta` percentage points.
    async fn adjust_volume(&self, delta: i32) -> Result<(), ControllerError>;

    /// Empty the play queue.
    async fn clear(&self) -> Result<(), ControllerError>;

    /// Append a stream URL to the queue.
    async fn enqueue(&self, url: &str) -> Result<(), ControllerError>;

    async fn play(&self) -> Result<(), ControllerError>;

    /// Fresh now-playing / transport / volume strings.  Never fails: a query
    /// that cannot be answered leaves its field empty and marks the snapshot
    /// unavailable.
    async fn query_status(&self) -> StatusSnapshot;
}

/// Build the adapter selected in `[controller]`.
pub fn from_config(config: &ControllerConfig) -> Arc<dyn Controller> {
    match config.backend {
        Backend::Mpc => Arc::new(MpcController::new(
            platform::find_mpc_binary(config.mpc_binary.as_ref()),
            config.host.clone(),
            config.port,
            config.timeout(),
        )),
        Backend::Mpd => Arc::new(MpdController::new(config.mpd_address(), config.timeout())),
    }
}
