pub mod connection;

use thiserror::Error;

pub use connection::{CommandSender, PushChannel};

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("websocket error: {0}")]
    Socket(#[from] tokio_tungstenite::tungstenite::Error),

    /// The channel's writer task has exited; the connection is gone.
    #[error("push channel closed")]
    Closed,
}
