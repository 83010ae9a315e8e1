use futures_util::{SinkExt, StreamExt};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use alcove_types::events::{ClientCommand, PushEvent};

use crate::GatewayError;

/// Capacity of the fan-out buffer. A subscriber that lags this far behind
/// misses events and resumes from the current position.
const EVENT_BUFFER: usize = 256;

enum Command {
    Frame(ClientCommand),
    Close,
}

/// One live push connection, opened once per mount and closed on teardown.
///
/// The socket is addressed with the access token as a query parameter.
/// Incoming JSON frames are decoded into [`PushEvent`]s and fanned out to
/// every subscriber; outgoing [`ClientCommand`]s are serialized onto the same
/// socket. There is no automatic reconnect: when the server goes away the
/// event stream simply ends, and the owner decides whether to dial again.
pub struct PushChannel {
    events_tx: broadcast::Sender<PushEvent>,
    commands_tx: mpsc::UnboundedSender<Command>,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

impl PushChannel {
    pub async fn connect(gateway_url: &str, access_token: &str) -> Result<Self, GatewayError> {
        let url = format!(
            "{}/ws/notifications/?token={}",
            gateway_url.trim_end_matches('/'),
            access_token
        );

        let (socket, _response) = connect_async(url).await?;
        info!("push channel connected");

        let (mut sink, mut stream) = socket.split();
        let (events_tx, _) = broadcast::channel(EVENT_BUFFER);
        let (commands_tx, mut commands_rx) = mpsc::unbounded_channel();

        let fanout = events_tx.clone();
        let reader = tokio::spawn(async move {
            while let Some(frame) = stream.next().await {
                match frame {
                    Ok(Message::Text(text)) => {
                        match serde_json::from_str::<PushEvent>(text.as_str()) {
                            Ok(event) => {
                                let _ = fanout.send(event);
                            }
                            Err(e) => warn!("unrecognized push frame: {}", e),
                        }
                    }
                    Ok(Message::Close(_)) => {
                        debug!("push channel closed by server");
                        break;
                    }
                    // Ping/Pong are answered by the protocol layer.
                    Ok(_) => {}
                    Err(e) => {
                        warn!("push channel read error: {}", e);
                        break;
                    }
                }
            }
        });

        let writer = tokio::spawn(async move {
            while let Some(command) = commands_rx.recv().await {
                match command {
                    Command::Frame(frame) => {
                        let text = match serde_json::to_string(&frame) {
                            Ok(text) => text,
                            Err(e) => {
                                warn!("could not encode client frame: {}", e);
                                continue;
                            }
                        };
                        if sink.send(Message::Text(text.into())).await.is_err() {
                            break;
                        }
                    }
                    Command::Close => {
                        let _ = sink.send(Message::Close(None)).await;
                        break;
                    }
                }
            }
        });

        Ok(Self {
            events_tx,
            commands_tx,
            reader,
            writer,
        })
    }

    /// Subscribe to decoded push events. Each subscriber gets every event
    /// from its subscription point onward.
    pub fn subscribe(&self) -> broadcast::Receiver<PushEvent> {
        self.events_tx.subscribe()
    }

    /// Queue a client frame for the server. Fire-and-forget: delivery is not
    /// confirmed.
    pub fn send(&self, frame: ClientCommand) -> Result<(), GatewayError> {
        self.commands_tx
            .send(Command::Frame(frame))
            .map_err(|_| GatewayError::Closed)
    }

    /// A cheap cloneable handle for queueing client frames, usable after the
    /// channel itself has been handed elsewhere.
    pub fn command_sender(&self) -> CommandSender {
        CommandSender {
            tx: self.commands_tx.clone(),
        }
    }

    /// Graceful teardown: flush a close frame, then stop both halves.
    pub async fn close(mut self) {
        let _ = self.commands_tx.send(Command::Close);
        let _ = (&mut self.writer).await;
        self.reader.abort();
    }
}

impl Drop for PushChannel {
    fn drop(&mut self) {
        self.reader.abort();
        self.writer.abort();
    }
}

#[derive(Clone)]
pub struct CommandSender {
    tx: mpsc::UnboundedSender<Command>,
}

impl CommandSender {
    pub fn send(&self, frame: ClientCommand) -> Result<(), GatewayError> {
        self.tx
            .send(Command::Frame(frame))
            .map_err(|_| GatewayError::Closed)
    }
}
