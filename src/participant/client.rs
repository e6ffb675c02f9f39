use futures::{SinkExt, StreamExt};
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_tungstenite::tungstenite::{self, Message as WsMessage};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use crate::websockets::{DrawEvent, Message};

use super::config::ParticipantConfig;

type RelayStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// What a participant surfaces to its rendering side
#[derive(Debug, Clone, PartialEq)]
pub enum ParticipantEvent {
    Connected,
    Disconnected,
    /// A draw event submitted by another participant
    Draw(DrawEvent),
    Cleared,
    History(Vec<DrawEvent>),
    UserCount(usize),
}

#[derive(Debug, Error)]
pub enum ParticipantError {
    #[error("failed to connect to {url}: {source}")]
    Connect {
        url: String,
        source: tungstenite::Error,
    },

    #[error("handshake with {url} did not complete within {after:?}")]
    ConnectTimedOut { url: String, after: Duration },

    #[error("transport error: {0}")]
    Transport(#[from] tungstenite::Error),

    #[error("failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("participant task has stopped")]
    Stopped,
}

/// Entry point for spawning participant sessions
pub struct Participant;

impl Participant {
    /// Start the connect / heartbeat / reconnect loop in a background task
    pub fn spawn(config: ParticipantConfig) -> ParticipantHandle {
        let (outgoing_tx, outgoing_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let client_id = config.client_id.clone();

        let task = tokio::spawn(run(config, outgoing_rx, event_tx));

        ParticipantHandle {
            client_id,
            outgoing: outgoing_tx,
            events: event_rx,
            task,
        }
    }
}

/// Owning handle to a running participant. Dropping it stops the participant.
pub struct ParticipantHandle {
    client_id: String,
    outgoing: mpsc::UnboundedSender<Message>,
    events: mpsc::UnboundedReceiver<ParticipantEvent>,
    task: JoinHandle<()>,
}

impl ParticipantHandle {
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Queue a message for the relay. Dropped if not connected when it is sent.
    pub fn send(&self, message: Message) -> Result<(), ParticipantError> {
        self.outgoing
            .send(message)
            .map_err(|_| ParticipantError::Stopped)
    }

    /// Submit a draw event stamped with this participant's id
    pub fn draw(&self, mut event: DrawEvent) -> Result<(), ParticipantError> {
        event.set_client_id(self.client_id.clone());
        self.send(Message::draw(event))
    }

    pub fn clear(&self) -> Result<(), ParticipantError> {
        self.send(Message::Clear)
    }

    pub async fn next_event(&mut self) -> Option<ParticipantEvent> {
        self.events.recv().await
    }

    pub fn shutdown(self) {
        // Drop aborts the task
    }
}

impl Drop for ParticipantHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run(
    config: ParticipantConfig,
    mut outgoing: mpsc::UnboundedReceiver<Message>,
    events: mpsc::UnboundedSender<ParticipantEvent>,
) {
    loop {
        match connect(&config).await {
            Ok(stream) => {
                info!(url = %config.url, client_id = %config.client_id, "Connected to relay");
                // Anything submitted during the handshake was submitted while disconnected
                discard_pending(&mut outgoing);
                let _ = events.send(ParticipantEvent::Connected);

                match run_session(&config, stream, &mut outgoing, &events).await {
                    Ok(()) => info!(url = %config.url, "Relay connection closed"),
                    Err(e) => warn!(url = %config.url, error = %e, "Relay connection lost"),
                }
                let _ = events.send(ParticipantEvent::Disconnected);
            }
            Err(e) => warn!(error = %e, "Relay unreachable"),
        }

        debug!(
            delay_ms = config.reconnect_delay.as_millis() as u64,
            "Scheduling reconnect"
        );

        // Wait out the fixed delay, discarding anything submitted meanwhile
        let delay = tokio::time::sleep(config.reconnect_delay);
        tokio::pin!(delay);
        loop {
            tokio::select! {
                _ = &mut delay => break,
                msg = outgoing.recv() => match msg {
                    Some(message) => {
                        debug!(message_type = message.kind(), "Dropping message while disconnected");
                    }
                    None => return,
                },
            }
        }
    }
}

async fn connect(config: &ParticipantConfig) -> Result<RelayStream, ParticipantError> {
    match tokio::time::timeout(config.connect_timeout, connect_async(config.url.as_str())).await {
        Ok(Ok((stream, _))) => Ok(stream),
        Ok(Err(source)) => Err(ParticipantError::Connect {
            url: config.url.clone(),
            source,
        }),
        Err(_) => Err(ParticipantError::ConnectTimedOut {
            url: config.url.clone(),
            after: config.connect_timeout,
        }),
    }
}

fn discard_pending(outgoing: &mut mpsc::UnboundedReceiver<Message>) {
    while let Ok(message) = outgoing.try_recv() {
        debug!(message_type = message.kind(), "Dropping message while disconnected");
    }
}

/// One connected session. The heartbeat timer lives and dies with it.
async fn run_session(
    config: &ParticipantConfig,
    stream: RelayStream,
    outgoing: &mut mpsc::UnboundedReceiver<Message>,
    events: &mpsc::UnboundedSender<ParticipantEvent>,
) -> Result<(), ParticipantError> {
    let (mut writer, mut reader) = stream.split();

    let period = config.heartbeat_interval;
    let mut heartbeat = tokio::time::interval_at(Instant::now() + period, period);
    heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = heartbeat.tick() => {
                writer.send(WsMessage::Text(Message::Ping.encode()?)).await?;
                debug!(client_id = %config.client_id, "Sent ping");
            }

            msg = outgoing.recv() => match msg {
                Some(message) => {
                    writer.send(WsMessage::Text(message.encode()?)).await?;
                }
                None => {
                    let _ = writer.close().await;
                    return Ok(());
                }
            },

            frame = reader.next() => match frame {
                Some(Ok(WsMessage::Text(text))) => handle_frame(&config.client_id, &text, events),
                Some(Ok(WsMessage::Close(_))) | None => return Ok(()),
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
            },
        }
    }
}

fn handle_frame(client_id: &str, text: &str, events: &mpsc::UnboundedSender<ParticipantEvent>) {
    let message = match Message::decode(text) {
        Ok(message) => message,
        Err(e) => {
            warn!(error = %e, "Failed to parse message from relay");
            return;
        }
    };

    let event = match message {
        Message::Draw { data } if data.is_from(client_id) => {
            // Already rendered locally when it was submitted
            debug!("Skipping echo of own draw event");
            return;
        }
        Message::Draw { data } => ParticipantEvent::Draw(data),
        Message::Clear => ParticipantEvent::Cleared,
        Message::History { data } => ParticipantEvent::History(data),
        Message::UserCount { count } => ParticipantEvent::UserCount(count),
        Message::Pong => {
            debug!("Relay answered ping");
            return;
        }
        Message::Ping => {
            debug!("Ignoring ping from relay");
            return;
        }
    };

    let _ = events.send(event);
}
