use std::collections::VecDeque;

use futures::{Sink, SinkExt, StreamExt};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use url::Url;

use crate::common::{ChatMessage, ConnectionState, TransportEvent};
use crate::error::ClientError;

use super::codec::{self, Packet};

/// An event queued for the wire, not yet framed.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundEvent {
    pub name: &'static str,
    pub payload: Value,
}

/// Opens the underlying connection.
///
/// The connection pushes its signals onto `events`, tagged with
/// `connection`, and consumes the returned queue until it is dropped.
pub trait Connector {
    fn open(
        &self,
        connection: u64,
        events: mpsc::UnboundedSender<TransportEvent>,
    ) -> mpsc::UnboundedSender<OutboundEvent>;
}

#[derive(Debug)]
struct ConnectionHandle {
    id: u64,
    outbound: mpsc::UnboundedSender<OutboundEvent>,
}

/// Owns at most one connection to the chat service.
pub struct TransportSession<C> {
    connector: C,
    events: mpsc::UnboundedSender<TransportEvent>,
    handle: Option<ConnectionHandle>,
    opened: u64,
    state: ConnectionState,
}

impl<C: Connector> TransportSession<C> {
    pub fn new(connector: C) -> (Self, mpsc::UnboundedReceiver<TransportEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let session = Self {
            connector,
            events,
            handle: None,
            opened: 0,
            state: ConnectionState::Disconnected,
        };
        (session, receiver)
    }

    /// Opens a connection unless one is already live; returns its id.
    pub fn connect(&mut self) -> u64 {
        let connector = &self.connector;
        let events = &self.events;
        let opened = &mut self.opened;
        let handle = self.handle.get_or_insert_with(|| {
            *opened += 1;
            let id = *opened;
            log::info!("Opening chat connection #{id}");
            ConnectionHandle {
                id,
                outbound: connector.open(id, events.clone()),
            }
        });
        handle.id
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// A connection is open or still handshaking, so emits will be delivered.
    pub fn is_open(&self) -> bool {
        self.handle.is_some()
    }

    /// Fire-and-forget. Without a live connection the event is logged and dropped.
    pub fn emit<T: Serialize>(&self, name: &'static str, payload: &T) {
        if let Err(err) = self.try_emit(name, payload) {
            log::warn!("Dropping `{name}` event: {err}");
        }
    }

    fn try_emit<T: Serialize>(&self, name: &'static str, payload: &T) -> Result<(), ClientError> {
        let handle = self
            .handle
            .as_ref()
            .ok_or(ClientError::TransportUnavailable)?;
        let payload = serde_json::to_value(payload)?;
        handle
            .outbound
            .send(OutboundEvent { name, payload })
            .map_err(|_| ClientError::TransportUnavailable)
    }

    /// Folds a connection signal into the session state.
    ///
    /// Returns the new state when it changed. Signals from a connection other
    /// than the current one are ignored. A closed connection is released so
    /// the next `connect` opens a fresh one.
    pub fn observe(&mut self, event: &TransportEvent) -> Option<ConnectionState> {
        let current = self.handle.as_ref().map(|handle| handle.id);
        let next = match event {
            TransportEvent::Connected { connection } if Some(*connection) == current => {
                ConnectionState::Connected
            }
            TransportEvent::Disconnected { connection } if Some(*connection) == current => {
                log::info!("Chat connection #{connection} closed");
                self.handle = None;
                ConnectionState::Disconnected
            }
            _ => return None,
        };

        if next == self.state {
            return None;
        }
        self.state = next;
        Some(next)
    }
}

/// Connects over a WebSocket speaking Socket.IO framing.
#[derive(Debug, Clone)]
pub struct WsConnector {
    endpoint: Url,
}

impl WsConnector {
    pub fn new(endpoint: Url) -> Self {
        Self { endpoint }
    }
}

impl Connector for WsConnector {
    fn open(
        &self,
        connection: u64,
        events: mpsc::UnboundedSender<TransportEvent>,
    ) -> mpsc::UnboundedSender<OutboundEvent> {
        let (outbound, queue) = mpsc::unbounded_channel();
        tokio::spawn(run_connection(
            self.endpoint.clone(),
            connection,
            events,
            queue,
        ));
        outbound
    }
}

/// Socket.IO endpoint for a service base URL (`http` becomes `ws`, `https` becomes `wss`).
pub fn socket_endpoint(server_url: &Url) -> Result<Url, ClientError> {
    let mut endpoint = server_url.clone();
    let scheme = match server_url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => {
            return Err(ClientError::validation(format!(
                "unsupported server scheme `{other}`"
            )));
        }
    };
    endpoint
        .set_scheme(scheme)
        .map_err(|_| ClientError::validation(format!("cannot use `{scheme}` for {server_url}")))?;

    let base = server_url.path().trim_end_matches('/');
    endpoint.set_path(&format!("{base}/socket.io/"));
    endpoint.set_query(Some("EIO=4&transport=websocket"));
    Ok(endpoint)
}

async fn run_connection(
    endpoint: Url,
    connection: u64,
    events: mpsc::UnboundedSender<TransportEvent>,
    mut queue: mpsc::UnboundedReceiver<OutboundEvent>,
) {
    let (stream, _) = match connect_async(endpoint.as_str()).await {
        Ok(ok) => ok,
        Err(err) => {
            log::warn!("Failed to connect to {endpoint}: {err}");
            let _ = events.send(TransportEvent::Disconnected { connection });
            return;
        }
    };
    log::info!("WebSocket open to {endpoint}");

    let (mut sink, mut source) = stream.split();
    let mut namespace_ready = false;
    let mut backlog: VecDeque<String> = VecDeque::new();

    loop {
        tokio::select! {
            frame = source.next() => {
                let text = match frame {
                    Some(Ok(WsMessage::Text(text))) => text,
                    Some(Ok(WsMessage::Close(_))) | None => break,
                    Some(Ok(_)) => continue,
                    Some(Err(err)) => {
                        log::warn!("WebSocket read failed: {err}");
                        break;
                    }
                };

                let packet = match codec::decode(text.as_str()) {
                    Ok(packet) => packet,
                    Err(err) => {
                        log::warn!("Ignoring frame: {err}");
                        continue;
                    }
                };

                match packet {
                    Packet::Open(handshake) => {
                        log::debug!("Engine.IO session {} (ping every {}ms)", handshake.sid, handshake.ping_interval);
                        if !send_packet(&mut sink, &Packet::Connect(None)).await {
                            break;
                        }
                    }
                    Packet::Ping => {
                        if !send_packet(&mut sink, &Packet::Pong).await {
                            break;
                        }
                    }
                    Packet::Connect(_) => {
                        namespace_ready = true;
                        let _ = events.send(TransportEvent::Connected { connection });
                        let mut flushed = true;
                        while let Some(frame) = backlog.pop_front() {
                            if !send_frame(&mut sink, frame).await {
                                flushed = false;
                                break;
                            }
                        }
                        if !flushed {
                            break;
                        }
                    }
                    Packet::Event { name, payload } => {
                        if let Some(event) = inbound_event(connection, &name, payload) {
                            let _ = events.send(event);
                        }
                    }
                    Packet::ConnectError(detail) => {
                        log::warn!("Namespace connect refused: {detail}");
                        break;
                    }
                    Packet::Disconnect | Packet::Close => break,
                    Packet::Pong | Packet::Noop => {}
                }
            }
            outbound = queue.recv() => {
                let Some(event) = outbound else {
                    let _ = send_packet(&mut sink, &Packet::Disconnect).await;
                    let _ = sink.close().await;
                    break;
                };
                let frame = match codec::encode(&Packet::event(event.name, event.payload)) {
                    Ok(frame) => frame,
                    Err(err) => {
                        log::warn!("Failed to encode `{}`: {err}", event.name);
                        continue;
                    }
                };
                if namespace_ready {
                    if !send_frame(&mut sink, frame).await {
                        break;
                    }
                } else {
                    backlog.push_back(frame);
                }
            }
        }
    }

    let _ = events.send(TransportEvent::Disconnected { connection });
}

fn inbound_event(connection: u64, name: &str, payload: Value) -> Option<TransportEvent> {
    match name {
        "receive_message" => match serde_json::from_value::<ChatMessage>(payload) {
            Ok(message) => Some(TransportEvent::MessageReceived {
                connection,
                message,
            }),
            Err(err) => {
                log::warn!("Malformed receive_message payload: {err}");
                None
            }
        },
        "notification" => {
            let msg = payload
                .get("msg")
                .and_then(Value::as_str)
                .filter(|msg| !msg.is_empty())
                .unwrap_or("Notification")
                .to_string();
            Some(TransportEvent::Notification { connection, msg })
        }
        other => {
            log::debug!("Ignoring unhandled event `{other}`");
            None
        }
    }
}

async fn send_packet<S>(sink: &mut S, packet: &Packet) -> bool
where
    S: Sink<WsMessage> + Unpin,
{
    match codec::encode(packet) {
        Ok(frame) => send_frame(sink, frame).await,
        Err(err) => {
            log::warn!("Failed to encode control packet: {err}");
            true
        }
    }
}

async fn send_frame<S>(sink: &mut S, frame: String) -> bool
where
    S: Sink<WsMessage> + Unpin,
{
    sink.send(WsMessage::Text(frame.into())).await.is_ok()
}
