use std::sync::Arc;
use std::time::Duration;

use anyhow::bail;
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::{
    net::TcpStream,
    sync::{broadcast, broadcast::error::RecvError, mpsc},
    time,
};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, tungstenite::Message};
use tracing::{debug, error, info, warn};
use url::Url;
use uuid::Uuid;

use common::{
    DashboardError,
    actors::{Actor, ActorType, ControlMessage},
    models::{InboundEvent, OutboundCommand},
};

use crate::remote::{EnginePacket, SocketPacket};

const RECONNECT_DELAY: Duration = Duration::from_secs(2);
/// Engine.IO defaults (25s interval + 20s timeout) until the handshake says otherwise.
const DEFAULT_READ_DEADLINE: Duration = Duration::from_secs(45);

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Per-connection protocol state.
#[derive(Debug)]
struct Session {
    read_deadline: Duration,
    connected: bool,
    closed: bool,
}

impl Session {
    fn new() -> Self {
        Self {
            read_deadline: DEFAULT_READ_DEADLINE,
            connected: false,
            closed: false,
        }
    }
}

/// Owns the socket to the signal server: decodes pushes into
/// `InboundEvent`s and writes queued `OutboundCommand`s back.
pub struct TransportGateway {
    id: Uuid,
    endpoint: Url,
    inbound_tx: broadcast::Sender<Arc<InboundEvent>>,
    outbound_rx: broadcast::Receiver<OutboundCommand>,
}

#[async_trait]
impl Actor for TransportGateway {
    fn id(&self) -> Uuid {
        self.id
    }

    fn name(&self) -> ActorType {
        ActorType::GatewayActor
    }

    async fn run(&mut self, supervisor_tx: mpsc::Sender<ControlMessage>) -> anyhow::Result<()> {
        let heartbeat_handle = self.spawn_heartbeat(supervisor_tx.clone());
        let result = self.connect_loop(&supervisor_tx).await;
        heartbeat_handle.abort();
        result
    }
}

impl TransportGateway {
    /// `endpoint` is the websocket URL built by [`socket_url`](crate::remote::socket_url).
    pub fn new(
        endpoint: Url,
        inbound_tx: broadcast::Sender<Arc<InboundEvent>>,
        outbound_rx: broadcast::Receiver<OutboundCommand>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            endpoint,
            inbound_tx,
            outbound_rx,
        }
    }

    async fn connect_loop(
        &mut self,
        supervisor_tx: &mpsc::Sender<ControlMessage>,
    ) -> anyhow::Result<()> {
        loop {
            info!("Connecting to: {}", self.endpoint);

            match tokio_tungstenite::connect_async(self.endpoint.as_str()).await {
                Ok((ws_stream, _)) => {
                    if let Err(e) = self.session(ws_stream, supervisor_tx).await {
                        error!("Session ended: {}. Reconnecting in 2s...", e);
                        supervisor_tx
                            .send(ControlMessage::Error(
                                self.name(),
                                format!("Session ended: {}", e),
                            ))
                            .await?;
                    } else {
                        info!("Session closed. Reconnecting in 2s...");
                    }
                    publish(&self.inbound_tx, InboundEvent::Disconnected);
                }
                Err(e) => {
                    error!("Connection failed: {}. Retrying in 2s...", e);

                    supervisor_tx
                        .send(ControlMessage::Error(
                            self.name(),
                            format!("Connection failed: {}. Retrying in 2s...", e),
                        ))
                        .await?;
                }
            }

            time::sleep(RECONNECT_DELAY).await;
        }
    }

    async fn session(
        &mut self,
        ws_stream: WsStream,
        supervisor_tx: &mpsc::Sender<ControlMessage>,
    ) -> anyhow::Result<()> {
        let (mut write, mut read) = ws_stream.split();
        let mut session = Session::new();
        let inbound_tx = &self.inbound_tx;
        let outbound_rx = &mut self.outbound_rx;

        while !session.closed {
            tokio::select! {
                frame = time::timeout(session.read_deadline, read.next()) => {
                    let msg = match frame {
                        Err(_) => bail!("No traffic for {:?}", session.read_deadline),
                        Ok(None) => return Ok(()),
                        Ok(Some(msg)) => msg?,
                    };

                    match msg {
                        Message::Text(text) => match handle_frame(text.as_str(), &mut session, inbound_tx) {
                            Ok(replies) => {
                                for reply in replies {
                                    write.send(Message::text(reply)).await?;
                                }
                            }
                            Err(e) => {
                                warn!("Unreadable frame: {}", e);
                                supervisor_tx
                                    .send(ControlMessage::Error(
                                        ActorType::GatewayActor,
                                        format!("Unknown socket response: {}", e),
                                    ))
                                    .await?;
                            }
                        },
                        Message::Ping(pg) => {
                            write.send(Message::Pong(pg)).await?;
                            debug!("Ping - Pong message sent to websocket.");
                        }
                        Message::Close(_) => {
                            debug!("Close message received");
                            return Ok(());
                        }
                        _ => debug!("Ignoring non-text websocket frame"),
                    }
                }
                command = outbound_rx.recv(), if session.connected => {
                    match command {
                        Ok(command) => {
                            let packet = SocketPacket::event(command.event_name(), command.payload());
                            let frame = EnginePacket::Message(packet.encode()?).encode();
                            debug!("Sending {}", frame);
                            write.send(Message::text(frame)).await?;
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            warn!("Outbound queue lagged, {} commands dropped", skipped);
                        }
                        Err(RecvError::Closed) => bail!("Outbound command channel closed"),
                    }
                }
            }
        }

        let _ = write.send(Message::Close(None)).await;
        Ok(())
    }
}

/// Applies one Engine.IO text frame and returns the frames to send back.
fn handle_frame(
    frame: &str,
    session: &mut Session,
    inbound_tx: &broadcast::Sender<Arc<InboundEvent>>,
) -> Result<Vec<String>, DashboardError> {
    let replies = match EnginePacket::decode(frame)? {
        EnginePacket::Open(handshake) => {
            info!(
                "Engine.IO session {} open (ping every {}ms)",
                handshake.sid, handshake.ping_interval
            );
            session.read_deadline = handshake.read_deadline();
            vec![EnginePacket::Message(SocketPacket::connect().encode()?).encode()]
        }
        EnginePacket::Ping(body) => vec![EnginePacket::Pong(body).encode()],
        EnginePacket::Close => {
            info!("Server closed the Engine.IO session");
            session.closed = true;
            vec![]
        }
        EnginePacket::Message(body) => {
            handle_packet(SocketPacket::decode(&body)?, session, inbound_tx);
            vec![]
        }
        EnginePacket::Pong(_) | EnginePacket::Upgrade | EnginePacket::Noop => vec![],
    };
    Ok(replies)
}

fn handle_packet(
    packet: SocketPacket,
    session: &mut Session,
    inbound_tx: &broadcast::Sender<Arc<InboundEvent>>,
) {
    match packet {
        SocketPacket::Connect { namespace, .. } => {
            info!("Connected to namespace {}", namespace);
            session.connected = true;
            publish(inbound_tx, InboundEvent::Connected);
        }
        SocketPacket::Disconnect { namespace } => {
            info!("Server disconnected namespace {}", namespace);
            session.closed = true;
        }
        SocketPacket::ConnectError { data, .. } => {
            error!("Server refused connection: {:?}", data);
            session.closed = true;
        }
        SocketPacket::Event { name, payload, .. } => {
            match InboundEvent::from_wire(&name, payload) {
                Ok(Some(event)) => publish(inbound_tx, event),
                Ok(None) => {}
                Err(e) => warn!("Dropping '{}' event: {}", name, e),
            }
        }
        SocketPacket::Ack { ack_id, .. } => debug!("Ignoring ack {:?}", ack_id),
    }
}

fn publish(inbound_tx: &broadcast::Sender<Arc<InboundEvent>>, event: InboundEvent) {
    debug!("Inbound event '{}'", event.name());
    let _ = inbound_tx.send(Arc::new(event));
}
