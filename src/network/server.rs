//! WebSocket Game Server
//!
//! Accepts client connections, relays their `input` frames into the
//! simulation task, and fans simulation broadcasts back out.
//!
//! The simulation task is the only owner of the physics world and the
//! connection registry. Connection tasks talk to it exclusively through a
//! [`SimEvent`] queue, so a connect or disconnect can never be observed
//! mid-tick. Broadcast goes through bounded per-client channels with
//! `try_send`: a client that stops reading loses its own frames, never
//! anyone else's tick.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc};
use tokio::time::{interval, MissedTickBehavior};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

use crate::game::input::InputState;
use crate::game::physics::PhysicsWorld;
use crate::game::registry::{ConnectionId, ConnectionRegistry};
use crate::game::tick::tick;
use crate::network::protocol::{ClientMessage, ServerError, ServerMessage};
use crate::TICK_RATE;

/// Outbound frames buffered per client before the server starts dropping
/// them for that client.
const OUTBOUND_BUFFER: usize = 64;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address.
    pub bind_addr: SocketAddr,
    /// Maximum concurrent connections.
    pub max_connections: usize,
    /// Tick rate for the simulation (Hz).
    pub tick_rate: u32,
    /// Server version string.
    pub version: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:4001".parse().unwrap(),
            max_connections: 64,
            tick_rate: TICK_RATE,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Game server errors.
#[derive(Debug, thiserror::Error)]
pub enum GameServerError {
    /// Failed to bind to address.
    #[error("Failed to bind: {0}")]
    BindFailed(#[from] std::io::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}

/// Events from connection tasks to the simulation task.
#[derive(Debug)]
enum SimEvent {
    /// A client connected; spawn its body and remember its outbound channel.
    Connect {
        id: ConnectionId,
        sender: mpsc::Sender<ServerMessage>,
    },
    /// A client submitted input.
    Input { id: ConnectionId, input: InputState },
    /// A client went away; remove its body and tell everyone else.
    Disconnect { id: ConnectionId },
}

/// The game server.
pub struct GameServer {
    config: ServerConfig,
    /// Shutdown signal.
    shutdown_tx: broadcast::Sender<()>,
    /// Live connection count, maintained by the connection tasks.
    connections: Arc<AtomicUsize>,
}

impl GameServer {
    /// Create a new game server.
    pub fn new(config: ServerConfig) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            config,
            shutdown_tx,
            connections: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Bind the configured address and run until shutdown.
    pub async fn run(&self) -> Result<(), GameServerError> {
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        self.run_on(listener).await
    }

    /// Run on an already-bound listener until shutdown.
    pub async fn run_on(&self, listener: TcpListener) -> Result<(), GameServerError> {
        info!(
            "Arena server v{} listening on {}",
            self.config.version,
            listener.local_addr()?
        );

        let (events_tx, events_rx) = mpsc::channel::<SimEvent>(256);

        // The simulation task exclusively owns world + registry.
        let sim_handle = tokio::spawn(run_simulation_loop(
            events_rx,
            self.config.tick_rate,
            self.shutdown_tx.subscribe(),
        ));

        let mut shutdown_rx = self.shutdown_tx.subscribe();

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            if self.connections.load(Ordering::Relaxed) >= self.config.max_connections {
                                warn!("Connection limit reached, rejecting {}", addr);
                                continue;
                            }

                            info!("New connection from {}", addr);
                            self.handle_connection(stream, addr, events_tx.clone());
                        }
                        Err(e) => {
                            error!("Accept error: {}", e);
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        sim_handle.abort();
        Ok(())
    }

    /// Handle a new WebSocket connection.
    fn handle_connection(
        &self,
        stream: TcpStream,
        addr: SocketAddr,
        events_tx: mpsc::Sender<SimEvent>,
    ) {
        let connections = self.connections.clone();
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            let ws_stream = match accept_async(stream).await {
                Ok(ws) => ws,
                Err(e) => {
                    error!("WebSocket handshake failed for {}: {}", addr, e);
                    return;
                }
            };

            let (mut ws_sender, mut ws_receiver) = ws_stream.split();
            let (msg_tx, mut msg_rx) = mpsc::channel::<ServerMessage>(OUTBOUND_BUFFER);

            let id = ConnectionId::new_unique();
            connections.fetch_add(1, Ordering::Relaxed);

            if events_tx
                .send(SimEvent::Connect {
                    id,
                    sender: msg_tx.clone(),
                })
                .await
                .is_err()
            {
                // Simulation task is gone; nothing to join.
                connections.fetch_sub(1, Ordering::Relaxed);
                return;
            }

            info!(%id, %addr, "Client connected");

            // Writer task: drains the outbound channel into the socket, so
            // the simulation never waits on this peer.
            let sender_task = tokio::spawn(async move {
                while let Some(msg) = msg_rx.recv().await {
                    let text = match msg.to_json() {
                        Ok(t) => t,
                        Err(e) => {
                            error!("Failed to serialize message: {}", e);
                            continue;
                        }
                    };
                    if ws_sender.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
            });

            // Reader loop: inbound frames become simulation events.
            loop {
                tokio::select! {
                    msg = ws_receiver.next() => {
                        match msg {
                            Some(Ok(Message::Text(text))) => {
                                match ClientMessage::from_json(&text) {
                                    Ok(ClientMessage::Input(input)) => {
                                        let _ = events_tx.send(SimEvent::Input { id, input }).await;
                                    }
                                    Err(e) => {
                                        debug!(%id, "Invalid message from {}: {}", addr, e);
                                        let _ = msg_tx.try_send(ServerMessage::Error(ServerError {
                                            message: "Invalid message format".to_string(),
                                        }));
                                    }
                                }
                            }
                            Some(Ok(Message::Close(_))) | None => {
                                debug!("Client {} disconnected", addr);
                                break;
                            }
                            Some(Err(e)) => {
                                error!("WebSocket error for {}: {}", addr, e);
                                break;
                            }
                            _ => {}
                        }
                    }
                    _ = shutdown_rx.recv() => break,
                }
            }

            // Cleanup: the simulation removes the body and broadcasts the
            // destroy to the remaining clients.
            sender_task.abort();
            let _ = events_tx.send(SimEvent::Disconnect { id }).await;
            connections.fetch_sub(1, Ordering::Relaxed);

            info!(%id, %addr, "Client cleaned up");
        });
    }

    /// Shutdown the server.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Get active connection count.
    pub fn connection_count(&self) -> usize {
        self.connections.load(Ordering::Relaxed)
    }
}

/// Run the simulation loop: exclusive owner of the physics world, the
/// connection registry, and the per-client outbound channels.
async fn run_simulation_loop(
    mut events: mpsc::Receiver<SimEvent>,
    tick_rate: u32,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    let mut world = PhysicsWorld::new();
    let mut registry = ConnectionRegistry::new();
    let mut senders: BTreeMap<ConnectionId, mpsc::Sender<ServerMessage>> = BTreeMap::new();

    let dt = 1.0 / tick_rate as f32;
    let tick_duration = Duration::from_micros(1_000_000 / tick_rate as u64);
    let mut tick_interval = interval(tick_duration);
    tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut tick_index: u64 = 0;

    loop {
        tokio::select! {
            _ = tick_interval.tick() => {
                let result = tick(&mut world, &registry, dt);

                for id in &result.respawned {
                    warn!(%id, tick = tick_index, "Body position went non-finite, respawned");
                }

                for transform in &result.transforms {
                    broadcast(&senders, ServerMessage::from(transform));
                }

                tick_index += 1;
                if tick_index % (10 * tick_rate as u64) == 0 {
                    debug!(tick = tick_index, players = registry.len(), "Simulation heartbeat");
                }
            }
            event = events.recv() => {
                match event {
                    Some(SimEvent::Connect { id, sender }) => {
                        registry.connect(id, &mut world);
                        senders.insert(id, sender);
                        debug!(%id, players = registry.len(), "Player spawned");
                    }
                    Some(SimEvent::Input { id, input }) => {
                        // No-op for unknown ids: input racing a disconnect.
                        registry.set_input(&id, input);
                    }
                    Some(SimEvent::Disconnect { id }) => {
                        senders.remove(&id);
                        if registry.disconnect(&id, &mut world) {
                            broadcast(&senders, ServerMessage::Destroy { id });
                            debug!(%id, players = registry.len(), "Player destroyed");
                        }
                    }
                    None => break,
                }
            }
            _ = shutdown_rx.recv() => break,
        }
    }
}

/// Fire-and-forget fan-out. A full or closed channel drops the frame for
/// that client only; closed channels are cleaned up by the matching
/// `Disconnect` event.
fn broadcast(senders: &BTreeMap<ConnectionId, mpsc::Sender<ServerMessage>>, msg: ServerMessage) {
    for sender in senders.values() {
        let _ = sender.try_send(msg.clone());
    }
}
