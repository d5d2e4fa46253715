use crate::game::{ClientGameState, VisualSink};
use log::{debug, error, info, warn};
use shared::{ClientTransport, Message, Periodic, TransportEvent, SELF_REPORT_INTERVAL};
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Connected,
    /// Terminal. There is no reconnect.
    Disconnected,
}

/// Client side of the protocol, pumped once per host frame.
pub struct Client<T: ClientTransport> {
    transport: T,
    state: ConnectionState,
    game_state: ClientGameState,
    self_report: Periodic,
    reports_sent: u64,
}

impl<T: ClientTransport> Client<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            state: ConnectionState::Connecting,
            game_state: ClientGameState::new(),
            self_report: Periodic::new(SELF_REPORT_INTERVAL),
            reports_sent: 0,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    pub fn game_state(&self) -> &ClientGameState {
        &self.game_state
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn is_reporting(&self) -> bool {
        self.self_report.is_running()
    }

    /// Number of `PlayerUpdate` messages handed to the transport.
    pub fn reports_sent(&self) -> u64 {
        self.reports_sent
    }

    /// Drains every pending transport event, then sends the self-report if
    /// it is due. Does nothing once disconnected.
    pub fn tick<V: VisualSink>(&mut self, now: Instant, visuals: &mut V) {
        if self.state == ConnectionState::Disconnected {
            return;
        }

        loop {
            match self.transport.pop_event() {
                TransportEvent::Empty => break,
                TransportEvent::Connect => self.on_connect(now),
                TransportEvent::Data(bytes) => self.on_data(&bytes, visuals),
                TransportEvent::Disconnect => {
                    self.on_disconnect();
                    return;
                }
            }
        }

        if self.self_report.poll(now) {
            self.send_self_report();
        }
    }

    /// Applies a local movement delta on the XY plane. The cube stays
    /// movable after a disconnect; it just stops being reported.
    pub fn move_local<V: VisualSink>(&mut self, delta: (f32, f32), visuals: &mut V) -> bool {
        self.game_state.move_local(delta.0, delta.1, visuals)
    }

    /// Closes the connection from our side. The server notices on its own.
    pub fn disconnect(&mut self) {
        if self.state == ConnectionState::Disconnected {
            return;
        }
        info!("Disconnecting from server");
        self.transport.disconnect();
        self.state = ConnectionState::Disconnected;
        self.self_report.stop();
    }

    fn on_connect(&mut self, now: Instant) {
        info!("We are now connected to the server");
        self.state = ConnectionState::Connected;
        self.self_report.start(now);
    }

    fn on_data<V: VisualSink>(&mut self, bytes: &[u8], visuals: &mut V) {
        let message = match Message::decode(bytes) {
            Ok(message) => message,
            Err(e) => {
                warn!("Dropping message from server: {}", e);
                return;
            }
        };

        match message {
            Message::Handshake { player } => self.game_state.apply_handshake(player, visuals),
            Message::ServerUpdate { players } => {
                let outcome = self.game_state.apply_server_update(players, visuals);
                debug!(
                    "Server update: {} new, {} moved",
                    outcome.created, outcome.updated
                );
            }
            Message::PlayerDelete { player } => {
                self.game_state.apply_delete(&player, visuals);
            }
            other => warn!("Unrecognized message {} received", other.command()),
        }
    }

    fn on_disconnect(&mut self) {
        info!("Client got disconnected from server");
        self.state = ConnectionState::Disconnected;
        self.self_report.stop();
    }

    fn send_self_report(&mut self) {
        // Nothing to report until the server has told us who we are.
        let Some(player) = self.game_state.local_player() else {
            return;
        };

        let payload = match (Message::PlayerUpdate {
            player: player.clone(),
        })
        .encode()
        {
            Ok(payload) => payload,
            Err(e) => {
                error!("Failed to encode player update: {}", e);
                return;
            }
        };

        match self.transport.send(&payload) {
            Ok(()) => self.reports_sent += 1,
            Err(e) => warn!("Failed to send player update: {}", e),
        }
    }
}
