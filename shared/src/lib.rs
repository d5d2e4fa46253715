//! Types shared by the cube-sync server and client: the player state that is
//! replicated across the wire, the message model, protocol constants, and the
//! transport boundary both sides poll.

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub mod error;
pub mod framing;
pub mod message;
pub mod schedule;
pub mod transport;

pub use error::{ProtocolError, TransportError};
pub use message::{Command, Message};
pub use schedule::Periodic;
pub use transport::{ClientTransport, ConnectionId, ServerTransport, TransportEvent};

/// Cadence of the server's snapshot broadcast (10 Hz).
pub const BROADCAST_INTERVAL: Duration = Duration::from_millis(100);
/// Cadence of the client's self-report (10 Hz).
pub const SELF_REPORT_INTERVAL: Duration = Duration::from_millis(100);
/// Silence after which a transport reports a connection as dropped.
pub const DISCONNECT_TIMEOUT: Duration = Duration::from_millis(2000);

/// Number of discrete steps each color channel is sampled from.
pub const COLOR_STEPS: u32 = 1000;
/// Size of one color step, so channels land in `[0, 0.999]`.
pub const COLOR_UNIT: f32 = 0.001;
/// First spawn point on the diagonal spawn line.
pub const SPAWN_ORIGIN: f32 = -0.25;
/// Distance between successive spawn points along each axis.
pub const SPAWN_SPACING: f32 = 0.25;
/// Local movement speed in world units per second.
pub const MOVE_SPEED: f32 = 10.0;

/// Server-assigned player identity, the decimal text of a monotonic counter.
pub type PlayerId = String;

/// Point-in-time copy of every player the server knows about.
pub type Snapshot = Vec<PlayerState>;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Builds a color from per-channel step indices in `0..COLOR_STEPS`.
    pub fn from_steps(r: u32, g: u32, b: u32) -> Self {
        Self {
            r: r as f32 * COLOR_UNIT,
            g: g as f32 * COLOR_UNIT,
            b: b as f32 * COLOR_UNIT,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.r.is_finite() && self.g.is_finite() && self.b.is_finite()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// A point with the same value on every axis.
    pub fn splat(v: f32) -> Self {
        Self { x: v, y: v, z: v }
    }

    pub fn translated(self, dx: f32, dy: f32, dz: f32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            z: self.z + dz,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// One participant's replicated object.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PlayerState {
    pub id: PlayerId,
    pub color: Rgb,
    pub position: Vec3,
}

impl PlayerState {
    pub fn new(id: impl Into<PlayerId>, color: Rgb, position: Vec3) -> Self {
        Self {
            id: id.into(),
            color,
            position,
        }
    }

    /// JSON has no encoding for infinities or NaN, so a state carrying one
    /// cannot be sent on.
    pub fn is_finite(&self) -> bool {
        self.color.is_finite() && self.position.is_finite()
    }
}

/// Spawn point for the player joining a registry that already holds `count`
/// players. Points lie on a diagonal line; overlaps after removals are fine.
pub fn spawn_position(count: usize) -> Vec3 {
    Vec3::splat(SPAWN_ORIGIN + SPAWN_SPACING * count as f32)
}
