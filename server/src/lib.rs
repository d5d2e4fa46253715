//! # Cube Sync Server Library
//!
//! This library provides the authoritative side of the cube-sync protocol.
//! The server decides who exists: it assigns each connection a player
//! identity, keeps the canonical list of players, and periodically tells
//! every client what the whole world looks like.
//!
//! ## Core Responsibilities
//!
//! ### Identity
//! Every accepted connection gets a fresh player with a server-chosen id,
//! color and spawn point, announced to that connection with a `Handshake`.
//! Ids come from a counter that never resets.
//!
//! ### Trusted Self-Reports
//! Clients own their position. A `PlayerUpdate` simply overwrites the
//! stored position; updates for players that are already gone are ignored.
//!
//! ### Snapshots
//! At 10 Hz the full registry is copied and sent to every live connection
//! as a `ServerUpdate`.
//!
//! ### Disconnects
//! When a connection drops, its player is removed and every other live
//! connection receives a `PlayerDelete`, exactly once.
//!
//! ## Architecture Design
//!
//! ### Single-Threaded Tick
//! [`network::Server::tick`] is called once per host frame and never blocks.
//! Each tick cleans up retired connections, accepts new ones, drains every
//! connection's pending events in arrival order, and runs the broadcast when
//! it is due. Because all of this happens on one logical thread, the
//! registry needs no locking.
//!
//! ### Transport Agnostic
//! The server talks to a [`shared::ServerTransport`]. The binary uses TCP;
//! tests use the in-process loopback transport.
//!
//! ## Module Organization
//!
//! ### Registry Module (`registry`)
//! Player identities, colors, spawn points, position updates, snapshots.
//!
//! ### Broadcaster Module (`broadcaster`)
//! The 10 Hz snapshot fan-out and its lifetime.
//!
//! ### Network Module (`network`)
//! The per-tick connection loop and disconnect reconciliation.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::network::Server;
//! use shared::transport::tcp::TcpServerTransport;
//! use std::time::{Duration, Instant};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let transport = TcpServerTransport::bind("0.0.0.0:8080").await?;
//!     let mut server = Server::new(transport);
//!
//!     let mut frame = tokio::time::interval(Duration::from_millis(16));
//!     loop {
//!         frame.tick().await;
//!         server.tick(Instant::now());
//!     }
//! }
//! ```

pub mod broadcaster;
pub mod network;
pub mod registry;
