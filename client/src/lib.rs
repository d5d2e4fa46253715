//! # Cube Sync Client Library
//!
//! This library provides the client side of the cube-sync protocol. A client
//! opens one connection, learns its identity from the server, moves its own
//! cube locally, and keeps a mirror of every other player up to date from
//! the server's snapshots.
//!
//! ## Architecture Overview
//!
//! ### Trusted Self-Reports
//! The client owns its cube's position. Movement is applied immediately and
//! reported to the server at 10 Hz with a `PlayerUpdate`. Nothing is
//! reported until the `Handshake` has arrived.
//!
//! ### Snapshot Reconciliation
//! Every `ServerUpdate` carries the full world, including ourselves. The
//! client skips its own entry, moves mirrors it already knows and creates
//! mirrors for ids it has never seen. Players missing from a snapshot are
//! left in place; only a `PlayerDelete` removes one.
//!
//! ### No Reconnect
//! Once the connection drops the client stops reporting and stays
//! disconnected.
//!
//! ## Module Organization
//!
//! ### Game Module (`game`)
//! The reconciliation engine and the [`game::VisualSink`] trait through which
//! it creates, moves and destroys on-screen objects.
//!
//! ### Network Module (`network`)
//! The per-frame connection loop: event pumping, message dispatch and the
//! self-report timer.
//!
//! ### Input Module (`input`)
//! Keyboard sampling into per-frame movement deltas.
//!
//! ### Rendering Module (`rendering`)
//! A macroquad [`rendering::Scene`] that implements `VisualSink` and draws
//! the world and a status panel.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::network::Client;
//! use client::rendering::Scene;
//! use shared::transport::tcp::TcpClientTransport;
//! use std::time::Instant;
//!
//! let runtime = tokio::runtime::Runtime::new().unwrap();
//! let transport = TcpClientTransport::connect("127.0.0.1:8080", runtime.handle());
//! let mut client = Client::new(transport);
//! let mut scene = Scene::new();
//!
//! // Once per frame
//! client.move_local((0.1, 0.0), &mut scene);
//! client.tick(Instant::now(), &mut scene);
//! ```

pub mod game;
pub mod input;
pub mod network;
pub mod rendering;
