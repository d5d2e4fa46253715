//! Error types for the wire protocol and the transport boundary.

use crate::transport::ConnectionId;
use std::io;
use thiserror::Error;

/// Failures decoding an incoming message. The offending message is dropped;
/// the connection it arrived on stays up.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProtocolError {
    #[error("malformed message: {0}")]
    MalformedMessage(String),

    #[error("unrecognized discriminant `{0}`")]
    UnrecognizedDiscriminant(String),

    #[error("failed to encode message: {0}")]
    Encode(String),
}

/// Failures at the transport boundary.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("failed to bind {addr}: {source}")]
    BindFailure {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("connection {0} is not live")]
    NotConnected(ConnectionId),

    #[error("connection closed")]
    Closed,

    #[error("frame too large: {0} bytes")]
    FrameTooLarge(usize),

    #[error("io error: {0}")]
    Io(#[from] io::Error),
}
