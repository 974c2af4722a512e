use std::io;

use thiserror::Error;
use uno_engine::error::UnoError;

/// Problems reading a message off a connection.
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Unknown opcode {0}")]
    UnknownOpcode(u8),
    #[error("Unknown card color {0}")]
    UnknownColor(u8),
    #[error("Unknown card rank {0}")]
    UnknownRank(u8),
    #[error("No seated player with id {0}")]
    UnknownPlayer(u8),
    /// The peer hung up between two messages.
    #[error("Connection closed")]
    Closed,
    #[error(transparent)]
    Io(#[from] io::Error),
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Connection of player {player} failed: {source}")]
    Connection {
        player: usize,
        #[source]
        source: ProtocolError,
    },
    #[error("Expected {expected} connections, got {actual}")]
    WrongConnectionCount { expected: usize, actual: usize },
    #[error(transparent)]
    Engine(#[from] UnoError),
}
