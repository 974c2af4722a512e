use std::time::Duration;

use clap::Parser;
use uno_engine::constants::{MAX_PLAYERS, UNO_WINDOW};

/// Runtime settings shared by every session a server starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Connections gathered into each session.
    pub players: usize,
    /// How long an Uno race stays open.
    pub uno_window: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            players: 2,
            uno_window: UNO_WINDOW,
        }
    }
}

#[derive(Parser, Debug, Clone)]
#[clap(author, version, about)]
pub struct Args {
    /// Address to bind to
    #[clap(short = 'H', long, env = "UNO_HOST", default_value = "127.0.0.1")]
    pub host: String,
    /// Port to listen on
    #[clap(short, long, env = "UNO_PORT", default_value = "29175")]
    pub port: u16,
    /// Players seated in each session
    #[clap(
        short = 'n',
        long,
        env = "UNO_PLAYERS",
        default_value = "2",
        value_parser = clap::value_parser!(u8).range(1..=MAX_PLAYERS as i64)
    )]
    pub players: u8,
    /// Length of the Uno race window in milliseconds
    #[clap(long, env = "UNO_WINDOW_MS", default_value = "3000")]
    pub uno_window_ms: u64,
}

impl Args {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            players: self.players as usize,
            uno_window: Duration::from_millis(self.uno_window_ms),
        }
    }
}
