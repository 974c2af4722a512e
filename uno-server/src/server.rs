use std::{io, mem, net::SocketAddr, time::Duration};

use tokio::{
    net::{TcpListener, TcpStream, ToSocketAddrs},
    time,
};
use tracing::{error, info, warn};

use crate::{config::SessionConfig, session::Session};

const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Accepts players and seats every `players` consecutive connections at a new session.
pub struct Server {
    listener: TcpListener,
    config: SessionConfig,
}

impl Server {
    pub async fn bind(addr: impl ToSocketAddrs, config: SessionConfig) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        info!("Listening on {}", listener.local_addr()?);
        Ok(Self { listener, config })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Runs the lobby forever. Sessions run on their own tasks, so a game ending never stops
    /// the lobby.
    pub async fn run(self) {
        let mut next_id = 0;
        let mut waiting: Vec<TcpStream> = Vec::with_capacity(self.config.players);

        loop {
            let (stream, peer) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    warn!("Failed to accept a connection: {e}");
                    time::sleep(ACCEPT_BACKOFF).await;
                    continue;
                }
            };
            if let Err(e) = stream.set_nodelay(true) {
                warn!(%peer, "Could not disable Nagle: {e}");
            }
            waiting.push(stream);
            info!(%peer, waiting = waiting.len(), needed = self.config.players, "Player joined");

            if waiting.len() < self.config.players {
                continue;
            }

            next_id += 1;
            let streams = mem::replace(&mut waiting, Vec::with_capacity(self.config.players));
            let config = self.config;
            tokio::spawn(async move {
                let session = match Session::new(next_id, config) {
                    Ok(session) => session,
                    Err(e) => {
                        error!(id = next_id, "Could not deal a session: {e}");
                        return;
                    }
                };
                // Outcomes are logged inside the session.
                let _ = session.run(streams).await;
            });
        }
    }
}
