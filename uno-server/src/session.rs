//! One running game and the connections seated at it.
//!
//! The [`Uno`] state is owned by a single coordinator task. Each connection gets a reader task,
//! which decodes requests and hands them to the coordinator, and a writer task, which drains
//! that player's outbox. A reader waits until its request has been fully applied and its notices
//! queued before it reads the next one. Uno race timers are plain sleeping tasks that report
//! back through the same command channel.

use std::time::Duration;

use tokio::{
    io::{self, AsyncRead, AsyncWrite, AsyncWriteExt, ReadHalf, WriteHalf},
    sync::{mpsc, oneshot},
    task::JoinHandle,
    time,
};
use tracing::{debug, info, info_span, warn, Instrument};
use uno_engine::{turn::GameEvent, uno::Uno};

use crate::{
    config::SessionConfig,
    error::{ProtocolError, SessionError},
    protocol::{ClientMessage, ServerMessage},
};

/// How long queued notices may take to reach a peer once its session is over.
const FLUSH_GRACE: Duration = Duration::from_millis(500);

#[derive(Debug)]
enum Command {
    Request {
        player: usize,
        message: ClientMessage,
        done: oneshot::Sender<()>,
    },
    UnoWindowElapsed {
        race: u64,
    },
    /// A connection stopped, either cleanly or with an error.
    Closed {
        player: usize,
        error: ProtocolError,
    },
}

/// How a session came to a normal end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionEnd {
    /// The player whose connection closed first.
    pub disconnected: usize,
    pub winner: Option<usize>,
}

pub struct Session {
    id: u64,
    uno: Uno,
    config: SessionConfig,
}

impl Session {
    /// Deals a freshly shuffled game for `config.players` players.
    pub fn new(id: u64, config: SessionConfig) -> Result<Self, SessionError> {
        Ok(Self::with_engine(id, Uno::new(config.players)?, config))
    }

    /// Wraps a game that has already been dealt.
    pub fn with_engine(id: u64, uno: Uno, config: SessionConfig) -> Self {
        Self { id, uno, config }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Plays the game over `streams`, where the stream at index `i` belongs to player `i`.
    ///
    /// Returns once any connection closes. A protocol violation, a transport failure or running
    /// out of cards ends the session with an error instead. Either way every connection is shut
    /// down before this returns.
    pub async fn run<S>(self, streams: Vec<S>) -> Result<SessionEnd, SessionError>
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let span = info_span!("session", id = self.id);
        self.play(streams).instrument(span).await
    }

    async fn play<S>(self, streams: Vec<S>) -> Result<SessionEnd, SessionError>
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let expected = self.uno.player_count();
        if streams.len() != expected {
            return Err(SessionError::WrongConnectionCount {
                expected,
                actual: streams.len(),
            });
        }

        let (commands, mut commands_rx) = mpsc::unbounded_channel();
        let mut outboxes = Vec::with_capacity(expected);
        let mut readers = Vec::with_capacity(expected);
        let mut writers = Vec::with_capacity(expected);

        for (player, stream) in streams.into_iter().enumerate() {
            let (read_half, write_half) = io::split(stream);
            let (outbox, inbox) = mpsc::unbounded_channel();
            outboxes.push(outbox);
            readers.push(tokio::spawn(
                read_requests(player, read_half, commands.clone()).in_current_span(),
            ));
            writers.push(tokio::spawn(
                write_notices(player, write_half, inbox, commands.clone()).in_current_span(),
            ));
        }

        let mut coordinator = Coordinator {
            uno: self.uno,
            outboxes,
            commands,
            uno_window: self.config.uno_window,
            uno_timer: None,
        };
        coordinator.announce_start();
        info!(players = expected, "Session started");

        let result = coordinator.run(&mut commands_rx).await;
        match &result {
            Ok(end) => info!(disconnected = end.disconnected, winner = ?end.winner, "Session over"),
            Err(e) => warn!("Session torn down: {e}"),
        }

        coordinator.cancel_uno_timer();
        for reader in &readers {
            reader.abort();
        }
        // Closing the outboxes lets each writer flush what is queued and shut its stream.
        drop(coordinator);
        for mut writer in writers {
            if time::timeout(FLUSH_GRACE, &mut writer).await.is_err() {
                writer.abort();
            }
        }

        result
    }
}

struct Coordinator {
    uno: Uno,
    outboxes: Vec<mpsc::UnboundedSender<ServerMessage>>,
    commands: mpsc::UnboundedSender<Command>,
    uno_window: Duration,
    uno_timer: Option<JoinHandle<()>>,
}

impl Coordinator {
    async fn run(
        &mut self,
        commands: &mut mpsc::UnboundedReceiver<Command>,
    ) -> Result<SessionEnd, SessionError> {
        // The coordinator holds a sender itself, so the channel never runs dry.
        while let Some(command) = commands.recv().await {
            match command {
                Command::Request {
                    player,
                    message,
                    done,
                } => {
                    self.handle_request(player, message)?;
                    let _ = done.send(());
                }
                Command::UnoWindowElapsed { race } => {
                    self.uno.resolve_uno_race(race)?;
                    self.dispatch_events();
                }
                Command::Closed {
                    player,
                    error: ProtocolError::Closed,
                } => {
                    info!(player, "Player disconnected");
                    return Ok(SessionEnd {
                        disconnected: player,
                        winner: self.uno.winner(),
                    });
                }
                Command::Closed { player, error } => {
                    return Err(SessionError::Connection {
                        player,
                        source: error,
                    });
                }
            }
        }

        unreachable!("the coordinator keeps its own command sender alive")
    }

    fn announce_start(&mut self) {
        let player_count = self.uno.player_count();
        let center = *self.uno.center_card();

        for player in 0..player_count {
            self.send_to(
                player,
                ServerMessage::StartGame {
                    player: player as u8,
                    player_count: player_count as u8,
                    center,
                },
            );
        }
        for player in 0..player_count {
            let cards = self
                .uno
                .hand(player)
                .map(|hand| hand.cards().to_vec())
                .unwrap_or_default();
            self.send_to(player, ServerMessage::DrawFromDeck { cards });
        }
        for player in 0..player_count {
            for opponent in (0..player_count).filter(|&opponent| opponent != player) {
                let count = self.uno.hand(opponent).map_or(0, |hand| hand.cards_count());
                self.send_to(
                    player,
                    ServerMessage::OpponentDrawFromDeck {
                        opponent: opponent as u8,
                        count: count as u8,
                    },
                );
            }
        }

        // Nothing the engine did while dealing needs forwarding.
        self.uno.take_events();
    }

    fn handle_request(&mut self, player: usize, message: ClientMessage) -> Result<(), SessionError> {
        debug!(player, ?message, "Request");

        let outcome = match message {
            ClientMessage::UseCard { hand_index, card } => {
                self.uno.play_card(player, hand_index as usize, card)?
            }
            ClientMessage::DrawCard => self.uno.draw_card(player)?,
            ClientMessage::CalledUno { player: named, time } => {
                if named as usize >= self.uno.player_count() {
                    return Err(SessionError::Connection {
                        player,
                        source: ProtocolError::UnknownPlayer(named),
                    });
                }
                debug!(player, named, "Uno called");
                self.uno.call_uno(player, time)?
            }
        };
        debug!(player, ?outcome, "Request handled");

        self.dispatch_events();
        Ok(())
    }

    /// Turns the engine's events into notices, in the order they happened.
    fn dispatch_events(&mut self) {
        for event in self.uno.take_events() {
            match event {
                GameEvent::CardPlayed {
                    player,
                    hand_index,
                    card,
                } => self.broadcast(ServerMessage::RemoveFromHand {
                    player: player as u8,
                    hand_index: hand_index as u8,
                    card,
                }),
                GameEvent::PlayRejected { player, .. } => {
                    self.send_to(player, ServerMessage::InvalidCardUse)
                }
                GameEvent::CardsDrawn { player, cards } => {
                    let count = cards.len() as u8;
                    for opponent in (0..self.outboxes.len()).filter(|&other| other != player) {
                        self.send_to(
                            opponent,
                            ServerMessage::OpponentDrawFromDeck {
                                opponent: player as u8,
                                count,
                            },
                        );
                    }
                    self.send_to(player, ServerMessage::DrawFromDeck { cards });
                }
                GameEvent::TurnEnded { next_player } => self.broadcast(ServerMessage::EndTurn {
                    next_player: next_player as u8,
                }),
                GameEvent::PlayerWon { player } => {
                    info!(player, "Player won");
                    self.cancel_uno_timer();
                    self.broadcast(ServerMessage::PlayerWon {
                        player: player as u8,
                    });
                }
                GameEvent::UnoRaised { player, race } => {
                    self.start_uno_timer(race);
                    self.broadcast(ServerMessage::Uno {
                        player: player as u8,
                    });
                }
                GameEvent::UnoCleared { .. } => {
                    self.cancel_uno_timer();
                    self.broadcast(ServerMessage::RemoveUno);
                }
            }
        }
    }

    fn start_uno_timer(&mut self, race: u64) {
        self.cancel_uno_timer();

        let commands = self.commands.clone();
        let window = self.uno_window;
        self.uno_timer = Some(tokio::spawn(
            async move {
                time::sleep(window).await;
                let _ = commands.send(Command::UnoWindowElapsed { race });
            }
            .in_current_span(),
        ));
    }

    fn cancel_uno_timer(&mut self) {
        if let Some(timer) = self.uno_timer.take() {
            timer.abort();
        }
    }

    fn send_to(&self, player: usize, message: ServerMessage) {
        if let Some(outbox) = self.outboxes.get(player) {
            // A closed outbox means the writer failed, which it reports on its own.
            let _ = outbox.send(message);
        }
    }

    fn broadcast(&self, message: ServerMessage) {
        for outbox in &self.outboxes {
            let _ = outbox.send(message.clone());
        }
    }
}

async fn read_requests<S: AsyncRead>(
    player: usize,
    mut reader: ReadHalf<S>,
    commands: mpsc::UnboundedSender<Command>,
) {
    loop {
        let message = match ClientMessage::read_from(&mut reader).await {
            Ok(message) => message,
            Err(error) => {
                let _ = commands.send(Command::Closed { player, error });
                return;
            }
        };

        let (done, applied) = oneshot::channel();
        let request = Command::Request {
            player,
            message,
            done,
        };
        if commands.send(request).is_err() || applied.await.is_err() {
            return;
        }
    }
}

async fn write_notices<S: AsyncWrite>(
    player: usize,
    mut writer: WriteHalf<S>,
    mut inbox: mpsc::UnboundedReceiver<ServerMessage>,
    commands: mpsc::UnboundedSender<Command>,
) {
    while let Some(message) = inbox.recv().await {
        let written = async {
            writer.write_all(&message.encode()).await?;
            writer.flush().await
        };
        if let Err(e) = written.await {
            debug!(player, "Write failed: {e}");
            let _ = commands.send(Command::Closed {
                player,
                error: e.into(),
            });
            return;
        }
    }

    let _ = writer.shutdown().await;
}
