use thiserror::Error;

use crate::constants::MAX_PLAYERS;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum UnoError {
    #[error("Not enough players")]
    NotEnoughPlayers,
    #[error("Too many players (max: {MAX_PLAYERS})")]
    TooManyPlayers,
    #[error("No player with id {0}")]
    UnknownPlayer(usize),
    #[error("No cards left to draw")]
    DeckExhausted,
}

pub type Result<T, E = UnoError> = std::result::Result<T, E>;
