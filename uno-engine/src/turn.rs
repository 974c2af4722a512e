use strum_macros::Display;

use crate::card::Card;

/// A request made by one player. For special cards, `card.color` is the color the player declares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnAction {
    Play { hand_index: usize, card: Card },
    Draw,
    CallUno { time: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    Accepted,
    Rejected(Rejection),
    /// The request had no effect and nobody needs to hear about it.
    Ignored,
}

#[derive(Debug, Clone, Copy, Display, PartialEq, Eq)]
pub enum Rejection {
    #[strum(serialize = "the game is over")]
    GameOver,
    #[strum(serialize = "not this player's turn")]
    NotYourTurn,
    #[strum(serialize = "card cannot follow the center card")]
    CannotFollow,
    #[strum(serialize = "card is not in hand")]
    CardNotInHand,
    #[strum(serialize = "special card played without a regular color")]
    UndeclaredColor,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Ascending,
    Descending,
}

impl Direction {
    pub fn reversed(self) -> Self {
        match self {
            Direction::Ascending => Direction::Descending,
            Direction::Descending => Direction::Ascending,
        }
    }

    /// The player after `current` in a table of `players`.
    pub fn step(self, current: usize, players: usize) -> usize {
        match self {
            Direction::Ascending => (current + 1) % players,
            Direction::Descending => (current + players - 1) % players,
        }
    }
}

/// State changes the engine reports, in the order they happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    CardPlayed {
        player: usize,
        hand_index: usize,
        card: Card,
    },
    PlayRejected {
        player: usize,
        reason: Rejection,
    },
    CardsDrawn {
        player: usize,
        cards: Vec<Card>,
    },
    TurnEnded {
        next_player: usize,
    },
    PlayerWon {
        player: usize,
    },
    UnoRaised {
        player: usize,
        race: u64,
    },
    UnoCleared {
        player: usize,
    },
}
