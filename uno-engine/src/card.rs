use core::fmt;
use std::fmt::Display;

use strum_macros::{Display, EnumCount as EnumCountMacro, EnumIter, EnumString, FromRepr};

/// Card colors. The discriminants are the wire indices, so the order must never change.
#[derive(
    Clone, Copy, Debug, Display, EnumString, EnumCountMacro, EnumIter, FromRepr, PartialEq, Eq, Hash,
)]
#[repr(u8)]
pub enum CardColor {
    Blue,
    Green,
    Red,
    Yellow,
    /// Colorless. Only carried by special cards that have not been played yet.
    Black,
}

impl CardColor {
    pub const REGULAR: [CardColor; 4] = [
        CardColor::Blue,
        CardColor::Green,
        CardColor::Red,
        CardColor::Yellow,
    ];

    pub fn is_regular(self) -> bool {
        self != CardColor::Black
    }

    pub fn index(self) -> u8 {
        self as u8
    }
}

/// Card ranks. The discriminants are the wire indices, so the order must never change.
#[derive(
    Clone, Copy, Debug, Display, EnumString, EnumCountMacro, EnumIter, FromRepr, PartialEq, Eq, Hash,
)]
#[repr(u8)]
pub enum Rank {
    #[strum(serialize = "0")]
    Zero,
    #[strum(serialize = "1")]
    One,
    #[strum(serialize = "2")]
    Two,
    #[strum(serialize = "3")]
    Three,
    #[strum(serialize = "4")]
    Four,
    #[strum(serialize = "5")]
    Five,
    #[strum(serialize = "6")]
    Six,
    #[strum(serialize = "7")]
    Seven,
    #[strum(serialize = "8")]
    Eight,
    #[strum(serialize = "9")]
    Nine,
    Reverse,
    Skip,
    #[strum(serialize = "Draw Two")]
    DrawTwo,
    #[strum(serialize = "Draw Four")]
    DrawFour,
    Wild,
}

impl Rank {
    pub const DIGITS: [Rank; 10] = [
        Rank::Zero,
        Rank::One,
        Rank::Two,
        Rank::Three,
        Rank::Four,
        Rank::Five,
        Rank::Six,
        Rank::Seven,
        Rank::Eight,
        Rank::Nine,
    ];
    pub const REGULAR_POWERS: [Rank; 3] = [Rank::Reverse, Rank::Skip, Rank::DrawTwo];
    pub const SPECIAL_POWERS: [Rank; 2] = [Rank::DrawFour, Rank::Wild];

    /// Special ranks are dealt colorless and take the color their player declares.
    pub fn is_special(self) -> bool {
        matches!(self, Rank::DrawFour | Rank::Wild)
    }

    /// Number of cards the next player is forced to draw.
    pub fn draw_penalty(self) -> usize {
        match self {
            Rank::DrawTwo => 2,
            Rank::DrawFour => 4,
            _ => 0,
        }
    }

    pub fn index(self) -> u8 {
        self as u8
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Card {
    pub color: CardColor,
    pub rank: Rank,
}

impl Card {
    pub const fn new(color: CardColor, rank: Rank) -> Self {
        Self { color, rank }
    }

    /// A special card as it sits in the deck, before anyone declared a color for it.
    pub const fn colorless(rank: Rank) -> Self {
        Self {
            color: CardColor::Black,
            rank,
        }
    }

    pub fn is_special(&self) -> bool {
        self.rank.is_special()
    }

    /// Whether this card may be placed on top of `center`.
    pub fn can_follow(&self, center: &Card) -> bool {
        self.rank.is_special() || self.rank == center.rank || self.color == center.color
    }

    /// The card as it lands on the center pile, carrying the declared color if it is special.
    pub fn played_as(self, declared: CardColor) -> Card {
        if self.is_special() {
            Card::new(declared, self.rank)
        } else {
            self
        }
    }

    /// Played special cards go back to colorless when they are shuffled into a deck again.
    pub fn reset(self) -> Card {
        if self.is_special() {
            Card::colorless(self.rank)
        } else {
            self
        }
    }
}

impl Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.color == CardColor::Black {
            write!(f, "{}", self.rank)
        } else {
            write!(f, "{} {}", self.color, self.rank)
        }
    }
}
