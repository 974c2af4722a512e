use rand::{seq::SliceRandom, thread_rng, Rng};
use strum::IntoEnumIterator;

use crate::{
    card::{Card, CardColor, Rank},
    constants::*,
};

/// The draw pile. The top card is the last element so drawing is a `pop`.
#[derive(Debug, Clone, Default)]
pub struct Deck(pub(crate) Vec<Card>);

impl Deck {
    /// A full, unshuffled deck.
    pub fn new() -> Self {
        let mut cards = Vec::with_capacity(TOTAL_CARDS_IN_DECK.into());

        for color in CardColor::iter().filter(|color| color.is_regular()) {
            // Digit Cards
            for rank in Rank::DIGITS {
                let copies = match rank {
                    Rank::Zero => ZERO_CARDS_PER_COLOR,
                    _ => DIGIT_CARDS_PER_COLOR,
                };
                for _ in 0..copies {
                    cards.push(Card::new(color, rank));
                }
            }

            // Reverse, Skip and Draw Two Cards
            for rank in Rank::REGULAR_POWERS {
                for _ in 0..REGULAR_POWER_CARDS_PER_COLOR {
                    cards.push(Card::new(color, rank));
                }
            }
        }

        for rank in Rank::SPECIAL_POWERS {
            for _ in 0..SPECIAL_POWER_CARDS {
                cards.push(Card::colorless(rank));
            }
        }

        Self(cards)
    }

    pub fn shuffled() -> Self {
        let mut deck = Self::new();
        deck.shuffle(&mut thread_rng());
        deck
    }

    /// Builds a deck in the given order, the first card being the top of the pile.
    pub fn from_cards(cards: impl IntoIterator<Item = Card>) -> Self {
        let mut cards = cards.into_iter().collect::<Vec<_>>();
        cards.reverse();
        Self(cards)
    }

    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.0.shuffle(rng);
    }

    pub fn draw(&mut self) -> Option<Card> {
        self.0.pop()
    }

    pub fn peek(&self) -> Option<&Card> {
        self.0.last()
    }

    /// Puts played cards back under the deck. Special cards lose their declared color.
    pub fn refill<R: Rng + ?Sized>(&mut self, cards: impl IntoIterator<Item = Card>, rng: &mut R) {
        let mut returned = cards.into_iter().map(Card::reset).collect::<Vec<_>>();
        returned.shuffle(rng);
        returned.append(&mut self.0);
        self.0 = returned;
    }

    pub fn cards_count(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
