use std::time::Duration;

use strum::EnumCount;

use crate::card::{CardColor, Rank};

const REGULAR_COLORS: u8 = (CardColor::COUNT - 1) as u8;

pub(crate) const ZERO_CARDS_PER_COLOR: u8 = 1;
/// Copies of each digit from one to nine.
pub(crate) const DIGIT_CARDS_PER_COLOR: u8 = 2;
pub(crate) const REGULAR_POWER_CARDS_PER_COLOR: u8 = 2;
pub(crate) const SPECIAL_POWER_CARDS: u8 = 4;

pub(crate) const DIGIT_CARDS_IN_DECK: u8 = (ZERO_CARDS_PER_COLOR
    + DIGIT_CARDS_PER_COLOR * (Rank::DIGITS.len() as u8 - 1))
    * REGULAR_COLORS;
pub(crate) const REGULAR_POWER_CARDS_IN_DECK: u8 =
    REGULAR_POWER_CARDS_PER_COLOR * Rank::REGULAR_POWERS.len() as u8 * REGULAR_COLORS;
pub(crate) const SPECIAL_POWER_CARDS_IN_DECK: u8 =
    SPECIAL_POWER_CARDS * Rank::SPECIAL_POWERS.len() as u8;

pub const TOTAL_CARDS_IN_DECK: u8 =
    DIGIT_CARDS_IN_DECK + REGULAR_POWER_CARDS_IN_DECK + SPECIAL_POWER_CARDS_IN_DECK;

pub const STARTING_HAND_SIZE: u8 = 7;

pub const MIN_PLAYERS: usize = 1;
pub const MAX_PLAYERS: usize = 5;

pub const UNO_WINDOW: Duration = Duration::from_secs(3);
pub const UNO_PENALTY_CARDS: usize = 1;
