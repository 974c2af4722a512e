//! Game rules for a networked Uno table: cards, the deck, hands, turn sequencing and the Uno
//! race. Everything here is synchronous; owners drive it one request at a time.

pub mod card;
pub mod constants;
pub mod deck;
pub mod error;
pub mod hand;
pub mod race;
pub mod turn;
pub mod uno;
