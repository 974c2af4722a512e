use crate::card::Card;

/// The cards held by one player.
///
/// Membership is by `(color, rank)`, except for special cards which match by rank alone: the
/// copy in the hand is colorless while the copy a client plays carries its declared color.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hand(Vec<Card>);

impl Hand {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cards_count(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn cards(&self) -> &[Card] {
        &self.0
    }

    pub fn card_index(&self, card: &Card) -> Option<usize> {
        self.0.iter().position(|held| Self::matches(held, card))
    }

    pub fn contains(&self, card: &Card) -> bool {
        self.card_index(card).is_some()
    }

    pub fn add_card(&mut self, card: Card) {
        self.0.push(card);
    }

    /// Removes the first card matching `card`, returning the copy that was held.
    pub fn remove_card(&mut self, card: &Card) -> Option<Card> {
        self.card_index(card).map(|index| self.0.remove(index))
    }

    /// Where the held copy of `card` is, preferring `hint` when it points at one.
    pub fn position_of(&self, hint: usize, card: &Card) -> Option<usize> {
        match self.0.get(hint) {
            Some(held) if Self::matches(held, card) => Some(hint),
            _ => self.card_index(card),
        }
    }

    pub(crate) fn remove_at(&mut self, index: usize) -> Card {
        self.0.remove(index)
    }

    fn matches(held: &Card, wanted: &Card) -> bool {
        held.rank == wanted.rank && (wanted.is_special() || held.color == wanted.color)
    }
}

impl FromIterator<Card> for Hand {
    fn from_iter<I: IntoIterator<Item = Card>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Extend<Card> for Hand {
    fn extend<I: IntoIterator<Item = Card>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::{CardColor, Rank};

    #[test]
    fn regular_cards_match_on_color_and_rank() {
        let hand: Hand = [
            Card::new(CardColor::Red, Rank::Three),
            Card::new(CardColor::Blue, Rank::Skip),
        ]
        .into_iter()
        .collect();

        assert!(hand.contains(&Card::new(CardColor::Red, Rank::Three)));
        assert!(!hand.contains(&Card::new(CardColor::Green, Rank::Three)));
        assert!(!hand.contains(&Card::new(CardColor::Blue, Rank::Reverse)));
        assert_eq!(hand.card_index(&Card::new(CardColor::Blue, Rank::Skip)), Some(1));
    }

    #[test]
    fn special_cards_match_on_rank_alone() {
        let mut hand: Hand = [
            Card::new(CardColor::Yellow, Rank::Four),
            Card::colorless(Rank::Wild),
        ]
        .into_iter()
        .collect();

        let declared = Card::new(CardColor::Green, Rank::Wild);
        assert!(hand.contains(&declared));
        assert!(!hand.contains(&Card::new(CardColor::Green, Rank::DrawFour)));

        assert_eq!(hand.remove_card(&declared), Some(Card::colorless(Rank::Wild)));
        assert_eq!(hand.cards_count(), 1);
        assert!(!hand.contains(&declared));
    }

    #[test]
    fn position_prefers_the_hint() {
        let red_9 = Card::new(CardColor::Red, Rank::Nine);
        let hand: Hand = [red_9, Card::colorless(Rank::Wild), red_9].into_iter().collect();

        assert_eq!(hand.position_of(2, &red_9), Some(2));
        assert_eq!(hand.position_of(1, &red_9), Some(0));
        assert_eq!(hand.position_of(9, &red_9), Some(0));
        assert_eq!(hand.position_of(0, &Card::new(CardColor::Blue, Rank::Wild)), Some(1));
        assert_eq!(hand.position_of(0, &Card::new(CardColor::Blue, Rank::Nine)), None);
    }

    #[test]
    fn removing_a_duplicate_leaves_the_other_copy() {
        let red_9 = Card::new(CardColor::Red, Rank::Nine);
        let mut hand: Hand = [red_9, red_9].into_iter().collect();

        assert_eq!(hand.remove_card(&red_9), Some(red_9));
        assert!(hand.contains(&red_9));
        assert_eq!(hand.remove_card(&red_9), Some(red_9));
        assert!(hand.is_empty());
        assert_eq!(hand.remove_card(&red_9), None);
    }
}
