use std::mem;

use rand::thread_rng;
use tracing::{debug, info, warn};

use crate::card::{Card, Rank};
use crate::constants::{MAX_PLAYERS, MIN_PLAYERS, STARTING_HAND_SIZE, UNO_PENALTY_CARDS};
use crate::deck::Deck;
use crate::error::{Result, UnoError};
use crate::hand::Hand;
use crate::race::{RaceVerdict, UnoRace};
use crate::turn::{Direction, GameEvent, Rejection, TurnAction, TurnOutcome};

/// The authoritative state of one game.
///
/// Every mutation records [`GameEvent`]s which the owner drains with [`Uno::take_events`] and
/// forwards to the players.
#[derive(Debug)]
pub struct Uno {
    deck: Deck,
    discard_pile: Vec<Card>,
    hands: Vec<Hand>,
    center_card: Card,
    current_player: usize,
    direction: Direction,
    race: UnoRace,
    winner: Option<usize>,
    events: Vec<GameEvent>,
}

impl Uno {
    pub fn new(player_count: usize) -> Result<Self> {
        Self::with_deck(player_count, Deck::shuffled())
    }

    /// Starts a game from `deck` as given: the center card comes off the top first, then each
    /// player in turn takes their whole starting hand.
    pub fn with_deck(player_count: usize, mut deck: Deck) -> Result<Self> {
        if player_count < MIN_PLAYERS {
            return Err(UnoError::NotEnoughPlayers);
        }
        if player_count > MAX_PLAYERS {
            return Err(UnoError::TooManyPlayers);
        }

        let mut discard_pile = Vec::new();
        let center_card = loop {
            let card = deck.draw().ok_or(UnoError::DeckExhausted)?;
            if !card.is_special() {
                break card;
            }
            discard_pile.push(card);
        };

        let mut hands = Vec::with_capacity(player_count);
        for _ in 0..player_count {
            let mut hand = Hand::new();
            for _ in 0..STARTING_HAND_SIZE {
                hand.add_card(deck.draw().ok_or(UnoError::DeckExhausted)?);
            }
            hands.push(hand);
        }

        info!(players = player_count, center = %center_card, "Dealt a new game");

        let mut uno = Self::with_table(center_card, hands, deck)?;
        uno.discard_pile = discard_pile;
        Ok(uno)
    }

    /// Starts a game from a table that is already laid out: `center` face up, one hand per player
    /// and `deck` left to draw from. Player 0 moves first. `center` should be a regular card.
    pub fn with_table(center: Card, hands: Vec<Hand>, deck: Deck) -> Result<Self> {
        let player_count = hands.len();
        if player_count < MIN_PLAYERS {
            return Err(UnoError::NotEnoughPlayers);
        }
        if player_count > MAX_PLAYERS {
            return Err(UnoError::TooManyPlayers);
        }

        Ok(Uno {
            deck,
            discard_pile: Vec::new(),
            hands,
            center_card: center,
            current_player: 0,
            direction: Direction::default(),
            race: UnoRace::new(player_count),
            winner: None,
            events: Vec::new(),
        })
    }

    pub fn play_turn(&mut self, player: usize, turn_action: TurnAction) -> Result<TurnOutcome> {
        match turn_action {
            TurnAction::Play { hand_index, card } => self.play_card(player, hand_index, card),
            TurnAction::Draw => self.draw_card(player),
            TurnAction::CallUno { time } => self.call_uno(player, time),
        }
    }

    /// Plays `card` for `player`. Special cards carry the declared color in `card.color`.
    ///
    /// A rejected play leaves the state untouched and the player may try again. `hand_index` is
    /// where the player believes the card sits; the reported index is the one actually removed.
    pub fn play_card(&mut self, player: usize, hand_index: usize, card: Card) -> Result<TurnOutcome> {
        self.check_player(player)?;

        let requested = hand_index;
        let hand_index = match self.check_play(player, requested, &card) {
            Ok(index) => index,
            Err(reason) => {
                warn!(player, %card, %reason, "Rejected play");
                self.events.push(GameEvent::PlayRejected { player, reason });
                return Ok(TurnOutcome::Rejected(reason));
            }
        };
        if hand_index != requested {
            debug!(player, requested, hand_index, "Card found elsewhere in hand");
        }

        self.hands[player].remove_at(hand_index);
        let previous = mem::replace(&mut self.center_card, card);
        self.discard_pile.push(previous);
        debug!(player, %card, "Card played");
        self.events.push(GameEvent::CardPlayed {
            player,
            hand_index,
            card,
        });

        match self.hands[player].cards_count() {
            0 => {
                self.finish(player);
                return Ok(TurnOutcome::Accepted);
            }
            1 => self.open_uno_race(player),
            _ => {}
        }

        match card.rank {
            Rank::DrawTwo | Rank::DrawFour => {
                self.advance();
                self.draw_for(self.current_player, card.rank.draw_penalty())?;
            }
            Rank::Reverse => {
                self.direction = self.direction.reversed();
                if self.hands.len() == 2 {
                    self.advance();
                }
            }
            Rank::Skip => self.advance(),
            _ => {}
        }

        self.end_turn();
        Ok(TurnOutcome::Accepted)
    }

    /// Draws one card for `player` and ends their turn. Ignored when it is not their turn.
    pub fn draw_card(&mut self, player: usize) -> Result<TurnOutcome> {
        self.check_player(player)?;

        if self.is_finished() || player != self.current_player {
            debug!(player, current = self.current_player, "Ignored out of turn draw");
            return Ok(TurnOutcome::Ignored);
        }

        self.draw_for(player, 1)?;
        self.end_turn();
        Ok(TurnOutcome::Accepted)
    }

    /// Records an Uno call from `player` made at client time `time`.
    pub fn call_uno(&mut self, player: usize, time: u32) -> Result<TurnOutcome> {
        self.check_player(player)?;

        if self.is_finished() || !self.race.record_call(player, time) {
            debug!(player, time, "Ignored Uno call outside a race");
            return Ok(TurnOutcome::Ignored);
        }

        debug!(player, time, target = ?self.race.target(), "Uno call recorded");
        Ok(TurnOutcome::Accepted)
    }

    /// Closes the Uno race `race` once its window has elapsed, penalizing its target if someone
    /// else called first. Returns `None` if that race is no longer open.
    pub fn resolve_uno_race(&mut self, race: u64) -> Result<Option<RaceVerdict>> {
        if race != self.race.generation() {
            return Ok(None);
        }
        let Some(verdict) = self.race.close() else {
            return Ok(None);
        };

        info!(
            target = verdict.target,
            fastest = ?verdict.fastest,
            penalized = verdict.penalized(),
            "Uno race resolved"
        );

        if verdict.penalized() {
            self.draw_for(verdict.target, UNO_PENALTY_CARDS)?;
        }
        self.events.push(GameEvent::UnoCleared {
            player: verdict.target,
        });

        Ok(Some(verdict))
    }

    /// Moves the turn one step in the current direction.
    pub fn advance(&mut self) {
        self.current_player = self.direction.step(self.current_player, self.hands.len());
    }

    pub fn take_events(&mut self) -> Vec<GameEvent> {
        mem::take(&mut self.events)
    }

    pub fn player_count(&self) -> usize {
        self.hands.len()
    }

    pub fn current_player(&self) -> usize {
        self.current_player
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn center_card(&self) -> &Card {
        &self.center_card
    }

    pub fn hand(&self, player: usize) -> Option<&Hand> {
        self.hands.get(player)
    }

    pub fn deck_cards_count(&self) -> usize {
        self.deck.cards_count()
    }

    pub fn discard_pile(&self) -> &[Card] {
        &self.discard_pile
    }

    pub fn uno_race(&self) -> &UnoRace {
        &self.race
    }

    pub fn winner(&self) -> Option<usize> {
        self.winner
    }

    pub fn is_finished(&self) -> bool {
        self.winner.is_some()
    }

    fn check_player(&self, player: usize) -> Result<()> {
        if player < self.hands.len() {
            Ok(())
        } else {
            Err(UnoError::UnknownPlayer(player))
        }
    }

    /// Returns where `card` sits in the player's hand if they may play it.
    fn check_play(&self, player: usize, hand_index: usize, card: &Card) -> Result<usize, Rejection> {
        if self.is_finished() {
            return Err(Rejection::GameOver);
        }
        if player != self.current_player {
            return Err(Rejection::NotYourTurn);
        }
        if !card.can_follow(&self.center_card) {
            return Err(Rejection::CannotFollow);
        }
        let index = self.hands[player]
            .position_of(hand_index, card)
            .ok_or(Rejection::CardNotInHand)?;
        if card.is_special() && !card.color.is_regular() {
            return Err(Rejection::UndeclaredColor);
        }
        Ok(index)
    }

    fn end_turn(&mut self) {
        self.advance();
        self.events.push(GameEvent::TurnEnded {
            next_player: self.current_player,
        });
    }

    fn finish(&mut self, player: usize) {
        info!(player, "Player won");
        self.winner = Some(player);
        self.events.push(GameEvent::PlayerWon { player });

        if let Some(verdict) = self.race.close() {
            self.events.push(GameEvent::UnoCleared {
                player: verdict.target,
            });
        }
    }

    fn open_uno_race(&mut self, player: usize) {
        match self.race.open(player) {
            Some(race) => self.events.push(GameEvent::UnoRaised { player, race }),
            None => warn!(
                player,
                active = ?self.race.target(),
                "Uno race already running, ignoring new trigger"
            ),
        }
    }

    /// Draws all `count` cards or none of them.
    fn draw_for(&mut self, player: usize, count: usize) -> Result<()> {
        if self.deck.cards_count() + self.discard_pile.len() < count {
            return Err(UnoError::DeckExhausted);
        }

        let mut cards = Vec::with_capacity(count);
        for _ in 0..count {
            cards.push(self.draw_from_deck()?);
        }

        self.hands[player].extend(cards.iter().copied());
        self.events.push(GameEvent::CardsDrawn { player, cards });
        Ok(())
    }

    fn draw_from_deck(&mut self) -> Result<Card> {
        if let Some(card) = self.deck.draw() {
            return Ok(card);
        }
        if self.discard_pile.is_empty() {
            return Err(UnoError::DeckExhausted);
        }

        debug!(
            cards = self.discard_pile.len(),
            "Deck empty, reshuffling the discard pile"
        );
        let played = mem::take(&mut self.discard_pile);
        self.deck.refill(played, &mut thread_rng());
        self.deck.draw().ok_or(UnoError::DeckExhausted)
    }
}
