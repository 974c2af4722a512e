//! Bookkeeping for the Uno race: the window that opens when a player drops to one card, during
//! which every player may submit a timestamped call. The fastest call decides whether the player
//! on one card draws a penalty card.
//!
//! Timing itself lives with whoever owns the engine; this type only records calls and picks the
//! winner once told the window is over.

/// The result of a closed race.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RaceVerdict {
    /// The player who dropped to one card.
    pub target: usize,
    /// The player with the smallest call timestamp, if anyone called.
    pub fastest: Option<usize>,
}

impl RaceVerdict {
    /// The target is penalized when someone else called first.
    pub fn penalized(&self) -> bool {
        matches!(self.fastest, Some(fastest) if fastest != self.target)
    }
}

#[derive(Debug, Clone)]
pub struct UnoRace {
    target: Option<usize>,
    generation: u64,
    calls: Vec<Option<u32>>,
}

impl UnoRace {
    pub fn new(players: usize) -> Self {
        Self {
            target: None,
            generation: 0,
            calls: vec![None; players],
        }
    }

    pub fn is_open(&self) -> bool {
        self.target.is_some()
    }

    pub fn target(&self) -> Option<usize> {
        self.target
    }

    /// Identifies the current (or last) window so a stale timer cannot close a newer one.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Opens a window for `target`. Returns `None` if a window is already open.
    pub fn open(&mut self, target: usize) -> Option<u64> {
        if self.is_open() {
            return None;
        }

        self.target = Some(target);
        self.generation += 1;
        self.calls.iter_mut().for_each(|call| *call = None);
        Some(self.generation)
    }

    /// Records a call. Later calls from the same player replace earlier ones.
    /// Returns `false` when no window is open.
    pub fn record_call(&mut self, caller: usize, time: u32) -> bool {
        if !self.is_open() {
            return false;
        }

        match self.calls.get_mut(caller) {
            Some(call) => {
                *call = Some(time);
                true
            }
            None => false,
        }
    }

    pub fn call(&self, player: usize) -> Option<u32> {
        self.calls.get(player).copied().flatten()
    }

    /// Smallest timestamp wins; ties go to the lower player index.
    pub fn fastest_caller(&self) -> Option<usize> {
        self.calls
            .iter()
            .enumerate()
            .filter_map(|(player, call)| call.map(|time| (time, player)))
            .min()
            .map(|(_, player)| player)
    }

    /// Closes the open window, clearing every recorded call.
    pub fn close(&mut self) -> Option<RaceVerdict> {
        let target = self.target.take()?;
        let verdict = RaceVerdict {
            target,
            fastest: self.fastest_caller(),
        };
        self.calls.iter_mut().for_each(|call| *call = None);
        Some(verdict)
    }
}
