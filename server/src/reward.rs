use shared::PlayerId;

/// Deferred coin credits.
///
/// A hit is detected on the victim's frame, but the shooter's economy is
/// only touched on the shooter's own frame. Each entry is one pending
/// bounty; a shooter may appear several times.
#[derive(Debug, Default, Clone)]
pub struct RewardLedger {
    pending: Vec<PlayerId>,
}

impl RewardLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, shooter: PlayerId) {
        self.pending.push(shooter);
    }

    /// Removes every entry owed to `player` and returns how many there were.
    pub fn settle(&mut self, player: PlayerId) -> usize {
        let before = self.pending.len();
        self.pending.retain(|id| *id != player);
        before - self.pending.len()
    }

    /// Drops entries whose shooter no longer exists. Returns the number of
    /// entries removed.
    pub fn prune<F>(&mut self, is_live: F) -> usize
    where
        F: Fn(PlayerId) -> bool,
    {
        let before = self.pending.len();
        self.pending.retain(|id| is_live(*id));
        before - self.pending.len()
    }

    pub fn pending_for(&self, player: PlayerId) -> usize {
        self.pending.iter().filter(|id| **id == player).count()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
