use std::collections::VecDeque;
use riftgrab_core::{BodyId, ControllerId, EntityId};

/// Console debug output for `World::step`. Off unless `print_every > 0`.
#[derive(Copy, Clone, Debug)]
pub struct DebugSettings {
    pub print_every: u32,
    pub show_bodies: bool,
    pub show_owners: bool,
    pub show_energy: bool,
    pub max_lines: usize,
}

impl Default for DebugSettings {
    fn default() -> Self {
        Self { print_every: 0, show_bodies: false, show_owners: false, show_energy: false, max_lines: 32 }
    }
}

impl DebugSettings {
    #[inline] pub fn due(&self, tick: u64) -> bool {
        self.print_every > 0 && tick % self.print_every as u64 == 0
    }
}

/// Why a grab attempt did not start. Mirrors the tool's reject reasons without depending on it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RejectKind { InvalidBody, NoGroup, ClaimedElsewhere, Cooldown, NotDynamic }

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum LedgerEvent {
    GrabStart { controller: ControllerId, entity: EntityId, body: BodyId },
    GrabEnd { controller: ControllerId, entity: Option<EntityId> },
    Throw { controller: ControllerId, body: BodyId, members: u32, linear: f32 },
    Push { controller: ControllerId, body: BodyId, impulse: f32 },
    Tug { controller: ControllerId, entity: EntityId },
    Rejected { controller: ControllerId, kind: RejectKind },
    ForcedReset { controller: ControllerId },
}

/// Bounded event log; the oldest events drop once `cap` is reached.
pub struct Ledger { events: VecDeque<LedgerEvent>, cap: usize }

impl Ledger {
    pub fn new(cap: usize) -> Self { Self { events: VecDeque::with_capacity(cap.min(1024)), cap: cap.max(1) } }
    pub fn push(&mut self, e: LedgerEvent) {
        if self.events.len() == self.cap { self.events.pop_front(); }
        self.events.push_back(e);
    }
    pub fn clear(&mut self) { self.events.clear(); }
    pub fn len(&self) -> usize { self.events.len() }
    pub fn is_empty(&self) -> bool { self.events.is_empty() }
    pub fn last(&self) -> Option<&LedgerEvent> { self.events.back() }
    pub fn iter(&self) -> impl Iterator<Item = &LedgerEvent> + '_ { self.events.iter() }
    pub fn count(&self, pred: impl Fn(&LedgerEvent) -> bool) -> usize { self.events.iter().filter(|e| pred(e)).count() }
}

impl Default for Ledger {
    fn default() -> Self { Self::new(4096) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test] fn ledger_drops_oldest_when_full() {
        let mut l = Ledger::new(2);
        let c = ControllerId(1);
        l.push(LedgerEvent::ForcedReset { controller: c });
        l.push(LedgerEvent::GrabEnd { controller: c, entity: None });
        l.push(LedgerEvent::Tug { controller: c, entity: EntityId(3) });
        assert_eq!(l.len(), 2);
        assert!(matches!(l.iter().next(), Some(LedgerEvent::GrabEnd { .. })));
        assert!(matches!(l.last(), Some(LedgerEvent::Tug { .. })));
    }

    #[test] fn debug_due_every_n_ticks() {
        let d = DebugSettings { print_every: 3, ..Default::default() };
        assert!(d.due(3) && d.due(6) && !d.due(4));
        assert!(!DebugSettings::default().due(0));
    }
}
