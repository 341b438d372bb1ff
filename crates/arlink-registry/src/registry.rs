//! Pairing of present participants with placed slots.
//!
//! Every tracked participant is either assigned to exactly one slot or
//! waiting in `pending`; every tracked slot is either assigned to exactly one
//! participant or waiting in `free`. Both queues are served from the front.
//! New arrivals go to the back; anything displaced by a removal goes to the
//! front so interrupted work is resumed first.

use std::collections::{BTreeMap, VecDeque};

use arlink_core::{ParticipantId, RegistryError, RegistryEvent, SlotHandle, TrackedId};
use arlink_renderer::RenderSink;
use serde::Serialize;
use tracing::{debug, info};

// MARK: - Partition

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Assignment {
    pub participant: ParticipantId,
    pub slot: SlotHandle,
}

/// Snapshot of the whole registry, comparable across runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Partition {
    /// Sorted by participant.
    pub assigned: Vec<Assignment>,
    pub pending: Vec<ParticipantId>,
    pub free: Vec<SlotHandle>,
}

// MARK: - SlotRegistry

pub struct SlotRegistry<R> {
    sink: R,
    by_participant: BTreeMap<ParticipantId, SlotHandle>,
    by_slot: BTreeMap<SlotHandle, ParticipantId>,
    pending: VecDeque<ParticipantId>,
    free: VecDeque<SlotHandle>,
}

impl<R: RenderSink> SlotRegistry<R> {
    pub fn new(sink: R) -> Self {
        Self {
            sink,
            by_participant: BTreeMap::new(),
            by_slot: BTreeMap::new(),
            pending: VecDeque::new(),
            free: VecDeque::new(),
        }
    }

    // ── Entry points ──────────────────────────────────────────────────────────

    /// A remote participant joined the session.
    pub fn on_participant_joined(&mut self, participant: ParticipantId) -> Result<(), RegistryError> {
        if self.tracks_participant(participant) {
            return Err(RegistryError::DuplicateId(TrackedId::Participant(participant)));
        }

        match self.free.pop_front() {
            Some(slot) => self.attach(participant, slot),
            None => {
                debug!("{} waiting for a slot (pending={})", participant, self.pending.len() + 1);
                self.pending.push_back(participant);
            }
        }
        Ok(())
    }

    /// A remote participant left the session.
    ///
    /// A slot it occupied goes straight to the oldest pending participant, if
    /// any.
    pub fn on_participant_left(&mut self, participant: ParticipantId) -> Result<(), RegistryError> {
        if let Some(&slot) = self.by_participant.get(&participant) {
            self.expect_occupant(slot, participant)?;
            self.detach(participant, slot);
            self.reassign_or_free_at_front(slot);
            return Ok(());
        }

        match self.pending.iter().position(|&p| p == participant) {
            Some(index) => {
                self.pending.remove(index);
                debug!("{} left while pending", participant);
                Ok(())
            }
            None => Err(RegistryError::UnknownId(TrackedId::Participant(participant))),
        }
    }

    /// The user placed a new slot in the scene.
    pub fn on_slot_created(&mut self, slot: SlotHandle) -> Result<(), RegistryError> {
        if self.tracks_slot(slot) {
            return Err(RegistryError::DuplicateId(TrackedId::Slot(slot)));
        }

        match self.pending.pop_front() {
            Some(participant) => self.attach(participant, slot),
            None => {
                debug!("{} idle (free={})", slot, self.free.len() + 1);
                self.free.push_back(slot);
            }
        }
        Ok(())
    }

    /// The user removed a slot from the scene.
    ///
    /// Its occupant becomes the first pending participant, ahead of everyone
    /// already waiting, even if other slots are free.
    pub fn on_slot_destroyed(&mut self, slot: SlotHandle) -> Result<(), RegistryError> {
        if let Some(&participant) = self.by_slot.get(&slot) {
            self.expect_assignment(participant, slot)?;
            self.detach(participant, slot);
            self.reinsert_displaced_at_front(participant);
            return Ok(());
        }

        match self.free.iter().position(|&s| s == slot) {
            Some(index) => {
                self.free.remove(index);
                debug!("{} removed while idle", slot);
                Ok(())
            }
            None => Err(RegistryError::UnknownId(TrackedId::Slot(slot))),
        }
    }

    /// Route one event from the serialized stream to its entry point.
    pub fn apply(&mut self, event: &RegistryEvent) -> Result<(), RegistryError> {
        match *event {
            RegistryEvent::ParticipantJoined { participant } => self.on_participant_joined(participant),
            RegistryEvent::ParticipantLeft { participant, reason } => {
                debug!("{} leaving: {}", participant, reason);
                self.on_participant_left(participant)
            }
            RegistryEvent::SlotCreated { slot } => self.on_slot_created(slot),
            RegistryEvent::SlotDestroyed { slot } => self.on_slot_destroyed(slot),
        }
    }

    // ── Queries ───────────────────────────────────────────────────────────────

    pub fn assignment_of(&self, participant: ParticipantId) -> Option<SlotHandle> {
        self.by_participant.get(&participant).copied()
    }

    pub fn occupant_of(&self, slot: SlotHandle) -> Option<ParticipantId> {
        self.by_slot.get(&slot).copied()
    }

    pub fn pending(&self) -> impl ExactSizeIterator<Item = ParticipantId> + '_ {
        self.pending.iter().copied()
    }

    pub fn free(&self) -> impl ExactSizeIterator<Item = SlotHandle> + '_ {
        self.free.iter().copied()
    }

    pub fn participant_count(&self) -> usize {
        self.by_participant.len() + self.pending.len()
    }

    pub fn slot_count(&self) -> usize {
        self.by_slot.len() + self.free.len()
    }

    pub fn partition(&self) -> Partition {
        Partition {
            assigned: self
                .by_participant
                .iter()
                .map(|(&participant, &slot)| Assignment { participant, slot })
                .collect(),
            pending: self.pending.iter().copied().collect(),
            free: self.free.iter().copied().collect(),
        }
    }

    pub fn sink(&self) -> &R {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut R {
        &mut self.sink
    }

    pub fn into_sink(self) -> R {
        self.sink
    }

    /// Full consistency check of the four collections.
    pub fn verify(&self) -> Result<(), RegistryError> {
        if self.by_participant.len() != self.by_slot.len() {
            return Err(violation(format!(
                "{} participants assigned but {} slots occupied",
                self.by_participant.len(),
                self.by_slot.len()
            )));
        }
        for (&participant, &slot) in &self.by_participant {
            if self.by_slot.get(&slot) != Some(&participant) {
                return Err(violation(format!("{participant} → {slot} has no reverse entry")));
            }
        }

        let mut seen = std::collections::BTreeSet::new();
        for &participant in &self.pending {
            if !seen.insert(participant) {
                return Err(violation(format!("{participant} pending twice")));
            }
            if self.by_participant.contains_key(&participant) {
                return Err(violation(format!("{participant} both pending and assigned")));
            }
        }

        let mut seen = std::collections::BTreeSet::new();
        for &slot in &self.free {
            if !seen.insert(slot) {
                return Err(violation(format!("{slot} free twice")));
            }
            if self.by_slot.contains_key(&slot) {
                return Err(violation(format!("{slot} both free and assigned")));
            }
        }
        Ok(())
    }

    // ── Reinsertion policies ──────────────────────────────────────────────────

    /// A participant lost its slot: put it ahead of everyone already waiting.
    fn reinsert_displaced_at_front(&mut self, participant: ParticipantId) {
        debug!("{} displaced, first in line", participant);
        self.pending.push_front(participant);
    }

    /// A slot lost its occupant: hand it to the longest-waiting participant,
    /// else make it the first free slot.
    fn reassign_or_free_at_front(&mut self, slot: SlotHandle) {
        match self.pending.pop_front() {
            Some(participant) => self.attach(participant, slot),
            None => {
                debug!("{} vacated, first free", slot);
                self.free.push_front(slot);
            }
        }
    }

    // ── Internals ─────────────────────────────────────────────────────────────

    fn attach(&mut self, participant: ParticipantId, slot: SlotHandle) {
        self.by_participant.insert(participant, slot);
        self.by_slot.insert(slot, participant);
        info!("Attach {} → {}", participant, slot);
        self.sink.attach(participant, slot);
    }

    fn detach(&mut self, participant: ParticipantId, slot: SlotHandle) {
        self.by_participant.remove(&participant);
        self.by_slot.remove(&slot);
        info!("Detach {} from {}", participant, slot);
        self.sink.detach(participant);
    }

    fn tracks_participant(&self, participant: ParticipantId) -> bool {
        self.by_participant.contains_key(&participant) || self.pending.contains(&participant)
    }

    fn tracks_slot(&self, slot: SlotHandle) -> bool {
        self.by_slot.contains_key(&slot) || self.free.contains(&slot)
    }

    fn expect_occupant(&self, slot: SlotHandle, participant: ParticipantId) -> Result<(), RegistryError> {
        match self.by_slot.get(&slot) {
            Some(&p) if p == participant => Ok(()),
            other => Err(violation(format!("{participant} → {slot} but slot holds {other:?}"))),
        }
    }

    fn expect_assignment(&self, participant: ParticipantId, slot: SlotHandle) -> Result<(), RegistryError> {
        match self.by_participant.get(&participant) {
            Some(&s) if s == slot => Ok(()),
            other => Err(violation(format!("{slot} held by {participant} but it maps to {other:?}"))),
        }
    }
}

fn violation(reason: impl Into<String>) -> RegistryError {
    RegistryError::InvariantViolation { reason: reason.into() }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
