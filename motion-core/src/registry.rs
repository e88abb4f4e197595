//! Animation state registry.
//!
//! Per-element flags keyed by [`TrackId`]. `animated`, `counted` and
//! `revealed` are one-shot: once set they never clear. `played` follows
//! visibility in both directions.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::element::TrackId;

/// Flags for one tracked element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct StateRecord {
    /// Entrance animation has fired.
    pub animated: bool,
    /// Counter ramp has started.
    pub counted: bool,
    /// Video is currently playing because it is visible.
    pub played: bool,
    /// Reveal overlay has slid away.
    pub revealed: bool,
    /// Video was playing when the document was hidden.
    pub was_playing: bool,
}

/// Keyed state map owned by the orchestrator.
#[derive(Debug, Clone, Default)]
pub struct AnimationStateRegistry {
    records: HashMap<TrackId, StateRecord>,
}

impl AnimationStateRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking an id. Existing state is kept.
    pub fn register(&mut self, id: TrackId) {
        self.records.entry(id).or_default();
    }

    /// Stop tracking an id, returning its last state.
    pub fn forget(&mut self, id: TrackId) -> Option<StateRecord> {
        self.records.remove(&id)
    }

    /// Current state for an id.
    #[must_use]
    pub fn get(&self, id: TrackId) -> Option<&StateRecord> {
        self.records.get(&id)
    }

    /// Number of tracked ids.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether nothing is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn set_once(&mut self, id: TrackId, flag: impl FnOnce(&mut StateRecord) -> &mut bool) -> bool {
        let slot = flag(self.records.entry(id).or_default());
        let changed = !*slot;
        *slot = true;
        changed
    }

    fn read(&self, id: TrackId, flag: impl FnOnce(&StateRecord) -> bool) -> bool {
        self.records.get(&id).is_some_and(flag)
    }

    /// Mark the entrance animation as fired. Returns `false` if it already was.
    pub fn mark_animated(&mut self, id: TrackId) -> bool {
        self.set_once(id, |r| &mut r.animated)
    }

    /// Whether the entrance animation has fired.
    #[must_use]
    pub fn is_animated(&self, id: TrackId) -> bool {
        self.read(id, |r| r.animated)
    }

    /// Mark the counter as started. Returns `false` if it already was.
    pub fn mark_counted(&mut self, id: TrackId) -> bool {
        self.set_once(id, |r| &mut r.counted)
    }

    /// Whether the counter has started.
    #[must_use]
    pub fn is_counted(&self, id: TrackId) -> bool {
        self.read(id, |r| r.counted)
    }

    /// Mark the reveal overlay as gone. Returns `false` if it already was.
    pub fn mark_revealed(&mut self, id: TrackId) -> bool {
        self.set_once(id, |r| &mut r.revealed)
    }

    /// Whether the reveal overlay is gone.
    #[must_use]
    pub fn is_revealed(&self, id: TrackId) -> bool {
        self.read(id, |r| r.revealed)
    }

    /// Whether the video is playing.
    #[must_use]
    pub fn is_playing(&self, id: TrackId) -> bool {
        self.read(id, |r| r.played)
    }

    /// Match play state to `playing`. Returns whether anything changed.
    pub fn set_playing(&mut self, id: TrackId, playing: bool) -> bool {
        let record = self.records.entry(id).or_default();
        let changed = record.played != playing;
        record.played = playing;
        changed
    }

    /// Remember whether a video was playing when the page was hidden.
    pub fn set_was_playing(&mut self, id: TrackId, was_playing: bool) {
        self.records.entry(id).or_default().was_playing = was_playing;
    }

    /// Take (and clear) the "was playing" flag.
    pub fn take_was_playing(&mut self, id: TrackId) -> bool {
        self.records
            .get_mut(&id)
            .is_some_and(|r| std::mem::take(&mut r.was_playing))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_shot_flags_report_first_transition_only() {
        let mut registry = AnimationStateRegistry::new();
        let id = TrackId::new();
        registry.register(id);
        assert!(!registry.is_animated(id));
        assert!(registry.mark_animated(id));
        assert!(!registry.mark_animated(id));
        assert!(registry.is_animated(id));

        assert!(registry.mark_counted(id));
        assert!(!registry.mark_counted(id));
        assert!(registry.mark_revealed(id));
        assert!(!registry.mark_revealed(id));
    }

    #[test]
    fn register_keeps_existing_state() {
        let mut registry = AnimationStateRegistry::new();
        let id = TrackId::new();
        registry.mark_animated(id);
        registry.register(id);
        assert!(registry.is_animated(id));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn playing_toggles_both_ways() {
        let mut registry = AnimationStateRegistry::new();
        let id = TrackId::new();
        assert!(!registry.set_playing(id, false));
        assert!(registry.set_playing(id, true));
        assert!(!registry.set_playing(id, true));
        assert!(registry.is_playing(id));
        assert!(registry.set_playing(id, false));
        assert!(!registry.is_playing(id));
    }

    #[test]
    fn was_playing_is_taken_once() {
        let mut registry = AnimationStateRegistry::new();
        let id = TrackId::new();
        registry.set_was_playing(id, true);
        assert!(registry.take_was_playing(id));
        assert!(!registry.take_was_playing(id));
    }

    #[test]
    fn unknown_ids_read_false() {
        let registry = AnimationStateRegistry::new();
        let id = TrackId::new();
        assert!(!registry.is_animated(id));
        assert!(!registry.is_playing(id));
        assert!(registry.get(id).is_none());
    }

    #[test]
    fn forget_drops_state() {
        let mut registry = AnimationStateRegistry::new();
        let id = TrackId::new();
        registry.mark_revealed(id);
        let record = registry.forget(id).expect("tracked");
        assert!(record.revealed);
        assert!(registry.is_empty());
    }
}
