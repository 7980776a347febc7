//! Dirty tracking for the two write-back channels.
//!
//! DESIGN
//! ======
//! Geometry (position/size) and content (payload/checklist/notes) are tracked
//! separately because they flush on different schedules:
//!
//! - Geometry marks go into one board-wide set behind a single debounce
//!   deadline. Every new mark pushes the deadline out. When it elapses the
//!   whole set is written as one batch.
//! - Content marks carry a deadline per item, so typing in one item never
//!   delays or absorbs another item's write.
//!
//! Time is an explicit millisecond clock supplied by the caller; this module
//! never reads a system clock.
//!
//! Every mark bumps a revision. Acks carry the revision seen at snapshot
//! time, so an item re-marked while its write was in flight stays dirty.

#[cfg(test)]
#[path = "dirty_test.rs"]
mod dirty_test;

use std::collections::HashMap;

use crate::consts::{CONTENT_DEBOUNCE_MS, GEOMETRY_DEBOUNCE_MS};
use crate::doc::ItemId;

/// Milliseconds on the caller's clock.
pub type Millis = u64;

/// Debounce windows for both channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceWindows {
    pub geometry_ms: Millis,
    pub content_ms: Millis,
}

impl Default for DebounceWindows {
    fn default() -> Self {
        Self { geometry_ms: GEOMETRY_DEBOUNCE_MS, content_ms: CONTENT_DEBOUNCE_MS }
    }
}

/// Revision stamps for a snapshotted geometry batch.
pub type GeometryTicket = Vec<(ItemId, u64)>;

#[derive(Debug, Clone, Copy)]
struct ContentMark {
    revision: u64,
    deadline: Option<Millis>,
}

/// Board-scoped dirty state for geometry and content.
#[derive(Debug, Default)]
pub struct DirtyTracker {
    windows: DebounceWindows,
    revision: u64,
    geometry: HashMap<ItemId, u64>,
    geometry_deadline: Option<Millis>,
    content: HashMap<ItemId, ContentMark>,
}

impl DirtyTracker {
    #[must_use]
    pub fn new(windows: DebounceWindows) -> Self {
        Self { windows, ..Default::default() }
    }

    #[must_use]
    pub fn windows(&self) -> DebounceWindows {
        self.windows
    }

    fn next_revision(&mut self) -> u64 {
        self.revision += 1;
        self.revision
    }

    // --- Marking ---

    /// Mark `id` geometry-dirty and restart the board-wide timer.
    pub fn mark_geometry(&mut self, id: ItemId, now: Millis) {
        let rev = self.next_revision();
        self.geometry.insert(id, rev);
        self.geometry_deadline = Some(now + self.windows.geometry_ms);
    }

    /// Mark `id` content-dirty and restart that item's timer.
    pub fn mark_content(&mut self, id: ItemId, now: Millis) {
        let revision = self.next_revision();
        let deadline = Some(now + self.windows.content_ms);
        self.content.insert(id, ContentMark { revision, deadline });
    }

    /// Drop every pending mark for `id`.
    pub fn cancel(&mut self, id: &ItemId) {
        self.geometry.remove(id);
        self.content.remove(id);
        if self.geometry.is_empty() {
            self.geometry_deadline = None;
        }
    }

    /// Move any pending marks from `old` to `new`.
    pub fn rekey(&mut self, old: &ItemId, new: ItemId) {
        if let Some(rev) = self.geometry.remove(old) {
            self.geometry.insert(new, rev);
        }
        if let Some(mark) = self.content.remove(old) {
            self.content.insert(new, mark);
        }
    }

    /// Drop everything, e.g. when the board is reloaded from the remote.
    pub fn clear(&mut self) {
        self.geometry.clear();
        self.content.clear();
        self.geometry_deadline = None;
    }

    // --- Queries ---

    #[must_use]
    pub fn is_geometry_dirty(&self, id: &ItemId) -> bool {
        self.geometry.contains_key(id)
    }

    #[must_use]
    pub fn is_content_dirty(&self, id: &ItemId) -> bool {
        self.content.contains_key(id)
    }

    /// Number of geometry-dirty items.
    #[must_use]
    pub fn geometry_len(&self) -> usize {
        self.geometry.len()
    }

    /// Number of content-dirty items.
    #[must_use]
    pub fn content_len(&self) -> usize {
        self.content.len()
    }

    /// Whether nothing is waiting to be written.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.geometry.is_empty() && self.content.is_empty()
    }

    /// The earliest armed deadline across both channels.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Millis> {
        let content = self.content.values().filter_map(|m| m.deadline).min();
        match (self.geometry_deadline, content) {
            (Some(g), Some(c)) => Some(g.min(c)),
            (g, c) => g.or(c),
        }
    }

    // --- Draining ---

    /// If the geometry timer has elapsed, disarm it and return a ticket for
    /// every dirty id. Ids stay dirty until acked.
    pub fn take_due_geometry(&mut self, now: Millis) -> Option<GeometryTicket> {
        match self.geometry_deadline {
            Some(deadline) if deadline <= now => Some(self.take_all_geometry()),
            _ => None,
        }
    }

    /// Disarm the geometry timer and ticket every dirty id regardless of time.
    pub fn take_all_geometry(&mut self) -> GeometryTicket {
        self.geometry_deadline = None;
        let mut ticket: GeometryTicket = self.geometry.iter().map(|(id, rev)| (*id, *rev)).collect();
        ticket.sort_by_key(|(_, rev)| *rev);
        ticket
    }

    /// Disarm and return `(id, revision)` for each item whose content timer
    /// has elapsed, oldest deadline first.
    pub fn take_due_content(&mut self, now: Millis) -> Vec<(ItemId, u64)> {
        let mut due: Vec<(Millis, ItemId, u64)> = self
            .content
            .iter()
            .filter_map(|(id, mark)| match mark.deadline {
                Some(d) if d <= now => Some((d, *id, mark.revision)),
                _ => None,
            })
            .collect();
        due.sort_by_key(|(d, _, rev)| (*d, *rev));
        for (_, id, _) in &due {
            if let Some(mark) = self.content.get_mut(id) {
                mark.deadline = None;
            }
        }
        due.into_iter().map(|(_, id, rev)| (id, rev)).collect()
    }

    /// Disarm and return every content-dirty item regardless of time.
    pub fn take_all_content(&mut self) -> Vec<(ItemId, u64)> {
        let mut all: Vec<(ItemId, u64)> = self
            .content
            .iter_mut()
            .map(|(id, mark)| {
                mark.deadline = None;
                (*id, mark.revision)
            })
            .collect();
        all.sort_by_key(|(_, rev)| *rev);
        all
    }

    // --- Acknowledging ---

    /// Clear ids from a successfully written geometry batch, unless they
    /// were re-marked after the snapshot.
    pub fn ack_geometry(&mut self, ticket: &[(ItemId, u64)]) {
        for (id, rev) in ticket {
            if self.geometry.get(id) == Some(rev) {
                self.geometry.remove(id);
            }
        }
        if self.geometry.is_empty() {
            self.geometry_deadline = None;
        }
    }

    /// Clear an item's content mark after a successful write, unless it was
    /// edited again after the snapshot.
    pub fn ack_content(&mut self, id: &ItemId, revision: u64) {
        if self.content.get(id).is_some_and(|m| m.revision == revision) {
            self.content.remove(id);
        }
    }
}
