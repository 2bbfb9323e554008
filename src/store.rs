use log::{info, warn};
use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::data::{Booking, BookingId, ConflictReport, TermKey, WorkloadPolicy};
use crate::detector::detect;
use crate::error::StoreError;

#[derive(Debug, Default)]
struct Bookings {
    next_id: BookingId,
    by_id: BTreeMap<BookingId, Booking>,
}

impl Bookings {
    fn term(&self, term: &TermKey) -> Vec<Booking> {
        self.by_id
            .values()
            .filter(|b| &b.term == term)
            .cloned()
            .collect()
    }
}

/// In-memory booking store shared by the HTTP handlers.
#[derive(Debug, Default)]
pub struct ScheduleStore {
    inner: RwLock<Bookings>,
}

impl ScheduleStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Bookings> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Bookings> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of one term, ordered by id.
    pub fn bookings_for_term(&self, term: &TermKey) -> Vec<Booking> {
        self.read().term(term)
    }

    pub fn get(&self, id: BookingId) -> Option<Booking> {
        self.read().by_id.get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.read().by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Inserts `proposal` if it is conflict-free at commit time. Detection and
    /// insert share one write lock; a client-side `detect` is advisory only.
    ///
    /// `force` is an explicit, authorised override: the booking is written even
    /// with conflicts, and the override is logged.
    pub fn commit(
        &self,
        mut proposal: Booking,
        policy: &WorkloadPolicy,
        force: bool,
    ) -> Result<Booking, StoreError> {
        proposal.id = None;
        let mut bookings = self.write();
        guard(&proposal, &bookings.term(&proposal.term), policy, force)?;

        bookings.next_id += 1;
        let id = bookings.next_id;
        proposal.id = Some(id);
        bookings.by_id.insert(id, proposal.clone());
        info!("Committed booking {} ({}) for term {}", id, proposal.interval, proposal.term);
        Ok(proposal)
    }

    /// Replaces booking `id`, re-validating against everything but itself.
    pub fn update(
        &self,
        id: BookingId,
        mut proposal: Booking,
        policy: &WorkloadPolicy,
        force: bool,
    ) -> Result<Booking, StoreError> {
        proposal.id = Some(id);
        let mut bookings = self.write();
        if !bookings.by_id.contains_key(&id) {
            return Err(StoreError::NotFound(id));
        }
        guard(&proposal, &bookings.term(&proposal.term), policy, force)?;

        bookings.by_id.insert(id, proposal.clone());
        info!("Updated booking {} ({})", id, proposal.interval);
        Ok(proposal)
    }

    pub fn remove(&self, id: BookingId) -> Result<Booking, StoreError> {
        let removed = self.write().by_id.remove(&id).ok_or(StoreError::NotFound(id))?;
        info!("Removed booking {}", id);
        Ok(removed)
    }
}

fn guard(
    proposal: &Booking,
    existing: &[Booking],
    policy: &WorkloadPolicy,
    force: bool,
) -> Result<ConflictReport, StoreError> {
    let report = detect(proposal, existing, policy)?;
    if report.is_clear() {
        return Ok(report);
    }
    if force {
        warn!(
            "Forcing booking {} for professor {} past {} conflict(s), overloaded={}",
            proposal.interval,
            proposal.professor_id,
            report.conflict_count(),
            report.professor_workload.is_overloaded
        );
        return Ok(report);
    }
    info!(
        "Rejected booking {} with {} conflict(s)",
        proposal.interval,
        report.conflict_count()
    );
    Err(StoreError::Rejected(Box::new(report)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ScheduleType;
    use crate::error::EngineError;
    use crate::interval::{TimeInterval, parse_days};
    use std::sync::Arc;
    use std::thread;

    fn booking(prof: &str, room: &str, section: &str, subject: &str, start: u16) -> Booking {
        Booking {
            id: None,
            professor_id: prof.to_string(),
            section_id: section.to_string(),
            subject_id: subject.to_string(),
            room_id: Some(room.to_string()),
            schedule_type: ScheduleType::Onsite,
            interval: TimeInterval::new(parse_days(&["Mon"]).unwrap(), start, start + 90).unwrap(),
            term: TermKey::new("2025", 1),
        }
    }

    #[test]
    fn commit_assigns_ids_and_rejects_conflicts() {
        let store = ScheduleStore::new();
        let policy = WorkloadPolicy::default();

        let first = store.commit(booking("P1", "R5", "S1", "MATH101", 450), &policy, false).unwrap();
        assert_eq!(first.id, Some(1));

        let clash = store.commit(booking("P2", "R5", "S2", "SCI101", 480), &policy, false);
        match clash {
            Err(StoreError::Rejected(report)) => {
                assert_eq!(report.room.len(), 1);
                assert!(report.professor.is_empty());
            }
            other => panic!("expected rejection, got {other:?}"),
        }
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn force_records_override() {
        let store = ScheduleStore::new();
        let policy = WorkloadPolicy::default();
        store.commit(booking("P1", "R5", "S1", "MATH101", 450), &policy, false).unwrap();

        let forced = store.commit(booking("P1", "R6", "S2", "SCI101", 480), &policy, true).unwrap();
        assert_eq!(forced.id, Some(2));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn update_ignores_own_slot() {
        let store = ScheduleStore::new();
        let policy = WorkloadPolicy::default();
        let first = store.commit(booking("P1", "R5", "S1", "MATH101", 450), &policy, false).unwrap();

        let moved = store
            .update(1, first.with_interval(first.interval.with_times(480, 570)), &policy, false)
            .unwrap();
        assert_eq!(store.get(1), Some(moved));

        assert!(matches!(
            store.update(9, booking("P1", "R5", "S1", "MATH101", 600), &policy, false),
            Err(StoreError::NotFound(9))
        ));
    }

    #[test]
    fn malformed_booking_is_an_engine_error() {
        let store = ScheduleStore::new();
        let mut bad = booking("P1", "R5", "S1", "MATH101", 450);
        bad.room_id = None;
        assert!(matches!(
            store.commit(bad, &WorkloadPolicy::default(), true),
            Err(StoreError::Engine(EngineError::NoRoomForOnsiteSchedule(_)))
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn terms_are_isolated_and_removal_frees_the_slot() {
        let store = ScheduleStore::new();
        let policy = WorkloadPolicy::default();
        store.commit(booking("P1", "R5", "S1", "MATH101", 450), &policy, false).unwrap();

        let mut next_term = booking("P1", "R5", "S1", "MATH101", 450);
        next_term.term = TermKey::new("2025", 2);
        store.commit(next_term, &policy, false).unwrap();
        assert_eq!(store.bookings_for_term(&TermKey::new("2025", 1)).len(), 1);

        store.remove(1).unwrap();
        assert!(matches!(store.remove(1), Err(StoreError::NotFound(1))));
        store.commit(booking("P2", "R5", "S3", "ENG1", 450), &policy, false).unwrap();
    }

    #[test]
    fn concurrent_commits_admit_one_booking_per_slot() {
        let store = Arc::new(ScheduleStore::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    let proposal = booking(&format!("P{i}"), "R5", &format!("S{i}"), "ART", 600);
                    store.commit(proposal, &WorkloadPolicy::default(), false).is_ok()
                })
            })
            .collect();

        let accepted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(accepted, 1);
        assert_eq!(store.len(), 1);
    }
}
