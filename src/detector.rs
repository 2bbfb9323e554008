use itertools::Itertools;
use log::{debug, trace};

use crate::data::{Booking, Conflict, ConflictKind, ConflictReport, ProfessorWorkload, WorkloadPolicy};
use crate::error::EngineError;
use crate::interval::intersection;

/// Classifies every conflict between `proposal` and the existing bookings.
///
/// Only bookings of the proposal's term are considered, and a booking with the
/// proposal's own id is skipped so an edited booking can be re-validated. All
/// axes are evaluated; the caller decides which of them block a commit.
pub fn detect(
    proposal: &Booking,
    existing: &[Booking],
    policy: &WorkloadPolicy,
) -> Result<ConflictReport, EngineError> {
    proposal.validate()?;

    let same_term: Vec<&Booking> = existing
        .iter()
        .filter(|b| b.term == proposal.term)
        .filter(|b| proposal.id.is_none() || b.id != proposal.id)
        .collect();
    trace!(
        "Checking proposal {} against {} booking(s) in term {}",
        proposal.interval,
        same_term.len(),
        proposal.term
    );

    let mut report = ConflictReport {
        professor: Vec::new(),
        room: Vec::new(),
        section: Vec::new(),
        subject: Vec::new(),
        professor_workload: professor_workload(proposal, &same_term, policy),
    };

    let proposal_room = proposal.occupied_room();

    for booking in &same_term {
        let shared = intersection(&proposal.interval, &booking.interval);

        if let Some(slot) = shared {
            if booking.professor_id == proposal.professor_id {
                report.professor.push(conflict(
                    booking,
                    ConflictKind::ProfessorScheduleConflict,
                    format!(
                        "Professor {} already teaches {} to section {} on {}",
                        booking.professor_id, booking.subject_id, booking.section_id, slot
                    ),
                ));
            }

            if let Some(room) = proposal_room {
                if booking.occupied_room() == Some(room) {
                    report.room.push(conflict(
                        booking,
                        ConflictKind::RoomOccupied,
                        format!(
                            "Room {} is occupied by {} (section {}) on {}",
                            room, booking.subject_id, booking.section_id, slot
                        ),
                    ));
                }
            }

            if booking.section_id == proposal.section_id {
                report.section.push(conflict(
                    booking,
                    ConflictKind::SectionScheduleConflict,
                    format!(
                        "Section {} already has {} on {}",
                        booking.section_id, booking.subject_id, slot
                    ),
                ));
            }
        }

        if booking.section_id == proposal.section_id && booking.subject_id == proposal.subject_id
        {
            report.subject.push(conflict(
                booking,
                ConflictKind::DuplicateSubject,
                format!(
                    "Section {} is already scheduled for {} on {}",
                    booking.section_id, booking.subject_id, booking.interval
                ),
            ));
        }
    }

    debug!(
        "Detected conflicts for {}: professor={} room={} section={} subject={} overloaded={}",
        proposal.interval,
        report.professor.len(),
        report.room.len(),
        report.section.len(),
        report.subject.len(),
        report.professor_workload.is_overloaded
    );

    Ok(report)
}

/// Same as [`detect`], but only for the time-dependent axes.
pub(crate) fn clears_time_axes(
    proposal: &Booking,
    existing: &[Booking],
    policy: &WorkloadPolicy,
) -> Result<bool, EngineError> {
    detect(proposal, existing, policy).map(|report| !report.has_time_conflicts())
}

fn conflict(existing: &Booking, kind: ConflictKind, message: String) -> Conflict {
    Conflict {
        existing: existing.clone(),
        kind,
        message,
    }
}

fn professor_workload(
    proposal: &Booking,
    same_term: &[&Booking],
    policy: &WorkloadPolicy,
) -> ProfessorWorkload {
    let subjects: Vec<&str> = same_term
        .iter()
        .filter(|b| b.professor_id == proposal.professor_id)
        .map(|b| b.subject_id.as_str())
        .unique()
        .collect();

    let is_new_subject = !subjects.contains(&proposal.subject_id.as_str());
    let subject_count = subjects.len() + usize::from(is_new_subject);
    let max_subjects = policy.max_subjects_per_professor;
    let is_overloaded = subject_count > max_subjects;

    let message = if is_overloaded {
        format!(
            "Professor {} would teach {} subjects, exceeding the maximum of {}",
            proposal.professor_id, subject_count, max_subjects
        )
    } else {
        format!(
            "Professor {} would teach {} of at most {} subjects",
            proposal.professor_id, subject_count, max_subjects
        )
    };

    ProfessorWorkload {
        subject_count,
        max_subjects,
        is_overloaded,
        message,
    }
}
