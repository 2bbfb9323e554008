//! Alternative time slots for a conflicting proposal.

use itertools::Itertools;
use log::{debug, info, trace};

use crate::data::{Booking, Confidence, Recommendation, TimeBlock, WorkloadPolicy};
use crate::detector::clears_time_axes;
use crate::error::EngineError;
use crate::interval::{MINUTES_PER_DAY, Minutes, TimeInterval, format_time, within_window};

/// Offsets in minutes tried by the shift pass, in the order they are reported.
pub const SHIFT_OFFSETS: [i32; 5] = [-120, -60, 60, 120, 180];

/// Searches for conflict-free intervals on the proposal's days.
///
/// Results keep discovery order: shifts by [`SHIFT_OFFSETS`] first, then the
/// block table in table order, with later duplicates of a `(start, end)` dropped.
/// Every [`Confidence::Validated`] result clears the professor, room and
/// section axes when substituted into `proposal`. Duplicate subjects and
/// workload are not time-dependent and are left to the caller. When nothing
/// validates, the earliest and latest standard blocks are returned unchecked as
/// [`Confidence::Fallback`]. A window with `window_end <= window_start` yields
/// no recommendations at all; one ending past midnight is rejected.
pub fn recommend(
    proposal: &Booking,
    existing: &[Booking],
    policy: &WorkloadPolicy,
    blocks: &[TimeBlock],
    window_start: Minutes,
    window_end: Minutes,
) -> Result<Vec<Recommendation>, EngineError> {
    proposal.validate()?;

    if window_end <= window_start {
        debug!(
            "Operating window {}-{} is empty, nothing to recommend",
            format_time(window_start),
            format_time(window_end)
        );
        return Ok(Vec::new());
    }
    if window_end > MINUTES_PER_DAY {
        return Err(EngineError::InvalidInterval(format!(
            "operating window ends at {}, past midnight",
            window_end
        )));
    }

    let original = proposal.interval;
    let mut found = Vec::new();

    for offset in SHIFT_OFFSETS {
        let Some(candidate) = original.shifted(offset) else {
            trace!("Shift {offset:+} min leaves the day");
            continue;
        };
        if !within_window(&candidate, window_start, window_end) {
            trace!("Shift {offset:+} min to {candidate} is outside operating hours");
            continue;
        }
        if is_clear(proposal, candidate, existing, policy)? {
            found.push(Recommendation {
                interval: candidate,
                reason: shift_reason(offset),
                confidence: Confidence::Validated,
            });
        }
    }

    for block in blocks {
        let candidate = original.with_times(block.start, block.end);
        if candidate == original {
            continue;
        }
        if !within_window(&candidate, window_start, window_end) {
            trace!("{} is outside operating hours", block.label);
            continue;
        }
        if is_clear(proposal, candidate, existing, policy)? {
            found.push(Recommendation {
                interval: candidate,
                reason: block_reason(block),
                confidence: Confidence::Validated,
            });
        }
    }

    let found: Vec<Recommendation> = found
        .into_iter()
        .unique_by(|r| (r.interval.start, r.interval.end))
        .collect();

    if found.is_empty() {
        info!("No conflict-free slot for {original}, offering fallback blocks");
        return Ok(fallback(original, blocks, window_start, window_end));
    }

    info!("Found {} alternative slot(s) for {}", found.len(), original);
    Ok(found)
}

fn is_clear(
    proposal: &Booking,
    candidate: TimeInterval,
    existing: &[Booking],
    policy: &WorkloadPolicy,
) -> Result<bool, EngineError> {
    let clear = clears_time_axes(&proposal.with_interval(candidate), existing, policy)?;
    if !clear {
        trace!("Candidate {candidate} still conflicts");
    }
    Ok(clear)
}

fn shift_reason(offset: i32) -> String {
    let hours = offset.abs() / 60;
    let unit = if hours == 1 { "hour" } else { "hours" };
    let direction = if offset < 0 { "earlier" } else { "later" };
    format!("{hours} {unit} {direction} than requested")
}

fn block_reason(block: &TimeBlock) -> String {
    format!(
        "{} ({}-{})",
        block.label,
        format_time(block.start),
        format_time(block.end)
    )
}

fn fallback(
    original: TimeInterval,
    blocks: &[TimeBlock],
    window_start: Minutes,
    window_end: Minutes,
) -> Vec<Recommendation> {
    // The requested slot is only offered back when the table has nothing else.
    let others: Vec<&TimeBlock> = blocks
        .iter()
        .filter(|b| (b.start, b.end) != (original.start, original.end))
        .collect();
    let pool = if others.is_empty() {
        blocks.iter().collect()
    } else {
        others
    };
    let earliest = pool.iter().copied().min_by_key(|b| b.start);
    let latest = pool.iter().copied().max_by_key(|b| b.end);

    let candidates: Vec<(TimeInterval, String)> = match (earliest, latest) {
        (Some(first), Some(last)) => vec![
            (
                original.with_times(first.start, first.end),
                format!("earliest standard block, {}", block_reason(first)),
            ),
            (
                original.with_times(last.start, last.end),
                format!("latest standard block, {}", block_reason(last)),
            ),
        ],
        // Without a block table, anchor the requested duration to the window edges.
        _ => {
            let duration = original.duration().min(window_end - window_start);
            vec![
                (
                    original.with_times(window_start, window_start + duration),
                    "start of operating hours".to_string(),
                ),
                (
                    original.with_times(window_end - duration, window_end),
                    "end of operating hours".to_string(),
                ),
            ]
        }
    };

    candidates
        .into_iter()
        .unique_by(|(interval, _)| (interval.start, interval.end))
        .filter(|(interval, _)| interval.validate().is_ok())
        .map(|(interval, why)| Recommendation {
            interval,
            reason: format!("{why}; not checked against existing schedules"),
            confidence: Confidence::Fallback,
        })
        .collect()
}
