//! Recurring weekly time blocks and the canonical `"HH:MM"` boundary.

use chrono::{NaiveTime, Timelike, Weekday};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::EngineError;

/// Minutes from midnight, `0..=1440`.
pub type Minutes = u16;

pub const MINUTES_PER_DAY: Minutes = 1440;

const ALL_DAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// A set of weekdays stored as a 7-bit mask, Monday in bit 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(from = "Vec<Weekday>", into = "Vec<Weekday>")]
pub struct DaySet(u8);

impl DaySet {
    pub fn empty() -> Self {
        DaySet(0)
    }

    pub fn insert(&mut self, day: Weekday) {
        self.0 |= 1 << day.num_days_from_monday();
    }

    pub fn contains(&self, day: Weekday) -> bool {
        self.0 & (1 << day.num_days_from_monday()) != 0
    }

    pub fn intersects(&self, other: DaySet) -> bool {
        self.0 & other.0 != 0
    }

    pub fn intersection(&self, other: DaySet) -> DaySet {
        DaySet(self.0 & other.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Days in Monday-first order.
    pub fn iter(&self) -> impl Iterator<Item = Weekday> {
        let set = *self;
        ALL_DAYS.into_iter().filter(move |d| set.contains(*d))
    }
}

impl FromIterator<Weekday> for DaySet {
    fn from_iter<I: IntoIterator<Item = Weekday>>(iter: I) -> Self {
        let mut set = DaySet::empty();
        for day in iter {
            set.insert(day);
        }
        set
    }
}

impl From<Vec<Weekday>> for DaySet {
    fn from(days: Vec<Weekday>) -> Self {
        days.into_iter().collect()
    }
}

impl From<DaySet> for Vec<Weekday> {
    fn from(set: DaySet) -> Self {
        set.iter().collect()
    }
}

impl fmt::Display for DaySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.iter().join(","))
    }
}

/// A time range repeated on a fixed set of weekdays for the whole term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct TimeInterval {
    pub days: DaySet,
    pub start: Minutes,
    pub end: Minutes,
}

impl TimeInterval {
    /// Builds an interval, rejecting malformed ranges instead of normalizing them.
    pub fn new(days: DaySet, start: Minutes, end: Minutes) -> Result<Self, EngineError> {
        let interval = TimeInterval { days, start, end };
        interval.validate()?;
        Ok(interval)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.days.is_empty() {
            return Err(EngineError::InvalidInterval("no days selected".to_string()));
        }
        if self.end > MINUTES_PER_DAY {
            return Err(EngineError::InvalidInterval(format!(
                "end {} is past midnight",
                self.end
            )));
        }
        if self.start >= self.end {
            return Err(EngineError::InvalidInterval(format!(
                "start {} is not before end {}",
                format_time(self.start),
                format_time(self.end)
            )));
        }
        Ok(())
    }

    pub fn duration(&self) -> Minutes {
        self.end.saturating_sub(self.start)
    }

    /// Same days, different times.
    pub fn with_times(&self, start: Minutes, end: Minutes) -> Self {
        TimeInterval {
            days: self.days,
            start,
            end,
        }
    }

    /// Moves both ends by `offset` minutes. `None` if the result leaves the day.
    pub fn shifted(&self, offset: i32) -> Option<Self> {
        let start = i32::from(self.start) + offset;
        let end = i32::from(self.end) + offset;
        let day = 0..=i32::from(MINUTES_PER_DAY);
        if !day.contains(&start) || !day.contains(&end) {
            return None;
        }
        Some(self.with_times(start as Minutes, end as Minutes))
    }
}

impl fmt::Display for TimeInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}-{}",
            self.days,
            format_time(self.start),
            format_time(self.end)
        )
    }
}

/// True iff the intervals share a day and their `[start, end)` ranges intersect,
/// so back-to-back classes do not overlap.
pub fn overlaps(a: &TimeInterval, b: &TimeInterval) -> bool {
    a.days.intersects(b.days) && a.start < b.end && b.start < a.end
}

/// The shared days and minutes of two overlapping intervals.
pub fn intersection(a: &TimeInterval, b: &TimeInterval) -> Option<TimeInterval> {
    if !overlaps(a, b) {
        return None;
    }
    Some(TimeInterval {
        days: a.days.intersection(b.days),
        start: a.start.max(b.start),
        end: a.end.min(b.end),
    })
}

pub fn within_window(t: &TimeInterval, window_start: Minutes, window_end: Minutes) -> bool {
    t.start >= window_start && t.end <= window_end
}

/// Parses `"HH:MM"` into minutes from midnight. `"24:00"` is accepted as end of day.
pub fn parse_time(s: &str) -> Result<Minutes, EngineError> {
    let trimmed = s.trim();
    if trimmed == "24:00" {
        return Ok(MINUTES_PER_DAY);
    }
    let time = NaiveTime::parse_from_str(trimmed, "%H:%M")
        .map_err(|_| EngineError::InvalidTime(s.to_string()))?;
    Ok((time.hour() * 60 + time.minute()) as Minutes)
}

pub fn format_time(minutes: Minutes) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// Parses weekday names such as `"Mon"` or `"Wednesday"`, case-insensitively.
pub fn parse_days<S: AsRef<str>>(names: &[S]) -> Result<DaySet, EngineError> {
    names
        .iter()
        .map(|name| {
            let name = name.as_ref();
            name.trim()
                .parse::<Weekday>()
                .map_err(|_| EngineError::InvalidDay(name.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iv(days: &[Weekday], start: Minutes, end: Minutes) -> TimeInterval {
        TimeInterval::new(days.iter().copied().collect(), start, end).expect("valid interval")
    }

    #[test]
    fn boundary_touch_is_not_overlap() {
        let a = iv(&[Weekday::Mon], 480, 540);
        let b = iv(&[Weekday::Mon], 540, 600);
        assert!(!overlaps(&a, &b));
        assert!(!overlaps(&b, &a));
    }

    #[test]
    fn overlap_is_symmetric() {
        let samples = [
            iv(&[Weekday::Mon], 450, 540),
            iv(&[Weekday::Mon, Weekday::Wed], 480, 570),
            iv(&[Weekday::Wed], 500, 520),
            iv(&[Weekday::Fri], 0, 1440),
            iv(&[Weekday::Mon], 540, 600),
        ];
        for a in &samples {
            for b in &samples {
                assert_eq!(overlaps(a, b), overlaps(b, a), "{a} vs {b}");
            }
        }
    }

    #[test]
    fn disjoint_days_never_overlap() {
        let a = iv(&[Weekday::Mon, Weekday::Wed], 0, 1440);
        let b = iv(&[Weekday::Tue, Weekday::Thu], 0, 1440);
        assert!(!overlaps(&a, &b));
    }

    #[test]
    fn containment_overlaps() {
        let outer = iv(&[Weekday::Tue], 480, 720);
        let inner = iv(&[Weekday::Tue], 540, 600);
        assert!(overlaps(&outer, &inner));
    }

    #[test]
    fn intersection_reports_shared_slot() {
        let a = iv(&[Weekday::Mon, Weekday::Wed], 450, 540);
        let b = iv(&[Weekday::Mon], 480, 570);
        let shared = intersection(&a, &b).expect("overlapping");
        assert_eq!(shared.to_string(), "Mon 08:00-09:00");
        assert_eq!(intersection(&a, &iv(&[Weekday::Mon], 540, 600)), None);
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let t = iv(&[Weekday::Mon], 450, 1080);
        assert!(within_window(&t, 450, 1080));
        assert!(!within_window(&t, 451, 1080));
        assert!(!within_window(&t, 450, 1079));
    }

    #[test]
    fn malformed_intervals_are_rejected() {
        let mon: DaySet = [Weekday::Mon].into_iter().collect();
        assert!(matches!(
            TimeInterval::new(mon, 600, 600),
            Err(EngineError::InvalidInterval(_))
        ));
        assert!(matches!(
            TimeInterval::new(DaySet::empty(), 480, 540),
            Err(EngineError::InvalidInterval(_))
        ));
        assert!(matches!(
            TimeInterval::new(mon, 1400, 1500),
            Err(EngineError::InvalidInterval(_))
        ));
    }

    #[test]
    fn parses_and_formats_times() {
        assert_eq!(parse_time("07:30").unwrap(), 450);
        assert_eq!(parse_time(" 18:00 ").unwrap(), 1080);
        assert_eq!(parse_time("24:00").unwrap(), 1440);
        assert!(matches!(parse_time("7.30"), Err(EngineError::InvalidTime(_))));
        assert!(matches!(parse_time("25:00"), Err(EngineError::InvalidTime(_))));
        assert_eq!(format_time(450), "07:30");
        assert_eq!(format_time(1440), "24:00");
    }

    #[test]
    fn parses_day_names() {
        let days = parse_days(&["Mon", "wednesday", "FRI"]).unwrap();
        assert_eq!(days.len(), 3);
        assert!(days.contains(Weekday::Wed));
        assert!(!days.contains(Weekday::Tue));
        assert_eq!(days.to_string(), "Mon,Wed,Fri");
        assert!(matches!(parse_days(&["Funday"]), Err(EngineError::InvalidDay(_))));
    }

    #[test]
    fn shifting_stays_inside_the_day() {
        let t = iv(&[Weekday::Mon], 480, 570);
        assert_eq!(t.shifted(120), Some(t.with_times(600, 690)));
        assert_eq!(t.shifted(-480), Some(t.with_times(0, 90)));
        assert_eq!(t.shifted(-481), None);
        assert_eq!(t.shifted(900), None);
    }

    #[test]
    fn day_set_serializes_as_names() {
        let days: DaySet = [Weekday::Wed, Weekday::Mon].into_iter().collect();
        let json = serde_json::to_string(&days).unwrap();
        assert_eq!(json, r#"["Mon","Wed"]"#);
        let back: DaySet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, days);
    }
}
