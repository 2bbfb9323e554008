use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::EngineError;
use crate::interval::{Minutes, TimeInterval, parse_time};

// Type aliases for clarity
pub type BookingId = u64;
pub type ProfessorId = String;
pub type RoomId = String;
pub type SectionId = String;
pub type SubjectId = String;

/// How a class is delivered. Decides whether the room axis applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum ScheduleType {
    Onsite,
    Online,
    Hybrid,
    Homeroom,
    Recess,
}

impl ScheduleType {
    pub fn requires_room(&self) -> bool {
        matches!(
            self,
            ScheduleType::Onsite | ScheduleType::Hybrid | ScheduleType::Homeroom
        )
    }
}

impl fmt::Display for ScheduleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// School year plus semester. Bookings only conflict within one term.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TermKey {
    pub school_year: String,
    pub semester: u8,
}

impl TermKey {
    pub fn new(school_year: impl Into<String>, semester: u8) -> Self {
        Self {
            school_year: school_year.into(),
            semester,
        }
    }
}

impl fmt::Display for TermKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.school_year, self.semester)
    }
}

/// A proposed or committed class-schedule entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<BookingId>,
    pub professor_id: ProfessorId,
    pub section_id: SectionId,
    pub subject_id: SubjectId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_id: Option<RoomId>,
    pub schedule_type: ScheduleType,
    pub interval: TimeInterval,
    pub term: TermKey,
}

impl Booking {
    /// Rejects malformed input before any detection runs.
    pub fn validate(&self) -> Result<(), EngineError> {
        self.interval.validate()?;
        if self.schedule_type.requires_room() && self.room_id.is_none() {
            return Err(EngineError::NoRoomForOnsiteSchedule(self.schedule_type));
        }
        Ok(())
    }

    /// The room this booking physically holds, if any.
    pub fn occupied_room(&self) -> Option<&RoomId> {
        if self.schedule_type.requires_room() {
            self.room_id.as_ref()
        } else {
            None
        }
    }

    pub fn with_interval(&self, interval: TimeInterval) -> Self {
        Booking {
            interval,
            ..self.clone()
        }
    }
}

/// One variant per conflict axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConflictKind {
    ProfessorScheduleConflict,
    RoomOccupied,
    SectionScheduleConflict,
    DuplicateSubject,
}

/// An existing booking the proposal collides with.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Conflict {
    pub existing: Booking,
    pub kind: ConflictKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfessorWorkload {
    /// Distinct subjects the professor would teach if the proposal were committed.
    pub subject_count: usize,
    pub max_subjects: usize,
    pub is_overloaded: bool,
    pub message: String,
}

/// Everything found for one proposal. Axes are independent; none short-circuits another.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictReport {
    pub professor: Vec<Conflict>,
    pub room: Vec<Conflict>,
    pub section: Vec<Conflict>,
    pub subject: Vec<Conflict>,
    pub professor_workload: ProfessorWorkload,
}

impl ConflictReport {
    /// Conflicts a different time slot could clear.
    pub fn has_time_conflicts(&self) -> bool {
        !(self.professor.is_empty() && self.room.is_empty() && self.section.is_empty())
    }

    pub fn conflict_count(&self) -> usize {
        self.professor.len() + self.room.len() + self.section.len() + self.subject.len()
    }

    pub fn is_clear(&self) -> bool {
        self.conflict_count() == 0 && !self.professor_workload.is_overloaded
    }
}

/// Whether a recommendation was checked against the existing bookings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Confidence {
    Validated,
    Fallback,
}

/// A candidate replacement for the proposal's interval.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub interval: TimeInterval,
    pub reason: String,
    pub confidence: Confidence,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadPolicy {
    pub max_subjects_per_professor: usize,
}

impl Default for WorkloadPolicy {
    fn default() -> Self {
        Self {
            max_subjects_per_professor: 8,
        }
    }
}

/// A standard daily block offered by the fixed-block pass.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TimeBlock {
    pub label: String,
    pub start: Minutes,
    pub end: Minutes,
}

impl TimeBlock {
    pub fn new(label: impl Into<String>, start: &str, end: &str) -> Result<Self, EngineError> {
        let block = TimeBlock {
            label: label.into(),
            start: parse_time(start)?,
            end: parse_time(end)?,
        };
        if block.start >= block.end {
            return Err(EngineError::InvalidInterval(format!(
                "block {:?} ends before it starts",
                block.label
            )));
        }
        Ok(block)
    }

    /// The default six ~90 minute blocks between 07:30 and 18:00.
    pub fn default_table() -> Vec<TimeBlock> {
        [
            ("Early morning block", 450, 540),
            ("Mid-morning block", 555, 645),
            ("Late morning block", 660, 750),
            ("Early afternoon block", 780, 870),
            ("Mid-afternoon block", 885, 975),
            ("Late afternoon block", 990, 1080),
        ]
        .into_iter()
        .map(|(label, start, end)| TimeBlock {
            label: label.to_string(),
            start,
            end,
        })
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interval::parse_days;

    fn booking(schedule_type: ScheduleType, room: Option<&str>) -> Booking {
        Booking {
            id: None,
            professor_id: "P1".to_string(),
            section_id: "S1".to_string(),
            subject_id: "MATH101".to_string(),
            room_id: room.map(str::to_string),
            schedule_type,
            interval: TimeInterval::new(parse_days(&["Mon"]).unwrap(), 450, 540).unwrap(),
            term: TermKey::new("2025", 1),
        }
    }

    #[test]
    fn onsite_without_room_is_rejected() {
        let err = booking(ScheduleType::Onsite, None).validate().unwrap_err();
        assert_eq!(err, EngineError::NoRoomForOnsiteSchedule(ScheduleType::Onsite));
        assert!(booking(ScheduleType::Online, None).validate().is_ok());
        assert!(booking(ScheduleType::Recess, None).validate().is_ok());
    }

    #[test]
    fn online_bookings_hold_no_room() {
        assert_eq!(booking(ScheduleType::Online, Some("R5")).occupied_room(), None);
        assert_eq!(
            booking(ScheduleType::Homeroom, Some("R5")).occupied_room(),
            Some(&"R5".to_string())
        );
    }

    #[test]
    fn default_blocks_match_parsed_times() {
        let table = TimeBlock::default_table();
        assert_eq!(table.len(), 6);
        assert_eq!(
            table[1],
            TimeBlock::new("Mid-morning block", "09:15", "10:45").unwrap()
        );
        assert_eq!(table.last().map(|b| b.end), Some(1080));
        assert!(TimeBlock::new("broken", "10:00", "09:00").is_err());
    }

    #[test]
    fn booking_json_uses_camel_case() {
        let json = serde_json::to_value(booking(ScheduleType::Onsite, Some("R5"))).unwrap();
        assert_eq!(json["professorId"], "P1");
        assert_eq!(json["scheduleType"], "Onsite");
        assert_eq!(json["term"]["schoolYear"], "2025");
        assert_eq!(json["interval"]["days"][0], "Mon");
        assert!(json.get("id").is_none());
    }
}
