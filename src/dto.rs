use serde::{Deserialize, Serialize};

use crate::data::{
    Booking, BookingId, Confidence, Conflict, ConflictKind, ConflictReport, ProfessorWorkload,
    Recommendation, ScheduleType, TermKey,
};
use crate::error::EngineError;
use crate::interval::{TimeInterval, format_time, parse_days, parse_time};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntervalDto {
    pub days: Vec<String>,
    pub start: String,
    pub end: String,
}

impl From<&TimeInterval> for IntervalDto {
    fn from(t: &TimeInterval) -> Self {
        Self {
            days: t.days.iter().map(|d| d.to_string()).collect(),
            start: format_time(t.start),
            end: format_time(t.end),
        }
    }
}

impl IntervalDto {
    pub fn to_interval(&self) -> Result<TimeInterval, EngineError> {
        TimeInterval::new(
            parse_days(&self.days)?,
            parse_time(&self.start)?,
            parse_time(&self.end)?,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<BookingId>,
    pub professor_id: String,
    pub section_id: String,
    pub subject_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_id: Option<String>,
    pub schedule_type: ScheduleType,
    #[serde(flatten)]
    pub interval: IntervalDto,
    pub school_year: String,
    pub semester: u8,
}

impl From<&Booking> for BookingDto {
    fn from(b: &Booking) -> Self {
        Self {
            id: b.id,
            professor_id: b.professor_id.clone(),
            section_id: b.section_id.clone(),
            subject_id: b.subject_id.clone(),
            room_id: b.room_id.clone(),
            schedule_type: b.schedule_type,
            interval: IntervalDto::from(&b.interval),
            school_year: b.term.school_year.clone(),
            semester: b.term.semester,
        }
    }
}

impl BookingDto {
    /// Parses and validates a booking coming off the wire.
    pub fn to_booking(&self) -> Result<Booking, EngineError> {
        let booking = Booking {
            id: self.id,
            professor_id: self.professor_id.clone(),
            section_id: self.section_id.clone(),
            subject_id: self.subject_id.clone(),
            // Blank form fields arrive as empty strings.
            room_id: self.room_id.clone().filter(|r| !r.trim().is_empty()),
            schedule_type: self.schedule_type,
            interval: self.interval.to_interval()?,
            term: TermKey::new(self.school_year.clone(), self.semester),
        };
        booking.validate()?;
        Ok(booking)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictDto {
    pub existing: BookingDto,
    pub kind: ConflictKind,
    pub message: String,
}

impl From<&Conflict> for ConflictDto {
    fn from(c: &Conflict) -> Self {
        Self {
            existing: BookingDto::from(&c.existing),
            kind: c.kind,
            message: c.message.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictReportDto {
    pub has_conflicts: bool,
    pub professor: Vec<ConflictDto>,
    pub room: Vec<ConflictDto>,
    pub section: Vec<ConflictDto>,
    pub subject: Vec<ConflictDto>,
    pub professor_workload: ProfessorWorkload,
}

fn convert(list: &[Conflict]) -> Vec<ConflictDto> {
    list.iter().map(ConflictDto::from).collect()
}

impl From<&ConflictReport> for ConflictReportDto {
    fn from(r: &ConflictReport) -> Self {
        Self {
            has_conflicts: !r.is_clear(),
            professor: convert(&r.professor),
            room: convert(&r.room),
            section: convert(&r.section),
            subject: convert(&r.subject),
            professor_workload: r.professor_workload.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationDto {
    #[serde(flatten)]
    pub interval: IntervalDto,
    pub reason: String,
    pub confidence: Confidence,
}

impl From<&Recommendation> for RecommendationDto {
    fn from(r: &Recommendation) -> Self {
        Self {
            interval: IntervalDto::from(&r.interval),
            reason: r.reason.clone(),
            confidence: r.confidence,
        }
    }
}

/// Body of every endpoint that takes a proposed booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalRequest {
    pub proposal: BookingDto,
    /// Authorised override for commits; ignored by detect and recommend.
    #[serde(default)]
    pub force: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendResponse {
    pub report: ConflictReportDto,
    pub recommendations: Vec<RecommendationDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TermQuery {
    pub school_year: String,
    pub semester: u8,
}

impl From<TermQuery> for TermKey {
    fn from(q: TermQuery) -> Self {
        TermKey::new(q.school_year, q.semester)
    }
}
