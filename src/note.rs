use time::format_description::well_known::Rfc3339;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Duration, OffsetDateTime, PrimitiveDateTime, UtcOffset};

pub type NoteId = i64;

pub const DEFAULT_TITLE: &str = "Untitled Note";

/// ISO-8601 in UTC with millisecond precision, e.g. `2024-05-01T09:30:00.123Z`.
const TIMESTAMP_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z");

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    pub content: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl Note {
    /// A fresh note with empty content whose two timestamps are identical.
    pub fn new(id: NoteId, title: impl Into<String>, now: OffsetDateTime) -> Self {
        let stamp = truncate_to_millis(now);
        Self {
            id,
            title: title.into(),
            content: String::new(),
            created_at: stamp,
            updated_at: stamp,
        }
    }

    pub fn touch(&mut self, now: OffsetDateTime) {
        self.updated_at = stamp_after(self.updated_at, now);
    }

    pub fn created_at_iso(&self) -> String {
        format_timestamp(self.created_at)
    }

    pub fn updated_at_iso(&self) -> String {
        format_timestamp(self.updated_at)
    }
}

pub fn now_utc() -> OffsetDateTime {
    truncate_to_millis(OffsetDateTime::now_utc())
}

/// Returns a stamp strictly later than `previous`, preferring `now` when the
/// clock has moved past it at millisecond resolution.
pub fn stamp_after(previous: OffsetDateTime, now: OffsetDateTime) -> OffsetDateTime {
    let now = truncate_to_millis(now);
    if now > previous {
        now
    } else {
        previous + Duration::milliseconds(1)
    }
}

/// Ids derive from the creation time in epoch milliseconds, bumped until
/// unique among `existing`.
pub fn allocate_id(now: OffsetDateTime, existing: &[Note]) -> NoteId {
    let mut candidate = (now.unix_timestamp_nanos() / 1_000_000) as NoteId;
    while existing.iter().any(|note| note.id == candidate) {
        candidate += 1;
    }
    candidate
}

pub fn format_timestamp(value: OffsetDateTime) -> String {
    value
        .to_offset(UtcOffset::UTC)
        .format(TIMESTAMP_FORMAT)
        .unwrap_or_else(|_| value.unix_timestamp().to_string())
}

pub fn parse_timestamp(raw: &str) -> Result<OffsetDateTime, time::error::Parse> {
    match PrimitiveDateTime::parse(raw, TIMESTAMP_FORMAT) {
        Ok(parsed) => Ok(parsed.assume_utc()),
        Err(err) => OffsetDateTime::parse(raw, &Rfc3339)
            .map(|parsed| truncate_to_millis(parsed.to_offset(UtcOffset::UTC)))
            .map_err(|_| err),
    }
}

fn truncate_to_millis(value: OffsetDateTime) -> OffsetDateTime {
    value.replace_millisecond(value.millisecond()).unwrap_or(value)
}
