/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Calendar date used for the daily reset boundary (local time).
pub type CalendarDate = chrono::NaiveDate;

/// Whole-token quantity. Tokens are never fractional.
pub type Tokens = u32;
