// crates/record-feed-core/src/record.rs
// ============================================================================
// Module: Record Model
// Description: Record entity and its validated value types.
// Purpose: Keep identifiers, names, and timestamps well-formed by construction.
// Dependencies: rand, serde, thiserror, time
// ============================================================================

//! ## Overview
//! A [`Record`] is one append-only row: a store-assigned [`RecordId`], a
//! random [`RecordName`], and the [`InsertTime`] captured when it was
//! appended. Each value type validates its input on construction so that a
//! malformed row read back from storage is detected instead of served.
//!
//! The JSON shape matches the HTTP contract: `{"ID", "Name", "InsertTime"}`
//! with the timestamp rendered as text.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use rand::Rng;
use serde::Deserialize;
use serde::Serialize;
use serde::Serializer;
use serde::ser::Error as _;
use thiserror::Error;
use time::OffsetDateTime;
use time::PrimitiveDateTime;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Number of characters in every record name.
pub const NAME_LENGTH: usize = 10;
/// Characters a record name may contain.
pub const NAME_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Storage and display format for insert timestamps.
const INSERT_TIME_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:6]");
/// Accepted legacy format for timestamps without fractional seconds.
const INSERT_TIME_FORMAT_SECONDS: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Validation errors for record value types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    /// Identifier was zero or negative.
    #[error("invalid record id: {0}")]
    InvalidId(i64),
    /// Name violated the length or alphabet rules.
    #[error("invalid record name: {0}")]
    InvalidName(String),
    /// Timestamp text could not be parsed.
    #[error("invalid insert time: {0}")]
    InvalidInsertTime(String),
}

// ============================================================================
// SECTION: Record Id
// ============================================================================

/// Store-assigned record identifier.
///
/// # Invariants
/// - Always strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct RecordId(i64);

impl RecordId {
    /// Builds an identifier from a raw store value, rejecting non-positive ids.
    #[must_use]
    pub const fn from_raw(raw: i64) -> Option<Self> {
        if raw > 0 { Some(Self(raw)) } else { None }
    }

    /// Returns the raw identifier.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl TryFrom<i64> for RecordId {
    type Error = RecordError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::from_raw(value).ok_or(RecordError::InvalidId(value))
    }
}

impl From<RecordId> for i64 {
    fn from(value: RecordId) -> Self {
        value.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// SECTION: Record Name
// ============================================================================

/// Random record name.
///
/// # Invariants
/// - Exactly [`NAME_LENGTH`] characters, each drawn from [`NAME_ALPHABET`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RecordName(String);

impl RecordName {
    /// Validates and wraps an existing name.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::InvalidName`] when the length or alphabet is wrong.
    pub fn new(value: impl Into<String>) -> Result<Self, RecordError> {
        let value = value.into();
        if value.len() != NAME_LENGTH {
            return Err(RecordError::InvalidName(format!(
                "expected {NAME_LENGTH} characters, got {}",
                value.len()
            )));
        }
        if !value.bytes().all(|byte| NAME_ALPHABET.contains(&byte)) {
            return Err(RecordError::InvalidName(
                "name must use uppercase ASCII letters and digits".to_string(),
            ));
        }
        Ok(Self(value))
    }

    /// Generates a name from the thread-local RNG.
    #[must_use]
    pub fn generate() -> Self {
        Self::generate_with(&mut rand::thread_rng())
    }

    /// Generates a name by drawing each character uniformly from `rng`.
    #[must_use]
    pub fn generate_with<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let name = (0..NAME_LENGTH)
            .map(|_| char::from(NAME_ALPHABET[rng.gen_range(0..NAME_ALPHABET.len())]))
            .collect();
        Self(name)
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RecordName {
    type Error = RecordError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RecordName> for String {
    fn from(value: RecordName) -> Self {
        value.0
    }
}

impl fmt::Display for RecordName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// SECTION: Insert Time
// ============================================================================

/// Wall-clock time at which a record was appended (UTC, no offset stored).
///
/// # Invariants
/// - Precision is truncated to whole microseconds so that the rendered text
///   parses back to an identical value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct InsertTime(PrimitiveDateTime);

impl InsertTime {
    /// Captures the current UTC wall-clock time.
    #[must_use]
    pub fn now() -> Self {
        let now = OffsetDateTime::now_utc();
        Self::from_datetime(PrimitiveDateTime::new(now.date(), now.time()))
    }

    /// Wraps a datetime, truncating sub-microsecond precision.
    #[must_use]
    pub fn from_datetime(datetime: PrimitiveDateTime) -> Self {
        let truncated = datetime.replace_microsecond(datetime.microsecond()).unwrap_or(datetime);
        Self(truncated)
    }

    /// Parses stored timestamp text, with or without fractional seconds.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::InvalidInsertTime`] when neither format matches.
    pub fn parse(value: &str) -> Result<Self, RecordError> {
        PrimitiveDateTime::parse(value, INSERT_TIME_FORMAT)
            .or_else(|_| PrimitiveDateTime::parse(value, INSERT_TIME_FORMAT_SECONDS))
            .map(Self::from_datetime)
            .map_err(|err| RecordError::InvalidInsertTime(format!("'{value}': {err}")))
    }

    /// Renders the timestamp as `YYYY-MM-DD HH:MM:SS.ffffff`.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::InvalidInsertTime`] when the datetime cannot be
    /// rendered in the storage format.
    pub fn format(&self) -> Result<String, RecordError> {
        self.0
            .format(INSERT_TIME_FORMAT)
            .map_err(|err| RecordError::InvalidInsertTime(format!("cannot render {}: {err}", self.0)))
    }
}

impl TryFrom<String> for InsertTime {
    type Error = RecordError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl Serialize for InsertTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let text = self.format().map_err(S::Error::custom)?;
        serializer.serialize_str(&text)
    }
}

impl fmt::Display for InsertTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self.format().map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}

// ============================================================================
// SECTION: Record
// ============================================================================

/// One persisted record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Store-assigned identifier.
    #[serde(rename = "ID")]
    pub id: RecordId,
    /// Random name.
    #[serde(rename = "Name")]
    pub name: RecordName,
    /// Time of insertion.
    #[serde(rename = "InsertTime")]
    pub insert_time: InsertTime,
}
