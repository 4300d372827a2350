//! # Batch Number Allocation
//!
//! Generates batch identifiers and batch records, and computes the
//! earliest-expiry rollup over a batch list.
//!
//! ## Batch Number Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │     482913 - 9f3c - 20240115 - 001                                      │
//! │     ──┬───   ──┬─   ───┬────   ─┬─                                      │
//! │       │        │       │        └─ last_sequence + 1, min width 3       │
//! │       │        │       └────────── UTC calendar date of current_date    │
//! │       │        └────────────────── last 4 chars of the entity id        │
//! │       └─────────────────────────── random, uniform in [100000, 999999]  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Uniqueness is probabilistic: the random segment may collide, and the
//! sequence only orders batches within one entity.

use chrono::{DateTime, Utc};
use rand::Rng;

use crate::error::{CoreResult, ValidationError};
use crate::types::Batch;
use crate::validation::{validate_entity_id, validate_stock_quantity};

/// Inclusive bounds of the random segment.
const RANDOM_SEGMENT_MIN: u32 = 100_000;
const RANDOM_SEGMENT_MAX: u32 = 999_999;

/// Characters of the entity id kept in the batch number.
const ENTITY_SUFFIX_LEN: usize = 4;

/// Generates a new batch record using the thread-local RNG.
///
/// ## Example
/// ```rust
/// use chrono::{TimeZone, Utc};
/// use shelf_core::batch::generate_batch_number;
///
/// let today = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
/// let batch = generate_batch_number("prod-7a2b", today, 0, 50, None).unwrap();
///
/// assert!(batch.batch_number.ends_with("-7a2b-20240115-001"));
/// assert_eq!(batch.stock, 50);
/// assert_eq!(batch.batch_expiry, None);
/// ```
pub fn generate_batch_number(
    entity_id: &str,
    current_date: DateTime<Utc>,
    last_sequence: u32,
    stock_quantity: i64,
    expiry: Option<DateTime<Utc>>,
) -> CoreResult<Batch> {
    generate_batch_number_with_rng(
        &mut rand::thread_rng(),
        entity_id,
        current_date,
        last_sequence,
        stock_quantity,
        expiry,
    )
}

/// Generates a new batch record drawing the random segment from `rng`.
///
/// ## Errors
/// `InvalidInput` when `entity_id` is blank or `stock_quantity` is negative.
pub fn generate_batch_number_with_rng<R: Rng>(
    rng: &mut R,
    entity_id: &str,
    current_date: DateTime<Utc>,
    last_sequence: u32,
    stock_quantity: i64,
    expiry: Option<DateTime<Utc>>,
) -> CoreResult<Batch> {
    validate_entity_id(entity_id)?;
    validate_stock_quantity(stock_quantity)?;

    let random = rng.gen_range(RANDOM_SEGMENT_MIN..=RANDOM_SEGMENT_MAX);
    let batch_number = format!(
        "{:06}-{}-{}-{:03}",
        random,
        entity_suffix(entity_id),
        current_date.format("%Y%m%d"),
        u64::from(last_sequence) + 1,
    );

    Ok(Batch {
        batch_number,
        stock: stock_quantity,
        added_date: current_date,
        batch_expiry: expiry,
        is_active: None,
    })
}

/// Last four characters of the id; shorter ids are used whole.
fn entity_suffix(entity_id: &str) -> &str {
    let skip = entity_id.chars().count().saturating_sub(ENTITY_SUFFIX_LEN);
    match entity_id.char_indices().nth(skip) {
        Some((idx, _)) => &entity_id[idx..],
        None => entity_id,
    }
}

/// Earliest non-null expiry among `batches`, or `None` if nothing expires.
pub fn earliest_expiry(batches: &[Batch]) -> Option<DateTime<Utc>> {
    batches.iter().filter_map(|b| b.batch_expiry).min()
}

/// Sequence of the most recently appended batch, `0` when there is none.
///
/// A last batch whose number does not end in a numeric segment also yields
/// `0`, so the next allocation restarts at `001`.
pub fn last_sequence(batches: &[Batch]) -> u32 {
    batches
        .last()
        .and_then(|b| BatchNumber::parse(&b.batch_number).ok())
        .map_or(0, |parsed| parsed.sequence)
}

// =============================================================================
// Parsed Batch Number
// =============================================================================

/// A batch number split into its segments, for traceability lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchNumber {
    pub random: u32,
    pub entity_suffix: String,
    /// `YYYYMMDD`, as written.
    pub date: String,
    pub sequence: u32,
}

impl BatchNumber {
    /// Parses `<random>-<suffix>-<date>-<sequence>`.
    ///
    /// The suffix may itself contain `-`, so the random segment is taken from
    /// the front and the date and sequence from the back.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let invalid = |reason: &str| ValidationError::InvalidFormat {
            field: "batch_number".to_string(),
            reason: reason.to_string(),
        };

        let (random, rest) = raw.split_once('-').ok_or_else(|| invalid("missing segments"))?;
        let (rest, sequence) = rest.rsplit_once('-').ok_or_else(|| invalid("missing sequence"))?;
        let (entity_suffix, date) = rest.rsplit_once('-').ok_or_else(|| invalid("missing date"))?;

        if date.len() != 8 || !date.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid("date segment must be YYYYMMDD"));
        }

        Ok(BatchNumber {
            random: random
                .parse()
                .map_err(|_| invalid("random segment must be numeric"))?,
            entity_suffix: entity_suffix.to_string(),
            date: date.to_string(),
            sequence: sequence
                .parse()
                .map_err(|_| invalid("sequence segment must be numeric"))?,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
