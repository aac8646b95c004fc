//! Spreadsheet column letters.
//!
//! Columns are numbered from 1 and named with bijective base-26 letters:
//! `A`..`Z`, then `AA`..`ZZ`, then `AAA`..`ZZZ`. There is no zero digit, so
//! each step takes `(n - 1) % 26` rather than `n % 26`; this is what makes
//! `Z` roll over to `AA` instead of `BA`.
//!
//! Only the first three letter lengths are supported, which bounds the
//! column index to `26 + 26^2 + 26^3 = 18278`.

use crate::error::PipelineError;
use serde_json::Value;
use std::fmt;

/// Largest column index with a letter name (`ZZZ`).
pub const MAX_COLUMN_INDEX: u32 = 18_278;

const ALPHABET: &[u8; 26] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const MAX_LETTERS: usize = 3;

/// A 1-based column index within `[1, MAX_COLUMN_INDEX]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ColumnIndex(u32);

impl ColumnIndex {
    /// Validates `index`, rejecting 0 and anything above `MAX_COLUMN_INDEX`.
    pub fn new(index: u32) -> Result<Self, PipelineError> {
        if index == 0 {
            return Err(PipelineError::InvalidColumnIndex(
                "column number must be greater than 0".to_string(),
            ));
        }
        if index > MAX_COLUMN_INDEX {
            return Err(PipelineError::InvalidColumnIndex(format!(
                "column number must be less than or equal to {}, got {}",
                MAX_COLUMN_INDEX, index
            )));
        }
        Ok(ColumnIndex(index))
    }

    /// The 1-based index.
    pub fn get(self) -> u32 {
        self.0
    }

    /// Returns the letter name of this column.
    pub fn letter(self) -> String {
        let mut n = self.0;
        let mut letters = Vec::with_capacity(MAX_LETTERS);
        while n > 0 {
            let rem = (n - 1) % 26;
            letters.push(ALPHABET[rem as usize] as char);
            n = (n - rem) / 26;
        }
        letters.iter().rev().collect()
    }
}

impl fmt::Display for ColumnIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u32> for ColumnIndex {
    type Error = PipelineError;

    fn try_from(index: u32) -> Result<Self, Self::Error> {
        ColumnIndex::new(index)
    }
}

impl TryFrom<i32> for ColumnIndex {
    type Error = PipelineError;

    fn try_from(index: i32) -> Result<Self, Self::Error> {
        ColumnIndex::try_from(i64::from(index))
    }
}

impl TryFrom<i64> for ColumnIndex {
    type Error = PipelineError;

    fn try_from(index: i64) -> Result<Self, Self::Error> {
        if index <= 0 {
            return Err(PipelineError::InvalidColumnIndex(format!(
                "column number must be greater than 0, got {}",
                index
            )));
        }
        let index = u32::try_from(index).map_err(|_| {
            PipelineError::InvalidColumnIndex(format!(
                "column number must be less than or equal to {}, got {}",
                MAX_COLUMN_INDEX, index
            ))
        })?;
        ColumnIndex::new(index)
    }
}

impl TryFrom<usize> for ColumnIndex {
    type Error = PipelineError;

    fn try_from(index: usize) -> Result<Self, Self::Error> {
        let index = u32::try_from(index).map_err(|_| {
            PipelineError::InvalidColumnIndex(format!(
                "column number must be less than or equal to {}, got {}",
                MAX_COLUMN_INDEX, index
            ))
        })?;
        ColumnIndex::new(index)
    }
}

/// Accepts JSON integers only. Booleans, floats (even integral ones such as
/// `3.0`), strings and containers are rejected.
impl TryFrom<&Value> for ColumnIndex {
    type Error = PipelineError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value {
            Value::Number(n) if n.is_i64() || n.is_u64() => match n.as_i64() {
                Some(i) => ColumnIndex::try_from(i),
                None => Err(PipelineError::InvalidColumnIndex(format!(
                    "column number must be less than or equal to {}, got {}",
                    MAX_COLUMN_INDEX, n
                ))),
            },
            other => Err(PipelineError::InvalidColumnIndex(format!(
                "column number must be an integer, got {}",
                other
            ))),
        }
    }
}

/// Converts a 1-based column number to its letter name.
///
/// ```
/// use spider_sheets_pipeline::column::column_letter;
///
/// assert_eq!(column_letter(1).unwrap(), "A");
/// assert_eq!(column_letter(333).unwrap(), "LU");
/// assert!(column_letter(0).is_err());
/// ```
pub fn column_letter<T>(index: T) -> Result<String, PipelineError>
where
    T: TryInto<ColumnIndex, Error = PipelineError>,
{
    Ok(index.try_into()?.letter())
}

/// Parses a letter name (`A`..`ZZZ`, upper case) back to its column index.
pub fn column_index(letters: &str) -> Result<ColumnIndex, PipelineError> {
    if letters.is_empty() || letters.len() > MAX_LETTERS {
        return Err(PipelineError::InvalidColumnIndex(format!(
            "column letters must be 1 to {} characters, got {:?}",
            MAX_LETTERS, letters
        )));
    }
    let mut n: u32 = 0;
    for b in letters.bytes() {
        if !b.is_ascii_uppercase() {
            return Err(PipelineError::InvalidColumnIndex(format!(
                "column letters must be A-Z, got {:?}",
                letters
            )));
        }
        n = n * 26 + u32::from(b - b'A') + 1;
    }
    ColumnIndex::new(n)
}
