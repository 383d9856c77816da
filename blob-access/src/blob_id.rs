use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;
use thiserror::Error;

/// Byte offsets from a composite identifier, forwarded to the edge exactly as written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: i64,
    pub end: i64,
}

/// A blob identifier, optionally suffixed with a byte range: `base` or `base,start,end`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobId {
    pub base: String,
    pub range: Option<ByteRange>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BlobIdError {
    #[error("invalid start byte")]
    InvalidStart(#[source] ParseIntError),

    #[error("invalid end byte")]
    InvalidEnd(#[source] ParseIntError),

    #[error("start byte must be non-negative")]
    NegativeStart,

    #[error("start byte must be less than end byte")]
    EmptyRange,

    #[error("invalid blobId format: too many segments")]
    TooManySegments,
}

impl BlobId {
    /// Parses a simple or composite blob identifier.
    ///
    /// Zero or one comma yields a simple id equal to the whole input. Exactly two
    /// commas yield a composite id. Anything more is rejected.
    pub fn parse(identifier: &str) -> Result<Self, BlobIdError> {
        let segments: Vec<&str> = identifier.split(',').collect();
        match segments.as_slice() {
            [_] | [_, _] => Ok(BlobId {
                base: identifier.to_string(),
                range: None,
            }),
            [base, start, end] => {
                let start = i64::from_str(start).map_err(BlobIdError::InvalidStart)?;
                let end = i64::from_str(end).map_err(BlobIdError::InvalidEnd)?;
                if start < 0 {
                    return Err(BlobIdError::NegativeStart);
                }
                if start >= end {
                    return Err(BlobIdError::EmptyRange);
                }
                Ok(BlobId {
                    base: base.to_string(),
                    range: Some(ByteRange { start, end }),
                })
            }
            _ => Err(BlobIdError::TooManySegments),
        }
    }

    pub fn has_range(&self) -> bool {
        self.range.is_some()
    }
}

impl FromStr for BlobId {
    type Err = BlobIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BlobId::parse(s)
    }
}

impl fmt::Display for BlobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.range {
            None => write!(f, "{}", self.base),
            Some(ByteRange { start, end }) => write!(f, "{},{},{}", self.base, start, end),
        }
    }
}
