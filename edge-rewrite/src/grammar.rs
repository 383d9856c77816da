//! The edge's own reading of the blob identifier grammar.
//!
//! This runs on the far side of the trust boundary from the origin parser and is
//! deliberately self-contained. It must accept and reject exactly the same
//! strings, and produce the same base id and offsets, as the origin. The shared
//! vectors in `conformance/blob_id_vectors.json` pin that agreement.

/// Result of reading one path segment.
#[derive(Debug, PartialEq, Eq)]
pub enum Parsed<'a> {
    /// Zero or one comma. The segment is used as-is.
    Simple,
    /// `base,start,end` with `0 <= start < end`.
    Composite { base: &'a str, start: i64, end: i64 },
    /// Two commas with bad offsets, or more than two commas.
    Invalid,
}

pub fn parse(segment: &str) -> Parsed<'_> {
    let mut commas = segment.match_indices(',').map(|(i, _)| i);
    let first = match commas.next() {
        None => return Parsed::Simple,
        Some(i) => i,
    };
    let second = match commas.next() {
        None => return Parsed::Simple,
        Some(i) => i,
    };
    if commas.next().is_some() {
        return Parsed::Invalid;
    }

    let base = &segment[..first];
    let start = match parse_i64(&segment[first + 1..second]) {
        Some(n) => n,
        None => return Parsed::Invalid,
    };
    let end = match parse_i64(&segment[second + 1..]) {
        Some(n) => n,
        None => return Parsed::Invalid,
    };
    if start < 0 || start >= end {
        return Parsed::Invalid;
    }
    Parsed::Composite { base, start, end }
}

/// Base-10 signed 64-bit integer: optional `+` or `-`, then one or more ASCII
/// digits, nothing else. Out-of-range values are rejected.
fn parse_i64(text: &str) -> Option<i64> {
    let bytes = text.as_bytes();
    let (negative, digits) = match bytes.first() {
        Some(b'-') => (true, &bytes[1..]),
        Some(b'+') => (false, &bytes[1..]),
        _ => (false, bytes),
    };
    if digits.is_empty() {
        return None;
    }

    // Accumulate towards the sign so i64::MIN is representable.
    let mut value: i64 = 0;
    for &b in digits {
        if !b.is_ascii_digit() {
            return None;
        }
        let digit = i64::from(b - b'0');
        value = value.checked_mul(10)?;
        value = if negative {
            value.checked_sub(digit)?
        } else {
            value.checked_add(digit)?
        };
    }
    Some(value)
}
