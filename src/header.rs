use std::convert::TryFrom;

use crate::cursor::{self, CursorError};
use crate::Error;

/// Registered COSE header labels this core understands (RFC 8152 §3.1).
const LABEL_ALG: i64 = 1;
const LABEL_CRIT: i64 = 2;
const LABEL_CONTENT_TYPE: i64 = 3;
const LABEL_KID: i64 = 4;
const LABEL_IV: i64 = 5;
const LABEL_PARTIAL_IV: i64 = 6;

/// A bounded collection of header labels, used both for the `crit` array and
/// for the "unknown labels seen in this map" accumulator.
///
/// The spec's own source uses two zero-terminated fixed arrays per list;
/// this is the explicitly sanctioned alternative (a length-tracked container
/// with the same cap and the same overflow error), kept as two `Vec`s since
/// integer and byte-string labels are disjoint kinds with independent
/// capacity.
#[derive(Debug, Default, Clone)]
pub(crate) struct LabelList<'a> {
    ints: Vec<i64>,
    byte_labels: Vec<&'a [u8]>,
}

impl<'a> LabelList<'a> {
    fn push_int(&mut self, label: i64) -> Result<(), Error> {
        if self.ints.len() >= crate::HEADER_LIST_MAX {
            return Err(Error::TooManyHeaders);
        }
        self.ints.push(label);
        Ok(())
    }

    fn push_bytes(&mut self, label: &'a [u8]) -> Result<(), Error> {
        if self.byte_labels.len() >= crate::HEADER_LIST_MAX {
            return Err(Error::TooManyHeaders);
        }
        self.byte_labels.push(label);
        Ok(())
    }

    fn contains_int(&self, label: i64) -> bool {
        self.ints.contains(&label)
    }

    fn contains_bytes(&self, label: &[u8]) -> bool {
        self.byte_labels.iter().any(|b| *b == label)
    }
}

/// The parsed, known contents of one header map (protected or unprotected),
/// plus the label lists accumulated while parsing it.
///
/// Every byte slice here borrows directly from the input message; parsing a
/// `HeaderSet` performs no allocation.
#[derive(Debug, Default, Clone)]
pub struct HeaderSet<'a> {
    /// The signing algorithm id, present only if this map carried label 1.
    pub alg_id: Option<i32>,
    /// The key identifier, present only if this map carried label 4.
    pub kid: Option<&'a [u8]>,
    /// The initialization vector, present only if this map carried label 5.
    pub iv: Option<&'a [u8]>,
    /// The partial initialization vector, present only if this map carried
    /// label 6. Kept distinct from `iv` (see SPEC_FULL.md §9).
    pub partial_iv: Option<&'a [u8]>,
    /// The content-type value, if present and byte-string-typed. Parsed but
    /// not used by verification.
    pub content_type: Option<&'a [u8]>,
    pub(crate) critical: LabelList<'a>,
}

fn wrong_type<T>(res: Result<T, CursorError>) -> Result<T, Error> {
    res.map_err(|e| match e {
        CursorError::Truncated => Error::CborNotWellFormed,
        CursorError::WrongType => Error::Sign1Format,
    })
}

/// Parses one header map starting at `pos` in `buf`. Used both for the
/// protected map (decoded from inside its bstr wrapper, on a fresh `buf`
/// slice) and for the bare unprotected map (continuing the main cursor).
///
/// Runs the critical-headers check (§4.3) before returning, so a `HeaderSet`
/// is never observed with an unresolved critical-label violation.
pub(crate) fn parse_header_map(buf: &[u8], pos: usize) -> Result<(HeaderSet<'_>, usize), Error> {
    let (count, mut pos) = cursor::read_container_header(buf, pos, 5).map_err(|e| match e {
        CursorError::Truncated => Error::CborNotWellFormed,
        CursorError::WrongType => Error::Sign1Format,
    })?;

    let mut headers = HeaderSet::default();
    let mut unknown = LabelList::default();

    match count {
        Some(n) => {
            for _ in 0..n {
                pos = parse_one_entry(buf, pos, &mut headers, &mut unknown)?;
            }
        }
        None => loop {
            if *buf.get(pos).ok_or(Error::CborNotWellFormed)? == 0xFF {
                pos += 1;
                break;
            }
            pos = parse_one_entry(buf, pos, &mut headers, &mut unknown)?;
        },
    }

    check_critical(&unknown, &headers.critical)?;
    Ok((headers, pos))
}

fn check_critical(unknown: &LabelList<'_>, critical: &LabelList<'_>) -> Result<(), Error> {
    for label in &unknown.ints {
        if critical.contains_int(*label) {
            return Err(Error::UnknownCriticalHeader);
        }
    }
    for label in &unknown.byte_labels {
        if critical.contains_bytes(label) {
            return Err(Error::UnknownCriticalHeader);
        }
    }
    Ok(())
}

fn parse_one_entry<'a>(
    buf: &'a [u8],
    pos: usize,
    headers: &mut HeaderSet<'a>,
    unknown: &mut LabelList<'a>,
) -> Result<usize, Error> {
    let label_major = cursor::peek_major(buf, pos).map_err(|_| Error::CborNotWellFormed)?;

    match label_major {
        0 | 1 => {
            let (label, pos_after_label) =
                cursor::read_int(buf, pos).map_err(|_| Error::CborNotWellFormed)?;
            parse_known_or_unknown_int(buf, pos_after_label, label, headers, unknown)
        }
        2 => {
            let (label_bytes, pos_after_label) =
                wrong_type(cursor::read_definite_bytes(buf, pos))?;
            unknown.push_bytes(label_bytes)?;
            cursor::skip_value(buf, pos_after_label).map_err(|_| Error::CborNotWellFormed)
        }
        _ => Err(Error::CborStructure),
    }
}

fn parse_known_or_unknown_int<'a>(
    buf: &'a [u8],
    pos: usize,
    label: i128,
    headers: &mut HeaderSet<'a>,
    unknown: &mut LabelList<'a>,
) -> Result<usize, Error> {
    let label = i64::try_from(label).map_err(|_| Error::CborStructure)?;

    match label {
        LABEL_ALG => {
            let (value, pos) = cursor::read_int(buf, pos).map_err(|e| match e {
                CursorError::Truncated => Error::CborNotWellFormed,
                CursorError::WrongType => Error::UnsupportedSigningAlg,
            })?;
            if value == 0 || value > i32::MAX as i128 {
                return Err(Error::UnsupportedSigningAlg);
            }
            headers.alg_id = Some(value as i32);
            Ok(pos)
        }
        LABEL_CRIT => parse_crit_array(buf, pos, &mut headers.critical),
        LABEL_CONTENT_TYPE => {
            if let Ok((bytes, pos)) = cursor::read_definite_bytes(buf, pos) {
                headers.content_type = Some(bytes);
                return Ok(pos);
            }
            cursor::skip_value(buf, pos).map_err(|_| Error::CborNotWellFormed)
        }
        LABEL_KID => {
            let (bytes, pos) = wrong_type(cursor::read_definite_bytes(buf, pos))?;
            headers.kid = Some(bytes);
            Ok(pos)
        }
        LABEL_IV => {
            if headers.partial_iv.is_some() {
                return Err(Error::Sign1Format);
            }
            let (bytes, pos) = wrong_type(cursor::read_definite_bytes(buf, pos))?;
            headers.iv = Some(bytes);
            Ok(pos)
        }
        LABEL_PARTIAL_IV => {
            if headers.iv.is_some() {
                return Err(Error::Sign1Format);
            }
            let (bytes, pos) = wrong_type(cursor::read_definite_bytes(buf, pos))?;
            headers.partial_iv = Some(bytes);
            Ok(pos)
        }
        other => {
            unknown.push_int(other)?;
            cursor::skip_value(buf, pos).map_err(|_| Error::CborNotWellFormed)
        }
    }
}

fn parse_crit_array<'a>(
    buf: &'a [u8],
    pos: usize,
    critical: &mut LabelList<'a>,
) -> Result<usize, Error> {
    let (count, mut pos) = cursor::read_container_header(buf, pos, 4).map_err(|e| match e {
        CursorError::Truncated => Error::CborNotWellFormed,
        CursorError::WrongType => Error::CborStructure,
    })?;

    match count {
        Some(n) => {
            for _ in 0..n {
                pos = parse_one_critical_label(buf, pos, critical)?;
            }
        }
        None => loop {
            if *buf.get(pos).ok_or(Error::CborNotWellFormed)? == 0xFF {
                pos += 1;
                break;
            }
            pos = parse_one_critical_label(buf, pos, critical)?;
        },
    }
    Ok(pos)
}

fn parse_one_critical_label<'a>(
    buf: &'a [u8],
    pos: usize,
    critical: &mut LabelList<'a>,
) -> Result<usize, Error> {
    match cursor::peek_major(buf, pos).map_err(|_| Error::CborNotWellFormed)? {
        0 | 1 => {
            let (value, pos) =
                wrong_type(cursor::read_int(buf, pos)).map_err(|_| Error::CborNotWellFormed)?;
            let value = i64::try_from(value).map_err(|_| Error::CborStructure)?;
            critical.push_int(value)?;
            Ok(pos)
        }
        2 => {
            let (bytes, pos) = wrong_type(cursor::read_definite_bytes(buf, pos))?;
            critical.push_bytes(bytes)?;
            Ok(pos)
        }
        _ => Err(Error::CborStructure),
    }
}
