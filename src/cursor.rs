//! A minimal CBOR item-header reader over a borrowed byte slice.
//!
//! This is not a general-purpose CBOR library: it has no encoder and no value
//! tree. The item-header grammar itself (major type, length/argument
//! encoding, the definite/indefinite distinction, rejection of the reserved
//! additional-info values) is delegated to `ciborium_ll::Decoder`, the same
//! low-level decoder `ciborium`'s own `Value` tree is built on. What this
//! module owns on top of that is the one thing a `Read`-based decoder cannot
//! give for free: zero-copy byte-string extraction straight out of the
//! input slice, and the generic "skip this value, whatever it is" operation
//! the header parser needs to consume values it doesn't interpret.

use std::cell::Cell;

use ciborium_io::Read as CborRead;
use ciborium_ll::{Decoder, Header as LlHeader};

/// One CBOR item header: the major type (0-7) and its decoded argument.
///
/// `arg` is `None` when the low 5 bits of the header byte are `31`
/// (indefinite length); this is only legal for major types 2, 3, 4, 5 and 7
/// (the last being the "break" stop code, additional info 31 with major 7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Header {
    pub major: u8,
    pub arg: Option<u64>,
}

/// Low-level decode failure. Callers translate this into the taxonomy-level
/// error (`CBOR_NOT_WELL_FORMED`, `SIGN1_FORMAT`, `CBOR_STRUCTURE`, ...) that
/// fits the context the primitive was called from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CursorError {
    /// Ran off the end of the buffer, the header encoding itself is invalid
    /// (additional info 28-30, or a missing length byte), or a declared
    /// length runs past the end of the input.
    Truncated,
    /// The item was well-formed CBOR but not of the major type the caller
    /// required (e.g. asked for a byte string, got an array).
    WrongType,
}

const BREAK: u8 = 0xFF;

/// The only way [`SliceReader::read_exact`] can fail: it ran past the end of
/// the buffer. `ciborium_ll` never sees more than this — no partial-read or
/// transport error is possible over an in-memory slice.
#[derive(Debug)]
struct Eof;

/// An in-memory `ciborium_io::Read` source over a borrowed slice, with its
/// cursor position in a `Cell` so `ciborium_ll::Decoder` can be driven
/// through a shared reference. `Decoder::pull` reads only an item's header
/// bytes (never its content), so after one `pull` this reader's position is
/// exactly where the value's content begins — this module reads that
/// content straight out of `buf` itself rather than through `ciborium_ll`,
/// which is built around copying into a caller's buffer and has no way to
/// hand back a slice borrowed from the original input.
struct SliceReader<'a> {
    buf: &'a [u8],
    pos: Cell<usize>,
}

impl<'a> SliceReader<'a> {
    fn new(buf: &'a [u8], pos: usize) -> Self {
        SliceReader {
            buf,
            pos: Cell::new(pos),
        }
    }
}

impl<'a> CborRead for &SliceReader<'a> {
    type Error = Eof;

    fn read_exact(&mut self, data: &mut [u8]) -> Result<(), Eof> {
        let start = self.pos.get();
        let end = start.checked_add(data.len()).ok_or(Eof)?;
        let src = self.buf.get(start..end).ok_or(Eof)?;
        data.copy_from_slice(src);
        self.pos.set(end);
        Ok(())
    }
}

fn from_ll(header: LlHeader) -> Header {
    match header {
        LlHeader::Positive(v) => Header {
            major: 0,
            arg: Some(v),
        },
        LlHeader::Negative(v) => Header {
            major: 1,
            arg: Some(v),
        },
        LlHeader::Bytes(len) => Header {
            major: 2,
            arg: len.map(|n| n as u64),
        },
        LlHeader::Text(len) => Header {
            major: 3,
            arg: len.map(|n| n as u64),
        },
        LlHeader::Array(len) => Header {
            major: 4,
            arg: len.map(|n| n as u64),
        },
        LlHeader::Map(len) => Header {
            major: 5,
            arg: len.map(|n| n as u64),
        },
        LlHeader::Tag(v) => Header {
            major: 6,
            arg: Some(v),
        },
        LlHeader::Break => Header { major: 7, arg: None },
        LlHeader::Bool(_)
        | LlHeader::Null
        | LlHeader::Undefined
        | LlHeader::Simple(_)
        | LlHeader::Float(_) => Header {
            major: 7,
            arg: Some(0),
        },
    }
}

/// Reads one item header at `pos`, returning it and the position just past
/// the header (and past any extra length bytes), i.e. where the value's
/// content (if any) begins. The header grammar itself is `ciborium_ll`'s.
pub(crate) fn read_header(buf: &[u8], pos: usize) -> Result<(Header, usize), CursorError> {
    let reader = SliceReader::new(buf, pos);
    let header = Decoder::from(&reader)
        .pull()
        .map_err(|_| CursorError::Truncated)?;
    Ok((from_ll(header), reader.pos.get()))
}

/// Peeks the major type of the item at `pos` without consuming anything.
/// A plain byte read, not a decode: the top 3 bits of any CBOR item's first
/// byte are always its major type, independent of argument parsing.
pub(crate) fn peek_major(buf: &[u8], pos: usize) -> Result<u8, CursorError> {
    buf.get(pos).map(|b| b >> 5).ok_or(CursorError::Truncated)
}

/// Reads a definite-length byte string, returning a slice borrowed from
/// `buf`. Indefinite-length (chunked) byte strings are rejected: nothing in
/// this core's wire format needs them, and rejecting keeps every extracted
/// field a zero-copy borrow. The bounds check uses `checked_add` so an
/// attacker-controlled length (up to `u64::MAX` from an 8-byte length
/// header) can never wrap `pos` past the end of `buf`.
pub(crate) fn read_definite_bytes(buf: &[u8], pos: usize) -> Result<(&[u8], usize), CursorError> {
    let (hdr, pos) = read_header(buf, pos)?;
    if hdr.major != 2 {
        return Err(CursorError::WrongType);
    }
    let n = hdr.arg.ok_or(CursorError::WrongType)? as usize;
    let end = pos.checked_add(n).ok_or(CursorError::Truncated)?;
    let bytes = buf.get(pos..end).ok_or(CursorError::Truncated)?;
    Ok((bytes, end))
}

/// Reads a signed integer (major type 0 or 1) as `i128`, wide enough to hold
/// any CBOR-encodable 64-bit argument on either side of zero without
/// overflow.
pub(crate) fn read_int(buf: &[u8], pos: usize) -> Result<(i128, usize), CursorError> {
    let (hdr, pos) = read_header(buf, pos)?;
    let n = hdr.arg.ok_or(CursorError::WrongType)? as i128;
    match hdr.major {
        0 => Ok((n, pos)),
        1 => Ok((-1 - n, pos)),
        _ => Err(CursorError::WrongType),
    }
}

/// Advances past one value of any shape, starting at `pos`. This is the
/// "consume" primitive the header parser uses to skip values it doesn't
/// otherwise interpret (unknown labels, the content-type value, ...).
/// Handles both definite- and indefinite-length arrays, maps, byte strings
/// and text strings, and tagged values (by skipping the tagged content).
pub(crate) fn skip_value(buf: &[u8], pos: usize) -> Result<usize, CursorError> {
    let (hdr, pos) = read_header(buf, pos)?;
    match hdr.major {
        0 | 1 => Ok(pos),
        2 | 3 => skip_string_content(buf, pos, hdr.arg),
        4 => skip_n_or_until_break(buf, pos, hdr.arg, 1),
        5 => skip_n_or_until_break(buf, pos, hdr.arg, 2),
        6 => skip_value(buf, pos),
        7 => match hdr.arg {
            Some(_) => Ok(pos),
            None => Err(CursorError::Truncated),
        },
        _ => unreachable!("major type is masked to 3 bits"),
    }
}

fn skip_string_content(buf: &[u8], pos: usize, arg: Option<u64>) -> Result<usize, CursorError> {
    match arg {
        Some(n) => {
            let n = n as usize;
            let end = pos.checked_add(n).ok_or(CursorError::Truncated)?;
            if end > buf.len() {
                return Err(CursorError::Truncated);
            }
            Ok(end)
        }
        None => {
            let mut pos = pos;
            loop {
                if *buf.get(pos).ok_or(CursorError::Truncated)? == BREAK {
                    return Ok(pos + 1);
                }
                pos = skip_value(buf, pos)?;
            }
        }
    }
}

fn skip_n_or_until_break(
    buf: &[u8],
    pos: usize,
    arg: Option<u64>,
    items_per_entry: u64,
) -> Result<usize, CursorError> {
    match arg {
        Some(n) => {
            let total = n.checked_mul(items_per_entry).ok_or(CursorError::Truncated)?;
            let mut pos = pos;
            for _ in 0..total {
                pos = skip_value(buf, pos)?;
            }
            Ok(pos)
        }
        None => {
            let mut pos = pos;
            loop {
                if *buf.get(pos).ok_or(CursorError::Truncated)? == BREAK {
                    return Ok(pos + 1);
                }
                for _ in 0..items_per_entry {
                    pos = skip_value(buf, pos)?;
                }
            }
        }
    }
}

/// A map or array header, with its element/pair count (`None` = indefinite).
/// Thin wrapper kept separate from `Header` so call sites that specifically
/// want "a map" or "an array" read naturally.
pub(crate) fn read_container_header(
    buf: &[u8],
    pos: usize,
    expected_major: u8,
) -> Result<(Option<u64>, usize), CursorError> {
    let (hdr, pos) = read_header(buf, pos)?;
    if hdr.major != expected_major {
        return Err(CursorError::WrongType);
    }
    Ok((hdr.arg, pos))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_small_uint_header() {
        let buf = [0x05];
        let (hdr, pos) = read_header(&buf, 0).unwrap();
        assert_eq!(hdr.major, 0);
        assert_eq!(hdr.arg, Some(5));
        assert_eq!(pos, 1);
    }

    #[test]
    fn reads_two_byte_length() {
        // bstr, additional info 25, length 0x0100 = 256
        let buf = [0x59, 0x01, 0x00];
        let (hdr, pos) = read_header(&buf, 0).unwrap();
        assert_eq!(hdr.major, 2);
        assert_eq!(hdr.arg, Some(256));
        assert_eq!(pos, 3);
    }

    #[test]
    fn rejects_reserved_additional_info() {
        let buf = [0x1C]; // major 0, additional info 28
        assert_eq!(read_header(&buf, 0).unwrap_err(), CursorError::Truncated);
    }

    #[test]
    fn decodes_negative_int() {
        // major 1, value 6 -> -1 - 6 = -7 (ES256)
        let buf = [0x26];
        let (v, pos) = read_int(&buf, 0).unwrap();
        assert_eq!(v, -7);
        assert_eq!(pos, 1);
    }

    #[test]
    fn reads_definite_bytes_as_borrow() {
        let buf = [0x43, 0x01, 0x02, 0x03, 0xFF];
        let (s, pos) = read_definite_bytes(&buf, 0).unwrap();
        assert_eq!(s, &[1, 2, 3]);
        assert_eq!(pos, 4);
        // confirm it really borrows from the original buffer
        assert_eq!(s.as_ptr(), buf[1..].as_ptr());
    }

    #[test]
    fn rejects_indefinite_bytes() {
        let buf = [0x5F, 0x41, 0x01, 0xFF];
        assert_eq!(
            read_definite_bytes(&buf, 0).unwrap_err(),
            CursorError::WrongType
        );
    }

    #[test]
    fn huge_declared_length_does_not_overflow_or_panic() {
        // bstr, additional info 27 (8-byte length), length = u64::MAX
        let mut buf = vec![0x5B];
        buf.extend_from_slice(&u64::MAX.to_be_bytes());
        assert_eq!(
            read_definite_bytes(&buf, 0).unwrap_err(),
            CursorError::Truncated
        );
    }

    #[test]
    fn huge_declared_length_at_nonzero_offset_does_not_overflow() {
        // same as above, but starting a few bytes into the buffer, so the
        // overflow-prone arithmetic is `pos + n`, not just `n` alone
        let mut buf = vec![0xAA, 0xBB, 0xCC, 0x5B];
        buf.extend_from_slice(&u64::MAX.to_be_bytes());
        assert_eq!(
            read_definite_bytes(&buf, 3).unwrap_err(),
            CursorError::Truncated
        );
    }

    #[test]
    fn huge_map_count_does_not_overflow_on_skip() {
        // map, additional info 27 (8-byte count), count = u64::MAX
        let mut buf = vec![0xBB];
        buf.extend_from_slice(&u64::MAX.to_be_bytes());
        assert_eq!(skip_value(&buf, 0).unwrap_err(), CursorError::Truncated);
    }

    #[test]
    fn skips_definite_array() {
        // [1, 2, [3, 4]]
        let buf = [0x83, 0x01, 0x02, 0x82, 0x03, 0x04, 0xAA];
        let pos = skip_value(&buf, 0).unwrap();
        assert_eq!(pos, 6);
    }

    #[test]
    fn skips_indefinite_map() {
        // {_ 1: 2 }  -> a bare indefinite map with one pair then break
        let buf = [0xBF, 0x01, 0x02, 0xFF, 0xAA];
        let pos = skip_value(&buf, 0).unwrap();
        assert_eq!(pos, 4);
    }

    #[test]
    fn skips_tagged_value() {
        let buf = [0xC1, 0x00]; // tag(1) 0
        let pos = skip_value(&buf, 0).unwrap();
        assert_eq!(pos, 2);
    }
}
