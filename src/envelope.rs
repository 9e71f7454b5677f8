use crate::cursor::{self, CursorError};
use crate::header::{self, HeaderSet};
use crate::Error;

/// The COSE_Sign1 tag, IANA COSE tag registry value 18 (RFC 8152 §4.2).
const COSE_SIGN1_TAG: u64 = 18;

/// The four slices and two parsed header sets that make up a decoded
/// COSE_Sign1 message. Every field borrows from the original input.
pub(crate) struct Envelope<'a> {
    pub protected_bytes: &'a [u8],
    pub protected_headers: HeaderSet<'a>,
    pub unprotected_headers: HeaderSet<'a>,
    pub payload: &'a [u8],
    pub signature: &'a [u8],
}

fn shape_error(e: CursorError) -> Error {
    match e {
        CursorError::Truncated => Error::CborNotWellFormed,
        CursorError::WrongType => Error::Sign1Format,
    }
}

/// Decodes the COSE_Sign1 envelope: tag 18, a definite 4-element array,
/// bstr-wrapped protected headers, a bare unprotected map, and the payload
/// and signature byte strings (§4.1).
///
/// Indefinite-length encoding of the outer array is rejected with
/// `Sign1Format`; this is the one place in the pipeline where indefinite
/// length is unsupported (inner maps and the `crit` array both accept it).
pub(crate) fn decode_envelope(buf: &[u8]) -> Result<Envelope<'_>, Error> {
    if buf.is_empty() {
        return Err(Error::CborNotWellFormed);
    }

    let (tag_hdr, pos) = cursor::read_header(buf, 0).map_err(shape_error)?;
    if tag_hdr.major != 6 {
        return Err(Error::Sign1Format);
    }
    if tag_hdr.arg != Some(COSE_SIGN1_TAG) {
        return Err(Error::Sign1Format);
    }

    let (array_hdr, pos) = cursor::read_header(buf, pos).map_err(shape_error)?;
    if array_hdr.major != 4 || array_hdr.arg != Some(4) {
        // Catches both the wrong element count and an indefinite-length
        // outer array (arg == None), per the non-goal in SPEC_FULL.md §1.
        return Err(Error::Sign1Format);
    }

    let (protected_bytes, pos) = cursor::read_definite_bytes(buf, pos).map_err(shape_error)?;
    let protected_headers = decode_protected_headers(protected_bytes)?;

    let (unprotected_headers, pos) = header::parse_header_map(buf, pos)?;

    let (payload, pos) = cursor::read_definite_bytes(buf, pos).map_err(shape_error)?;
    let (signature, _pos) = cursor::read_definite_bytes(buf, pos).map_err(shape_error)?;

    Ok(Envelope {
        protected_bytes,
        protected_headers,
        unprotected_headers,
        payload,
        signature,
    })
}

/// Decodes the protected header map out of its bstr wrapper. A zero-length
/// byte string is accepted as shorthand for an empty map (RFC 8152 wire
/// format note, carried in SPEC_FULL.md §6); any other content must decode
/// to a map that consumes exactly the wrapped bytes, with nothing trailing.
fn decode_protected_headers(bytes: &[u8]) -> Result<HeaderSet<'_>, Error> {
    if bytes.is_empty() {
        return Ok(HeaderSet::default());
    }
    let (headers, pos) = header::parse_header_map(bytes, 0)?;
    if pos != bytes.len() {
        return Err(Error::Sign1Format);
    }
    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_minimal_message() {
        let buf = hex::decode(
            "d28443a10126a0430102035840bc8b0a2735d0abe33bb0b5156819dd4eaeadf6c3740018a07ba72e968dc94f3dca68cebed9a26f6929d96fb85161413e71b0eb4322f1e4d5cbc52facf548ba52",
        )
        .unwrap();
        let env = decode_envelope(&buf).unwrap();
        assert_eq!(env.protected_headers.alg_id, Some(-7));
        assert_eq!(env.payload, &[1, 2, 3]);
        assert_eq!(env.signature.len(), 64);
    }

    #[test]
    fn rejects_untagged_input() {
        let buf = hex::decode(
            "8443a10126a0430102035840bc8b0a2735d0abe33bb0b5156819dd4eaeadf6c3740018a07ba72e968dc94f3dca68cebed9a26f6929d96fb85161413e71b0eb4322f1e4d5cbc52facf548ba52",
        )
        .unwrap();
        assert_eq!(decode_envelope(&buf).unwrap_err(), Error::Sign1Format);
    }

    #[test]
    fn rejects_three_element_array() {
        let buf = hex::decode("d28343a10126a043010203").unwrap();
        assert_eq!(decode_envelope(&buf).unwrap_err(), Error::Sign1Format);
    }

    #[test]
    fn rejects_five_element_array() {
        let buf = hex::decode(
            "d28543a10126a0430102035840bc8b0a2735d0abe33bb0b5156819dd4eaeadf6c3740018a07ba72e968dc94f3dca68cebed9a26f6929d96fb85161413e71b0eb4322f1e4d5cbc52facf548ba524100",
        )
        .unwrap();
        assert_eq!(decode_envelope(&buf).unwrap_err(), Error::Sign1Format);
    }

    #[test]
    fn rejects_empty_input() {
        assert_eq!(decode_envelope(&[]).unwrap_err(), Error::CborNotWellFormed);
    }

    #[test]
    fn unprotected_header_mutation_does_not_change_decoded_protected_bytes() {
        let plain = hex::decode(
            "d28443a10126a0430102035840bc8b0a2735d0abe33bb0b5156819dd4eaeadf6c3740018a07ba72e968dc94f3dca68cebed9a26f6929d96fb85161413e71b0eb4322f1e4d5cbc52facf548ba52",
        )
        .unwrap();
        let mutated = hex::decode(
            "d28443a10126a10441aa430102035840bc8b0a2735d0abe33bb0b5156819dd4eaeadf6c3740018a07ba72e968dc94f3dca68cebed9a26f6929d96fb85161413e71b0eb4322f1e4d5cbc52facf548ba52",
        )
        .unwrap();
        let env_plain = decode_envelope(&plain).unwrap();
        let env_mutated = decode_envelope(&mutated).unwrap();
        assert_eq!(env_plain.protected_bytes, env_mutated.protected_bytes);
        assert_eq!(env_plain.payload, env_mutated.payload);
        assert_eq!(env_mutated.unprotected_headers.kid, Some(&[0xaa][..]));
    }
}
