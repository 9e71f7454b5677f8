use ring::digest;

use crate::Error;

/// Supported COSE algorithm ids (RFC 8152 §8.1, the ECDSA row).
pub const ALG_ES256: i32 = -7;
pub const ALG_ES384: i32 = -35;
pub const ALG_ES512: i32 = -36;

/// The fixed CBOR encoding of the text string `"Signature1"` (RFC 8152
/// §4.4): a text-string header (major type 3, length 10) followed by the
/// ASCII bytes. Hashed as a literal, never rebuilt from a `&str`.
const SIG_STRUCTURE_CONTEXT: &[u8] = b"\x6aSignature1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HashAlg {
    Sha256,
    Sha384,
    Sha512,
}

impl HashAlg {
    pub(crate) fn from_alg_id(alg_id: i32) -> Option<Self> {
        match alg_id {
            ALG_ES256 => Some(HashAlg::Sha256),
            ALG_ES384 => Some(HashAlg::Sha384),
            ALG_ES512 => Some(HashAlg::Sha512),
            _ => None,
        }
    }

    fn ring_algorithm(self) -> &'static digest::Algorithm {
        match self {
            HashAlg::Sha256 => &digest::SHA256,
            HashAlg::Sha384 => &digest::SHA384,
            HashAlg::Sha512 => &digest::SHA512,
        }
    }
}

/// A destination the Sig_structure emitter can write bytes into: either a
/// running hash (the streaming path, used by everything except real-pubkey
/// verification) or a plain buffer (the one path that needs the whole
/// message, see `build_tbs_bytes`).
trait Sink {
    fn feed(&mut self, data: &[u8]);
}

impl Sink for digest::Context {
    fn feed(&mut self, data: &[u8]) {
        self.update(data);
    }
}

impl Sink for Vec<u8> {
    fn feed(&mut self, data: &[u8]) {
        self.extend_from_slice(data);
    }
}

/// Writes a CBOR byte-string header (major type 2) for a string of `len`
/// bytes into a 9-byte scratch buffer, returning the number of bytes
/// written. No heap allocation: the header is always at most 9 bytes.
fn bstr_header(len: usize, out: &mut [u8; 9]) -> usize {
    let len = len as u64;
    if len < 24 {
        out[0] = 0x40 | len as u8;
        1
    } else if len <= 0xFF {
        out[0] = 0x58;
        out[1] = len as u8;
        2
    } else if len <= 0xFFFF {
        out[0] = 0x59;
        out[1..3].copy_from_slice(&(len as u16).to_be_bytes());
        3
    } else if len <= 0xFFFF_FFFF {
        out[0] = 0x5A;
        out[1..5].copy_from_slice(&(len as u32).to_be_bytes());
        5
    } else {
        out[0] = 0x5B;
        out[1..9].copy_from_slice(&len.to_be_bytes());
        9
    }
}

/// Emits the canonical Sig_structure `["Signature1", protected, h'', payload]`
/// into `sink`, interleaving the small CBOR headers with the borrowed
/// `protected`/`payload` slices so neither is ever copied into a combined
/// buffer by this function (RFC 8152 §4.4).
fn emit_sig_structure<S: Sink>(sink: &mut S, protected: &[u8], payload: &[u8]) {
    sink.feed(&[0x84]); // array(4)
    sink.feed(SIG_STRUCTURE_CONTEXT);

    let mut hdr = [0u8; 9];
    let n = bstr_header(protected.len(), &mut hdr);
    sink.feed(&hdr[..n]);
    sink.feed(protected);

    sink.feed(&[0x40]); // empty byte string: external_aad

    let n = bstr_header(payload.len(), &mut hdr);
    sink.feed(&hdr[..n]);
    sink.feed(payload);
}

/// Computes the TBS hash by streaming the Sig_structure straight into
/// `ring::digest`, never materializing it as a contiguous buffer. Used for
/// the short-circuit comparison and wherever only the digest (not the full
/// message) is needed.
pub(crate) fn compute_tbs_hash(
    alg_id: i32,
    protected: &[u8],
    payload: &[u8],
) -> Result<digest::Digest, Error> {
    let alg = HashAlg::from_alg_id(alg_id).ok_or(Error::UnsupportedSigningAlg)?;
    let mut ctx = digest::Context::new(alg.ring_algorithm());
    emit_sig_structure(&mut ctx, protected, payload);
    Ok(ctx.finish())
}

/// Builds the full Sig_structure bytes. `ring::signature::UnparsedPublicKey`
/// verifies over the signed message rather than a precomputed digest, so the
/// real (non-short-circuit) verify path needs this instead of a hash; see
/// DESIGN.md for why that's the one place this core allocates a buffer sized
/// to the input.
pub(crate) fn build_tbs_bytes(protected: &[u8], payload: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(16 + protected.len() + payload.len());
    emit_sig_structure(&mut buf, protected, payload);
    buf
}
