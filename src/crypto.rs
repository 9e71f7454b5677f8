use ring::{constant_time, signature};

use crate::tbs::{ALG_ES256, ALG_ES384};
use crate::Error;

/// The well-known short-circuit kid (§4.5): a fixed byte string shared
/// between signer and verifier for self-tests that don't have access to a
/// private key. Never used in production signing.
pub const SHORT_CIRCUIT_KID: &[u8] = &[0x53, 0x43, 0x2D, 0x00, 0x01, 0x02, 0x03, 0x04];

/// The pluggable public-key verification collaborator (§6 "crypto
/// collaborator contract").
///
/// `hash` is the precomputed TBS digest, passed through for collaborators
/// that can verify against a digest directly (an HSM, or a RustCrypto
/// `PrehashVerifier`-backed implementation). `to_be_signed` is the full
/// Sig_structure bytes, needed by collaborators — like this crate's own
/// `RingVerifier` — whose API combines hashing and verification in one call.
/// A given implementation is expected to use exactly one of the two.
pub trait PublicKeyVerifier {
    /// Checks `signature` against `key` for the given `alg_id`. `kid` is
    /// passed through for collaborators that select among several keys;
    /// this core's own default implementation ignores it (key selection is
    /// the caller's responsibility, see `crate::verify`).
    fn verify(
        &self,
        alg_id: i32,
        key: &[u8],
        kid: Option<&[u8]>,
        hash: &[u8],
        to_be_signed: &[u8],
        signature: &[u8],
    ) -> Result<(), Error>;
}

/// The default [`PublicKeyVerifier`], backed by `ring`'s ECDSA
/// implementation over raw (fixed-width `r || s`) signatures, the same
/// primitive and signature format this crate's lineage uses for COSE_Sign1.
///
/// `ring` 0.16 has no P-521 support, so ES512 is rejected here even though
/// `crate::tbs` recognizes it for hash selection; see SPEC_FULL.md §6, §9.
#[derive(Debug, Default, Clone, Copy)]
pub struct RingVerifier;

impl PublicKeyVerifier for RingVerifier {
    fn verify(
        &self,
        alg_id: i32,
        key: &[u8],
        _kid: Option<&[u8]>,
        _hash: &[u8],
        to_be_signed: &[u8],
        signature: &[u8],
    ) -> Result<(), Error> {
        let alg: &'static signature::EcdsaVerificationAlgorithm = match alg_id {
            ALG_ES256 => &signature::ECDSA_P256_SHA256_FIXED,
            ALG_ES384 => &signature::ECDSA_P384_SHA384_FIXED,
            _ => return Err(Error::UnsupportedSigningAlg),
        };

        signature::UnparsedPublicKey::new(alg, key)
            .verify(to_be_signed, signature)
            .map_err(|_| Error::SigVerify)
    }
}

/// The short-circuit comparison (§4.5): the "signature" is the raw TBS hash
/// itself, compared to `signature`'s leading `hash.len()` bytes in constant
/// time. Only reachable from `crate::verify` when the caller both set
/// `ALLOW_SHORT_CIRCUIT` and the message used [`SHORT_CIRCUIT_KID`].
pub(crate) fn verify_short_circuit(hash: &[u8], signature: &[u8]) -> Result<(), Error> {
    if signature.len() < hash.len() {
        return Err(Error::SigVerify);
    }
    constant_time::verify_slices_are_equal(hash, &signature[..hash.len()])
        .map_err(|_| Error::SigVerify)
}
