use crate::crypto::{self, PublicKeyVerifier, RingVerifier};
use crate::envelope;
use crate::tbs;
use crate::{Error, VerifyOptions};

/// Verifies a COSE_Sign1 message against `key` using this crate's default
/// `ring`-backed [`RingVerifier`].
///
/// On success, returns the payload slice, borrowed from `message`. On
/// failure, returns the first error the pipeline encountered; no partial
/// result is ever returned, so a caller cannot observe an unverified
/// payload (SPEC_FULL.md §7).
pub fn verify<'a>(
    options: VerifyOptions,
    key: &[u8],
    message: &'a [u8],
) -> Result<&'a [u8], Error> {
    verify_with(options, key, message, &RingVerifier)
}

/// As [`verify`], but dispatches real-signature verification through a
/// caller-supplied [`PublicKeyVerifier`] instead of the bundled
/// `ring`-backed default. Use this to plug in a different key backend (an
/// HSM, a curve `ring` doesn't support) without forking the crate.
pub fn verify_with<'a, V: PublicKeyVerifier>(
    options: VerifyOptions,
    key: &[u8],
    message: &'a [u8],
    verifier: &V,
) -> Result<&'a [u8], Error> {
    log::debug!("decoding COSE_Sign1 envelope ({} bytes)", message.len());
    let env = envelope::decode_envelope(message)?;

    let alg_id = env.protected_headers.alg_id.ok_or_else(|| {
        log::warn!("protected headers carry no alg id");
        Error::UnsupportedSigningAlg
    })?;

    let kid = env.unprotected_headers.kid;
    if options.contains(VerifyOptions::REQUIRE_KID) && kid.is_none() {
        log::warn!("REQUIRE_KID set but message has no kid");
        return Err(Error::NoKid);
    }

    let hash = tbs::compute_tbs_hash(alg_id, env.protected_bytes, env.payload)?;

    if kid == Some(crypto::SHORT_CIRCUIT_KID) {
        if !options.contains(VerifyOptions::ALLOW_SHORT_CIRCUIT) {
            log::warn!("short-circuit kid observed but ALLOW_SHORT_CIRCUIT is not set");
            return Err(Error::ShortCircuitSig);
        }
        crypto::verify_short_circuit(hash.as_ref(), env.signature)?;
        log::debug!("short-circuit signature accepted");
        return Ok(env.payload);
    }

    let to_be_signed = tbs::build_tbs_bytes(env.protected_bytes, env.payload);
    verifier
        .verify(alg_id, key, kid, hash.as_ref(), &to_be_signed, env.signature)
        .map_err(|e| {
            log::warn!("signature verification failed for alg {}", alg_id);
            e
        })?;

    log::debug!("signature verified");
    Ok(env.payload)
}
