use thiserror::Error;

/// Every way a [`crate::verify`] call can fail.
///
/// Variants map one-to-one onto the verification pipeline stage that raises
/// them; none of them carry attacker-controlled bytes (only small integers
/// such as the offending label or algorithm id), so they're safe to log.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The decoder could not parse the input as CBOR at all (truncated
    /// input, an invalid header byte, an unterminated indefinite-length
    /// value, ...).
    #[error("input is not well-formed CBOR")]
    CborNotWellFormed,

    /// The input is well-formed CBOR but does not have the shape of a
    /// COSE_Sign1 message (missing tag 18, not a 4-element array, a field
    /// that isn't the byte string the wire format requires, ...).
    #[error("input is not a valid COSE_Sign1 structure")]
    Sign1Format,

    /// A header label or value used a CBOR type this core does not accept
    /// for that position (e.g. a text-string label, or a non-array `crit`
    /// value).
    #[error("a header label or value has an unacceptable CBOR type")]
    CborStructure,

    /// The signing algorithm id is absent, the reserved value 0, out of the
    /// 32-bit signed range, or simply not one this core recognizes.
    #[error("the signing algorithm is missing, reserved, or unsupported")]
    UnsupportedSigningAlg,

    /// A header map (or its `crit` array) accumulated more unknown or
    /// critical labels than [`crate::HEADER_LIST_MAX`] allows.
    #[error("too many header parameters (max {})", crate::HEADER_LIST_MAX)]
    TooManyHeaders,

    /// A label listed in `crit` was not one of the labels this core
    /// understands.
    #[error("a header label marked critical is not understood by this verifier")]
    UnknownCriticalHeader,

    /// [`crate::VerifyOptions::REQUIRE_KID`] was set but the unprotected
    /// header has no `kid`.
    #[error("REQUIRE_KID was set but the message has no kid")]
    NoKid,

    /// The message's `kid` is the well-known short-circuit kid, but
    /// [`crate::VerifyOptions::ALLOW_SHORT_CIRCUIT`] was not set.
    #[error("short-circuit signature observed but ALLOW_SHORT_CIRCUIT is not set")]
    ShortCircuitSig,

    /// The cryptographic signature check failed (real verification or
    /// short-circuit byte comparison).
    #[error("signature verification failed")]
    SigVerify,

    /// The underlying hash or public-key primitive reported an error that
    /// doesn't otherwise fit this taxonomy.
    #[error("the underlying cryptographic primitive reported an error")]
    Crypto,
}
