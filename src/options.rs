use bitflags::bitflags;

bitflags! {
    /// Caller-controlled switches for [`crate::verify`].
    ///
    /// This bitmask is the entire configuration surface of this crate: there
    /// is no config file or environment variable, only these two flags.
    pub struct VerifyOptions: u32 {
        /// Fail with [`crate::Error::NoKid`] if the unprotected header has
        /// no `kid`.
        const REQUIRE_KID = 0b0000_0001;
        /// Permit the short-circuit debug verification path (§4.5). Without
        /// this flag, a message signed with the well-known short-circuit
        /// kid is rejected with [`crate::Error::ShortCircuitSig`] rather
        /// than silently accepted.
        const ALLOW_SHORT_CIRCUIT = 0b0000_0010;
    }
}

impl Default for VerifyOptions {
    fn default() -> Self {
        VerifyOptions::empty()
    }
}
