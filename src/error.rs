use core::fmt;

/// If the condition is not met, return the given error. Borrowed from the `anyhow` crate.
macro_rules! ensure {
    ($cond:expr, $err:expr $(,)?) => {
        if !$cond {
            return Err($err);
        }
    };
}

pub(crate) use ensure; // make available throughout crate


/// Numeric error codes carried on the wire contract; the negative 16-bit
/// range is reserved for this crate.
pub mod codes {
    /// Success.
    pub const OK: i16 = 0;
    /// Allocation of the memory pool or a key buffer failed.
    pub const NO_MEMORY: i16 = -12;
    /// A caller-supplied argument or configuration was rejected.
    pub const INVALID_ARGUMENT: i16 = -22;
    /// Any other failure (overflow, entropy, sink, internal invariant).
    pub const UNKNOWN: i16 = -1000;
    /// Lowest code this crate will ever produce.
    pub const MIN_RESERVED: i16 = -9999;
}


/// Failure classes surfaced by setup, key handling, and encryption.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum SeErrorKind {
    /// Rejected at setup: unsupported degree, inadmissible prime, bad scale,
    /// or mutually exclusive feature selections.
    InvalidConfig,
    /// Rejected at call time: oversized or non-finite slot vector, malformed
    /// key/index-map bytes, seed supplied to the wrong scheme.
    InvalidArgument,
    /// The scaled encoding left the representable range (imaginary residue
    /// above tolerance, or a coefficient outside the signed 64-bit budget).
    /// Recoverable: retry with a smaller scale or message magnitude.
    EncodeOverflow,
    /// The platform entropy source failed. Fatal: errors and masks cannot be
    /// sampled without randomness.
    EntropyUnavailable,
    /// The send callback accepted fewer bytes than requested. Fatal to the
    /// current call; the pool is left consistent.
    SinkShortWrite,
    /// The memory pool (or a key buffer) could not be allocated.
    NoMemory,
    /// An internal invariant failed in a release build (debug builds assert
    /// instead): residue at or above its prime, counter wrap without reseed.
    InvariantViolation,
}


/// Error type for every fallible operation in this crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SeError {
    kind: SeErrorKind,
    msg: &'static str,
}

impl SeError {
    pub(crate) const fn new(kind: SeErrorKind, msg: &'static str) -> Self {
        Self { kind, msg }
    }

    pub(crate) const fn invalid_config(msg: &'static str) -> Self {
        Self::new(SeErrorKind::InvalidConfig, msg)
    }

    pub(crate) const fn invalid_arg(msg: &'static str) -> Self {
        Self::new(SeErrorKind::InvalidArgument, msg)
    }

    pub(crate) const fn encode_overflow(msg: &'static str) -> Self {
        Self::new(SeErrorKind::EncodeOverflow, msg)
    }

    pub(crate) const fn entropy(msg: &'static str) -> Self {
        Self::new(SeErrorKind::EntropyUnavailable, msg)
    }

    pub(crate) const fn sink_short(msg: &'static str) -> Self {
        Self::new(SeErrorKind::SinkShortWrite, msg)
    }

    pub(crate) const fn no_memory(msg: &'static str) -> Self {
        Self::new(SeErrorKind::NoMemory, msg)
    }

    pub(crate) const fn invariant(msg: &'static str) -> Self {
        Self::new(SeErrorKind::InvariantViolation, msg)
    }

    /// The failure class.
    #[must_use]
    pub const fn kind(&self) -> SeErrorKind {
        self.kind
    }

    /// Human-readable context for the failure.
    #[must_use]
    pub const fn msg(&self) -> &'static str {
        self.msg
    }

    /// The numeric wire code for this failure; see [`codes`].
    #[must_use]
    pub const fn code(&self) -> i16 {
        match self.kind {
            SeErrorKind::InvalidConfig | SeErrorKind::InvalidArgument => codes::INVALID_ARGUMENT,
            SeErrorKind::NoMemory => codes::NO_MEMORY,
            SeErrorKind::EncodeOverflow
            | SeErrorKind::EntropyUnavailable
            | SeErrorKind::SinkShortWrite
            | SeErrorKind::InvariantViolation => codes::UNKNOWN,
        }
    }
}

impl fmt::Display for SeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} ({}): {}", self.kind, self.code(), self.msg)
    }
}

impl std::error::Error for SeError {}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(SeError::invalid_config("x").code(), codes::INVALID_ARGUMENT);
        assert_eq!(SeError::invalid_arg("x").code(), codes::INVALID_ARGUMENT);
        assert_eq!(SeError::no_memory("x").code(), codes::NO_MEMORY);
        assert_eq!(SeError::encode_overflow("x").code(), codes::UNKNOWN);
        assert_eq!(SeError::entropy("x").code(), codes::UNKNOWN);
        assert_eq!(SeError::sink_short("x").code(), codes::UNKNOWN);
        assert_eq!(SeError::invariant("x").code(), codes::UNKNOWN);
        assert!(codes::MIN_RESERVED < codes::UNKNOWN);
        assert_eq!(codes::OK, 0);
    }

    #[test]
    fn test_display() {
        let e = SeError::encode_overflow("imaginary part above tolerance");
        let s = std::format!("{e}");
        assert!(s.contains("EncodeOverflow"));
        assert!(s.contains("-1000"));
    }
}
