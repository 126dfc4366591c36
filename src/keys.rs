use crate::arith::Modulus;
use crate::error::{ensure, SeError};

// Key material on the wire is little-endian machine words. The secret key
// travels packed at 2 bits per coefficient; the public key is 2·k·n
// residues in NTT form, one prime after another (pk0 then pk1 per prime).

const TERNARY_LANES: usize = 32;
const WORD_BYTES: usize = 8;


/// A device public key: per prime, the pair `(pk0, pk1)` in NTT form, where
/// `pk1 = a` is uniform and `pk0 = −(a·s) + ep`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublicKey {
    degree: usize,
    nprimes: usize,
    data: Vec<u64>, // nprimes * 2n residues
}

impl PublicKey {
    pub(crate) fn from_parts(degree: usize, nprimes: usize, data: Vec<u64>) -> Self {
        debug_assert_eq!(data.len(), 2 * degree * nprimes, "public key length mismatch");
        Self { degree, nprimes, data }
    }

    /// Polynomial degree the key was generated for.
    #[must_use]
    pub const fn degree(&self) -> usize {
        self.degree
    }

    /// Number of primes the key covers.
    #[must_use]
    pub const fn nprimes(&self) -> usize {
        self.nprimes
    }

    // The (pk0, pk1) pair for chain position `idx`.
    pub(crate) fn prime_pair(&self, idx: usize) -> (&[u64], &[u64]) {
        let n = self.degree;
        let base = idx * 2 * n;
        (&self.data[base..base + n], &self.data[base + n..base + 2 * n])
    }

    /// Serializes to little-endian words, one prime after another.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.data.len() * WORD_BYTES);
        for &w in &self.data {
            out.extend_from_slice(&w.to_le_bytes());
        }
        out
    }

    /// Deserializes and validates a public key against a parameter set:
    /// exact length, and every residue strictly below its prime.
    ///
    /// # Errors
    /// `InvalidArgument` on length mismatch or an out-of-range residue;
    /// `NoMemory` when the key buffer cannot be allocated.
    pub fn try_from_bytes(
        bytes: &[u8], degree: usize, moduli: &[Modulus],
    ) -> Result<Self, SeError> {
        let nprimes = moduli.len();
        ensure!(
            bytes.len() == 2 * degree * nprimes * WORD_BYTES,
            SeError::invalid_arg("public key byte length does not match the parameter set")
        );
        let mut data = Vec::new();
        data.try_reserve_exact(2 * degree * nprimes)
            .map_err(|_| SeError::no_memory("public key buffer allocation failed"))?;
        for (i, chunk) in bytes.chunks_exact(WORD_BYTES).enumerate() {
            let w = u64::from_le_bytes(chunk.try_into().expect("8-byte chunk"));
            let q = moduli[i / (2 * degree)].value();
            ensure!(w < q, SeError::invalid_arg("public key residue at or above its prime"));
            data.push(w);
        }
        Ok(Self { degree, nprimes, data })
    }
}


/// Packs small-form ternary words into the n/4-byte wire format.
pub(crate) fn sk_to_bytes(small: &[u64]) -> Vec<u8> {
    let mut out = Vec::with_capacity(small.len() * WORD_BYTES);
    for &w in small {
        out.extend_from_slice(&w.to_le_bytes());
    }
    out
}

/// Unpacks the n/4-byte secret-key wire format into small-form words,
/// rejecting the unused 2-bit code 3.
///
/// # Errors
/// `InvalidArgument` on length mismatch or an illegal code.
pub(crate) fn sk_from_bytes(bytes: &[u8], degree: usize, out: &mut [u64]) -> Result<(), SeError> {
    ensure!(
        bytes.len() == degree / 4,
        SeError::invalid_arg("secret key byte length does not match the degree")
    );
    debug_assert_eq!(out.len(), degree / TERNARY_LANES, "secret key extent mismatch");
    const EVEN: u64 = 0x5555_5555_5555_5555;
    for (o, chunk) in out.iter_mut().zip(bytes.chunks_exact(WORD_BYTES)) {
        let w = u64::from_le_bytes(chunk.try_into().expect("8-byte chunk"));
        ensure!(
            w & (w >> 1) & EVEN == 0,
            SeError::invalid_arg("secret key contains an illegal ternary code")
        );
        *o = w;
    }
    Ok(())
}
