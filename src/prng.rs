use crate::error::{ensure, SeError};
use rand_core::{CryptoRngCore, RngCore};
use sha3::digest::{ExtendableOutput, Update, XofReader};
use sha3::Shake256;
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

#[cfg(feature = "default-rng")]
use rand_core::OsRng;


/// Seed length in bytes for both device PRNGs and the shareable-seed
/// ciphertext alias.
pub const SEED_LEN: usize = 64;

/// Internal block size for the buffered word/byte draws. One block is one
/// SHAKE256 squeeze, i.e. one counter tick.
const BLOCK_LEN: usize = 512;


/// A 64-byte PRNG seed.
///
/// In symmetric mode the *shareable* seed doubles as a compact alias for the
/// uniform ciphertext component `c1`: publishing it lets the receiving side
/// re-derive `c1` instead of transporting `n` words per prime.
#[derive(Clone, Debug, Zeroize, ZeroizeOnDrop)]
pub struct SharedSeed([u8; SEED_LEN]);

impl SharedSeed {
    /// Wraps caller-provided seed bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; SEED_LEN]) -> Self {
        Self(bytes)
    }

    /// The raw seed bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; SEED_LEN] {
        &self.0
    }
}

// Conservative (constant-time) support...
impl PartialEq for SharedSeed {
    fn eq(&self, other: &Self) -> bool {
        bool::from(self.0.ct_eq(&other.0))
    }
}


/// Deterministic byte-stream expander: SHAKE256 over `seed ‖ counter_le8`,
/// with the counter incremented after every squeeze.
///
/// Each encryption owns two independent instances: a shareable one (deriving
/// the uniform `a = c1` polynomials) and a private one (secret key, masks and
/// error polynomials). The stream is a pure function of `(seed, counter)`.
#[derive(Clone, Debug)]
pub struct SePrng {
    seed: [u8; SEED_LEN],
    counter: u64,
    block: [u8; BLOCK_LEN],
    pos: usize,
}

impl SePrng {
    /// Builds a PRNG from a caller-provided seed with the counter at zero.
    #[must_use]
    pub fn new_from_seed(seed: &SharedSeed) -> Self {
        Self { seed: seed.0, counter: 0, block: [0u8; BLOCK_LEN], pos: BLOCK_LEN }
    }

    /// Builds a PRNG seeded from the platform entropy source.
    ///
    /// # Errors
    /// `EntropyUnavailable` when the platform entropy call fails.
    #[cfg(feature = "default-rng")]
    pub fn try_new_from_entropy() -> Result<Self, SeError> {
        Self::try_new_from_rng(&mut OsRng)
    }

    /// Builds a PRNG seeded from a caller-provided randomness source.
    ///
    /// # Errors
    /// `EntropyUnavailable` when the source fails.
    pub fn try_new_from_rng(rng: &mut impl CryptoRngCore) -> Result<Self, SeError> {
        let mut seed = [0u8; SEED_LEN];
        rng.try_fill_bytes(&mut seed)
            .map_err(|_| SeError::entropy("randomness source failed while seeding prng"))?;
        Ok(Self { seed, counter: 0, block: [0u8; BLOCK_LEN], pos: BLOCK_LEN })
    }

    /// Re-seeds in place: copies the given seed, or draws a fresh one from
    /// the platform entropy source when `None`. The counter restarts at zero.
    ///
    /// # Errors
    /// `EntropyUnavailable` when `seed` is `None` and the platform entropy
    /// call fails (or the `default-rng` feature is disabled).
    pub fn reset(&mut self, seed: Option<&SharedSeed>) -> Result<(), SeError> {
        match seed {
            Some(s) => self.seed = s.0,
            None => {
                #[cfg(feature = "default-rng")]
                OsRng
                    .try_fill_bytes(&mut self.seed)
                    .map_err(|_| SeError::entropy("platform entropy source failed"))?;
                #[cfg(not(feature = "default-rng"))]
                return Err(SeError::entropy("no entropy source compiled in"));
            }
        }
        self.counter = 0;
        self.pos = BLOCK_LEN; // discard any buffered bytes from the old seed
        Ok(())
    }

    /// The seed currently in use.
    #[must_use]
    pub fn seed(&self) -> SharedSeed {
        SharedSeed(self.seed)
    }

    /// Fills `out` with one SHAKE256 squeeze over `seed ‖ counter_le8`, then
    /// increments the counter. Independent of the buffered [`Self::next_u64`]
    /// stream except for the shared counter.
    ///
    /// # Errors
    /// `InvariantViolation` when the counter wraps and no reseed is possible.
    pub fn fill(&mut self, out: &mut [u8]) -> Result<(), SeError> {
        let mut hasher = Shake256::default();
        hasher.update(&self.seed);
        hasher.update(&self.counter.to_le_bytes());
        let mut reader = hasher.finalize_xof();
        reader.read(out);
        self.tick()
    }

    /// Draws the next little-endian word from the buffered stream, refilling
    /// the internal block (one counter tick) as needed.
    ///
    /// # Errors
    /// `InvariantViolation` when the counter wraps and no reseed is possible.
    pub fn next_u64(&mut self) -> Result<u64, SeError> {
        if self.pos + 8 > BLOCK_LEN {
            let mut block = [0u8; BLOCK_LEN];
            self.fill(&mut block)?;
            self.block = block;
            self.pos = 0;
        }
        let word = u64::from_le_bytes(
            self.block[self.pos..self.pos + 8].try_into().expect("8-byte chunk"),
        );
        self.pos += 8;
        Ok(word)
    }

    // Counter wrap forces a reseed; with no entropy source compiled in this
    // is an invariant violation (2^64 squeezes are unreachable in practice).
    fn tick(&mut self) -> Result<(), SeError> {
        match self.counter.checked_add(1) {
            Some(c) => {
                self.counter = c;
                Ok(())
            }
            None => {
                ensure!(
                    cfg!(feature = "default-rng"),
                    SeError::invariant("prng counter wrapped without reseed")
                );
                self.reset(None)
            }
        }
    }
}

impl Drop for SePrng {
    fn drop(&mut self) {
        self.seed.zeroize();
        self.block.zeroize();
    }
}
