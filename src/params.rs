use crate::arith::Modulus;
use crate::error::{ensure, SeError};


/// Ciphertext scheme selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scheme {
    /// Secret-key encryption; `c1` is uniform and derivable from the
    /// shareable seed.
    Symmetric,
    /// Public-key encryption; requires an attached or generated public key.
    Asymmetric,
}

/// Where the inverse-FFT roots come from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IfftVariant {
    /// Each root is produced from its angle inside the butterfly loops; no
    /// table memory.
    Otf,
    /// A full table of n complex roots lives in the pool, computed at setup
    /// and persisted across calls.
    LoadFull,
}

/// Which forward-NTT realization runs per prime.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NttVariant {
    /// Roots recomputed from ψ per block; no table memory.
    Otf,
    /// A per-prime table of n roots, rebuilt on every prime advance.
    OneShot,
    /// The root table plus per-root quotients for lazy reduction.
    Fast,
}

/// How the slot-permutation index map is provided.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IndexMapPolicy {
    /// Indices are derived by the generator walk during each encode; no
    /// table memory.
    OnDemand,
    /// A u16 table in the pool, computed at setup and persisted.
    Persisted,
    /// A u16 table in the pool, supplied by the caller before the first
    /// encryption.
    Loaded,
}

/// Secret-key lifetime across encryptions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkPolicy {
    /// `s` is sampled (or loaded) once and reused by every call.
    Persistent,
    /// `s` is resampled from the private PRNG at every call.
    Fresh,
}

/// Traversal order over the prime chain. The sink receives per-prime
/// components in exactly this order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChainDirection {
    /// First prime to last.
    Forward,
    /// Last prime to first.
    Reverse,
}

/// Layout and code-path knobs, fixed per handle at setup. Every combination
/// of variants produces bit-identical ciphertexts; the knobs trade table
/// memory against per-call recomputation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EncryptorConfig {
    /// Inverse-FFT root sourcing.
    pub ifft: IfftVariant,
    /// Forward-NTT realization.
    pub ntt: NttVariant,
    /// Index-map sourcing.
    pub index_map: IndexMapPolicy,
    /// Secret-key lifetime.
    pub secret_key: SkPolicy,
    /// Prime-chain traversal order.
    pub direction: ChainDirection,
    /// Symmetric only: emit the 64-byte shareable seed once in place of the
    /// per-prime `c1` components.
    pub seed_compression: bool,
    /// Keep `s` packed at 2 bits per coefficient (the expanded alternative
    /// stores one residue word per coefficient).
    pub small_s: bool,
    /// Keep `u` packed at 2 bits per coefficient.
    pub small_u: bool,
}

impl Default for EncryptorConfig {
    fn default() -> Self {
        Self {
            ifft: IfftVariant::Otf,
            ntt: NttVariant::Otf,
            index_map: IndexMapPolicy::Persisted,
            secret_key: SkPolicy::Persistent,
            direction: ChainDirection::Forward,
            seed_compression: false,
            small_s: true,
            small_u: true,
        }
    }
}


/// Degrees the encoder and pool layouts are sized for.
const SUPPORTED_DEGREES: [usize; 5] = [1024, 2048, 4096, 8192, 16384];

// Largest NTT-friendly primes below the per-degree bit bound, descending;
// the special prime of the full modulus chain lives only on the host.
const PRIMES_1024: [u64; 1] = [134_215_681];
const PRIMES_2048: [u64; 1] = [134_176_769];
const PRIMES_4096: [u64; 3] = [1_073_692_673, 1_073_668_097, 1_073_651_713];
const PRIMES_8192: [u64; 6] = [
    1_073_692_673,
    1_073_643_521,
    1_073_479_681,
    1_073_430_529,
    1_073_299_457,
    1_073_233_921,
];
const PRIMES_16384: [u64; 13] = [
    1_073_643_521,
    1_073_479_681,
    1_073_184_769,
    1_073_053_697,
    1_072_857_089,
    1_072_496_641,
    1_071_513_601,
    1_071_415_297,
    1_071_087_617,
    1_070_727_169,
    1_070_432_257,
    1_069_219_841,
    1_068_564_481,
];

/// The default device prime chain for a degree, truncated to `nprimes`.
pub(crate) fn default_moduli(degree: usize, nprimes: usize) -> Result<&'static [u64], SeError> {
    let table: &[u64] = match degree {
        1024 => &PRIMES_1024,
        2048 => &PRIMES_2048,
        4096 => &PRIMES_4096,
        8192 => &PRIMES_8192,
        16384 => &PRIMES_16384,
        _ => return Err(SeError::invalid_config("unsupported polynomial degree")),
    };
    ensure!(nprimes >= 1, SeError::invalid_config("at least one prime is required"));
    ensure!(
        nprimes <= table.len(),
        SeError::invalid_config("more primes requested than the default chain provides")
    );
    Ok(&table[..nprimes])
}

/// The default scale for a degree.
pub(crate) fn default_scale(degree: usize) -> f64 {
    if degree == 1024 {
        f64::from(1u32 << 20)
    } else {
        f64::from(1u32 << 25)
    }
}


/// Degree, modulus chain, scale, and per-call chain state.
#[derive(Debug)]
pub(crate) struct Parms {
    pub(crate) degree: usize,
    pub(crate) logn: u32,
    pub(crate) scale: f64,
    pub(crate) moduli: Vec<Modulus>,
    pub(crate) psis: Vec<u64>, // primitive 2n-th root per prime
    pub(crate) curr_modulus_idx: usize,
    pub(crate) direction: ChainDirection,
    pub(crate) scheme: Scheme,
    pub(crate) small_s: bool,
    pub(crate) small_u: bool,
    pub(crate) sample_s: bool,      // cleared once a secret key is loaded
    pub(crate) pk_from_file: bool,  // set when the public key arrives as bytes
}

impl Parms {
    pub(crate) fn new(
        degree: usize, moduli_values: &[u64], scale: f64, scheme: Scheme,
        config: &EncryptorConfig,
    ) -> Result<Self, SeError> {
        ensure!(
            SUPPORTED_DEGREES.contains(&degree),
            SeError::invalid_config("degree must be a power of two between 1024 and 16384")
        );
        ensure!(!moduli_values.is_empty(), SeError::invalid_config("empty modulus chain"));
        ensure!(
            scale.is_finite() && scale > 0.0,
            SeError::invalid_config("scale must be positive and finite")
        );
        ensure!(
            !(config.seed_compression && scheme == Scheme::Asymmetric),
            SeError::invalid_config("seed compression applies to symmetric encryption only")
        );

        let logn = degree.trailing_zeros();
        let two_n = 2 * degree as u64;
        let mut moduli = Vec::with_capacity(moduli_values.len());
        let mut psis = Vec::with_capacity(moduli_values.len());
        let mut total_bits = 0u32;
        for (i, &q) in moduli_values.iter().enumerate() {
            ensure!(
                !moduli_values[..i].contains(&q),
                SeError::invalid_config("duplicate prime in the modulus chain")
            );
            let m = Modulus::new(q)?;
            psis.push(m.primitive_2n_root(two_n)?); // also checks 2n | q − 1
            total_bits += m.bits();
            moduli.push(m);
        }
        ensure!(
            scale.log2() < f64::from(total_bits),
            SeError::invalid_config("scale exceeds the modulus chain budget")
        );

        let curr_modulus_idx = match config.direction {
            ChainDirection::Forward => 0,
            ChainDirection::Reverse => moduli.len() - 1,
        };
        Ok(Self {
            degree,
            logn,
            scale,
            moduli,
            psis,
            curr_modulus_idx,
            direction: config.direction,
            scheme,
            small_s: config.small_s,
            small_u: config.small_u,
            sample_s: true,
            pk_from_file: false,
        })
    }

    pub(crate) fn nprimes(&self) -> usize {
        self.moduli.len()
    }

    /// First chain position in traversal order.
    pub(crate) fn initial_idx(&self) -> usize {
        match self.direction {
            ChainDirection::Forward => 0,
            ChainDirection::Reverse => self.moduli.len() - 1,
        }
    }

    pub(crate) fn curr_modulus(&self) -> &Modulus {
        &self.moduli[self.curr_modulus_idx]
    }

    pub(crate) fn curr_psi(&self) -> u64 {
        self.psis[self.curr_modulus_idx]
    }

    /// Advances to the next prime in traversal order; `false` once the chain
    /// is exhausted (the index is left on the final prime).
    pub(crate) fn next_modulus(&mut self) -> bool {
        match self.direction {
            ChainDirection::Forward => {
                if self.curr_modulus_idx + 1 < self.moduli.len() {
                    self.curr_modulus_idx += 1;
                    true
                } else {
                    false
                }
            }
            ChainDirection::Reverse => {
                if self.curr_modulus_idx > 0 {
                    self.curr_modulus_idx -= 1;
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Rewinds to the first prime in traversal order.
    pub(crate) fn reset_primes(&mut self) {
        self.curr_modulus_idx = self.initial_idx();
    }
}
