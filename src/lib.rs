#![deny(clippy::pedantic)]
#![deny(warnings)]
#![deny(missing_docs)]
#![doc = include_str!("../README.md")]


///
/// Implements the client half of CKKS approximate-arithmetic encryption for
/// memory-constrained deployments: slot encoding and symmetric/asymmetric
/// encryption over an RNS prime chain, streamed to a caller-provided sink.
/// Ciphertext algebra, decryption and key switching live on the host.
//
// Functionality map
//
// SHAKE256 seed-and-counter byte expander          --> prng.rs
// Barrett modulus, residue and polynomial ops      --> arith.rs
// Uniform / ternary / centered-binomial samplers   --> sampling.rs
// Slot permutation, inverse FFT, scale-and-round   --> encoder.rs
// Negacyclic NTT (three realizations)              --> ntt.rs
// Per-prime symmetric/asymmetric/keygen pipelines  --> encrypt.rs
// Word arena, named extents, phase marker          --> pool.rs
// Degree/chain/scale state and configuration       --> params.rs
// Key wire formats and the public-key type         --> keys.rs
// The Encryptor handle and setup/encrypt API       --> client.rs
//
// The pool deliberately aliases the complex encode buffer with the rounded
// integer view and the c0 extent; pool.rs documents the phase discipline
// that makes the overlap sound.

/// The `rand_core` types are re-exported so that users of this crate do not
/// have to worry about using the exact correct version of `rand_core`.
pub use rand_core::{CryptoRng, CryptoRngCore, Error as RngError, RngCore};

mod arith;
mod client;
mod encoder;
mod encrypt;
mod error;
mod keys;
mod ntt;
mod params;
mod pool;
mod prng;
mod sampling;

pub use arith::Modulus;
pub use client::Encryptor;
pub use error::{codes, SeError, SeErrorKind};
pub use keys::PublicKey;
pub use params::{
    ChainDirection, EncryptorConfig, IfftVariant, IndexMapPolicy, NttVariant, Scheme, SkPolicy,
};
pub use pool::pool_size_words;
pub use prng::{SePrng, SharedSeed, SEED_LEN};
