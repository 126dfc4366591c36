use crate::arith::Modulus;
use crate::params::NttVariant;

// In-place negacyclic number-theoretic transform over a 30-bit prime chain
// member: Cooley-Tukey butterflies, natural coefficient order in,
// bit-reversed evaluation order out. Output position `i` holds the value of
// the polynomial at ψ^(2·bitrev(i)+1), so pointwise products of two outputs
// are the transform of the negacyclic product.
//
// Three interchangeable realizations: root powers recomputed per block
// (no table), a one-shot per-prime root table, and the table plus
// per-root quotients for lazy reduction. All three land on identical
// residues.


/// Reverses the low `bits` bits of `x`.
#[inline]
#[must_use]
pub(crate) fn bitrev(x: usize, bits: u32) -> usize {
    x.reverse_bits() >> (usize::BITS - bits)
}

/// Fills `out` (length n) with `ψ^bitrev(i)` in bit-reversed order via a
/// single sequential power walk.
pub(crate) fn load_root_table(out: &mut [u64], psi: u64, modulus: &Modulus, logn: u32) {
    debug_assert_eq!(out.len(), 1 << logn, "root table length mismatch");
    let mut power = 1u64;
    for i in 0..out.len() {
        out[bitrev(i, logn)] = power;
        power = modulus.mul_mod(power, psi);
    }
}

/// Fills the root table plus the per-root quotients `⌊w·2^64/q⌋` that drive
/// the lazy-reduction butterflies.
pub(crate) fn load_fast_tables(
    roots: &mut [u64], quots: &mut [u64], psi: u64, modulus: &Modulus, logn: u32,
) {
    load_root_table(roots, psi, modulus, logn);
    let q = u128::from(modulus.value());
    for (quot, &w) in quots.iter_mut().zip(roots.iter()) {
        #[allow(clippy::cast_possible_truncation)]
        {
            *quot = ((u128::from(w) << 64) / q) as u64;
        }
    }
}

/// Transforms `a` in place, selecting the configured realization. `tables`
/// is the per-prime root region: empty for the on-the-fly variant, n words
/// for the one-shot table, 2n words (roots then quotients) for the fast one.
pub(crate) fn forward_ntt_inpl(
    variant: NttVariant, a: &mut [u64], modulus: &Modulus, psi: u64, logn: u32, tables: &[u64],
) {
    let n = a.len();
    debug_assert_eq!(n, 1 << logn, "polynomial length mismatch");
    match variant {
        NttVariant::Otf => ntt_otf(a, modulus, psi, logn),
        NttVariant::OneShot => {
            debug_assert_eq!(tables.len(), n, "one-shot table region mismatch");
            ntt_one_shot(a, modulus, &tables[..n]);
        }
        NttVariant::Fast => {
            debug_assert_eq!(tables.len(), 2 * n, "fast table region mismatch");
            ntt_fast(a, modulus, &tables[..n], &tables[n..]);
        }
    }
}

// Roots derived per block from ψ; no table memory.
fn ntt_otf(a: &mut [u64], modulus: &Modulus, psi: u64, logn: u32) {
    let n = a.len();
    let mut mm = 1usize;
    let mut t = n >> 1;
    while mm < n {
        for i in 0..mm {
            #[allow(clippy::cast_possible_truncation)]
            let w = modulus.pow_mod(psi, bitrev(mm + i, logn) as u64);
            let start = 2 * i * t;
            for j in start..start + t {
                let u = a[j];
                let v = modulus.mul_mod(a[j + t], w);
                a[j] = modulus.add_mod(u, v);
                a[j + t] = modulus.sub_mod(u, v);
            }
        }
        mm <<= 1;
        t >>= 1;
    }
}

// Full per-prime table in bit-reversed order; strict reduction throughout.
fn ntt_one_shot(a: &mut [u64], modulus: &Modulus, roots: &[u64]) {
    let n = a.len();
    let mut mm = 1usize;
    let mut t = n >> 1;
    while mm < n {
        for i in 0..mm {
            let w = roots[mm + i];
            let start = 2 * i * t;
            for j in start..start + t {
                let u = a[j];
                let v = modulus.mul_mod(a[j + t], w);
                a[j] = modulus.add_mod(u, v);
                a[j + t] = modulus.sub_mod(u, v);
            }
        }
        mm <<= 1;
        t >>= 1;
    }
}

// Returns x·w mod q in [0, 2q) using the precomputed quotient; any x.
#[inline]
fn mul_root_lazy(x: u64, w: u64, w_quot: u64, q: u64) -> u64 {
    #[allow(clippy::cast_possible_truncation)]
    let q_hat = ((u128::from(x) * u128::from(w_quot)) >> 64) as u64;
    x.wrapping_mul(w).wrapping_sub(q_hat.wrapping_mul(q))
}

// Lazy-reduction butterflies; intermediate values stay below 4q, with a
// final correction pass back to [0, q).
fn ntt_fast(a: &mut [u64], modulus: &Modulus, roots: &[u64], quots: &[u64]) {
    let n = a.len();
    let q = modulus.value();
    let two_q = q << 1;
    let mut mm = 1usize;
    let mut t = n >> 1;
    while mm < n {
        for i in 0..mm {
            let w = roots[mm + i];
            let wq = quots[mm + i];
            let start = 2 * i * t;
            for j in start..start + t {
                let mut u = a[j];
                if u >= two_q {
                    u -= two_q;
                }
                let v = mul_root_lazy(a[j + t], w, wq, q);
                a[j] = u + v;
                a[j + t] = u + two_q - v;
            }
        }
        mm <<= 1;
        t >>= 1;
    }
    for x in a.iter_mut() {
        if *x >= two_q {
            *x -= two_q;
        }
        if *x >= q {
            *x -= q;
        }
    }
}
