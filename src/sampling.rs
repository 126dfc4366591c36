use crate::arith::Modulus;
use crate::error::SeError;
use crate::pool::IntSlice;
use crate::prng::SePrng;
use subtle::{ConditionallySelectable, ConstantTimeEq};

// Every coefficient distribution here is derived from raw PRNG bits with
// branchless lane arithmetic; nothing branches on a secret coefficient.

const LANES_PER_WORD: usize = 32; // 2 bits per ternary coefficient
const BYTES_PER_WORD: usize = 8; // 1 signed byte per small error coefficient

/// Fills `out` with independent uniform residues: one PRNG word per
/// coefficient, Barrett-reduced.
pub(crate) fn sample_uniform_inpl(
    prng: &mut SePrng, out: &mut [u64], modulus: &Modulus,
) -> Result<(), SeError> {
    for o in out.iter_mut() {
        *o = modulus.barrett_reduce(prng.next_u64()?);
    }
    Ok(())
}

/// Samples a uniform ternary polynomial into packed small form, 32 two-bit
/// codes per word. Per coefficient two random bits map as
/// `00→0, 01→+1, 10→−1, 11→0`, giving P(0) = 1/2 and P(±1) = 1/4; codes are
/// `0`, `1` (+1) and `2` (−1). The remap is word-parallel and constant time.
pub(crate) fn sample_ternary_small(prng: &mut SePrng, out: &mut [u64]) -> Result<(), SeError> {
    const EVEN: u64 = 0x5555_5555_5555_5555;
    for o in out.iter_mut() {
        let r = prng.next_u64()?;
        let b0 = r & EVEN;
        let b1 = (r >> 1) & EVEN;
        let keep = b0 ^ b1; // 1 in lanes holding ±1, 0 in lanes holding 0
        *o = (b0 & keep) | ((b1 & keep) << 1);
    }
    Ok(())
}

/// Samples a centered-binomial (η = 1) error polynomial and adds it in place
/// to the signed coefficient view: per coefficient two independent bits
/// `(a, b)` contribute `a − b ∈ {−1, 0, +1}`.
pub(crate) fn sample_cbd_add_inpl(prng: &mut SePrng, out: &mut IntSlice<'_>) -> Result<(), SeError> {
    let n = out.len();
    debug_assert_eq!(n % LANES_PER_WORD, 0, "degree not a lane multiple");
    for w in 0..n / LANES_PER_WORD {
        let r = prng.next_u64()?;
        for lane in 0..LANES_PER_WORD {
            let a = (r >> (2 * lane)) & 1;
            let b = (r >> (2 * lane + 1)) & 1;
            #[allow(clippy::cast_possible_wrap)]
            let e = a as i64 - b as i64;
            let k = w * LANES_PER_WORD + lane;
            out.set(k, out.get(k) + e);
        }
    }
    Ok(())
}

/// Samples a centered-binomial (η = 1) error polynomial into signed-byte
/// small form, eight `i8` lanes per word.
pub(crate) fn sample_cbd_bytes(prng: &mut SePrng, out: &mut [u64]) -> Result<(), SeError> {
    for chunk in out.chunks_mut(4) {
        let r = prng.next_u64()?; // 32 bit pairs cover 4 output words
        for (wi, o) in chunk.iter_mut().enumerate() {
            let mut word = 0u64;
            for lane in 0..BYTES_PER_WORD {
                let pair = 2 * (wi * BYTES_PER_WORD + lane);
                let a = (r >> pair) & 1;
                let b = (r >> (pair + 1)) & 1;
                #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap, clippy::cast_sign_loss)]
                let byte = (a as i8 - b as i8) as u8;
                word |= u64::from(byte) << (8 * lane);
            }
            *o = word;
        }
    }
    Ok(())
}

/// Reads ternary code `i` out of packed small form.
#[inline]
pub(crate) fn ternary_code(small: &[u64], i: usize) -> u64 {
    (small[i / LANES_PER_WORD] >> (2 * (i % LANES_PER_WORD))) & 3
}

/// Reads signed error byte `i` out of signed-byte small form.
#[inline]
#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
pub(crate) fn small_byte(small: &[u64], i: usize) -> i64 {
    let byte = (small[i / BYTES_PER_WORD] >> (8 * (i % BYTES_PER_WORD))) & 0xFF;
    i64::from(byte as u8 as i8)
}

/// Expands a packed ternary polynomial to residues modulo the given prime:
/// code 1 → 1, code 2 → q − 1, code 0 → 0. Constant-time selection.
pub(crate) fn expand_ternary_inpl(small: &[u64], out: &mut [u64], modulus: &Modulus) {
    let minus_one = modulus.value() - 1;
    for (i, o) in out.iter_mut().enumerate() {
        let code = ternary_code(small, i);
        let mut r = u64::conditional_select(&0, &1, code.ct_eq(&1));
        r = u64::conditional_select(&r, &minus_one, code.ct_eq(&2));
        *o = r;
    }
}

/// Re-expresses an expanded ternary polynomial held modulo `old` as the same
/// polynomial modulo `new` (only the −1 representation moves).
pub(crate) fn rereduce_expanded_ternary_inpl(out: &mut [u64], old: &Modulus, new: &Modulus) {
    let old_minus_one = old.value() - 1;
    let new_minus_one = new.value() - 1;
    for o in out.iter_mut() {
        *o = u64::conditional_select(o, &new_minus_one, o.ct_eq(&old_minus_one));
    }
}

/// Samples a uniform ternary polynomial directly in expanded residue form
/// (the non-packed secret-key/mask storage option). Consumes the PRNG stream
/// identically to [`sample_ternary_small`].
pub(crate) fn sample_ternary_expanded(
    prng: &mut SePrng, out: &mut [u64], modulus: &Modulus,
) -> Result<(), SeError> {
    let minus_one = modulus.value() - 1;
    let n = out.len();
    debug_assert_eq!(n % LANES_PER_WORD, 0, "degree not a lane multiple");
    for w in 0..n / LANES_PER_WORD {
        let r = prng.next_u64()?;
        for lane in 0..LANES_PER_WORD {
            let a = (r >> (2 * lane)) & 1;
            let b = (r >> (2 * lane + 1)) & 1;
            let keep = !a.ct_eq(&b); // ±1 lanes
            let plus = a.ct_eq(&1);
            let mut v = u64::conditional_select(&minus_one, &1, plus);
            v = u64::conditional_select(&0, &v, keep);
            out[w * LANES_PER_WORD + lane] = v;
        }
    }
    Ok(())
}

/// Packs an expanded ternary polynomial (residues modulo `old`) back into
/// 2-bit small form, used when exporting a non-packed secret key.
pub(crate) fn compress_expanded_ternary(expanded: &[u64], out: &mut [u64], old: &Modulus) {
    let minus_one = old.value() - 1;
    for o in out.iter_mut() {
        *o = 0;
    }
    for (i, &x) in expanded.iter().enumerate() {
        let mut code = u64::conditional_select(&0, &1, x.ct_eq(&1));
        code = u64::conditional_select(&code, &2, x.ct_eq(&minus_one));
        out[i / LANES_PER_WORD] |= code << (2 * (i % LANES_PER_WORD));
    }
}
