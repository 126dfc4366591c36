use crate::error::{ensure, SeError};
use crate::ntt::bitrev;
use crate::params::{IfftVariant, IndexMapPolicy};
use crate::pool::{get_c64, map_get, map_set, set_c64, set_int};
use core::f64::consts::PI;

// Slot-to-coefficient encoder. Slots are embedded at permuted positions
// (generator walk composed with the transform's bit reversal), inverse-FFT'd
// in place with roots of the primitive 2n-th complex root of unity, then
// scaled by Δ/n and rounded to signed 64-bit coefficients. The conjugate
// half makes every coefficient real, so the imaginary residue after the
// transform is pure floating-point noise; a residue above [`IM_TOLERANCE`]
// means the slot magnitudes (or the scale) overflowed what f64 can carry.

/// Largest tolerated scaled imaginary residue.
const IM_TOLERANCE: f64 = 0.5;

/// Scaled coefficients must stay below 2^62, leaving headroom for the
/// centered error added before per-prime reduction.
#[allow(clippy::cast_precision_loss)]
const MAX_COEFF: f64 = (1u64 << 62) as f64;

/// Multiplicative generator of the slot orbit in ℤ*_{2n}.
const GENERATOR: u64 = 3;


/// Writes the composed slot permutation into the pool's u16 table: slot `i`
/// lands at `bitrev((pos−1)/2)` and its conjugate at `bitrev((2n−pos−1)/2)`
/// where `pos` walks powers of the generator modulo 2n.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn load_index_map(words: &mut [u64], logn: u32) {
    let n = 1usize << logn;
    let two_n = (2 * n) as u64;
    let mut pos = 1u64;
    for i in 0..n / 2 {
        let idx1 = ((pos - 1) / 2) as usize;
        let idx2 = ((two_n - pos - 1) / 2) as usize;
        map_set(words, i, bitrev(idx1, logn) as u16);
        map_set(words, i + n / 2, bitrev(idx2, logn) as u16);
        pos = (pos * GENERATOR) % two_n;
    }
}

// Position pair for slot `i` given the current generator power.
#[allow(clippy::cast_possible_truncation)]
fn walk_pair(pos: u64, two_n: u64, logn: u32) -> (usize, usize) {
    let idx1 = ((pos - 1) / 2) as usize;
    let idx2 = ((two_n - pos - 1) / 2) as usize;
    (bitrev(idx1, logn), bitrev(idx2, logn))
}

// In-place inverse FFT: slot values at bit-reversed evaluation positions in,
// coefficients (times n) in natural order out. Gentleman-Sande butterflies;
// the root for block i of a stage with mm blocks is
// e^(−iπ·bitrev(mm+i, logn)/n), read from the table or produced on the fly.
fn ifft_inpl(words: &mut [u64], logn: u32, variant: IfftVariant, roots: &[u64]) {
    let n = 1usize << logn;
    #[allow(clippy::cast_precision_loss)]
    let n_f = n as f64;
    let mut mm = n >> 1;
    let mut t = 1usize;
    while mm >= 1 {
        for i in 0..mm {
            let (wre, wim) = match variant {
                IfftVariant::LoadFull => get_c64(roots, mm + i),
                IfftVariant::Otf => {
                    #[allow(clippy::cast_precision_loss)]
                    let angle = -PI * (bitrev(mm + i, logn) as f64) / n_f;
                    (angle.cos(), angle.sin())
                }
            };
            let start = 2 * i * t;
            for j in start..start + t {
                let (ure, uim) = get_c64(words, j);
                let (vre, vim) = get_c64(words, j + t);
                set_c64(words, j, ure + vre, uim + vim);
                let (dre, dim) = (ure - vre, uim - vim);
                set_c64(words, j + t, dre * wre - dim * wim, dre * wim + dim * wre);
            }
        }
        mm >>= 1;
        t <<= 1;
    }
}

/// Fills the persistent inverse-FFT root table (n complex slots).
#[allow(clippy::cast_precision_loss)]
pub(crate) fn load_ifft_roots(words: &mut [u64], logn: u32) {
    let n = 1usize << logn;
    for i in 0..n {
        let angle = -PI * (bitrev(i, logn) as f64) / (n as f64);
        set_c64(words, i, angle.cos(), angle.sin());
    }
}

/// Embeds up to n/2 real slots and their conjugates, runs the inverse FFT,
/// and rounds `Δ/n · re` into the signed coefficient view aliasing the low
/// half of `conj_vals`. Byte-identical across repeat calls on the same
/// input. `coeff_bound` is the per-coefficient plaintext budget (half the
/// smallest chain prime), beyond which the message cannot survive per-prime
/// reduction.
///
/// # Errors
/// `InvalidArgument` for non-finite slots, `EncodeOverflow` when the scaled
/// encoding leaves the representable range.
pub(crate) fn encode_base(
    values: &[f32], scale: f64, coeff_bound: f64, logn: u32, conj_vals: &mut [u64],
    ifft: IfftVariant, ifft_roots: &[u64], map_policy: IndexMapPolicy, map_words: &[u64],
) -> Result<(), SeError> {
    let n = 1usize << logn;
    debug_assert_eq!(conj_vals.len(), 2 * n, "conj_vals region length mismatch");
    debug_assert!(values.len() <= n / 2, "slot vector longer than n/2");

    for w in conj_vals.iter_mut() {
        *w = 0;
    }

    let two_n = (2 * n) as u64;
    let mut pos = 1u64;
    for (j, &v) in values.iter().enumerate() {
        ensure!(v.is_finite(), SeError::invalid_arg("slot value is not finite"));
        let (i1, i2) = match map_policy {
            IndexMapPolicy::OnDemand => walk_pair(pos, two_n, logn),
            IndexMapPolicy::Persisted | IndexMapPolicy::Loaded => {
                (map_get(map_words, j), map_get(map_words, j + n / 2))
            }
        };
        let v = f64::from(v);
        set_c64(conj_vals, i1, v, 0.0);
        set_c64(conj_vals, i2, v, 0.0); // conjugate of a real slot
        pos = (pos * GENERATOR) % two_n;
    }

    ifft_inpl(conj_vals, logn, ifft, ifft_roots);

    #[allow(clippy::cast_precision_loss)]
    let mul = scale / (n as f64);
    let bound = coeff_bound.min(MAX_COEFF);
    for k in 0..n {
        let (re, im) = get_c64(conj_vals, k);
        let re_s = re * mul;
        let im_s = im * mul;
        ensure!(
            im_s.abs() <= IM_TOLERANCE,
            SeError::encode_overflow("imaginary residue above rounding tolerance")
        );
        ensure!(
            re_s.abs() < bound,
            SeError::encode_overflow("scaled coefficient outside the plaintext budget")
        );
        #[allow(clippy::cast_possible_truncation)]
        set_int(conj_vals, k, re_s.round() as i64);
    }
    Ok(())
}
