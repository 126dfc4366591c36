use crate::arith::{poly_add_mod_inpl, poly_mult_mod_ntt_form_inpl, poly_neg_mac_inpl, Modulus};
use crate::error::SeError;
use crate::ntt::forward_ntt_inpl;
use crate::params::NttVariant;
use crate::pool::{int_at, IntSlice, PrimeViews};
use crate::prng::SePrng;
use crate::sampling::{
    expand_ternary_inpl, sample_cbd_add_inpl, sample_cbd_bytes, sample_ternary_expanded,
    sample_ternary_small, sample_uniform_inpl, small_byte,
};

// Per-call initialization and the per-prime pipelines. Everything operates
// on pool views; the mask/secret expansions land in the `c0` extent and the
// `ntt_pte` extent doubles as the pointwise scratch before the plaintext is
// reduced into it, so each prime iteration completes without any memory
// beyond the layout.


/// Symmetric per-call init: sample the error polynomial `e` and fold it into
/// the signed coefficient view while it is still pre-reduction.
pub(crate) fn sym_init(private: &mut SePrng, int: &mut IntSlice<'_>) -> Result<(), SeError> {
    sample_cbd_add_inpl(private, int)
}

/// Asymmetric per-call init: sample the ternary mask `u`, fold `e0` into the
/// signed coefficient view, and sample `e1` in small form (it contributes to
/// `c1`, so each prime reduces it separately).
pub(crate) fn asym_init(
    private: &mut SePrng, int: &mut IntSlice<'_>, u: &mut [u64], e1_small: &mut [u64],
    small_u: bool, first_modulus: &Modulus,
) -> Result<(), SeError> {
    if small_u {
        sample_ternary_small(private, u)?;
    } else {
        sample_ternary_expanded(private, u, first_modulus)?;
    }
    sample_cbd_add_inpl(private, int)?;
    sample_cbd_bytes(private, e1_small)
}

// Reduce the signed plaintext-plus-error view into residues.
fn reduce_int_into(out: &mut [u64], int_words: &[u64], modulus: &Modulus) {
    for (k, o) in out.iter_mut().enumerate() {
        *o = modulus.reduce_i64(int_at(int_words, k));
    }
}

// Reduce a signed-byte small polynomial into residues.
fn reduce_bytes_into(out: &mut [u64], small: &[u64], modulus: &Modulus) {
    for (k, o) in out.iter_mut().enumerate() {
        *o = modulus.reduce_i64(small_byte(small, k));
    }
}

// Materialize a ternary polynomial (packed or expanded storage) into `out`
// as residues of the current prime. Expanded storage must already be
// reduced to the current prime by the caller.
fn materialize_ternary(out: &mut [u64], stored: &[u64], small: bool, modulus: &Modulus) {
    if small {
        expand_ternary_inpl(stored, out, modulus);
    } else {
        out.copy_from_slice(stored);
    }
}

/// One symmetric prime iteration:
/// `c1 = a` uniform from the shareable PRNG, `c0 = NTT(Δm+e) − a·NTT(s)`.
pub(crate) fn sym_prime(
    v: &mut PrimeViews<'_>, modulus: &Modulus, psi: u64, logn: u32, variant: NttVariant,
    shareable: &mut SePrng, small_s: bool,
) -> Result<(), SeError> {
    reduce_int_into(v.ntt_pte, v.conj_vals_int, modulus);
    forward_ntt_inpl(variant, v.ntt_pte, modulus, psi, logn, v.ntt_tables);

    // a is drawn directly in NTT form by convention
    sample_uniform_inpl(shareable, v.c1, modulus)?;

    materialize_ternary(v.c0, v.sk, small_s, modulus);
    forward_ntt_inpl(variant, v.c0, modulus, psi, logn, v.ntt_tables);
    poly_neg_mac_inpl(v.c0, v.ntt_pte, v.c1, modulus);
    Ok(())
}

/// One key-generation prime iteration, mirroring [`sym_prime`] with the key
/// error `ep` (pre-sampled into the small-error extent) in place of the
/// plaintext: `pk1 = a`, `pk0 = NTT(ep) − a·NTT(s)`. Results land in the
/// `c0`/`c1` extents for the caller to copy out.
pub(crate) fn keygen_prime(
    v: &mut PrimeViews<'_>, modulus: &Modulus, psi: u64, logn: u32, variant: NttVariant,
    keygen: &mut SePrng, small_s: bool,
) -> Result<(), SeError> {
    reduce_bytes_into(v.ntt_pte, v.e1_small, modulus);
    forward_ntt_inpl(variant, v.ntt_pte, modulus, psi, logn, v.ntt_tables);

    sample_uniform_inpl(keygen, v.c1, modulus)?;

    materialize_ternary(v.c0, v.sk, small_s, modulus);
    forward_ntt_inpl(variant, v.c0, modulus, psi, logn, v.ntt_tables);
    poly_neg_mac_inpl(v.c0, v.ntt_pte, v.c1, modulus);
    Ok(())
}

/// One asymmetric prime iteration with `(pk0, pk1)` already loaded into
/// their extents in NTT form:
/// `c1 = pk1·NTT(u) + NTT(e1)`, `c0 = pk0·NTT(u) + NTT(Δm+e0)`.
pub(crate) fn asym_prime(
    v: &mut PrimeViews<'_>, modulus: &Modulus, psi: u64, logn: u32, variant: NttVariant,
    small_u: bool,
) {
    // NTT(u) occupies the c0 extent until the final combine overwrites it
    materialize_ternary(v.c0, v.u, small_u, modulus);
    forward_ntt_inpl(variant, v.c0, modulus, psi, logn, v.ntt_tables);

    reduce_bytes_into(v.c1, v.e1_small, modulus);
    forward_ntt_inpl(variant, v.c1, modulus, psi, logn, v.ntt_tables);

    // ntt_pte is free until the plaintext reduction below; use it for pk1·u
    v.ntt_pte.copy_from_slice(v.pk1);
    poly_mult_mod_ntt_form_inpl(v.ntt_pte, v.c0, modulus);
    poly_add_mod_inpl(v.c1, v.ntt_pte, modulus);

    reduce_int_into(v.ntt_pte, v.conj_vals_int, modulus);
    forward_ntt_inpl(variant, v.ntt_pte, modulus, psi, logn, v.ntt_tables);
    poly_mult_mod_ntt_form_inpl(v.c0, v.pk0, modulus);
    poly_add_mod_inpl(v.c0, v.ntt_pte, modulus);
}
