// Reference decryption and decoding used by the round-trip tests. Built
// only on the crate's public surface (Modulus arithmetic, the PRNG, wire
// formats); transforms are implemented independently here so the tests
// check the library against the algebra rather than against itself.

use ckks_embed::{Modulus, SePrng, SharedSeed, SEED_LEN};
use std::f64::consts::PI;

pub fn bitrev(x: usize, bits: u32) -> usize {
    x.reverse_bits() >> (usize::BITS - bits)
}

/// The slot permutation: generator-3 walk composed with bit reversal.
pub fn index_map(logn: u32) -> Vec<usize> {
    let n = 1usize << logn;
    let two_n = (2 * n) as u64;
    let mut map = vec![0usize; n];
    let mut pos = 1u64;
    for i in 0..n / 2 {
        map[i] = bitrev(((pos - 1) / 2) as usize, logn);
        map[i + n / 2] = bitrev(((two_n - pos - 1) / 2) as usize, logn);
        pos = (pos * 3) % two_n;
    }
    map
}

/// Splits an uncompressed emission stream into per-prime `(c0, c1)` word
/// vectors.
pub fn parse_stream(bytes: &[u8], n: usize, nprimes: usize) -> Vec<(Vec<u64>, Vec<u64>)> {
    assert_eq!(bytes.len(), nprimes * 2 * n * 8, "stream length mismatch");
    let mut out = Vec::new();
    let mut off = 0usize;
    for _ in 0..nprimes {
        let c0 = words_le(&bytes[off..off + n * 8]);
        off += n * 8;
        let c1 = words_le(&bytes[off..off + n * 8]);
        off += n * 8;
        out.push((c0, c1));
    }
    out
}

/// Splits a seed-compressed emission stream into the seed and the per-prime
/// `c0` vectors.
pub fn parse_compressed_stream(bytes: &[u8], n: usize, nprimes: usize) -> ([u8; 64], Vec<Vec<u64>>) {
    assert_eq!(bytes.len(), 64 + nprimes * n * 8, "compressed stream length mismatch");
    let seed: [u8; 64] = bytes[..64].try_into().unwrap();
    let mut c0s = Vec::new();
    let mut off = 64usize;
    for _ in 0..nprimes {
        c0s.push(words_le(&bytes[off..off + n * 8]));
        off += n * 8;
    }
    (seed, c0s)
}

pub fn words_le(bytes: &[u8]) -> Vec<u64> {
    bytes.chunks_exact(8).map(|c| u64::from_le_bytes(c.try_into().unwrap())).collect()
}

/// Re-derives the uniform `c1` components from a published shareable seed,
/// in chain-traversal order.
pub fn derive_c1(seed: &[u8; 64], n: usize, moduli: &[Modulus]) -> Vec<Vec<u64>> {
    let mut prng = SePrng::new_from_seed(&SharedSeed::from_bytes(*seed));
    let mut out = Vec::new();
    for m in moduli {
        let mut c1 = vec![0u64; n];
        for c in &mut c1 {
            *c = m.barrett_reduce(prng.next_u64().unwrap());
        }
        out.push(c1);
    }
    out
}

/// Unpacks the exported secret key (2-bit codes) into signed coefficients.
pub fn unpack_sk(bytes: &[u8]) -> Vec<i64> {
    let mut out = Vec::with_capacity(bytes.len() * 4);
    for &b in bytes {
        for lane in 0..4 {
            out.push(match (b >> (2 * lane)) & 3 {
                0 => 0,
                1 => 1,
                2 => -1,
                _ => panic!("illegal ternary code in exported key"),
            });
        }
    }
    out
}

// Forward negacyclic NTT matching the device convention: Cooley-Tukey,
// natural in, bit-reversed evaluations out, roots ψ^bitrev.
pub fn ntt_fwd(a: &mut [u64], m: &Modulus, psi: u64, logn: u32) {
    let n = a.len();
    let mut mm = 1usize;
    let mut t = n >> 1;
    while mm < n {
        for i in 0..mm {
            let w = m.pow_mod(psi, bitrev(mm + i, logn) as u64);
            let start = 2 * i * t;
            for j in start..start + t {
                let u = a[j];
                let v = m.mul_mod(a[j + t], w);
                a[j] = m.add_mod(u, v);
                a[j + t] = m.sub_mod(u, v);
            }
        }
        mm <<= 1;
        t >>= 1;
    }
}

// Inverse of `ntt_fwd`: Gentleman-Sande with ψ^{-bitrev}, then n^{-1}.
pub fn ntt_inv(a: &mut [u64], m: &Modulus, psi: u64, logn: u32) {
    let n = a.len();
    let two_n = 2 * (n as u64);
    let psi_inv = m.pow_mod(psi, two_n - 1);
    let mut mm = n >> 1;
    let mut t = 1usize;
    while mm >= 1 {
        for i in 0..mm {
            let w = m.pow_mod(psi_inv, bitrev(mm + i, logn) as u64);
            let start = 2 * i * t;
            for j in start..start + t {
                let u = a[j];
                let v = a[j + t];
                a[j] = m.add_mod(u, v);
                a[j + t] = m.mul_mod(m.sub_mod(u, v), w);
            }
        }
        mm >>= 1;
        t <<= 1;
    }
    let n_inv = m.pow_mod(n as u64, m.value() - 2);
    for x in a.iter_mut() {
        *x = m.mul_mod(*x, n_inv);
    }
}

/// `c0 + c1·s` under one prime, back to centered coefficients of `Δm + e`.
pub fn decrypt_prime(
    c0: &[u64], c1: &[u64], sk: &[i64], m: &Modulus, logn: u32,
) -> Vec<i64> {
    let n = c0.len();
    let psi = m.primitive_2n_root(2 * n as u64).unwrap();
    let q = m.value();
    let mut s: Vec<u64> = sk
        .iter()
        .map(|&v| match v {
            1 => 1,
            -1 => q - 1,
            _ => 0,
        })
        .collect();
    ntt_fwd(&mut s, m, psi, logn);
    let mut w: Vec<u64> = (0..n).map(|j| m.add_mod(c0[j], m.mul_mod(c1[j], s[j]))).collect();
    ntt_inv(&mut w, m, psi, logn);
    let half = q / 2;
    w.into_iter().map(|x| if x > half { x as i64 - q as i64 } else { x as i64 }).collect()
}

/// Coefficients back to slots: forward complex transform (mirroring the
/// encoder's inverse), read out through the index map, divide by the scale.
pub fn decode(coeffs: &[i64], scale: f64, logn: u32) -> Vec<(f64, f64)> {
    let n = coeffs.len();
    let mut re: Vec<f64> = coeffs.iter().map(|&c| c as f64).collect();
    let mut im = vec![0.0f64; n];
    let mut mm = 1usize;
    let mut t = n >> 1;
    while mm < n {
        for i in 0..mm {
            let angle = PI * (bitrev(mm + i, logn) as f64) / (n as f64);
            let (wre, wim) = (angle.cos(), angle.sin());
            let start = 2 * i * t;
            for j in start..start + t {
                let (ure, uim) = (re[j], im[j]);
                let (vre, vim) =
                    (re[j + t] * wre - im[j + t] * wim, re[j + t] * wim + im[j + t] * wre);
                re[j] = ure + vre;
                im[j] = uim + vim;
                re[j + t] = ure - vre;
                im[j + t] = uim - vim;
            }
        }
        mm <<= 1;
        t >>= 1;
    }
    let map = index_map(logn);
    (0..n / 2).map(|j| (re[map[j]] / scale, im[map[j]] / scale)).collect()
}

/// Full symmetric round trip for one prime of a parsed stream.
pub fn decrypt_decode(
    pair: &(Vec<u64>, Vec<u64>), sk_bytes: &[u8], m: &Modulus, scale: f64, logn: u32,
) -> Vec<(f64, f64)> {
    let sk = unpack_sk(sk_bytes);
    let coeffs = decrypt_prime(&pair.0, &pair.1, &sk, m, logn);
    decode(&coeffs, scale, logn)
}

/// A deterministic 64-byte seed.
pub fn seed(tag: u8) -> SharedSeed {
    SharedSeed::from_bytes([tag; SEED_LEN])
}
