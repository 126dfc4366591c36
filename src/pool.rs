use crate::error::SeError;
use crate::params::{EncryptorConfig, IfftVariant, IndexMapPolicy, NttVariant, Scheme};
use core::ops::Range;
use zeroize::Zeroize;

// One contiguous word arena backs the whole encode-encrypt pipeline. Two
// aliases are deliberate and load-bearing:
//   * the signed coefficient view `conj_vals_int` is the low half of the
//     complex `conj_vals` region (a complex slot is two words, its rounded
//     integer one), and
//   * `c0` occupies the high half of `conj_vals`, which is dead once the
//     scale-and-round step has produced the integer view.
// Producers finish before consumers start within each phase, which the
// debug-build phase marker enforces.

const TERNARY_LANES: usize = 32; // 2-bit codes per word
const ERROR_LANES: usize = 8; // i8 lanes per word
const INDEX_LANES: usize = 4; // u16 lanes per word


/// Named word extents carved out of the pool for one (degree, scheme,
/// configuration) triple.
#[derive(Clone, Debug)]
pub(crate) struct Layout {
    pub(crate) n: usize,
    pub(crate) conj_vals: Range<usize>,
    pub(crate) conj_vals_int: Range<usize>,
    pub(crate) c0: Range<usize>,
    pub(crate) ntt_pte: Range<usize>,
    pub(crate) c1: Range<usize>,
    pub(crate) ifft_roots: Range<usize>,
    pub(crate) ntt_tables: Range<usize>,
    pub(crate) sk: Range<usize>,
    pub(crate) index_map: Range<usize>,
    pub(crate) pk0: Range<usize>,
    pub(crate) pk1: Range<usize>,
    pub(crate) u: Range<usize>,
    pub(crate) e1_small: Range<usize>,
    pub(crate) total: usize,
}

impl Layout {
    pub(crate) fn compute(degree: usize, scheme: Scheme, config: &EncryptorConfig) -> Self {
        let n = degree;
        let mut cursor = 4 * n; // conj_vals + ntt_pte + c1

        let ifft_words = match config.ifft {
            IfftVariant::Otf => 0,
            IfftVariant::LoadFull => 2 * n,
        };
        let ifft_roots = cursor..cursor + ifft_words;
        cursor += ifft_words;

        let table_words = match config.ntt {
            NttVariant::Otf => 0,
            NttVariant::OneShot => n,
            NttVariant::Fast => 2 * n,
        };
        let ntt_tables = cursor..cursor + table_words;
        cursor += table_words;

        let sk_words = if config.small_s { n / TERNARY_LANES } else { n };
        let sk = cursor..cursor + sk_words;
        cursor += sk_words;

        let map_words = match config.index_map {
            IndexMapPolicy::OnDemand => 0,
            IndexMapPolicy::Persisted | IndexMapPolicy::Loaded => n / INDEX_LANES,
        };
        let index_map = cursor..cursor + map_words;
        cursor += map_words;

        let (pk0, pk1, u, e1_small) = match scheme {
            Scheme::Symmetric => {
                (cursor..cursor, cursor..cursor, cursor..cursor, cursor..cursor)
            }
            Scheme::Asymmetric => {
                let pk0 = cursor..cursor + n;
                cursor += n;
                let pk1 = cursor..cursor + n;
                cursor += n;
                let u_words = if config.small_u { n / TERNARY_LANES } else { n };
                let u = cursor..cursor + u_words;
                cursor += u_words;
                let e1 = cursor..cursor + n / ERROR_LANES;
                cursor += n / ERROR_LANES;
                (pk0, pk1, u, e1)
            }
        };

        Self {
            n,
            conj_vals: 0..2 * n,
            conj_vals_int: 0..n,
            c0: n..2 * n,
            ntt_pte: 2 * n..3 * n,
            c1: 3 * n..4 * n,
            ifft_roots,
            ntt_tables,
            sk,
            index_map,
            pk0,
            pk1,
            u,
            e1_small,
            total: cursor,
        }
    }
}

/// Pool size in machine words for a (degree, scheme, configuration) triple.
#[must_use]
pub fn pool_size_words(degree: usize, scheme: Scheme, config: &EncryptorConfig) -> usize {
    Layout::compute(degree, scheme, config).total
}


/// Pipeline position, tracked to catch out-of-phase view use in debug builds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum PoolPhase {
    Idle,
    Encode,
    PrimeLoop,
}

/// The contiguous arena plus its layout and phase marker. Zeroized on drop
/// (it holds the packed secret key and pre-mask plaintext).
#[derive(Debug)]
pub(crate) struct Pool {
    words: Vec<u64>,
    layout: Layout,
    phase: PoolPhase,
}

/// Views live during encode: the complex region, the inverse-FFT root table
/// and the index map.
pub(crate) struct EncodeViews<'a> {
    pub(crate) conj_vals: &'a mut [u64],
    pub(crate) ifft_roots: &'a [u64],
    pub(crate) index_map: &'a [u64],
}

/// Views live while noise is sampled into the signed coefficient view and
/// the small polynomials.
pub(crate) struct InitViews<'a> {
    pub(crate) int: IntSlice<'a>,
    pub(crate) u: &'a mut [u64],
    pub(crate) e1_small: &'a mut [u64],
    #[cfg_attr(not(test), allow(dead_code))]
    pub(crate) sk: &'a mut [u64],
}

/// Views live during one prime iteration.
pub(crate) struct PrimeViews<'a> {
    pub(crate) conj_vals_int: &'a [u64],
    pub(crate) c0: &'a mut [u64],
    pub(crate) ntt_pte: &'a mut [u64],
    pub(crate) c1: &'a mut [u64],
    pub(crate) ntt_tables: &'a mut [u64],
    pub(crate) sk: &'a mut [u64],
    pub(crate) pk0: &'a mut [u64],
    pub(crate) pk1: &'a mut [u64],
    pub(crate) u: &'a mut [u64],
    pub(crate) e1_small: &'a [u64],
}

impl Pool {
    pub(crate) fn new(layout: Layout) -> Result<Self, SeError> {
        debug_assert!(layout.total >= 4 * layout.n, "layout shorter than its fixed extents");
        let mut words = Vec::new();
        words
            .try_reserve_exact(layout.total)
            .map_err(|_| SeError::no_memory("memory pool allocation failed"))?;
        words.resize(layout.total, 0);
        Ok(Self { words, layout, phase: PoolPhase::Idle })
    }

    pub(crate) fn layout(&self) -> &Layout {
        &self.layout
    }

    pub(crate) fn enter(&mut self, next: PoolPhase) {
        debug_assert!(
            matches!(
                (self.phase, next),
                (PoolPhase::Idle, PoolPhase::Encode | PoolPhase::PrimeLoop)
                    | (PoolPhase::Encode, PoolPhase::PrimeLoop)
                    | (_, PoolPhase::Idle)
            ),
            "illegal pool phase transition"
        );
        self.phase = next;
    }

    /// Unconditional return to idle, used on error exits so a failed call
    /// leaves the pool consistent.
    pub(crate) fn force_idle(&mut self) {
        self.phase = PoolPhase::Idle;
    }

    // Setup-time mutable access to the persistent tables.
    pub(crate) fn ifft_roots_mut(&mut self) -> &mut [u64] {
        &mut self.words[self.layout.ifft_roots.clone()]
    }

    pub(crate) fn index_map_mut(&mut self) -> &mut [u64] {
        &mut self.words[self.layout.index_map.clone()]
    }

    pub(crate) fn sk_mut(&mut self) -> &mut [u64] {
        &mut self.words[self.layout.sk.clone()]
    }

    pub(crate) fn sk_words(&self) -> &[u64] {
        &self.words[self.layout.sk.clone()]
    }

    pub(crate) fn encode_views(&mut self) -> EncodeViews<'_> {
        debug_assert_eq!(self.phase, PoolPhase::Encode, "encode views outside encode phase");
        let l = self.layout.clone();
        let (low, high) = self.words.split_at_mut(l.conj_vals.end);
        let base = l.conj_vals.end;
        EncodeViews {
            conj_vals: low,
            ifft_roots: &high[l.ifft_roots.start - base..l.ifft_roots.end - base],
            index_map: &high[l.index_map.start - base..l.index_map.end - base],
        }
    }

    pub(crate) fn init_views(&mut self) -> InitViews<'_> {
        debug_assert_eq!(self.phase, PoolPhase::PrimeLoop, "init views outside prime phase");
        let l = self.layout.clone();
        let (int_words, rest) = self.words.split_at_mut(l.conj_vals_int.end);
        let base = l.conj_vals_int.end;
        let (_, rest) = rest.split_at_mut(l.sk.start - base);
        let (sk, rest) = rest.split_at_mut(l.sk.len());
        let (_, rest) = rest.split_at_mut(l.u.start - l.sk.end);
        let (u, rest) = rest.split_at_mut(l.u.len());
        let (_, rest) = rest.split_at_mut(l.e1_small.start - l.u.end);
        let (e1_small, _) = rest.split_at_mut(l.e1_small.len());
        InitViews { int: IntSlice::new(int_words), u, e1_small, sk }
    }

    pub(crate) fn prime_views(&mut self) -> PrimeViews<'_> {
        debug_assert_eq!(self.phase, PoolPhase::PrimeLoop, "prime views outside prime phase");
        let l = self.layout.clone();
        let (int_words, rest) = self.words.split_at_mut(l.conj_vals_int.end);
        let (c0, rest) = rest.split_at_mut(l.c0.len());
        let (ntt_pte, rest) = rest.split_at_mut(l.ntt_pte.len());
        let (c1, rest) = rest.split_at_mut(l.c1.len());
        let rest = &mut rest[l.ifft_roots.len()..];
        let (ntt_tables, rest) = rest.split_at_mut(l.ntt_tables.len());
        let (sk, rest) = rest.split_at_mut(l.sk.len());
        let rest = &mut rest[l.index_map.len()..];
        let (pk0, rest) = rest.split_at_mut(l.pk0.len());
        let (pk1, rest) = rest.split_at_mut(l.pk1.len());
        let (u, rest) = rest.split_at_mut(l.u.len());
        let (e1_small, _rest) = rest.split_at_mut(l.e1_small.len());
        PrimeViews {
            conj_vals_int: int_words,
            c0,
            ntt_pte,
            c1,
            ntt_tables,
            sk,
            pk0,
            pk1,
            u,
            e1_small,
        }
    }
}

impl Drop for Pool {
    fn drop(&mut self) {
        self.words.zeroize();
    }
}


/// Signed 64-bit coefficient view over pool words (two's-complement bit
/// patterns in place).
pub(crate) struct IntSlice<'a> {
    words: &'a mut [u64],
}

#[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
impl<'a> IntSlice<'a> {
    pub(crate) fn new(words: &'a mut [u64]) -> Self {
        Self { words }
    }

    pub(crate) fn len(&self) -> usize {
        self.words.len()
    }

    #[inline]
    pub(crate) fn get(&self, i: usize) -> i64 {
        self.words[i] as i64
    }

    #[inline]
    pub(crate) fn set(&mut self, i: usize, v: i64) {
        self.words[i] = v as u64;
    }
}

/// Reads signed coefficient `k` from a shared word slice.
#[inline]
#[allow(clippy::cast_possible_wrap)]
pub(crate) fn int_at(words: &[u64], k: usize) -> i64 {
    words[k] as i64
}

/// Writes signed coefficient `k` into a word slice.
#[inline]
#[allow(clippy::cast_sign_loss)]
pub(crate) fn set_int(words: &mut [u64], k: usize, v: i64) {
    words[k] = v as u64;
}

/// Reads complex slot `i` (two words: re bits, im bits).
#[inline]
pub(crate) fn get_c64(words: &[u64], i: usize) -> (f64, f64) {
    (f64::from_bits(words[2 * i]), f64::from_bits(words[2 * i + 1]))
}

/// Writes complex slot `i`.
#[inline]
pub(crate) fn set_c64(words: &mut [u64], i: usize, re: f64, im: f64) {
    words[2 * i] = re.to_bits();
    words[2 * i + 1] = im.to_bits();
}

/// Reads 16-bit index-map entry `i` (four lanes per word).
#[inline]
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn map_get(words: &[u64], i: usize) -> usize {
    ((words[i / INDEX_LANES] >> (16 * (i % INDEX_LANES))) & 0xFFFF) as usize
}

/// Writes 16-bit index-map entry `i`.
#[inline]
pub(crate) fn map_set(words: &mut [u64], i: usize, v: u16) {
    let shift = 16 * (i % INDEX_LANES);
    let w = &mut words[i / INDEX_LANES];
    *w = (*w & !(0xFFFFu64 << shift)) | (u64::from(v) << shift);
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::EncryptorConfig;

    fn ranges(l: &Layout) -> Vec<(&'static str, Range<usize>)> {
        vec![
            ("ntt_pte", l.ntt_pte.clone()),
            ("c1", l.c1.clone()),
            ("ifft_roots", l.ifft_roots.clone()),
            ("ntt_tables", l.ntt_tables.clone()),
            ("sk", l.sk.clone()),
            ("index_map", l.index_map.clone()),
            ("pk0", l.pk0.clone()),
            ("pk1", l.pk1.clone()),
            ("u", l.u.clone()),
            ("e1_small", l.e1_small.clone()),
        ]
    }

    #[test]
    fn test_documented_aliases_and_disjointness() {
        let n = 4096;
        for scheme in [Scheme::Symmetric, Scheme::Asymmetric] {
            let cfg = EncryptorConfig::default();
            let l = Layout::compute(n, scheme, &cfg);
            // the two deliberate aliases
            assert_eq!(l.conj_vals_int, 0..n);
            assert_eq!(l.c0, n..2 * n);
            assert_eq!(l.conj_vals, 0..2 * n);
            // everything else is pairwise disjoint and past conj_vals
            let rs = ranges(&l);
            for (name, r) in &rs {
                assert!(r.start >= l.conj_vals.end || r.is_empty(), "{name} under conj_vals");
            }
            for i in 0..rs.len() {
                for j in i + 1..rs.len() {
                    let (na, a) = &rs[i];
                    let (nb, b) = &rs[j];
                    assert!(
                        a.end <= b.start || b.end <= a.start || a.is_empty() || b.is_empty(),
                        "{na} overlaps {nb}"
                    );
                }
            }
            assert!(l.total >= 4 * n);
        }
    }

    #[test]
    fn test_layout_sizes_track_configuration() {
        let n = 1024;
        let base = EncryptorConfig::default();
        let small = Layout::compute(n, Scheme::Symmetric, &base).total;
        // default: otf ifft + otf ntt + packed sk + persisted map
        assert_eq!(small, 4 * n + n / 32 + n / 4);

        let tables = EncryptorConfig {
            ifft: IfftVariant::LoadFull,
            ntt: NttVariant::Fast,
            ..EncryptorConfig::default()
        };
        assert_eq!(
            Layout::compute(n, Scheme::Symmetric, &tables).total,
            4 * n + 2 * n + 2 * n + n / 32 + n / 4
        );

        let expanded = EncryptorConfig { small_s: false, ..EncryptorConfig::default() };
        assert_eq!(
            Layout::compute(n, Scheme::Symmetric, &expanded).total,
            4 * n + n + n / 4
        );

        let asym = Layout::compute(n, Scheme::Asymmetric, &base).total;
        assert_eq!(asym, small + 2 * n + n / 32 + n / 8);

        assert_eq!(pool_size_words(n, Scheme::Symmetric, &base), small);
    }

    #[test]
    fn test_views_have_layout_lengths() {
        let n = 1024;
        let cfg = EncryptorConfig {
            ifft: IfftVariant::LoadFull,
            ntt: NttVariant::OneShot,
            ..EncryptorConfig::default()
        };
        let mut pool = Pool::new(Layout::compute(n, Scheme::Asymmetric, &cfg)).unwrap();
        pool.enter(PoolPhase::Encode);
        {
            let v = pool.encode_views();
            assert_eq!(v.conj_vals.len(), 2 * n);
            assert_eq!(v.ifft_roots.len(), 2 * n);
            assert_eq!(v.index_map.len(), n / 4);
        }
        pool.enter(PoolPhase::PrimeLoop);
        {
            let v = pool.init_views();
            assert_eq!(v.int.len(), n);
            assert_eq!(v.u.len(), n / 32);
            assert_eq!(v.e1_small.len(), n / 8);
            assert_eq!(v.sk.len(), n / 32);
        }
        {
            let v = pool.prime_views();
            assert_eq!(v.conj_vals_int.len(), n);
            assert_eq!(v.c0.len(), n);
            assert_eq!(v.ntt_pte.len(), n);
            assert_eq!(v.c1.len(), n);
            assert_eq!(v.ntt_tables.len(), n);
            assert_eq!(v.sk.len(), n / 32);
            assert_eq!(v.pk0.len(), n);
            assert_eq!(v.pk1.len(), n);
            assert_eq!(v.u.len(), n / 32);
            assert_eq!(v.e1_small.len(), n / 8);
        }
        pool.enter(PoolPhase::Idle);
    }

    #[test]
    fn test_lane_views_round_trip() {
        let mut words = vec![0u64; 8];
        set_c64(&mut words, 1, -1.5, 2.25);
        assert_eq!(get_c64(&words, 1), (-1.5, 2.25));
        set_int(&mut words, 0, -42);
        assert_eq!(int_at(&words, 0), -42);
        let mut view = IntSlice::new(&mut words);
        view.set(6, i64::MIN + 3);
        assert_eq!(view.get(6), i64::MIN + 3);
        let mut map = vec![0u64; 2];
        map_set(&mut map, 0, 7);
        map_set(&mut map, 5, 1023);
        map_set(&mut map, 0, 8); // overwrite
        assert_eq!(map_get(&map, 0), 8);
        assert_eq!(map_get(&map, 5), 1023);
        assert_eq!(map_get(&map, 1), 0);
    }
}
