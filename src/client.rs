use crate::arith::Modulus;
use crate::encoder;
use crate::encrypt::{asym_init, asym_prime, keygen_prime, sym_init, sym_prime};
use crate::error::{ensure, SeError};
use crate::keys::{sk_from_bytes, sk_to_bytes, PublicKey};
use crate::ntt;
use crate::params::{
    default_moduli, default_scale, EncryptorConfig, IfftVariant, IndexMapPolicy, NttVariant,
    Parms, Scheme, SkPolicy,
};
use crate::pool::{map_set, Layout, Pool, PoolPhase};
use crate::prng::{SePrng, SharedSeed, SEED_LEN};
use crate::sampling::{
    compress_expanded_ternary, expand_ternary_inpl, rereduce_expanded_ternary_inpl,
    sample_cbd_bytes, sample_ternary_expanded, sample_ternary_small,
};

const WORD_BYTES: usize = 8;


/// The encode–encrypt handle: parameters, configuration, the memory pool,
/// both PRNGs, and any attached key material. One handle owns one pool;
/// nothing is global, and additional handles are independent.
///
/// A single call to [`Self::encrypt`] or [`Self::encrypt_seeded`] runs the
/// whole pipeline to completion on the caller thread and streams the
/// ciphertext through the synchronous send callback: per prime (in the
/// configured traversal order) `c0` then `c1` as little-endian words. With
/// symmetric seed compression the 64-byte shareable seed goes out once
/// before the first prime and the per-prime `c1` components are omitted.
#[derive(Debug)]
pub struct Encryptor {
    parms: Parms,
    config: EncryptorConfig,
    pool: Pool,
    shareable: SePrng,
    private: SePrng,
    pk: Option<PublicKey>,
    sk_ready: bool,
    expanded_sk_idx: Option<usize>,
    imap_ready: bool,
    wire: Vec<u8>,
}

impl Encryptor {
    /// Builds a handle from an explicit prime chain and configuration.
    ///
    /// # Errors
    /// `InvalidConfig` for an unsupported degree, an inadmissible prime
    /// (2n ∤ p−1, composite, ≥ 2³¹, duplicated), a bad scale, or mutually
    /// exclusive feature selections; `NoMemory` when the pool cannot be
    /// allocated.
    pub fn setup_custom(
        degree: usize, moduli: &[u64], scale: f64, scheme: Scheme, config: EncryptorConfig,
    ) -> Result<Self, SeError> {
        let parms = Parms::new(degree, moduli, scale, scheme, &config)?;
        let mut pool = Pool::new(Layout::compute(degree, scheme, &config))?;
        if config.ifft == IfftVariant::LoadFull {
            encoder::load_ifft_roots(pool.ifft_roots_mut(), parms.logn);
        }
        if config.index_map == IndexMapPolicy::Persisted {
            encoder::load_index_map(pool.index_map_mut(), parms.logn);
        }
        let mut wire = Vec::new();
        wire.try_reserve_exact(degree * WORD_BYTES)
            .map_err(|_| SeError::no_memory("wire buffer allocation failed"))?;
        let zero = SharedSeed::from_bytes([0u8; SEED_LEN]);
        Ok(Self {
            parms,
            config,
            pool,
            shareable: SePrng::new_from_seed(&zero),
            private: SePrng::new_from_seed(&zero),
            pk: None,
            sk_ready: false,
            expanded_sk_idx: None,
            imap_ready: false,
            wire,
        })
    }

    /// Builds a handle over the default prime chain for the degree with the
    /// default configuration.
    ///
    /// # Errors
    /// As [`Self::setup_custom`]; additionally when `nprimes` exceeds the
    /// default chain for the degree.
    pub fn setup(
        degree: usize, nprimes: usize, scale: f64, scheme: Scheme,
    ) -> Result<Self, SeError> {
        let moduli = default_moduli(degree, nprimes)?;
        Self::setup_custom(degree, moduli, scale, scheme, EncryptorConfig::default())
    }

    /// Builds the default handle: degree 4096, three 30-bit primes, Δ = 2²⁵.
    ///
    /// # Errors
    /// As [`Self::setup`].
    pub fn setup_default(scheme: Scheme) -> Result<Self, SeError> {
        Self::setup(4096, 3, default_scale(4096), scheme)
    }

    /// Releases the handle; the pool (secret key included) is zeroized.
    pub fn cleanup(self) {}

    /// Polynomial degree n.
    #[must_use]
    pub fn degree(&self) -> usize {
        self.parms.degree
    }

    /// The scale Δ applied before rounding.
    #[must_use]
    pub fn scale(&self) -> f64 {
        self.parms.scale
    }

    /// The configured scheme.
    #[must_use]
    pub fn scheme(&self) -> Scheme {
        self.parms.scheme
    }

    /// The device prime chain in storage order.
    #[must_use]
    pub fn moduli(&self) -> &[Modulus] {
        &self.parms.moduli
    }

    /// Number of primes in the chain.
    #[must_use]
    pub fn nprimes(&self) -> usize {
        self.parms.nprimes()
    }

    /// Words in the memory pool for this degree/scheme/configuration.
    #[must_use]
    pub fn pool_size_words(&self) -> usize {
        self.pool.layout().total
    }

    /// The seed currently loaded into the shareable PRNG. After a symmetric
    /// call this identifies the `c1` components the call produced.
    #[must_use]
    pub fn shareable_seed(&self) -> SharedSeed {
        self.shareable.seed()
    }

    /// The attached public key, if any.
    #[must_use]
    pub fn public_key(&self) -> Option<&PublicKey> {
        self.pk.as_ref()
    }

    /// Whether the attached public key arrived from outside the device
    /// (as opposed to being generated on it).
    #[must_use]
    pub fn pk_from_file(&self) -> bool {
        self.parms.pk_from_file
    }

    /// Installs a secret key from its packed wire form (n/4 bytes, 2-bit
    /// ternary codes, little-endian words). Disables on-device sampling.
    ///
    /// # Errors
    /// `InvalidArgument` on length mismatch or an illegal code.
    pub fn load_secret_key(&mut self, bytes: &[u8]) -> Result<(), SeError> {
        let degree = self.parms.degree;
        if self.parms.small_s {
            sk_from_bytes(bytes, degree, self.pool.sk_mut())?;
        } else {
            let mut small = vec![0u64; degree / 32];
            sk_from_bytes(bytes, degree, &mut small)?;
            let idx = self.parms.initial_idx();
            expand_ternary_inpl(&small, self.pool.sk_mut(), &self.parms.moduli[idx]);
            self.expanded_sk_idx = Some(idx);
        }
        self.parms.sample_s = false;
        self.sk_ready = true;
        Ok(())
    }

    /// Exports the current secret key in its packed wire form.
    ///
    /// # Errors
    /// `InvalidArgument` when no secret key has been loaded or sampled yet.
    pub fn export_secret_key(&self) -> Result<Vec<u8>, SeError> {
        ensure!(self.sk_ready, SeError::invalid_arg("no secret key present"));
        if self.parms.small_s {
            Ok(sk_to_bytes(self.pool.sk_words()))
        } else {
            let idx = self
                .expanded_sk_idx
                .ok_or_else(|| SeError::invariant("expanded secret key lost its prime"))?;
            let mut small = vec![0u64; self.parms.degree / 32];
            compress_expanded_ternary(self.pool.sk_words(), &mut small, &self.parms.moduli[idx]);
            Ok(sk_to_bytes(&small))
        }
    }

    /// Installs a public key from its wire form, validated against this
    /// handle's parameter set.
    ///
    /// # Errors
    /// `InvalidConfig` on a symmetric handle; `InvalidArgument` on malformed
    /// bytes.
    pub fn load_public_key(&mut self, bytes: &[u8]) -> Result<(), SeError> {
        ensure!(
            self.parms.scheme == Scheme::Asymmetric,
            SeError::invalid_config("public keys apply to the asymmetric scheme")
        );
        let pk = PublicKey::try_from_bytes(bytes, self.parms.degree, &self.parms.moduli)?;
        self.pk = Some(pk);
        self.parms.pk_from_file = true;
        Ok(())
    }

    /// Attaches an already-deserialized public key.
    ///
    /// # Errors
    /// `InvalidConfig` on a symmetric handle; `InvalidArgument` when the key
    /// does not match this parameter set.
    pub fn attach_public_key(&mut self, pk: PublicKey) -> Result<(), SeError> {
        ensure!(
            self.parms.scheme == Scheme::Asymmetric,
            SeError::invalid_config("public keys apply to the asymmetric scheme")
        );
        ensure!(
            pk.degree() == self.parms.degree && pk.nprimes() == self.parms.nprimes(),
            SeError::invalid_arg("public key does not match the parameter set")
        );
        self.pk = Some(pk);
        self.parms.pk_from_file = true;
        Ok(())
    }

    /// Supplies the slot-permutation table (n little-endian u16 entries)
    /// when the index-map policy is `Loaded`. The table must be a
    /// permutation of 0..n.
    ///
    /// # Errors
    /// `InvalidConfig` under any other index-map policy; `InvalidArgument`
    /// on malformed bytes.
    pub fn load_index_map(&mut self, bytes: &[u8]) -> Result<(), SeError> {
        ensure!(
            self.config.index_map == IndexMapPolicy::Loaded,
            SeError::invalid_config("index map loading requires the Loaded policy")
        );
        let n = self.parms.degree;
        ensure!(
            bytes.len() == 2 * n,
            SeError::invalid_arg("index map byte length does not match the degree")
        );
        let mut seen = vec![false; n];
        let words = self.pool.index_map_mut();
        for i in 0..n {
            let v = usize::from(u16::from_le_bytes([bytes[2 * i], bytes[2 * i + 1]]));
            if v >= n || seen[v] {
                return Err(SeError::invalid_arg("index map is not a permutation of 0..n"));
            }
            seen[v] = true;
            #[allow(clippy::cast_possible_truncation)]
            map_set(words, i, v as u16);
        }
        self.imap_ready = true;
        Ok(())
    }

    /// Generates a device key pair for the asymmetric scheme, seeding the
    /// key-generation randomness from the platform entropy source. The
    /// secret key stays in the pool; the public key is attached to the
    /// handle and readable via [`Self::public_key`].
    ///
    /// # Errors
    /// `InvalidConfig` on a symmetric handle; `EntropyUnavailable` when the
    /// platform entropy call fails; `NoMemory` when the key buffer cannot be
    /// allocated.
    #[cfg(feature = "default-rng")]
    pub fn try_gen_public_key(&mut self) -> Result<(), SeError> {
        ensure!(
            self.parms.scheme == Scheme::Asymmetric,
            SeError::invalid_config("key generation applies to the asymmetric scheme")
        );
        self.private.reset(None)?;
        let r = self.gen_pk_inner();
        if r.is_err() {
            self.pool.force_idle();
        }
        r
    }

    /// Generates a device key pair deterministically from the given seed
    /// (test vectors, reproducible provisioning).
    ///
    /// # Errors
    /// As [`Self::try_gen_public_key`], minus the entropy failure.
    pub fn gen_public_key_from_seed(&mut self, seed: &SharedSeed) -> Result<(), SeError> {
        ensure!(
            self.parms.scheme == Scheme::Asymmetric,
            SeError::invalid_config("key generation applies to the asymmetric scheme")
        );
        self.private.reset(Some(seed))?;
        let r = self.gen_pk_inner();
        if r.is_err() {
            self.pool.force_idle();
        }
        r
    }

    fn gen_pk_inner(&mut self) -> Result<(), SeError> {
        let n = self.parms.degree;
        let k = self.parms.nprimes();
        self.parms.reset_primes();
        self.ensure_secret_key()?;

        let mut data = Vec::new();
        data.try_reserve_exact(2 * n * k)
            .map_err(|_| SeError::no_memory("public key buffer allocation failed"))?;
        data.resize(2 * n * k, 0);

        self.pool.enter(PoolPhase::PrimeLoop);
        {
            let iv = self.pool.init_views();
            sample_cbd_bytes(&mut self.private, iv.e1_small)?;
        }
        loop {
            let idx = self.parms.curr_modulus_idx;
            let modulus = *self.parms.curr_modulus();
            let psi = self.parms.curr_psi();
            let mut v = self.pool.prime_views();
            load_ntt_tables(self.config.ntt, v.ntt_tables, &modulus, psi, self.parms.logn);
            rereduce_sk(
                self.parms.small_s,
                &mut self.expanded_sk_idx,
                &self.parms.moduli,
                v.sk,
                idx,
                &modulus,
            );
            keygen_prime(
                &mut v,
                &modulus,
                psi,
                self.parms.logn,
                self.config.ntt,
                &mut self.private,
                self.parms.small_s,
            )?;
            data[idx * 2 * n..idx * 2 * n + n].copy_from_slice(v.c0);
            data[idx * 2 * n + n..(idx + 1) * 2 * n].copy_from_slice(v.c1);
            if !self.parms.next_modulus() {
                break;
            }
        }
        self.pool.enter(PoolPhase::Idle);
        self.parms.reset_primes();
        self.pk = Some(PublicKey::from_parts(n, k, data));
        self.parms.pk_from_file = false;
        Ok(())
    }

    /// Encrypts a slot vector, drawing fresh seeds from the platform entropy
    /// source. See [`Self::encrypt_seeded`] for the emission contract.
    ///
    /// # Errors
    /// As [`Self::encrypt_seeded`], plus `EntropyUnavailable` when seeding
    /// fails.
    #[cfg(feature = "default-rng")]
    pub fn encrypt(
        &mut self, values: &[f32], send: impl FnMut(&[u8]) -> usize,
    ) -> Result<(), SeError> {
        self.encrypt_seeded(None, None, values, send)
    }

    /// Encrypts up to n/2 real slots, streaming ciphertext components
    /// through `send` (which must accept every byte offered to it). `None`
    /// seeds are drawn from the platform entropy source; fixed seeds make
    /// the call fully deterministic given fixed key material.
    ///
    /// Per prime, in the configured traversal order: `c0` then `c1`, each n
    /// little-endian words. With symmetric seed compression the 64-byte
    /// shareable seed is sent once before the first prime and the per-prime
    /// `c1` components are omitted. A failed call emits no further bytes and
    /// leaves the pool consistent; the sink owner must discard partial
    /// output.
    ///
    /// # Errors
    /// `InvalidArgument` (oversized or non-finite slot vector, shareable
    /// seed on an asymmetric handle), `InvalidConfig` (missing public key or
    /// index map), `EncodeOverflow` (recoverable; retry with a smaller scale
    /// or message), `EntropyUnavailable`, `SinkShortWrite`.
    pub fn encrypt_seeded(
        &mut self, shareable_seed: Option<&SharedSeed>, private_seed: Option<&SharedSeed>,
        values: &[f32], mut send: impl FnMut(&[u8]) -> usize,
    ) -> Result<(), SeError> {
        let r = self.encrypt_inner(shareable_seed, private_seed, values, &mut send);
        if r.is_err() {
            self.pool.force_idle();
        }
        r
    }

    fn encrypt_inner(
        &mut self, shareable_seed: Option<&SharedSeed>, private_seed: Option<&SharedSeed>,
        values: &[f32], send: &mut dyn FnMut(&[u8]) -> usize,
    ) -> Result<(), SeError> {
        let n = self.parms.degree;
        let logn = self.parms.logn;
        ensure!(
            values.len() <= n / 2,
            SeError::invalid_arg("slot vector longer than half the degree")
        );
        if self.config.index_map == IndexMapPolicy::Loaded {
            ensure!(self.imap_ready, SeError::invalid_config("index map not loaded"));
        }
        match self.parms.scheme {
            Scheme::Symmetric => {
                self.shareable.reset(shareable_seed)?;
                self.private.reset(private_seed)?;
            }
            Scheme::Asymmetric => {
                ensure!(
                    shareable_seed.is_none(),
                    SeError::invalid_arg("shareable seed applies to symmetric encryption only")
                );
                ensure!(
                    self.pk.is_some(),
                    SeError::invalid_config("no public key attached or generated")
                );
                self.private.reset(private_seed)?;
            }
        }

        self.parms.reset_primes();
        if self.parms.scheme == Scheme::Symmetric {
            self.ensure_secret_key()?;
        }

        self.pool.enter(PoolPhase::Encode);
        {
            // scaled coefficients must survive reduction by the narrowest prime
            #[allow(clippy::cast_precision_loss)]
            let coeff_bound =
                self.parms.moduli.iter().map(Modulus::value).min().unwrap_or(2) as f64 / 2.0;
            let ev = self.pool.encode_views();
            encoder::encode_base(
                values,
                self.parms.scale,
                coeff_bound,
                logn,
                ev.conj_vals,
                self.config.ifft,
                ev.ifft_roots,
                self.config.index_map,
                ev.index_map,
            )?;
        }

        self.pool.enter(PoolPhase::PrimeLoop);
        let mut expanded_u_idx = self.parms.curr_modulus_idx;
        {
            let mut iv = self.pool.init_views();
            match self.parms.scheme {
                Scheme::Symmetric => sym_init(&mut self.private, &mut iv.int)?,
                Scheme::Asymmetric => {
                    let modulus = *self.parms.curr_modulus();
                    asym_init(
                        &mut self.private,
                        &mut iv.int,
                        iv.u,
                        iv.e1_small,
                        self.parms.small_u,
                        &modulus,
                    )?;
                }
            }
        }

        let compressed = self.parms.scheme == Scheme::Symmetric && self.config.seed_compression;
        if compressed {
            let seed = self.shareable.seed();
            ensure!(
                send(seed.as_bytes()) == SEED_LEN,
                SeError::sink_short("send callback accepted fewer bytes than requested")
            );
        }

        loop {
            let idx = self.parms.curr_modulus_idx;
            let modulus = *self.parms.curr_modulus();
            let psi = self.parms.curr_psi();
            let mut v = self.pool.prime_views();
            load_ntt_tables(self.config.ntt, v.ntt_tables, &modulus, psi, logn);
            match self.parms.scheme {
                Scheme::Symmetric => {
                    rereduce_sk(
                        self.parms.small_s,
                        &mut self.expanded_sk_idx,
                        &self.parms.moduli,
                        v.sk,
                        idx,
                        &modulus,
                    );
                    sym_prime(
                        &mut v,
                        &modulus,
                        psi,
                        logn,
                        self.config.ntt,
                        &mut self.shareable,
                        self.parms.small_s,
                    )?;
                }
                Scheme::Asymmetric => {
                    if !self.parms.small_u && expanded_u_idx != idx {
                        rereduce_expanded_ternary_inpl(
                            v.u,
                            &self.parms.moduli[expanded_u_idx],
                            &modulus,
                        );
                        expanded_u_idx = idx;
                    }
                    let Some(pk) = self.pk.as_ref() else {
                        return Err(SeError::invariant("public key vanished mid-call"));
                    };
                    let (pk0, pk1) = pk.prime_pair(idx);
                    v.pk0.copy_from_slice(pk0);
                    v.pk1.copy_from_slice(pk1);
                    asym_prime(&mut v, &modulus, psi, logn, self.config.ntt, self.parms.small_u);
                }
            }
            emit_words(send, &mut self.wire, v.c0, modulus.value())?;
            if !compressed {
                emit_words(send, &mut self.wire, v.c1, modulus.value())?;
            }
            if !self.parms.next_modulus() {
                break;
            }
        }
        self.parms.reset_primes();
        self.pool.enter(PoolPhase::Idle);
        Ok(())
    }

    // Samples the secret key when the handle owns that step: skipped
    // entirely once a key has been loaded; resampled per call under the
    // Fresh policy.
    fn ensure_secret_key(&mut self) -> Result<(), SeError> {
        if !self.parms.sample_s {
            return Ok(());
        }
        if self.sk_ready && self.config.secret_key == SkPolicy::Persistent {
            return Ok(());
        }
        if self.parms.small_s {
            sample_ternary_small(&mut self.private, self.pool.sk_mut())?;
        } else {
            let idx = self.parms.initial_idx();
            let modulus = self.parms.moduli[idx];
            sample_ternary_expanded(&mut self.private, self.pool.sk_mut(), &modulus)?;
            self.expanded_sk_idx = Some(idx);
        }
        self.sk_ready = true;
        Ok(())
    }

}

// Moves an expanded-form secret key to the current prime's residue
// representation when the chain advances. A free function so it can run
// while the pool views are live.
fn rereduce_sk(
    small_s: bool, expanded_sk_idx: &mut Option<usize>, moduli: &[Modulus], sk: &mut [u64],
    idx: usize, modulus: &Modulus,
) {
    if small_s {
        return;
    }
    if let Some(old) = *expanded_sk_idx {
        if old != idx {
            rereduce_expanded_ternary_inpl(sk, &moduli[old], modulus);
            *expanded_sk_idx = Some(idx);
        }
    }
}

// Rebuilds the per-prime NTT tables into their extent.
fn load_ntt_tables(variant: NttVariant, tables: &mut [u64], modulus: &Modulus, psi: u64, logn: u32) {
    match variant {
        NttVariant::Otf => {}
        NttVariant::OneShot => ntt::load_root_table(tables, psi, modulus, logn),
        NttVariant::Fast => {
            let n = 1usize << logn;
            let (roots, quots) = tables.split_at_mut(n);
            ntt::load_fast_tables(roots, quots, psi, modulus, logn);
        }
    }
}

// Serializes residues as little-endian words and pushes them through the
// sink, converting the residue-bound invariant into an error in release
// builds (debug builds assert).
fn emit_words(
    send: &mut dyn FnMut(&[u8]) -> usize, wire: &mut Vec<u8>, words: &[u64], q: u64,
) -> Result<(), SeError> {
    wire.clear();
    for &w in words {
        debug_assert!(w < q, "ciphertext residue at or above modulus");
        ensure!(w < q, SeError::invariant("ciphertext residue at or above modulus"));
        wire.extend_from_slice(&w.to_le_bytes());
    }
    ensure!(
        send(wire) == wire.len(),
        SeError::sink_short("send callback accepted fewer bytes than requested")
    );
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::prng::SharedSeed;

    fn seed(tag: u8) -> SharedSeed {
        SharedSeed::from_bytes([tag; SEED_LEN])
    }

    #[test]
    fn test_setup_shapes() {
        let enc = Encryptor::setup_default(Scheme::Symmetric).unwrap();
        assert_eq!(enc.degree(), 4096);
        assert_eq!(enc.nprimes(), 3);
        assert_eq!(enc.scale(), 33_554_432.0);
        assert_eq!(enc.scheme(), Scheme::Symmetric);
        assert_eq!(enc.moduli().len(), 3);
        assert!(enc.pool_size_words() >= 4 * 4096);
        enc.cleanup();
    }

    #[test]
    fn test_symmetric_emission_shape() {
        let mut enc = Encryptor::setup(1024, 1, 1_048_576.0, Scheme::Symmetric).unwrap();
        let mut bytes = 0usize;
        let mut chunks = 0usize;
        enc.encrypt_seeded(Some(&seed(1)), Some(&seed(2)), &[1.0, -1.0], |buf| {
            bytes += buf.len();
            chunks += 1;
            buf.len()
        })
        .unwrap();
        // one prime: c0 and c1, n words each
        assert_eq!(chunks, 2);
        assert_eq!(bytes, 2 * 1024 * 8);
    }

    #[test]
    fn test_seed_compression_emission_shape() {
        let config = EncryptorConfig { seed_compression: true, ..EncryptorConfig::default() };
        let moduli = [134_215_681u64];
        let mut enc =
            Encryptor::setup_custom(1024, &moduli, 1_048_576.0, Scheme::Symmetric, config)
                .unwrap();
        let mut sizes = Vec::new();
        enc.encrypt_seeded(Some(&seed(3)), Some(&seed(4)), &[0.5], |buf| {
            sizes.push(buf.len());
            buf.len()
        })
        .unwrap();
        assert_eq!(sizes, vec![64, 1024 * 8]);
    }

    #[test]
    fn test_short_write_aborts() {
        let mut enc = Encryptor::setup(1024, 1, 1_048_576.0, Scheme::Symmetric).unwrap();
        let mut calls = 0usize;
        let err = enc
            .encrypt_seeded(Some(&seed(5)), Some(&seed(6)), &[1.0], |buf| {
                calls += 1;
                buf.len() - 1
            })
            .unwrap_err();
        assert_eq!(err.kind(), crate::SeErrorKind::SinkShortWrite);
        assert_eq!(calls, 1); // nothing after the failed component
        // the handle stays usable
        enc.encrypt_seeded(Some(&seed(5)), Some(&seed(6)), &[1.0], |buf| buf.len()).unwrap();
    }

    #[test]
    fn test_secret_key_round_trip_and_determinism() {
        let mut enc = Encryptor::setup(1024, 1, 1_048_576.0, Scheme::Symmetric).unwrap();
        let mut sk = vec![0u8; 1024 / 4];
        // a fixed mixed-code pattern
        for (i, b) in sk.iter_mut().enumerate() {
            *b = match i % 3 {
                0 => 0b00_01_00_10,
                1 => 0b10_00_01_00,
                _ => 0,
            };
        }
        enc.load_secret_key(&sk).unwrap();
        assert_eq!(enc.export_secret_key().unwrap(), sk);

        let run = |enc: &mut Encryptor| {
            let mut out = Vec::new();
            enc.encrypt_seeded(Some(&seed(7)), Some(&seed(8)), &[2.5, -0.5], |buf| {
                out.extend_from_slice(buf);
                buf.len()
            })
            .unwrap();
            out
        };
        let a = run(&mut enc);
        let b = run(&mut enc);
        assert_eq!(a, b, "same seeds and key must give byte-exact ciphertext");
    }

    #[test]
    fn test_argument_validation() {
        let mut enc = Encryptor::setup(1024, 1, 1_048_576.0, Scheme::Symmetric).unwrap();
        let too_long = vec![0.0f32; 513];
        let err = enc
            .encrypt_seeded(Some(&seed(1)), Some(&seed(2)), &too_long, |b| b.len())
            .unwrap_err();
        assert_eq!(err.kind(), crate::SeErrorKind::InvalidArgument);

        let mut asym = Encryptor::setup(1024, 1, 1_048_576.0, Scheme::Asymmetric).unwrap();
        // no public key yet
        let err = asym.encrypt_seeded(None, Some(&seed(2)), &[1.0], |b| b.len()).unwrap_err();
        assert_eq!(err.kind(), crate::SeErrorKind::InvalidConfig);
        // shareable seed rejected for the asymmetric scheme
        asym.gen_public_key_from_seed(&seed(9)).unwrap();
        let err =
            asym.encrypt_seeded(Some(&seed(1)), Some(&seed(2)), &[1.0], |b| b.len()).unwrap_err();
        assert_eq!(err.kind(), crate::SeErrorKind::InvalidArgument);
    }

    #[test]
    fn test_generated_public_key_export_import() {
        let mut asym = Encryptor::setup(1024, 1, 1_048_576.0, Scheme::Asymmetric).unwrap();
        asym.gen_public_key_from_seed(&seed(11)).unwrap();
        assert!(!asym.pk_from_file());
        let pk_bytes = asym.public_key().unwrap().to_bytes();
        assert_eq!(pk_bytes.len(), 2 * 1024 * 8);

        let mut other = Encryptor::setup(1024, 1, 1_048_576.0, Scheme::Asymmetric).unwrap();
        other.load_public_key(&pk_bytes).unwrap();
        assert!(other.pk_from_file());
        other.encrypt_seeded(None, Some(&seed(12)), &[1.0, 2.0], |b| b.len()).unwrap();
    }
}
