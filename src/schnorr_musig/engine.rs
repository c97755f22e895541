//! The stateful signing engine: the single place where secret scalar
//! arithmetic happens and where nonce single-use is enforced.
//!
//! Signing twice with the same nonce leaks the private scalar, so a
//! multi-sig signing call *consumes* the outstanding nonce pair on every
//! exit path, success or error. Consumption is structural: a [`NonceSlot`]
//! guard erases the pair and marks the supplied commitments as used when it
//! drops, not by convention at each return site.

use std::collections::{HashMap, HashSet};

use alloy_primitives::B256;

use crate::errors::SchnorrError;
use crate::keys_management::{PrivateKey, PublicKey};
use crate::rand_nonce::{NoncePair, PublicNonces};
use crate::schnorr_musig::musig_math::{
    combined_public_key, hash_message, partial_sign, single_sign, sum_sigs, verify_hash,
};
use crate::signature::SignatureOutput;

/// Per-identity Schnorr engine.
///
/// Owns its nonce map and used-nonce set exclusively; independent engines
/// never cross-contaminate. Consuming operations take `&mut self`, so the
/// check-then-erase sequence cannot race within one engine without the
/// caller reaching for external sharing primitives.
#[derive(Debug, Default)]
pub struct SchnorrEngine {
    /// Outstanding nonce pairs, keyed by `keccak256(private key)`.
    nonces: HashMap<B256, NoncePair>,
    /// Consumed commitments, `(key hash, public commitment)`. Tracking by
    /// commitment rather than by key alone lets a key sign again with a
    /// freshly generated pair without resetting the engine.
    used_nonces: HashSet<(B256, PublicKey)>,
}

impl SchnorrEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn is_nonce_used(&self, key_hash: B256, commitment: &PublicKey) -> bool {
        self.used_nonces.contains(&(key_hash, *commitment))
    }

    fn store_nonce_pair(
        &mut self,
        private_key: &PrivateKey,
        pair: NoncePair,
    ) -> Result<PublicNonces, SchnorrError> {
        let key_hash = private_key.key_hash();
        if self.is_nonce_used(key_hash, &pair.k_public)
            || self.is_nonce_used(key_hash, &pair.k_two_public)
        {
            return Err(SchnorrError::NonceReused);
        }
        let public_nonces = pair.public_nonces();
        self.nonces.insert(key_hash, pair);
        Ok(public_nonces)
    }

    /// Creates and stores a fresh nonce pair, returning the public half for
    /// exchange with the other participants.
    #[tracing::instrument(name = "Generating public nonces", skip_all)]
    pub fn generate_public_nonces(
        &mut self,
        private_key: &PrivateKey,
    ) -> Result<PublicNonces, SchnorrError> {
        self.store_nonce_pair(private_key, NoncePair::generate())
    }

    /// Stores a nonce pair rebuilt from previously saved scalars. Recovery
    /// path for a ceremony interrupted after the nonce exchange; the reuse
    /// check still applies to the rebuilt commitments.
    #[tracing::instrument(name = "Restoring public nonces", skip_all)]
    pub fn restore_public_nonces(
        &mut self,
        private_key: &PrivateKey,
        k: &[u8],
        k_two: &[u8],
    ) -> Result<PublicNonces, SchnorrError> {
        self.store_nonce_pair(private_key, NoncePair::restore(k, k_two)?)
    }

    pub fn has_nonce(&self, private_key: &PrivateKey) -> bool {
        self.nonces.contains_key(&private_key.key_hash())
    }

    /// The outstanding public nonces for this key, if any.
    pub fn public_nonces(&self, private_key: &PrivateKey) -> Result<PublicNonces, SchnorrError> {
        self.nonces
            .get(&private_key.key_hash())
            .map(NoncePair::public_nonces)
            .ok_or(SchnorrError::NoncesNotExchanged)
    }

    /// Drops all used-nonce bookkeeping.
    ///
    /// Unsafe escape hatch for tests that deliberately replay nonce
    /// material. Never call this in production: it re-arms commitments that
    /// already produced a signature.
    pub fn unsafe_reset_used_nonces(&mut self) {
        self.used_nonces.clear();
    }

    /// Produces this signer's partial signature for one ceremony.
    ///
    /// Requires at least two public keys and that this signer's outstanding
    /// commitments appear in `public_nonces`. Whatever the outcome, the
    /// outstanding pair is erased and every supplied commitment is marked
    /// used before this returns.
    #[tracing::instrument(name = "Computing multi-sig partial signature", skip_all)]
    pub fn multi_sig_sign_hash(
        &mut self,
        private_key: &PrivateKey,
        msg_hash: B256,
        public_keys: &[PublicKey],
        public_nonces: &[PublicNonces],
    ) -> Result<SignatureOutput, SchnorrError> {
        let combined = combined_public_key(public_keys)?;
        let key_hash = private_key.key_hash();

        for nonces in public_nonces {
            if self.is_nonce_used(key_hash, &nonces.k_public)
                || self.is_nonce_used(key_hash, &nonces.k_two_public)
            {
                return Err(SchnorrError::NonceReused);
            }
        }

        let mut slot = NonceSlot::acquire(self, key_hash, public_nonces);
        let pair = slot.take_outstanding()?;
        partial_sign(
            &pair,
            &combined,
            private_key,
            msg_hash,
            public_keys,
            public_nonces,
        )
    }

    /// [`Self::multi_sig_sign_hash`] over the default message digest.
    pub fn multi_sig_sign_message(
        &mut self,
        private_key: &PrivateKey,
        message: &str,
        public_keys: &[PublicKey],
        public_nonces: &[PublicNonces],
    ) -> Result<SignatureOutput, SchnorrError> {
        self.multi_sig_sign_message_with(private_key, message, public_keys, public_nonces, hash_message)
    }

    /// [`Self::multi_sig_sign_hash`] with a caller-supplied message digest.
    pub fn multi_sig_sign_message_with<F>(
        &mut self,
        private_key: &PrivateKey,
        message: &str,
        public_keys: &[PublicKey],
        public_nonces: &[PublicNonces],
        hash_fn: F,
    ) -> Result<SignatureOutput, SchnorrError>
    where
        F: Fn(&str) -> B256,
    {
        self.multi_sig_sign_hash(private_key, hash_fn(message), public_keys, public_nonces)
    }

    /// Single-signer Schnorr signature over an already-hashed message.
    /// Stateless: a fresh random nonce is drawn per call.
    #[tracing::instrument(name = "Signing hash with single-signer Schnorr", skip_all)]
    pub fn sign_hash(
        private_key: &PrivateKey,
        msg_hash: B256,
    ) -> Result<SignatureOutput, SchnorrError> {
        single_sign(private_key, msg_hash)
    }

    /// Single-signer signature over the default message digest.
    pub fn sign_message(
        private_key: &PrivateKey,
        message: &str,
    ) -> Result<SignatureOutput, SchnorrError> {
        Self::sign_message_with(private_key, message, hash_message)
    }

    /// Single-signer signature with a caller-supplied message digest.
    pub fn sign_message_with<F>(
        private_key: &PrivateKey,
        message: &str,
        hash_fn: F,
    ) -> Result<SignatureOutput, SchnorrError>
    where
        F: Fn(&str) -> B256,
    {
        single_sign(private_key, hash_fn(message))
    }

    /// `sum(s_i) mod n` across partial signatures of one ceremony.
    pub fn sum_sigs(signatures: &[B256]) -> Result<B256, SchnorrError> {
        sum_sigs(signatures)
    }

    /// Checks `s * G == R + e * P`.
    #[tracing::instrument(name = "Verifying Schnorr signature", skip_all)]
    pub fn verify_hash(
        signature: B256,
        msg_hash: B256,
        r: &PublicKey,
        public_key: &PublicKey,
    ) -> bool {
        verify_hash(signature, msg_hash, r, public_key)
    }

    /// [`Self::verify_hash`] over the default message digest.
    pub fn verify_message(
        signature: B256,
        message: &str,
        r: &PublicKey,
        public_key: &PublicKey,
    ) -> bool {
        verify_hash(signature, hash_message(message), r, public_key)
    }

    /// [`Self::verify_hash`] with a caller-supplied message digest.
    pub fn verify_message_with<F>(
        signature: B256,
        message: &str,
        r: &PublicKey,
        public_key: &PublicKey,
        hash_fn: F,
    ) -> bool
    where
        F: Fn(&str) -> B256,
    {
        verify_hash(signature, hash_fn(message), r, public_key)
    }
}

/// Scoped acquisition of one key's nonce slot.
///
/// Dropping the slot erases the outstanding pair and marks every supplied
/// commitment as used, so a signing attempt can never leave its nonce
/// available for a second use, whichever way it exits.
struct NonceSlot<'a> {
    engine: &'a mut SchnorrEngine,
    key_hash: B256,
    commitments: Vec<PublicKey>,
}

impl<'a> NonceSlot<'a> {
    fn acquire(
        engine: &'a mut SchnorrEngine,
        key_hash: B256,
        public_nonces: &[PublicNonces],
    ) -> Self {
        let commitments = public_nonces
            .iter()
            .flat_map(|nonces| [nonces.k_public, nonces.k_two_public])
            .collect();
        NonceSlot {
            engine,
            key_hash,
            commitments,
        }
    }

    fn take_outstanding(&mut self) -> Result<NoncePair, SchnorrError> {
        self.engine
            .nonces
            .get(&self.key_hash)
            .cloned()
            .ok_or(SchnorrError::NoncesNotExchanged)
    }
}

impl Drop for NonceSlot<'_> {
    fn drop(&mut self) {
        self.engine.nonces.remove(&self.key_hash);
        for commitment in self.commitments.drain(..) {
            self.engine.used_nonces.insert((self.key_hash, commitment));
        }
    }
}
