use alloy_primitives::{Address, B256};

use crate::errors::SchnorrError;
use crate::keys_management::{KeyPair, PrivateKey, PublicKey};
use crate::rand_nonce::PublicNonces;
use crate::schnorr_musig::engine::SchnorrEngine;
use crate::signature::SignatureOutput;

/// One signing identity: a key pair bound to its own [`SchnorrEngine`].
///
/// Thin pass-through layer; all nonce lifecycle enforcement stays in the
/// engine, scoped to this signer's private key.
pub struct SchnorrSigner {
    key_pair: KeyPair,
    engine: SchnorrEngine,
    address: Address,
}

impl std::fmt::Debug for SchnorrSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "SchnorrSigner {{ address: {} }}", self.address)
    }
}

impl SchnorrSigner {
    /// Validates the scalar against the curve order and derives the
    /// signer's Ethereum address from the uncompressed public key.
    pub fn new(private_key_bytes: &[u8]) -> Result<Self, SchnorrError> {
        let private_key = PrivateKey::from_bytes(private_key_bytes)?;
        Ok(Self::from_private_key(private_key))
    }

    pub fn from_hex(private_key_hex: &str) -> Result<Self, SchnorrError> {
        Ok(Self::from_private_key(PrivateKey::from_hex(
            private_key_hex,
        )?))
    }

    pub fn from_private_key(private_key: PrivateKey) -> Self {
        let key_pair = KeyPair::from_private_key(private_key);
        let address = key_pair.public_key.eth_address();
        SchnorrSigner {
            key_pair,
            engine: SchnorrEngine::new(),
            address,
        }
    }

    pub fn generate() -> Self {
        Self::from_private_key(PrivateKey::generate())
    }

    /// Ethereum-style address of this signer.
    pub fn address(&self) -> Address {
        self.address
    }

    pub fn public_key(&self) -> PublicKey {
        self.key_pair.public_key
    }

    /// The single-key account address the verifier contract registers for
    /// this signer alone (low 20 bytes of the x coordinate).
    pub fn schnorr_address(&self) -> Address {
        self.key_pair.public_key.schnorr_address()
    }

    pub fn generate_pub_nonces(&mut self) -> Result<PublicNonces, SchnorrError> {
        self.engine
            .generate_public_nonces(&self.key_pair.private_key)
    }

    pub fn restore_pub_nonces(
        &mut self,
        k: &[u8],
        k_two: &[u8],
    ) -> Result<PublicNonces, SchnorrError> {
        self.engine
            .restore_public_nonces(&self.key_pair.private_key, k, k_two)
    }

    pub fn pub_nonces(&self) -> Result<PublicNonces, SchnorrError> {
        self.engine.public_nonces(&self.key_pair.private_key)
    }

    pub fn has_nonces(&self) -> bool {
        self.engine.has_nonce(&self.key_pair.private_key)
    }

    pub fn sign_multi_sig_hash(
        &mut self,
        msg_hash: B256,
        public_keys: &[PublicKey],
        public_nonces: &[PublicNonces],
    ) -> Result<SignatureOutput, SchnorrError> {
        self.engine.multi_sig_sign_hash(
            &self.key_pair.private_key,
            msg_hash,
            public_keys,
            public_nonces,
        )
    }

    pub fn sign_multi_sig_message(
        &mut self,
        message: &str,
        public_keys: &[PublicKey],
        public_nonces: &[PublicNonces],
    ) -> Result<SignatureOutput, SchnorrError> {
        self.engine.multi_sig_sign_message(
            &self.key_pair.private_key,
            message,
            public_keys,
            public_nonces,
        )
    }

    pub fn sign_hash(&self, msg_hash: B256) -> Result<SignatureOutput, SchnorrError> {
        SchnorrEngine::sign_hash(&self.key_pair.private_key, msg_hash)
    }

    pub fn sign_message(&self, message: &str) -> Result<SignatureOutput, SchnorrError> {
        SchnorrEngine::sign_message(&self.key_pair.private_key, message)
    }

    pub fn sign_message_with<F>(
        &self,
        message: &str,
        hash_fn: F,
    ) -> Result<SignatureOutput, SchnorrError>
    where
        F: Fn(&str) -> B256,
    {
        SchnorrEngine::sign_message_with(&self.key_pair.private_key, message, hash_fn)
    }

    /// Test escape hatch, forwarded to the engine.
    pub fn unsafe_reset_used_nonces(&mut self) {
        self.engine.unsafe_reset_used_nonces();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schnorr_musig::musig_math::hash_message;

    #[test]
    fn construction_rejects_invalid_private_keys() {
        assert!(matches!(
            SchnorrSigner::new(&[0u8; 32]),
            Err(SchnorrError::InvalidPrivateKey)
        ));
        assert!(SchnorrSigner::new(&[1u8; 31]).is_err());
        assert!(SchnorrSigner::from_hex("not-hex").is_err());
    }

    #[test]
    fn address_matches_key_pair_derivation() {
        let signer = SchnorrSigner::generate();
        assert_eq!(signer.address(), signer.public_key().eth_address());
        assert_eq!(
            signer.schnorr_address(),
            signer.public_key().schnorr_address()
        );
    }

    #[test]
    fn nonce_state_is_scoped_to_this_signer() {
        let mut signer = SchnorrSigner::generate();
        let other = SchnorrSigner::generate();

        assert!(!signer.has_nonces());
        let nonces = signer.generate_pub_nonces().unwrap();
        assert!(signer.has_nonces());
        assert_eq!(signer.pub_nonces().unwrap(), nonces);
        assert!(!other.has_nonces());
    }

    #[test]
    fn single_signer_message_round_trip() {
        let signer = SchnorrSigner::generate();
        let output = signer.sign_message("approve upgrade").unwrap();

        assert!(SchnorrEngine::verify_message(
            output.signature,
            "approve upgrade",
            &output.final_public_nonce,
            &signer.public_key()
        ));
    }

    #[test]
    fn custom_hash_function_changes_the_signed_digest() {
        let signer = SchnorrSigner::generate();
        let double_hash = |msg: &str| hash_message(&hash_message(msg).to_string());

        let output = signer.sign_message_with("payload", double_hash).unwrap();

        assert!(!SchnorrEngine::verify_message(
            output.signature,
            "payload",
            &output.final_public_nonce,
            &signer.public_key()
        ));
        assert!(SchnorrEngine::verify_hash(
            output.signature,
            double_hash("payload"),
            &output.final_public_nonce,
            &signer.public_key()
        ));
    }
}
