//! One signing ceremony over one message hash.
//!
//! A session freezes the participant set (public keys and public nonces)
//! at opening, then grows monotonically as partial signatures arrive.
//! Cross-participant consistency is checked once, at finalization. A
//! stalled ceremony simply stays partially signed; the session holds no
//! external resources and can be abandoned at any time.

use std::collections::HashMap;

use alloy_primitives::{Address, B256};

use crate::errors::SchnorrError;
use crate::keys_management::PublicKey;
use crate::rand_nonce::PublicNonces;
use crate::schnorr_musig::musig_math::{combined_public_key, sum_sigs};
use crate::schnorr_musig::signer::SchnorrSigner;
use crate::signature::{encode_sig_data, SignatureOutput};

/// Observable lifecycle of a [`SigningSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// Participants and nonces fixed, no signatures yet.
    Opened,
    /// Some, but not all, partial signatures collected.
    PartiallySigned,
    /// One signature per participant; the summed signature is available.
    FullySigned,
    /// The summed signature blob has been produced.
    Finalized,
}

#[derive(Debug, Clone, Copy)]
struct Participant {
    address: Address,
    public_key: PublicKey,
    public_nonces: PublicNonces,
}

/// Orchestrates one multi-signature ceremony.
pub struct SigningSession {
    op_hash: B256,
    participants: Vec<Participant>,
    signatures: HashMap<Address, SignatureOutput>,
    combined_public_key: PublicKey,
    finalized: bool,
}

impl std::fmt::Debug for SigningSession {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("SigningSession")
            .field("op_hash", &self.op_hash)
            .field("participants", &self.participants.len())
            .field("signatures", &self.signatures.len())
            .field("status", &self.status())
            .finish()
    }
}

impl SigningSession {
    /// Opens a ceremony across local signers, generating each signer's
    /// nonce pair. A signer that already has outstanding nonces is rejected
    /// rather than silently re-entered into a second ceremony.
    pub fn open(signers: &mut [SchnorrSigner], op_hash: B256) -> Result<Self, SchnorrError> {
        if signers.len() < 2 {
            return Err(SchnorrError::InsufficientSigners {
                got: signers.len(),
            });
        }

        let mut participants = Vec::with_capacity(signers.len());
        for signer in signers.iter_mut() {
            if signer.has_nonces() {
                return Err(SchnorrError::NoncesAlreadyOutstanding);
            }
            let public_nonces = signer.generate_pub_nonces()?;
            participants.push(Participant {
                address: signer.address(),
                public_key: signer.public_key(),
                public_nonces,
            });
        }

        Self::from_participants(participants, op_hash)
    }

    /// Opens a ceremony from already-exchanged keys and nonce commitments,
    /// for participants reached over an out-of-band channel. Participants
    /// are keyed by the Ethereum address of their public key; supplying the
    /// same key twice is rejected.
    pub fn open_remote(
        entries: &[(PublicKey, PublicNonces)],
        op_hash: B256,
    ) -> Result<Self, SchnorrError> {
        if entries.len() < 2 {
            return Err(SchnorrError::InsufficientSigners { got: entries.len() });
        }

        let mut participants: Vec<Participant> = Vec::with_capacity(entries.len());
        for (public_key, public_nonces) in entries {
            let address = public_key.eth_address();
            if participants.iter().any(|p| p.address == address) {
                return Err(SchnorrError::NoncesAlreadyOutstanding);
            }
            participants.push(Participant {
                address,
                public_key: *public_key,
                public_nonces: *public_nonces,
            });
        }

        Self::from_participants(participants, op_hash)
    }

    fn from_participants(
        participants: Vec<Participant>,
        op_hash: B256,
    ) -> Result<Self, SchnorrError> {
        let public_keys: Vec<PublicKey> = participants.iter().map(|p| p.public_key).collect();
        let combined = combined_public_key(&public_keys)?;
        Ok(SigningSession {
            op_hash,
            participants,
            signatures: HashMap::new(),
            combined_public_key: combined,
            finalized: false,
        })
    }

    pub fn op_hash(&self) -> B256 {
        self.op_hash
    }

    pub fn combined_public_key(&self) -> PublicKey {
        self.combined_public_key
    }

    /// The account address the verifier contract knows this quorum by.
    pub fn combined_address(&self) -> Address {
        self.combined_public_key.schnorr_address()
    }

    pub fn participants(&self) -> Vec<Address> {
        self.participants.iter().map(|p| p.address).collect()
    }

    pub fn public_keys(&self) -> Vec<PublicKey> {
        self.participants.iter().map(|p| p.public_key).collect()
    }

    pub fn public_nonces(&self) -> Vec<PublicNonces> {
        self.participants.iter().map(|p| p.public_nonces).collect()
    }

    pub fn status(&self) -> SessionStatus {
        if self.finalized {
            SessionStatus::Finalized
        } else if self.signatures.is_empty() {
            SessionStatus::Opened
        } else if self.signatures.len() < self.participants.len() {
            SessionStatus::PartiallySigned
        } else {
            SessionStatus::FullySigned
        }
    }

    /// Partial-signs with a local signer against this session's fixed key
    /// and nonce set, and collects the result.
    pub fn sign(
        &mut self,
        signer: &mut SchnorrSigner,
    ) -> Result<SignatureOutput, SchnorrError> {
        let address = signer.address();
        if !self.participants.iter().any(|p| p.address == address) {
            return Err(SchnorrError::UnknownParticipant(address));
        }
        let public_keys = self.public_keys();
        let public_nonces = self.public_nonces();
        let output = signer.sign_multi_sig_hash(self.op_hash, &public_keys, &public_nonces)?;
        self.signatures.insert(address, output);
        Ok(output)
    }

    /// Stores an externally produced partial signature. Consistency across
    /// participants is deferred to [`Self::finalize`], which needs only one
    /// pass over the collected set.
    pub fn collect_signature(
        &mut self,
        address: Address,
        output: SignatureOutput,
    ) -> Result<(), SchnorrError> {
        if !self.participants.iter().any(|p| p.address == address) {
            return Err(SchnorrError::UnknownParticipant(address));
        }
        self.signatures.insert(address, output);
        Ok(())
    }

    /// Sums the collected partial signatures and ABI-encodes the
    /// verifier-facing blob `(px, challenge, signature, parity)`.
    ///
    /// Requires one signature per participant, all carrying a bit-identical
    /// challenge; divergent challenges mean participants signed different
    /// aggregate-nonce sets or different messages, which is fatal to the
    /// session.
    #[tracing::instrument(name = "Finalizing signing session", skip_all)]
    pub fn finalize(&mut self) -> Result<Vec<u8>, SchnorrError> {
        if self.signatures.len() < self.participants.len() {
            return Err(SchnorrError::MissingSignatures {
                collected: self.signatures.len(),
                expected: self.participants.len(),
            });
        }

        let outputs: Vec<&SignatureOutput> = self
            .participants
            .iter()
            .filter_map(|p| self.signatures.get(&p.address))
            .collect();

        let challenge = outputs[0].challenge;
        if outputs.iter().any(|output| output.challenge != challenge) {
            return Err(SchnorrError::ChallengeMismatch);
        }

        let signatures: Vec<B256> = outputs.iter().map(|output| output.signature).collect();
        let summed = sum_sigs(&signatures)?;

        self.finalized = true;
        Ok(encode_sig_data(
            B256::from(self.combined_public_key.x_bytes()),
            challenge,
            summed,
            self.combined_public_key.parity_byte(),
        ))
    }
}
