use alloy_primitives::Address;
use thiserror::Error;

/// Errors surfaced by key handling, the signing engine and the signing session.
///
/// None of these are recovered internally: the caller decides whether to fix
/// the input (validation errors), restart the ceremony from nonce exchange
/// (protocol errors) or abandon the session (finalization errors). The only
/// state change that happens regardless of the outcome is nonce consumption,
/// see [`crate::schnorr_musig::engine::SchnorrEngine`].
#[derive(Debug, Error)]
pub enum SchnorrError {
    // -- validation --
    #[error("private key is not a valid non-zero secp256k1 scalar")]
    InvalidPrivateKey,

    #[error("public key is not a valid compressed secp256k1 point")]
    InvalidPublicKey,

    #[error("value is not a canonical secp256k1 scalar")]
    InvalidScalar,

    #[error("invalid hex encoding: {0}")]
    Hex(#[from] alloy_primitives::hex::FromHexError),

    #[error("invalid key pair JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("public key does not match the one derived from the private key")]
    KeyPairMismatch,

    // -- protocol preconditions --
    #[error("at least 2 public keys should be provided, got {got}")]
    InsufficientSigners { got: usize },

    #[error("nonces should be exchanged before signing")]
    NoncesNotExchanged,

    #[error("passed nonces are invalid: signer's commitment is not in the set")]
    NonceMismatch,

    #[error("signer already has outstanding nonces")]
    NoncesAlreadyOutstanding,

    #[error("address {0} is not a participant of this session")]
    UnknownParticipant(Address),

    #[error("session has {collected} of {expected} required signatures")]
    MissingSignatures { collected: usize, expected: usize },

    #[error("no signatures to sum")]
    NoSignatures,

    // -- security invariant --
    #[error("nonce has already been used and cannot be reused")]
    NonceReused,

    // -- finalization consistency --
    #[error("challenges for all signers should be the same")]
    ChallengeMismatch,
}
