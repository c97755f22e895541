//! # Ethereum Schnorr Multi-Signature Library
//!
//! This Rust library implements an Ethereum-compatible Schnorr multi-signature
//! scheme over secp256k1, built on the k256 library. It lets N independent key
//! holders jointly produce one signature that a smart-contract verifier
//! accepts as proof that all of them authorized a message, gating the
//! fund-moving operations of a multi-sig smart account.
//!
//! ## Overview of Schnorr Signatures
//!
//! Schnorr signatures are linear: a signature is `s = k + x * e mod n` for a
//! random nonce scalar `k`, the secret scalar `x`, and a challenge `e` binding
//! the nonce, the key, and the message. Verification checks
//! `s * G == R + e * P` where `R = k * G` and `P = x * G`. Linearity is what
//! makes aggregation work: signatures by different keys over the same
//! challenge sum into one signature under the sum of the keys.
//!
//! ## MuSig Key Aggregation
//!
//! Naive key summation is vulnerable to rogue-key attacks, so every key is
//! weighted with a coefficient derived from the whole key set:
//!
//! - `L = keccak256(sort(X_1, .., X_n))`
//! - `a_i = keccak256(L || X_i)`
//! - `X = sum(a_i * X_i)` (the combined public key)
//!
//! Sorting the keys canonically makes `X` independent of participant order.
//!
//! ## Two-Nonce Non-Interactive Signing
//!
//! Each participant commits to *two* nonce points up front. Once everyone's
//! commitments are known, the coefficient
//! `b = keccak256(X || m || sum(kPub_i) || sum(kTwoPub_i))` folds them into
//! one effective nonce per signer, `R_i = kPub_i + b * kTwoPub_i`. This is
//! provably as secure as the interactive three-round MuSig protocol while
//! needing only a nonce exchange followed by a signature exchange:
//!
//! 1. Each participant publishes their public nonce pair.
//! 2. Each participant computes `R = sum(R_i)`, the challenge
//!    `e = keccak256(address(R) || parity(X) || x(X) || m)`, and their
//!    partial signature `s_i = k_i + b * kTwo_i + a_i * x_i * e mod n`.
//! 3. The partial signatures are summed; `(R, sum(s_i))` verifies against
//!    the combined key `X`.
//!
//! The challenge binds the *Ethereum address* of `R`, not the raw point, so
//! an on-chain verifier pays for one address recovery instead of a full
//! point comparison.
//!
//! Signing twice with the same nonce leaks the private scalar. The
//! [`SchnorrEngine`] therefore treats every nonce pair as single-use and
//! consumes it on every exit path of a signing call, successful or not.
//!
//! ## Usage
//!
//! Build a [`SchnorrSigner`] per key holder, open a [`SigningSession`] over
//! the message hash, collect each signer's partial signature, and finalize
//! into the ABI-encoded blob `(px, challenge, signature, parity)` the
//! verifying contract expects. See the crate examples for complete
//! ceremonies.

pub mod errors;
pub mod helpers;
pub mod keys_management;
pub mod rand_nonce;
pub mod schnorr_musig;
pub mod signature;

#[cfg(feature = "tracing")]
pub mod telemetry;

pub use crate::errors::SchnorrError;
pub use crate::keys_management::{KeyPair, PrivateKey, PublicKey};
pub use crate::rand_nonce::{NoncePair, PublicNonces};
pub use crate::schnorr_musig::engine::SchnorrEngine;
pub use crate::schnorr_musig::musig_math::{
    combined_public_key, hash_message, sum_sigs, verify_hash,
};
pub use crate::schnorr_musig::session::{SessionStatus, SigningSession};
pub use crate::schnorr_musig::signer::SchnorrSigner;
pub use crate::signature::{encode_sig_data, single_sig_data, SignatureOutput};
