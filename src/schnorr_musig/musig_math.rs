//! Pure aggregation and challenge math on secp256k1 scalars and points.
//!
//! Everything here is stateless; nonce bookkeeping lives in the engine.
//! The construction is the two-nonce MuSig variant:
//!
//! - `L = keccak256(sort(X_1 .. X_n))` and `a_i = keccak256(L || X_i)` give
//!   each signer an aggregation coefficient, defeating rogue-key attacks
//!   and making the combined key independent of input order.
//! - `b = keccak256(X || m || sum(kPub_i) || sum(kTwoPub_i))` folds each
//!   signer's two nonce commitments into one effective nonce
//!   `R_i = kPub_i + b * kTwoPub_i`, removing the commit/reveal round of
//!   interactive MuSig.
//! - The challenge binds the *Ethereum address* of `R` rather than the raw
//!   point, so the on-chain verifier only pays for one address recovery:
//!   `e = keccak256(address(R) || parity(X) || x(X) || m)`.

use alloy_primitives::{keccak256, B256};
use k256::elliptic_curve::ops::Reduce;
use k256::{FieldBytes, ProjectivePoint, Scalar, U256};

use crate::errors::SchnorrError;
use crate::keys_management::{PrivateKey, PublicKey};
use crate::rand_nonce::{NoncePair, PublicNonces};
use crate::signature::SignatureOutput;

/// Reduces a 32-byte digest into a scalar mod the curve order.
fn scalar_from_digest(digest: B256) -> Scalar {
    let bytes = FieldBytes::from(digest.0);
    <Scalar as Reduce<U256>>::reduce_bytes(&bytes)
}

/// Parses signature bytes, reducing mod n like the verifier contract does.
fn scalar_from_sig_bytes(bytes: B256) -> Scalar {
    let bytes = FieldBytes::from(bytes.0);
    <Scalar as Reduce<U256>>::reduce_bytes(&bytes)
}

fn scalar_to_b256(scalar: &Scalar) -> B256 {
    B256::from_slice(scalar.to_bytes().as_slice())
}

/// Default message digest: keccak256 of the UTF-8 bytes, matching
/// Solidity's packed `keccak256(string)`.
pub fn hash_message(message: &str) -> B256 {
    keccak256(message.as_bytes())
}

/// `L = keccak256` of the byte-sorted concatenation of compressed keys.
/// The sort makes every coefficient independent of the order in which
/// participants were supplied.
pub fn generate_l(public_keys: &[PublicKey]) -> B256 {
    let mut sorted: Vec<&[u8; 33]> = public_keys.iter().map(PublicKey::as_bytes).collect();
    sorted.sort_unstable();

    let mut concatenated = Vec::with_capacity(sorted.len() * 33);
    for key in sorted {
        concatenated.extend_from_slice(key);
    }
    keccak256(&concatenated)
}

/// Per-key aggregation coefficient `a_i = keccak256(L || X_i) mod n`.
pub fn a_coefficient(public_key: &PublicKey, l: B256) -> Scalar {
    let mut concatenated = Vec::with_capacity(32 + 33);
    concatenated.extend_from_slice(l.as_slice());
    concatenated.extend_from_slice(public_key.as_bytes());
    scalar_from_digest(keccak256(&concatenated))
}

/// `X = sum(a_i * X_i)` over at least two keys.
pub fn combined_public_key(public_keys: &[PublicKey]) -> Result<PublicKey, SchnorrError> {
    if public_keys.len() < 2 {
        return Err(SchnorrError::InsufficientSigners {
            got: public_keys.len(),
        });
    }

    let l = generate_l(public_keys);
    let mut combined = ProjectivePoint::IDENTITY;
    for public_key in public_keys {
        combined += public_key.to_point() * a_coefficient(public_key, l);
    }
    PublicKey::from_point(&combined)
}

/// Ethereum-compatible challenge
/// `e = keccak256(address(R) || parity(P) || x(P) || msgHash) mod n`.
pub fn challenge(r: &PublicKey, msg_hash: B256, public_key: &PublicKey) -> Scalar {
    let r_address = r.eth_address();

    let mut packed = Vec::with_capacity(20 + 1 + 32 + 32);
    packed.extend_from_slice(r_address.as_slice());
    packed.push(public_key.parity_byte());
    packed.extend_from_slice(&public_key.x_bytes());
    packed.extend_from_slice(msg_hash.as_slice());
    scalar_from_digest(keccak256(&packed))
}

/// `b = keccak256(X || msgHash || sum(kPub_i) || sum(kTwoPub_i)) mod n`.
/// Computable only once every participant's commitments are known.
pub fn b_coefficient(
    combined_public_key: &PublicKey,
    msg_hash: B256,
    public_nonces: &[PublicNonces],
) -> Result<Scalar, SchnorrError> {
    let mut k_sum = ProjectivePoint::IDENTITY;
    let mut k_two_sum = ProjectivePoint::IDENTITY;
    for nonces in public_nonces {
        k_sum += nonces.k_public.to_point();
        k_two_sum += nonces.k_two_public.to_point();
    }
    let k_sum = PublicKey::from_point(&k_sum)?;
    let k_two_sum = PublicKey::from_point(&k_two_sum)?;

    let mut packed = Vec::with_capacity(33 + 32 + 33 + 33);
    packed.extend_from_slice(combined_public_key.as_bytes());
    packed.extend_from_slice(msg_hash.as_slice());
    packed.extend_from_slice(k_sum.as_bytes());
    packed.extend_from_slice(k_two_sum.as_bytes());
    Ok(scalar_from_digest(keccak256(&packed)))
}

/// `R_i = kPub_i + b * kTwoPub_i`.
fn effective_nonce(nonces: &PublicNonces, b: &Scalar) -> ProjectivePoint {
    nonces.k_public.to_point() + nonces.k_two_public.to_point() * *b
}

/// The two-nonce partial signature `s_i = k + b * kTwo + a * x * e mod n`.
///
/// Fails with [`SchnorrError::NonceMismatch`] when the signer's own
/// effective nonce is not in the supplied commitment set, which would
/// otherwise produce a signature over a divergent aggregate nonce.
pub(crate) fn partial_sign(
    nonce_pair: &NoncePair,
    combined: &PublicKey,
    private_key: &PrivateKey,
    msg_hash: B256,
    public_keys: &[PublicKey],
    public_nonces: &[PublicNonces],
) -> Result<SignatureOutput, SchnorrError> {
    use secrecy::ExposeSecret;

    let own_public_key = private_key.public_key();
    let l = generate_l(public_keys);
    let a = a_coefficient(&own_public_key, l);
    let b = b_coefficient(combined, msg_hash, public_nonces)?;

    let effective_nonces: Vec<ProjectivePoint> = public_nonces
        .iter()
        .map(|nonces| effective_nonce(nonces, &b))
        .collect();
    let own_effective = effective_nonce(&nonce_pair.public_nonces(), &b);
    if !effective_nonces.contains(&own_effective) {
        return Err(SchnorrError::NonceMismatch);
    }

    let mut r_point = ProjectivePoint::IDENTITY;
    for nonce in &effective_nonces {
        r_point += nonce;
    }
    let final_public_nonce = PublicKey::from_point(&r_point)?;
    let e = challenge(&final_public_nonce, msg_hash, combined);

    let s = *nonce_pair.k.expose_secret()
        + b * *nonce_pair.k_two.expose_secret()
        + a * e * *private_key.scalar();

    Ok(SignatureOutput {
        final_public_nonce,
        challenge: scalar_to_b256(&e),
        signature: scalar_to_b256(&s),
    })
}

/// Plain single-signer Schnorr over an already-hashed message:
/// `R = G * k`, `e = challenge(R, m, P)`, `s = k + x * e mod n`.
pub(crate) fn single_sign(
    private_key: &PrivateKey,
    msg_hash: B256,
) -> Result<SignatureOutput, SchnorrError> {
    let public_key = private_key.public_key();

    let k = PrivateKey::generate();
    let final_public_nonce = k.public_key();

    let e = challenge(&final_public_nonce, msg_hash, &public_key);
    let s = *k.scalar() + *private_key.scalar() * e;

    Ok(SignatureOutput {
        final_public_nonce,
        challenge: scalar_to_b256(&e),
        signature: scalar_to_b256(&s),
    })
}

/// `s = sum(s_i) mod n` over at least one signature.
pub fn sum_sigs(signatures: &[B256]) -> Result<B256, SchnorrError> {
    if signatures.is_empty() {
        return Err(SchnorrError::NoSignatures);
    }
    let mut sum = Scalar::ZERO;
    for signature in signatures {
        sum += scalar_from_sig_bytes(*signature);
    }
    Ok(scalar_to_b256(&sum))
}

/// Checks `s * G == R + e * P` with `e = challenge(R, msgHash, P)`.
/// Works for a partial signature against a signer's key as well as a
/// summed signature against the combined key.
pub fn verify_hash(signature: B256, msg_hash: B256, r: &PublicKey, public_key: &PublicKey) -> bool {
    let e = challenge(r, msg_hash, public_key);
    let s = scalar_from_sig_bytes(signature);

    let left = ProjectivePoint::GENERATOR * s;
    let right = r.to_point() + public_key.to_point() * e;
    left == right
}
