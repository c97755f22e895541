//! X-of-Y quorum flows checked against an in-memory model of an ERC-1271
//! smart account.
//!
//! The model mirrors the on-chain verifier: it keeps a set of registered
//! signer addresses and re-derives the challenge from the signature blob.
//! `isValidSignature` answers with the ERC-1271 magic value on success and
//! `0xffffffff` otherwise.

use std::collections::HashSet;

use alloy_primitives::{Address, B256, U256};
use alloy_sol_types::SolValue;
use k256::elliptic_curve::ops::Reduce;
use k256::{FieldBytes, ProjectivePoint, Scalar};

use schnorr_multisig::helpers::{all_combined_addresses_from_signers, single_sig_data_and_hash};
use schnorr_multisig::schnorr_musig::musig_math::challenge;
use schnorr_multisig::{hash_message, PublicKey, SchnorrSigner, SigningSession};

const ERC1271_MAGIC_VALUE: [u8; 4] = [0x16, 0x26, 0xba, 0x7e];
const ERC1271_INVALID: [u8; 4] = [0xff, 0xff, 0xff, 0xff];

/// In-memory stand-in for the verifying smart account.
struct SmartAccount {
    registered: HashSet<Address>,
}

impl SmartAccount {
    fn new(addresses: impl IntoIterator<Item = Address>) -> Self {
        Self {
            registered: addresses.into_iter().collect(),
        }
    }

    /// The contract-side check: decode `(px, e, s, parity)`, gate on the
    /// registered address, recompute `R' = s*G - e*P` and accept iff the
    /// challenge over `R'` matches `e`.
    fn is_valid_signature(&self, hash: B256, sig_data: &[u8]) -> [u8; 4] {
        let Ok((px, e, s, parity)) = <(B256, B256, B256, U256)>::abi_decode(sig_data) else {
            return ERC1271_INVALID;
        };
        if !self.registered.contains(&Address::from_slice(&px[12..])) {
            return ERC1271_INVALID;
        }

        let Ok(parity) = u8::try_from(parity) else {
            return ERC1271_INVALID;
        };
        let mut compressed = [0u8; 33];
        compressed[0] = parity.wrapping_sub(25);
        compressed[1..].copy_from_slice(px.as_slice());
        let Ok(public_key) = PublicKey::from_bytes(&compressed) else {
            return ERC1271_INVALID;
        };

        let e_scalar = reduce(e);
        let s_scalar = reduce(s);
        let r_point = ProjectivePoint::GENERATOR * s_scalar - public_key.to_point() * e_scalar;
        let Ok(r) = PublicKey::from_point(&r_point) else {
            return ERC1271_INVALID;
        };

        if challenge(&r, hash, &public_key) == e_scalar {
            ERC1271_MAGIC_VALUE
        } else {
            ERC1271_INVALID
        }
    }
}

fn reduce(bytes: B256) -> Scalar {
    <Scalar as Reduce<k256::U256>>::reduce_bytes(&FieldBytes::from(bytes.0))
}

fn run_ceremony(signers: &mut [SchnorrSigner], op_hash: B256) -> Vec<u8> {
    let mut session = SigningSession::open(signers, op_hash).expect("session opens");
    for signer in signers.iter_mut() {
        session.sign(signer).expect("participant signs");
    }
    session.finalize().expect("complete ceremony finalizes")
}

#[test]
fn registered_quorum_passes_erc1271() {
    let mut signers: Vec<SchnorrSigner> = (0..3).map(|_| SchnorrSigner::generate()).collect();
    let account = SmartAccount::new(
        all_combined_addresses_from_signers(&signers, 2).expect("address enumeration"),
    );

    let op_hash = hash_message("add a new guardian");

    // Any 2-of-3 subset is registered, the full set included.
    let blob = run_ceremony(&mut signers[0..2], op_hash);
    assert_eq!(account.is_valid_signature(op_hash, &blob), ERC1271_MAGIC_VALUE);

    let blob = run_ceremony(&mut signers[1..3], op_hash);
    assert_eq!(account.is_valid_signature(op_hash, &blob), ERC1271_MAGIC_VALUE);

    let blob = run_ceremony(&mut signers, op_hash);
    assert_eq!(account.is_valid_signature(op_hash, &blob), ERC1271_MAGIC_VALUE);
}

#[test]
fn below_quorum_combination_is_rejected() {
    let mut signers: Vec<SchnorrSigner> = (0..3).map(|_| SchnorrSigner::generate()).collect();
    // Only the full 3-of-3 set is registered.
    let account = SmartAccount::new(
        all_combined_addresses_from_signers(&signers, 3).expect("address enumeration"),
    );

    let op_hash = hash_message("add a new guardian");

    let blob = run_ceremony(&mut signers[0..2], op_hash);
    assert_eq!(account.is_valid_signature(op_hash, &blob), ERC1271_INVALID);

    let blob = run_ceremony(&mut signers, op_hash);
    assert_eq!(account.is_valid_signature(op_hash, &blob), ERC1271_MAGIC_VALUE);
}

#[test]
fn foreign_quorum_is_rejected() {
    let mut insiders: Vec<SchnorrSigner> = (0..2).map(|_| SchnorrSigner::generate()).collect();
    let account = SmartAccount::new(
        all_combined_addresses_from_signers(&insiders, 2).expect("address enumeration"),
    );

    let op_hash = hash_message("rotate the owner key");

    // A valid ceremony among keys the account never registered.
    let mut outsiders: Vec<SchnorrSigner> = (0..2).map(|_| SchnorrSigner::generate()).collect();
    let blob = run_ceremony(&mut outsiders, op_hash);
    assert_eq!(account.is_valid_signature(op_hash, &blob), ERC1271_INVALID);

    let blob = run_ceremony(&mut insiders, op_hash);
    assert_eq!(account.is_valid_signature(op_hash, &blob), ERC1271_MAGIC_VALUE);
}

#[test]
fn single_signer_blob_passes_when_registered() {
    let signers: Vec<SchnorrSigner> = (0..2).map(|_| SchnorrSigner::generate()).collect();
    // min 1 registers each key's own schnorr address alongside the pairs.
    let account = SmartAccount::new(
        all_combined_addresses_from_signers(&signers, 1).expect("address enumeration"),
    );

    let (blob, msg_hash) =
        single_sig_data_and_hash(&signers[0], "a small solo withdrawal").expect("solo signature");
    assert_eq!(account.is_valid_signature(msg_hash, &blob), ERC1271_MAGIC_VALUE);
}

#[test]
fn blob_is_bound_to_its_hash() {
    let mut signers: Vec<SchnorrSigner> = (0..2).map(|_| SchnorrSigner::generate()).collect();
    let account = SmartAccount::new(
        all_combined_addresses_from_signers(&signers, 2).expect("address enumeration"),
    );

    let blob = run_ceremony(&mut signers, hash_message("approved operation"));
    assert_eq!(
        account.is_valid_signature(hash_message("a different operation"), &blob),
        ERC1271_INVALID
    );
}

#[test]
fn tampered_signature_word_is_rejected() {
    let mut signers: Vec<SchnorrSigner> = (0..2).map(|_| SchnorrSigner::generate()).collect();
    let account = SmartAccount::new(
        all_combined_addresses_from_signers(&signers, 2).expect("address enumeration"),
    );

    let op_hash = hash_message("approved operation");
    let mut blob = run_ceremony(&mut signers, op_hash);
    blob[80] ^= 0x01;
    assert_eq!(account.is_valid_signature(op_hash, &blob), ERC1271_INVALID);
}
