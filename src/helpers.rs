//! Quorum combinatorics and address helpers.
//!
//! A verifying smart account registers the combined address of every
//! authorized quorum up front; these helpers enumerate the X-of-Y subsets
//! and derive the address each one signs under.

use alloy_primitives::{Address, B256};

use crate::errors::SchnorrError;
use crate::keys_management::PublicKey;
use crate::schnorr_musig::musig_math::{combined_public_key, sum_sigs};
use crate::schnorr_musig::signer::SchnorrSigner;
use crate::signature::{single_sig_data, SignatureOutput};

/// All non-empty subsets of `items` with at least `min_len` elements,
/// in a stable order. Generic over the item type; callers pass signers,
/// keys, or anything else.
pub fn combinations<T: Clone>(items: &[T], min_len: usize) -> Vec<Vec<T>> {
    debug_assert!(items.len() < usize::BITS as usize);

    let mut combos = Vec::new();
    for mask in 1usize..(1 << items.len()) {
        if (mask.count_ones() as usize) < min_len {
            continue;
        }
        let combo: Vec<T> = items
            .iter()
            .enumerate()
            .filter(|(index, _)| mask & (1 << index) != 0)
            .map(|(_, item)| item.clone())
            .collect();
        combos.push(combo);
    }
    combos
}

/// Combined account address of one quorum of keys (two or more).
pub fn combined_address_from_keys(public_keys: &[PublicKey]) -> Result<Address, SchnorrError> {
    Ok(combined_public_key(public_keys)?.schnorr_address())
}

/// Account addresses of every X-of-Y subset of `public_keys` with at least
/// `min_signers` members. A single-key subset signs under its own key, so
/// its address is that key's schnorr address rather than a combination.
pub fn all_combined_addresses(
    public_keys: &[PublicKey],
    min_signers: usize,
) -> Result<Vec<Address>, SchnorrError> {
    combinations(public_keys, min_signers.max(1))
        .iter()
        .map(|combo| match combo.as_slice() {
            [single] => Ok(single.schnorr_address()),
            many => combined_address_from_keys(many),
        })
        .collect()
}

/// Account addresses of every quorum of `signers`.
pub fn all_combined_addresses_from_signers(
    signers: &[SchnorrSigner],
    min_signers: usize,
) -> Result<Vec<Address>, SchnorrError> {
    let public_keys: Vec<PublicKey> = signers.iter().map(SchnorrSigner::public_key).collect();
    all_combined_addresses(&public_keys, min_signers)
}

/// Sums partial signatures of one ceremony; convenience re-export of the
/// math-layer operation.
pub fn sum_schnorr_sigs(signatures: &[B256]) -> Result<B256, SchnorrError> {
    sum_sigs(signatures)
}

/// Signs a message with one signer and packs the verifier-ready blob along
/// with the digest it covers.
pub fn single_sig_data_and_hash(
    signer: &SchnorrSigner,
    message: &str,
) -> Result<(Vec<u8>, B256), SchnorrError> {
    let output: SignatureOutput = signer.sign_message(message)?;
    let msg_hash = crate::schnorr_musig::musig_math::hash_message(message);
    Ok((single_sig_data(&output, &signer.public_key()), msg_hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys_management::KeyPair;

    #[test]
    fn combination_counts_match_the_binomials() {
        let items = ["a", "b", "c"];
        // 1 of 3: A, B, C, AB, AC, BC, ABC
        assert_eq!(combinations(&items, 1).len(), 7);
        // 2 of 3: AB, AC, BC, ABC
        assert_eq!(combinations(&items, 2).len(), 4);
        // 3 of 3: ABC
        assert_eq!(combinations(&items, 3), vec![vec!["a", "b", "c"]]);
        assert!(combinations(&items, 4).is_empty());
    }

    #[test]
    fn all_combined_addresses_covers_every_subset() {
        let keys: Vec<PublicKey> = (0..3).map(|_| KeyPair::generate().public_key).collect();
        let addresses = all_combined_addresses(&keys, 1).unwrap();
        assert_eq!(addresses.len(), 7);

        // the three singletons resolve to each key's own schnorr address
        for key in &keys {
            assert!(addresses.contains(&key.schnorr_address()));
        }
        // the full quorum resolves to the combined address
        assert!(addresses.contains(&combined_address_from_keys(&keys).unwrap()));
    }

    #[test]
    fn combined_address_is_order_independent() {
        let keys: Vec<PublicKey> = (0..3).map(|_| KeyPair::generate().public_key).collect();
        let forward = combined_address_from_keys(&keys).unwrap();
        let reversed =
            combined_address_from_keys(&[keys[2], keys[1], keys[0]]).unwrap();
        assert_eq!(forward, reversed);
    }
}
