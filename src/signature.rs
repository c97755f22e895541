use alloy_primitives::{B256, U256};
use alloy_sol_types::SolValue;
use serde::{Deserialize, Serialize};

use crate::keys_management::PublicKey;

/// The output of a single sign or partial-sign call.
///
/// Partial signatures sharing the same `challenge` and `final_public_nonce`
/// combine by scalar addition of the `signature` field.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct SignatureOutput {
    /// `R`, the aggregate effective nonce the challenge was computed over.
    pub final_public_nonce: PublicKey,
    /// `e`, the Schnorr challenge.
    pub challenge: B256,
    /// `s`, the signature scalar.
    pub signature: B256,
}

/// ABI-encodes `(bytes32 px, bytes32 challenge, bytes32 signature, uint8 parity)`.
///
/// This 4-tuple is the wire contract with the on-chain verifier, which
/// re-derives the challenge from it; the layout must never be reordered or
/// resized.
pub fn encode_sig_data(px: B256, challenge: B256, signature: B256, parity: u8) -> Vec<u8> {
    // `abi.encode(uint8)` pads the byte into a full word, so encoding the
    // parity as a uint256 produces identical bytes.
    (px, challenge, signature, U256::from(parity)).abi_encode()
}

/// Verifier-ready blob for a single-signer signature: the signer's own key
/// takes the place of the combined key.
pub fn single_sig_data(output: &SignatureOutput, public_key: &PublicKey) -> Vec<u8> {
    encode_sig_data(
        B256::from(public_key.x_bytes()),
        output.challenge,
        output.signature,
        public_key.parity_byte(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys_management::KeyPair;

    #[test]
    fn sig_data_is_four_static_words() {
        let px = B256::repeat_byte(0x11);
        let challenge = B256::repeat_byte(0x22);
        let signature = B256::repeat_byte(0x33);
        let data = encode_sig_data(px, challenge, signature, 27);

        assert_eq!(data.len(), 4 * 32);
        assert_eq!(&data[0..32], px.as_slice());
        assert_eq!(&data[32..64], challenge.as_slice());
        assert_eq!(&data[64..96], signature.as_slice());
        // uint8 is left-padded into its own word
        assert_eq!(data[127], 27);
        assert!(data[96..127].iter().all(|b| *b == 0));
    }

    #[test]
    fn sig_data_decodes_back_to_its_words() {
        let px = B256::repeat_byte(0x44);
        let challenge = B256::repeat_byte(0x55);
        let signature = B256::repeat_byte(0x66);
        let data = encode_sig_data(px, challenge, signature, 28);

        let (px_out, challenge_out, signature_out, parity_out) =
            <(B256, B256, B256, U256)>::abi_decode(&data).unwrap();
        assert_eq!(px_out, px);
        assert_eq!(challenge_out, challenge);
        assert_eq!(signature_out, signature);
        assert_eq!(u8::try_from(parity_out).unwrap(), 28);
    }

    #[test]
    fn signature_output_serde_round_trip() {
        let output = SignatureOutput {
            final_public_nonce: KeyPair::generate().public_key,
            challenge: B256::repeat_byte(0x01),
            signature: B256::repeat_byte(0x02),
        };

        let json = serde_json::to_string(&output).unwrap();
        let restored: SignatureOutput = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, output);
    }
}
