#![no_main]

use libfuzzer_sys::fuzz_target;

use alloy_primitives::B256;
use schnorr_multisig::{hash_message, SchnorrEngine, SchnorrSigner, SigningSession};

fuzz_target!(|data: &[u8]| {
    // Message to be signed
    if let Ok(message) = std::str::from_utf8(data) {
        let op_hash = hash_message(message);

        // Two-party ceremony over the fuzzed message
        let mut signers = vec![SchnorrSigner::generate(), SchnorrSigner::generate()];
        let mut session = SigningSession::open(&mut signers, op_hash).expect("Error");

        let mut final_nonce = None;
        for signer in signers.iter_mut() {
            let output = session.sign(signer).expect("Error");
            final_nonce = Some(output.final_public_nonce);
        }

        let combined_key = session.combined_public_key();
        let blob = session.finalize().expect("Error");

        let summed = B256::from_slice(&blob[64..96]);
        let result = SchnorrEngine::verify_hash(
            summed,
            op_hash,
            &final_nonce.expect("Error"),
            &combined_key,
        );

        assert!(result);
    }
});
