#![no_main]

use libfuzzer_sys::fuzz_target;

use schnorr_multisig::{SchnorrEngine, SchnorrSigner};

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes as a private key; only canonical non-zero scalars
    // may construct a signer, and any accepted key must sign and verify.
    if let Ok(signer) = SchnorrSigner::new(data) {
        let output = signer.sign_message("Hello world").expect("Error");
        let result = SchnorrEngine::verify_message(
            output.signature,
            "Hello world",
            &output.final_public_nonce,
            &signer.public_key(),
        );
        assert!(result);
    }
});
