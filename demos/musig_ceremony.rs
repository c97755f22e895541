use schnorr_multisig::{hash_message, SchnorrEngine, SchnorrSigner, SigningSession};

fn main() {
    // The operation the smart account is asked to execute
    let op_hash = hash_message("transfer 1 eth to 0xabc...");

    // Three independent key holders
    let mut signers: Vec<SchnorrSigner> = (0..3).map(|_| SchnorrSigner::generate()).collect();

    // Open the ceremony: nonces are generated and the combined key fixed
    let mut session = SigningSession::open(&mut signers, op_hash).expect("Error");
    println!("Combined account address: {}", session.combined_address());

    // Each participant contributes their partial signature
    let mut final_nonce = None;
    for signer in signers.iter_mut() {
        let output = session.sign(signer).expect("Error");
        final_nonce = Some(output.final_public_nonce);
        println!("Collected signature from {}", signer.address());
    }

    // Sum the partial signatures into the verifier-ready blob
    let combined_key = session.combined_public_key();
    let sig_data = session.finalize().expect("Error");
    println!("Signature blob: 0x{}", alloy_primitives::hex::encode(&sig_data));

    // Check the summed signature against the combined key
    let summed = alloy_primitives::B256::from_slice(&sig_data[64..96]);
    let result = SchnorrEngine::verify_hash(
        summed,
        op_hash,
        &final_nonce.expect("at least one signature was collected"),
        &combined_key,
    );

    println!("Verification result: {:?}", result);
    assert!(result);
}
