use schnorr_multisig::{single_sig_data, SchnorrEngine, SchnorrSigner};

fn main() {
    let signer = SchnorrSigner::generate();
    let message = "plain schnorr, one key";

    // No nonce exchange is needed for a lone signer
    let output = signer.sign_message(message).expect("Error");

    let result = SchnorrEngine::verify_message(
        output.signature,
        message,
        &output.final_public_nonce,
        &signer.public_key(),
    );

    println!("Signer address: {}", signer.address());
    println!(
        "Signature blob: 0x{}",
        alloy_primitives::hex::encode(single_sig_data(&output, &signer.public_key()))
    );
    println!("Verification result: {:?}", result);
    assert!(result);
}
