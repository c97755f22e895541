pub mod engine;
pub mod musig_math;
pub mod session;
pub mod signer;
