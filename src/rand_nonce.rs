use k256::Scalar;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};

use crate::errors::SchnorrError;
use crate::keys_management::{PrivateKey, PublicKey};

/// Per-signing-round secret material: two independent random scalars `k`
/// and `k_two` plus their public commitments.
///
/// Committing to two nonce points up front is what makes the protocol
/// non-interactive: once every participant's commitments are known, the
/// `b` coefficient folds them into one effective nonce per signer, so only
/// a nonce exchange and a signature exchange are needed.
pub struct NoncePair {
    pub(crate) k: Secret<Scalar>,
    pub(crate) k_two: Secret<Scalar>,
    pub k_public: PublicKey,
    pub k_two_public: PublicKey,
}

impl std::fmt::Debug for NoncePair {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "NoncePair {{ k_public: {:?}, k_two_public: {:?} }}",
            self.k_public, self.k_two_public
        )
    }
}

impl Clone for NoncePair {
    fn clone(&self) -> Self {
        NoncePair {
            k: Secret::new(*self.k.expose_secret()),
            k_two: Secret::new(*self.k_two.expose_secret()),
            k_public: self.k_public,
            k_two_public: self.k_two_public,
        }
    }
}

impl NoncePair {
    /// Draws two fresh random nonce scalars.
    pub fn generate() -> Self {
        Self::from_scalars(PrivateKey::generate(), PrivateKey::generate())
    }

    /// Rebuilds a pair from previously saved scalars. Recovery path for a
    /// ceremony whose nonce exchange happened before a crash; the engine
    /// still applies its reuse check on the commitments.
    pub fn restore(k: &[u8], k_two: &[u8]) -> Result<Self, SchnorrError> {
        let k = PrivateKey::from_bytes(k).map_err(|_| SchnorrError::InvalidScalar)?;
        let k_two = PrivateKey::from_bytes(k_two).map_err(|_| SchnorrError::InvalidScalar)?;
        Ok(Self::from_scalars(k, k_two))
    }

    fn from_scalars(k: PrivateKey, k_two: PrivateKey) -> Self {
        let k_public = k.public_key();
        let k_two_public = k_two.public_key();
        NoncePair {
            k: Secret::new(*k.scalar()),
            k_two: Secret::new(*k_two.scalar()),
            k_public,
            k_two_public,
        }
    }

    /// The shareable half of the pair.
    pub fn public_nonces(&self) -> PublicNonces {
        PublicNonces {
            k_public: self.k_public,
            k_two_public: self.k_two_public,
        }
    }
}

/// The public commitments a participant publishes before a ceremony.
/// Exchanged out-of-band, hence the serde round trip.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct PublicNonces {
    pub k_public: PublicKey,
    pub k_two_public: PublicKey,
}
