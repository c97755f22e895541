use alloy_primitives::{hex, keccak256, Address, B256};
use k256::elliptic_curve::sec1::{FromEncodedPoint, ToEncodedPoint};
use k256::elliptic_curve::PrimeField;
use k256::{AffinePoint, EncodedPoint, ProjectivePoint, Scalar};
use rand::RngCore;
use secrecy::{ExposeSecret, Secret};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::SchnorrError;

/// Length of a compressed SEC1 secp256k1 point.
pub const PUBLIC_KEY_LENGTH: usize = 33;

/// Length of a raw private scalar.
pub const PRIVATE_KEY_LENGTH: usize = 32;

/// A compressed secp256k1 public key (33 bytes, SEC1 tag `0x02`/`0x03`).
///
/// Immutable once constructed; every constructor validates that the bytes
/// decode to a point on the curve, so the accessors below never fail.
/// Equality and hashing are byte-wise.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey([u8; PUBLIC_KEY_LENGTH]);

impl PublicKey {
    /// Parses and validates a compressed SEC1 encoding.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SchnorrError> {
        if bytes.len() != PUBLIC_KEY_LENGTH {
            return Err(SchnorrError::InvalidPublicKey);
        }
        let encoded =
            EncodedPoint::from_bytes(bytes).map_err(|_| SchnorrError::InvalidPublicKey)?;
        let affine = Option::<AffinePoint>::from(AffinePoint::from_encoded_point(&encoded))
            .ok_or(SchnorrError::InvalidPublicKey)?;
        // Re-encode so the stored bytes are always the canonical compressed form.
        Ok(Self::from_affine(&affine))
    }

    pub fn from_hex(s: &str) -> Result<Self, SchnorrError> {
        let bytes = hex::decode(s)?;
        Self::from_bytes(&bytes)
    }

    /// Encodes a curve point. Errors on the identity, which has no
    /// compressed SEC1 form and is never a legitimate key or nonce.
    pub fn from_point(point: &ProjectivePoint) -> Result<Self, SchnorrError> {
        if point == &ProjectivePoint::IDENTITY {
            return Err(SchnorrError::InvalidPublicKey);
        }
        Ok(Self::from_affine(&point.to_affine()))
    }

    fn from_affine(affine: &AffinePoint) -> Self {
        let encoded = affine.to_encoded_point(true);
        let mut bytes = [0u8; PUBLIC_KEY_LENGTH];
        bytes.copy_from_slice(encoded.as_bytes());
        PublicKey(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_LENGTH] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// The curve point behind this key.
    pub fn to_point(&self) -> ProjectivePoint {
        let encoded = EncodedPoint::from_bytes(self.0)
            .expect("PublicKey bytes were validated on construction");
        let affine = Option::<AffinePoint>::from(AffinePoint::from_encoded_point(&encoded))
            .expect("PublicKey bytes were validated on construction");
        ProjectivePoint::from(affine)
    }

    /// The 32-byte x coordinate.
    pub fn x_bytes(&self) -> [u8; 32] {
        let mut x = [0u8; 32];
        x.copy_from_slice(&self.0[1..]);
        x
    }

    /// The SEC1 sign byte mapped to Ethereum's `{27, 28}` convention,
    /// carried alongside signatures for on-chain recovery.
    pub fn parity_byte(&self) -> u8 {
        self.0[0] - 2 + 27
    }

    /// Ethereum address of this key: `last20(keccak256(uncompressed[1..65]))`.
    pub fn eth_address(&self) -> Address {
        let uncompressed = self.to_point().to_affine().to_encoded_point(false);
        let hash = keccak256(&uncompressed.as_bytes()[1..]);
        Address::from_slice(&hash[12..])
    }

    /// The account address form the verifying contract registers for a
    /// combined key: the low 20 bytes of the x coordinate.
    pub fn schnorr_address(&self) -> Address {
        let x = self.x_bytes();
        Address::from_slice(&x[12..])
    }
}

impl std::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "PublicKey({})", self.to_hex())
    }
}

impl Serialize for PublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        PublicKey::from_hex(&s).map_err(D::Error::custom)
    }
}

/// A validated non-zero secp256k1 private scalar.
///
/// The scalar lives inside [`secrecy::Secret`] and is never printed by
/// `Debug`. Transforms return new values; nothing is mutated in place.
pub struct PrivateKey {
    scalar: Secret<Scalar>,
}

impl std::fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "PrivateKey {{ REDACTED }}")
    }
}

impl Clone for PrivateKey {
    fn clone(&self) -> Self {
        PrivateKey {
            scalar: Secret::new(*self.scalar.expose_secret()),
        }
    }
}

impl PrivateKey {
    /// Rejection-samples 32-byte strings until secp256k1 accepts the scalar.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let mut bytes = [0u8; PRIVATE_KEY_LENGTH];
        loop {
            rng.fill_bytes(&mut bytes);
            if let Ok(key) = Self::from_bytes(&bytes) {
                return key;
            }
        }
    }

    /// Accepts exactly 32 bytes encoding a canonical non-zero scalar.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SchnorrError> {
        if bytes.len() != PRIVATE_KEY_LENGTH {
            return Err(SchnorrError::InvalidPrivateKey);
        }
        let mut repr = [0u8; PRIVATE_KEY_LENGTH];
        repr.copy_from_slice(bytes);
        let scalar = Option::<Scalar>::from(Scalar::from_repr(repr.into()))
            .ok_or(SchnorrError::InvalidPrivateKey)?;
        if scalar == Scalar::ZERO {
            return Err(SchnorrError::InvalidPrivateKey);
        }
        Ok(PrivateKey {
            scalar: Secret::new(scalar),
        })
    }

    pub fn from_hex(s: &str) -> Result<Self, SchnorrError> {
        let bytes = hex::decode(s)?;
        Self::from_bytes(&bytes)
    }

    pub(crate) fn scalar(&self) -> &Scalar {
        self.scalar.expose_secret()
    }

    /// The derived public key `G * x`.
    pub fn public_key(&self) -> PublicKey {
        let point = ProjectivePoint::GENERATOR * self.scalar.expose_secret();
        PublicKey::from_point(&point).expect("non-zero scalar never derives the identity")
    }

    /// `keccak256` of the raw scalar bytes; keys the engine's nonce map.
    pub fn key_hash(&self) -> B256 {
        keccak256(self.scalar.expose_secret().to_bytes())
    }

    /// Hex of the raw scalar. Reveals the secret; only for serialization.
    pub fn to_hex(&self) -> String {
        hex::encode(self.scalar.expose_secret().to_bytes())
    }
}

/// An owned (private, public) key pair with `public == G * private`.
pub struct KeyPair {
    pub private_key: PrivateKey,
    pub public_key: PublicKey,
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "KeyPair {{ public_key: {:?} }}", self.public_key)
    }
}

impl Clone for KeyPair {
    fn clone(&self) -> Self {
        KeyPair {
            private_key: self.private_key.clone(),
            public_key: self.public_key,
        }
    }
}

/// Hex-string record used for the JSON encoding of a [`KeyPair`].
#[derive(Serialize, Deserialize)]
struct KeyPairRecord {
    private_key: String,
    public_key: String,
}

impl KeyPair {
    pub fn generate() -> Self {
        Self::from_private_key(PrivateKey::generate())
    }

    pub fn from_private_key(private_key: PrivateKey) -> Self {
        let public_key = private_key.public_key();
        KeyPair {
            private_key,
            public_key,
        }
    }

    pub fn to_json(&self) -> String {
        let record = KeyPairRecord {
            private_key: self.private_key.to_hex(),
            public_key: self.public_key.to_hex(),
        };
        serde_json::to_string(&record).expect("a record of strings always serializes")
    }

    /// Rejects malformed JSON, malformed hex, invalid scalars or points, and
    /// records whose public half does not match the derived key.
    pub fn from_json(json: &str) -> Result<Self, SchnorrError> {
        let record: KeyPairRecord = serde_json::from_str(json)?;
        let private_key = PrivateKey::from_hex(&record.private_key)?;
        let public_key = PublicKey::from_hex(&record.public_key)?;
        if private_key.public_key() != public_key {
            return Err(SchnorrError::KeyPairMismatch);
        }
        Ok(KeyPair {
            private_key,
            public_key,
        })
    }
}
