//! SSH public key collaborators
//!
//! Defaulting needs a way to mint a key pair and validation needs a way to
//! check a user-supplied key. Both are traits so the engine can be driven with
//! mocks in unit tests; [`SshKeyGenerator`] and [`OpenSshKeys`] are the
//! implementations used in production.

mod openssh;

pub use openssh::{OpenSshKeys, SshKeyGenerator};

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Algorithm of generated SSH keys
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyAlgorithm {
    /// 2048-bit RSA, the key type AKS node access has always accepted
    #[default]
    Rsa,
    /// Ed25519, much faster to generate
    Ed25519,
}

/// Errors from key generation or key format checks
#[derive(Debug, Error)]
pub enum KeyError {
    /// Outer encoding is not standard base64
    #[error("the SSH public key is not properly base64 encoded: {0}")]
    Encoding(#[from] base64::DecodeError),

    /// Decoded content is not a well-formed authorized key
    #[error("the SSH public key is not valid: {0}")]
    Invalid(String),

    /// A key pair could not be produced
    #[error("SSH key generation failed: {0}")]
    Generation(String),
}

/// Produces the public half of a freshly generated key pair.
///
/// The private half is discarded; nodes are reached through other means and
/// the key only has to exist for the managed cluster API to accept the object.
pub trait KeyGenerator: Send + Sync + fmt::Debug {
    /// Base64-encoded OpenSSH authorized-key line
    fn generate_public_key(&self) -> Result<String, KeyError>;
}

/// Checks that a string holds a well-formed public key.
pub trait PublicKeyValidator: Send + Sync + fmt::Debug {
    fn validate_public_key(&self, key: &str) -> Result<(), KeyError>;
}
