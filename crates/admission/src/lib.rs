//! AzureManagedControlPlane admission rules
//!
//! Decides whether a create or update of an `AzureManagedControlPlane` may be
//! persisted, and what the object looks like after defaulting:
//!
//! - [`defaulter`]: fills unset fields and derived names on create
//! - [`validators`]: structural checks on a single object
//! - [`auth_profile`]: Unset / Legacy / Managed AAD modes and their transitions
//! - [`immutability`]: identity and set-once fields across an update
//! - [`engine`]: the entry points, aggregating every violation into one list
//!
//! # Example
//!
//! ```no_run
//! use amcp_admission::{AdmissionEngine, Defaults};
//! use crds::{AzureManagedControlPlane, AzureManagedControlPlaneSpec};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = AdmissionEngine::with_defaults(Defaults::default())?;
//! let raw = AzureManagedControlPlane::new(
//!     "my-cluster",
//!     AzureManagedControlPlaneSpec {
//!         version: "1.21.2".to_string(),
//!         resource_group_name: "my-rg".to_string(),
//!         location: "westeurope".to_string(),
//!         ..Default::default()
//!     },
//! );
//!
//! let created = engine.on_create(&raw).into_result()?;
//! assert_eq!(created.spec.version, "v1.21.2");
//!
//! let mut moved = created.clone();
//! moved.spec.location = "eastus".to_string();
//! assert!(!engine.on_update(&created, &moved).is_empty());
//! # Ok(())
//! # }
//! ```

pub mod auth_profile;
pub mod defaulter;
pub mod engine;
pub mod error;
pub mod immutability;
pub mod keys;
pub mod validators;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;

pub use auth_profile::AuthProfile;
pub use defaulter::{Defaulter, Defaults};
pub use engine::{AdmissionEngine, CreateOutcome, rejection_status};
pub use error::{AdmissionError, ErrorKind, FieldError, FieldPath, ValidationErrors};
pub use keys::{KeyAlgorithm, KeyError, KeyGenerator, OpenSshKeys, PublicKeyValidator, SshKeyGenerator};
pub use validators::FieldValidators;
#[cfg(any(test, feature = "test-util"))]
pub use mock::MockKeyGenerator;
