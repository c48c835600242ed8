//! Admission entry points
//!
//! [`AdmissionEngine`] sequences the individual rules for each operation:
//!
//! - create: defaulting, then every field validator on the defaulted object
//! - update: immutability diff, profile transition, then every field validator
//!   on the proposed object
//! - delete: always admitted
//!
//! Every check runs on every call and all violations are returned together.
//! Inputs are borrowed and never modified; callers keep the persisted object
//! authoritative when the returned list is non-empty.

use std::sync::Arc;

use crds::AzureManagedControlPlane;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Status;
use kube::Resource;
use tracing::{debug, info};

use crate::auth_profile;
use crate::defaulter::{Defaulter, Defaults};
use crate::error::{AdmissionError, ValidationErrors};
use crate::immutability;
use crate::keys::{KeyGenerator, OpenSshKeys, PublicKeyValidator, SshKeyGenerator};
use crate::validators::FieldValidators;

/// Result of admitting a new object
#[derive(Debug, Clone, PartialEq)]
pub struct CreateOutcome {
    /// The object after defaulting
    pub object: AzureManagedControlPlane,
    /// Violations found on the defaulted object
    pub errors: ValidationErrors,
}

impl CreateOutcome {
    /// True when the defaulted object may be persisted
    pub fn is_allowed(&self) -> bool {
        self.errors.is_empty()
    }

    /// The defaulted object, or every violation if it must be rejected
    pub fn into_result(self) -> Result<AzureManagedControlPlane, ValidationErrors> {
        self.errors.into_result().map(|()| self.object)
    }
}

/// Defaulting and validation rules for AzureManagedControlPlane objects
#[derive(Debug, Clone)]
pub struct AdmissionEngine {
    defaulter: Defaulter,
    validators: FieldValidators,
}

impl AdmissionEngine {
    /// # Errors
    ///
    /// Fails only if the validators cannot be built.
    pub fn new(
        defaults: Defaults,
        key_generator: Arc<dyn KeyGenerator>,
        key_validator: Arc<dyn PublicKeyValidator>,
    ) -> Result<Self, AdmissionError> {
        Ok(Self {
            defaulter: Defaulter::new(defaults, key_generator),
            validators: FieldValidators::new(key_validator)?,
        })
    }

    /// Engine generating keys of `defaults.ssh_key_algorithm` and validating
    /// them with [`OpenSshKeys`]
    ///
    /// # Errors
    ///
    /// Fails only if the validators cannot be built.
    pub fn with_defaults(defaults: Defaults) -> Result<Self, AdmissionError> {
        let generator = SshKeyGenerator::new(defaults.ssh_key_algorithm);
        Self::new(defaults, Arc::new(generator), Arc::new(OpenSshKeys))
    }

    /// Defaulting rules applied on create
    pub fn defaulter(&self) -> &Defaulter {
        &self.defaulter
    }

    /// Field validators run on create and update
    pub fn validators(&self) -> &FieldValidators {
        &self.validators
    }

    /// Default `raw` and validate the result
    pub fn on_create(&self, raw: &AzureManagedControlPlane) -> CreateOutcome {
        info!("Validating create of AzureManagedControlPlane {}", raw.object_name());

        let mut object = raw.clone();
        self.defaulter.apply(&mut object);
        let errors: ValidationErrors = self.validators.validate(&object.spec).into();

        log_verdict("create", object.object_name(), &errors);
        CreateOutcome { object, errors }
    }

    /// Check that `old` may be replaced by `new`
    pub fn on_update(&self, old: &AzureManagedControlPlane, new: &AzureManagedControlPlane) -> ValidationErrors {
        info!("Validating update of AzureManagedControlPlane {}", new.object_name());

        let mut errors = ValidationErrors::new();
        errors.extend(immutability::diff(&old.spec, &new.spec));
        errors.extend(auth_profile::check_transition(
            old.spec.aad_profile.as_ref(),
            new.spec.aad_profile.as_ref(),
        ));
        errors.extend(self.validators.validate(&new.spec));

        log_verdict("update", new.object_name(), &errors);
        errors
    }

    /// Deletion is never blocked
    pub fn on_delete(&self, object: &AzureManagedControlPlane) -> ValidationErrors {
        info!("Validating delete of AzureManagedControlPlane {}", object.object_name());
        ValidationErrors::new()
    }
}

/// The `Status` the API server reports when rejecting `object`
pub fn rejection_status(object: &AzureManagedControlPlane, errors: &ValidationErrors) -> Status {
    errors.to_status(
        &AzureManagedControlPlane::kind(&()),
        &AzureManagedControlPlane::group(&()),
        object.object_name(),
    )
}

fn log_verdict(operation: &str, name: &str, errors: &ValidationErrors) {
    if errors.is_empty() {
        debug!("Admitted {} of {}", operation, name);
        return;
    }
    info!("Rejected {} of {} with {} error(s)", operation, name, errors.len());
    for error in errors {
        debug!(kind = %error.kind, "{}", error);
    }
}
