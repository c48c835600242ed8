//! Authentication profile modes and update transitions
//!
//! The wire `aadProfile` carries two optional shapes side by side. Before any
//! rule runs it is classified into [`AuthProfile`], which can only be one of
//! `Unset`, `Legacy` or `Managed`. A wire value with both shapes populated
//! never classifies; it is reported as a conflict instead.
//!
//! Legal transitions across an update:
//!
//! | old     | new                | verdict                                   |
//! |---------|--------------------|-------------------------------------------|
//! | Unset   | anything           | allowed                                   |
//! | Legacy  | Managed            | allowed, one-way migration                |
//! | Legacy  | Legacy             | allowed only if all four fields are equal |
//! | Legacy  | Unset              | forbidden                                 |
//! | Managed | Managed            | `managed` stays true, admin groups remain |
//! | Managed | Unset or Legacy    | forbidden                                 |

use crds::{AadProfile, LegacyAad, ManagedAad};
use serde_json::Value;
use tracing::debug;

use crate::error::{ErrorKind, FieldError, FieldPath, echo};

/// Classified view of an `aadProfile`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthProfile<'a> {
    /// No AAD integration
    Unset,
    /// Client/server application integration
    Legacy(&'a LegacyAad),
    /// AKS-managed integration
    Managed(&'a ManagedAad),
}

pub(crate) fn aad_profile_path() -> FieldPath {
    FieldPath::spec().child("aadProfile")
}

pub(crate) fn managed_aad_path() -> FieldPath {
    aad_profile_path().child("managedAAD")
}

pub(crate) fn legacy_aad_path() -> FieldPath {
    aad_profile_path().child("legacyAAD")
}

impl<'a> AuthProfile<'a> {
    /// Classify the wire profile.
    ///
    /// A profile present but carrying neither shape is `Unset`.
    ///
    /// # Errors
    ///
    /// Returns a `ConflictingConfiguration` error when both shapes are populated.
    pub fn classify(profile: Option<&'a AadProfile>) -> Result<Self, FieldError> {
        let Some(profile) = profile else {
            return Ok(Self::Unset);
        };
        match (profile.legacy_aad.as_ref(), profile.managed_aad.as_ref()) {
            (None, None) => Ok(Self::Unset),
            (Some(legacy), None) => Ok(Self::Legacy(legacy)),
            (None, Some(managed)) => Ok(Self::Managed(managed)),
            (Some(legacy), Some(managed)) => Err(FieldError::conflicting(
                aad_profile_path(),
                echo(&AadProfile {
                    managed_aad: Some(managed.clone()),
                    legacy_aad: Some(legacy.redacted()),
                }),
                "conflicting authentication configuration: legacyAAD and managedAAD are mutually exclusive",
            )),
        }
    }

    /// True when no AAD integration is configured
    pub fn is_unset(&self) -> bool {
        matches!(self, Self::Unset)
    }

    /// Value echoed back when this profile is rejected; legacy secrets are masked
    pub fn echo(&self) -> Value {
        match self {
            Self::Unset => Value::Null,
            Self::Legacy(legacy) => echo(&legacy.redacted()),
            Self::Managed(managed) => echo(managed),
        }
    }
}

/// Errors for the `old` → `new` profile transition.
///
/// Unclassifiable profiles produce nothing here; the conflict itself is
/// reported by the field validators on the new object.
pub fn check_transition(old: Option<&AadProfile>, new: Option<&AadProfile>) -> Vec<FieldError> {
    let (Ok(old), Ok(new)) = (AuthProfile::classify(old), AuthProfile::classify(new)) else {
        debug!("Skipping aadProfile transition check, profile shapes conflict");
        return Vec::new();
    };

    match (old, new) {
        (AuthProfile::Unset, _) | (AuthProfile::Legacy(_), AuthProfile::Managed(_)) => Vec::new(),

        (AuthProfile::Legacy(_), AuthProfile::Unset) => vec![FieldError::illegal_transition(
            aad_profile_path(),
            Value::Null,
            "cannot disable authentication profile",
        )],

        (AuthProfile::Legacy(old_legacy), AuthProfile::Legacy(new_legacy)) => {
            if old_legacy == new_legacy {
                Vec::new()
            } else {
                vec![FieldError::immutable(legacy_aad_path(), new.echo())]
            }
        }

        (AuthProfile::Managed(_), AuthProfile::Unset | AuthProfile::Legacy(_)) => {
            vec![FieldError::illegal_transition(
                managed_aad_path(),
                new.echo(),
                "cannot disable or migrate away from managed authentication",
            )]
        }

        (AuthProfile::Managed(_), AuthProfile::Managed(new_managed)) => {
            let mut errors = Vec::new();
            if !new_managed.managed {
                errors.push(FieldError::new(
                    ErrorKind::ImmutableField,
                    managed_aad_path().child("managed"),
                    false,
                    "field cannot be set to false",
                ));
            }
            if new_managed.admin_group_object_ids.is_empty() {
                errors.push(FieldError::new(
                    ErrorKind::ImmutableField,
                    managed_aad_path().child("adminGroupObjectIDs"),
                    echo(&new_managed.admin_group_object_ids),
                    "need at least one admin group object ID",
                ));
            }
            errors
        }
    }
}
