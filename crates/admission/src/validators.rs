//! Structural field validators
//!
//! Each check looks at a single object (never a diff) and is independent of
//! the others; [`FieldValidators::validate`] runs all of them and keeps every
//! error.

use std::net::IpAddr;
use std::sync::Arc;

use crds::{AzureManagedControlPlaneSpec, LegacyAad, ManagedAad};
use regex::Regex;

use crate::auth_profile::{AuthProfile, legacy_aad_path, managed_aad_path};
use crate::error::{AdmissionError, FieldError, FieldPath, echo};
use crate::keys::PublicKeyValidator;

/// Kubernetes-style semantic version with mandatory `v` prefix
pub const SEMVER_PATTERN: &str =
    r"^v(0|[1-9][0-9]*)\.(0|[1-9][0-9]*)\.(0|[1-9][0-9]*)([-0-9a-zA-Z_.+]*)?$";

/// The set of structural checks run on every create and update
#[derive(Debug, Clone)]
pub struct FieldValidators {
    version_pattern: Regex,
    key_validator: Arc<dyn PublicKeyValidator>,
}

impl FieldValidators {
    /// # Errors
    ///
    /// Fails only if the built-in version pattern does not compile.
    pub fn new(key_validator: Arc<dyn PublicKeyValidator>) -> Result<Self, AdmissionError> {
        Ok(Self {
            version_pattern: Regex::new(SEMVER_PATTERN)?,
            key_validator,
        })
    }

    /// Run every validator against `spec`
    pub fn validate(&self, spec: &AzureManagedControlPlaneSpec) -> Vec<FieldError> {
        let mut errors = Vec::new();
        errors.extend(self.validate_version(&spec.version));
        errors.extend(validate_dns_service_ip(spec.dns_service_ip.as_deref()));
        errors.extend(self.validate_ssh_key(&spec.ssh_public_key));
        errors.extend(validate_aad_profile(spec));
        errors
    }

    /// `version` must be a `v`-prefixed semantic version
    pub fn validate_version(&self, version: &str) -> Option<FieldError> {
        (!self.version_pattern.is_match(version)).then(|| {
            FieldError::structural(
                FieldPath::spec().child("version"),
                version,
                "must be a valid semantic version",
            )
        })
    }

    /// A non-empty `sshPublicKey` must be a well-formed OpenSSH public key
    pub fn validate_ssh_key(&self, key: &str) -> Option<FieldError> {
        if key.is_empty() {
            return None;
        }
        self.key_validator
            .validate_public_key(key)
            .err()
            .map(|e| FieldError::structural(FieldPath::spec().child("sshPublicKey"), key, e.to_string()))
    }
}

/// An absent DNS service IP is valid; a present one, even empty, must parse
pub fn validate_dns_service_ip(dns_service_ip: Option<&str>) -> Option<FieldError> {
    let ip = dns_service_ip?;
    ip.parse::<IpAddr>().is_err().then(|| {
        FieldError::structural(
            FieldPath::spec().child("dnsServiceIP"),
            ip,
            "DNSServiceIP must be a valid IP",
        )
    })
}

/// Shape and consistency of the authentication profile
pub fn validate_aad_profile(spec: &AzureManagedControlPlaneSpec) -> Vec<FieldError> {
    match AuthProfile::classify(spec.aad_profile.as_ref()) {
        Err(conflict) => vec![conflict],
        Ok(AuthProfile::Unset) => Vec::new(),
        Ok(AuthProfile::Legacy(legacy)) => validate_legacy_aad(legacy),
        Ok(AuthProfile::Managed(managed)) => validate_managed_aad(managed),
    }
}

/// `managed` and a non-empty admin group set imply each other
fn validate_managed_aad(managed: &ManagedAad) -> Vec<FieldError> {
    let ids = &managed.admin_group_object_ids;
    if managed.managed && ids.is_empty() {
        vec![FieldError::structural(
            managed_aad_path().child("adminGroupObjectIDs"),
            echo(ids),
            "require at least one admin group object ID when managed is true",
        )]
    } else if !managed.managed && !ids.is_empty() {
        vec![FieldError::structural(
            managed_aad_path().child("managed"),
            false,
            "managed field has to be true to enable AAD integration with AKS",
        )]
    } else {
        Vec::new()
    }
}

fn validate_legacy_aad(legacy: &LegacyAad) -> Vec<FieldError> {
    let path = legacy_aad_path();
    [
        ("clientAppID", &legacy.client_app_id),
        ("serverAppID", &legacy.server_app_id),
        ("serverAppSecret", &legacy.server_app_secret),
        ("tenantID", &legacy.tenant_id),
    ]
    .into_iter()
    .filter(|(_, value)| value.is_empty())
    .map(|(field, _)| FieldError::structural(path.child(field), "", "Required value"))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::keys::OpenSshKeys;
    use crds::AadProfile;

    fn validators() -> FieldValidators {
        FieldValidators::new(Arc::new(OpenSshKeys)).expect("pattern compiles")
    }

    fn full_legacy() -> LegacyAad {
        LegacyAad {
            client_app_id: "959d77a8-5db7-4c98-b856-b34619afg75h".to_string(),
            server_app_id: "967077a8-5db7-4c98-b856-b34619afg75h".to_string(),
            server_app_secret: "286******************".to_string(),
            tenant_id: "678977a8-5db7-4c98-b856-b34619afg75h".to_string(),
        }
    }

    fn spec_with_profile(profile: AadProfile) -> AzureManagedControlPlaneSpec {
        AzureManagedControlPlaneSpec {
            version: "v1.17.8".to_string(),
            aad_profile: Some(profile),
            ..Default::default()
        }
    }

    #[test]
    fn test_version_pattern() {
        let v = validators();
        for valid in ["v1.17.8", "v0.0.0", "v1.21.2-rc.1", "v1.18.0+build_1"] {
            assert!(v.validate_version(valid).is_none(), "{valid} should be valid");
        }
        for invalid in ["", "1.17.8", "v1.1", "v01.1.1", "vv1.17.8", "v1.17.8 ", "v1.1.1/x"] {
            assert!(v.validate_version(invalid).is_some(), "{invalid:?} should be invalid");
        }
    }

    #[test]
    fn test_version_error_echoes_value() {
        let err = validators().validate_version("1.17.8").expect("invalid version");
        assert_eq!(err.kind, ErrorKind::Structural);
        assert_eq!(err.field_path.as_str(), "spec.version");
        assert_eq!(err.rejected_value, "1.17.8");
    }

    #[test]
    fn test_dns_service_ip() {
        assert!(validate_dns_service_ip(None).is_none());
        assert!(validate_dns_service_ip(Some("192.168.0.0")).is_none());
        assert!(validate_dns_service_ip(Some("fd00::10")).is_none());

        let err = validate_dns_service_ip(Some("192.168.0.0.3")).expect("invalid IP");
        assert_eq!(err.kind, ErrorKind::Structural);
        assert_eq!(err.field_path.as_str(), "spec.dnsServiceIP");
    }

    #[test]
    fn test_present_but_empty_dns_service_ip_is_rejected() {
        let err = validate_dns_service_ip(Some("")).expect("empty IP is not an IP");
        assert_eq!(err.kind, ErrorKind::Structural);
        assert_eq!(err.rejected_value, "");
    }

    #[test]
    fn test_ssh_key() {
        let v = validators();
        assert!(v.validate_ssh_key("").is_none());

        let err = v.validate_ssh_key("invalid key").expect("not base64");
        assert_eq!(err.field_path.as_str(), "spec.sshPublicKey");
        assert!(err.message.contains("base64"));
    }

    #[test]
    fn test_valid_managed_profile() {
        let spec = spec_with_profile(AadProfile::managed(ManagedAad::new(true, ["616077a8"])));
        assert!(validate_aad_profile(&spec).is_empty());
    }

    #[test]
    fn test_managed_without_groups() {
        let spec = spec_with_profile(AadProfile::managed(ManagedAad::new(true, Vec::<String>::new())));
        let errors = validate_aad_profile(&spec);

        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].field_path.as_str(),
            "spec.aadProfile.managedAAD.adminGroupObjectIDs"
        );
    }

    #[test]
    fn test_groups_without_managed_flag() {
        let spec = spec_with_profile(AadProfile::managed(ManagedAad::new(false, ["616077a8"])));
        let errors = validate_aad_profile(&spec);

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field_path.as_str(), "spec.aadProfile.managedAAD.managed");
    }

    #[test]
    fn test_valid_legacy_profile() {
        let spec = spec_with_profile(AadProfile::legacy(full_legacy()));
        assert!(validate_aad_profile(&spec).is_empty());
    }

    #[test]
    fn test_legacy_missing_fields() {
        let legacy = LegacyAad {
            server_app_id: String::new(),
            server_app_secret: String::new(),
            ..full_legacy()
        };
        let errors = validate_aad_profile(&spec_with_profile(AadProfile::legacy(legacy)));

        let paths: Vec<_> = errors.iter().map(|e| e.field_path.to_string()).collect();
        assert_eq!(
            paths,
            [
                "spec.aadProfile.legacyAAD.serverAppID",
                "spec.aadProfile.legacyAAD.serverAppSecret",
            ]
        );
    }

    #[test]
    fn test_conflicting_profile_reports_only_conflict() {
        let spec = spec_with_profile(AadProfile {
            managed_aad: Some(ManagedAad::new(true, Vec::<String>::new())),
            legacy_aad: Some(LegacyAad::default()),
        });
        let errors = validate_aad_profile(&spec);

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ErrorKind::ConflictingConfiguration);
    }

    #[test]
    fn test_validators_do_not_short_circuit() {
        let spec = AzureManagedControlPlaneSpec {
            version: "1.17.8".to_string(),
            dns_service_ip: Some("192.168.0.0.3".to_string()),
            ssh_public_key: "invalid key".to_string(),
            aad_profile: Some(AadProfile::managed(ManagedAad::new(true, Vec::<String>::new()))),
            ..Default::default()
        };
        let errors = validators().validate(&spec);

        let paths: Vec<_> = errors.iter().map(|e| e.field_path.to_string()).collect();
        assert_eq!(
            paths,
            [
                "spec.version",
                "spec.dnsServiceIP",
                "spec.sshPublicKey",
                "spec.aadProfile.managedAAD.adminGroupObjectIDs",
            ]
        );
    }
}
