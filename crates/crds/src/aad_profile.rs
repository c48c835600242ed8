//! Azure Active Directory profile types
//!
//! The wire form carries two optional shapes side by side, matching what the
//! API server stores. Only one of them may be populated; the admission engine
//! rejects objects where both are.

use std::collections::BTreeSet;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// AAD integration settings for the managed cluster
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AadProfile {
    /// AKS-managed AAD integration
    #[serde(rename = "managedAAD", default, skip_serializing_if = "Option::is_none")]
    pub managed_aad: Option<ManagedAad>,

    /// Legacy AAD integration using explicit client/server applications
    #[serde(rename = "legacyAAD", default, skip_serializing_if = "Option::is_none")]
    pub legacy_aad: Option<LegacyAad>,
}

/// AKS-managed AAD integration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ManagedAad {
    /// Must be true whenever admin groups are listed
    #[serde(default)]
    pub managed: bool,

    /// AAD group object IDs granted cluster-admin
    #[serde(rename = "adminGroupObjectIDs", default)]
    pub admin_group_object_ids: BTreeSet<String>,
}

/// Legacy AAD integration; all four fields are required together
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct LegacyAad {
    /// Application ID of the client (kubectl) application
    #[serde(rename = "clientAppID", default)]
    pub client_app_id: String,

    /// Application ID of the server (API server) application
    #[serde(rename = "serverAppID", default)]
    pub server_app_id: String,

    /// Secret of the server application; never echoed back
    #[serde(rename = "serverAppSecret", default)]
    pub server_app_secret: String,

    /// AAD tenant the applications belong to
    #[serde(rename = "tenantID", default)]
    pub tenant_id: String,
}

impl ManagedAad {
    /// Managed profile with the given admin groups
    pub fn new<I, S>(managed: bool, admin_group_object_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            managed,
            admin_group_object_ids: admin_group_object_ids.into_iter().map(Into::into).collect(),
        }
    }
}

impl LegacyAad {
    /// Copy with the server secret masked, safe to echo back in error messages
    pub fn redacted(&self) -> Self {
        let server_app_secret = if self.server_app_secret.is_empty() {
            String::new()
        } else {
            "<redacted>".to_string()
        };
        Self {
            server_app_secret,
            ..self.clone()
        }
    }
}

impl AadProfile {
    /// Profile carrying only the managed shape
    pub fn managed(aad: ManagedAad) -> Self {
        Self {
            managed_aad: Some(aad),
            legacy_aad: None,
        }
    }

    /// Profile carrying only the legacy shape
    pub fn legacy(aad: LegacyAad) -> Self {
        Self {
            managed_aad: None,
            legacy_aad: Some(aad),
        }
    }
}
