//! AzureManagedControlPlane CRD
//!
//! Declares the desired state of an AKS managed control plane.

use std::collections::BTreeMap;

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::aad_profile::AadProfile;

/// Desired state of an AKS managed control plane
#[derive(CustomResource, Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "exp.infrastructure.cluster.x-k8s.io",
    version = "v1alpha3",
    kind = "AzureManagedControlPlane",
    namespaced,
    status = "AzureManagedControlPlaneStatus",
    derive = "PartialEq",
    derive = "Default"
)]
#[serde(rename_all = "camelCase")]
pub struct AzureManagedControlPlaneSpec {
    /// Kubernetes version, e.g. "v1.21.2"
    #[serde(default)]
    pub version: String,

    /// Resource group holding the managed cluster
    #[serde(default)]
    pub resource_group_name: String,

    /// Resource group AKS creates for the cluster's node resources
    #[serde(default)]
    pub node_resource_group_name: String,

    /// Virtual network the node pools attach to
    #[serde(default)]
    pub virtual_network: ManagedControlPlaneVirtualNetwork,

    /// Azure subscription identifier
    #[serde(rename = "subscriptionID", default)]
    pub subscription_id: String,

    /// Azure region, e.g. "westeurope"
    #[serde(default)]
    pub location: String,

    /// Extra tags applied to every Azure resource created for the cluster
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub additional_tags: BTreeMap<String, String>,

    /// Network plugin ("azure" or "kubenet")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_plugin: Option<String>,

    /// Network policy ("azure" or "calico")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_policy: Option<String>,

    /// Base64-encoded OpenSSH public key for node access
    #[serde(default)]
    pub ssh_public_key: String,

    /// Cluster DNS service IP, must lie inside the service CIDR
    #[serde(rename = "dnsServiceIP", default, skip_serializing_if = "Option::is_none")]
    pub dns_service_ip: Option<String>,

    /// Load balancer SKU ("Basic" or "Standard")
    #[serde(rename = "loadBalancerSKU", default, skip_serializing_if = "Option::is_none")]
    pub load_balancer_sku: Option<String>,

    /// Azure Active Directory integration
    #[serde(rename = "aadProfile", default, skip_serializing_if = "Option::is_none")]
    pub aad_profile: Option<AadProfile>,

    /// The system node pool backing the control plane
    #[serde(default)]
    pub default_pool_ref: PoolReference,
}

/// Virtual network settings for the managed cluster
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ManagedControlPlaneVirtualNetwork {
    /// Defaults to the object name
    #[serde(default)]
    pub name: String,

    /// Address space, e.g. "10.0.0.0/8"
    #[serde(default)]
    pub cidr_block: String,

    /// Subnet the node pools are placed in
    #[serde(default)]
    pub subnet: ManagedControlPlaneSubnet,
}

/// Node subnet inside the managed virtual network
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ManagedControlPlaneSubnet {
    /// Defaults to the object name
    #[serde(default)]
    pub name: String,

    /// Address space, e.g. "10.240.0.0/16"
    #[serde(default)]
    pub cidr_block: String,
}

/// Local reference to an AzureManagedMachinePool
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PoolReference {
    /// Name of the machine pool
    #[serde(default)]
    pub name: String,
}

/// Observed state of the managed control plane
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AzureManagedControlPlaneStatus {
    /// The control plane API server is reachable
    #[serde(default)]
    pub ready: bool,

    /// The control plane has been provisioned at least once
    #[serde(default)]
    pub initialized: bool,
}

impl AzureManagedControlPlane {
    /// Object name, or the empty string when the object has not been named yet
    pub fn object_name(&self) -> &str {
        self.metadata.name.as_deref().unwrap_or_default()
    }
}
