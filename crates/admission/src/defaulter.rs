//! Creation-time defaulting
//!
//! Fills in unset fields and derived names before an AzureManagedControlPlane
//! is validated for the first time. Defaulting never fails: a problem in a
//! sub-step is logged and the object is left as it was for that field.

use std::sync::Arc;

use crds::{AzureManagedControlPlane, AzureManagedControlPlaneSpec};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::keys::{KeyAlgorithm, KeyGenerator};

/// Values applied to unset fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Defaults {
    /// Value for an absent `networkPlugin`
    pub network_plugin: String,
    /// Value for an absent `networkPolicy`
    pub network_policy: String,
    /// Value for an absent `loadBalancerSKU`
    pub load_balancer_sku: String,
    /// Address space of the defaulted virtual network
    pub vnet_cidr_block: String,
    /// Address space of the defaulted node subnet
    pub node_subnet_cidr_block: String,
    /// Generate an SSH key when none is supplied
    pub generate_ssh_key: bool,
    /// Algorithm of generated SSH keys
    pub ssh_key_algorithm: KeyAlgorithm,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            network_plugin: "azure".to_string(),
            network_policy: "calico".to_string(),
            load_balancer_sku: "Standard".to_string(),
            vnet_cidr_block: "10.0.0.0/8".to_string(),
            node_subnet_cidr_block: "10.240.0.0/16".to_string(),
            generate_ssh_key: true,
            ssh_key_algorithm: KeyAlgorithm::Rsa,
        }
    }
}

/// Applies [`Defaults`] and derived names to new objects
#[derive(Debug, Clone)]
pub struct Defaulter {
    defaults: Defaults,
    key_generator: Arc<dyn KeyGenerator>,
}

impl Defaulter {
    /// Defaulter minting missing SSH keys with `key_generator`
    pub fn new(defaults: Defaults, key_generator: Arc<dyn KeyGenerator>) -> Self {
        Self {
            defaults,
            key_generator,
        }
    }

    /// Values applied to unset fields
    pub fn defaults(&self) -> &Defaults {
        &self.defaults
    }

    /// Default every unset field of `object` in place. Never touches `aadProfile`.
    pub fn apply(&self, object: &mut AzureManagedControlPlane) {
        let name = object.object_name().to_string();
        info!("Applying defaults to AzureManagedControlPlane {}", name);

        let spec = &mut object.spec;
        default_if_unset(&mut spec.network_plugin, &self.defaults.network_plugin, "networkPlugin");
        default_if_unset(&mut spec.load_balancer_sku, &self.defaults.load_balancer_sku, "loadBalancerSKU");
        default_if_unset(&mut spec.network_policy, &self.defaults.network_policy, "networkPolicy");

        if !spec.version.is_empty() && !spec.version.starts_with('v') {
            spec.version = format!("v{}", spec.version);
            debug!("Normalized version to {}", spec.version);
        }

        self.default_ssh_public_key(spec, &name);
        default_node_resource_group_name(spec, &name);
        self.default_virtual_network(spec, &name);
    }

    fn default_ssh_public_key(&self, spec: &mut AzureManagedControlPlaneSpec, name: &str) {
        if !spec.ssh_public_key.is_empty() {
            return;
        }
        if !self.defaults.generate_ssh_key {
            debug!("SSH key generation disabled, leaving sshPublicKey empty for {}", name);
            return;
        }
        match self.key_generator.generate_public_key() {
            Ok(key) => {
                spec.ssh_public_key = key;
                debug!("Generated SSH public key for {}", name);
            }
            // Creation must not fail because a key could not be minted
            Err(e) => warn!("Failed to generate SSH public key for {}: {}", name, e),
        }
    }

    fn default_virtual_network(&self, spec: &mut AzureManagedControlPlaneSpec, name: &str) {
        let vnet = &mut spec.virtual_network;
        if vnet.name.is_empty() {
            vnet.name = name.to_string();
        }
        if vnet.cidr_block.is_empty() {
            vnet.cidr_block.clone_from(&self.defaults.vnet_cidr_block);
        }
        if vnet.subnet.name.is_empty() {
            vnet.subnet.name = name.to_string();
        }
        if vnet.subnet.cidr_block.is_empty() {
            vnet.subnet.cidr_block.clone_from(&self.defaults.node_subnet_cidr_block);
        }
    }
}

/// Only absent fields are defaulted; an explicit empty string is kept
fn default_if_unset(field: &mut Option<String>, value: &str, field_name: &str) {
    if field.is_none() {
        *field = Some(value.to_string());
        debug!("Defaulted {} to {}", field_name, value);
    }
}

/// AKS names the node resource group `MC_<resourceGroup>_<cluster>_<location>`
fn default_node_resource_group_name(spec: &mut AzureManagedControlPlaneSpec, name: &str) {
    if spec.node_resource_group_name.is_empty() {
        spec.node_resource_group_name =
            format!("MC_{}_{}_{}", spec.resource_group_name, name, spec.location);
    }
}
