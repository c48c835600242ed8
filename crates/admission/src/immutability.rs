//! Field-by-field diff between the persisted and the proposed object
//!
//! Identity fields never change after creation. Sticky fields start unset,
//! may be set once (by defaulting or by the user) and are frozen afterwards.
//! An optional field is set as soon as it is present, even when empty; the
//! plain string fields count as set once non-empty.

use crds::AzureManagedControlPlaneSpec;

use crate::error::{FieldError, FieldPath};

/// Errors for every field of `new` that `old` forbids changing.
///
/// Authentication profile transitions are delegated to
/// [`crate::auth_profile::check_transition`] and are not included here.
pub fn diff(old: &AzureManagedControlPlaneSpec, new: &AzureManagedControlPlaneSpec) -> Vec<FieldError> {
    let spec = FieldPath::spec();

    let identity = [
        ("subscriptionID", &old.subscription_id, &new.subscription_id),
        ("resourceGroupName", &old.resource_group_name, &new.resource_group_name),
        (
            "nodeResourceGroupName",
            &old.node_resource_group_name,
            &new.node_resource_group_name,
        ),
        ("location", &old.location, &new.location),
    ];

    let sticky = [
        ("sshPublicKey", non_empty(&old.ssh_public_key), non_empty(&new.ssh_public_key)),
        (
            "dnsServiceIP",
            old.dns_service_ip.as_deref(),
            new.dns_service_ip.as_deref(),
        ),
        (
            "networkPlugin",
            old.network_plugin.as_deref(),
            new.network_plugin.as_deref(),
        ),
        (
            "networkPolicy",
            old.network_policy.as_deref(),
            new.network_policy.as_deref(),
        ),
        (
            "loadBalancerSKU",
            old.load_balancer_sku.as_deref(),
            new.load_balancer_sku.as_deref(),
        ),
    ];

    let mut errors: Vec<FieldError> = identity
        .into_iter()
        .filter(|(_, old, new)| old != new)
        .map(|(field, _, new)| FieldError::immutable(spec.child(field), new.as_str()))
        .collect();

    errors.extend(
        sticky
            .into_iter()
            .filter_map(|(field, old, new)| check_sticky(spec.child(field), old, new)),
    );

    errors.extend(check_sticky(
        spec.child("defaultPoolRef").child("name"),
        non_empty(&old.default_pool_ref.name),
        non_empty(&new.default_pool_ref.name),
    ));

    errors
}

/// First set is free; afterwards neither removal nor change is allowed
fn check_sticky(path: FieldPath, old: Option<&str>, new: Option<&str>) -> Option<FieldError> {
    match (old, new) {
        (None, _) => None,
        (Some(_), None) => Some(FieldError::unsetting_not_allowed(path)),
        (Some(old), Some(new)) if old != new => Some(FieldError::immutable(path, new)),
        (Some(_), Some(_)) => None,
    }
}

fn non_empty(value: &str) -> Option<&str> {
    (!value.is_empty()).then_some(value)
}
