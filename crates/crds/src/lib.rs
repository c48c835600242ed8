//! AzureManagedControlPlane CRD Definitions
//!
//! Kubernetes Custom Resource Definitions for managed (AKS) control planes
//! provisioned through Cluster API.

pub mod aad_profile;
pub mod managed_control_plane;

pub use aad_profile::*;
pub use managed_control_plane::*;
