//! Prints the AzureManagedControlPlane CRD manifest as YAML.

use crds::AzureManagedControlPlane;
use kube::CustomResourceExt;

fn main() -> Result<(), serde_yaml::Error> {
    print!("{}", serde_yaml::to_string(&AzureManagedControlPlane::crd())?);
    Ok(())
}
