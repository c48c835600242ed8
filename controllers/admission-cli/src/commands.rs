//! Subcommand execution
//!
//! Every command reads its manifests, runs the engine and renders one
//! document: the admitted object, or the `Status` the API server would return.

use std::fs;
use std::io::{self, Read};
use std::path::Path;

use amcp_admission::{AdmissionEngine, ValidationErrors, rejection_status};
use crds::AzureManagedControlPlane;
use serde::Serialize;
use tracing::info;

use crate::config::{Command, OutputFormat};
use crate::error::CliError;

/// Rendered result of one admission request
#[derive(Debug)]
pub struct Verdict {
    pub allowed: bool,
    /// Document to print on stdout, if any
    pub output: Option<String>,
}

pub fn run(engine: &AdmissionEngine, command: &Command, format: OutputFormat) -> Result<Verdict, CliError> {
    match command {
        Command::Create { manifest } => {
            let raw = read_manifest(manifest)?;
            let outcome = engine.on_create(&raw);
            render_verdict(&outcome.object, &outcome.errors, format)
        }
        Command::Update { old, new } => {
            let old = read_manifest(old)?;
            let new = read_manifest(new)?;
            let errors = engine.on_update(&old, &new);
            render_verdict(&new, &errors, format)
        }
        Command::Delete { manifest } => {
            let object = read_manifest(manifest)?;
            let errors = engine.on_delete(&object);
            info!("Delete of {} admitted", object.object_name());
            Ok(Verdict {
                allowed: errors.is_empty(),
                output: None,
            })
        }
    }
}

fn render_verdict(
    object: &AzureManagedControlPlane,
    errors: &ValidationErrors,
    format: OutputFormat,
) -> Result<Verdict, CliError> {
    if errors.is_empty() {
        return Ok(Verdict {
            allowed: true,
            output: Some(render(object, format)?),
        });
    }
    Ok(Verdict {
        allowed: false,
        output: Some(render(&rejection_status(object, errors), format)?),
    })
}

pub fn render<T: Serialize>(value: &T, format: OutputFormat) -> Result<String, CliError> {
    Ok(match format {
        OutputFormat::Yaml => serde_yaml::to_string(value)?,
        OutputFormat::Json => serde_json::to_string_pretty(value)? + "\n",
    })
}

/// Read a manifest from `path`, or from stdin when `path` is `-`
fn read_manifest(path: &Path) -> Result<AzureManagedControlPlane, CliError> {
    let read_error = |source| CliError::Read {
        path: path.to_path_buf(),
        source,
    };
    let contents = if path == Path::new("-") {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf).map_err(read_error)?;
        buf
    } else {
        fs::read_to_string(path).map_err(read_error)?
    };
    parse_manifest(&contents, &path.display().to_string())
}

/// JSON manifests are accepted too since JSON is valid YAML
pub fn parse_manifest(contents: &str, source_name: &str) -> Result<AzureManagedControlPlane, CliError> {
    serde_yaml::from_str(contents).map_err(|source| CliError::Manifest {
        source_name: source_name.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use amcp_admission::Defaults;

    const MANIFEST: &str = r#"
apiVersion: exp.infrastructure.cluster.x-k8s.io/v1alpha3
kind: AzureManagedControlPlane
metadata:
  name: fooName
spec:
  version: "1.17.5"
  resourceGroupName: fooRg
  location: fooLocation
  subscriptionID: 00000000-0000-0000-0000-000000000000
  dnsServiceIP: 10.0.0.10
"#;

    fn engine() -> AdmissionEngine {
        let defaults = Defaults {
            generate_ssh_key: false,
            ..Defaults::default()
        };
        AdmissionEngine::with_defaults(defaults).expect("engine builds")
    }

    #[test]
    fn test_parse_json_manifest() {
        let json = r#"{"apiVersion":"exp.infrastructure.cluster.x-k8s.io/v1alpha3","kind":"AzureManagedControlPlane","metadata":{"name":"x"},"spec":{"version":"v1.18.0","location":"eastus"}}"#;
        let object = parse_manifest(json, "inline").expect("parses");

        assert_eq!(object.object_name(), "x");
        assert_eq!(object.spec.location, "eastus");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let err = parse_manifest("spec: [1, 2", "broken.yaml").expect_err("invalid YAML");
        assert!(err.to_string().contains("broken.yaml"));
    }

    #[test]
    fn test_admitted_create_renders_object() {
        let raw = parse_manifest(MANIFEST, "inline").expect("parses");
        let outcome = engine().on_create(&raw);
        let verdict = render_verdict(&outcome.object, &outcome.errors, OutputFormat::Yaml).expect("renders");

        assert!(verdict.allowed);
        let output = verdict.output.expect("object is printed");
        assert!(output.contains("version: v1.17.5"));
        assert!(output.contains("networkPlugin: azure"));
    }

    #[test]
    fn test_rejected_update_renders_status() {
        let old = parse_manifest(MANIFEST, "old").expect("parses");
        let mut new = old.clone();
        new.spec.location = "eastus".to_string();

        let errors = engine().on_update(&old, &new);
        let verdict = render_verdict(&new, &errors, OutputFormat::Json).expect("renders");

        assert!(!verdict.allowed);
        let status: serde_json::Value =
            serde_json::from_str(&verdict.output.expect("status is printed")).expect("valid JSON");
        assert_eq!(status["code"], 422);
        assert_eq!(status["details"]["causes"][0]["field"], "spec.location");
    }
}
