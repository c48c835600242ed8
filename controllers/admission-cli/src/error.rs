//! CLI-specific error types.

use std::path::PathBuf;

use amcp_admission::AdmissionError;
use thiserror::Error;

/// Errors that stop the driver before a verdict is reached.
///
/// A rejected object is not an error; it is reported through the exit code.
#[derive(Debug, Error)]
pub enum CliError {
    /// Manifest or defaults file could not be read
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Manifest is not a valid AzureManagedControlPlane
    #[error("Invalid manifest {source_name}: {source}")]
    Manifest {
        source_name: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// Defaults override is malformed
    #[error("Invalid defaults file {}: {source}", path.display())]
    Defaults {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// Engine could not be constructed
    #[error("Admission engine error: {0}")]
    Admission(#[from] AdmissionError),

    /// Output could not be serialized
    #[error("Failed to render YAML output: {0}")]
    RenderYaml(#[from] serde_yaml::Error),

    #[error("Failed to render JSON output: {0}")]
    RenderJson(#[from] serde_json::Error),
}
