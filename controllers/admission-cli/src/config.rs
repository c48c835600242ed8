//! Command-line arguments and defaults loading

use std::fs;
use std::path::{Path, PathBuf};

use amcp_admission::Defaults;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::info;

use crate::error::CliError;

/// Run AzureManagedControlPlane admission checks against manifests
#[derive(Parser, Debug)]
#[command(name = "amcp-admission")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub options: Options,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug, Clone)]
pub struct Options {
    /// YAML file overriding the built-in defaults
    #[arg(long, global = true, env = "AMCP_DEFAULTS_FILE")]
    pub defaults_file: Option<PathBuf>,

    /// Leave an empty sshPublicKey empty instead of generating one
    #[arg(long, global = true, env = "AMCP_SKIP_SSH_KEYGEN")]
    pub skip_ssh_keygen: bool,

    /// Format of the object or status written to stdout
    #[arg(long, short, global = true, value_enum, default_value_t = OutputFormat::Yaml)]
    pub output: OutputFormat,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Default and validate a new object
    Create {
        /// Manifest path, or `-` for stdin
        manifest: PathBuf,
    },
    /// Check that a persisted object may be replaced
    Update {
        /// Currently persisted manifest
        old: PathBuf,
        /// Proposed manifest
        new: PathBuf,
    },
    /// Check that an object may be deleted
    Delete {
        manifest: PathBuf,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Yaml,
    Json,
}

impl Options {
    /// Built-in defaults, overlaid with the defaults file and flags
    pub fn load_defaults(&self) -> Result<Defaults, CliError> {
        let mut defaults = match &self.defaults_file {
            Some(path) => read_defaults(path)?,
            None => Defaults::default(),
        };
        if self.skip_ssh_keygen {
            defaults.generate_ssh_key = false;
        }

        info!("Configuration:");
        info!("  Network plugin: {}", defaults.network_plugin);
        info!("  Network policy: {}", defaults.network_policy);
        info!("  Load balancer SKU: {}", defaults.load_balancer_sku);
        info!("  Generate SSH key: {}", defaults.generate_ssh_key);
        info!("  SSH key algorithm: {:?}", defaults.ssh_key_algorithm);
        Ok(defaults)
    }
}

fn read_defaults(path: &Path) -> Result<Defaults, CliError> {
    let contents = fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_defaults(&contents).map_err(|source| CliError::Defaults {
        path: path.to_path_buf(),
        source,
    })
}

/// Fields missing from the document keep their built-in value
pub fn parse_defaults(contents: &str) -> Result<Defaults, serde_yaml::Error> {
    if contents.trim().is_empty() {
        return Ok(Defaults::default());
    }
    serde_yaml::from_str(contents)
}
