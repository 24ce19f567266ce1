//! Configuration for tidepool.
//!
//! Looks for `.config/tidepool.styx` in the current directory or any parent
//! directory. A typical file:
//!
//! ```text
//! deployment_target self_hosted
//! project_id local
//! schemas (public auth)
//! halt_on_error false
//! ```

use camino::{Utf8Path, Utf8PathBuf};
use facet::Facet;

/// Relative location of the config file inside a project directory.
pub const CONFIG_FILE: &str = ".config/tidepool.styx";

/// Where the managed database lives.
///
/// Some remote operations (project discovery, for one) only exist on the
/// hosted platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Facet)]
#[repr(u8)]
pub enum DeploymentTarget {
    /// The hosted platform
    #[default]
    #[facet(rename = "cloud")]
    Cloud,
    /// A self-hosted stack
    #[facet(rename = "self_hosted")]
    SelfHosted,
}

impl std::fmt::Display for DeploymentTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeploymentTarget::Cloud => write!(f, "cloud"),
            DeploymentTarget::SelfHosted => write!(f, "self-hosted"),
        }
    }
}

impl DeploymentTarget {
    /// Whether a category of remote work is available on this target.
    pub fn permits(&self, capability: Capability) -> bool {
        match capability {
            Capability::ProjectDiscovery => *self == DeploymentTarget::Cloud,
            Capability::TableReconciliation
            | Capability::RoleReconciliation
            | Capability::PolicyReconciliation => true,
        }
    }
}

/// A category of remote work that may or may not exist on a deployment target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Looking up the hosted project through the management API
    ProjectDiscovery,
    TableReconciliation,
    RoleReconciliation,
    PolicyReconciliation,
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Capability::ProjectDiscovery => write!(f, "project discovery"),
            Capability::TableReconciliation => write!(f, "table reconciliation"),
            Capability::RoleReconciliation => write!(f, "role reconciliation"),
            Capability::PolicyReconciliation => write!(f, "policy reconciliation"),
        }
    }
}

/// Contents of `.config/tidepool.styx`.
#[derive(Debug, Clone, PartialEq, Facet)]
pub struct Config {
    /// Deployment target (`cloud` or `self_hosted`).
    #[facet(default)]
    pub deployment_target: DeploymentTarget,

    /// Project identifier on the hosted platform. Required for `cloud`.
    #[facet(default)]
    pub project_id: Option<String>,

    /// Human-readable project name.
    #[facet(default)]
    pub project_name: Option<String>,

    /// Schemas to reconcile. Defaults to `public` when empty.
    #[facet(default)]
    pub schemas: Vec<String>,

    /// Stop applying a plan at the first failed operation. Defaults to `true`.
    #[facet(default)]
    pub halt_on_error: Option<bool>,
}

impl Config {
    /// A hosted-platform configuration for the given project.
    pub fn cloud(project_id: impl Into<String>) -> Self {
        Self {
            deployment_target: DeploymentTarget::Cloud,
            project_id: Some(project_id.into()),
            project_name: None,
            schemas: Vec::new(),
            halt_on_error: None,
        }
    }

    /// A self-hosted configuration.
    pub fn self_hosted() -> Self {
        Self {
            deployment_target: DeploymentTarget::SelfHosted,
            project_id: None,
            project_name: None,
            schemas: Vec::new(),
            halt_on_error: None,
        }
    }

    /// Parse a config document and check it for consistency.
    pub fn from_styx(source: &str) -> Result<Self, ConfigError> {
        let config: Config =
            facet_styx::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Schemas to reconcile.
    pub fn schemas(&self) -> Vec<&str> {
        if self.schemas.is_empty() {
            vec!["public"]
        } else {
            self.schemas.iter().map(String::as_str).collect()
        }
    }

    pub fn halt_on_error(&self) -> bool {
        self.halt_on_error.unwrap_or(true)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.deployment_target == DeploymentTarget::Cloud
            && self.project_id.as_deref().is_none_or(|id| id.trim().is_empty())
        {
            return Err(ConfigError::Invalid(
                "project_id is required when deployment_target is cloud".to_string(),
            ));
        }
        if let Some(schema) = self.schemas.iter().find(|s| s.trim().is_empty()) {
            return Err(ConfigError::Invalid(format!(
                "schema names must not be empty (got {:?})",
                schema
            )));
        }
        Ok(())
    }
}

/// Load configuration from `.config/tidepool.styx`, searching up the directory tree.
pub fn load() -> Result<(Config, Utf8PathBuf), ConfigError> {
    let cwd = std::env::current_dir().map_err(|e| ConfigError::Io(e.to_string()))?;
    let cwd = Utf8PathBuf::from_path_buf(cwd)
        .map_err(|p| ConfigError::Io(format!("non UTF-8 working directory: {}", p.display())))?;
    load_from(&cwd)
}

/// Load configuration starting from a specific directory.
pub fn load_from(start: &Utf8Path) -> Result<(Config, Utf8PathBuf), ConfigError> {
    let config_path = find_config_file(start)?;
    let content =
        std::fs::read_to_string(&config_path).map_err(|e| ConfigError::Io(e.to_string()))?;

    let config = Config::from_styx(&content)?;

    Ok((config, config_path))
}

/// Find `.config/tidepool.styx` by searching up the directory tree.
fn find_config_file(start: &Utf8Path) -> Result<Utf8PathBuf, ConfigError> {
    let mut current = start.to_path_buf();

    loop {
        let config_path = current.join(CONFIG_FILE);
        if config_path.exists() {
            return Ok(config_path);
        }

        if !current.pop() {
            return Err(ConfigError::NotFound);
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// No `.config/tidepool.styx` found in any parent directory
    NotFound,
    /// I/O error reading the file
    Io(String),
    /// Parse error in the Styx file
    Parse(String),
    /// The file parsed but its contents don't make sense together
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::NotFound => {
                write!(
                    f,
                    "No {} found in current directory or any parent",
                    CONFIG_FILE
                )
            }
            ConfigError::Io(e) => write!(f, "Failed to read {}: {}", CONFIG_FILE, e),
            ConfigError::Parse(e) => write!(f, "Failed to parse {}: {}", CONFIG_FILE, e),
            ConfigError::Invalid(e) => write!(f, "Invalid {}: {}", CONFIG_FILE, e),
        }
    }
}

impl std::error::Error for ConfigError {}
