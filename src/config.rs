//! Configuration Module
//!
//! Handles loading and managing the Azure DevOps connection settings from
//! environment variables, with optional `.env` file support.

use std::env;
use std::fmt;
use std::path::Path;

use crate::error::{DevOpsError, Result};

/// Azure DevOps connection configuration.
///
/// All values come from environment variables; a `.env` file in the working
/// directory is loaded first, with real environment variables taking
/// precedence over file entries.
#[derive(Clone)]
pub struct Config {
    /// Azure DevOps organization name (`AZDO_ORGANIZATION`)
    pub organization: String,
    /// Project name within the organization (`AZDO_PROJECT`)
    pub project: String,
    /// Personal Access Token used for Basic auth (`AZDO_PAT`)
    pub pat: String,
    /// REST API version (`AZDO_API_VERSION`, default: 7.1)
    pub api_version: String,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// Missing variables become empty strings here; call [`Config::validated`]
    /// to get a hard error instead.
    ///
    /// # Environment Variables
    /// - `AZDO_ORGANIZATION` - Organization name (required)
    /// - `AZDO_PROJECT` - Project name (required)
    /// - `AZDO_PAT` - Personal Access Token (required)
    /// - `AZDO_API_VERSION` - API version (default: "7.1")
    pub fn from_env() -> Self {
        load_dotenv(Path::new(".env"));

        Self {
            organization: env::var("AZDO_ORGANIZATION").unwrap_or_default(),
            project: env::var("AZDO_PROJECT").unwrap_or_default(),
            pat: env::var("AZDO_PAT").unwrap_or_default(),
            api_version: env::var("AZDO_API_VERSION").unwrap_or_else(|_| "7.1".to_string()),
        }
    }

    /// Loads configuration from the environment and validates it.
    ///
    /// The error message names every missing variable at once so a first-time
    /// setup can be fixed in a single pass.
    pub fn validated() -> Result<Self> {
        let config = Self::from_env();
        config.validate()?;
        Ok(config)
    }

    // == Validate ==
    /// Checks that every required setting is present.
    pub fn validate(&self) -> Result<()> {
        let mut missing = Vec::new();
        if self.organization.is_empty() {
            missing.push("AZDO_ORGANIZATION (your Azure DevOps organization name)");
        }
        if self.project.is_empty() {
            missing.push("AZDO_PROJECT (your project name)");
        }
        if self.pat.is_empty() {
            missing.push("AZDO_PAT (your Personal Access Token)");
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(DevOpsError::Config(format!(
                "missing environment variables:\n{}",
                missing
                    .iter()
                    .map(|m| format!("  - {}", m))
                    .collect::<Vec<_>>()
                    .join("\n")
            )))
        }
    }

    // == Base URL ==
    /// Returns the base URL for the Azure DevOps REST API.
    pub fn base_url(&self) -> String {
        format!("https://dev.azure.com/{}", self.organization)
    }
}

// The PAT is a credential; keep it out of logs and panics.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("organization", &self.organization)
            .field("project", &self.project)
            .field("pat", &if self.pat.is_empty() { "<unset>" } else { "***" })
            .field("api_version", &self.api_version)
            .finish()
    }
}

// == Dotenv Loader ==
/// Best-effort `.env` loader.
///
/// Parses `KEY=VALUE` lines, skipping blanks and `#` comments and stripping
/// one layer of matching quotes. Existing environment variables are never
/// overwritten. Any read failure leaves the environment untouched.
fn load_dotenv(path: &Path) {
    let Ok(contents) = std::fs::read_to_string(path) else {
        return;
    };

    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        let mut value = value.trim();

        if (value.starts_with('"') && value.ends_with('"') && value.len() >= 2)
            || (value.starts_with('\'') && value.ends_with('\'') && value.len() >= 2)
        {
            value = &value[1..value.len() - 1];
        }

        if !key.is_empty() && env::var(key).is_err() {
            env::set_var(key, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_reports_all_missing_variables() {
        let config = Config {
            organization: String::new(),
            project: String::new(),
            pat: String::new(),
            api_version: "7.1".to_string(),
        };

        let err = config.validate().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("AZDO_ORGANIZATION"));
        assert!(message.contains("AZDO_PROJECT"));
        assert!(message.contains("AZDO_PAT"));
    }

    #[test]
    fn test_validate_accepts_complete_config() {
        let config = Config {
            organization: "contoso".to_string(),
            project: "Website".to_string(),
            pat: "secret".to_string(),
            api_version: "7.1".to_string(),
        };

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_base_url() {
        let config = Config {
            organization: "contoso".to_string(),
            project: "Website".to_string(),
            pat: "secret".to_string(),
            api_version: "7.1".to_string(),
        };

        assert_eq!(config.base_url(), "https://dev.azure.com/contoso");
    }

    #[test]
    fn test_debug_masks_pat() {
        let config = Config {
            organization: "contoso".to_string(),
            project: "Website".to_string(),
            pat: "very-secret-token".to_string(),
            api_version: "7.1".to_string(),
        };

        let debug = format!("{:?}", config);
        assert!(!debug.contains("very-secret-token"));
        assert!(debug.contains("***"));
    }

    #[test]
    fn test_dotenv_parsing_strips_quotes() {
        let dir = env::temp_dir().join("azdo_workitems_dotenv_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(".env");
        std::fs::write(
            &path,
            "# comment\nAZDO_TEST_DOTENV_A=\"quoted value\"\nAZDO_TEST_DOTENV_B=plain\n",
        )
        .unwrap();

        env::remove_var("AZDO_TEST_DOTENV_A");
        env::remove_var("AZDO_TEST_DOTENV_B");
        load_dotenv(&path);

        assert_eq!(env::var("AZDO_TEST_DOTENV_A").unwrap(), "quoted value");
        assert_eq!(env::var("AZDO_TEST_DOTENV_B").unwrap(), "plain");

        env::remove_var("AZDO_TEST_DOTENV_A");
        env::remove_var("AZDO_TEST_DOTENV_B");
    }

    #[test]
    fn test_dotenv_does_not_override_environment() {
        let dir = env::temp_dir().join("azdo_workitems_dotenv_test_override");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(".env");
        std::fs::write(&path, "AZDO_TEST_DOTENV_C=from_file\n").unwrap();

        env::set_var("AZDO_TEST_DOTENV_C", "from_env");
        load_dotenv(&path);

        assert_eq!(env::var("AZDO_TEST_DOTENV_C").unwrap(), "from_env");
        env::remove_var("AZDO_TEST_DOTENV_C");
    }
}
