//! Configuration for the CCE/CCR loader.
//!
//! One immutable [`Config`] is built at startup and handed to every component
//! that needs it. Values are layered with `figment`, lowest priority first:
//!
//! 1. Built-in defaults.
//! 2. `config.{yaml,toml,json}` in the platform configuration directory.
//! 3. `config.{yaml,toml,json}` in the current working directory.
//! 4. An explicit file passed on the command line.
//! 5. Environment variables prefixed with `CCE_`, using `__` to separate
//!    sections (e.g. `CCE_INDEX__CHUNK_SIZE=250`).

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const ENV_PREFIX: &str = "CCE_";
const CONFIG_STEM: &str = "config";

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "cce-loader")
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub source: SourceConfig,
    pub index: IndexConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Location of the SQLite database file.
    pub path: PathBuf,
}
impl Default for DatabaseConfig {
    fn default() -> Self {
        let dir = project_dirs().map(|d| d.data_dir().to_path_buf()).unwrap_or_else(|| PathBuf::from("."));
        Self { path: dir.join("cce.sqlite3") }
    }
}

/// Where the raw registration and renewal files are read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// GitHub repositories, read through the REST API.
    Github,
    /// Local checkouts of those repositories.
    Local,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub kind: SourceKind,
    /// API token, only used by the GitHub source.
    pub token: Option<String>,
    pub api_url: String,
    /// Registration (CCE) repository: `owner/name` for GitHub, a directory
    /// for local sources.
    pub registrations: String,
    /// Renewal (CCR) repository, same format as `registrations`.
    pub renewals: String,
}
impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: SourceKind::Github,
            token: None,
            api_url: "https://api.github.com".to_string(),
            registrations: "NYPL/catalog_of_copyright_entries_project".to_string(),
            renewals: "NYPL/cce-renewals".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    pub url: String,
    /// Request timeout; an unreachable node within this window is fatal.
    pub timeout_secs: u64,
    pub cce_index: String,
    pub ccr_index: String,
    /// Number of documents per bulk request.
    pub chunk_size: usize,
}
impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:9200".to_string(),
            timeout_secs: 30,
            cce_index: "cce".to_string(),
            ccr_index: "ccr".to_string(),
            chunk_size: 500,
        }
    }
}

impl Config {
    /// Build and validate the configuration from every layer.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        Self::from_figment(Self::figment(explicit)?)
    }

    /// The layered provider stack, exposed so callers (and tests) can merge
    /// additional providers on top.
    pub fn figment(explicit: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(dirs) = project_dirs() {
            figment = merge_stem(figment, &dirs.config_dir().join(CONFIG_STEM));
        }
        figment = merge_stem(figment, Path::new(CONFIG_STEM));
        if let Some(path) = explicit {
            if !path.is_file() {
                exn::bail!(ErrorKind::NotFound(path.to_path_buf()));
            }
            tracing::debug!(path = %path.display(), "Merging explicit configuration file");
            figment = merge_file(figment, path);
        }
        Ok(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Config = figment.extract().or_raise(|| ErrorKind::Extract)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.index.cce_index.trim().is_empty() {
            exn::bail!(ErrorKind::Invalid { field: "index.cce_index", reason: "must not be empty" });
        }
        if self.index.ccr_index.trim().is_empty() {
            exn::bail!(ErrorKind::Invalid { field: "index.ccr_index", reason: "must not be empty" });
        }
        if self.index.cce_index == self.index.ccr_index {
            exn::bail!(ErrorKind::Invalid { field: "index.ccr_index", reason: "must differ from index.cce_index" });
        }
        if self.index.chunk_size == 0 {
            exn::bail!(ErrorKind::Invalid { field: "index.chunk_size", reason: "must be greater than zero" });
        }
        if self.source.registrations.trim().is_empty() {
            exn::bail!(ErrorKind::Invalid { field: "source.registrations", reason: "must not be empty" });
        }
        if self.source.renewals.trim().is_empty() {
            exn::bail!(ErrorKind::Invalid { field: "source.renewals", reason: "must not be empty" });
        }
        Ok(())
    }
}

/// Merge `<stem>.yaml`, `<stem>.toml` and `<stem>.json`, whichever exist.
fn merge_stem(figment: Figment, stem: &Path) -> Figment {
    ["yaml", "toml", "json"]
        .into_iter()
        .map(|ext| stem.with_extension(ext))
        .filter(|p| p.is_file())
        .fold(figment, |f, p| merge_file(f, &p))
}

fn merge_file(figment: Figment, path: &Path) -> Figment {
    match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => figment.merge(Toml::file(path)),
        Some("json") => figment.merge(Json::file(path)),
        // YAML is what the data repositories have always shipped with.
        _ => figment.merge(Yaml::file(path)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use rstest::rstest;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::from_figment(Figment::from(Serialized::defaults(Config::default()))).unwrap();
        assert_eq!(config.index.chunk_size, 500);
        assert_eq!(config.source.kind, SourceKind::Github);
        assert_eq!(config.index.cce_index, "cce");
    }

    #[test]
    fn test_explicit_file_must_exist() {
        let err = Config::figment(Some(Path::new("/definitely/not/here/config.yaml"))).unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }

    #[test]
    fn test_explicit_yaml_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "index:\n  cce_index: entries\n  chunk_size: 50\nsource:\n  kind: local").unwrap();
        let config = Config::from_figment(Config::figment(Some(file.path())).unwrap()).unwrap();
        assert_eq!(config.index.cce_index, "entries");
        assert_eq!(config.index.chunk_size, 50);
        assert_eq!(config.index.ccr_index, "ccr");
        assert_eq!(config.source.kind, SourceKind::Local);
    }

    #[test]
    fn test_environment_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file("config.yaml", "index:\n  url: http://file:9200\n  timeout_secs: 5")?;
            jail.set_env("CCE_INDEX__URL", "http://env:9200");
            let config = Config::load(None).map_err(|e| e.to_string())?;
            assert_eq!(config.index.url, "http://env:9200");
            assert_eq!(config.index.timeout_secs, 5);
            Ok(())
        });
    }

    #[rstest]
    #[case("index:\n  chunk_size: 0")]
    #[case("index:\n  cce_index: ''")]
    #[case("index:\n  cce_index: same\n  ccr_index: same")]
    #[case("source:\n  renewals: ' '")]
    fn test_invalid_values(#[case] yaml: &str) {
        let figment = Figment::from(Serialized::defaults(Config::default())).merge(Yaml::string(yaml));
        assert!(Config::from_figment(figment).is_err());
    }
}
