//! Reading input documents from disk.
//!
//! Paths come from named environment variables set by the driver. Parse
//! errors carry the JSON path of the offending field.

use super::{FirewallConfig, NsgConfig, RouteTablesConfig};
use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::{Path, PathBuf};

pub const ENV_COMMON_FILE: &str = "COMMON_FILE";
pub const ENV_SUBNETS_CONFIG_FILE: &str = "SUBNETS_CONFIG_FILE";
pub const ENV_NSGS_CONFIG_FILE: &str = "NSGS_CONFIG_FILE";
pub const ENV_ROUTE_TABLES_CONFIG_FILE: &str = "ROUTE_TABLES_CONFIG_FILE";
pub const ENV_FIREWALL_CONFIG_FILE: &str = "FIREWALL_CONFIG_FILE";
pub const ENV_PARAMS_DIR: &str = "PARAMS_DIR";
pub const ENV_META_DIR: &str = "META_DIR";

/// All input documents for one compilation run.
#[derive(Debug, Clone)]
pub struct Inputs {
    /// Raw common parameter document, validated before it is typed.
    pub common: Value,
    /// Raw subnet definition document, validated alongside `common`.
    pub subnets: Value,
    pub nsgs: NsgConfig,
    pub route_tables: RouteTablesConfig,
    pub firewall: FirewallConfig,
}

/// Locations of the input documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputPaths {
    pub common: PathBuf,
    pub subnets: PathBuf,
    pub nsgs: PathBuf,
    pub route_tables: PathBuf,
    pub firewall: Option<PathBuf>,
}

/// Where generated files go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputDirs {
    pub params_dir: PathBuf,
    pub meta_dir: PathBuf,
}

fn required_env(name: &str) -> Result<PathBuf> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => Ok(PathBuf::from(v)),
        _ => Err(Error::Usage(format!("environment variable {name} is not set"))),
    }
}

fn optional_env(name: &str) -> Option<PathBuf> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
}

impl InputPaths {
    pub fn from_env() -> Result<InputPaths> {
        Ok(InputPaths {
            common: required_env(ENV_COMMON_FILE)?,
            subnets: required_env(ENV_SUBNETS_CONFIG_FILE)?,
            nsgs: required_env(ENV_NSGS_CONFIG_FILE)?,
            route_tables: required_env(ENV_ROUTE_TABLES_CONFIG_FILE)?,
            firewall: optional_env(ENV_FIREWALL_CONFIG_FILE),
        })
    }

    /// Read every document. Side files are typed here; the common and
    /// subnet documents stay raw for the validator.
    pub fn load(&self) -> Result<Inputs> {
        let firewall = match &self.firewall {
            Some(path) => load(path)?,
            None => {
                log::debug!("{ENV_FIREWALL_CONFIG_FILE} not set, using firewall defaults");
                FirewallConfig::default()
            }
        };
        Ok(Inputs {
            common: read_json(&self.common)?,
            subnets: read_json(&self.subnets)?,
            nsgs: load(&self.nsgs)?,
            route_tables: load(&self.route_tables)?,
            firewall,
        })
    }
}

impl OutputDirs {
    pub fn from_env() -> Result<OutputDirs> {
        Ok(OutputDirs {
            params_dir: required_env(ENV_PARAMS_DIR)?,
            meta_dir: required_env(ENV_META_DIR)?,
        })
    }
}

fn read_text(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(Error::Config(format!(
            "file does not exist: {}",
            path.display()
        )));
    }
    log::info!("Reading input file: {}", path.display());
    std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Error reading {}: {e}", path.display())))
}

/// Read a JSON document without imposing a shape on it.
pub fn read_json(path: &Path) -> Result<Value> {
    let text = read_text(path)?;
    serde_json::from_str(&text)
        .map_err(|e| Error::Config(format!("Error parsing JSON {}: {e}", path.display())))
}

/// Read a JSON document into a typed structure.
pub fn load<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = read_text(path)?;
    let mut deserializer = serde_json::Deserializer::from_str(&text);
    serde_path_to_error::deserialize(&mut deserializer).map_err(|e| {
        Error::Config(format!(
            "Error parsing {}: path={} error={}",
            path.display(),
            e.path(),
            e.inner()
        ))
    })
}

/// Type an already loaded document.
pub fn parse<T: DeserializeOwned>(value: &Value, what: &str) -> Result<T> {
    serde_path_to_error::deserialize(value).map_err(|e| {
        Error::Config(format!(
            "Error parsing {what}: path={} error={}",
            e.path(),
            e.inner()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SubnetsConfig;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_read_json_missing_file() {
        let err = read_json(Path::new("does/not/exist.json")).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_read_json_syntax_error() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{{ \"common\": ").unwrap();
        let err = read_json(file.path()).unwrap_err();
        assert!(err.to_string().contains("Error parsing JSON"));
    }

    #[test]
    fn test_load_reports_json_path() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"inboundTargetSubnetAliases": ["usernode", 7]}}"#
        )
        .unwrap();
        let err = load::<RouteTablesConfig>(file.path()).unwrap_err();
        assert!(
            err.to_string().contains("path=inboundTargetSubnetAliases[1]"),
            "{err}"
        );
    }

    #[test]
    fn test_parse_value() {
        let value = json!({"subnetDefinitions": [{"name": "a", "alias": "a", "prefixLength": 24}]});
        let cfg: SubnetsConfig = parse(&value, "subnets config").unwrap();
        assert_eq!(cfg.subnet_definitions.len(), 1);

        let bad = json!({"subnetDefinitions": [{"name": "a", "prefixLength": "big"}]});
        assert!(parse::<SubnetsConfig>(&bad, "subnets config").is_err());
    }
}
