use anyhow::Result;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::DashboardError;

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
pub struct DefaultsFile {
    #[serde(default, alias = "metric")]
    pub metrics: Option<String>,
    #[serde(default, alias = "sortby")]
    pub sort_by: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub node_refresh_ms: Option<u64>,
    #[serde(default)]
    pub pod_refresh_ms: Option<u64>,
    #[serde(default, alias = "timeout_secs")]
    pub collection_timeout_secs: Option<u64>,
    #[serde(default, alias = "noinfo")]
    pub no_info: Option<bool>,
}

impl DefaultsFile {
    pub fn load() -> Result<Self> {
        let Some(path) = discover_config_path() else {
            return Ok(Self::default());
        };
        let raw = fs::read_to_string(&path).map_err(|error| {
            DashboardError::config(format!("failed to read {}: {error}", path.display()))
        })?;
        Ok(Self::parse(&raw, &path)?)
    }

    fn parse(raw: &str, source: &Path) -> Result<Self, DashboardError> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw).map_err(|error| {
            DashboardError::config(format!("failed to parse {}: {error}", source.display()))
        })
    }
}

fn discover_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("KUBENODEUSAGE_CONFIG")
        && !path.trim().is_empty()
    {
        return Some(PathBuf::from(path));
    }

    let cwd_candidates = [
        PathBuf::from("kubenodeusage.yaml"),
        PathBuf::from("kubenodeusage.yml"),
    ];
    for candidate in cwd_candidates {
        if candidate.exists() {
            return Some(candidate);
        }
    }

    if let Ok(home) = std::env::var("HOME") {
        let user_candidates = [
            PathBuf::from(&home).join(".config/kubenodeusage/config.yaml"),
            PathBuf::from(&home).join(".config/kubenodeusage/config.yml"),
        ];
        for candidate in user_candidates {
            if candidate.exists() {
                return Some(candidate);
            }
        }
    }

    None
}

pub fn resolve_kubeconfig(
    flag: Option<&Path>,
    env: Option<&str>,
    home: Option<&Path>,
) -> Option<PathBuf> {
    if let Some(path) = flag {
        return Some(path.to_path_buf());
    }

    if let Some(value) = env.map(str::trim).filter(|value| !value.is_empty()) {
        let mut paths = std::env::split_paths(value);
        return match (paths.next(), paths.next()) {
            (Some(single), None) => Some(single),
            _ => None,
        };
    }

    home.map(|home| home.join(".kube").join("config"))
        .filter(|path| path.exists())
}

#[cfg(test)]
mod tests {
    use super::{DefaultsFile, resolve_kubeconfig};
    use std::path::{Path, PathBuf};

    #[test]
    fn parses_defaults_with_aliases() {
        let raw = "metrics: cpu\nsortby: free\nnode_refresh_ms: 2000\nnoinfo: true\nunrelated: 1\n";
        let defaults = DefaultsFile::parse(raw, Path::new("test.yaml")).unwrap();
        assert_eq!(defaults.metrics.as_deref(), Some("cpu"));
        assert_eq!(defaults.sort_by.as_deref(), Some("free"));
        assert_eq!(defaults.node_refresh_ms, Some(2_000));
        assert_eq!(defaults.no_info, Some(true));
        assert_eq!(defaults.pod_refresh_ms, None);
    }

    #[test]
    fn empty_file_means_no_defaults() {
        let defaults = DefaultsFile::parse("  \n", Path::new("empty.yaml")).unwrap();
        assert_eq!(defaults, DefaultsFile::default());
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let error = DefaultsFile::parse("node_refresh_ms: [fast", Path::new("bad.yaml")).unwrap_err();
        assert_eq!(error.exit_code(), 1);
        assert!(error.to_string().contains("bad.yaml"));
    }

    #[test]
    fn kubeconfig_flag_wins() {
        let resolved = resolve_kubeconfig(
            Some(Path::new("/tmp/flag.yaml")),
            Some("/tmp/env.yaml"),
            None,
        );
        assert_eq!(resolved, Some(PathBuf::from("/tmp/flag.yaml")));
    }

    #[test]
    fn single_env_path_is_used() {
        let resolved = resolve_kubeconfig(None, Some("/tmp/env.yaml"), None);
        assert_eq!(resolved, Some(PathBuf::from("/tmp/env.yaml")));
    }

    #[cfg(unix)]
    #[test]
    fn merged_env_list_defers_to_client() {
        let resolved = resolve_kubeconfig(None, Some("/tmp/a.yaml:/tmp/b.yaml"), None);
        assert_eq!(resolved, None);
    }

    #[test]
    fn missing_home_config_defers_to_client() {
        let resolved = resolve_kubeconfig(None, None, Some(Path::new("/nonexistent-home")));
        assert_eq!(resolved, None);
    }
}
