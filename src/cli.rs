use clap::Parser;
use regex::Regex;
use serde::Serialize;
use std::path::PathBuf;

use crate::config::DefaultsFile;
use crate::error::DashboardError;
use crate::model::{ColorBand, FilterCriteria, LabelRequirement, Metric, SortField, SortSpec, View};

const DEFAULT_NODE_REFRESH_MS: u64 = 1_000;
const DEFAULT_POD_REFRESH_MS: u64 = 5_000;
const MIN_REFRESH_MS: u64 = 500;
const DEFAULT_COLLECTION_TIMEOUT_SECS: u64 = 10;
const DEFAULT_LABEL_ALIAS: &str = "Label";

#[derive(Debug, Clone, Parser)]
#[command(
    name = "kubenodeusage",
    version,
    about = "Live node and pod resource usage for Kubernetes clusters."
)]
pub struct CliArgs {
    /// Metric to display: memory, cpu or disk
    #[arg(long)]
    pub metrics: Option<String>,

    /// Sort by name, free, capacity, usage (pods also: namespace, request, limit)
    #[arg(long = "sortby")]
    pub sort_by: Option<String>,

    /// Reverse the sort order
    #[arg(long)]
    pub desc: bool,

    /// Comma-separated name regexes; a row matching any of them is kept
    #[arg(long = "filternodes")]
    pub filter_nodes: Option<String>,

    /// Comma-separated key=value pairs; a row must carry all of them
    #[arg(long = "filterlabel")]
    pub filter_label: Option<String>,

    /// Keep only rows in a usage band: green, orange or red
    #[arg(long = "filtercolor")]
    pub filter_color: Option<String>,

    /// Label to show as an extra column, as key or key#Alias
    #[arg(long)]
    pub label: Option<String>,

    /// Hide the cluster context, version and URL
    #[arg(long = "noinfo")]
    pub no_info: bool,

    /// Show pods instead of nodes
    #[arg(long)]
    pub pods: bool,

    /// Debug logging and an options banner line
    #[arg(long)]
    pub debug: bool,

    /// Refresh interval in milliseconds
    #[arg(long)]
    pub refresh_ms: Option<u64>,

    /// Give up on a collection cycle after this many seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Path to a kubeconfig file
    #[arg(long)]
    pub kubeconfig: Option<PathBuf>,

    /// tracing filter (for example: info,kube=debug)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_filter: String,

    /// Write logs to this file instead of discarding them
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

/// Extra label column: which label to read and what to title the column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelDisplay {
    pub key: String,
    pub alias: String,
}

/// Validated run configuration.
#[derive(Debug, Clone, Serialize)]
pub struct Options {
    pub view: View,
    pub metric: Metric,
    pub sort: SortSpec,
    pub filter: FilterCriteria,
    pub label: Option<LabelDisplay>,
    pub no_info: bool,
    pub debug: bool,
    pub refresh_ms: u64,
    pub collection_timeout_secs: u64,
    pub kubeconfig: Option<PathBuf>,
    pub log_filter: String,
    pub log_file: Option<PathBuf>,
}

impl CliArgs {
    /// Checks flags against each other and merges in file defaults.
    pub fn into_options(self, defaults: &DefaultsFile) -> Result<Options, DashboardError> {
        let view = if self.pods { View::Pods } else { View::Nodes };

        let metric_token = self
            .metrics
            .as_deref()
            .or(defaults.metrics.as_deref())
            .unwrap_or("memory");
        let metric = Metric::from_token(metric_token).ok_or_else(|| {
            DashboardError::config(format!(
                "invalid metric '{metric_token}', expected one of memory, cpu, disk"
            ))
        })?;

        let sort_token = self
            .sort_by
            .as_deref()
            .or(defaults.sort_by.as_deref())
            .unwrap_or("name");
        let field = SortField::from_token(sort_token).ok_or_else(|| {
            DashboardError::config(format!(
                "invalid sort field '{sort_token}', expected one of name, free, capacity, usage, namespace, request, limit"
            ))
        })?;
        if field.pod_only() && view == View::Nodes {
            return Err(DashboardError::config(format!(
                "sort field '{sort_token}' is only available with --pods"
            )));
        }

        let filter = parse_filter(
            self.filter_nodes.as_deref(),
            self.filter_label.as_deref(),
            self.filter_color.as_deref(),
        )?;

        let label = self
            .label
            .as_deref()
            .or(defaults.label.as_deref())
            .map(parse_label_display)
            .transpose()?;

        let refresh_ms = self.refresh_ms.unwrap_or(match view {
            View::Nodes => defaults.node_refresh_ms.unwrap_or(DEFAULT_NODE_REFRESH_MS),
            View::Pods => defaults.pod_refresh_ms.unwrap_or(DEFAULT_POD_REFRESH_MS),
        });
        if refresh_ms < MIN_REFRESH_MS {
            return Err(DashboardError::config(format!(
                "refresh interval must be at least {MIN_REFRESH_MS} ms, got {refresh_ms}"
            )));
        }

        let collection_timeout_secs = self
            .timeout_secs
            .or(defaults.collection_timeout_secs)
            .unwrap_or(DEFAULT_COLLECTION_TIMEOUT_SECS);
        if collection_timeout_secs == 0 {
            return Err(DashboardError::config("collection timeout must be positive"));
        }

        let log_filter = if self.debug {
            "debug".to_string()
        } else {
            self.log_filter
        };

        Ok(Options {
            view,
            metric,
            sort: SortSpec {
                field,
                reverse: self.desc,
            },
            filter,
            label,
            no_info: self.no_info || defaults.no_info.unwrap_or(false),
            debug: self.debug,
            refresh_ms,
            collection_timeout_secs,
            kubeconfig: self.kubeconfig,
            log_filter,
            log_file: self.log_file,
        })
    }
}

fn parse_filter(
    names: Option<&str>,
    labels: Option<&str>,
    color: Option<&str>,
) -> Result<FilterCriteria, DashboardError> {
    let set = |value: Option<&str>| value.is_some_and(|value| !value.trim().is_empty());
    let active = [set(names), set(labels), set(color)]
        .into_iter()
        .filter(|active| *active)
        .count();
    if active > 1 {
        return Err(DashboardError::config(
            "only one of --filternodes, --filterlabel, --filtercolor can be used at a time",
        ));
    }

    if let Some(raw) = labels.filter(|_| set(labels)) {
        return parse_label_filter(raw).map(FilterCriteria::Label);
    }
    if let Some(raw) = names.filter(|_| set(names)) {
        return parse_name_filter(raw).map(FilterCriteria::Name);
    }
    if let Some(raw) = color.filter(|_| set(color)) {
        let band = ColorBand::from_token(raw).ok_or_else(|| {
            DashboardError::config(format!(
                "invalid color '{raw}', expected one of green, orange, red"
            ))
        })?;
        return Ok(FilterCriteria::Color(band));
    }
    Ok(FilterCriteria::None)
}

fn parse_name_filter(raw: &str) -> Result<Vec<Regex>, DashboardError> {
    let patterns = raw
        .split(',')
        .map(str::trim)
        .filter(|pattern| !pattern.is_empty())
        .map(|pattern| {
            Regex::new(pattern).map_err(|error| {
                DashboardError::config(format!("invalid name pattern '{pattern}': {error}"))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    if patterns.is_empty() {
        return Err(DashboardError::config(format!(
            "name filter '{raw}' has no patterns"
        )));
    }
    Ok(patterns)
}

fn parse_label_filter(raw: &str) -> Result<Vec<LabelRequirement>, DashboardError> {
    let requirements = raw
        .split(',')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').ok_or_else(|| {
                DashboardError::config(format!("label filter '{pair}' must look like key=value"))
            })?;
            let (key, value) = (key.trim(), value.trim());
            if key.is_empty() || value.is_empty() {
                return Err(DashboardError::config(format!(
                    "label filter '{pair}' has an empty key or value"
                )));
            }
            Ok(LabelRequirement {
                key: key.to_string(),
                value: value.to_string(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    if requirements.is_empty() {
        return Err(DashboardError::config(format!(
            "label filter '{raw}' has no key=value pairs"
        )));
    }
    Ok(requirements)
}

fn parse_label_display(raw: &str) -> Result<LabelDisplay, DashboardError> {
    let (key, alias) = match raw.split_once('#') {
        Some((key, alias)) => (key.trim(), alias.trim()),
        None => (raw.trim(), ""),
    };
    if key.is_empty() {
        return Err(DashboardError::config(format!(
            "label '{raw}' must name a label key"
        )));
    }
    let alias = if alias.is_empty() {
        DEFAULT_LABEL_ALIAS
    } else {
        alias
    };
    Ok(LabelDisplay {
        key: key.to_string(),
        alias: alias.to_string(),
    })
}
