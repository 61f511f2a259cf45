use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

pub const LABEL_NOT_FOUND: &str = "Not Found";

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Memory,
    Cpu,
    Disk,
}

impl Metric {
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "memory" | "mem" => Some(Self::Memory),
            "cpu" => Some(Self::Cpu),
            "disk" | "storage" => Some(Self::Disk),
            _ => None,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Memory => "Memory",
            Self::Cpu => "Cpu",
            Self::Disk => "Disk",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Self::Memory => "MB",
            Self::Cpu => "Cores",
            Self::Disk => "GB",
        }
    }
}

impl Display for Metric {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.title().to_ascii_lowercase())
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    Name,
    Free,
    Capacity,
    Usage,
    Namespace,
    Request,
    Limit,
}

impl SortField {
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "name" | "node" | "pod" => Some(Self::Name),
            "free" => Some(Self::Free),
            "capacity" | "max" => Some(Self::Capacity),
            "usage" | "color" => Some(Self::Usage),
            "namespace" | "ns" => Some(Self::Namespace),
            "request" => Some(Self::Request),
            "limit" => Some(Self::Limit),
            _ => None,
        }
    }

    pub fn pod_only(self) -> bool {
        matches!(self, Self::Namespace | Self::Request | Self::Limit)
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
pub struct SortSpec {
    pub field: SortField,
    pub reverse: bool,
}

impl Default for SortSpec {
    fn default() -> Self {
        Self {
            field: SortField::Name,
            reverse: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorBand {
    Green,
    Orange,
    Red,
}

impl ColorBand {
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "green" => Some(Self::Green),
            "orange" | "yellow" => Some(Self::Orange),
            "red" => Some(Self::Red),
            _ => None,
        }
    }

    pub fn for_percent(percent: f64) -> Self {
        if percent < 30.0 {
            Self::Green
        } else if percent < 70.0 {
            Self::Orange
        } else {
            Self::Red
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Green => "green",
            Self::Orange => "orange",
            Self::Red => "red",
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct LabelRequirement {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum FilterCriteria {
    #[default]
    None,
    Name(#[serde(serialize_with = "serialize_patterns")] Vec<Regex>),
    Label(Vec<LabelRequirement>),
    Color(ColorBand),
}

impl FilterCriteria {
    pub fn describe(&self) -> String {
        match self {
            Self::None => "-".to_string(),
            Self::Name(patterns) => patterns
                .iter()
                .map(Regex::as_str)
                .collect::<Vec<_>>()
                .join(","),
            Self::Label(requirements) => requirements
                .iter()
                .map(|requirement| format!("{}={}", requirement.key, requirement.value))
                .collect::<Vec<_>>()
                .join(","),
            Self::Color(band) => band.label().to_string(),
        }
    }
}

fn serialize_patterns<S>(patterns: &[Regex], serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.collect_seq(patterns.iter().map(Regex::as_str))
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    Nodes,
    Pods,
}

impl View {
    pub fn entity(self) -> &'static str {
        match self {
            Self::Nodes => "nodes",
            Self::Pods => "pods",
        }
    }
}

#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize)]
pub struct ClusterIdentity {
    pub context: String,
    pub api_version: String,
    pub endpoint_url: String,
}

// Usage percentage; `Unknown` when the capacity it is measured against is zero.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Percent {
    Known(f64),
    #[default]
    Unknown,
}

impl Percent {
    pub fn of(usage: f64, capacity: f64) -> Self {
        if capacity > 0.0 && usage.is_finite() {
            Self::Known(usage / capacity * 100.0)
        } else {
            Self::Unknown
        }
    }

    pub fn value(self) -> f64 {
        match self {
            Self::Known(value) => value,
            Self::Unknown => 0.0,
        }
    }

    pub fn band(self) -> ColorBand {
        ColorBand::for_percent(self.value())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ResourceFigures {
    pub capacity: f64,
    pub usage: f64,
    // `capacity - usage`; negative when sampling skew reports usage above capacity.
    pub free: f64,
    pub percent: Percent,
}

impl ResourceFigures {
    pub fn derive(capacity: f64, usage: f64) -> Self {
        Self {
            capacity,
            usage,
            free: capacity - usage,
            percent: Percent::of(usage, capacity),
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum NodeStatus {
    Ready,
    NotReady,
}

impl NodeStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Ready => "Ready",
            Self::NotReady => "NotReady",
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub enum DiskSource {
    #[default]
    NotCollected,
    KubeletSummary,
    MetricsApi,
    Estimated,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeStat {
    pub name: String,
    pub cpu: ResourceFigures,
    pub memory: ResourceFigures,
    pub disk: ResourceFigures,
    pub disk_source: DiskSource,
    pub total_pods: usize,
    pub uptime: String,
    pub status: NodeStatus,
    pub labels: BTreeMap<String, String>,
    pub label_value: Option<String>,
}

impl NodeStat {
    pub fn figures(&self, metric: Metric) -> &ResourceFigures {
        match metric {
            Metric::Cpu => &self.cpu,
            Metric::Memory => &self.memory,
            Metric::Disk => &self.disk,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PodResources {
    pub cpu_cores: f64,
    pub memory_mib: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PodStat {
    pub name: String,
    pub namespace: String,
    pub node_name: String,
    pub status: String,
    pub usage: PodResources,
    pub request: PodResources,
    pub limit: PodResources,
    pub node_cpu_millis: f64,
    pub node_memory_mib: f64,
    pub disk_usage_kib: f64,
    pub node_disk_kib: f64,
    pub cpu_percent: Percent,
    pub memory_percent: Percent,
    pub disk_percent: Percent,
    pub labels: BTreeMap<String, String>,
    pub label_value: Option<String>,
}

impl PodStat {
    pub fn percent(&self, metric: Metric) -> Percent {
        match metric {
            Metric::Cpu => self.cpu_percent,
            Metric::Memory => self.memory_percent,
            Metric::Disk => self.disk_percent,
        }
    }
}
