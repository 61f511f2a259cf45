use k8s_openapi::api::core::v1::{Node, Pod};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity as KubeQuantity;
use kube::ResourceExt;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

use crate::model::{
    DiskSource, LABEL_NOT_FOUND, Metric, NodeStat, NodeStatus, PodResources, PodStat, Percent,
    ResourceFigures,
};
use crate::quantity::{Quantity, QuantityError};

const RESTART_DISK_KIB: f64 = 10.0 * 1_024.0;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct UsageSample {
    pub cpu_millis: f64,
    pub memory_kib: f64,
    pub disk_kib: Option<f64>,
}

impl UsageSample {
    pub fn from_usage(value: &Value) -> Result<Self, QuantityError> {
        let cpu_millis = optional_quantity(value.get("cpu"))?
            .map(|quantity| quantity.millicores())
            .unwrap_or(0.0);
        let memory_kib = optional_quantity(value.get("memory"))?
            .map(|quantity| quantity.kib().round())
            .unwrap_or(0.0);
        let disk_kib = optional_quantity(value.get("ephemeral-storage"))?
            .map(|quantity| quantity.kib().round());

        Ok(Self {
            cpu_millis,
            memory_kib,
            disk_kib,
        })
    }

    pub fn from_pod_metrics(data: &Value) -> Result<Self, QuantityError> {
        let Some(containers) = data.get("containers").and_then(Value::as_array) else {
            return Ok(Self::default());
        };

        containers.iter().try_fold(Self::default(), |total, container| {
            let usage = container
                .get("usage")
                .map(Self::from_usage)
                .transpose()?
                .unwrap_or_default();
            Ok(Self {
                cpu_millis: total.cpu_millis + usage.cpu_millis,
                memory_kib: total.memory_kib + usage.memory_kib,
                disk_kib: match (total.disk_kib, usage.disk_kib) {
                    (None, None) => None,
                    (left, right) => Some(left.unwrap_or(0.0) + right.unwrap_or(0.0)),
                },
            })
        })
    }
}

fn optional_quantity(value: Option<&Value>) -> Result<Option<Quantity>, QuantityError> {
    value
        .and_then(Value::as_str)
        .map(str::parse::<Quantity>)
        .transpose()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiskUsage {
    pub kib: f64,
    pub source: DiskSource,
}

pub fn resolve_disk_usage(
    kubelet_kib: Option<f64>,
    metrics_kib: Option<f64>,
    pods_on_node: &[&Pod],
) -> Result<DiskUsage, QuantityError> {
    if let Some(kib) = kubelet_kib {
        return Ok(DiskUsage {
            kib,
            source: DiskSource::KubeletSummary,
        });
    }

    match metrics_kib {
        Some(kib) if kib > 0.0 => Ok(DiskUsage {
            kib,
            source: DiskSource::MetricsApi,
        }),
        _ => Ok(DiskUsage {
            kib: estimate_disk_usage_kib(pods_on_node)?,
            source: DiskSource::Estimated,
        }),
    }
}

// Best-effort guess: 10 MiB per container restart plus half of every
// declared emptyDir size limit. Not a measurement.
pub fn estimate_disk_usage_kib(pods: &[&Pod]) -> Result<f64, QuantityError> {
    let mut total = 0.0;
    for pod in pods {
        let restarts = pod
            .status
            .as_ref()
            .and_then(|status| status.container_statuses.as_ref())
            .map(|statuses| {
                statuses
                    .iter()
                    .map(|container| f64::from(container.restart_count.max(0)))
                    .sum::<f64>()
            })
            .unwrap_or(0.0);
        total += restarts * RESTART_DISK_KIB;

        let volumes = pod
            .spec
            .as_ref()
            .and_then(|spec| spec.volumes.as_ref())
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        for limit in volumes
            .iter()
            .filter_map(|volume| volume.empty_dir.as_ref())
            .filter_map(|empty_dir| empty_dir.size_limit.as_ref())
        {
            total += parse_kube_quantity(limit)?.kib() / 2.0;
        }
    }
    Ok(total)
}

pub fn node_stat(
    node: &Node,
    sample: &UsageSample,
    pods_on_node: &[&Pod],
    disk: Option<DiskUsage>,
    label: Option<&str>,
    now_seconds: i64,
) -> Result<NodeStat, QuantityError> {
    let capacity = node
        .status
        .as_ref()
        .and_then(|status| status.capacity.as_ref());
    let cpu_capacity = capacity_of(capacity, "cpu")?
        .map(|quantity| quantity.millicores().round())
        .unwrap_or(0.0);
    let memory_capacity = capacity_of(capacity, "memory")?
        .map(|quantity| quantity.kib().round())
        .unwrap_or(0.0);

    let (disk, disk_source) = match disk {
        Some(usage) => {
            let disk_capacity = capacity_of(capacity, "ephemeral-storage")?
                .map(|quantity| quantity.kib().round())
                .unwrap_or(0.0);
            (
                ResourceFigures::derive(disk_capacity, usage.kib),
                usage.source,
            )
        }
        None => (ResourceFigures::default(), DiskSource::NotCollected),
    };

    let labels = node.metadata.labels.clone().unwrap_or_default();
    let created = node
        .metadata
        .creation_timestamp
        .as_ref()
        .map(|time| time.0.as_second())
        .unwrap_or(now_seconds);

    Ok(NodeStat {
        name: node.metadata.name.clone().unwrap_or_default(),
        cpu: ResourceFigures::derive(cpu_capacity, sample.cpu_millis),
        memory: ResourceFigures::derive(memory_capacity, sample.memory_kib),
        disk,
        disk_source,
        total_pods: pods_on_node.len(),
        uptime: format_uptime(now_seconds - created),
        status: node_status(node),
        label_value: label_value(&labels, label),
        labels,
    })
}

pub fn pod_stat(
    pod: &Pod,
    sample: &UsageSample,
    host: Option<&Node>,
    label: Option<&str>,
) -> Result<PodStat, QuantityError> {
    let mut request = PodResources::default();
    let mut limit = PodResources::default();
    let containers = pod
        .spec
        .as_ref()
        .map(|spec| spec.containers.as_slice())
        .unwrap_or(&[]);
    for resources in containers
        .iter()
        .filter_map(|container| container.resources.as_ref())
    {
        add_resources(&mut request, resources.requests.as_ref())?;
        add_resources(&mut limit, resources.limits.as_ref())?;
    }

    let host_capacity = host
        .and_then(|node| node.status.as_ref())
        .and_then(|status| status.capacity.as_ref());
    let node_cpu_millis = capacity_of(host_capacity, "cpu")?
        .map(|quantity| quantity.millicores().round())
        .unwrap_or(0.0);
    let node_memory_mib = capacity_of(host_capacity, "memory")?
        .map(|quantity| quantity.mib())
        .unwrap_or(0.0);
    let node_disk_kib = capacity_of(host_capacity, "ephemeral-storage")?
        .map(|quantity| quantity.kib().round())
        .unwrap_or(0.0);

    let usage = PodResources {
        cpu_cores: sample.cpu_millis / 1_000.0,
        memory_mib: sample.memory_kib / 1_024.0,
    };
    let disk_usage_kib = sample.disk_kib.unwrap_or(0.0);

    let cpu_percent = if limit.cpu_cores > 0.0 {
        Percent::of(usage.cpu_cores, limit.cpu_cores)
    } else {
        Percent::of(usage.cpu_cores, node_cpu_millis / 1_000.0)
    };
    let memory_percent = if limit.memory_mib > 0.0 {
        Percent::of(usage.memory_mib, limit.memory_mib)
    } else {
        Percent::of(usage.memory_mib, node_memory_mib)
    };

    let labels = pod.metadata.labels.clone().unwrap_or_default();

    Ok(PodStat {
        name: pod.metadata.name.clone().unwrap_or_default(),
        namespace: pod.metadata.namespace.clone().unwrap_or_default(),
        node_name: pod
            .spec
            .as_ref()
            .and_then(|spec| spec.node_name.clone())
            .unwrap_or_default(),
        status: pod
            .status
            .as_ref()
            .and_then(|status| status.phase.clone())
            .unwrap_or_else(|| "Unknown".to_string()),
        usage,
        request,
        limit,
        node_cpu_millis,
        node_memory_mib,
        disk_usage_kib,
        node_disk_kib,
        cpu_percent,
        memory_percent,
        disk_percent: Percent::of(disk_usage_kib, node_disk_kib),
        label_value: label_value(&labels, label),
        labels,
    })
}

// Joins listed nodes with their metrics samples and builds every node that can be read.
// Nodes without a sample are left out; nodes with unreadable quantities are skipped.
pub fn assemble_nodes(
    nodes: &[Node],
    pods: &[Pod],
    usage: &HashMap<String, UsageSample>,
    kubelet_disk_kib: &HashMap<String, f64>,
    metric: Metric,
    label: Option<&str>,
    now_seconds: i64,
) -> Vec<NodeStat> {
    let mut pods_by_node: HashMap<&str, Vec<&Pod>> = HashMap::new();
    for pod in pods {
        if let Some(node_name) = pod.spec.as_ref().and_then(|spec| spec.node_name.as_deref()) {
            pods_by_node.entry(node_name).or_default().push(pod);
        }
    }

    let mut stats = Vec::with_capacity(nodes.len());
    for node in nodes {
        let name = node.name_any();
        let Some(sample) = usage.get(&name) else {
            debug!(node = %name, "no metrics reported, skipping");
            continue;
        };
        let on_node = pods_by_node
            .get(name.as_str())
            .map(Vec::as_slice)
            .unwrap_or(&[]);

        let disk = if metric == Metric::Disk {
            let kubelet = kubelet_disk_kib.get(&name).copied();
            match resolve_disk_usage(kubelet, sample.disk_kib, on_node) {
                Ok(disk) => Some(disk),
                Err(error) => {
                    warn!(node = %name, %error, "skipping node with unreadable volume limits");
                    continue;
                }
            }
        } else {
            None
        };

        match node_stat(node, sample, on_node, disk, label, now_seconds) {
            Ok(stat) => {
                debug!(
                    node = %stat.name,
                    pods = stat.total_pods,
                    status = stat.status.label(),
                    "node processed"
                );
                stats.push(stat);
            }
            Err(error) => warn!(node = %name, %error, "skipping node with unreadable capacity"),
        }
    }
    stats
}

pub fn assemble_pods(
    nodes: &[Node],
    pods: &[Pod],
    usage: &HashMap<(String, String), UsageSample>,
    label: Option<&str>,
) -> Vec<PodStat> {
    let nodes_by_name = nodes
        .iter()
        .map(|node| (node.name_any(), node))
        .collect::<HashMap<_, _>>();

    let mut stats = Vec::with_capacity(pods.len());
    for pod in pods {
        let name = pod.name_any();
        let namespace = pod.namespace().unwrap_or_default();
        let Some(sample) = usage.get(&(namespace.clone(), name.clone())) else {
            debug!(%namespace, pod = %name, "no metrics reported, skipping");
            continue;
        };
        let host = pod
            .spec
            .as_ref()
            .and_then(|spec| spec.node_name.as_ref())
            .and_then(|node_name| nodes_by_name.get(node_name))
            .copied();

        match pod_stat(pod, sample, host, label) {
            Ok(stat) => {
                debug!(
                    %namespace,
                    pod = %stat.name,
                    node = %stat.node_name,
                    phase = %stat.status,
                    "pod processed"
                );
                stats.push(stat);
            }
            Err(error) => warn!(%namespace, pod = %name, %error, "skipping pod with unreadable resources"),
        }
    }
    stats
}

pub fn label_value(labels: &BTreeMap<String, String>, label: Option<&str>) -> Option<String> {
    label.map(|key| {
        labels
            .get(key)
            .cloned()
            .unwrap_or_else(|| LABEL_NOT_FOUND.to_string())
    })
}

pub fn node_status(node: &Node) -> NodeStatus {
    let ready = node
        .status
        .as_ref()
        .and_then(|status| status.conditions.as_ref())
        .and_then(|conditions| {
            conditions
                .iter()
                .find(|condition| condition.type_ == "Ready")
        })
        .is_some_and(|condition| condition.status == "True");
    if ready {
        NodeStatus::Ready
    } else {
        NodeStatus::NotReady
    }
}

pub fn format_uptime(seconds: i64) -> String {
    let seconds = seconds.max(0);
    if seconds > 86_400 {
        format!("{}d", seconds / 86_400)
    } else if seconds >= 3_600 {
        format!("{}h", seconds / 3_600)
    } else {
        format!("{}m", seconds / 60)
    }
}

fn capacity_of(
    capacity: Option<&BTreeMap<String, KubeQuantity>>,
    key: &str,
) -> Result<Option<Quantity>, QuantityError> {
    capacity
        .and_then(|values| values.get(key))
        .map(parse_kube_quantity)
        .transpose()
}

fn add_resources(
    total: &mut PodResources,
    values: Option<&BTreeMap<String, KubeQuantity>>,
) -> Result<(), QuantityError> {
    let Some(values) = values else {
        return Ok(());
    };
    if let Some(cpu) = values.get("cpu") {
        total.cpu_cores += parse_kube_quantity(cpu)?.base();
    }
    if let Some(memory) = values.get("memory") {
        total.memory_mib += parse_kube_quantity(memory)?.mib();
    }
    Ok(())
}

fn parse_kube_quantity(quantity: &KubeQuantity) -> Result<Quantity, QuantityError> {
    quantity.0.parse()
}


#[cfg(test)]
mod tests {
    use super::fixtures::{node, pod, with_empty_dir, with_limits, with_restarts};
    use super::{
        DiskUsage, UsageSample, assemble_nodes, assemble_pods, estimate_disk_usage_kib,
        format_uptime, node_stat, pod_stat, resolve_disk_usage,
    };
    use crate::model::{DiskSource, LABEL_NOT_FOUND, Metric, NodeStatus, Percent};
    use serde_json::json;
    use std::collections::HashMap;

    fn sample(memory_kib: f64) -> UsageSample {
        UsageSample {
            cpu_millis: 100.0,
            memory_kib,
            disk_kib: None,
        }
    }

    #[test]
    fn nodes_without_metrics_are_left_out() {
        let nodes = [
            node("worker-1", "2", "1Gi", "10Gi", true),
            node("worker-2", "2", "1Gi", "10Gi", true),
        ];
        let usage = HashMap::from([("worker-1".to_string(), sample(1_024.0))]);

        let stats = assemble_nodes(&nodes, &[], &usage, &HashMap::new(), Metric::Memory, None, 0);
        let names = stats.iter().map(|stat| stat.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, ["worker-1"]);
    }

    #[test]
    fn unreadable_node_is_skipped_and_siblings_survive() {
        let nodes = [
            node("worker-1", "2", "1Gi", "10Gi", true),
            node("broken", "four", "1Gi", "10Gi", true),
            node("worker-3", "4", "2Gi", "10Gi", false),
        ];
        let usage = nodes
            .iter()
            .map(|node| (node.metadata.name.clone().unwrap_or_default(), sample(512.0)))
            .collect::<HashMap<_, _>>();

        let stats = assemble_nodes(&nodes, &[], &usage, &HashMap::new(), Metric::Cpu, None, 0);
        let names = stats.iter().map(|stat| stat.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, ["worker-1", "worker-3"]);
    }

    #[test]
    fn pod_counts_follow_node_assignment() {
        let nodes = [
            node("worker-1", "2", "1Gi", "10Gi", true),
            node("worker-2", "2", "1Gi", "10Gi", true),
        ];
        let pods = [
            pod("api-0", "default", "worker-1"),
            pod("api-1", "default", "worker-1"),
            pod("db-0", "data", "worker-2"),
            pod("batch-0", "jobs", "elsewhere"),
        ];
        let usage = HashMap::from([
            ("worker-1".to_string(), sample(1.0)),
            ("worker-2".to_string(), sample(1.0)),
        ]);

        let stats = assemble_nodes(&nodes, &pods, &usage, &HashMap::new(), Metric::Memory, None, 0);
        let counts = stats
            .iter()
            .map(|stat| (stat.name.as_str(), stat.total_pods))
            .collect::<Vec<_>>();
        assert_eq!(counts, [("worker-1", 2), ("worker-2", 1)]);
    }

    #[test]
    fn disk_assembly_uses_kubelet_figure_when_present() {
        let nodes = [
            node("worker-1", "2", "1Gi", "10Gi", true),
            node("worker-2", "2", "1Gi", "10Gi", true),
        ];
        let pods = [with_restarts(pod("api-0", "default", "worker-2"), 2)];
        let usage = HashMap::from([
            ("worker-1".to_string(), sample(1.0)),
            ("worker-2".to_string(), sample(1.0)),
        ]);
        let kubelet = HashMap::from([("worker-1".to_string(), 4_096.0)]);

        let stats = assemble_nodes(&nodes, &pods, &usage, &kubelet, Metric::Disk, None, 0);
        assert_eq!(stats[0].disk_source, DiskSource::KubeletSummary);
        assert_eq!(stats[0].disk.usage, 4_096.0);
        assert_eq!(stats[1].disk_source, DiskSource::Estimated);
        assert_eq!(stats[1].disk.usage, 2.0 * 10_240.0);
    }

    #[test]
    fn pods_join_on_namespace_and_name() {
        let nodes = [node("worker-1", "2", "1Gi", "10Gi", true)];
        let pods = [
            pod("api-0", "default", "worker-1"),
            pod("api-0", "staging", "worker-1"),
            with_limits(pod("odd", "default", "worker-1"), "lots", "1Gi"),
        ];
        let usage = HashMap::from([
            (("staging".to_string(), "api-0".to_string()), sample(2_048.0)),
            (("default".to_string(), "odd".to_string()), sample(2_048.0)),
        ]);

        let stats = assemble_pods(&nodes, &pods, &usage, None);
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].namespace, "staging");
        assert_eq!(stats[0].node_cpu_millis, 2_000.0);
    }

    #[test]
    fn half_used_memory_node() {
        let node = node("nodeA", "4", "1048576Ki", "100Gi", true);
        let sample = UsageSample {
            cpu_millis: 1_000.0,
            memory_kib: 524_288.0,
            disk_kib: None,
        };

        let stat = node_stat(&node, &sample, &[], None, None, 0).unwrap();
        assert_eq!(stat.memory.percent, Percent::Known(50.0));
        assert_eq!(stat.memory.free, 524_288.0);
        assert_eq!(stat.cpu.capacity, 4_000.0);
        assert_eq!(stat.cpu.percent, Percent::Known(25.0));
        assert_eq!(stat.status, NodeStatus::Ready);
        assert_eq!(stat.disk_source, DiskSource::NotCollected);
    }

    #[test]
    fn zero_capacity_yields_unknown_percent() {
        let node = node("nodeZ", "0", "0", "0", false);
        let sample = UsageSample {
            cpu_millis: 5.0,
            memory_kib: 10.0,
            disk_kib: None,
        };
        let stat = node_stat(&node, &sample, &[], None, None, 0).unwrap();
        assert_eq!(stat.memory.percent, Percent::Unknown);
        assert_eq!(stat.cpu.percent, Percent::Unknown);
        assert_eq!(stat.status, NodeStatus::NotReady);
    }

    #[test]
    fn skewed_usage_keeps_negative_free() {
        let node = node("nodeS", "1", "1000Ki", "1Gi", true);
        let sample = UsageSample {
            cpu_millis: 0.0,
            memory_kib: 1_100.0,
            disk_kib: None,
        };
        let stat = node_stat(&node, &sample, &[], None, None, 0).unwrap();
        assert_eq!(stat.memory.free, -100.0);
        assert!(stat.memory.percent.value() > 100.0);
    }

    #[test]
    fn unparsable_capacity_is_an_error() {
        let node = node("nodeB", "four", "1Gi", "1Gi", true);
        let result = node_stat(&node, &UsageSample::default(), &[], None, None, 0);
        assert!(result.is_err());
    }

    #[test]
    fn counts_pods_and_reads_label() {
        let node = node("nodeA", "2", "2Gi", "10Gi", true);
        let first = pod("a", "default", "nodeA");
        let second = pod("b", "default", "nodeA");
        let stat = node_stat(
            &node,
            &UsageSample::default(),
            &[&first, &second],
            None,
            Some("env"),
            0,
        )
        .unwrap();
        assert_eq!(stat.total_pods, 2);
        assert_eq!(stat.label_value.as_deref(), Some("prod"));

        let missing = node_stat(&node, &UsageSample::default(), &[], None, Some("zone"), 0).unwrap();
        assert_eq!(missing.label_value.as_deref(), Some(LABEL_NOT_FOUND));
    }

    #[test]
    fn disk_prefers_kubelet_then_metrics_then_estimate() {
        let restarted = with_restarts(pod("a", "default", "n"), 3);
        let pods = [&restarted];

        let kubelet = resolve_disk_usage(Some(2_048.0), Some(9.0), &pods).unwrap();
        assert_eq!(
            kubelet,
            DiskUsage {
                kib: 2_048.0,
                source: DiskSource::KubeletSummary
            }
        );

        let metrics = resolve_disk_usage(None, Some(9.0), &pods).unwrap();
        assert_eq!(metrics.source, DiskSource::MetricsApi);

        let estimated = resolve_disk_usage(None, Some(0.0), &pods).unwrap();
        assert_eq!(estimated.source, DiskSource::Estimated);
        assert_eq!(estimated.kib, 3.0 * 10_240.0);
    }

    #[test]
    fn estimate_counts_half_of_empty_dir_limits() {
        let scratch = with_empty_dir(pod("a", "default", "n"), "2Gi");
        let kib = estimate_disk_usage_kib(&[&scratch]).unwrap();
        assert_eq!(kib, 1_048_576.0);
    }

    #[test]
    fn disk_figures_use_ephemeral_capacity() {
        let node = node("nodeD", "2", "2Gi", "100Gi", true);
        let usage = DiskUsage {
            kib: 26_214_400.0,
            source: DiskSource::KubeletSummary,
        };
        let stat = node_stat(&node, &UsageSample::default(), &[], Some(usage), None, 0).unwrap();
        assert_eq!(stat.disk.capacity, 104_857_600.0);
        assert_eq!(stat.disk.percent, Percent::Known(25.0));
    }

    #[test]
    fn pod_percent_prefers_limit() {
        let host = node("nodeA", "4", "4Gi", "10Gi", true);
        let limited = with_limits(pod("web", "default", "nodeA"), "500m", "256Mi");
        let sample = UsageSample {
            cpu_millis: 250.0,
            memory_kib: 131_072.0,
            disk_kib: None,
        };
        let stat = pod_stat(&limited, &sample, Some(&host), None).unwrap();
        assert_eq!(stat.limit.cpu_cores, 0.5);
        assert_eq!(stat.limit.memory_mib, 256.0);
        assert_eq!(stat.cpu_percent, Percent::Known(50.0));
        assert_eq!(stat.memory_percent, Percent::Known(50.0));
    }

    #[test]
    fn pod_percent_falls_back_to_node_capacity() {
        let host = node("nodeA", "4", "4Gi", "10Gi", true);
        let unlimited = pod("batch", "jobs", "nodeA");
        let sample = UsageSample {
            cpu_millis: 1_000.0,
            memory_kib: 1_048_576.0,
            disk_kib: None,
        };
        let stat = pod_stat(&unlimited, &sample, Some(&host), None).unwrap();
        assert_eq!(stat.cpu_percent, Percent::Known(25.0));
        assert_eq!(stat.memory_percent, Percent::Known(25.0));
        assert_eq!(stat.node_name, "nodeA");
        assert_eq!(stat.status, "Running");

        let orphan = pod_stat(&unlimited, &sample, None, None).unwrap();
        assert_eq!(orphan.memory_percent, Percent::Unknown);
    }

    #[test]
    fn pod_metrics_sum_containers() {
        let data = json!({
            "containers": [
                {"name": "a", "usage": {"cpu": "270301052n", "memory": "1Mi"}},
                {"name": "b", "usage": {"cpu": "30m", "memory": "1024Ki", "ephemeral-storage": "2Ki"}}
            ]
        });
        let sample = UsageSample::from_pod_metrics(&data).unwrap();
        assert!((sample.cpu_millis - 300.301052).abs() < 1e-6);
        assert_eq!(sample.memory_kib, 2_048.0);
        assert_eq!(sample.disk_kib, Some(2.0));
    }

    #[test]
    fn uptime_buckets() {
        assert_eq!(format_uptime(90_000), "1d");
        assert_eq!(format_uptime(86_400), "24h");
        assert_eq!(format_uptime(3_600), "1h");
        assert_eq!(format_uptime(59 * 60), "59m");
        assert_eq!(format_uptime(-5), "0m");
    }
}
