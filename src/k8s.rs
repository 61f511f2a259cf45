use anyhow::{Context, Result};
use futures::future::join_all;
use k8s_openapi::api::core::v1::{Node, Pod};
use kube::api::ListParams;
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::core::{ApiResource, DynamicObject, GroupVersionKind};
use kube::{Api, Client, Config, ResourceExt};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt::Display;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::error::DashboardError;
use crate::model::{ClusterIdentity, Metric, NodeStat, PodStat, View};
use crate::stats::{UsageSample, assemble_nodes, assemble_pods};

#[derive(Debug, Clone)]
pub enum Snapshot {
    Nodes(Vec<NodeStat>),
    Pods(Vec<PodStat>),
}

impl Snapshot {
    pub fn count(&self) -> usize {
        match self {
            Self::Nodes(nodes) => nodes.len(),
            Self::Pods(pods) => pods.len(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct StatsSummary {
    node: SummaryNode,
}

#[derive(Debug, Deserialize)]
struct SummaryNode {
    fs: Option<FsStats>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FsStats {
    used_bytes: Option<u64>,
}

#[derive(Clone)]
pub struct KubeGateway {
    client: Client,
    identity: ClusterIdentity,
}

impl KubeGateway {
    pub async fn connect(kubeconfig_path: Option<&Path>) -> Result<Self> {
        let kubeconfig = match kubeconfig_path {
            Some(path) => Some(Kubeconfig::read_from(path).map_err(|error| {
                DashboardError::config(format!(
                    "failed to read kubeconfig {}: {error}",
                    path.display()
                ))
            })?),
            None => Kubeconfig::read().ok(),
        };
        let context = kubeconfig
            .as_ref()
            .and_then(|config| config.current_context.clone())
            .unwrap_or_else(|| "in-cluster".to_string());

        let config = match kubeconfig {
            Some(kubeconfig) => Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
                .await
                .map_err(|error| {
                    DashboardError::config(format!("invalid kubeconfig context '{context}': {error}"))
                })?,
            None => Config::infer().await.map_err(|error| {
                DashboardError::config(format!("failed to infer Kubernetes configuration: {error}"))
            })?,
        };

        let endpoint_url = config.cluster_url.to_string();
        let client = Client::try_from(config).context("failed to initialize Kubernetes client")?;

        let version = client.apiserver_version().await.map_err(|error| {
            DashboardError::Connectivity {
                context: context.clone(),
                url: endpoint_url.clone(),
                reason: error.to_string(),
            }
        })?;

        info!(%context, url = %endpoint_url, version = %version.git_version, "connected to cluster");
        Ok(Self {
            client,
            identity: ClusterIdentity {
                context,
                api_version: version.git_version,
                endpoint_url,
            },
        })
    }

    pub fn identity(&self) -> &ClusterIdentity {
        &self.identity
    }

    pub async fn collect(&self, view: View, metric: Metric, label: Option<&str>) -> Result<Snapshot> {
        match view {
            View::Nodes => Ok(Snapshot::Nodes(self.collect_nodes(metric, label).await?)),
            View::Pods => Ok(Snapshot::Pods(self.collect_pods(label).await?)),
        }
    }

    async fn collect_nodes(&self, metric: Metric, label: Option<&str>) -> Result<Vec<NodeStat>> {
        let nodes = self.list_nodes().await?;
        let pods = self.list_pods().await?;
        let usage = self.node_usage().await?;

        let mut kubelet_disk = HashMap::new();
        if metric == Metric::Disk {
            let names = nodes
                .iter()
                .map(ResourceExt::name_any)
                .filter(|name| usage.contains_key(name))
                .collect::<Vec<_>>();
            let summaries = join_all(names.iter().map(|name| self.kubelet_disk_kib(name))).await;
            for (name, kib) in names.into_iter().zip(summaries) {
                if let Some(kib) = kib {
                    kubelet_disk.insert(name, kib);
                }
            }
        }

        let now = k8s_openapi::jiff::Timestamp::now().as_second();
        let stats = assemble_nodes(&nodes, &pods, &usage, &kubelet_disk, metric, label, now);
        info!(nodes = stats.len(), listed = nodes.len(), %metric, "node stats collected");
        Ok(stats)
    }

    async fn collect_pods(&self, label: Option<&str>) -> Result<Vec<PodStat>> {
        let nodes = self.list_nodes().await?;
        let pods = self.list_pods().await?;
        let usage = self.pod_usage().await?;

        let stats = assemble_pods(&nodes, &pods, &usage, label);
        info!(pods = stats.len(), listed = pods.len(), "pod stats collected");
        Ok(stats)
    }

    async fn list_nodes(&self) -> Result<Vec<Node>> {
        let api: Api<Node> = Api::all(self.client.clone());
        let list = api
            .list(&list_params())
            .await
            .map_err(|error| self.unreachable(format!("failed to list nodes: {error}")))?;
        Ok(list.items)
    }

    async fn list_pods(&self) -> Result<Vec<Pod>> {
        let api: Api<Pod> = Api::all(self.client.clone());
        let list = api
            .list(&list_params())
            .await
            .map_err(|error| self.unreachable(format!("failed to list pods: {error}")))?;
        Ok(list.items)
    }

    async fn node_usage(&self) -> Result<HashMap<String, UsageSample>> {
        let gvk = GroupVersionKind::gvk("metrics.k8s.io", "v1beta1", "NodeMetrics");
        let resource = ApiResource::from_gvk_with_plural(&gvk, "nodes");
        let api: Api<DynamicObject> = Api::all_with(self.client.clone(), &resource);
        let metrics = api
            .list(&list_params())
            .await
            .map_err(|error| self.unreachable(format!("metrics API unavailable: {error}")))?;

        let mut usage = HashMap::with_capacity(metrics.items.len());
        for metric in metrics {
            let name = metric.name_any();
            match UsageSample::from_usage(&metric.data["usage"]) {
                Ok(sample) => {
                    usage.insert(name, sample);
                }
                Err(error) => warn!(node = %name, %error, "skipping unreadable node metrics"),
            }
        }
        Ok(usage)
    }

    async fn pod_usage(&self) -> Result<HashMap<(String, String), UsageSample>> {
        let gvk = GroupVersionKind::gvk("metrics.k8s.io", "v1beta1", "PodMetrics");
        let resource = ApiResource::from_gvk_with_plural(&gvk, "pods");
        let api: Api<DynamicObject> = Api::all_with(self.client.clone(), &resource);
        let metrics = api
            .list(&list_params())
            .await
            .map_err(|error| self.unreachable(format!("metrics API unavailable: {error}")))?;

        let mut usage = HashMap::with_capacity(metrics.items.len());
        for metric in metrics {
            let name = metric.name_any();
            let namespace = metric.namespace().unwrap_or_default();
            match UsageSample::from_pod_metrics(&metric.data) {
                Ok(sample) => {
                    usage.insert((namespace, name), sample);
                }
                Err(error) => warn!(%namespace, pod = %name, %error, "skipping unreadable pod metrics"),
            }
        }
        Ok(usage)
    }

    async fn kubelet_disk_kib(&self, node: &str) -> Option<f64> {
        match self.stats_summary(node).await {
            Ok(summary) => summary
                .node
                .fs
                .and_then(|fs| fs.used_bytes)
                .map(|bytes| bytes as f64 / 1_024.0),
            Err(error) => {
                debug!(%node, error = %format!("{error:#}"), "kubelet stats summary unavailable");
                None
            }
        }
    }

    async fn stats_summary(&self, node: &str) -> Result<StatsSummary> {
        let request = http::Request::get(format!("/api/v1/nodes/{node}/proxy/stats/summary"))
            .body(Vec::new())
            .context("failed to build stats summary request")?;
        self.client
            .request::<StatsSummary>(request)
            .await
            .with_context(|| format!("stats summary request for node {node} failed"))
    }

    fn unreachable(&self, reason: impl Display) -> DashboardError {
        DashboardError::Connectivity {
            context: self.identity.context.clone(),
            url: self.identity.endpoint_url.clone(),
            reason: reason.to_string(),
        }
    }
}

fn list_params() -> ListParams {
    ListParams::default()
}

#[cfg(test)]
mod tests {
    use super::{Snapshot, StatsSummary};

    #[test]
    fn stats_summary_reads_root_fs_usage() {
        let body = r#"{
            "node": {
                "nodeName": "worker-1",
                "fs": {"availableBytes": 100, "capacityBytes": 300, "usedBytes": 2048},
                "runtime": {}
            },
            "pods": []
        }"#;
        let summary: StatsSummary = serde_json::from_str(body).unwrap();
        let used = summary.node.fs.and_then(|fs| fs.used_bytes);
        assert_eq!(used, Some(2_048));
    }

    #[test]
    fn stats_summary_tolerates_missing_fs() {
        let summary: StatsSummary = serde_json::from_str(r#"{"node": {}}"#).unwrap();
        assert!(summary.node.fs.is_none());
    }

    #[test]
    fn empty_snapshot_count() {
        assert_eq!(Snapshot::Nodes(Vec::new()).count(), 0);
        assert_eq!(Snapshot::Pods(Vec::new()).count(), 0);
    }
}
