use regex::Regex;
use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::error::DashboardError;
use crate::model::{FilterCriteria, Metric, NodeStat, Percent, PodStat, SortField, SortSpec};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SortKey<'a> {
    Text(&'a str),
    Number(f64),
}

impl SortKey<'_> {
    fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Text(left), Self::Text(right)) => left.cmp(right),
            (Self::Number(left), Self::Number(right)) => left.total_cmp(right),
            _ => Ordering::Equal,
        }
    }
}

pub trait Entity {
    const KIND: &'static str;

    fn matches_name(&self, pattern: &Regex) -> bool;
    fn labels(&self) -> &BTreeMap<String, String>;
    fn percent(&self, metric: Metric) -> Percent;
    fn sort_key(&self, field: SortField, metric: Metric) -> SortKey<'_>;
}

impl Entity for NodeStat {
    const KIND: &'static str = "nodes";

    fn matches_name(&self, pattern: &Regex) -> bool {
        pattern.is_match(&self.name)
    }

    fn labels(&self) -> &BTreeMap<String, String> {
        &self.labels
    }

    fn percent(&self, metric: Metric) -> Percent {
        self.figures(metric).percent
    }

    fn sort_key(&self, field: SortField, metric: Metric) -> SortKey<'_> {
        let figures = self.figures(metric);
        match field {
            SortField::Free => SortKey::Number(figures.free),
            SortField::Capacity => SortKey::Number(figures.capacity),
            SortField::Usage => SortKey::Number(figures.percent.value()),
            SortField::Name | SortField::Namespace | SortField::Request | SortField::Limit => {
                SortKey::Text(&self.name)
            }
        }
    }
}

impl Entity for PodStat {
    const KIND: &'static str = "pods";

    fn matches_name(&self, pattern: &Regex) -> bool {
        pattern.is_match(&self.name) || pattern.is_match(&self.node_name)
    }

    fn labels(&self) -> &BTreeMap<String, String> {
        &self.labels
    }

    fn percent(&self, metric: Metric) -> Percent {
        PodStat::percent(self, metric)
    }

    fn sort_key(&self, field: SortField, metric: Metric) -> SortKey<'_> {
        match field {
            SortField::Name => SortKey::Text(&self.name),
            SortField::Namespace => SortKey::Text(&self.namespace),
            SortField::Usage => SortKey::Number(PodStat::percent(self, metric).value()),
            SortField::Free => SortKey::Number(pod_free(self, metric)),
            SortField::Capacity => SortKey::Number(pod_capacity(self, metric)),
            SortField::Request => SortKey::Number(match metric {
                Metric::Cpu => self.request.cpu_cores,
                Metric::Memory => self.request.memory_mib,
                Metric::Disk => 0.0,
            }),
            SortField::Limit => SortKey::Number(match metric {
                Metric::Cpu => self.limit.cpu_cores,
                Metric::Memory => self.limit.memory_mib,
                Metric::Disk => 0.0,
            }),
        }
    }
}

fn pod_capacity(pod: &PodStat, metric: Metric) -> f64 {
    match metric {
        Metric::Cpu => pod.node_cpu_millis / 1_000.0,
        Metric::Memory => pod.node_memory_mib,
        Metric::Disk => pod.node_disk_kib,
    }
}

pub fn pod_free(pod: &PodStat, metric: Metric) -> f64 {
    match metric {
        Metric::Cpu if pod.limit.cpu_cores > 0.0 => pod.limit.cpu_cores - pod.usage.cpu_cores,
        Metric::Cpu => pod_capacity(pod, metric) - pod.usage.cpu_cores,
        Metric::Memory if pod.limit.memory_mib > 0.0 => {
            pod.limit.memory_mib - pod.usage.memory_mib
        }
        Metric::Memory => pod_capacity(pod, metric) - pod.usage.memory_mib,
        Metric::Disk => pod.node_disk_kib - pod.disk_usage_kib,
    }
}

// Applies the active filter, then sorts. An empty result from a name or
// label filter is an error; an empty color band is not.
pub fn apply<T: Entity>(
    entities: Vec<T>,
    criteria: &FilterCriteria,
    metric: Metric,
    sort: SortSpec,
) -> Result<Vec<T>, DashboardError> {
    let mut kept: Vec<T> = match criteria {
        FilterCriteria::None => entities,
        FilterCriteria::Name(patterns) => entities
            .into_iter()
            .filter(|entity| patterns.iter().any(|pattern| entity.matches_name(pattern)))
            .collect(),
        FilterCriteria::Label(requirements) => entities
            .into_iter()
            .filter(|entity| {
                requirements.iter().all(|requirement| {
                    entity.labels().get(&requirement.key) == Some(&requirement.value)
                })
            })
            .collect(),
        FilterCriteria::Color(band) => entities
            .into_iter()
            .filter(|entity| entity.percent(metric).band() == *band)
            .collect(),
    };

    if kept.is_empty() && matches!(criteria, FilterCriteria::Name(_) | FilterCriteria::Label(_)) {
        return Err(DashboardError::NoMatches {
            entity: T::KIND,
            filter: criteria.describe(),
        });
    }

    kept.sort_by(|left, right| {
        let ordering = left
            .sort_key(sort.field, metric)
            .compare(&right.sort_key(sort.field, metric));
        if sort.reverse {
            ordering.reverse()
        } else {
            ordering
        }
    });
    Ok(kept)
}
