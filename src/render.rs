use crate::model::{ClusterIdentity, ColorBand, DiskSource, Metric, NodeStat, Percent, PodStat};

pub const BAR_WIDTH: usize = 20;
pub const SCROLL_STEP: usize = 5;

const PROJECT_URL: &str = "https://github.com/AKSarav/Kube-Node-Usage";
const NODE_NAME_MIN_WIDTH: usize = 30;
const POD_NAME_MIN_WIDTH: usize = 15;
const NAMESPACE_MIN_WIDTH: usize = 12;
const NODE_COLUMN_WIDTH: usize = 20;
const VALUE_WIDTH: usize = 10;
const LABEL_WIDTH: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Plain,
    Banner,
    Heading,
    Muted,
    Band(ColorBand),
    Match,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub tone: Tone,
}

impl Segment {
    fn new(text: impl Into<String>, tone: Tone) -> Self {
        Self {
            text: text.into(),
            tone,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Banner,
    Header,
    Rule,
    Row,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedLine {
    pub kind: LineKind,
    pub segments: Vec<Segment>,
}

impl RenderedLine {
    fn single(kind: LineKind, text: impl Into<String>, tone: Tone) -> Self {
        Self {
            kind,
            segments: vec![Segment::new(text, tone)],
        }
    }

    pub fn text(&self) -> String {
        self.segments
            .iter()
            .map(|segment| segment.text.as_str())
            .collect()
    }

    pub fn width(&self) -> usize {
        self.segments
            .iter()
            .map(|segment| segment.text.chars().count())
            .sum()
    }

    pub fn window(&self, offset: usize) -> Vec<Segment> {
        let mut skip = offset;
        let mut out = Vec::with_capacity(self.segments.len());
        for segment in &self.segments {
            let length = segment.text.chars().count();
            if skip >= length {
                skip -= length;
                continue;
            }
            out.push(Segment::new(
                segment.text.chars().skip(skip).collect::<String>(),
                segment.tone,
            ));
            skip = 0;
        }
        out
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedTable {
    pub lines: Vec<RenderedLine>,
}

impl RenderedTable {
    pub fn search(&self, term: &str) -> Vec<&RenderedLine> {
        let needle = fold_case(term.trim());
        self.lines
            .iter()
            .filter(|line| {
                line.kind != LineKind::Row
                    || needle.is_empty()
                    || fold_case(&line.text()).contains(&needle)
            })
            .collect()
    }

    #[cfg(test)]
    pub fn header(&self) -> Option<&RenderedLine> {
        self.lines.iter().find(|line| line.kind == LineKind::Header)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DisplayOptions<'a> {
    pub metric: Metric,
    pub label_alias: Option<&'a str>,
    pub identity: Option<&'a ClusterIdentity>,
    pub options_line: Option<&'a str>,
}

pub fn clamp_scroll(requested: i64, max_width: usize, viewport: usize) -> usize {
    let upper = max_width.saturating_sub(viewport);
    let upper = i64::try_from(upper).unwrap_or(i64::MAX);
    usize::try_from(requested.clamp(0, upper)).unwrap_or(0)
}

pub fn highlight(segments: Vec<Segment>, term: &str) -> Vec<Segment> {
    let needle = fold_case(term.trim());
    if needle.is_empty() {
        return segments;
    }

    let mut out = Vec::with_capacity(segments.len());
    for segment in segments {
        let haystack = fold_case(&segment.text);
        let mut cursor = 0;
        for (start, _) in haystack.match_indices(&needle) {
            if start < cursor {
                continue;
            }
            if start > cursor {
                out.push(Segment::new(&segment.text[cursor..start], segment.tone));
            }
            let end = start + needle.len();
            out.push(Segment::new(&segment.text[start..end], Tone::Match));
            cursor = end;
        }
        if cursor < segment.text.len() {
            out.push(Segment::new(&segment.text[cursor..], segment.tone));
        }
    }
    out
}

// ASCII-only so folded text keeps the byte offsets highlight slices by.
fn fold_case(text: &str) -> String {
    text.to_ascii_lowercase()
}

pub fn render_nodes(nodes: &[NodeStat], options: &DisplayOptions<'_>) -> RenderedTable {
    let metric = options.metric;
    let name_width = nodes
        .iter()
        .map(|node| node.name.chars().count())
        .max()
        .unwrap_or(0)
        .max(NODE_NAME_MIN_WIDTH);
    let unit = metric.unit();

    let mut lines = banner("# KubeNodeUsage", "Metrics", options);

    let mut header = vec![
        pad("Name", name_width),
        pad(&format!("Free({unit})"), VALUE_WIDTH),
        pad(&format!("Max({unit})"), VALUE_WIDTH),
        pad("Pods", 5),
    ];
    if let Some(alias) = options.label_alias {
        header.push(pad(alias, LABEL_WIDTH));
    }
    header.extend([pad("Status", 9), pad("Uptime", 7), "Usage%".to_string()]);
    push_header(&mut lines, header.join(" "));

    for node in nodes {
        let figures = node.figures(metric);
        let mut cells = vec![
            pad(&node.name, name_width),
            pad(&format_amount(metric, figures.free), VALUE_WIDTH),
            pad(&format_amount(metric, figures.capacity), VALUE_WIDTH),
            pad(&node.total_pods.to_string(), 5),
        ];
        if options.label_alias.is_some() {
            cells.push(pad(node.label_value.as_deref().unwrap_or(""), LABEL_WIDTH));
        }
        cells.extend([pad(node.status.label(), 9), pad(&node.uptime, 7)]);

        let estimated = metric == Metric::Disk && node.disk_source == DiskSource::Estimated;
        let mut segments = vec![Segment::new(format!("{} ", cells.join(" ")), Tone::Plain)];
        segments.extend(bar(figures.percent, estimated));
        lines.push(RenderedLine {
            kind: LineKind::Row,
            segments,
        });
    }

    RenderedTable { lines }
}

pub fn render_pods(pods: &[PodStat], options: &DisplayOptions<'_>) -> RenderedTable {
    let metric = options.metric;
    let name_width = pods
        .iter()
        .map(|pod| pod.name.chars().count())
        .max()
        .unwrap_or(0)
        .max(POD_NAME_MIN_WIDTH)
        + 2;
    let namespace_width = pods
        .iter()
        .map(|pod| pod.namespace.chars().count())
        .max()
        .unwrap_or(0)
        .max(NAMESPACE_MIN_WIDTH)
        + 2;
    let unit = metric.unit();

    let mut lines = banner("# KubeNodeUsage - Pod View", "Metrics for Pods", options);

    let mut header = vec![
        pad("Name", name_width),
        pad("Namespace", namespace_width),
        pad("Node", NODE_COLUMN_WIDTH),
        pad(&format!("Usage({unit})"), VALUE_WIDTH),
        pad(&format!("Request({unit})"), VALUE_WIDTH),
        pad(&format!("Limit({unit})"), VALUE_WIDTH),
    ];
    if let Some(alias) = options.label_alias {
        header.push(pad(alias, LABEL_WIDTH));
    }
    header.push("Usage%".to_string());
    push_header(&mut lines, header.join(" "));

    for pod in pods {
        let (usage, request, limit) = match metric {
            Metric::Memory => (
                format!("{:.0}", pod.usage.memory_mib),
                format!("{:.0}", pod.request.memory_mib),
                format!("{:.0}", pod.limit.memory_mib),
            ),
            Metric::Cpu => (
                format!("{:.2}", pod.usage.cpu_cores),
                format!("{:.2}", pod.request.cpu_cores),
                format!("{:.2}", pod.limit.cpu_cores),
            ),
            Metric::Disk => (
                format_amount(Metric::Disk, pod.disk_usage_kib),
                "-".to_string(),
                "-".to_string(),
            ),
        };
        let mut cells = vec![
            pad(&pod.name, name_width),
            pad(&pod.namespace, namespace_width),
            pad(&truncate_node_name(&pod.node_name), NODE_COLUMN_WIDTH),
            pad(&usage, VALUE_WIDTH),
            pad(&request, VALUE_WIDTH),
            pad(&limit, VALUE_WIDTH),
        ];
        if options.label_alias.is_some() {
            cells.push(pad(pod.label_value.as_deref().unwrap_or(""), LABEL_WIDTH));
        }

        let mut segments = vec![Segment::new(format!("{} ", cells.join(" ")), Tone::Plain)];
        segments.extend(bar(pod.percent(metric), false));
        lines.push(RenderedLine {
            kind: LineKind::Row,
            segments,
        });
    }

    RenderedTable { lines }
}

fn banner(title: &str, metrics_suffix: &str, options: &DisplayOptions<'_>) -> Vec<RenderedLine> {
    let mut lines = vec![
        RenderedLine::single(LineKind::Banner, title, Tone::Banner),
        RenderedLine::single(
            LineKind::Banner,
            format!("# Version: {}", env!("CARGO_PKG_VERSION")),
            Tone::Muted,
        ),
        RenderedLine::single(LineKind::Banner, format!("# {PROJECT_URL}"), Tone::Muted),
        RenderedLine::single(LineKind::Banner, "", Tone::Plain),
    ];

    if let Some(identity) = options.identity {
        lines.extend([
            RenderedLine::single(
                LineKind::Banner,
                format!("# Context: {}", identity.context),
                Tone::Banner,
            ),
            RenderedLine::single(
                LineKind::Banner,
                format!("# Version: {}", identity.api_version),
                Tone::Banner,
            ),
            RenderedLine::single(
                LineKind::Banner,
                format!("# URL: {}", identity.endpoint_url),
                Tone::Banner,
            ),
            RenderedLine::single(LineKind::Banner, "", Tone::Plain),
        ]);
    }

    if let Some(options_line) = options.options_line {
        lines.push(RenderedLine::single(
            LineKind::Banner,
            format!("# Options: {options_line}"),
            Tone::Muted,
        ));
    }

    lines.push(RenderedLine::single(
        LineKind::Banner,
        format!("# {} {metrics_suffix}", options.metric.title()),
        Tone::Heading,
    ));
    lines.push(RenderedLine::single(LineKind::Banner, "", Tone::Plain));
    lines
}

fn push_header(lines: &mut Vec<RenderedLine>, header: String) {
    let width = header.chars().count();
    lines.push(RenderedLine::single(LineKind::Header, header, Tone::Heading));
    lines.push(RenderedLine::single(
        LineKind::Rule,
        "-".repeat(width + BAR_WIDTH),
        Tone::Muted,
    ));
}

fn bar(percent: Percent, estimated: bool) -> Vec<Segment> {
    let marker = if estimated { "~" } else { "" };
    match percent {
        Percent::Known(value) => {
            let filled = ((value.clamp(0.0, 100.0) / 100.0) * BAR_WIDTH as f64).round() as usize;
            let band = percent.band();
            vec![
                Segment::new("█".repeat(filled), Tone::Band(band)),
                Segment::new("░".repeat(BAR_WIDTH - filled), Tone::Muted),
                Segment::new(format!(" {value:>5.1}%{marker}"), Tone::Band(band)),
            ]
        }
        Percent::Unknown => vec![
            Segment::new("░".repeat(BAR_WIDTH), Tone::Muted),
            Segment::new(format!(" unknown{marker}"), Tone::Muted),
        ],
    }
}

fn format_amount(metric: Metric, canonical: f64) -> String {
    match metric {
        Metric::Memory => format!("{:.0}", canonical / 1_024.0),
        Metric::Cpu => format!("{:.2}", canonical / 1_000.0),
        Metric::Disk => format!("{:.1}", canonical / (1_024.0 * 1_024.0)),
    }
}

fn truncate_node_name(name: &str) -> String {
    if name.chars().count() <= NODE_COLUMN_WIDTH {
        return name.to_string();
    }
    let mut out = name
        .chars()
        .take(NODE_COLUMN_WIDTH - 1)
        .collect::<String>();
    out.push('…');
    out
}

fn pad(value: &str, width: usize) -> String {
    format!("{value:<width$}")
}
