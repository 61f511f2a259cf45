mod app;
mod cli;
mod config;
mod error;
mod filter;
mod input;
mod k8s;
mod model;
mod quantity;
mod render;
mod stats;
mod ui;

use anyhow::{Context, Result};
use app::{App, AppCommand};
use clap::Parser;
use cli::{CliArgs, Options};
use config::DefaultsFile;
use crossterm::event::{
    Event, EventStream, KeyEventKind, KeyboardEnhancementFlags, PopKeyboardEnhancementFlags,
    PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
    supports_keyboard_enhancement,
};
use error::DashboardError;
use futures::StreamExt;
use k8s::{KubeGateway, Snapshot};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use render::{DisplayOptions, RenderedTable};
use std::fs::OpenOptions;
use std::io::{self, Stdout};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;
use tokio::time::{Duration, Instant, MissedTickBehavior, interval_at, timeout};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

type TuiTerminal = Terminal<CrosstermBackend<Stdout>>;

struct Dashboard {
    gateway: KubeGateway,
    options: Options,
    options_line: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(error) => {
            let _ = error.print();
            return if error.use_stderr() {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    match start(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("Error: {}", compact_error(&error));
            error::exit_code_for(&error)
        }
    }
}

async fn start(args: CliArgs) -> Result<()> {
    let defaults = DefaultsFile::load()?;
    let options = args.into_options(&defaults)?;
    init_tracing(&options.log_filter, options.log_file.as_deref())?;

    let options_json =
        serde_json::to_string(&options).context("failed to serialize options")?;
    debug!(options = %options_json, "validated options");

    let kubeconfig = config::resolve_kubeconfig(
        options.kubeconfig.as_deref(),
        std::env::var("KUBECONFIG").ok().as_deref(),
        std::env::var_os("HOME").map(PathBuf::from).as_deref(),
    );
    let gateway = KubeGateway::connect(kubeconfig.as_deref()).await?;

    let dashboard = Dashboard {
        gateway,
        options_line: options.debug.then_some(options_json),
        options,
    };

    let (table, rows) = dashboard.cycle().await?;
    let mut app = App::new(dashboard.options.view);
    app.set_table(table, rows);

    run(&mut app, &dashboard).await
}

fn init_tracing(level_filter: &str, log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_new(level_filter)
        .or_else(|_| EnvFilter::try_new("info"))
        .context("failed to initialize tracing filter")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact();

    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|error| {
                    DashboardError::config(format!(
                        "failed to open log file {}: {error}",
                        path.display()
                    ))
                })?;
            let _ = builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init();
        }
        None => {
            let _ = builder.with_writer(std::io::sink).try_init();
        }
    }

    Ok(())
}

impl Dashboard {
    fn refresh_period(&self) -> Duration {
        Duration::from_millis(self.options.refresh_ms)
    }

    async fn cycle(&self) -> Result<(RenderedTable, usize)> {
        let options = &self.options;
        let label = options.label.as_ref().map(|label| label.key.as_str());
        let limit = Duration::from_secs(options.collection_timeout_secs);

        let snapshot = match timeout(
            limit,
            self.gateway.collect(options.view, options.metric, label),
        )
        .await
        {
            Ok(result) => result?,
            Err(_) => {
                let identity = self.gateway.identity();
                return Err(DashboardError::Connectivity {
                    context: identity.context.clone(),
                    url: identity.endpoint_url.clone(),
                    reason: format!("collection timed out after {}s", limit.as_secs()),
                }
                .into());
            }
        };

        Ok(self.build_table(snapshot)?)
    }

    fn build_table(&self, snapshot: Snapshot) -> Result<(RenderedTable, usize), DashboardError> {
        let options = &self.options;
        let display = DisplayOptions {
            metric: options.metric,
            label_alias: options.label.as_ref().map(|label| label.alias.as_str()),
            identity: (!options.no_info).then(|| self.gateway.identity()),
            options_line: self.options_line.as_deref(),
        };

        let collected = snapshot.count();
        let (table, rows) = match snapshot {
            Snapshot::Nodes(nodes) => {
                let nodes = filter::apply(nodes, &options.filter, options.metric, options.sort)?;
                (render::render_nodes(&nodes, &display), nodes.len())
            }
            Snapshot::Pods(pods) => {
                let pods = filter::apply(pods, &options.filter, options.metric, options.sort)?;
                (render::render_pods(&pods, &display), pods.len())
            }
        };
        debug!(collected, shown = rows, filter = %options.filter.describe(), "table rendered");
        Ok((table, rows))
    }
}

async fn run(app: &mut App, dashboard: &Dashboard) -> Result<()> {
    let (mut terminal, keyboard_enhanced) = init_terminal()?;
    let run_result = run_loop(&mut terminal, app, dashboard).await;
    let restore_result = restore_terminal(&mut terminal, keyboard_enhanced);

    match (run_result, restore_result) {
        (Err(run_error), Err(restore_error)) => Err(anyhow::anyhow!(
            "{run_error:#}\nterminal restore error: {restore_error:#}"
        )),
        (Err(error), _) => Err(error),
        (_, Err(error)) => Err(error),
        (Ok(()), Ok(())) => Ok(()),
    }
}

fn init_terminal() -> Result<(TuiTerminal, bool)> {
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    let keyboard_enhanced = matches!(supports_keyboard_enhancement(), Ok(true));
    if keyboard_enhanced {
        execute!(
            stdout,
            EnterAlternateScreen,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES)
        )
        .context("failed to enter alternate screen with keyboard enhancement")?;
    } else {
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("failed to create terminal backend")?;
    terminal.clear().context("failed to clear terminal")?;
    Ok((terminal, keyboard_enhanced))
}

fn restore_terminal(terminal: &mut TuiTerminal, keyboard_enhanced: bool) -> Result<()> {
    if keyboard_enhanced {
        execute!(terminal.backend_mut(), PopKeyboardEnhancementFlags)
            .context("failed to pop keyboard enhancement flags")?;
    }
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor().context("failed to show cursor")?;
    Ok(())
}

async fn run_loop(terminal: &mut TuiTerminal, app: &mut App, dashboard: &Dashboard) -> Result<()> {
    let period = dashboard.refresh_period();
    let mut reader = EventStream::new();
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!(
        view = dashboard.options.view.entity(),
        refresh_ms = dashboard.options.refresh_ms,
        "refresh loop started"
    );

    loop {
        terminal
            .draw(|frame| ui::render(frame, app))
            .context("failed to render terminal frame")?;

        if !app.running() {
            break;
        }

        tokio::select! {
            maybe_event = reader.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                        if let Some(action) = input::map_key(app.mode(), key) {
                            debug!(?action, "key action");
                            if app.apply_action(action) == AppCommand::Refresh {
                                terminal
                                    .draw(|frame| ui::render(frame, app))
                                    .context("failed to render terminal frame")?;
                                refresh(app, dashboard).await?;
                                ticker.reset();
                            }
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(error)) => {
                        app.set_status(format!("terminal event error: {error}"));
                    }
                    None => {
                        app.set_status("terminal event stream closed");
                        break;
                    }
                }
            }
            _ = ticker.tick() => {
                refresh(app, dashboard).await?;
            }
        }
    }

    Ok(())
}

// Runs one cycle. Cluster failures become a banner over the last good table;
// an empty name or label filter result ends the session.
async fn refresh(app: &mut App, dashboard: &Dashboard) -> Result<()> {
    match dashboard.cycle().await {
        Ok((table, rows)) => {
            app.set_table(table, rows);
            Ok(())
        }
        Err(error) if is_fatal(&error) => Err(error),
        Err(error) => {
            let message = refresh_error_text(&error);
            warn!(error = %compact_error(&error), "refresh failed, keeping last table");
            app.set_refresh_error(message);
            Ok(())
        }
    }
}

fn is_fatal(error: &anyhow::Error) -> bool {
    error
        .chain()
        .find_map(|cause| cause.downcast_ref::<DashboardError>())
        .is_some_and(|error| matches!(error, DashboardError::NoMatches { .. }))
}

fn refresh_error_text(error: &anyhow::Error) -> String {
    match error
        .chain()
        .find_map(|cause| cause.downcast_ref::<DashboardError>())
    {
        Some(DashboardError::Connectivity {
            context, reason, ..
        }) => format!("cluster {context} unreachable: {reason}"),
        _ => compact_error(error),
    }
}

fn compact_error(error: &anyhow::Error) -> String {
    let mut out = Vec::new();
    for (index, cause) in error.chain().enumerate() {
        if index == 0 {
            out.push(cause.to_string());
        } else if index <= 2 {
            out.push(format!("caused by: {cause}"));
        } else {
            break;
        }
    }

    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::{compact_error, is_fatal, refresh_error_text};
    use crate::app::App;
    use crate::error::DashboardError;
    use crate::model::View;
    use anyhow::Context;

    #[test]
    fn refresh_banner_names_the_failure_reason() {
        let timed_out = anyhow::Error::new(DashboardError::Connectivity {
            context: "prod-eu".to_string(),
            url: "https://10.0.0.1:6443".to_string(),
            reason: "collection timed out after 10s".to_string(),
        });
        let mut app = App::new(View::Nodes);
        app.set_refresh_error(refresh_error_text(&timed_out));

        let banner = app.error_banner().unwrap_or_default();
        assert!(banner.contains("timed out after 10s"), "{banner}");
        assert!(banner.contains("prod-eu"), "{banner}");
        assert!(app.status().contains("timed out"), "{}", app.status());
    }

    #[test]
    fn metrics_outage_is_distinguishable_from_timeout() {
        let outage = anyhow::Error::new(DashboardError::Connectivity {
            context: "kind".to_string(),
            url: "https://127.0.0.1:6443".to_string(),
            reason: "metrics API unavailable: 503".to_string(),
        })
        .context("collecting nodes");
        assert_eq!(
            refresh_error_text(&outage),
            "cluster kind unreachable: metrics API unavailable: 503"
        );
        assert_eq!(refresh_error_text(&anyhow::anyhow!("boom")), "boom");
    }

    #[test]
    fn only_empty_filter_results_are_fatal_mid_session() {
        let empty = anyhow::Error::new(DashboardError::NoMatches {
            entity: "nodes",
            filter: "gpu.*".to_string(),
        });
        let unreachable = anyhow::Error::new(DashboardError::Connectivity {
            context: "kind".to_string(),
            url: "https://127.0.0.1:6443".to_string(),
            reason: "connection refused".to_string(),
        });
        assert!(is_fatal(&empty));
        assert!(!is_fatal(&unreachable));
        assert!(!is_fatal(&anyhow::anyhow!("boom")));
    }

    #[test]
    fn compact_error_keeps_two_causes() {
        let error = Err::<(), _>(anyhow::anyhow!("root"))
            .context("middle")
            .context("outer")
            .context("top")
            .unwrap_err();
        let text = compact_error(&error);
        assert_eq!(text, "top\ncaused by: outer\ncaused by: middle");
    }
}
