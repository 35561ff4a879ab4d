//! Thumbar shell - runs a page with the media bridge installed against an
//! in-process host and reports what the taskbar indicator would show.

mod fixture;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use fixture::PageFixture;
use media_bridge::{BridgeConfig, HostApi, HostGlobals, LocalHost, Session, ThumbButton};

/// Thumbar shell - drive the now-playing bridge from the command line
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Page fixture (JSON); a demo player page when omitted
    #[arg(long)]
    page: Option<PathBuf>,

    /// Bridge configuration (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Thumbar button to press, in order; may be repeated
    #[arg(long, value_enum)]
    press: Vec<Button>,

    /// Publish the host API under the legacy namespace
    #[arg(long)]
    legacy: bool,

    /// Host without a command-invocation surface
    #[arg(long)]
    no_invoke: bool,

    /// Host without an event surface
    #[arg(long)]
    no_events: bool,

    /// Page time to run after each press, in milliseconds
    #[arg(long, default_value = "1000")]
    run_ms: u64,

    /// Pace timers with the wall clock
    #[arg(long)]
    realtime: bool,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Button {
    Playpause,
    Previous,
    Next,
}

impl From<Button> for ThumbButton {
    fn from(button: Button) -> Self {
        match button {
            Button::Playpause => ThumbButton::PlayPause,
            Button::Previous => ThumbButton::Previous,
            Button::Next => ThumbButton::Next,
        }
    }
}

#[derive(Debug, Serialize)]
struct Report {
    title: Option<String>,
    /// Last playing state the host received.
    indicator: Option<bool>,
    playback_state: &'static str,
    media: Vec<MediaReport>,
    notifications_sent: usize,
    notifications_failed: usize,
    elapsed_ms: u64,
}

#[derive(Debug, Serialize)]
struct MediaReport {
    tag: String,
    id: Option<String>,
    paused: bool,
    ended: bool,
}

fn init_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn host_globals(host: &Arc<LocalHost>, args: &Args) -> HostGlobals {
    let mut api = HostApi::new();
    if !args.no_events {
        api = api.with_event(host.clone());
    }
    if !args.no_invoke {
        api = api.with_invoke(host.clone());
    }

    if args.legacy {
        HostGlobals::new().with_legacy(api)
    } else {
        HostGlobals::new().with_current(api)
    }
}

/// Run the page for `run_ms` of page time. Returns how many tasks ran.
async fn drive(session: &mut Session, run_ms: u64, realtime: bool) -> usize {
    let deadline = session.now_ms().saturating_add(run_ms);
    let mut ran = session.run_until_idle();
    if !realtime {
        return ran + session.advance(run_ms);
    }

    while let Some(due) = session.next_due_ms().filter(|&due| due <= deadline) {
        let wait = due.saturating_sub(session.now_ms());
        tokio::time::sleep(Duration::from_millis(wait)).await;
        ran += session.advance(wait);
    }
    ran + session.advance(deadline.saturating_sub(session.now_ms()))
}

fn report(session: &Session, host: &LocalHost, title: Option<String>) -> Report {
    let document = session.document();
    let media = document
        .media_elements()
        .into_iter()
        .filter_map(|node| {
            let element = document.get_element(node)?;
            let state = document.media(node)?;
            Some(MediaReport {
                tag: element.tag_name.as_str().to_string(),
                id: element.get_attribute("id").map(str::to_string),
                paused: state.paused(),
                ended: state.ended(),
            })
        })
        .collect();

    Report {
        title,
        indicator: host.last_playing(),
        playback_state: host.session().playback_state().as_str(),
        media,
        notifications_sent: session.notifier().sent_count(),
        notifications_failed: session.notifier().failure_count(),
        elapsed_ms: session.now_ms(),
    }
}

fn print_report(report: &Report) {
    if let Some(title) = &report.title {
        println!("Page: {}", title);
    }
    let indicator = match report.indicator {
        Some(true) => "playing",
        Some(false) => "paused",
        None => "unknown",
    };
    println!("Indicator: {} ({})", indicator, report.playback_state);
    for media in &report.media {
        let state = if media.ended {
            "ended"
        } else if media.paused {
            "paused"
        } else {
            "playing"
        };
        match &media.id {
            Some(id) => println!("  <{} id={}> {}", media.tag, id, state),
            None => println!("  <{}> {}", media.tag, state),
        }
    }
    println!(
        "Notifications: {} sent, {} failed, {} ms elapsed",
        report.notifications_sent, report.notifications_failed, report.elapsed_ms
    );
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose)?;

    info!("Thumbar shell v{}", media_bridge::VERSION);

    let config = match &args.config {
        Some(path) => BridgeConfig::load(path)
            .with_context(|| format!("failed to load bridge config {}", path.display()))?,
        None => BridgeConfig::default(),
    };
    let fixture = match &args.page {
        Some(path) => PageFixture::load(path)?,
        None => PageFixture::demo(),
    };

    let host = Arc::new(LocalHost::new(&config));
    let globals = host_globals(&host, &args);
    let document = fixture.build()?;
    let mut session = Session::install(document, &globals, config.clone())?;
    drive(&mut session, 0, false).await;

    for &button in &args.press {
        let button = ThumbButton::from(button);
        host.handle_command(button.to_command(), &config);
        let ran = drive(&mut session, args.run_ms, args.realtime).await;
        info!(button = button.tooltip(), tasks = ran, "press handled");
    }

    let report = report(&session, &host, fixture.title.clone());
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}
