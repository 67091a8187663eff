use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use std::path::PathBuf;
use std::str::FromStr;
use tokio::sync::mpsc;

mod app;
mod keybindings;
mod theme;
mod ui;

use app::{App, AppEvent, PageSource, EVENT_CHANNEL_CAPACITY};
use keybindings::KeybindingRegistry;
use navtick::config::Config;
use navtick::countdown::{CountdownEngine, TickOutcome};
use navtick::dom::NodeId;
use navtick::page::Page;
use theme::ThemeVariant;

/// Get the config directory path (~/.config/navtick/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("navtick"))
}

/// Which file input an `--attach` flag fills.
#[derive(Debug, Clone, PartialEq, Eq)]
enum AttachTarget {
    /// Proof input with this `data-idx`.
    Proof(u32),
    Avatar,
}

/// `IDX=PATH` from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Attachment {
    target: AttachTarget,
    path: PathBuf,
}

impl FromStr for Attachment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (target, path) = s
            .split_once('=')
            .ok_or_else(|| format!("expected IDX=PATH, got '{s}'"))?;
        let target = match target.trim() {
            "avatar" => AttachTarget::Avatar,
            idx => AttachTarget::Proof(
                idx.parse()
                    .map_err(|_| format!("'{idx}' is neither a proof index nor 'avatar'"))?,
            ),
        };
        if path.is_empty() {
            return Err("attachment path is empty".to_string());
        }
        Ok(Self {
            target,
            path: PathBuf::from(path),
        })
    }
}

impl Attachment {
    fn input(&self, page: &Page) -> Option<NodeId> {
        let doc = page.document();
        match self.target {
            AttachTarget::Avatar => doc.get_element_by_id(navtick::preview::AVATAR_INPUT_ID),
            AttachTarget::Proof(idx) => {
                let selector = format!("{}[data-idx=\"{idx}\"]", navtick::preview::PROOF_INPUT_SELECTOR);
                doc.query_selector(&selector).ok().flatten()
            }
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "navtick",
    about = "Dashboard page with sidebar, reset countdowns and form helpers"
)]
struct Args {
    /// Config file (default: ~/.config/navtick/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Page description to load instead of the bundled dashboard
    #[arg(long, value_name = "FILE")]
    page: Option<PathBuf>,

    /// Pre-select a file for a proof input (by data-idx) or "avatar"
    #[arg(long, value_name = "IDX=PATH")]
    attach: Vec<Attachment>,

    /// Print the mounted page as JSON and exit
    #[arg(long)]
    dump: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; the terminal UI owns stdout.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config_path = match &args.config {
        Some(path) => path.clone(),
        None => get_config_dir()?.join("config.toml"),
    };
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    let theme = ThemeVariant::from_str_name(&config.theme).unwrap_or_else(|| {
        tracing::warn!(theme = %config.theme, "Unknown theme, using dark");
        ThemeVariant::Dark
    });

    let mut keybindings = KeybindingRegistry::new();
    for warning in keybindings.apply_overrides(&config.keybindings) {
        tracing::warn!(%warning, "Keybinding override skipped");
    }

    let source = match args.page.clone().or_else(|| config.page.clone()) {
        Some(path) => PageSource::File(path),
        None => PageSource::Bundled,
    };

    let (event_tx, event_rx) = mpsc::channel::<AppEvent>(EVENT_CHANNEL_CAPACITY);
    let mut app = App::new(source, config.page_options(), theme, keybindings, event_tx)
        .context("Failed to load page")?;

    for attachment in &args.attach {
        let input = attachment.input(&app.page).with_context(|| {
            format!("No file input on this page for {:?}", attachment.target)
        })?;
        app.page
            .choose_file(input, Some(&attachment.path))
            .with_context(|| format!("Failed to attach {}", attachment.path.display()))?;
    }

    if args.dump {
        let now = Local::now();
        let kinds: Vec<_> = app.page.countdowns().iter().map(|&(kind, _)| kind).collect();
        for kind in kinds {
            if let TickOutcome::Display(text) = CountdownEngine::new(kind, &now).tick(&now) {
                app.page.set_countdown_text(kind, text);
            }
        }
        let doc = app.page.document();
        let json = serde_json::to_string_pretty(&doc.snapshot(doc.body()))
            .context("Failed to serialize page")?;
        println!("{}", json);
        return Ok(());
    }

    ui::run(&mut app, event_rx).await?;

    Ok(())
}
