mod app;
mod config;
mod context;
mod diff;
mod event;
mod git;
mod print;
mod theme;
mod ui;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;

use app::{App, Target};
use config::Config;
use diff::DiffViewMode;
use event::{AppEvent, EventHandler};

/// ctxdiff - review changes to a YAML context repository
#[derive(Parser, Debug)]
#[command(name = "ctxdiff")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to git repository
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Compare the working tree against this revision instead of HEAD
    #[arg(long)]
    rev: Option<String>,

    /// Print diffs to stdout instead of starting the TUI
    #[arg(long)]
    print: bool,

    /// Print diffs as JSON (implies --print)
    #[arg(long)]
    json: bool,

    /// Side-by-side layout
    #[arg(long, conflicts_with = "unified")]
    split: bool,

    /// Single-pane layout
    #[arg(long)]
    unified: bool,

    /// Start at the changed file defining this entity id (with --print, show only that file)
    #[arg(long, value_name = "ID")]
    entity: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compare two files directly; either may be REV:PATH
    Compare { original: String, modified: String },
}

impl Args {
    fn target(&self) -> Target {
        match &self.command {
            Some(Command::Compare { original, modified }) => Target::Compare {
                original: original.clone(),
                modified: modified.clone(),
            },
            None => Target::Repo {
                path: self.path.canonicalize().unwrap_or_else(|_| self.path.clone()),
                rev: self.rev.clone(),
            },
        }
    }

    fn view_mode(&self) -> Option<DiffViewMode> {
        if self.split {
            Some(DiffViewMode::Split)
        } else if self.unified {
            Some(DiffViewMode::Unified)
        } else {
            None
        }
    }

    fn print_mode(&self) -> bool {
        self.print || self.json
    }
}

fn init_logging(print_mode: bool) -> Result<()> {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if !print_mode {
        // Keep log output off the terminal while the TUI owns it
        let log_path = std::env::temp_dir().join("ctxdiff.log");
        let log_file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .with_context(|| format!("Failed to open log file: {}", log_path.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(log_file)));
    }
    builder.init();
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.print_mode())?;

    let target = args.target();
    if args.print_mode() {
        return run_print(&args, &target);
    }

    let config = Config::from_env();
    let tick_rate = config.timing.tick_rate;
    let debounce = config.timing.watch_debounce;

    // Create app first (fails early if not a git repo)
    let mut app = App::open(target, args.view_mode(), config)?;
    if let Some(id) = &args.entity {
        if !app.select_entity(id) {
            log::warn!("entity {} is not among the changed files", id);
        }
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let events = EventHandler::new(tick_rate, debounce, &app.watch_root());

    let result = run_app(&mut terminal, &mut app, &events);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_print(args: &Args, target: &Target) -> Result<()> {
    let mut files = print::collect(target)?;
    if let Some(id) = &args.entity {
        print::retain_entity(&mut files, target, id)?;
    }
    let mut stdout = io::stdout().lock();
    if args.json {
        print::write_json(&mut stdout, &files)
    } else {
        let mode = args.view_mode().unwrap_or(DiffViewMode::Unified);
        print::write_text(&mut stdout, &files, mode, print::output_width())
    }
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App, events: &EventHandler) -> Result<()> {
    while app.running {
        terminal.draw(|frame| app.render(frame))?;

        match events.next()? {
            AppEvent::Key(key) => app.handle_key(key)?,
            AppEvent::Resize | AppEvent::Tick => {}
            AppEvent::FileChanged => {
                // Drain queued FileChanged events to coalesce rapid saves
                let mut pending = Vec::new();
                while let Some(evt) = events.try_next() {
                    if !matches!(evt, AppEvent::FileChanged) {
                        pending.push(evt);
                    }
                }
                log::debug!("file change detected, refreshing");
                app.refresh()?;
                for evt in pending {
                    if let AppEvent::Key(key) = evt {
                        app.handle_key(key)?;
                    }
                }
            }
        }
    }

    Ok(())
}
