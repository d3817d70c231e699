mod config;
mod error;
mod i18n;
mod logging;
mod parser;
mod store;
mod tui;
mod writeback;
mod writer;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::path::Path;

use crate::config::Config;
use crate::store::{Mode, Store};

#[derive(Parser)]
#[command(name = "td", version, about = "Minimal markdown to-do list")]
struct Cli {
    /// Interface language (e.g. "en", "zh")
    #[arg(long, global = true)]
    lang: Option<String>,

    /// To-do file, relative to the current directory (default: todo.md)
    #[arg(long, short, global = true)]
    file: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the interactive list (default)
    Tui,

    /// Print the tasks
    List,

    /// Append a task: td add <text>
    Add {
        /// Task text
        text: Vec<String>,
    },

    /// Flip a task between open and done: td toggle <n>
    Toggle {
        /// Task number as shown by `td list`
        number: usize,
    },

    /// Replace a task's text: td edit <n> <text>
    Edit {
        /// Task number as shown by `td list`
        number: usize,
        /// New task text
        text: Vec<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load()
        .with_context(|| format!("failed to read {}", Config::config_path().display()))?
        .with_overrides(cli.lang, cli.file);
    logging::init(&config).context("failed to start logging")?;

    match cli.command.unwrap_or(Commands::Tui) {
        Commands::Tui => cmd_tui(&config),
        Commands::List => cmd_list(&config),
        Commands::Add { text } => cmd_add(&config, &text.join(" ")),
        Commands::Toggle { number } => cmd_toggle(&config, number),
        Commands::Edit { number, text } => cmd_edit(&config, number, &text.join(" ")),
    }
}

fn open_store(config: &Config) -> Store {
    let mut store = Store::new().with_locales_dir(config.resolved_locales_dir());
    store.init(&config.lang, Path::new(&config.file));
    store
}

/// Fail with the store's message once it has entered the error mode.
fn ensure_healthy(store: &Store) -> anyhow::Result<()> {
    if store.mode() == Mode::Error {
        bail!("{}", store.message().unwrap_or("unknown error"));
    }
    Ok(())
}

fn cmd_tui(config: &Config) -> anyhow::Result<()> {
    let mut store = open_store(config);
    tui::run(&mut store).context("terminal UI failed")?;
    let healthy = ensure_healthy(&store);
    store
        .shutdown()
        .context("failed to save tasks before exit")?;
    healthy
}

fn cmd_list(config: &Config) -> anyhow::Result<()> {
    let store = open_store(config);
    ensure_healthy(&store)?;

    if store.tasks().is_empty() {
        println!("{}", store.t(i18n::Key::NoTasks));
    }
    for (i, task) in store.tasks().iter().enumerate() {
        println!("{:>3}  {}", i + 1, parser::format_task_line(task));
    }
    Ok(())
}

/// Save pending writes, then print the store's status line.
fn finish(mut store: Store) -> anyhow::Result<()> {
    let message = store.message().unwrap_or_default().to_string();
    store
        .flush()
        .with_context(|| format!("failed to write {}", store.file_path().display()))?;
    store.shutdown()?;
    println!("{}", message);
    Ok(())
}

fn select_number(store: &mut Store, number: usize) -> anyhow::Result<()> {
    if number == 0 || !store.select(number - 1) {
        bail!("no task #{} ({} tasks)", number, store.tasks().len());
    }
    Ok(())
}

fn cmd_add(config: &Config, text: &str) -> anyhow::Result<()> {
    if text.trim().is_empty() {
        bail!("task text cannot be empty");
    }
    let mut store = open_store(config);
    ensure_healthy(&store)?;

    store.set_mode(Mode::Add);
    store.set_input_value(text);
    store.add_task();
    finish(store)
}

fn cmd_toggle(config: &Config, number: usize) -> anyhow::Result<()> {
    let mut store = open_store(config);
    ensure_healthy(&store)?;
    select_number(&mut store, number)?;

    store.toggle_task();
    finish(store)
}

fn cmd_edit(config: &Config, number: usize, text: &str) -> anyhow::Result<()> {
    if text.trim().is_empty() {
        bail!("task text cannot be empty");
    }
    let mut store = open_store(config);
    ensure_healthy(&store)?;
    select_number(&mut store, number)?;

    store.edit_task(text);
    finish(store)
}
