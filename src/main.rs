use std::io;
use std::path::Path;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod app;
mod cli;
mod config;
mod eid;
mod ingest;
mod lock;
mod notes;
mod semantic;
mod storage;
#[cfg(test)]
mod tests;

use app::AppFactory;
use cli::Command;
use lock::FileLock;

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Take the archive lock, waiting for another process if it holds it.
fn lock_archive(base_path: &Path) -> anyhow::Result<FileLock> {
    match FileLock::try_acquire(base_path) {
        Ok(lock) => Ok(lock),
        Err(err) if err.kind() == io::ErrorKind::WouldBlock => {
            log::warn!("{err}, waiting for it to finish");
            FileLock::acquire_blocking(base_path).context("Failed to lock archive")
        }
        Err(err) => Err(err).context("Failed to lock archive"),
    }
}

fn main() -> anyhow::Result<()> {
    init_logging();

    let args = cli::Args::parse();

    #[cfg(feature = "markdown-docs")]
    if let Command::MarkdownDocs {} = args.command {
        clap_markdown::print_help_markdown::<cli::Args>();
        return Ok(());
    }

    let paths = AppFactory::get_paths()?;
    log::debug!("archive at {}", paths.notes_path.display());

    // held until main returns
    let _lock = if args.command.is_mutating() {
        Some(lock_archive(&paths.base_path)?)
    } else {
        None
    };

    let app = AppFactory::create_app_service(&paths)?;
    let json = args.json;

    let _span = tracing::info_span!("command", command = ?args.command).entered();

    match args.command {
        #[cfg(feature = "markdown-docs")]
        Command::MarkdownDocs {} => {}

        Command::Add { note } => cli::handle_add(&app, note, json)?,
        Command::Delete { id, yes } => cli::handle_delete(&app, id, yes, json)?,
        Command::List {} => cli::handle_list(&app, json)?,
        Command::Show { id } => cli::handle_show(&app, id, json)?,
        Command::Find { query, top } => cli::handle_find(&app, query, top, json)?,
        Command::Ingest { path } => cli::handle_ingest(&app, &path, json)
            .with_context(|| format!("Failed to ingest {}", path.display()))?,
    }

    Ok(())
}
