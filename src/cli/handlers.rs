use std::path::Path;

use indicatif::{ProgressBar, ProgressStyle};
use inquire::error::InquireResult;
use serde::Serialize;

use crate::{
    app::service::AppService,
    cli::{
        errors::{CliError, CliResult},
        render,
    },
    semantic::RankingOutcome,
};

const EMPTY_ARCHIVE_HINT: &str = "No notes found. Use 'add' to create your first note.";
const NO_EMBEDDINGS_HINT: &str =
    "No notes with embeddings found. Notes added before embeddings were enabled are not searchable.";

fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn handle_add(app: &AppService, note: String, json: bool) -> CliResult<()> {
    let note = app.add_note(&note)?;

    if json {
        return print_json(&note);
    }

    println!("Added note {}", note.id);
    Ok(())
}

pub fn handle_delete(app: &AppService, id: u64, yes: bool, json: bool) -> CliResult<()> {
    let note = app.get_note(id)?;

    if !yes {
        match inquire::prompt_confirmation(format!(
            "Delete note {} ({})?",
            note.id,
            note.content.chars().take(40).collect::<String>()
        )) {
            InquireResult::Ok(true) => {}
            InquireResult::Ok(false) => return Ok(()),
            InquireResult::Err(err) => return Err(CliError::invalid_input(err.to_string())),
        }
    }

    app.delete_note(id)?;

    if json {
        return print_json(&serde_json::json!({ "deleted": id }));
    }

    println!("Deleted note {id}");
    Ok(())
}

pub fn handle_list(app: &AppService, json: bool) -> CliResult<()> {
    let notes = app.list_notes()?;

    if json {
        return print_json(&notes);
    }

    if notes.is_empty() {
        println!("{EMPTY_ARCHIVE_HINT}");
        return Ok(());
    }

    println!("{}", render::notes_table(&notes));
    Ok(())
}

pub fn handle_show(app: &AppService, id: u64, json: bool) -> CliResult<()> {
    let note = app.get_note(id)?;

    if json {
        return print_json(&note);
    }

    println!("{}", render::note_detail(&note));
    Ok(())
}

pub fn handle_find(app: &AppService, query: String, top: Option<usize>, json: bool) -> CliResult<()> {
    if query.trim().is_empty() {
        return Err(CliError::invalid_input("query must not be empty"));
    }

    let outcome = app.find(&query, top)?;

    if json {
        return print_json(&outcome.into_results());
    }

    match outcome {
        RankingOutcome::EmptyArchive => println!("{EMPTY_ARCHIVE_HINT}"),
        RankingOutcome::NoEmbeddings => println!("{NO_EMBEDDINGS_HINT}"),
        RankingOutcome::Ranked(results) if results.is_empty() => println!("No results."),
        RankingOutcome::Ranked(results) => println!("{}", render::ranked_table(&results)),
    }

    Ok(())
}

pub fn handle_ingest(app: &AppService, path: &Path, json: bool) -> CliResult<()> {
    let bar = ProgressBar::hidden();
    if !json {
        bar.set_draw_target(indicatif::ProgressDrawTarget::stderr());
    }
    bar.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks")
            .map_err(|e| CliError::invalid_input(e.to_string()))?
            .progress_chars("#>-"),
    );

    let report = app.ingest_file(path, &mut |done, total| {
        bar.set_length(total as u64);
        bar.set_position(done as u64);
    });
    bar.finish_and_clear();
    let report = report?;

    if json {
        return print_json(&report);
    }

    println!(
        "Ingested {}: {} note(s) created",
        report.source_file, report.notes_created
    );
    Ok(())
}
