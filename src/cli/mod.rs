use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod errors;
mod handlers;
mod render;

pub use handlers::*;

#[derive(Parser, Debug)]
#[command(version, about = "Intelligent local archive: notes with semantic search", long_about = None)]
pub struct Args {
    /// Print JSON instead of tables
    #[clap(long, global = true, default_value = "false")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate api docs in markdown format
    #[cfg(feature = "markdown-docs")]
    #[clap(hide = true)]
    MarkdownDocs {},

    /// Add a note
    Add {
        /// Note text
        #[clap(allow_hyphen_values = true)]
        note: String,
    },

    /// Delete a note by id
    Delete {
        id: u64,

        /// Don't ask for confirmation
        #[clap(short, long, default_value = "false")]
        yes: bool,
    },

    /// List all notes
    #[clap(alias = "list-notes")]
    List {},

    /// Show a single note
    Show { id: u64 },

    /// Find notes similar in meaning to a query
    Find {
        #[clap(allow_hyphen_values = true)]
        query: String,

        /// Number of results, defaults to `top_k` from config.yaml
        #[clap(short = 'k', long)]
        top: Option<usize>,
    },

    /// Split a text file into chunks and store each one as a note
    Ingest { path: PathBuf },
}

impl Command {
    /// Commands that rewrite the note store.
    pub fn is_mutating(&self) -> bool {
        matches!(
            self,
            Command::Add { .. } | Command::Delete { .. } | Command::Ingest { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_find_with_top() {
        let args = Args::try_parse_from(["ila", "find", "cats", "-k", "5"]).unwrap();
        match args.command {
            Command::Find { query, top } => {
                assert_eq!(query, "cats");
                assert_eq!(top, Some(5));
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert!(!args.json);
    }

    #[test]
    fn test_list_alias_and_global_json() {
        let args = Args::try_parse_from(["ila", "list-notes", "--json"]).unwrap();
        assert!(matches!(args.command, Command::List {}));
        assert!(args.json);
    }

    #[test]
    fn test_mutating_commands() {
        let parse = |argv: &[&str]| Args::try_parse_from(argv).unwrap().command;

        assert!(parse(&["ila", "add", "hello"]).is_mutating());
        assert!(parse(&["ila", "delete", "3", "-y"]).is_mutating());
        assert!(parse(&["ila", "ingest", "notes.txt"]).is_mutating());
        assert!(!parse(&["ila", "list"]).is_mutating());
        assert!(!parse(&["ila", "show", "1"]).is_mutating());
        assert!(!parse(&["ila", "find", "x"]).is_mutating());
    }

    #[test]
    fn test_delete_requires_numeric_id() {
        assert!(Args::try_parse_from(["ila", "delete", "abc"]).is_err());
    }
}
