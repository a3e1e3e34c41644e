//! Command line entry point.
//!
//! # Responsibility
//! - Run ranked searches and flashcard generation against a store file.
//! - Load provider settings from the environment (and `.env`).

use clap::{Parser, Subcommand, ValueEnum};
use log::{info, warn};
use std::error::Error;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;
use studyset_core::{
    core_version, default_log_level, init_logging, ContentKind, GeminiClient, GenerationService,
    SearchService, Store,
};

#[derive(Parser)]
#[command(name = "studyset", about = "Notes, flashcards and ranked search", version)]
struct Cli {
    /// Absolute directory for rolling log files (logging is off when unset)
    #[arg(long, global = true)]
    log_dir: Option<String>,

    /// Log level: trace|debug|info|warn|error
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Kind {
    Notes,
    Flashcards,
}

impl From<Kind> for ContentKind {
    fn from(value: Kind) -> Self {
        match value {
            Kind::Notes => ContentKind::Note,
            Kind::Flashcards => ContentKind::FlashcardSet,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Print the core version
    Version,

    /// Rank set names against a search term
    Search {
        /// Store database file
        db: PathBuf,
        /// Which sets to search
        kind: Kind,
        /// Words, "quoted phrases" and -exclusions
        term: String,
    },

    /// Generate flashcards from one of an owner's notes
    Generate {
        /// Store database file
        db: PathBuf,
        /// Owner of the note
        owner: String,
        /// Note name
        note: String,
        /// Save the cards as a new flashcard set with this name
        #[arg(long)]
        into: Option<String>,
        /// Study domain named in the prompt
        #[arg(long)]
        domain: Option<String>,
    },
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    if let Some(log_dir) = cli.log_dir.as_deref() {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        if let Err(err) = init_logging(level, log_dir) {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    }

    let mut stdout = std::io::stdout().lock();
    match run(cli.command, &mut stdout) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command, out: &mut impl Write) -> Result<(), Box<dyn Error>> {
    let name = command.name();
    let started_at = Instant::now();
    let result = dispatch(command, out);
    match &result {
        Ok(()) => info!(
            "event=cli_command module=cli status=ok command={name} duration_ms={}",
            started_at.elapsed().as_millis()
        ),
        Err(_) => warn!(
            "event=cli_command module=cli status=error command={name} duration_ms={}",
            started_at.elapsed().as_millis()
        ),
    }
    result
}

fn dispatch(command: Command, out: &mut impl Write) -> Result<(), Box<dyn Error>> {
    match command {
        Command::Version => {
            writeln!(out, "studyset {}", core_version())?;
        }
        Command::Search { db, kind, term } => {
            let store = Store::open(db)?;
            let hits = SearchService::new(&store).search(kind.into(), &term)?;
            for hit in hits {
                writeln!(
                    out,
                    "{:.4}\t{}\t{}\t{}",
                    hit.score, hit.set.owner, hit.set.name, hit.set.id
                )?;
            }
        }
        Command::Generate {
            db,
            owner,
            note,
            into,
            domain,
        } => {
            let store = Store::open(db)?;
            let client = GeminiClient::from_env()?;
            let mut service = GenerationService::new(&store, client);
            if let Some(domain) = domain {
                service = service.with_domain(domain);
            }

            match into {
                Some(set_name) => {
                    let set_id = service.generate_into_set(&owner, &note, &set_name)?;
                    writeln!(out, "created set {set_name} ({set_id})")?;
                }
                None => {
                    let generated = service.generate_flashcards(&owner, &note)?;
                    for (index, card) in generated.cards.iter().enumerate() {
                        writeln!(out, "{}. Q: {}", index + 1, card.question)?;
                        writeln!(out, "   A: {}", card.answer)?;
                    }
                }
            }
        }
    }
    Ok(())
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Self::Version => "version",
            Self::Search { .. } => "search",
            Self::Generate { .. } => "generate",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{run, Cli, Command, Kind};
    use clap::{CommandFactory, Parser};
    use studyset_core::{CardDraft, FlashcardRepository, SqliteFlashcardRepository, Store};

    fn run_to_string(command: Command) -> String {
        let mut out = Vec::new();
        run(command, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn version_prints_core_version() {
        let output = run_to_string(Command::Version);
        assert_eq!(output.trim(), format!("studyset {}", studyset_core::core_version()));
    }

    #[test]
    fn search_prints_ranked_hits_from_store_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("studyset.db");
        {
            let store = Store::open(&path).unwrap();
            let conn = store.connection();
            let repo = SqliteFlashcardRepository::new(&conn);
            repo.create_set("u1", "Advanced Math Problems", &[CardDraft::new("q", "a")])
                .unwrap();
            repo.create_set("u2", "History of Ancient Greece", &[]).unwrap();
        }

        let cli = Cli::try_parse_from([
            "studyset",
            "search",
            path.to_str().unwrap(),
            "flashcards",
            "math",
        ])
        .unwrap();
        let output = run_to_string(cli.command);

        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 1);
        let fields: Vec<&str> = lines[0].split('\t').collect();
        assert_eq!(fields[1], "u1");
        assert_eq!(fields[2], "Advanced Math Problems");
        assert!(fields[0].parse::<f64>().unwrap() >= 0.0);
    }

    #[test]
    fn search_with_blank_term_prints_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let output = run_to_string(Command::Search {
            db: dir.path().join("empty.db"),
            kind: Kind::Notes,
            term: "  ".to_string(),
        });
        assert!(output.is_empty());
    }
}
