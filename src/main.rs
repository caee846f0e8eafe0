use std::io::Write as _;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use keyvc::clock::SystemClock;
use keyvc::orchestrate::ChangeSummary;
use keyvc::reconstruct::Revision;
use keyvc::{Repository, VcError, telemetry};
use keyvc_core::model::{CommitId, HistoryEntry, Key};

mod format;

use format::OutputFormat;

/// Per-file version control for a working tree
///
/// Every tracked file (a "key") keeps its own chain of commits under
/// `.vc/keys/<key>/.commits/`. Text files are stored as line diffs,
/// binary files as full copies. A full commit scans the whole tree and
/// records every changed key in one history entry.
///
/// QUICK START:
///
///   keyvc init
///   keyvc commit -m "first version"
///   keyvc diff
///   keyvc cat src/main.rs
///   keyvc log
#[derive(Parser)]
#[command(name = "keyvc")]
#[command(version, about)]
#[command(propagate_version = true)]
#[command(after_help = "See 'keyvc <command> --help' for more information on a specific command.")]
struct Cli {
    /// Working tree root
    #[arg(long, global = true, env = "KEYVC_ROOT", default_value = ".")]
    root: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the .vc metadata directory
    ///
    /// Safe to run multiple times; existing chains and history are kept.
    Init,

    /// Commit every added, modified and deleted file
    ///
    /// Exits with status 1 when nothing changed.
    Commit {
        /// Commit message (may span several lines)
        #[arg(short, long)]
        message: String,

        /// Output format: text or json
        #[arg(long)]
        format: Option<OutputFormat>,

        /// Shorthand for --format json
        #[arg(long, hide = true, conflicts_with = "format")]
        json: bool,
    },

    /// Show what the next commit would record, without writing anything
    Diff {
        /// Output format: text or json
        #[arg(long)]
        format: Option<OutputFormat>,

        /// Shorthand for --format json
        #[arg(long, hide = true, conflicts_with = "format")]
        json: bool,
    },

    /// Print a revision of a key to stdout
    ///
    /// Without --commit, prints the latest revision. Binary revisions are
    /// written as raw bytes.
    Cat {
        /// The key (path relative to the root, `/`-separated)
        key: Key,

        /// Stop at this commit id instead of the latest
        #[arg(short, long)]
        commit: Option<CommitId>,

        /// Read the chain archived by the commit at this timestamp
        #[arg(long, value_name = "TIMESTAMP")]
        archived: Option<u64>,
    },

    /// Write the latest revision of every key back into the working tree
    Rebuild {
        /// Output format: text or json
        #[arg(long)]
        format: Option<OutputFormat>,

        /// Shorthand for --format json
        #[arg(long, hide = true, conflicts_with = "format")]
        json: bool,
    },

    /// List history entries, oldest first
    Log {
        /// Output format: text or json
        #[arg(long)]
        format: Option<OutputFormat>,

        /// Shorthand for --format json
        #[arg(long, hide = true, conflicts_with = "format")]
        json: bool,
    },

    /// Print shell completions
    Completions {
        /// Target shell
        shell: clap_complete::Shell,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    telemetry::init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let code = err.downcast_ref::<VcError>().map_or(1, VcError::exit_code);
            if err.downcast_ref::<VcError>().is_some_and(VcError::is_noop) {
                eprintln!("{err}");
            } else {
                eprintln!("error: {err:#}");
            }
            ExitCode::from(code)
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let root = cli.root;
    match cli.command {
        Commands::Init => {
            Repository::init(&root)?;
            println!("Initialized keyvc metadata in {}", root.join(".vc").display());
            Ok(())
        }
        Commands::Commit {
            message,
            format,
            json,
        } => {
            let repo = Repository::open(&root)?;
            let entry = repo.full_commit(&message, &SystemClock)?;
            print_commit(&entry, OutputFormat::with_json_flag(format, json))
        }
        Commands::Diff { format, json } => {
            let repo = Repository::open(&root)?;
            let plan = repo.plan(&SystemClock)?;
            print_changes(&plan.summaries(), OutputFormat::with_json_flag(format, json))
        }
        Commands::Cat {
            key,
            commit,
            archived,
        } => {
            let repo = Repository::open(&root)?;
            let revision = match archived {
                Some(ts) => repo.cat_archived(ts, &key, commit.as_ref())?,
                None => repo.materialize(&key, commit.as_ref())?,
            };
            write_revision(&revision)
        }
        Commands::Rebuild { format, json } => {
            let repo = Repository::open(&root)?;
            let report = repo.rebuild()?;
            match OutputFormat::with_json_flag(format, json) {
                OutputFormat::Json => println!("{}", OutputFormat::Json.serialize(&report)?),
                OutputFormat::Text => println!("Rebuilt {} key(s)", report.written.len()),
            }
            Ok(())
        }
        Commands::Log { format, json } => {
            let repo = Repository::open(&root)?;
            let entries = repo.history()?;
            print_log(&entries, OutputFormat::with_json_flag(format, json))
        }
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "keyvc", &mut std::io::stdout());
            Ok(())
        }
    }
}

fn print_commit(entry: &HistoryEntry, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", format.serialize(entry)?),
        OutputFormat::Text => {
            println!(
                "Recorded {} with {} commit(s)",
                entry.timestamp,
                entry.commits.len()
            );
            for commit in &entry.commits {
                println!("  {commit}");
            }
        }
    }
    Ok(())
}

fn print_changes(changes: &[ChangeSummary], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", format.serialize(&changes)?),
        OutputFormat::Text if changes.is_empty() => println!("Nothing to commit"),
        OutputFormat::Text => {
            for change in changes {
                match change.inserted_lines {
                    Some(n) => println!(
                        "{:<9}{}  ({}, {n} inserted line(s))",
                        change.change, change.key, change.commit
                    ),
                    None => println!("{:<9}{}  ({})", change.change, change.key, change.commit),
                }
            }
        }
    }
    Ok(())
}

fn print_log(entries: &[HistoryEntry], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", format.serialize(&entries)?),
        OutputFormat::Text => {
            for entry in entries {
                println!("entry {}", entry.timestamp);
                for line in entry.message.lines() {
                    println!("    {line}");
                }
                for commit in &entry.commits {
                    println!("  {commit}");
                }
                println!();
            }
        }
    }
    Ok(())
}

fn write_revision(revision: &Revision) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(revision.as_bytes())
        .and_then(|()| stdout.flush())
        .context("writing revision to stdout")
}
