//! Line-oriented interactive shell
//!
//! Each input line is tokenized with shell-style quoting and parsed with the
//! same clap argument structs as the one-shot commands, so `query`, `inspect`
//! and friends accept identical options in both places. Line editing, history
//! and tab completion come from rustyline.

use clap::{CommandFactory, Parser, Subcommand};
use console::style;
use miette::{IntoDiagnostic, Result};
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{Editor, Helper};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::debug;

use crate::cli::commands::utils::{plural, Context};
use crate::cli::commands::{inspect, query, rank, search, stats};
use crate::core::database::NeoDatabase;
use crate::core::query::RankOrder;

pub const PROMPT: &str = "(neo) ";

const INTRO: &str = "Welcome to the NEO explorer shell.\n\
Type 'help' to list commands, 'help <command>' for details, and 'exit' to quit.";

#[derive(Parser, Debug)]
#[command(name = "neo", no_binary_name = true, disable_version_flag = true)]
struct ShellLine {
    #[command(subcommand)]
    command: ShellCommand,
}

#[derive(Subcommand, Debug)]
enum ShellCommand {
    /// Inspect an NEO by primary designation or by name
    #[command(alias = "i")]
    Inspect(inspect::InspectArgs),

    /// Query close approaches that match the given criteria
    #[command(alias = "q")]
    Query(query::QueryArgs),

    /// Search NEOs by designation or name
    Search(search::SearchArgs),

    /// Show the closest approaches to Earth
    Closest(rank::RankArgs),

    /// Show the fastest approaches to Earth
    Fastest(rank::RankArgs),

    /// Show the most recent close approaches
    Recent(rank::RankArgs),

    /// Show database statistics
    Stats(stats::StatsArgs),

    /// Leave the shell
    #[command(alias = "quit")]
    Exit,
}

/// What the loop does after a line has been handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Error from [`split_line`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenizeError {
    #[error("unterminated {0} quote")]
    UnterminatedQuote(char),
    #[error("trailing backslash")]
    TrailingEscape,
}

/// Split a line into words, honoring single quotes, double quotes and
/// backslash escapes
pub fn split_line(line: &str) -> Result<Vec<String>, TokenizeError> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match c {
            '\'' | '"' => {
                in_word = true;
                let quote = c;
                loop {
                    match chars.next() {
                        Some(q) if q == quote => break,
                        Some('\\') if quote == '"' => match chars.next() {
                            Some(escaped) => current.push(escaped),
                            None => return Err(TokenizeError::UnterminatedQuote(quote)),
                        },
                        Some(other) => current.push(other),
                        None => return Err(TokenizeError::UnterminatedQuote(quote)),
                    }
                }
            }
            '\\' => {
                in_word = true;
                current.push(chars.next().ok_or(TokenizeError::TrailingEscape)?);
            }
            c if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            c => {
                in_word = true;
                current.push(c);
            }
        }
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}

/// Modification times of the data files at session start
#[derive(Debug)]
struct FileWatch {
    files: Vec<(PathBuf, Option<SystemTime>)>,
}

impl FileWatch {
    fn new(paths: Vec<PathBuf>) -> Self {
        let files = paths
            .into_iter()
            .map(|path| {
                let mtime = modified(&path);
                (path, mtime)
            })
            .collect();
        Self { files }
    }

    /// First watched file whose modification time differs from the recorded one
    fn changed(&self) -> Option<&Path> {
        self.files
            .iter()
            .find(|(path, mtime)| modified(path) != *mtime)
            .map(|(path, _)| path.as_path())
    }
}

fn modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|meta| meta.modified()).ok()
}

/// Source of input lines for a session
pub trait LineReader {
    /// Next line, or `None` when the session should end (EOF or Ctrl-C)
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>>;
}

impl<H: Helper> LineReader for Editor<H, DefaultHistory> {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        match self.readline(prompt) {
            Ok(line) => Ok(Some(line)),
            Err(ReadlineError::Eof) | Err(ReadlineError::Interrupted) => Ok(None),
            Err(e) => Err(miette::miette!("Cannot read input: {}", e)),
        }
    }
}

/// Completes command names, then the long options of the typed command
struct ShellHelper;

/// Completion candidates for the word ending at `pos`
fn complete_word(line: &str, pos: usize) -> (usize, Vec<String>) {
    let up_to = &line[..pos];
    let start = up_to.rfind(char::is_whitespace).map_or(0, |i| i + 1);
    let partial = &up_to[start..];
    let words: Vec<&str> = up_to.split_whitespace().collect();
    let cmd = ShellLine::command();

    if start == 0 {
        let mut names: Vec<String> = cmd
            .get_subcommands()
            .flat_map(|sub| std::iter::once(sub.get_name()).chain(sub.get_all_aliases()))
            .chain(["help"])
            .filter(|name| name.starts_with(partial))
            .map(String::from)
            .collect();
        names.sort();
        names.dedup();
        return (start, names);
    }

    if !partial.starts_with('-') {
        return (pos, Vec::new());
    }
    let options: Vec<String> = words
        .first()
        .and_then(|name| cmd.find_subcommand(name))
        .map(|sub| {
            sub.get_arguments()
                .filter_map(|arg| arg.get_long())
                .map(|long| format!("--{}", long))
                .filter(|option| option.starts_with(partial))
                .collect()
        })
        .unwrap_or_default();
    (start, options)
}

impl Completer for ShellHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let (start, words) = complete_word(line, pos);
        let pairs = words
            .into_iter()
            .map(|word| Pair {
                display: word.clone(),
                replacement: word,
            })
            .collect();
        Ok((start, pairs))
    }
}

impl Hinter for ShellHelper {
    type Hint = String;
}
impl Highlighter for ShellHelper {}
impl Validator for ShellHelper {}
impl Helper for ShellHelper {}

fn history_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "neo").map(|dirs| dirs.data_dir().join("history.txt"))
}

/// Interactive session over a loaded database
pub struct Shell<'db> {
    db: &'db NeoDatabase,
    ctx: Context,
    aggressive: bool,
    watch: FileWatch,
    warned: bool,
}

impl<'db> Shell<'db> {
    /// `data_files` are watched for modification during the session
    pub fn new(
        db: &'db NeoDatabase,
        ctx: Context,
        data_files: Vec<PathBuf>,
        aggressive: bool,
    ) -> Self {
        Self {
            db,
            ctx,
            aggressive,
            watch: FileWatch::new(data_files),
            warned: false,
        }
    }

    /// Run an interactive session on the terminal with line editing and history
    pub fn run(&mut self) -> Result<()> {
        let config = rustyline::Config::builder().auto_add_history(true).build();
        let mut editor: Editor<ShellHelper, DefaultHistory> =
            Editor::with_config(config).into_diagnostic()?;
        editor.set_helper(Some(ShellHelper));

        let history = history_path();
        if let Some(path) = &history {
            let _ = editor.load_history(path);
        }

        let result = self.run_with(&mut editor);

        if let Some(path) = &history {
            if let Some(dir) = path.parent() {
                let _ = fs::create_dir_all(dir);
            }
            let _ = editor.save_history(path);
        }
        result
    }

    /// Read and execute lines from `input` until `exit`, `quit`, EOF or Ctrl-C
    pub fn run_with<L: LineReader>(&mut self, input: &mut L) -> Result<()> {
        if !self.ctx.quiet {
            let stats = self.db.statistics();
            println!("{}", INTRO);
            println!(
                "Database loaded: {}, {}.",
                plural(stats.total_neos, "NEO", "NEOs"),
                plural(stats.total_approaches, "close approach", "close approaches")
            );
        }

        while let Some(line) = input.read_line(PROMPT)? {
            if self.data_changed() {
                break;
            }

            match self.execute(&line) {
                Ok(Flow::Continue) => {}
                Ok(Flow::Exit) => break,
                Err(report) => eprintln!("{} {:?}", style("Error:").red().bold(), report),
            }
        }

        if !self.ctx.quiet {
            println!("Goodbye!");
        }
        Ok(())
    }

    /// True when the session must end because a data file was modified
    fn data_changed(&mut self) -> bool {
        let Some(path) = self.watch.changed() else {
            return false;
        };
        if self.aggressive {
            eprintln!(
                "{} {} changed since the database was loaded. Ending session.",
                style("Note:").yellow().bold(),
                path.display()
            );
            return true;
        }
        if !self.warned {
            eprintln!(
                "{} {} changed since the database was loaded. Restart to see the new data.",
                style("Warning:").yellow().bold(),
                path.display()
            );
            self.warned = true;
        }
        false
    }

    /// Execute one input line
    pub fn execute(&self, line: &str) -> Result<Flow> {
        let mut words = split_line(line).map_err(|e| miette::miette!("{}", e))?;
        if words.is_empty() {
            return Ok(Flow::Continue);
        }
        if words[0] == "?" {
            words[0] = "help".to_string();
        }
        debug!(command = %words[0], "shell command");

        let parsed = match ShellLine::try_parse_from(&words) {
            Ok(parsed) => parsed,
            Err(err) => {
                // Help requests and usage errors are both reported by clap
                err.print().into_diagnostic()?;
                return Ok(Flow::Continue);
            }
        };

        let (db, ctx) = (self.db, &self.ctx);
        match parsed.command {
            ShellCommand::Inspect(args) => inspect::run(args, db, ctx)?,
            ShellCommand::Query(args) => query::run(args, db, ctx)?,
            ShellCommand::Search(args) => search::run(args, db, ctx)?,
            ShellCommand::Closest(args) => rank::run(RankOrder::Closest, args, db, ctx)?,
            ShellCommand::Fastest(args) => rank::run(RankOrder::Fastest, args, db, ctx)?,
            ShellCommand::Recent(args) => rank::run(RankOrder::Recent, args, db, ctx)?,
            ShellCommand::Stats(args) => stats::run(args, db, ctx)?,
            ShellCommand::Exit => return Ok(Flow::Exit),
        }
        Ok(Flow::Continue)
    }
}
