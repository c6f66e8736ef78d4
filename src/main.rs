//! Command-line entry point.

use std::path::{
    Path,
    PathBuf,
};
use std::process::ExitCode;

use anyhow::{
    Context as _,
    Result,
    bail,
};
use clap::{
    Parser,
    Subcommand,
};
use qt_ts_catalog::catalog::{
    self,
    Message,
    TranslationStatus,
    TranslationTable,
};
use qt_ts_catalog::check::{
    self,
    ResultSet,
    Severity,
};
use qt_ts_catalog::config::{
    CatalogSettings,
    ConfigManager,
};
use qt_ts_catalog::indexer::WorkspaceIndexer;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Check and edit Qt Linguist translation files
#[derive(Parser, Debug)]
#[command(name = "qt-ts-catalog", version)]
struct Cli {
    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,
    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
    /// Directory holding `.ts-catalog.json`; defaults to the current directory
    #[arg(long, global = true)]
    workspace: Option<PathBuf>,
    /// Read settings from this file instead of the workspace
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Command to run
    #[command(subcommand)]
    command: Commands,
}

/// Message lookup shared by the editing commands.
#[derive(clap::Args, Debug)]
struct MessageTarget {
    /// Context name
    #[arg(long)]
    context: String,
    /// Source text of the message
    #[arg(long)]
    source: String,
    /// Disambiguation comment
    #[arg(long)]
    comment: Option<String>,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Translation progress per context
    Stats {
        /// Translation file
        file: PathBuf,
    },
    /// Print messages, one per line
    List {
        /// Translation file
        file: PathBuf,
        /// Only messages in this state
        #[arg(long)]
        status: Option<TranslationStatus>,
    },
    /// Report format problems and text rule findings
    Check {
        /// Files to check; every translation file of the workspace when empty
        files: Vec<PathBuf>,
        /// Write text rule findings of a single file as JSON
        #[arg(long)]
        json: Option<PathBuf>,
    },
    /// Set a finished translation
    Set {
        /// Translation file
        file: PathBuf,
        /// Message to translate
        #[command(flatten)]
        target: MessageTarget,
        /// New translation
        translation: String,
    },
    /// Mark a message obsolete
    Obsolete {
        /// Translation file
        file: PathBuf,
        /// Message to mark
        #[command(flatten)]
        target: MessageTarget,
    },
    /// Rewrite a file
    Fmt {
        /// Translation file
        file: PathBuf,
        /// Remove obsolete and vanished messages
        #[arg(long)]
        drop_obsolete: bool,
    },
    /// Remove findings from a results file written by `check --json`
    Results {
        /// Results file
        file: PathBuf,
        /// Findings to remove
        #[command(subcommand)]
        action: ResultsAction,
    },
}

/// Edits of a results file.
#[derive(Subcommand, Debug)]
enum ResultsAction {
    /// Remove the finding with this id
    Delete {
        /// Finding id, such as `3b`
        id: String,
    },
    /// Remove every finding of a type
    DeleteType {
        /// Error type, such as `banword`
        error_type: String,
    },
    /// Remove findings of a type with this offending text
    DeleteError {
        /// Error type, such as `banword`
        error_type: String,
        /// Offending character or word
        error: String,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let _guard = init_logging(cli.verbose, cli.log_file.as_deref())?;

    let workspace = match cli.workspace {
        Some(path) => path,
        None => std::env::current_dir().context("Failed to read the current directory")?,
    };

    match cli.command {
        Commands::Stats { file } => {
            print_stats(&load(&file)?);
            Ok(ExitCode::SUCCESS)
        }
        Commands::List { file, status } => {
            print_messages(&load(&file)?, status);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Check { files, json } => {
            let settings = load_settings(&workspace, cli.config.as_deref())?;
            run_check(&workspace, &settings, files, json.as_deref()).await
        }
        Commands::Set { file, target, translation } => {
            let mut table = load(&file)?;
            table.set_translation(
                &target.context,
                &target.source,
                target.comment.as_deref(),
                translation.as_str(),
            )?;
            save(&table, &file)?;
            tracing::info!("Translated '{}' in {}", target.source, file.display());
            Ok(ExitCode::SUCCESS)
        }
        Commands::Obsolete { file, target } => {
            let mut table = load(&file)?;
            table.mark_obsolete(&target.context, &target.source, target.comment.as_deref())?;
            save(&table, &file)?;
            tracing::info!("Marked '{}' obsolete in {}", target.source, file.display());
            Ok(ExitCode::SUCCESS)
        }
        Commands::Fmt { file, drop_obsolete } => {
            let mut table = load(&file)?;
            if drop_obsolete {
                let removed = table.drop_obsolete();
                tracing::info!("Removed {removed} obsolete messages");
            }
            save(&table, &file)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Results { file, action } => edit_results(&file, action),
    }
}

/// stderr by default, or a file through a non-blocking writer.
///
/// The returned guard flushes the file writer when dropped.
fn init_logging(verbose: bool, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let Some(path) = log_file else {
        tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
        return Ok(None);
    };

    let file_name = path.file_name().context("--log-file must name a file")?;
    let directory = path.parent().filter(|dir| !dir.as_os_str().is_empty()).unwrap_or(Path::new("."));
    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(directory, file_name));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(writer).with_ansi(false).init();
    Ok(Some(guard))
}

/// Reads `--config`, else `.ts-catalog.json` from the workspace, else the defaults.
fn load_settings(workspace: &Path, config: Option<&Path>) -> Result<CatalogSettings> {
    let mut manager = ConfigManager::new();
    match config {
        Some(path) => manager
            .load_settings_from_file(path)
            .with_context(|| format!("Invalid settings in {}", path.display()))?,
        None => manager.load_settings(Some(workspace.to_path_buf()))?,
    }
    Ok(manager.get_settings().clone())
}

/// Loads a table, naming the file on failure.
fn load(path: &Path) -> Result<TranslationTable> {
    catalog::load(path).with_context(|| format!("Failed to load {}", path.display()))
}

/// Saves a table, naming the file on failure.
fn save(table: &TranslationTable, path: &Path) -> Result<()> {
    catalog::save(table, path).with_context(|| format!("Failed to save {}", path.display()))
}

/// Status counts per context, then the total.
#[allow(clippy::print_stdout)]
fn print_stats(table: &TranslationTable) {
    let stats = table.stats();
    let width = stats.contexts.iter().map(|context| context.name.len()).max().unwrap_or(0).max(5);
    println!(
        "{:<width$} {:>10} {:>10} {:>6} {:>8} {:>9} {:>5}",
        "", "translated", "unfinished", "blank", "missing", "obsolete", "done"
    );
    let rows = stats.contexts.iter().map(|context| (context.name.as_str(), context.counts));
    for (name, counts) in rows.chain(std::iter::once(("total", stats.total))) {
        println!(
            "{:<width$} {:>10} {:>10} {:>6} {:>8} {:>9} {:>4}%",
            name,
            counts.translated,
            counts.unfinished,
            counts.blank,
            counts.missing,
            counts.obsolete + counts.vanished,
            counts.percent_done()
        );
    }
}

/// Tab-separated context, source, status and translation.
#[allow(clippy::print_stdout)]
fn print_messages(table: &TranslationTable, status: Option<TranslationStatus>) {
    for (context, message) in table.iter_messages() {
        let message_status = message.status();
        if status.is_some_and(|wanted| wanted != message_status) {
            continue;
        }
        println!(
            "{}\t{}\t{}\t{}",
            context.name(),
            message.source(),
            message_status,
            translation_text(message)
        );
    }
}

/// Plural forms joined by ` | `.
fn translation_text(message: &Message) -> String {
    message.translation().map(|t| t.text.forms().join(" | ")).unwrap_or_default()
}

/// Loads a results file, removes findings and writes it back.
///
/// Fails when `delete` names an unknown id.
fn edit_results(path: &Path, action: ResultsAction) -> Result<ExitCode> {
    let mut results = ResultSet::load(path)
        .with_context(|| format!("Failed to load results from {}", path.display()))?;
    let removed = match action {
        ResultsAction::Delete { id } => {
            if results.delete_entry(&id).is_none() {
                bail!("No finding with id {id} in {}", path.display());
            }
            1
        }
        ResultsAction::DeleteType { error_type } => results.delete_error_type(&error_type),
        ResultsAction::DeleteError { error_type, error } => {
            results.delete_specific_error(&error_type, &error)
        }
    };
    results
        .save(path)
        .with_context(|| format!("Failed to save results to {}", path.display()))?;
    tracing::info!("Removed {removed} findings, {} left", results.len());
    Ok(ExitCode::SUCCESS)
}

/// Validates each table and runs the text rules.
///
/// Fails when a file cannot be loaded or a diagnostic is an error.
#[allow(clippy::print_stdout)]
async fn run_check(
    workspace: &Path,
    settings: &CatalogSettings,
    files: Vec<PathBuf>,
    json: Option<&Path>,
) -> Result<ExitCode> {
    if json.is_some() && files.len() > 1 {
        bail!("--json needs exactly one translation file, found {}", files.len());
    }

    let mut tables = Vec::new();
    let mut failed = false;
    if files.is_empty() {
        let catalog =
            WorkspaceIndexer::from_settings(settings).load_all(workspace, settings).await?;
        for failure in catalog.failures {
            println!("{}: error[load]: {}", failure.path.display(), failure.error);
            failed = true;
        }
        tables.extend(catalog.tables.into_iter().map(|loaded| (loaded.path, loaded.table)));
    } else {
        for path in files {
            match catalog::load(&path) {
                Ok(table) => tables.push((path, table)),
                Err(error) => {
                    println!("{}: error[load]: {error}", path.display());
                    failed = true;
                }
            }
        }
    }

    if json.is_some() && tables.len() != 1 {
        bail!("--json needs exactly one translation file, found {}", tables.len());
    }

    for (path, table) in &tables {
        for diagnostic in check::validate_with(table, settings.diagnostics) {
            failed |= diagnostic.severity == Severity::Error;
            println!("{}:{diagnostic}", path.display());
        }

        let results = check::check_table(table, &settings.check_rules);
        for (id, result) in results.iter() {
            println!(
                "{}:{}: {}[{}]: '{}' in \"{}\"",
                path.display(),
                result.line_number,
                result.explanation,
                id,
                result.error,
                result.line
            );
        }
        if let Some(json) = json {
            results.save(json)?;
        }
    }

    Ok(if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}
