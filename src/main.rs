use anyhow::{Context, Result};
use async_trait::async_trait;
use ragdesk::{
    ActionOutcome, ChatSession, ConfirmationRequest, Dispatch, HistoryStatus, HttpBackend,
    Interaction, NoticeKind, types::UploadFile, types::UploadResult,
};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;
use tracing_subscriber::EnvFilter;

const HELP: &str = "\
commands:
  models                    list available models
  model <name>              select a model
  ask <question>            ask the selected model
  history                   show the conversation
  files <path>...           select documents to ingest
  upload [size] [overlap]   ingest the selected documents
  clear-history             delete the conversation history
  reset-index               delete every indexed document
  quit";

/// Shared stdin so confirmations and commands read from the same stream.
#[derive(Clone)]
struct Console {
    lines: Arc<Mutex<Lines<BufReader<Stdin>>>>,
}

impl Console {
    fn new() -> Self {
        Self {
            lines: Arc::new(Mutex::new(BufReader::new(tokio::io::stdin()).lines())),
        }
    }

    /// `Ok(None)` once stdin is closed.
    async fn prompt(&self, text: &str) -> std::io::Result<Option<String>> {
        let mut stdout = tokio::io::stdout();
        stdout.write_all(text.as_bytes()).await?;
        stdout.flush().await?;
        self.lines.lock().await.next_line().await
    }
}

struct TerminalInteraction {
    console: Console,
}

#[async_trait]
impl Interaction for TerminalInteraction {
    async fn confirm(&self, request: &ConfirmationRequest) -> bool {
        println!("{}: {}", request.title, request.message);
        let question = format!(
            "[y] {} / [n] {} > ",
            request.confirm_label, request.cancel_label
        );
        match self.console.prompt(&question).await {
            Ok(answer) => matches!(
                answer
                    .map(|answer| answer.trim().to_ascii_lowercase())
                    .as_deref(),
                Some("y" | "yes")
            ),
            Err(err) => {
                tracing::warn!(error = %err, "console unavailable, treating as cancel");
                false
            }
        }
    }

    fn notify(&self, kind: NoticeKind, title: &str, message: &str) {
        let tag = match kind {
            NoticeKind::Success => "ok",
            NoticeKind::Warning => "warning",
            NoticeKind::Failure => "error",
            NoticeKind::Info => "info",
        };
        println!("[{tag}] {title}: {message}");
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ragdesk=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn parse_number(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|value| value.parse().ok())
}

fn print_history(session: &ChatSession) {
    match session.history().status() {
        HistoryStatus::Loading => println!("Loading history..."),
        HistoryStatus::Failed(error) => println!("{error}"),
        HistoryStatus::Ready if session.history().is_empty() => println!("(no conversation yet)"),
        HistoryStatus::Ready => {
            for entry in session.history().entries() {
                println!("> {}", entry.question);
                println!("{}", entry.answer);
                println!("  {}\n", entry.display_timestamp());
            }
        }
    }
}

fn print_upload(result: &UploadResult) {
    if result.has_indexed() {
        println!("Indexed {} file(s):", result.files_indexed.len());
        for file in &result.files_indexed {
            println!("  - {file}");
        }
        println!("{} chunks generated.", result.total_chunks);
    }
    if result.has_errors() {
        println!("Some files could not be processed:");
        for error in &result.errors {
            println!("  - {}: {}", error.file, error.error);
        }
    }
}

async fn select_files(session: &ChatSession, paths: &[&str]) {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        match UploadFile::from_path(path).await {
            Ok(file) => files.push(file),
            Err(err) => println!("skipping {path}: {err}"),
        }
    }
    println!("{} file(s) selected.", files.len());
    session.select_files(files);
}

async fn run_command(session: &ChatSession, line: &str) -> bool {
    let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
    let rest = rest.trim();
    match command {
        "" => {}
        "help" => println!("{HELP}"),
        "quit" | "exit" => return false,
        "models" => {
            let selected = session.selected_model();
            for model in session.models().models {
                let marker = if Some(&model) == selected.as_ref() { "*" } else { " " };
                println!("{marker} {model}");
            }
        }
        "model" => {
            if !session.select_model(rest) {
                println!("usage: model <name>");
            }
        }
        "ask" => match session.ask(rest).await {
            Dispatch::Rejected => println!("Select a model and type a question first."),
            Dispatch::Discarded(_) => {}
            Dispatch::Applied(_) => match session.visible_error() {
                Some(error) => println!("{error}"),
                None => println!("{}", session.dispatcher().last_answer().unwrap_or_default()),
            },
        },
        "history" => print_history(session),
        "files" => {
            let paths: Vec<&str> = rest.split_whitespace().collect();
            select_files(session, &paths).await;
        }
        "upload" => {
            let mut args = rest.split_whitespace();
            let size = parse_number(args.next());
            let overlap = parse_number(args.next());
            if let Some(result) = session.upload(size, overlap).await {
                print_upload(&result);
            }
        }
        "clear-history" => {
            if let ActionOutcome::Succeeded(_) = session.clear_history().await {
                print_history(session);
            }
        }
        "reset-index" => {
            session.reset_index().await;
        }
        other => println!("unknown command: {other} (try `help`)"),
    }
    true
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let backend = HttpBackend::from_env().context("failed to configure the RAG backend")?;
    tracing::info!(url = %backend.config().base_url, "connecting");

    let console = Console::new();
    let interaction = Arc::new(TerminalInteraction {
        console: console.clone(),
    });
    let session = ChatSession::new(Arc::new(backend), interaction);
    session.load().await;
    print_history(&session);

    while let Some(line) = console
        .prompt("ragdesk> ")
        .await
        .context("console input failed")?
    {
        if !run_command(&session, line.trim()).await {
            break;
        }
    }
    Ok(())
}
