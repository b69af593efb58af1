use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use lecture_qa_core::{
    load_lectures_json, retrieve, AnswerMode, ChatCompletion, ChunkIndex, ConversationController,
    OpenAiCompatibleClient, QaConfig, TurnOutcome, TurnReply,
};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "lecture-qa", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// TOML file with settings and retrieval tuning
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Answer mode: local or smart
    #[arg(long, env = "LECTURE_QA_MODE", global = true)]
    mode: Option<AnswerMode>,

    /// Model identifier sent to the completion service
    #[arg(long, env = "LECTURE_QA_MODEL", global = true)]
    model: Option<String>,

    /// Base URL of the chat-completion service
    #[arg(long, env = "LECTURE_QA_BASE_URL", global = true)]
    base_url: Option<String>,

    /// Bearer credential for the completion service
    #[arg(long, env = "LECTURE_QA_API_KEY", global = true, hide_env_values = true)]
    api_key: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Ask a single question and print the answer with its sources.
    Ask {
        /// JSON file holding the lecture array.
        #[arg(long)]
        corpus: PathBuf,
        /// Question text.
        #[arg(long)]
        question: String,
    },
    /// Interactive conversation; `/clear` resets history, `/exit` quits.
    Chat {
        /// JSON file holding the lecture array.
        #[arg(long)]
        corpus: PathBuf,
    },
    /// Show the ranked passages for a query without composing an answer.
    Search {
        /// JSON file holding the lecture array.
        #[arg(long)]
        corpus: PathBuf,
        /// Search query
        #[arg(long)]
        query: String,
        /// Number of passages to return.
        #[arg(long)]
        top_k: Option<usize>,
    },
}

impl Cli {
    fn resolve_config(&self) -> anyhow::Result<QaConfig> {
        let mut config = match &self.config {
            Some(path) => QaConfig::load(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => QaConfig::default(),
        };

        if let Some(mode) = self.mode {
            config.settings.mode = mode;
        }
        if let Some(model) = &self.model {
            config.settings.model = model.clone();
        }
        if let Some(base_url) = &self.base_url {
            config.settings.base_url = base_url.clone();
        }
        if let Some(api_key) = &self.api_key {
            config.settings.api_key = api_key.clone();
        }

        config.validate()?;
        Ok(config)
    }
}

fn load_index(corpus: &Path, config: &QaConfig) -> anyhow::Result<Arc<ChunkIndex>> {
    let lectures = load_lectures_json(corpus)
        .with_context(|| format!("failed to load lectures from {}", corpus.display()))?;
    let index = ChunkIndex::build(&lectures, config.retrieval.min_paragraph_chars);

    info!(
        corpus = %corpus.display(),
        lecture_count = lectures.len(),
        chunk_count = index.len(),
        "indexed corpus"
    );
    if index.is_empty() {
        warn!("corpus produced no passages; every question will get the no-answer message");
    }

    Ok(Arc::new(index))
}

fn controller_for(
    index: Arc<ChunkIndex>,
    config: &QaConfig,
) -> ConversationController<OpenAiCompatibleClient> {
    ConversationController::new(index, config.settings.clone(), OpenAiCompatibleClient::new())
        .with_retrieval(config.retrieval.clone())
        .with_limits(config.answer.clone())
        .with_options(config.conversation.clone())
}

fn print_reply(reply: &TurnReply) {
    println!("{}", reply.answer.trim_end());

    if let Some(notice) = &reply.notice {
        println!();
        println!("* {notice}");
    }

    if !reply.citations.is_empty() {
        println!();
        println!("منابع پاسخ:");
        for citation in &reply.citations {
            println!(
                "- {} (جلسه {}) [{}]",
                citation.lecture_title, citation.session_number, citation.lecture_id
            );
            println!("  {}", citation.excerpt);
        }
    }
}

fn outcome_label(outcome: &TurnOutcome) -> &'static str {
    match outcome {
        TurnOutcome::Local => "local",
        TurnOutcome::LocalWithExplain => "local-missing-key",
        TurnOutcome::Remote => "remote",
        TurnOutcome::RemoteFallback { .. } => "remote-fallback",
    }
}

async fn run_chat<C: ChatCompletion>(
    controller: &mut ConversationController<C>,
) -> anyhow::Result<()> {
    println!("سلام. سوال خود را بپرسید تا بر اساس متن سخنرانی ها پاسخ بدهم و رفرنس جلسه بدهم.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        match line.trim() {
            "" => continue,
            "/exit" | "/quit" => break,
            "/clear" => {
                controller.clear_history();
                println!("history cleared");
            }
            "/history" => {
                for turn in controller.history() {
                    println!(
                        "[{}] {}: {}",
                        turn.at.format("%H:%M:%S"),
                        turn.role.as_str(),
                        turn.content
                    );
                }
            }
            question => match controller.submit(question).await {
                Ok(reply) => {
                    info!(outcome = outcome_label(&reply.outcome), "turn answered");
                    print_reply(&reply);
                    println!();
                }
                Err(error) => warn!(%error, "question skipped"),
            },
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = cli.resolve_config()?;

    info!(
        version = app_version,
        started_at = %Utc::now().to_rfc3339(),
        settings = ?config.settings,
        "lecture-qa boot"
    );

    match &cli.command {
        Command::Ask { corpus, question } => {
            let index = load_index(corpus, &config)?;
            let mut controller = controller_for(index, &config);
            let reply = controller.submit(question).await?;
            info!(outcome = outcome_label(&reply.outcome), "turn answered");
            print_reply(&reply);
        }
        Command::Chat { corpus } => {
            let index = load_index(corpus, &config)?;
            let mut controller = controller_for(index, &config);
            run_chat(&mut controller).await?;
        }
        Command::Search {
            corpus,
            query,
            top_k,
        } => {
            let index = load_index(corpus, &config)?;
            let mut retrieval = config.retrieval.clone();
            if let Some(top_k) = top_k {
                retrieval.top_k = (*top_k).max(1);
            }

            let hits = retrieve(query, &index, &retrieval);
            println!("query: {query}");
            if hits.is_empty() {
                println!("no passage shares a term with the query");
            }
            for (rank, hit) in hits.iter().enumerate() {
                println!(
                    "[{}] score={:.4} chunk={} lecture={} session={}",
                    rank + 1,
                    hit.score,
                    hit.chunk.id,
                    hit.chunk.lecture_id,
                    hit.chunk.session_number
                );
                println!("  {}", hit.chunk.paragraph);
            }
        }
    }

    Ok(())
}
