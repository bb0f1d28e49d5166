use anyhow::Context;
use application::embedding_cache::EmbeddingCacheManager;
use application::lead_service::LeadService;
use application::rag_service::RagService;
use clap::{Parser, Subcommand};
use colored::Colorize;
use dialoguer::Input;
use domain::conversation::ConversationMessage;
use domain::error::ServiceError;
use domain::lead::{Lead, LeadSubmission};
use domain::models::{ChatRequest, ChatResponse, Corpus, ErrorResponse};
use infrastructure::config::Config;
use infrastructure::corpus_loader::CorpusLoader;
use infrastructure::embedding_storage::EmbeddingStorage;
use infrastructure::lead_storage::LeadStorage;
use infrastructure::openai_client::OpenAiClient;
use serde::Serialize;
use shared::confirmation::confirm_action;
use shared::types::Result;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "faq_agent")]
#[command(about = "Knowledge-grounded FAQ assistant with lead capture")]
pub struct Cli {
    /// Print JSON ({"answer"} / {"error"}) instead of formatted text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Ask a single question
    Ask {
        /// JSON file holding prior conversation messages
        #[arg(long)]
        history: Option<PathBuf>,

        /// The question to ask
        #[arg(required = true, trailing_var_arg = true)]
        message: Vec<String>,
    },
    /// Interactive chat; type `exit` or `quit` to leave
    Chat,
    /// Record a sales lead (email or phone required)
    Lead {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        company: Option<String>,
        #[arg(long)]
        message: Option<String>,
    },
    /// Load the embedding cache, building it if needed
    Warm {
        /// Delete the snapshot on disk and re-embed the corpus
        #[arg(long)]
        rebuild: bool,

        /// Skip the confirmation prompt for --rebuild
        #[arg(long, short = 'y')]
        yes: bool,
    },
}

#[derive(Serialize)]
struct LeadReceipt<'a> {
    ok: bool,
    lead: &'a Lead,
}

type Service = RagService<OpenAiClient, OpenAiClient>;

pub struct CliApp {
    config: Config,
    corpus: Arc<Corpus>,
    json: bool,
}

/// Parse-to-exit-code entry point. Every failure, startup included, is
/// reported once, as `{"error": ..}` under `--json`.
pub async fn run(cli: Cli) -> ExitCode {
    let json = cli.json;
    let outcome = match CliApp::new(json) {
        Ok(app) => app.run(cli.command).await,
        Err(err) => Err(err),
    };
    outcome.unwrap_or_else(|err| report_failure(json, &err))
}

impl CliApp {
    /// Load configuration and the corpus. Failures here abort startup.
    pub fn new(json: bool) -> Result<Self> {
        let config = Config::load()?;
        config.ensure_data_dir()?;
        let corpus = CorpusLoader::load(&config.agent_config_path)?;
        Ok(Self {
            config,
            corpus: Arc::new(corpus),
            json,
        })
    }

    pub async fn run(&self, command: Command) -> Result<ExitCode> {
        match command {
            Command::Ask { history, message } => {
                let history = match history {
                    Some(path) => load_history(&path)?,
                    None => Vec::new(),
                };
                let request = ChatRequest::new(message.join(" ")).with_history(history);
                let service = self.rag_service()?;
                let outcome = self.ask(&service, &request).await;
                self.report(outcome, |response| println!("{}", response.answer))
            }
            Command::Chat => self.run_chat().await,
            Command::Lead {
                name,
                email,
                phone,
                company,
                message,
            } => {
                let submission = LeadSubmission {
                    name,
                    email,
                    phone,
                    company,
                    message,
                };
                let store = LeadStorage::new(&self.config.leads_db_path)
                    .with_context(|| format!("Failed to open lead store {:?}", self.config.leads_db_path))?;
                let service = LeadService::new(Arc::new(store));
                let outcome = service.submit(&submission).await;
                let json = self.json;
                self.report_with(outcome, |lead| {
                    if json {
                        emit(&LeadReceipt { ok: true, lead })
                    } else {
                        println!("{} lead {} recorded", "✓".green(), lead.id.bold());
                        Ok(())
                    }
                })
            }
            Command::Warm { rebuild, yes } => self.run_warm(rebuild, yes).await,
        }
    }

    fn rag_service(&self) -> Result<Service> {
        let client = Arc::new(OpenAiClient::new(&self.config)?);
        let cache = Arc::new(EmbeddingCacheManager::new(
            Arc::clone(&self.corpus),
            Arc::clone(&client),
            EmbeddingStorage::new(&self.config.embeddings_path),
        ));
        Ok(RagService::new(Arc::clone(&self.corpus), cache, client))
    }

    async fn ask(
        &self,
        service: &Service,
        request: &ChatRequest,
    ) -> std::result::Result<ChatResponse, ServiceError> {
        match self.config.request_deadline {
            Some(deadline) => service.answer_with_deadline(request, deadline).await,
            None => service.answer(request).await,
        }
    }

    async fn run_chat(&self) -> Result<ExitCode> {
        let service = self.rag_service()?;
        let mut history: Vec<ConversationMessage> = Vec::new();

        loop {
            let user_input = Input::<String>::new()
                .with_prompt("you")
                .allow_empty(true)
                .interact_text()?;
            let trimmed = user_input.trim();
            if trimmed.is_empty() {
                continue;
            }
            if trimmed.eq_ignore_ascii_case("exit") || trimmed.eq_ignore_ascii_case("quit") {
                break;
            }

            let request = ChatRequest::new(user_input.clone()).with_history(history.clone());
            match self.ask(&service, &request).await {
                Ok(response) => {
                    println!("{} {}", "agent:".cyan().bold(), response.answer);
                    history.push(ConversationMessage::user(user_input));
                    history.push(ConversationMessage::agent(response.answer));
                }
                Err(err) => eprintln!("{} {}", "Error:".red().bold(), err),
            }
        }

        Ok(ExitCode::SUCCESS)
    }

    async fn run_warm(&self, rebuild: bool, yes: bool) -> Result<ExitCode> {
        let service = self.rag_service()?;
        let cache = service.cache();

        if rebuild {
            if !confirm_action("Delete the embedding cache and re-embed the corpus", yes)? {
                return Ok(ExitCode::SUCCESS);
            }
            cache.storage().remove().await?;
            cache.invalidate().await;
        }

        let outcome = cache.ensure_valid().await.map(|vectors| vectors.len());
        tracing::debug!(status = ?cache.status(), "embedding cache");
        let json = self.json;
        self.report_with(outcome, |entries| {
            if json {
                emit(&serde_json::json!({ "ok": true, "entries": entries }))
            } else {
                println!("{} embedding cache ready ({entries} entries)", "✓".green());
                Ok(())
            }
        })
    }

    fn report(
        &self,
        outcome: std::result::Result<ChatResponse, ServiceError>,
        print_text: impl FnOnce(&ChatResponse),
    ) -> Result<ExitCode> {
        let json = self.json;
        self.report_with(outcome, |response| {
            if json {
                emit(response)
            } else {
                print_text(response);
                Ok(())
            }
        })
    }

    fn report_with<T>(
        &self,
        outcome: std::result::Result<T, ServiceError>,
        on_success: impl FnOnce(&T) -> Result<()>,
    ) -> Result<ExitCode> {
        match outcome {
            Ok(value) => {
                on_success(&value)?;
                Ok(ExitCode::SUCCESS)
            }
            Err(err) => Ok(report_failure(self.json, &err.into())),
        }
    }
}

fn failure_body(err: &anyhow::Error) -> ErrorResponse {
    match err.downcast_ref::<ServiceError>() {
        Some(service_err) => ErrorResponse::from(service_err),
        None => ErrorResponse {
            error: format!("{err:#}"),
        },
    }
}

fn report_failure(json: bool, err: &anyhow::Error) -> ExitCode {
    tracing::debug!("request failed: {err:?}");
    if json {
        if let Err(emit_err) = emit(&failure_body(err)) {
            eprintln!("{} {:#}", "Error:".red().bold(), emit_err);
        }
    } else {
        eprintln!("{} {:#}", "Error:".red().bold(), err);
    }
    ExitCode::FAILURE
}

fn emit<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn load_history(path: &Path) -> Result<Vec<ConversationMessage>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read history file {:?}", path))?;
    serde_json::from_str(&raw).with_context(|| format!("Malformed history file {:?}", path))
}
