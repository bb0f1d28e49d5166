use anyhow::{anyhow, Context};
use dotenvy::dotenv;
use shared::types::Result;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub base_url: String,
    pub embedding_model: String,
    pub chat_model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub agent_config_path: PathBuf,
    pub data_dir: PathBuf,
    pub embeddings_path: PathBuf,
    pub leads_db_path: PathBuf,
    pub provider_timeout: Duration,
    pub request_deadline: Option<Duration>,
}

impl Config {
    /// Read `.env` (if present) and the process environment.
    pub fn load() -> Result<Self> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = get("OPENAI_API_KEY")
            .ok_or_else(|| anyhow!("Missing OPENAI_API_KEY. Set it in the environment or .env"))?;
        let data_dir = PathBuf::from(get("DATA_DIR").unwrap_or_else(|| "data".to_string()));
        let embeddings_path = get("EMBEDDINGS_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("faq_embeddings.json"));
        let leads_db_path = get("LEADS_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("leads.db"));

        Ok(Self {
            api_key,
            base_url: get("OPENAI_BASE_URL")
                .unwrap_or_else(|| "https://api.openai.com/v1".to_string())
                .trim_end_matches('/')
                .to_string(),
            embedding_model: get("EMBEDDING_MODEL")
                .unwrap_or_else(|| "text-embedding-3-small".to_string()),
            chat_model: get("CHAT_MODEL").unwrap_or_else(|| "gpt-4o-mini".to_string()),
            temperature: parse_or("CHAT_TEMPERATURE", get("CHAT_TEMPERATURE"), 0.2)?,
            max_tokens: parse_or("CHAT_MAX_TOKENS", get("CHAT_MAX_TOKENS"), 600)?,
            agent_config_path: PathBuf::from(
                get("AGENT_CONFIG_PATH").unwrap_or_else(|| "agent.json".to_string()),
            ),
            data_dir,
            embeddings_path,
            leads_db_path,
            provider_timeout: Duration::from_secs(parse_or(
                "PROVIDER_TIMEOUT_SECS",
                get("PROVIDER_TIMEOUT_SECS"),
                60,
            )?),
            request_deadline: get("REQUEST_DEADLINE_SECS")
                .map(|raw| parse_value::<u64>("REQUEST_DEADLINE_SECS", &raw))
                .transpose()?
                .map(Duration::from_secs),
        })
    }

    pub fn ensure_data_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir)
            .with_context(|| format!("Failed to create data dir {:?}", self.data_dir))
    }
}

fn parse_or<T: FromStr>(key: &str, raw: Option<String>, default: T) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    match raw {
        Some(raw) => parse_value(key, &raw),
        None => Ok(default),
    }
}

fn parse_value<T: FromStr>(key: &str, raw: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| anyhow!("Invalid value for {key} ({raw:?}): {e}"))
}
