use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::browser::session::DEFAULT_SERVER_SCRIPT;
use crate::mail::smtp::{DEFAULT_SMTP_PORT, DEFAULT_SMTP_SERVER};
use crate::portal::applier::{ApplyConfig, LOAD_SETTLE_MS, MAX_PAGES, PAGE_SETTLE_MS};
use crate::portal::submit_policy::SubmitMode;

pub const DEFAULT_CONFIG_FILE: &str = "job-assistant.yaml";
pub const SECRETS_FILE: &str = "secrets.yaml";
pub const PDF_RESUME_FILE: &str = "resume.pdf";
pub const API_KEY_ENV: &str = "LLM_API_KEY";

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "job-assistant",
    version,
    about = "AI-assisted job applications: CV parsing, cover letters, email and portal applications"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to config file (default: job-assistant.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Language model provider
    #[arg(long, value_enum, global = true)]
    pub llm_provider: Option<LlmProvider>,

    /// Language model API endpoint
    #[arg(long, global = true)]
    pub llm_endpoint: Option<String>,

    /// Language model name
    #[arg(long, global = true)]
    pub llm_model: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Parse a PDF CV into the data folder's plain-text resume
    UpdateCv {
        /// Path to the PDF CV
        #[arg(long)]
        cv_path: String,
    },

    /// Draft a cover letter for a job description
    DraftLetter {
        /// Job description text
        #[arg(long)]
        job_description: Option<String>,

        /// Read the job description from a file
        #[arg(long, conflicts_with = "job_description")]
        job_file: Option<String>,
    },

    /// Draft a cover letter and email it to a recruiter with the CV attached
    ApplyEmail {
        /// Job description text
        #[arg(long)]
        job_description: Option<String>,

        /// Read the job description from a file
        #[arg(long, conflicts_with = "job_description")]
        job_file: Option<String>,

        /// Recruiter email address
        #[arg(long)]
        recruiter_email: Option<String>,

        /// Your Gmail address
        #[arg(long)]
        gmail_user: Option<String>,

        /// Your Gmail app password (prompted without echo when omitted)
        #[arg(long)]
        gmail_password: Option<String>,

        /// CV to attach (default: resume.pdf in the data folder)
        #[arg(long)]
        cv_path: Option<String>,
    },

    /// Fill (and optionally submit) an application form on a job portal
    ApplyPortal {
        /// URL of the job portal application page
        #[arg(long)]
        url: Option<String>,

        /// Maximum form pages to walk through (at least 1)
        #[arg(long, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
        max_pages: Option<usize>,

        /// Click the submit control without asking
        #[arg(long, conflicts_with = "dry_run")]
        auto_submit: bool,

        /// Fill the form but never click submit
        #[arg(long)]
        dry_run: bool,

        /// Close the browser as soon as the run ends
        #[arg(long)]
        no_keep_open: bool,

        /// Run the browser without a window
        #[arg(long)]
        headless: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    #[default]
    Ollama,
    Openai,
}

// ============================================================================
// Config File Model (optional YAML)
// ============================================================================

/// Optional YAML config file: `job-assistant.yaml`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_data_folder")]
    pub data_folder: String,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub apply: ApplySettings,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub mail: MailConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_folder: default_data_folder(),
            llm: LlmConfig::default(),
            apply: ApplySettings::default(),
            browser: BrowserConfig::default(),
            mail: MailConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn data_folder(&self) -> &Path {
        Path::new(&self.data_folder)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LlmConfig {
    #[serde(default)]
    pub provider: LlmProvider,
    pub endpoint: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplySettings {
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,

    #[serde(default = "default_load_settle")]
    pub load_settle_ms: u64,

    #[serde(default = "default_page_settle")]
    pub page_settle_ms: u64,

    #[serde(default)]
    pub submit: SubmitMode,

    /// JSONL trace of page passes; off when unset
    pub trace_file: Option<String>,
}

impl Default for ApplySettings {
    fn default() -> Self {
        Self {
            max_pages: MAX_PAGES,
            load_settle_ms: LOAD_SETTLE_MS,
            page_settle_ms: PAGE_SETTLE_MS,
            submit: SubmitMode::default(),
            trace_file: None,
        }
    }
}

impl ApplySettings {
    /// A `max_pages` of 0 in the config file is raised to 1.
    pub fn apply_config(&self) -> ApplyConfig {
        ApplyConfig {
            max_pages: self.max_pages.max(1),
            load_settle_ms: self.load_settle_ms,
            page_settle_ms: self.page_settle_ms,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    #[serde(default = "default_server_script")]
    pub script: String,

    #[serde(default)]
    pub headless: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            script: default_server_script(),
            headless: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    #[serde(default = "default_smtp_server")]
    pub smtp_server: String,

    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            smtp_server: default_smtp_server(),
            smtp_port: DEFAULT_SMTP_PORT,
        }
    }
}

// Serde default helpers
fn default_data_folder() -> String { "data_folder".to_string() }
fn default_max_pages() -> usize { MAX_PAGES }
fn default_load_settle() -> u64 { LOAD_SETTLE_MS }
fn default_page_settle() -> u64 { PAGE_SETTLE_MS }
fn default_server_script() -> String { DEFAULT_SERVER_SCRIPT.to_string() }
fn default_smtp_server() -> String { DEFAULT_SMTP_SERVER.to_string() }
fn default_smtp_port() -> u16 { DEFAULT_SMTP_PORT }

// ============================================================================
// Config and secrets loading
// ============================================================================

/// Load config from a YAML file. Returns defaults if the file is missing or malformed.
pub fn load_config(path: Option<&str>) -> AppConfig {
    let config_path = path.unwrap_or(DEFAULT_CONFIG_FILE);
    match std::fs::read_to_string(config_path) {
        Ok(content) => serde_yaml::from_str(&content).unwrap_or_else(|e| {
            warn!("Ignoring malformed config {}: {}", config_path, e);
            AppConfig::default()
        }),
        Err(_) => AppConfig::default(),
    }
}

/// `<data_folder>/secrets.yaml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Secrets {
    #[serde(default)]
    pub llm_api_key: Option<String>,
}

pub fn secrets_path(data_folder: &Path) -> PathBuf {
    data_folder.join(SECRETS_FILE)
}

/// Missing or unreadable secrets count as empty.
pub fn load_secrets(data_folder: &Path) -> Secrets {
    let path = secrets_path(data_folder);
    match std::fs::read_to_string(&path) {
        Ok(content) => serde_yaml::from_str(&content).unwrap_or_else(|e| {
            warn!("Ignoring malformed secrets file {}: {}", path.display(), e);
            Secrets::default()
        }),
        Err(_) => Secrets::default(),
    }
}

// ============================================================================
// Model settings resolution (CLI > config > secrets/env > defaults)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmSettings {
    pub provider: LlmProvider,
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
}

pub fn resolve_llm_settings(
    cli: &Cli,
    config: &AppConfig,
    secrets: &Secrets,
    env_api_key: Option<String>,
) -> LlmSettings {
    let provider = cli.llm_provider.unwrap_or(config.llm.provider);

    let (default_endpoint, default_model) = match provider {
        LlmProvider::Ollama => ("http://localhost:11434/api/generate", "qwen2.5:1.5b"),
        LlmProvider::Openai => (
            crate::agent::ai_model::OpenAiBackend::DEFAULT_ENDPOINT,
            crate::agent::ai_model::OpenAiBackend::DEFAULT_MODEL,
        ),
    };

    let endpoint = cli
        .llm_endpoint
        .clone()
        .or_else(|| config.llm.endpoint.clone())
        .unwrap_or_else(|| default_endpoint.to_string());
    let model = cli
        .llm_model
        .clone()
        .or_else(|| config.llm.model.clone())
        .unwrap_or_else(|| default_model.to_string());
    let api_key = config
        .llm
        .api_key
        .clone()
        .or_else(|| secrets.llm_api_key.clone())
        .or(env_api_key)
        .filter(|k| !k.trim().is_empty());

    LlmSettings {
        provider,
        endpoint,
        model,
        api_key,
    }
}
