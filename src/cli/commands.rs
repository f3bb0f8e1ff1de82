use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::agent::ai_model::{OllamaBackend, OpenAiBackend, TextInference};
use crate::agent::error::AgentError;
use crate::browser::session::{BrowserSession, SessionOptions};
use crate::cli::config::{AppConfig, LlmProvider, LlmSettings, PDF_RESUME_FILE};
use crate::letter::cover_letter::CoverLetterGenerator;
use crate::mail::smtp::MailAgent;
use crate::portal::applier::{ApplicationSession, PortalApplier};
use crate::portal::mapper::LlmFieldMapper;
use crate::portal::submit_policy::SubmitMode;
use crate::resume::cv_parser::{
    CvParser, RESUME_FILE, extract_pdf_text, load_example_structure, save_resume_yaml,
};
use crate::resume::profile::ResumeProfile;
use crate::resume::resume_model::ResumeDocument;
use crate::trace::logger::TraceLogger;

pub const EMAIL_SUBJECT: &str = "Job Application";

// ============================================================================
// update-cv subcommand
// ============================================================================

pub fn cmd_update_cv(
    cv_path: &str,
    config: &AppConfig,
    backend: Box<dyn TextInference>,
) -> Result<(), Box<dyn std::error::Error>> {
    let data_folder = config.data_folder();
    ensure_dir(data_folder)?;

    let cv = Path::new(cv_path);
    let text = extract_pdf_text(cv)?;
    let example = load_example_structure(data_folder);

    let yaml = CvParser::new(backend).parse_to_yaml(&text, example.as_deref())?;
    save_resume_yaml(&yaml, &data_folder.join(RESUME_FILE))?;

    let pdf_copy = data_folder.join(PDF_RESUME_FILE);
    std::fs::copy(cv, &pdf_copy).map_err(|e| {
        AgentError::io(
            format!("copying {} to {}", cv.display(), pdf_copy.display()),
            e,
        )
    })?;

    println!(
        "CV updated successfully and saved to {} and {}",
        data_folder.join(RESUME_FILE).display(),
        pdf_copy.display()
    );
    Ok(())
}

// ============================================================================
// draft-letter subcommand
// ============================================================================

pub fn cmd_draft_letter(
    job_description: &str,
    config: &AppConfig,
    backend: Box<dyn TextInference>,
) -> Result<String, Box<dyn std::error::Error>> {
    let resume = ResumeDocument::load(&config.data_folder().join(RESUME_FILE))?;
    let letter = CoverLetterGenerator::new(backend).generate(job_description, &resume)?;

    println!("--- Generated Cover Letter ---");
    println!("{}", letter);
    println!("------------------------------");
    Ok(letter)
}

// ============================================================================
// apply-email subcommand
// ============================================================================

#[derive(Debug, Clone)]
pub struct EmailApplication {
    pub job_description: String,
    pub recruiter_email: String,
    pub gmail_user: String,
    pub gmail_password: String,
    pub cv_path: Option<String>,
}

pub fn cmd_apply_email(
    application: &EmailApplication,
    config: &AppConfig,
    backend: Box<dyn TextInference>,
) -> Result<(), Box<dyn std::error::Error>> {
    let resume = ResumeDocument::load(&config.data_folder().join(RESUME_FILE))?;
    let letter =
        CoverLetterGenerator::new(backend).generate(&application.job_description, &resume)?;

    let attachment = resolve_attachment(application.cv_path.as_deref(), config.data_folder());

    MailAgent::new(&application.gmail_user, &application.gmail_password)
        .with_server(&config.mail.smtp_server, config.mail.smtp_port)
        .send(
            &application.recruiter_email,
            EMAIL_SUBJECT,
            &letter,
            attachment.as_deref(),
        )?;

    println!(
        "Application sent to {} with attachment {}",
        application.recruiter_email,
        attachment
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "None".to_string())
    );
    Ok(())
}

/// The CV given on the command line, else the data folder's `resume.pdf` if it exists.
pub fn resolve_attachment(cv_path: Option<&str>, data_folder: &Path) -> Option<PathBuf> {
    match cv_path {
        Some(path) => Some(PathBuf::from(path)),
        None => {
            let stored = data_folder.join(PDF_RESUME_FILE);
            stored.exists().then_some(stored)
        }
    }
}

// ============================================================================
// apply-portal subcommand
// ============================================================================

#[derive(Debug, Clone)]
pub struct PortalRun {
    pub url: String,
    pub max_pages: Option<usize>,
    pub submit: SubmitMode,
    pub keep_open: bool,
    pub headless: bool,
}

pub fn cmd_apply_portal(
    run: &PortalRun,
    config: &AppConfig,
    backend: Box<dyn TextInference>,
) -> Result<ApplicationSession, Box<dyn std::error::Error>> {
    let profile = ResumeProfile::load(&config.data_folder().join(RESUME_FILE))?;
    info!("Loaded resume profile with {} keys", profile.len());

    let mapper = LlmFieldMapper::new(backend);
    let policy = run.submit.policy();
    let tracer = match &config.apply.trace_file {
        Some(path) => TraceLogger::new(path),
        None => TraceLogger::disabled(),
    };

    let mut apply_config = config.apply.apply_config();
    if let Some(max_pages) = run.max_pages {
        apply_config.max_pages = max_pages.max(1);
    }

    let mut session = BrowserSession::launch(&SessionOptions {
        script: config.browser.script.clone(),
        headless: run.headless || config.browser.headless,
    })?;

    let result = PortalApplier::new(&mut session, &mapper, &profile, policy.as_ref())
        .with_config(apply_config)
        .with_tracer(&tracer)
        .apply(&run.url);

    match &result {
        Ok(outcome) => println!(
            "Application process for {} ended: {} after {} page(s), {} field(s) filled",
            outcome.url,
            outcome.outcome,
            outcome.pages_processed(),
            outcome.total_filled()
        ),
        Err(e) => eprintln!("Error applying to portal: {}", e),
    }
    if let Some(path) = tracer.path() {
        info!("Apply trace appended to {}", path.display());
    }

    if run.keep_open {
        println!("The browser will remain open for you to verify and complete the application.");
        wait_for_enter("Press Enter to close browser...")?;
    }
    session.quit()?;

    Ok(result?)
}

// ============================================================================
// Helpers
// ============================================================================

/// Build the text model backend for the resolved settings.
pub fn build_backend(settings: &LlmSettings) -> Result<Box<dyn TextInference>, AgentError> {
    match settings.provider {
        LlmProvider::Ollama => Ok(Box::new(OllamaBackend::new(
            &settings.endpoint,
            &settings.model,
        ))),
        LlmProvider::Openai => {
            let api_key = settings.api_key.as_deref().ok_or_else(|| {
                AgentError::Config(
                    "the openai provider needs an API key (secrets.yaml llm_api_key or LLM_API_KEY)"
                        .into(),
                )
            })?;
            Ok(Box::new(OpenAiBackend::new(
                &settings.endpoint,
                &settings.model,
                api_key,
            )))
        }
    }
}

/// Job description from inline text or a file.
pub fn read_job_description(
    text: Option<&str>,
    file: Option<&str>,
) -> Result<Option<String>, AgentError> {
    if let Some(path) = file {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AgentError::io(format!("reading {}", path), e))?;
        return Ok(Some(content));
    }
    Ok(text.map(str::to_string).filter(|t| !t.trim().is_empty()))
}

/// Ask for a line on the terminal.
pub fn prompt_line(label: &str) -> io::Result<String> {
    print!("{}: ", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn wait_for_enter(message: &str) -> io::Result<()> {
    print!("{}", message);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(())
}

fn ensure_dir(path: &Path) -> Result<(), AgentError> {
    std::fs::create_dir_all(path)
        .map_err(|e| AgentError::io(format!("creating {}", path.display()), e))
}
