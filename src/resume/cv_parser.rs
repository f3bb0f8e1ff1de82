use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::agent::ai_model::{TextInference, extract_fenced};
use crate::agent::error::AgentError;
use crate::resume::resume_model::ResumeDocument;

pub const RESUME_FILE: &str = "plain_text_resume.yaml";
pub const EXAMPLE_FOLDER: &str = "data_folder_example";

/// Raw text of a PDF resume.
pub fn extract_pdf_text(path: &Path) -> Result<String, AgentError> {
    info!("Extracting text from {}", path.display());
    let bytes = std::fs::read(path)
        .map_err(|e| AgentError::io(format!("reading {}", path.display()), e))?;
    pdf_extract::extract_text_from_mem(&bytes).map_err(|e| AgentError::Pdf {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Turns free CV text into the plain-text resume YAML layout with one model call.
pub struct CvParser {
    backend: Box<dyn TextInference>,
}

impl CvParser {
    pub fn new(backend: Box<dyn TextInference>) -> Self {
        Self { backend }
    }

    /// Ask the model to fill the example structure from `cv_text`.
    /// Returns YAML text, unwrapped from any code fence, not yet validated.
    pub fn parse_to_yaml(
        &self,
        cv_text: &str,
        example_structure: Option<&str>,
    ) -> Result<String, AgentError> {
        info!("Parsing CV text using the model...");
        let prompt = build_cv_prompt(cv_text, example_structure.unwrap_or(""));
        let response = self.backend.infer_text(&prompt)?;
        Ok(extract_fenced(&response).to_string())
    }
}

pub fn build_cv_prompt(cv_text: &str, example_structure: &str) -> String {
    format!(
        r#"You are an expert resume parser. I will provide you with the raw text of a resume and an example YAML structure.
Your task is to extract information from the resume and populate the YAML structure accordingly.

Return ONLY the valid YAML string. Do not include markdown code blocks.

Example YAML Structure:
{example_structure}

Raw Resume Text:
{cv_text}

Parsed YAML:
"#
    )
}

/// The resume YAML used as a layout guide: the data folder's own resume
/// first, then the bundled example. Missing both is not an error.
pub fn load_example_structure(data_folder: &Path) -> Option<String> {
    let candidates: [PathBuf; 2] = [
        data_folder.join(RESUME_FILE),
        PathBuf::from(EXAMPLE_FOLDER).join(RESUME_FILE),
    ];

    for path in &candidates {
        if !path.exists() {
            continue;
        }
        match std::fs::read_to_string(path) {
            Ok(content) => return Some(content),
            Err(e) => warn!("Could not load example structure {}: {}", path.display(), e),
        }
    }

    warn!("No example resume structure found");
    None
}

/// Validate `yaml_content` as a resume document and write it to `output`.
/// Nothing is written when the content does not parse.
pub fn save_resume_yaml(yaml_content: &str, output: &Path) -> Result<ResumeDocument, AgentError> {
    info!("Saving parsed CV to {}", output.display());
    let document = ResumeDocument::from_yaml(yaml_content)?;
    let normalized = document.to_yaml()?;

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| AgentError::io(format!("creating {}", parent.display()), e))?;
    }
    std::fs::write(output, normalized)
        .map_err(|e| AgentError::io(format!("writing {}", output.display()), e))?;

    Ok(document)
}
