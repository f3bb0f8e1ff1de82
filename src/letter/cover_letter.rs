use tracing::info;

use crate::agent::ai_model::TextInference;
use crate::agent::error::AgentError;
use crate::resume::resume_model::ResumeDocument;

/// Drafts a cover letter for a job description from the candidate's resume.
pub struct CoverLetterGenerator {
    backend: Box<dyn TextInference>,
}

impl CoverLetterGenerator {
    pub fn new(backend: Box<dyn TextInference>) -> Self {
        Self { backend }
    }

    pub fn generate(
        &self,
        job_description: &str,
        resume: &ResumeDocument,
    ) -> Result<String, AgentError> {
        info!("Generating cover letter...");
        let prompt = build_letter_prompt(job_description, &resume.to_yaml()?);
        let letter = self.backend.infer_text(&prompt)?;
        let letter = letter.trim();
        if letter.is_empty() {
            return Err(AgentError::Model("model returned an empty cover letter".into()));
        }
        Ok(letter.to_string())
    }
}

pub fn build_letter_prompt(job_description: &str, resume_yaml: &str) -> String {
    format!(
        r#"You are a professional career coach and expert copywriter.
Draft a highly professional, engaging, and tailored cover letter for the following job description,
using the candidate's resume information.

The cover letter should:
1. Be professional and polite.
2. Highlight relevant skills and experiences from the resume that match the job description.
3. Express enthusiasm for the role and the company.
4. Be concise (max 300-400 words).
5. Have placeholders for [Hiring Manager Name] if not known.

Resume:
{resume_yaml}

Job Description:
{job_description}

Cover Letter:
"#
    )
}
