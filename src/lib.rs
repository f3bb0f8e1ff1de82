//! Job application assistant: turns a CV into a structured resume, drafts
//! cover letters with a language model, emails applications, and walks
//! unknown job-portal forms with a browser, filling fields from the resume.

pub mod agent;
pub mod browser;
pub mod cli;
pub mod letter;
pub mod mail;
pub mod portal;
pub mod resume;
pub mod trace;
