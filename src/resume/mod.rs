pub mod cv_parser;
pub mod profile;
pub mod resume_model;
