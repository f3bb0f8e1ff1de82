pub mod actuator;
pub mod applier;
pub mod form_model;
pub mod mapper;
pub mod scanner;
pub mod submit_policy;
