use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    /// Node.js browser server failed to spawn
    #[error("Failed to spawn {script} (is Node.js installed?): {source}")]
    SubprocessSpawn {
        script: String,
        #[source]
        source: std::io::Error,
    },

    /// Reading from or writing to the browser server pipes failed
    #[error("Browser session I/O error: {0}")]
    SessionIO(String),

    /// Browser server answered a command with ok=false or a malformed reply
    #[error("Browser command '{command}' failed: {error}")]
    SessionProtocol { command: String, error: String },

    #[error("JSON parse error ({context}): {source}")]
    JsonParse {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("JSON serialize error ({context}): {source}")]
    JsonSerialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// The page could not be loaded or did not settle into a usable state
    #[error("Navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    /// Language model transport or response failure
    #[error("Model request failed: {0}")]
    Model(String),

    #[error("PDF extraction failed for {path}: {reason}")]
    Pdf { path: String, reason: String },

    #[error("YAML error ({context}): {source}")]
    Yaml {
        context: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("I/O error ({context}): {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Mail error: {0}")]
    Mail(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AgentError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        AgentError::Io {
            context: context.into(),
            source,
        }
    }

    pub fn yaml(context: impl Into<String>, source: serde_yaml::Error) -> Self {
        AgentError::Yaml {
            context: context.into(),
            source,
        }
    }
}
