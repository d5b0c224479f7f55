use thiserror::Error;

#[derive(Error, Debug)]
pub enum FixturaError {
    #[error("The library item \"{key}\" was not found.")]
    ItemNotFound { key: String },
    #[error("The library item \"{key}\" that is part of an include statement was not found.\n\n{context}")]
    IncludeNotFound { key: String, context: String },
    #[error("Connection was not found for alias {alias}. Configured aliases: {configured}")]
    ConnectionNotFound { alias: String, configured: String },
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Syntax error: {message}")]
    Syntax { message: String },
    #[error("Execution error: {message}\n\n{script}")]
    Execution { message: String, script: String },
    #[error("Nothing has been queued for execution.")]
    EmptyQueue,
    #[error("A dictionary is already registered for extension {extension} and override is disabled.")]
    Registration { extension: String },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FixturaError>;

// Helper conversions
impl From<config::ConfigError> for FixturaError {
    fn from(e: config::ConfigError) -> Self {
        Self::Configuration(e.to_string())
    }
}
