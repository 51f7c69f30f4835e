use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("template not found: {name} ({path})")]
    NotFound {
        name: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("template render error: {name}\nreason: {message}")]
    Render { name: String, message: String },

    #[error("template {name} produced invalid JSON: {source}")]
    InvalidOutput {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid template name: {0:?}")]
    InvalidName(String),

    #[error("template data must serialize to a JSON object: {0}")]
    InvalidData(String),
}

pub type Result<T> = std::result::Result<T, TemplateError>;
