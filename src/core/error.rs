use thiserror::Error;

#[derive(Error, Debug)]
pub enum RouterError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Connection probe failed for '{endpoint}': {cause}")]
    ProbeFailed { endpoint: String, cause: String },

    #[error("Entity '{0}' already registered")]
    DuplicateEntity(String),

    #[error("Relation '{0}' already mapped to entity '{1}'")]
    DuplicateRelation(String, String),

    #[error("Named query '{0}' already registered")]
    DuplicateQuery(String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

pub type Result<T> = std::result::Result<T, RouterError>;
