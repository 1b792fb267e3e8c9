use thiserror::Error;

#[derive(Debug, Error)]
pub enum ObjectDesignError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    InvalidFormat(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    ServiceUnavailable(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("http error: {0}")]
    Http(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("runtime error: {0}")]
    Runtime(String),
}

pub type Result<T> = std::result::Result<T, ObjectDesignError>;

impl From<diesel::result::Error> for ObjectDesignError {
    fn from(err: diesel::result::Error) -> Self {
        match err {
            diesel::result::Error::NotFound => {
                ObjectDesignError::NotFound("record not found".to_string())
            }
            other => ObjectDesignError::Runtime(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for ObjectDesignError {
    fn from(err: serde_json::Error) -> Self {
        ObjectDesignError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_diesel_not_found() {
        let err: ObjectDesignError = diesel::result::Error::NotFound.into();
        assert!(matches!(err, ObjectDesignError::NotFound(_)));
    }

    #[test]
    fn displays_config_error() {
        let err = ObjectDesignError::Config("bad".to_string());
        assert!(format!("{err}").contains("configuration error"));
    }
}
