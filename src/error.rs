use {
    actix_web::{http::StatusCode, HttpResponse, ResponseError},
    csv::Error as CsvError,
    derive_more::Display,
    log::error,
    redis::RedisError,
    serde_json::{json, Error as JsonError},
    std::{io::Error as IoError, time::Duration},
    tinytemplate::error::Error as TemplateError,
};

pub static DEPRECATED_MESSAGE: &str =
    "This endpoint is deprecated. Please use the new invitation system at /api/rsvp/invite/[code]";

/// Failures of the document backend. Never retried by the store.
#[derive(Debug, Display)]
pub enum StorageError {
    #[display(fmt = "io error: {}", _0)]
    Io(IoError),
    #[display(fmt = "malformed document: {}", _0)]
    Json(JsonError),
    #[display(fmt = "redis error: {}", _0)]
    Redis(RedisError),
    #[display(fmt = "backend timed out after {:?}", _0)]
    Timeout(Duration),
}

#[derive(Debug, Display)]
pub enum Error {
    #[display(fmt = "{}", _0)]
    Validation(String),
    #[display(fmt = "{}", _0)]
    NotFound(String),
    #[display(fmt = "RSVP already submitted for this guest")]
    AlreadySubmitted,
    #[display(fmt = "{}", DEPRECATED_MESSAGE)]
    Deprecated,
    #[display(fmt = "Storage error: {}", _0)]
    Storage(StorageError),
    #[display(fmt = "Error rendering template: {}", _0)]
    Template(TemplateError),
    #[display(fmt = "Error with csv: {}", _0)]
    Csv(CsvError),
    #[display(fmt = "Error sending email: {}", _0)]
    Email(String),
    #[display(fmt = "Invalid configuration: {}", _0)]
    Config(String),
}

impl std::error::Error for Error {}

impl From<StorageError> for Error {
    fn from(error: StorageError) -> Self {
        Self::Storage(error)
    }
}

impl From<IoError> for Error {
    fn from(error: IoError) -> Self {
        Self::Storage(StorageError::Io(error))
    }
}

impl From<JsonError> for Error {
    fn from(error: JsonError) -> Self {
        Self::Storage(StorageError::Json(error))
    }
}

impl From<RedisError> for Error {
    fn from(error: RedisError) -> Self {
        Self::Storage(StorageError::Redis(error))
    }
}

impl From<TemplateError> for Error {
    fn from(error: TemplateError) -> Self {
        Self::Template(error)
    }
}

impl From<CsvError> for Error {
    fn from(error: CsvError) -> Self {
        Self::Csv(error)
    }
}

impl From<lettre::error::Error> for Error {
    fn from(error: lettre::error::Error) -> Self {
        Self::Email(error.to_string())
    }
}

impl From<lettre::address::AddressError> for Error {
    fn from(error: lettre::address::AddressError) -> Self {
        Self::Email(error.to_string())
    }
}

impl From<lettre::transport::sendmail::Error> for Error {
    fn from(error: lettre::transport::sendmail::Error) -> Self {
        Self::Email(error.to_string())
    }
}

impl From<lettre::transport::stub::Error> for Error {
    fn from(error: lettre::transport::stub::Error) -> Self {
        Self::Email(error.to_string())
    }
}

impl Error {
    /// Message shown to clients; internal details only go to the log
    pub fn public_message(&self) -> String {
        match self {
            Self::Validation(message) | Self::NotFound(message) => message.clone(),
            Self::AlreadySubmitted | Self::Deprecated => self.to_string(),
            Self::Storage(_) => "Storage backend unavailable".to_string(),
            Self::Template(_) | Self::Csv(_) | Self::Email(_) | Self::Config(_) => {
                "Internal server error".to_string()
            }
        }
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::AlreadySubmitted => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Deprecated => StatusCode::GONE,
            Self::Storage(_)
            | Self::Template(_)
            | Self::Csv(_)
            | Self::Email(_)
            | Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            error!("{}", self);
        }
        HttpResponse::build(status).json(json!({ "error": self.public_message() }))
    }
}
