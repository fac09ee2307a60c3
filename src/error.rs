use thiserror::Error;

#[derive(Error, Debug)]
pub enum AtencionesError {
    #[error("Network error: {0}")]
    Network(Box<ureq::Error>),

    #[error("Unexpected response body: {0}")]
    Decode(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Spreadsheet error: {0}")]
    Xlsx(String),

    #[error("Selecciona un rango válido")]
    InvalidRange,

    #[error("Fecha inválida: {0}")]
    InvalidDate(String),

    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

impl From<ureq::Error> for AtencionesError {
    fn from(e: ureq::Error) -> Self {
        AtencionesError::Network(Box::new(e))
    }
}

impl AtencionesError {
    /// Failures caused by the user's input rather than the backend.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            AtencionesError::InvalidRange | AtencionesError::InvalidDate(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, AtencionesError>;
