// crates/drawio-vsdx/src/error.rs

use crate::package::PackageError;
use crate::xml::XmlError;

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("package error: {0}")]
    Package(#[from] PackageError),

    #[error("xml error: {0}")]
    Xml(#[from] XmlError),

    #[error("missing package part: {0}")]
    MissingPart(String),

    #[error("part has no root element: {0}")]
    EmptyRoot(String),

    #[error("invalid options: {0}")]
    Options(#[from] serde_json::Error),
}

pub type ImportResult<T> = Result<T, ImportError>;
