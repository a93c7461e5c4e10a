use std::path::PathBuf;

pub type LabelResult<T> = Result<T, LabelError>;

#[derive(thiserror::Error, Debug)]
pub enum LabelError {
    #[error("resource not found: {what} '{}': {source}", path.display())]
    ResourceNotFound {
        what: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("font parse error: {0}")]
    FontParse(String),

    #[error("face creation error: {0}")]
    FaceCreation(String),

    #[error("encode error: {0}")]
    Encode(String),

    #[error("write error: '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LabelError {
    pub fn not_found(what: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ResourceNotFound {
            what,
            path: path.into(),
            source,
        }
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::UnsupportedFormat(msg.into())
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn font_parse(msg: impl Into<String>) -> Self {
        Self::FontParse(msg.into())
    }

    pub fn face_creation(msg: impl Into<String>) -> Self {
        Self::FaceCreation(msg.into())
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}
