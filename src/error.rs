use serde_json::{json, Value};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssessError {
    #[error("student {id} not found")]
    NotFound { id: String },

    #[error("{action} {}: {source}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("report generation failed: {0}")]
    Render(String),
}

impl AssessError {
    pub fn io(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AssessError::Io {
            action,
            path: path.into(),
            source,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AssessError::NotFound { .. } => "not_found",
            AssessError::Io { .. } => "io_failed",
            AssessError::Validation(_) => "validation_failed",
            AssessError::Render(_) => "render_failed",
        }
    }

    pub fn details(&self) -> Option<Value> {
        match self {
            AssessError::NotFound { id } => Some(json!({ "studentId": id })),
            AssessError::Io { path, .. } => Some(json!({ "path": path.to_string_lossy() })),
            AssessError::Validation(v) => v.details(),
            AssessError::Render(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please complete {} before generating the PDF.", .missing.join(", "))]
    Incomplete { missing: Vec<&'static str> },

    #[error("Please provide detailed comments (at least {required} words) as required for this grade.")]
    CommentTooShort { words: usize, required: usize },

    #[error("Please enter comments or uncheck the 'Add comments' option.")]
    CommentEmpty,

    #[error("Please fill in all required fields (Student Name, Report Title)")]
    MissingFields { fields: Vec<&'static str> },

    #[error("Assessor {name:?} is not on the configured assessor list")]
    UnknownAssessor { name: String },

    #[error("score {score} is outside band {band} ({min}-{max})")]
    ScoreOutOfBand {
        score: u8,
        band: &'static str,
        min: u8,
        max: u8,
    },
}

impl ValidationError {
    fn details(&self) -> Option<Value> {
        match self {
            ValidationError::Incomplete { missing } => Some(json!({ "missing": missing })),
            ValidationError::CommentTooShort { words, required } => {
                Some(json!({ "wordCount": words, "required": required }))
            }
            ValidationError::MissingFields { fields } => Some(json!({ "fields": fields })),
            ValidationError::ScoreOutOfBand { score, band, min, max } => Some(json!({
                "score": score,
                "band": band,
                "min": min,
                "max": max,
            })),
            ValidationError::CommentEmpty | ValidationError::UnknownAssessor { .. } => None,
        }
    }
}
