use std::fmt;

#[derive(Debug)]
pub enum LoadError {
    /// Missing required column in a session file.
    MissingColumn { file: String, column: String },
    /// Timestamp cell could not be parsed.
    TimestampParse {
        file: String,
        identifier: String,
        value: String,
    },
    /// Numeric cell (coordinate or status) could not be parsed.
    NumberParse {
        file: String,
        identifier: String,
        column: String,
        value: String,
    },
    /// No files matched any pattern in the session folder.
    NoFiles { dir: String },
    /// IO error (file read, write, etc.).
    Io(String),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingColumn { file, column } => {
                write!(f, "{file}: missing column '{column}'")
            }
            Self::TimestampParse {
                file,
                identifier,
                value,
            } => {
                write!(f, "{file}, record '{identifier}': cannot parse timestamp '{value}'")
            }
            Self::NumberParse {
                file,
                identifier,
                column,
                value,
            } => {
                write!(
                    f,
                    "{file}, record '{identifier}': cannot parse {column} value '{value}'"
                )
            }
            Self::NoFiles { dir } => write!(f, "no session CSV files found in {dir}"),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for LoadError {}
