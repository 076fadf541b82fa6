use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum BidError {
    /// A file produced zero usable line items.
    EmptyFile { source: String },
    /// A catalog was built from zero line items.
    EmptyCatalog { label: String },
    /// No row in the file resolves enough header aliases to be a header.
    MissingHeader { source: String },
    /// CSV decoding failed.
    Csv { source: String, message: String },
    /// IO error (file read, etc.).
    Io(String),
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (no files, duplicate labels, etc.).
    ConfigValidation(String),
}

impl fmt::Display for BidError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyFile { source } => {
                write!(f, "'{source}': no usable line items")
            }
            Self::EmptyCatalog { label } => write!(f, "catalog '{label}': no line items"),
            Self::MissingHeader { source } => {
                write!(f, "'{source}': no recognizable header row")
            }
            Self::Csv { source, message } => write!(f, "'{source}': CSV error: {message}"),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
        }
    }
}

impl std::error::Error for BidError {}
