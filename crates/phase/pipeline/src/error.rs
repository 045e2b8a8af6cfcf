pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    IO(std::io::Error),
    Snapshot(lib_snapshot::Error),
    Parse(phase_parsing::Error),
    /// The root document bytes are not valid JSON; position reported.
    Json { message: String, line: usize, column: usize },
    /// No root document has been fetched or restored yet.
    NoDocument,
    /// Assets stayed unavailable across every retry round.
    AssetsUnavailable(Vec<String>),
    /// The fetch layer reported a remote failure.
    Fetch(String),
}

impl std::error::Error for Error {}
impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IO(e) => write!(f, "{e}"),
            Self::Snapshot(e) => write!(f, "{e}"),
            Self::Parse(e) => write!(f, "{e}"),
            Self::Json { message, line, column } => {
                write!(f, "JSON: {message} at {line}:{column}")
            }
            Self::NoDocument => write!(f, "no document data"),
            Self::AssetsUnavailable(ids) => {
                write!(f, "assets unavailable: {}", ids.join(", "))
            }
            Self::Fetch(message) => write!(f, "{message}"),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Self::IO(value)
    }
}

impl From<lib_snapshot::Error> for Error {
    fn from(value: lib_snapshot::Error) -> Self {
        Self::Snapshot(value)
    }
}

impl From<phase_parsing::Error> for Error {
    fn from(value: phase_parsing::Error) -> Self {
        Self::Parse(value)
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Self::Json {
            message: value.to_string(),
            line: value.line(),
            column: value.column(),
        }
    }
}
