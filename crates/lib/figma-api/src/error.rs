pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    Http(ureq::Error),
    /// HTTP 429; the caller is expected to re-enqueue the request later.
    RateLimit,
    Status(u16),
    /// The server answered 200 but the body reports a failure, or the body
    /// could not be decoded at all.
    Payload(String),
}

impl std::error::Error for Error {}
impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Http(e) => write!(f, "{e}"),
            Self::RateLimit => write!(f, "rate limit: too many requests"),
            Self::Status(code) => write!(f, "HTTP error: status {code}"),
            Self::Payload(msg) => write!(f, "payload error: {msg}"),
        }
    }
}

impl From<ureq::Error> for Error {
    fn from(value: ureq::Error) -> Self {
        match value {
            ureq::Error::StatusCode(429) => Self::RateLimit,
            ureq::Error::StatusCode(code) => Self::Status(code),
            other => Self::Http(other),
        }
    }
}

impl Error {
    /// The 60 s soft bound elapsed without a response.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Http(ureq::Error::Timeout(_)))
    }
}
