pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    IO(std::io::Error),
    /// The stream does not start with the current magic; earlier versions
    /// are deliberately unreadable.
    BadMagic([u8; 4]),
    /// The stream ended inside the named section.
    Truncated(&'static str),
    /// A string field holds bytes that are not UTF-8.
    Encoding(&'static str),
    /// A format/state tag holds a value outside the known range.
    BadTag(&'static str, u32),
}

impl std::error::Error for Error {}
impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IO(e) => write!(f, "{e}"),
            Self::BadMagic(magic) => write!(f, "unreadable snapshot: magic {magic:02X?}"),
            Self::Truncated(section) => write!(f, "snapshot truncated in {section}"),
            Self::Encoding(section) => write!(f, "snapshot has invalid text in {section}"),
            Self::BadTag(section, value) => {
                write!(f, "snapshot has unknown tag {value} in {section}")
            }
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Self::IO(value)
    }
}
