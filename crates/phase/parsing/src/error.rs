pub type Result<T> = std::result::Result<T, Error>;

/// Which asset cache a not-ready parse is waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Image,
    Rendering,
    Node,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// A node `type` outside the supported set. Fatal for the element.
    UnsupportedType(String),
    /// An instance refers to a component the catalog does not carry.
    MissingComponent { from: String, to: String },
    /// A node fetch answered, but the component id was not in the payload.
    UnrecognizedComponent(String),
    InvalidComponent(String),
    /// Boolean operations need at least two children.
    BooleanChildren(String),
    /// The asset is not cached yet; the element can be retried once the
    /// driver has fetched it.
    NotReady { id: String, kind: AssetKind },
    Image(String),
    Json(String),
}

impl Error {
    /// True when re-parsing after an asset fetch can succeed.
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::NotReady { .. })
    }
}

impl std::error::Error for Error {}
impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedType(kind) => {
                write!(f, "Non supported object type:\"{kind}\"")
            }
            Self::MissingComponent { from, to } => {
                write!(f, "Unexpected component dependency from {from} to {to}")
            }
            Self::UnrecognizedComponent(id) => write!(f, "Unrecognized component {id}"),
            Self::InvalidComponent(id) => write!(f, "Invalid component {id}"),
            Self::BooleanChildren(id) => {
                write!(f, "Boolean needs at least two elements: {id}")
            }
            Self::NotReady { id, kind } => {
                let kind = match kind {
                    AssetKind::Image => "image",
                    AssetKind::Rendering => "rendering",
                    AssetKind::Node => "node",
                };
                write!(f, "Waiting for {kind} \"{id}\"")
            }
            Self::Image(msg) => write!(f, "{msg}"),
            Self::Json(msg) => write!(f, "JSON: {msg}"),
        }
    }
}
