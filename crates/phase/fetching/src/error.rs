pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    Api(lib_figma_api::Error),
    ImageDecode(image::ImageError),
    /// Downloaded bytes are neither PNG nor JPEG.
    UnsupportedImageFormat(String),
    /// The image could not be resized to the requested cap.
    ImageResize(String),
}

impl std::error::Error for Error {}
impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Api(e) => write!(f, "{e}"),
            Self::ImageDecode(e) => write!(f, "image decode: {e}"),
            Self::UnsupportedImageFormat(id) => {
                write!(f, "Image format not supported \"{id}\"")
            }
            Self::ImageResize(msg) => write!(f, "Image cannot be resized {msg}"),
        }
    }
}

impl From<lib_figma_api::Error> for Error {
    fn from(value: lib_figma_api::Error) -> Self {
        Self::Api(value)
    }
}

impl From<image::ImageError> for Error {
    fn from(value: image::ImageError) -> Self {
        Self::ImageDecode(value)
    }
}
