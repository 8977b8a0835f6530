use thiserror::Error;

/// Errors raised while turning a data-URI payload into bytes.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The payload has no `;base64,` separator between metadata and body.
    #[error("invalid input: must contain ';base64,'")]
    InvalidFormat,

    /// The body after the separator is not valid standard base64.
    #[error("invalid base64 body: {0}")]
    Decode(#[from] base64::DecodeError),
}

/// Errors raised while decoding or rendering images.
#[cfg(feature = "render")]
#[derive(Debug, Error)]
pub enum ImageRenderError {
    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("invalid file object: it does not contain image data")]
    NotAnImage,

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

/// Errors raised while loading, exporting or rendering tables.
#[cfg(feature = "render")]
#[derive(Debug, Error)]
pub enum TableError {
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Every candidate parser rejected the file; one entry per attempt.
    #[error("file type not supported ({})", .attempts.join("; "))]
    Unsupported { attempts: Vec<String> },

    #[error("row {row} has {found} cells but the table has {expected} columns")]
    Shape {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("table of {rows} rows and {columns} columns does not fit in a worksheet")]
    TooLarge { rows: usize, columns: usize },

    #[error("csv export failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("xlsx export failed: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
}

/// Errors raised while rendering figures and animations.
#[cfg(feature = "render")]
#[derive(Debug, Error)]
pub enum PlotError {
    #[error("drawing failed: {0}")]
    Draw(String),

    #[error("pixel buffer does not match a {width}x{height} image")]
    Buffer { width: u32, height: u32 },

    #[error("an animation needs at least one frame")]
    NoFrames,

    #[error("frame {index} does not match the size of the first frame")]
    FrameSize { index: usize },

    #[error("frame rate must be greater than zero")]
    InvalidFrameRate,

    #[error("image encoding failed: {0}")]
    Encode(#[from] image::ImageError),
}

/// Errors raised while delivering quiz results.
#[cfg(feature = "quiz")]
#[derive(Debug, Error)]
pub enum QuizError {
    #[error("invalid service account: {0}")]
    ServiceAccount(#[from] serde_json::Error),

    #[error("failed to sign token request: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("token endpoint returned no access token")]
    MissingToken,

    #[error("invalid e-mail address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("failed to build e-mail: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("smtp delivery failed: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}
