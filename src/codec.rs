use crate::error::CodecError;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use std::io::Cursor;

/// Separator between the metadata prefix and the base64 body of a payload.
pub const BASE64_MARKER: &str = ";base64,";

/// An uploaded file decoded into memory, positioned at its start.
pub type DecodedFile = Cursor<Vec<u8>>;

lazy_static! {
    // Greedy prefix: the subtype is the text after the last `/` preceding the last marker.
    static ref SUBTYPE_REGEX: Regex = Regex::new(r"(?s)^.*/([^/]+);base64,").unwrap();
}

/// MIME subtypes that are reported under a shorter file-type label.
const FILETYPE_ALIASES: &[(&str, &str)] = &[(
    "vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "xlsx",
)];

/// Extensions preferred over whatever the MIME database lists first.
const PREFERRED_EXTENSIONS: &[(&str, &str)] = &[
    ("image/jpeg", "jpg"),
    ("text/html", "html"),
    ("text/plain", "txt"),
    ("text/csv", "csv"),
    (
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "xlsx",
    ),
];

/// Legacy or redundant extensions and their canonical spelling.
const EXTENSION_ALIASES: &[(&str, &str)] = &[("jpe", "jpg"), ("jpeg", "jpg"), ("htm", "html")];

/// Decode a data-URI payload into an in-memory file.
///
/// The payload must look like `data:<type>/<subtype>;base64,<body>`. The body is
/// decoded with the standard base64 alphabet; ASCII whitespace inside it is ignored.
///
/// # Errors
/// * `CodecError::InvalidFormat` if the `;base64,` separator is missing
/// * `CodecError::Decode` if the body is not valid base64
///
/// # Examples
/// ```
/// use std::io::Read;
/// use mecsimcalc::codec::decode;
///
/// let mut file = decode("data:text/plain;base64,aGVsbG8=").unwrap();
/// let mut text = String::new();
/// file.read_to_string(&mut text).unwrap();
/// assert_eq!(text, "hello");
/// ```
pub fn decode(payload: &str) -> Result<DecodedFile, CodecError> {
    decode_with_metadata(payload).map(|(file, _)| file)
}

/// Decode a data-URI payload and also return its metadata prefix.
///
/// The returned metadata includes the separator, e.g. `data:text/csv;base64,`.
pub fn decode_with_metadata(payload: &str) -> Result<(DecodedFile, String), CodecError> {
    let (prefix, body) = payload
        .split_once(BASE64_MARKER)
        .ok_or(CodecError::InvalidFormat)?;

    let bytes = decode_body(body)?;
    debug!("decoded {} bytes from '{}' payload", bytes.len(), prefix);

    Ok((Cursor::new(bytes), format!("{prefix}{BASE64_MARKER}")))
}

/// Decode a data-URI payload and also return a conventional file extension
/// (without the leading dot) for its MIME type, if one is known.
pub fn decode_with_extension(payload: &str) -> Result<(DecodedFile, Option<String>), CodecError> {
    let (file, metadata) = decode_with_metadata(payload)?;
    Ok((file, guess_extension(&metadata)))
}

fn decode_body(body: &str) -> Result<Vec<u8>, CodecError> {
    if body.bytes().any(|b| b.is_ascii_whitespace()) {
        let compact: String = body.split_ascii_whitespace().collect();
        Ok(STANDARD.decode(compact)?)
    } else {
        Ok(STANDARD.decode(body)?)
    }
}

/// Extract the file-type label from payload metadata.
///
/// This is a best-effort classification: metadata that does not end in
/// `/<subtype>;base64,` yields an empty label instead of an error.
///
/// # Examples
/// ```
/// use mecsimcalc::codec::classify;
///
/// assert_eq!(classify("data:text/csv;base64,"), "csv");
/// assert_eq!(classify("no metadata here"), "");
/// ```
pub fn classify(metadata: &str) -> String {
    match SUBTYPE_REGEX.captures(metadata) {
        Some(captures) => normalize_filetype(&captures[1]),
        None => String::new(),
    }
}

/// Apply the file-type alias table to a raw MIME subtype.
pub fn normalize_filetype(subtype: &str) -> String {
    FILETYPE_ALIASES
        .iter()
        .find(|(raw, _)| *raw == subtype)
        .map(|(_, label)| (*label).to_string())
        .unwrap_or_else(|| subtype.to_string())
}

/// Guess a file extension from payload metadata.
///
/// The extension comes back without a leading dot (`"jpg"`, not `".jpg"`) so it
/// can go straight into [`std::path::Path::with_extension`] or a `format!`ed
/// file name. Returns `None` when the metadata carries no MIME type or the type
/// is unknown.
///
/// # Examples
/// ```
/// use mecsimcalc::codec::guess_extension;
///
/// assert_eq!(guess_extension("data:image/jpeg;base64,").as_deref(), Some("jpg"));
/// let name = std::path::Path::new("upload").with_extension("jpg");
/// assert_eq!(name.to_str(), Some("upload.jpg"));
/// ```
pub fn guess_extension(metadata: &str) -> Option<String> {
    let essence = mime_essence(metadata)?;

    let extension = PREFERRED_EXTENSIONS
        .iter()
        .find(|(mime, _)| *mime == essence)
        .map(|(_, ext)| *ext)
        .or_else(|| {
            mime_guess::get_mime_extensions_str(&essence)
                .and_then(|extensions| extensions.first().copied())
        })?;

    let canonical = EXTENSION_ALIASES
        .iter()
        .find(|(alias, _)| *alias == extension)
        .map(|(_, ext)| *ext)
        .unwrap_or(extension);

    Some(canonical.to_string())
}

// "data:image/jpeg;base64," -> "image/jpeg"
fn mime_essence(metadata: &str) -> Option<String> {
    let without_scheme = metadata
        .split_once(':')
        .map(|(_, rest)| rest)
        .unwrap_or(metadata);
    let essence = without_scheme.split(';').next()?.trim();

    match essence.split_once('/') {
        Some((kind, subtype)) if !kind.is_empty() && !subtype.is_empty() => {
            Some(essence.to_ascii_lowercase())
        }
        _ => None,
    }
}

/// Build a data-URI payload from raw bytes.
///
/// # Examples
/// ```
/// use mecsimcalc::codec::encode;
///
/// assert_eq!(encode("text/plain", b"hello"), "data:text/plain;base64,aGVsbG8=");
/// ```
pub fn encode(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime}{BASE64_MARKER}{}", STANDARD.encode(bytes))
}

/// Look up the MIME type for a file extension, falling back to
/// `application/octet-stream`.
pub fn mime_for_extension(extension: &str) -> String {
    mime_guess::from_ext(extension)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn decode_returns_bytes_at_start() {
        let mut file = decode("data:text/csv;base64,YSxiCjEsMgo=").unwrap();
        assert_eq!(file.position(), 0);
        let mut text = String::new();
        file.read_to_string(&mut text).unwrap();
        assert_eq!(text, "a,b\n1,2\n");
    }

    #[test]
    fn decode_keeps_metadata_with_marker() {
        let (_, metadata) = decode_with_metadata("data:image/png;base64,AAAA").unwrap();
        assert_eq!(metadata, "data:image/png;base64,");
    }

    #[test]
    fn missing_marker_is_invalid_format() {
        for input in ["", "data:text/plain,aGVsbG8=", "aGVsbG8=", "data:text/plain;base64"] {
            assert!(matches!(decode(input), Err(CodecError::InvalidFormat)));
        }
    }

    #[test]
    fn bad_body_is_decode_error() {
        assert!(matches!(
            decode("data:text/plain;base64,not base64!"),
            Err(CodecError::Decode(_))
        ));
        // a second separator ends up inside the body
        assert!(matches!(
            decode("data:a/b;base64,AAAA;base64,AAAA"),
            Err(CodecError::Decode(_))
        ));
    }

    #[test]
    fn wrapped_body_is_accepted() {
        let file = decode("data:text/plain;base64,aGVs\nbG8=").unwrap();
        assert_eq!(file.into_inner(), b"hello");
    }

    #[test]
    fn empty_body_is_empty_file() {
        let file = decode("data:text/plain;base64,").unwrap();
        assert!(file.into_inner().is_empty());
    }

    #[test]
    fn classify_known_subtypes() {
        assert_eq!(classify("data:image/jpeg;base64,"), "jpeg");
        assert_eq!(classify("data:text/csv;base64,"), "csv");
        assert_eq!(classify("data:text/html;base64,"), "html");
        assert_eq!(
            classify("data:application/vnd.openxmlformats-officedocument.spreadsheetml.sheet;base64,"),
            "xlsx"
        );
    }

    #[test]
    fn classify_passes_other_vendor_types_through() {
        assert_eq!(
            classify("data:application/vnd.ms-excel;base64,"),
            "vnd.ms-excel"
        );
    }

    #[test]
    fn classify_is_permissive() {
        assert_eq!(classify(""), "");
        assert_eq!(classify("data:text/csv"), "");
        assert_eq!(classify("data:image/;base64,"), "");
        assert_eq!(classify("csv;base64,"), "");
    }

    #[test]
    fn classify_uses_last_marker() {
        assert_eq!(classify("data:a/b;base64,c/d;base64,"), "d");
    }

    #[test]
    fn guess_extension_normalizes() {
        assert_eq!(guess_extension("data:image/jpeg;base64,").as_deref(), Some("jpg"));
        assert_eq!(guess_extension("data:text/html;base64,").as_deref(), Some("html"));
        assert_eq!(guess_extension("data:text/csv;base64,").as_deref(), Some("csv"));
        assert_eq!(guess_extension("data:image/png;base64,").as_deref(), Some("png"));
        assert_eq!(
            guess_extension(
                "data:application/vnd.openxmlformats-officedocument.spreadsheetml.sheet;base64,"
            )
            .as_deref(),
            Some("xlsx")
        );
    }

    #[test]
    fn guess_extension_unknown() {
        assert_eq!(guess_extension("data:application/x-not-a-real-type;base64,"), None);
        assert_eq!(guess_extension("garbage"), None);
        assert_eq!(guess_extension("data:;base64,"), None);
    }

    #[test]
    fn encode_builds_payload() {
        let payload = encode("image/gif", &[1, 2, 3]);
        assert_eq!(payload, "data:image/gif;base64,AQID");
        assert_eq!(decode(&payload).unwrap().into_inner(), vec![1, 2, 3]);
    }

    #[test]
    fn mime_lookup() {
        assert_eq!(mime_for_extension("png"), "image/png");
        assert_eq!(mime_for_extension("definitely-not-an-ext"), "application/octet-stream");
    }
}
