use crate::codec::encode;
use crate::html::download_anchor;

/// Default file name (without extension) for text downloads.
pub const DEFAULT_FILE_NAME: &str = "myfile";

/// Default link text for text downloads.
pub const DEFAULT_DOWNLOAD_TEXT: &str = "Download File";

/// Wrap a string into a downloadable `.txt` file and return the HTML link.
///
/// A trailing `.txt` on `file_name` is dropped so the extension is never doubled.
///
/// # Examples
/// ```
/// use mecsimcalc::text::text_download_link;
///
/// let link = text_download_link("Hello World", "notes.txt", "Get notes");
/// assert_eq!(
///     link,
///     "<a href='data:text/plain;base64,SGVsbG8gV29ybGQ=' download='notes.txt'>Get notes</a>"
/// );
/// ```
pub fn text_download_link(text: &str, file_name: &str, download_text: &str) -> String {
    let stem = file_name.strip_suffix(".txt").unwrap_or(file_name);
    let encoded = encode("text/plain", text.as_bytes());
    download_anchor(&encoded, &format!("{stem}.txt"), download_text)
}
