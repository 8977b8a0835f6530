/// An HTML snippet together with its optional download link.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedHtml {
    /// The element to display (`<img>`, `<table>`, ...)
    pub html: String,

    /// `<a download>` anchor embedding the file, present when a download was requested
    pub download_link: Option<String>,
}

impl RenderedHtml {
    pub fn new(html: String) -> Self {
        Self {
            html,
            download_link: None,
        }
    }

    pub fn with_download(html: String, download_link: String) -> Self {
        Self {
            html,
            download_link: Some(download_link),
        }
    }
}

/// `<img>` tag for a data URI, optionally with a fixed display width.
pub(crate) fn img_tag(src: &str, width: Option<u32>) -> String {
    match width {
        Some(width) => format!("<img src='{src}' width='{width}'>"),
        None => format!("<img src='{src}'>"),
    }
}

/// Download anchor for a data URI.
pub(crate) fn download_anchor(href: &str, file_name: &str, text: &str) -> String {
    format!(
        "<a href='{href}' download='{}'>{}</a>",
        escape(file_name),
        escape(text)
    )
}

/// Escape text for use in element content or a single-quoted attribute.
pub(crate) fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
