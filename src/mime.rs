//! Maps file extensions to media types.
//!
//! The media type is guessed by `mime_guess`. Whether the body is treated as text or passed through
//! as raw bytes is derived from that media type, with images, fonts and WebAssembly always kept
//! binary.

use mime_guess::{Mime, mime};

/// How the body of an asset is written to the response.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BodyKind {
    /// Decoded as UTF-8 and written as UTF-8 text.
    Text,
    /// Written verbatim.
    Binary,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MediaType {
    pub mime: Mime,
    pub body: BodyKind,
}

/// Extensions passed through byte by byte, regardless of their media type. Svg is text, but as an
/// image it is never re-encoded.
const ALWAYS_BINARY: &[&str] = &[
    "apng", "bmp", "gif", "ico", "cur", "jpg", "jpeg", "jfif", "pjpeg", "pjp", "png", "svg", "tif",
    "tiff", "webp", "avif", "woff", "woff2", "ttf", "otf", "eot", "wasm",
];

/// Media type for a file extension. Lookup ignores ASCII case and a leading dot. Unknown extensions
/// are `application/octet-stream`.
pub fn lookup(extension: &str) -> Mime {
    let extension = extension.strip_prefix('.').unwrap_or(extension);
    mime_guess::from_ext(extension).first_or_octet_stream()
}

/// Media type and body handling for a file extension. See [`lookup`].
pub fn classify(extension: &str) -> MediaType {
    let extension = extension.strip_prefix('.').unwrap_or(extension);
    let mime = lookup(extension);
    let forced_binary = ALWAYS_BINARY
        .iter()
        .any(|binary| binary.eq_ignore_ascii_case(extension));
    let body = if !forced_binary && is_textual(&mime) {
        BodyKind::Text
    } else {
        BodyKind::Binary
    };
    MediaType { mime, body }
}

fn is_textual(media_type: &Mime) -> bool {
    media_type.type_() == mime::TEXT
        || matches!(media_type.subtype().as_str(), "javascript" | "json" | "xml")
        || media_type
            .suffix()
            .is_some_and(|suffix| suffix == mime::JSON || suffix == mime::XML)
}

/// Extension of a resource path, i.e. everything after the last `.` of the last path segment.
/// `None` if the file name has no dot.
pub fn extension_of(path: &str) -> Option<&str> {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    file_name
        .rsplit_once('.')
        .map(|(_stem, extension)| extension)
        .filter(|extension| !extension.is_empty())
}
