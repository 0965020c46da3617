//! Icon resolution
//!
//! Icons may be referenced by URL, embedded as a data URI, or point at a
//! file inside the extension directory. Local files are inlined as
//! `data:<mime>;base64,<payload>` so the icon travels with the metadata.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::path::Path;

use super::error::MetadataError;

const REMOTE_PREFIXES: &[&str] = &["http://", "https://", "data:image"];

/// Media types by lowercase file extension
const MIME_BY_EXTENSION: &[(&str, &str)] = &[
    ("avif", "image/avif"),
    ("bmp", "image/bmp"),
    ("gif", "image/gif"),
    ("ico", "image/vnd.microsoft.icon"),
    ("jpeg", "image/jpeg"),
    ("jpg", "image/jpeg"),
    ("png", "image/png"),
    ("svg", "image/svg+xml"),
    ("tif", "image/tiff"),
    ("tiff", "image/tiff"),
    ("webp", "image/webp"),
];

/// Whether a reference points at a file that still needs to be read
///
/// URLs and inline image data are already resolved.
pub fn is_local_file(reference: &str) -> bool {
    !REMOTE_PREFIXES
        .iter()
        .any(|prefix| reference.starts_with(prefix))
}

/// Read an icon file and return it as a base64 data URI
pub fn encode_icon(path: &Path) -> Result<String, MetadataError> {
    let content = std::fs::read(path).map_err(|e| MetadataError::io(path, e))?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(encode_data_uri(&file_name, &content))
}

/// Build a data URI for `content`, detecting the media type from `file_name` first
pub fn encode_data_uri(file_name: &str, content: &[u8]) -> String {
    let mime = mime_from_extension(file_name).unwrap_or_else(|| sniff_content_type(content));
    format!("data:{mime};base64,{}", STANDARD.encode(content))
}

/// Look up a media type from the file extension
pub fn mime_from_extension(file_name: &str) -> Option<&'static str> {
    let extension = Path::new(file_name).extension()?.to_str()?.to_ascii_lowercase();
    MIME_BY_EXTENSION
        .iter()
        .find(|(ext, _)| *ext == extension)
        .map(|(_, mime)| *mime)
}

/// Guess a media type from leading bytes
pub fn sniff_content_type(content: &[u8]) -> &'static str {
    const SIGNATURES: &[(&[u8], &str)] = &[
        (b"\x89PNG\r\n\x1a\n", "image/png"),
        (b"\xff\xd8\xff", "image/jpeg"),
        (b"GIF87a", "image/gif"),
        (b"GIF89a", "image/gif"),
        (b"BM", "image/bmp"),
        (b"\x00\x00\x01\x00", "image/x-icon"),
    ];

    if let Some((_, mime)) = SIGNATURES.iter().find(|(sig, _)| content.starts_with(sig)) {
        return *mime;
    }

    if content.len() >= 12 && &content[..4] == b"RIFF" && &content[8..12] == b"WEBP" {
        return "image/webp";
    }

    match std::str::from_utf8(content) {
        Ok(text) => {
            let head = text.trim_start();
            if head.starts_with("<svg") || (head.starts_with("<?xml") && head.contains("<svg")) {
                "image/svg+xml"
            } else {
                "text/plain; charset=utf-8"
            }
        }
        Err(_) => "application/octet-stream",
    }
}
