//! MIME type detection for uploaded document images.

use std::path::Path;

/// Detect MIME type by file extension.
pub fn detect_mime_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png"          => "image/png",
        "gif"          => "image/gif",
        "webp"         => "image/webp",
        "bmp"          => "image/bmp",
        "tiff" | "tif" => "image/tiff",
        "avif"         => "image/avif",
        "pdf"          => "application/pdf",
        _              => "application/octet-stream",
    }
}

/// Whether a MIME type is an image a vision model can read.
pub fn is_image(mime: &str) -> bool {
    mime.starts_with("image/")
}
