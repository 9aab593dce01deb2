//! Image upload rules

use super::{ErrorKind, ValidationResult};

/// 5 MiB
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

pub const ALLOWED_IMAGE_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/webp"];

/// File extension used for the stored object
pub fn extension_for(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/jpeg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

/// Check the declared MIME type and size of an upload
pub fn validate_image_upload(content_type: &str, size: usize) -> ValidationResult {
    let mut result = ValidationResult::new();

    if !ALLOWED_IMAGE_TYPES.contains(&content_type) {
        result.add_error(
            "file",
            ErrorKind::FileType,
            format!(
                "File type '{}' is not supported. Allowed types: JPEG, PNG, WEBP",
                content_type
            ),
        );
    }

    if size > MAX_IMAGE_BYTES {
        result.add_error("file", ErrorKind::FileSize, "File size exceeds 5MB limit");
    }

    result
}

/// Check that the bytes really are the declared image type
pub fn validate_image_content(data: &[u8], declared_type: &str) -> ValidationResult {
    let mut result = ValidationResult::new();

    match infer::get(data) {
        Some(kind) if kind.mime_type() == declared_type => {}
        Some(kind) => result.add_error(
            "file",
            ErrorKind::FileType,
            format!(
                "File content does not match declared type. Expected: {}, Actual: {}",
                declared_type,
                kind.mime_type()
            ),
        ),
        None => result.add_error("file", ErrorKind::FileType, "File content is not a recognised image"),
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIB: usize = 1024 * 1024;
    const PNG_MAGIC: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    #[test]
    fn oversized_jpeg_fails_on_size() {
        let result = validate_image_upload("image/jpeg", 6 * MIB);
        assert!(result.has_error("file", ErrorKind::FileSize));
        assert!(!result.has_error("file", ErrorKind::FileType));
    }

    #[test]
    fn text_file_fails_on_type() {
        let result = validate_image_upload("text/plain", 100);
        assert!(result.has_error("file", ErrorKind::FileType));
    }

    #[test]
    fn small_png_passes() {
        assert!(validate_image_upload("image/png", 4 * MIB).is_valid());
        assert!(validate_image_upload("image/webp", MAX_IMAGE_BYTES).is_valid());
        assert!(!validate_image_upload("image/webp", MAX_IMAGE_BYTES + 1).is_valid());
    }

    #[test]
    fn content_sniffing() {
        let mut png = PNG_MAGIC.to_vec();
        png.extend_from_slice(&[0; 32]);

        assert!(validate_image_content(&png, "image/png").is_valid());
        assert!(validate_image_content(&png, "image/jpeg").has_error("file", ErrorKind::FileType));
        assert!(!validate_image_content(b"plain text", "image/png").is_valid());
    }

    #[test]
    fn extensions() {
        assert_eq!(extension_for("image/jpeg"), Some("jpg"));
        assert_eq!(extension_for("image/gif"), None);
    }
}
