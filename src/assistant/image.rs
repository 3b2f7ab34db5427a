use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::ImageFormat;

use crate::assistant::error::AskError;

/// Largest encoded screenshot accepted before any upstream call.
pub const MAX_IMAGE_BYTES: usize = 20 * 1024 * 1024;

const JPEG_PREFIX: &str = "data:image/jpeg;base64,";
const PNG_PREFIX: &str = "data:image/png;base64,";
const WEBP_PREFIX: &str = "data:image/webp;base64,";

const RECOGNIZED_PREFIXES: [&str; 3] = [JPEG_PREFIX, PNG_PREFIX, WEBP_PREFIX];

/// Turns raw or partially-prefixed base64 image data into an image data URI.
///
/// Recognized JPEG/PNG/WebP data URIs pass through untouched. Any other
/// `data:` header is replaced by the JPEG header, and headerless input is
/// treated as JPEG base64.
pub fn normalize_image(raw: &str) -> Result<String, AskError> {
    if raw.len() > MAX_IMAGE_BYTES {
        return Err(AskError::PayloadTooLarge {
            size: raw.len(),
            limit: MAX_IMAGE_BYTES,
        });
    }

    if RECOGNIZED_PREFIXES
        .iter()
        .any(|prefix| raw.starts_with(prefix))
    {
        return Ok(raw.to_string());
    }

    let data = match raw.strip_prefix("data:") {
        Some(rest) => rest.split_once(',').map_or(rest, |(_, data)| data),
        None => raw,
    };
    Ok(format!("{JPEG_PREFIX}{data}"))
}

/// Encodes image file bytes as a data URI, sniffing the format from its magic bytes.
pub fn encode_image_bytes(bytes: &[u8]) -> Result<String, String> {
    let prefix = match image::guess_format(bytes) {
        Ok(ImageFormat::Jpeg) => JPEG_PREFIX,
        Ok(ImageFormat::Png) => PNG_PREFIX,
        Ok(ImageFormat::WebP) => WEBP_PREFIX,
        Ok(other) => {
            return Err(format!(
                "Unsupported screenshot format {other:?}. Use JPEG, PNG or WebP."
            ));
        }
        Err(err) => return Err(format!("Could not detect screenshot format: {err}")),
    };
    Ok(format!("{prefix}{}", STANDARD.encode(bytes)))
}

#[cfg(test)]
mod tests {
    use super::{MAX_IMAGE_BYTES, encode_image_bytes, normalize_image};
    use crate::assistant::error::AskError;

    #[test]
    fn headerless_base64_gets_jpeg_prefix() {
        let uri = normalize_image("iVBORw0KGgo=").expect("should normalize");
        assert_eq!(uri, "data:image/jpeg;base64,iVBORw0KGgo=");
    }

    #[test]
    fn recognized_prefixes_pass_through() {
        for uri in [
            "data:image/jpeg;base64,AAAA",
            "data:image/png;base64,AAAA",
            "data:image/webp;base64,AAAA",
        ] {
            assert_eq!(normalize_image(uri).expect("should normalize"), uri);
        }
    }

    #[test]
    fn normalization_is_idempotent() {
        for raw in ["AAAA", "data:;base64,AAAA", "data:application/octet-stream;base64,AAAA"] {
            let once = normalize_image(raw).expect("first pass");
            let twice = normalize_image(&once).expect("second pass");
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn unrecognized_data_header_is_rewritten() {
        let uri = normalize_image("data:application/octet-stream;base64,AAAA").expect("rewrite");
        assert_eq!(uri, "data:image/jpeg;base64,AAAA");

        let gif = normalize_image("data:image/gif;base64,R0lG").expect("rewrite");
        assert_eq!(gif, "data:image/jpeg;base64,R0lG");
    }

    #[test]
    fn oversized_input_is_rejected_before_encoding() {
        let raw = "A".repeat(MAX_IMAGE_BYTES + 1);
        match normalize_image(&raw) {
            Err(AskError::PayloadTooLarge { size, limit }) => {
                assert_eq!(size, MAX_IMAGE_BYTES + 1);
                assert_eq!(limit, MAX_IMAGE_BYTES);
            }
            other => panic!("expected PayloadTooLarge, got {other:?}"),
        }
    }

    #[test]
    fn png_bytes_encode_with_png_prefix() {
        let png_magic = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
        let uri = encode_image_bytes(&png_magic).expect("png should be detected");
        assert!(uri.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn unknown_bytes_are_rejected() {
        assert!(encode_image_bytes(b"plain text, not an image").is_err());
    }
}
