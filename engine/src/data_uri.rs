use std::{fs, path::Path};

use base64::{Engine as _, engine::general_purpose};
use color_eyre::{Result, eyre::WrapErr as _};

/// Used when the bytes don't look like a known image format
pub const FALLBACK_MIME: &str = "image/jpeg";

pub fn encode_file(path: &Path) -> Result<String> {
    let bytes =
        fs::read(path).wrap_err_with(|| format!("Couldn't read image {}", path.display()))?;
    Ok(encode_bytes(&bytes))
}

pub fn encode_bytes(bytes: &[u8]) -> String {
    let mime = infer::get(bytes)
        .map(|kind| kind.mime_type())
        .filter(|mime| mime.starts_with("image/"))
        .unwrap_or(FALLBACK_MIME);
    format!(
        "data:{mime};base64,{}",
        general_purpose::STANDARD.encode(bytes)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0];

    #[test]
    fn sniffs_png() {
        let uri = encode_bytes(PNG_MAGIC);
        assert!(uri.starts_with("data:image/png;base64,"), "{uri}");
    }

    #[test]
    fn unknown_bytes_fall_back_to_jpeg() {
        assert_eq!(encode_bytes(b"hello"), "data:image/jpeg;base64,aGVsbG8=");
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = encode_file(Path::new("nope/missing.jpg")).unwrap_err();
        assert!(err.to_string().contains("nope/missing.jpg"));
    }
}
