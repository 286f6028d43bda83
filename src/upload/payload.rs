use bytes::Bytes;

/// An image ready to hand to a host: raw bytes plus the metadata the
/// multipart part needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    pub bytes: Bytes,
    pub filename: String,
    pub mime_type: String,
}

impl ImagePayload {
    pub fn new(
        bytes: impl Into<Bytes>,
        filename: impl Into<String>,
        mime_type: impl Into<String>,
    ) -> Self {
        Self {
            bytes: bytes.into(),
            filename: filename.into(),
            mime_type: mime_type.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// 1x1 transparent PNG used to check a single host
pub const TEST_IMAGE_PNG: &[u8] = &[
    0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1f,
    0x15, 0xc4, 0x89, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x44, 0x41, 0x54, 0x78, 0xda, 0x63, 0x64,
    0x60, 0xf8, 0x5f, 0x0f, 0x00, 0x02, 0x84, 0x02, 0x3d, 0x8d, 0x4e, 0xfb, 0xca, 0x00, 0x00,
    0x00, 0x00, 0x49, 0x45, 0x4e, 0x44, 0xae, 0x42, 0x60, 0x82,
];

impl ImagePayload {
    pub fn test_image() -> Self {
        Self::new(Bytes::from_static(TEST_IMAGE_PNG), "test.png", "image/png")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_image_is_png() {
        let image = ImagePayload::test_image();
        assert!(image.bytes.starts_with(b"\x89PNG\r\n\x1a\n"));
        assert!(image.bytes.ends_with(b"IEND\xaeB`\x82"));
        assert_eq!(image.mime_type, "image/png");
        assert!(!image.is_empty());
    }
}
