/// Image container sniffed from the leading bytes of a decoded payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Png,
    Jpeg,
    Webp,
}

impl ImageKind {
    /// Unknown payloads are treated as PNG.
    pub fn detect(bytes: &[u8]) -> Self {
        match bytes {
            [0xFF, 0xD8, 0xFF, ..] => ImageKind::Jpeg,
            [0x89, 0x50, 0x4E, 0x47, ..] => ImageKind::Png,
            [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => ImageKind::Webp,
            _ => {
                tracing::warn!(
                    "Unrecognized image format (first 4 bytes: {:02X?}), assuming PNG",
                    &bytes[..bytes.len().min(4)]
                );
                ImageKind::Png
            }
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ImageKind::Png => "png",
            ImageKind::Jpeg => "jpg",
            ImageKind::Webp => "webp",
        }
    }

    /// File name a delivered photo is sent under.
    pub fn photo_filename(self) -> String {
        format!("generated_image.{}", self.extension())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_known_formats() {
        assert_eq!(
            ImageKind::detect(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A]),
            ImageKind::Png
        );
        assert_eq!(ImageKind::detect(&[0xFF, 0xD8, 0xFF, 0xE0]), ImageKind::Jpeg);
        assert_eq!(
            ImageKind::detect(&[
                0x52, 0x49, 0x46, 0x46, 0x00, 0x00, 0x00, 0x00, 0x57, 0x45, 0x42, 0x50
            ]),
            ImageKind::Webp
        );
    }

    #[test]
    fn test_unknown_and_empty_fall_back_to_png() {
        assert_eq!(ImageKind::detect(&[0x00, 0x01, 0x02, 0x03]), ImageKind::Png);
        assert_eq!(ImageKind::detect(&[]), ImageKind::Png);
    }

    #[test]
    fn test_photo_filename() {
        assert_eq!(ImageKind::Jpeg.photo_filename(), "generated_image.jpg");
        assert_eq!(ImageKind::Png.photo_filename(), "generated_image.png");
    }
}
