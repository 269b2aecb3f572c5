//! Field codec: semantic values to raw bytes and back.
//!
//! Every field of the content tree passes through here before it is sealed
//! and after it is opened. Everything is text-based (UTF-8) except binary
//! payloads, so an opened field can be inspected with ordinary tools.
//!
//! Round-trip law: `decode(encode(v)) == v` for every supported value, with
//! one intentional exception: [`bytes_to_text`] maps an absent input to the
//! empty string instead of failing.

use std::io::Cursor;

use chrono::{DateTime, SecondsFormat, Utc};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder};
use uuid::Uuid;

use crate::error::{Result, StrongboxError};

/// Raster formats an image field may be stored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RasterFormat {
    /// Lossy, quality-controlled
    Jpeg,
    /// Lossless
    Png,
}

impl RasterFormat {
    /// Stable tag written into the image's format field.
    pub fn as_tag(&self) -> &'static str {
        match self {
            RasterFormat::Jpeg => "JPG",
            RasterFormat::Png => "PNG",
        }
    }

    /// Parse a stored format tag.
    pub fn from_tag(tag: &str) -> Result<Self> {
        match tag {
            "JPG" => Ok(RasterFormat::Jpeg),
            "PNG" => Ok(RasterFormat::Png),
            other => Err(StrongboxError::UnsupportedImageFormat(other.to_string())),
        }
    }

    pub fn image_format(&self) -> image::ImageFormat {
        match self {
            RasterFormat::Jpeg => image::ImageFormat::Jpeg,
            RasterFormat::Png => image::ImageFormat::Png,
        }
    }
}

impl TryFrom<image::ImageFormat> for RasterFormat {
    type Error = StrongboxError;

    fn try_from(format: image::ImageFormat) -> Result<Self> {
        match format {
            image::ImageFormat::Jpeg => Ok(RasterFormat::Jpeg),
            image::ImageFormat::Png => Ok(RasterFormat::Png),
            other => Err(StrongboxError::UnsupportedImageFormat(format!("{:?}", other))),
        }
    }
}

impl std::fmt::Display for RasterFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_tag())
    }
}

/// Encode text as UTF-8.
pub fn text_to_bytes(text: &str) -> Vec<u8> {
    text.as_bytes().to_vec()
}

/// Decode UTF-8 text. An absent input yields the empty string.
pub fn bytes_to_text(bytes: Option<&[u8]>) -> Result<String> {
    let Some(bytes) = bytes else {
        return Ok(String::new());
    };
    String::from_utf8(bytes.to_vec()).map_err(|e| StrongboxError::MalformedText(e.to_string()))
}

/// Encode a timestamp as RFC 3339 text (`2023-08-21T00:00:00Z`).
///
/// Sub-second precision is written only when present, so decoding always
/// reproduces the exact instant.
pub fn timestamp_to_bytes(timestamp: &DateTime<Utc>) -> Vec<u8> {
    text_to_bytes(&timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true))
}

/// Decode RFC 3339 text into a UTC timestamp.
pub fn bytes_to_timestamp(bytes: &[u8]) -> Result<DateTime<Utc>> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| StrongboxError::MalformedTimestamp(e.to_string()))?;
    DateTime::parse_from_rfc3339(text)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|e| StrongboxError::MalformedTimestamp(format!("{:?}: {}", text, e)))
}

/// Encode a number as its shortest round-tripping decimal text.
pub fn number_to_bytes(number: f64) -> Vec<u8> {
    text_to_bytes(&number.to_string())
}

/// Decode decimal text into a number.
pub fn bytes_to_number(bytes: &[u8]) -> Result<f64> {
    let text =
        std::str::from_utf8(bytes).map_err(|e| StrongboxError::MalformedNumber(e.to_string()))?;
    text.trim()
        .parse::<f64>()
        .map_err(|_| StrongboxError::MalformedNumber(format!("{:?}", text)))
}

/// Encode an identifier as its hyphenated text form.
pub fn uuid_to_bytes(id: &Uuid) -> Vec<u8> {
    text_to_bytes(&id.hyphenated().to_string())
}

/// Decode an identifier from its text form.
pub fn bytes_to_uuid(bytes: &[u8]) -> Result<Uuid> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| StrongboxError::InvalidInput(format!("Invalid identifier: {}", e)))?;
    Uuid::parse_str(text)
        .map_err(|e| StrongboxError::InvalidInput(format!("Invalid identifier: {}", e)))
}

/// Encode a raster image as JPEG or PNG.
///
/// `quality` is in `0.0..=1.0` and only affects JPEG. Any format other than
/// JPEG or PNG fails with `UnsupportedImageFormat`; there is no fallback.
pub fn image_to_bytes(
    image: &DynamicImage,
    format: image::ImageFormat,
    quality: f64,
) -> Result<Vec<u8>> {
    let format = RasterFormat::try_from(format)?;
    validate_quality(quality)?;

    let mut out = Vec::new();
    match format {
        RasterFormat::Jpeg => {
            let rgb = image.to_rgb8();
            let jpeg_quality = (quality * 100.0).round().clamp(1.0, 100.0) as u8;
            JpegEncoder::new_with_quality(&mut out, jpeg_quality)
                .write_image(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)
                .map_err(|e| StrongboxError::InvalidInput(format!("JPEG encoding failed: {}", e)))?;
        }
        RasterFormat::Png => {
            let rgba = image.to_rgba8();
            PngEncoder::new(&mut out)
                .write_image(
                    rgba.as_raw(),
                    rgba.width(),
                    rgba.height(),
                    ExtendedColorType::Rgba8,
                )
                .map_err(|e| StrongboxError::InvalidInput(format!("PNG encoding failed: {}", e)))?;
        }
    }
    Ok(out)
}

/// Decode stored image bytes for display.
pub fn bytes_to_image(bytes: &[u8], format: RasterFormat) -> Result<DynamicImage> {
    image::ImageReader::with_format(Cursor::new(bytes), format.image_format())
        .decode()
        .map_err(|e| StrongboxError::InvalidInput(format!("Image decoding failed: {}", e)))
}

/// Reject qualities outside `0.0..=1.0` (including NaN).
pub fn validate_quality(quality: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&quality) {
        return Err(StrongboxError::InvalidInput(format!(
            "Image quality must be between 0.0 and 1.0 (got {})",
            quality
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use image::{Rgb, RgbImage};

    fn sample_image() -> DynamicImage {
        let img = RgbImage::from_fn(8, 6, |x, y| Rgb([(x * 30) as u8, (y * 40) as u8, 128]));
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn test_timestamp_round_trip() {
        let t = Utc.with_ymd_and_hms(2023, 8, 21, 0, 0, 0).unwrap();
        let bytes = timestamp_to_bytes(&t);
        assert_eq!(bytes, b"2023-08-21T00:00:00Z");
        assert_eq!(bytes_to_timestamp(&bytes).unwrap(), t);
    }

    #[test]
    fn test_timestamp_keeps_subsecond_precision() {
        let t = Utc::now();
        assert_eq!(bytes_to_timestamp(&timestamp_to_bytes(&t)).unwrap(), t);
    }

    #[test]
    fn test_timestamp_with_offset_normalizes_to_utc() {
        let parsed = bytes_to_timestamp(b"2023-08-21T02:00:00+02:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2023, 8, 21, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_malformed_timestamp() {
        let result = bytes_to_timestamp(b"21.08.2023");
        assert!(matches!(result, Err(StrongboxError::MalformedTimestamp(_))));
    }

    #[test]
    fn test_text_round_trip() {
        let bytes = text_to_bytes("Home Safe");
        assert_eq!(bytes_to_text(Some(&bytes)).unwrap(), "Home Safe");
    }

    #[test]
    fn test_absent_text_is_empty() {
        assert_eq!(bytes_to_text(None).unwrap(), "");
        assert_eq!(bytes_to_text(Some(&[])).unwrap(), "");
    }

    #[test]
    fn test_invalid_utf8_is_malformed_text() {
        let result = bytes_to_text(Some(&[0xff, 0xfe]));
        assert!(matches!(result, Err(StrongboxError::MalformedText(_))));
    }

    #[test]
    fn test_number_round_trip() {
        for n in [0.0, 0.85, 1.0, -12.5, 1e-9, f64::MAX] {
            assert_eq!(bytes_to_number(&number_to_bytes(n)).unwrap(), n);
        }
    }

    #[test]
    fn test_malformed_number() {
        let result = bytes_to_number(b"eighty");
        assert!(matches!(result, Err(StrongboxError::MalformedNumber(_))));
    }

    #[test]
    fn test_uuid_round_trip() {
        let id = Uuid::new_v4();
        assert_eq!(bytes_to_uuid(&uuid_to_bytes(&id)).unwrap(), id);
    }

    #[test]
    fn test_png_is_lossless() {
        let img = sample_image();
        let bytes = image_to_bytes(&img, image::ImageFormat::Png, 1.0).unwrap();
        let decoded = bytes_to_image(&bytes, RasterFormat::Png).unwrap();
        assert_eq!(decoded.to_rgb8(), img.to_rgb8());
    }

    #[test]
    fn test_jpeg_encodes_and_decodes() {
        let img = sample_image();
        let bytes = image_to_bytes(&img, image::ImageFormat::Jpeg, 0.8).unwrap();
        assert_eq!(&bytes[..2], &[0xff, 0xd8]);
        let decoded = bytes_to_image(&bytes, RasterFormat::Jpeg).unwrap();
        assert_eq!(decoded.width(), 8);
        assert_eq!(decoded.height(), 6);
    }

    #[test]
    fn test_unsupported_image_format() {
        let result = image_to_bytes(&sample_image(), image::ImageFormat::Gif, 1.0);
        assert!(matches!(
            result,
            Err(StrongboxError::UnsupportedImageFormat(_))
        ));
    }

    #[test]
    fn test_quality_out_of_range() {
        let result = image_to_bytes(&sample_image(), image::ImageFormat::Jpeg, 1.5);
        assert!(matches!(result, Err(StrongboxError::InvalidInput(_))));
        assert!(validate_quality(f64::NAN).is_err());
    }

    #[test]
    fn test_format_tags() {
        assert_eq!(RasterFormat::from_tag("JPG").unwrap(), RasterFormat::Jpeg);
        assert_eq!(RasterFormat::from_tag("PNG").unwrap(), RasterFormat::Png);
        assert!(RasterFormat::from_tag("BMP").is_err());
    }
}
