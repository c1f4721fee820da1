use image::{metadata::Orientation, DynamicImage, ImageDecoder, ImageReader, RgbImage};
use std::io::Cursor;

use crate::application::ports::ImageNormalizerPort;
use crate::domain::errors::{DomainError, DomainResult};

/// Decodes any format the `image` crate recognizes, applies the EXIF orientation
/// and forces 8-bit RGB.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExifRgbNormalizer;

impl ExifRgbNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// Decodes the bytes and reads the embedded orientation without applying it.
    pub fn decode(bytes: &[u8]) -> DomainResult<(DynamicImage, Orientation)> {
        if bytes.is_empty() {
            return Err(DomainError::InvalidImage("image data is empty".into()));
        }

        let reader = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| DomainError::InvalidImage(e.to_string()))?;
        let mut decoder = reader
            .into_decoder()
            .map_err(|e| DomainError::InvalidImage(e.to_string()))?;

        // Corrupt EXIF metadata does not invalidate the pixels.
        let orientation = decoder.orientation().unwrap_or(Orientation::NoTransforms);

        let img = DynamicImage::from_decoder(decoder)
            .map_err(|e| DomainError::InvalidImage(e.to_string()))?;

        Ok((img, orientation))
    }
}

pub fn orient_rgb(mut img: DynamicImage, orientation: Orientation) -> RgbImage {
    img.apply_orientation(orientation);
    img.into_rgb8()
}

impl ImageNormalizerPort for ExifRgbNormalizer {
    fn normalize(&self, bytes: &[u8]) -> DomainResult<RgbImage> {
        let (img, orientation) = Self::decode(bytes)?;
        Ok(orient_rgb(img, orientation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, ImageFormat, Luma};

    fn encode(img: &DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), format).unwrap();
        buf
    }

    #[test]
    fn decodes_png_to_rgb() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(64, 48));
        let bytes = encode(&img, ImageFormat::Png);

        let rgb = ExifRgbNormalizer::new().normalize(&bytes).unwrap();
        assert_eq!(rgb.dimensions(), (64, 48));
    }

    #[test]
    fn grayscale_is_expanded_to_three_channels() {
        let gray = DynamicImage::ImageLuma8(GrayImage::from_pixel(8, 8, Luma([200])));
        let bytes = encode(&gray, ImageFormat::Png);

        let rgb = ExifRgbNormalizer::new().normalize(&bytes).unwrap();
        assert_eq!(rgb.get_pixel(0, 0).0, [200, 200, 200]);
    }

    #[test]
    fn rotated_orientation_swaps_dimensions() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(640, 480));
        let rgb = orient_rgb(img, Orientation::Rotate90);
        assert_eq!(rgb.dimensions(), (480, 640));
    }

    /// Splices an APP1 segment carrying only the EXIF orientation tag after SOI.
    fn with_exif_orientation(jpeg: &[u8], orientation: u16) -> Vec<u8> {
        let mut tiff = Vec::new();
        tiff.extend_from_slice(b"MM\x00\x2a");
        tiff.extend_from_slice(&8u32.to_be_bytes());
        tiff.extend_from_slice(&1u16.to_be_bytes());
        tiff.extend_from_slice(&0x0112u16.to_be_bytes());
        tiff.extend_from_slice(&3u16.to_be_bytes());
        tiff.extend_from_slice(&1u32.to_be_bytes());
        tiff.extend_from_slice(&orientation.to_be_bytes());
        tiff.extend_from_slice(&[0, 0]);
        tiff.extend_from_slice(&0u32.to_be_bytes());

        let mut app1 = vec![0xFF, 0xE1];
        app1.extend_from_slice(&((2 + 6 + tiff.len()) as u16).to_be_bytes());
        app1.extend_from_slice(b"Exif\x00\x00");
        app1.extend_from_slice(&tiff);

        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
        let mut out = jpeg[..2].to_vec();
        out.extend_from_slice(&app1);
        out.extend_from_slice(&jpeg[2..]);
        out
    }

    #[test]
    fn exif_rotate90_in_jpeg_swaps_dimensions() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(640, 480));
        let bytes = with_exif_orientation(&encode(&img, ImageFormat::Jpeg), 6);

        let (_, orientation) = ExifRgbNormalizer::decode(&bytes).unwrap();
        assert_eq!(orientation, Orientation::Rotate90);

        let rgb = ExifRgbNormalizer::new().normalize(&bytes).unwrap();
        assert_eq!(rgb.dimensions(), (480, 640));
    }

    #[test]
    fn jpeg_without_exif_keeps_dimensions() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(640, 480));
        let bytes = encode(&img, ImageFormat::Jpeg);

        let rgb = ExifRgbNormalizer::new().normalize(&bytes).unwrap();
        assert_eq!(rgb.dimensions(), (640, 480));
    }

    #[test]
    fn garbage_bytes_are_an_invalid_image() {
        let err = ExifRgbNormalizer::new()
            .normalize(b"definitely not an image")
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidImage(_)));
    }

    #[test]
    fn empty_bytes_are_an_invalid_image() {
        let err = ExifRgbNormalizer::new().normalize(&[]).unwrap_err();
        assert!(matches!(err, DomainError::InvalidImage(_)));
    }
}
