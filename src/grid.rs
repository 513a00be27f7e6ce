use image::{DynamicImage, GenericImageView, imageops::FilterType};
use palette::Srgb;

use crate::error::{ProfileError, Result};

/// A decoded image as a flat, row-major grid of RGB pixels.
///
/// Profiling only ever looks at the pixels as a multiset; the dimensions are
/// kept for callers and for downscaling.
#[derive(Clone, Debug, PartialEq)]
pub struct PixelGrid {
    width: u32,
    height: u32,
    pixels: Vec<Srgb<u8>>,
}

impl PixelGrid {
    /// Build a grid from packed `RGBRGB...` bytes.
    pub fn from_raw_rgb(width: u32, height: u32, raw: &[u8]) -> Result<Self> {
        let expected = width as usize * height as usize * 3;
        if raw.len() != expected {
            return Err(ProfileError::InvalidParameter(format!(
                "pixel buffer length {} does not match {width}x{height} RGB",
                raw.len()
            )));
        }
        let pixels = raw
            .chunks_exact(3)
            .map(|c| Srgb::new(c[0], c[1], c[2]))
            .collect();
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Decode an encoded raster image (PNG, JPEG, ...). Alpha is discarded.
    ///
    /// With `downscale = Some(n)` the image is first shrunk (nearest-neighbour,
    /// aspect preserved) so that its longest side is at most `n`.
    pub fn decode(input: &[u8], downscale: Option<u32>) -> Result<Self> {
        let img = image::load_from_memory(input)?;
        Ok(Self::from_image(&img, downscale))
    }

    pub fn from_image(img: &DynamicImage, downscale: Option<u32>) -> Self {
        let (orig_w, orig_h) = img.dimensions();
        let max_side = orig_w.max(orig_h);

        let rgb = match downscale {
            Some(scale) if scale > 0 && max_side > scale => {
                let ratio = scale as f32 / max_side as f32;
                let w = ((orig_w as f32) * ratio).round().max(1.0) as u32;
                let h = ((orig_h as f32) * ratio).round().max(1.0) as u32;
                log::debug!("downscaling {orig_w}x{orig_h} to {w}x{h}");
                image::imageops::resize(&img.to_rgb8(), w, h, FilterType::Nearest)
            }
            _ => img.to_rgb8(),
        };

        let (width, height) = rgb.dimensions();
        let pixels = rgb
            .pixels()
            .map(|p| Srgb::new(p.0[0], p.0[1], p.0[2]))
            .collect();
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[Srgb<u8>] {
        &self.pixels
    }

    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }
}
