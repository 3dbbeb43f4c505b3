//! Interleaved byte rasters and the pixel access seams of the resampler.
//!
//! The resampler core never decodes images itself: it reads scanlines through
//! [`PixelAccessor`] and writes the finished raster through [`PixelWriter`].
//! Channel bytes are interleaved in a fixed order, low to high address:
//! `B,G,R` for 3 channels, `A,B,G,R` for 4, `Y` for 1.

use image::{DynamicImage, GenericImageView};

use crate::resample::ResampleError;

/// Read access to a source raster, one scanline at a time.
///
/// Implementations must be thread-safe: workers read distinct rows
/// concurrently.
pub trait PixelAccessor: Sync {
    fn width(&self) -> usize;
    fn height(&self) -> usize;

    /// Interleaved channel count: 1 (Y), 3 (B,G,R) or 4 (A,B,G,R).
    fn channels(&self) -> usize;

    /// Fill `row` with scanline `y` as interleaved channel bytes.
    /// `row` holds exactly `width() * channels()` bytes.
    fn read_row(&self, y: usize, row: &mut [u8]);
}

/// Write access to a destination raster.
pub trait PixelWriter {
    /// Copy a contiguous interleaved block of `width * height` pixels into
    /// the destination, with its top-left corner at `(x0, y0)`. The block
    /// uses the same channel order as [`PixelAccessor`].
    fn write_block(&mut self, pixels: &[u8], x0: usize, y0: usize, width: usize, height: usize);
}

/// Owned interleaved byte raster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    width: usize,
    height: usize,
    channels: usize,
    data: Vec<u8>,
}

impl Raster {
    /// Allocate a zeroed raster. Channel count must be 1, 3 or 4.
    pub fn new(width: usize, height: usize, channels: usize) -> Result<Self, ResampleError> {
        let len = raster_len(width, height, channels)?;
        Self::from_vec(width, height, channels, vec![0; len])
    }

    /// Wrap an existing interleaved byte buffer. The buffer length must be
    /// exactly `width * height * channels`.
    pub fn from_vec(
        width: usize,
        height: usize,
        channels: usize,
        data: Vec<u8>,
    ) -> Result<Self, ResampleError> {
        let expected = raster_len(width, height, channels)?;
        if data.len() != expected {
            return Err(ResampleError::InvalidArgument(format!(
                "raster buffer holds {} bytes, {}x{}x{} needs {}",
                data.len(),
                width,
                height,
                channels,
                expected
            )));
        }
        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    /// One scanline of interleaved bytes.
    pub fn row(&self, y: usize) -> &[u8] {
        assert!(y < self.height, "row index out of bounds");
        let stride = self.width * self.channels;
        &self.data[y * stride..(y + 1) * stride]
    }
}

fn raster_len(width: usize, height: usize, channels: usize) -> Result<usize, ResampleError> {
    if !matches!(channels, 1 | 3 | 4) {
        return Err(ResampleError::InvalidArgument(format!(
            "unsupported channel count {channels} (must be 1, 3 or 4)"
        )));
    }
    if width == 0 || height == 0 {
        return Err(ResampleError::InvalidArgument(format!(
            "raster dimensions must be nonzero, got {width}x{height}"
        )));
    }
    width
        .checked_mul(height)
        .and_then(|v| v.checked_mul(channels))
        .ok_or_else(|| ResampleError::InvalidArgument("raster dimensions overflow".into()))
}

impl PixelAccessor for Raster {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn channels(&self) -> usize {
        self.channels
    }

    fn read_row(&self, y: usize, row: &mut [u8]) {
        row.copy_from_slice(self.row(y));
    }
}

impl PixelWriter for Raster {
    fn write_block(&mut self, pixels: &[u8], x0: usize, y0: usize, width: usize, height: usize) {
        assert!(x0 + width <= self.width && y0 + height <= self.height);
        let stride = self.width * self.channels;
        let line = width * self.channels;
        for row in 0..height {
            let src = &pixels[row * line..(row + 1) * line];
            let at = (y0 + row) * stride + x0 * self.channels;
            self.data[at..at + line].copy_from_slice(src);
        }
    }
}

// ============================================================================
// image crate adapters
// ============================================================================

/// Convert any decoded image into the interleaved form the accumulation path
/// supports: `Y`, `B,G,R` or `A,B,G,R` bytes. Formats the core cannot consume
/// directly (paletted, high bit depth, float) are narrowed to 8 bits per
/// channel, keeping alpha when the source has it.
///
/// The second value is true when the source was 16-bit grayscale, so the
/// output can be widened back by [`raster_to_image`].
pub fn normalize_image(image: &DynamicImage) -> (Raster, bool) {
    let width = image.width() as usize;
    let height = image.height() as usize;
    match image {
        DynamicImage::ImageLuma8(gray) => {
            let raster = Raster::from_vec(width, height, 1, gray.as_raw().clone())
                .expect("buffer matches image dimensions");
            (raster, false)
        }
        DynamicImage::ImageLuma16(gray) => {
            let data = gray.as_raw().iter().map(|&v| (v >> 8) as u8).collect();
            let raster = Raster::from_vec(width, height, 1, data)
                .expect("buffer matches image dimensions");
            (raster, true)
        }
        DynamicImage::ImageRgb8(rgb) => (bgr_from_rgb(width, height, rgb.as_raw()), false),
        DynamicImage::ImageRgba8(rgba) => (abgr_from_rgba(width, height, rgba.as_raw()), false),
        other => {
            if other.color().has_alpha() {
                let rgba = other.to_rgba8();
                (abgr_from_rgba(width, height, rgba.as_raw()), false)
            } else {
                let rgb = other.to_rgb8();
                (bgr_from_rgb(width, height, rgb.as_raw()), false)
            }
        }
    }
}

/// Convert a resampled raster back into a decoded image. Gray output widens
/// to 16 bits when the source was 16-bit grayscale.
pub fn raster_to_image(raster: Raster, deep_gray: bool) -> DynamicImage {
    let width = raster.width() as u32;
    let height = raster.height() as u32;
    match raster.channels() {
        1 if deep_gray => {
            let data = raster.into_vec().iter().map(|&v| v as u16 * 257).collect();
            let buffer = image::ImageBuffer::<image::Luma<u16>, Vec<u16>>::from_raw(
                width, height, data,
            )
            .expect("buffer matches raster dimensions");
            DynamicImage::ImageLuma16(buffer)
        }
        1 => {
            let buffer = image::GrayImage::from_raw(width, height, raster.into_vec())
                .expect("buffer matches raster dimensions");
            DynamicImage::ImageLuma8(buffer)
        }
        3 => {
            let mut data = Vec::with_capacity(raster.data().len());
            for bgr in raster.data().chunks_exact(3) {
                data.extend_from_slice(&[bgr[2], bgr[1], bgr[0]]);
            }
            let buffer = image::RgbImage::from_raw(width, height, data)
                .expect("buffer matches raster dimensions");
            DynamicImage::ImageRgb8(buffer)
        }
        _ => {
            let mut data = Vec::with_capacity(raster.data().len());
            for abgr in raster.data().chunks_exact(4) {
                data.extend_from_slice(&[abgr[3], abgr[2], abgr[1], abgr[0]]);
            }
            let buffer = image::RgbaImage::from_raw(width, height, data)
                .expect("buffer matches raster dimensions");
            DynamicImage::ImageRgba8(buffer)
        }
    }
}

fn bgr_from_rgb(width: usize, height: usize, rgb: &[u8]) -> Raster {
    let mut data = Vec::with_capacity(rgb.len());
    for px in rgb.chunks_exact(3) {
        data.extend_from_slice(&[px[2], px[1], px[0]]);
    }
    Raster::from_vec(width, height, 3, data).expect("buffer matches image dimensions")
}

fn abgr_from_rgba(width: usize, height: usize, rgba: &[u8]) -> Raster {
    let mut data = Vec::with_capacity(rgba.len());
    for px in rgba.chunks_exact(4) {
        data.extend_from_slice(&[px[3], px[2], px[1], px[0]]);
    }
    Raster::from_vec(width, height, 4, data).expect("buffer matches image dimensions")
}
