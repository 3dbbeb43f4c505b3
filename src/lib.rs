//! High-quality image resampling with separable reconstruction filters.
//!
//! The resampler runs two one-dimensional passes (horizontal, then vertical)
//! over precomputed per-axis contribution tables, accumulating in `f32` and
//! writing 8-bit interleaved output. Rows and columns are striped across
//! worker threads, and long operations report progress through registered
//! listeners.
//!
//! # Module Structure
//! - `raster`: interleaved byte rasters and the pixel access seams
//! - `resample`: filters, weight tables, the two passes and the driver

pub mod raster;
pub mod resample;

pub use raster::{PixelAccessor, PixelWriter, Raster};
pub use resample::{
    BSpline, Bell, BoxFilter, CancelToken, CatmullRom, Hermite, Lanczos2, Lanczos3, Mitchell,
    ProgressListener, ResampleError, ResampleFilter, Resampler, ThreadingPolicy, Triangle,
    WeightTable,
};
