//! Two-pass separable resampling engine.
//!
//! A [`Resampler`] validates its input, precomputes one [`WeightTable`] per
//! axis, then resamples horizontally into an intermediate buffer and
//! vertically into the output, striping rows and columns across fresh worker
//! threads. Accumulation is single-precision float; output is 8 bits per
//! channel with saturating round-half-up.
//!
//! # Module Structure
//! - `filter`: reconstruction filter contract and canonical kernels
//! - `weights`: per-axis contribution tables
//! - `horizontal` / `vertical`: the row- and column-striped passes
//! - `progress`: shared counter, sampler thread and listener contract

mod filter;
mod horizontal;
mod progress;
mod vertical;
mod weights;

#[cfg(test)]
mod tests_basic;

use std::any::Any;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use tracing::debug;

use crate::raster::{normalize_image, raster_to_image, PixelAccessor, PixelWriter, Raster};

pub use filter::{
    BSpline, Bell, BoxFilter, CatmullRom, Hermite, Lanczos2, Lanczos3, Mitchell, ResampleFilter,
    Triangle,
};
pub use progress::ProgressListener;
pub use weights::WeightTable;

use progress::{ProgressTracker, SamplerGate};

/// Errors surfaced by the resampling engine. None are retried internally.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResampleError {
    /// Bad dimensions, channel counts or scale factors.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// `resample` was entered while another call on the same instance was in
    /// progress.
    #[error("concurrent invocation of the same resampler instance")]
    ConcurrentInvocation,

    /// A worker thread panicked; the resample was aborted after joining the
    /// remaining workers.
    #[error("worker failed: {0}")]
    WorkerFailed(String),

    /// The cancel token was triggered while the resample was running.
    #[error("resample cancelled")]
    Cancelled,
}

/// How many worker threads a resample uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThreadingPolicy {
    /// One worker per pass.
    Single,
    /// A fixed worker count.
    Fixed(NonZeroUsize),
    /// One worker per available hardware thread.
    #[default]
    Adaptive,
}

impl ThreadingPolicy {
    pub fn workers(&self) -> usize {
        match self {
            Self::Single => 1,
            Self::Fixed(count) => count.get(),
            Self::Adaptive => thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1),
        }
    }
}

/// Cooperative cancellation flag for an in-flight resample.
///
/// Workers observe the flag at row/column boundaries and wind down; the
/// resample call then returns [`ResampleError::Cancelled`]. The flag is
/// cleared when a new call starts on the owning resampler.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    fn clear(&self) {
        self.0.store(false, Ordering::Relaxed);
    }
}

/// Two-pass separable resampler.
///
/// One instance can be reused across calls but not invoked concurrently with
/// itself; a reentrant call fails with
/// [`ResampleError::ConcurrentInvocation`].
pub struct Resampler {
    filter: Box<dyn ResampleFilter>,
    threading: ThreadingPolicy,
    listeners: Vec<Arc<dyn ProgressListener>>,
    cancel: CancelToken,
    in_flight: AtomicBool,
}

impl Default for Resampler {
    fn default() -> Self {
        Self::new(Lanczos3)
    }
}

impl Resampler {
    pub fn new(filter: impl ResampleFilter + 'static) -> Self {
        Self {
            filter: Box::new(filter),
            threading: ThreadingPolicy::default(),
            listeners: Vec::new(),
            cancel: CancelToken::default(),
            in_flight: AtomicBool::new(false),
        }
    }

    /// Replace the reconstruction filter.
    pub fn with_filter(self, filter: impl ResampleFilter + 'static) -> Self {
        self.with_filter_boxed(Box::new(filter))
    }

    /// Replace the reconstruction filter with an already-boxed one.
    pub fn with_filter_boxed(mut self, filter: Box<dyn ResampleFilter>) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_threading(mut self, threading: ThreadingPolicy) -> Self {
        self.threading = threading;
        self
    }

    pub fn with_progress_listener(mut self, listener: impl ProgressListener + 'static) -> Self {
        self.add_progress_listener(listener);
        self
    }

    pub fn add_progress_listener(&mut self, listener: impl ProgressListener + 'static) {
        self.listeners.push(Arc::new(listener));
    }

    /// A handle for cancelling an in-flight resample from another thread.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Resample `src` to an explicit destination size.
    pub fn resample(
        &self,
        src: &dyn PixelAccessor,
        dst_width: usize,
        dst_height: usize,
    ) -> Result<Raster, ResampleError> {
        let mut dest = Raster::new(dst_width, dst_height, src.channels())?;
        self.execute(src, &mut dest)?;
        Ok(dest)
    }

    /// Resample `src` by a uniform scale factor. Destination dimensions are
    /// `floor(size * factor + 0.5)` per axis.
    pub fn resample_scaled(
        &self,
        src: &dyn PixelAccessor,
        factor: f32,
    ) -> Result<Raster, ResampleError> {
        self.resample_scaled_xy(src, factor, factor)
    }

    /// Resample `src` by independent horizontal and vertical scale factors.
    pub fn resample_scaled_xy(
        &self,
        src: &dyn PixelAccessor,
        factor_x: f32,
        factor_y: f32,
    ) -> Result<Raster, ResampleError> {
        if !(factor_x > 0.0) || !(factor_y > 0.0) {
            return Err(ResampleError::InvalidArgument(format!(
                "scale factors must be positive, got {factor_x}x{factor_y}"
            )));
        }
        let dst_width = (src.width() as f32 * factor_x + 0.5).floor() as usize;
        let dst_height = (src.height() as f32 * factor_y + 0.5).floor() as usize;
        self.resample(src, dst_width, dst_height)
    }

    /// Resample `src` into a caller-supplied destination raster, which also
    /// determines the target dimensions. The destination channel count must
    /// match the source.
    pub fn resample_into(
        &self,
        src: &dyn PixelAccessor,
        dest: &mut Raster,
    ) -> Result<(), ResampleError> {
        self.execute(src, dest)
    }

    /// Resample a decoded image, normalizing unsupported pixel formats to
    /// the interleaved byte layout first. Gray 16-bit sources come back as
    /// 16-bit gray.
    pub fn resample_image(
        &self,
        image: &image::DynamicImage,
        dst_width: usize,
        dst_height: usize,
    ) -> Result<image::DynamicImage, ResampleError> {
        let (raster, deep_gray) = normalize_image(image);
        let out = self.resample(&raster, dst_width, dst_height)?;
        Ok(raster_to_image(out, deep_gray))
    }

    /// Scale-factor variant of [`Resampler::resample_image`].
    pub fn resample_image_scaled(
        &self,
        image: &image::DynamicImage,
        factor: f32,
    ) -> Result<image::DynamicImage, ResampleError> {
        let (raster, deep_gray) = normalize_image(image);
        let out = self.resample_scaled(&raster, factor)?;
        Ok(raster_to_image(out, deep_gray))
    }

    fn execute(&self, src: &dyn PixelAccessor, dest: &mut Raster) -> Result<(), ResampleError> {
        let _guard = InvocationGuard::enter(&self.in_flight)?;
        self.cancel.clear();

        let src_width = src.width();
        let src_height = src.height();
        let dst_width = dest.width();
        let dst_height = dest.height();
        let channels = src.channels();

        if dst_width < 3 || dst_height < 3 {
            return Err(ResampleError::InvalidArgument(format!(
                "target size {dst_width}x{dst_height} is below the 3x3 minimum"
            )));
        }
        if !matches!(channels, 1 | 3 | 4) {
            return Err(ResampleError::InvalidArgument(format!(
                "unsupported channel count {channels} (must be 1, 3 or 4)"
            )));
        }
        if dest.channels() != channels {
            return Err(ResampleError::InvalidArgument(format!(
                "destination has {} channels, source has {channels}",
                dest.channels()
            )));
        }

        let workers = self.threading.workers();
        debug!(
            src_width,
            src_height, dst_width, dst_height, channels, workers, "resample"
        );

        let horizontal_table = WeightTable::build(self.filter.as_ref(), src_width, dst_width)?;
        let vertical_table = WeightTable::build(self.filter.as_ref(), src_height, dst_height)?;

        let row_len = dst_width * channels;
        let intermediate_len = src_height.checked_mul(row_len).ok_or_else(|| {
            ResampleError::InvalidArgument("intermediate buffer size overflows".into())
        })?;
        let mut intermediate = vec![0u8; intermediate_len];
        let mut out = vec![0u8; dst_height * row_len];

        let tracker = ProgressTracker::new(src_height + dst_width);
        let gate = SamplerGate::new();

        let passes = thread::scope(|scope| {
            let sampler = scope.spawn(|| progress::sample_loop(&tracker, &gate, &self.listeners));
            tracker.publish_fraction(&self.listeners, 0.0);

            let result = horizontal::run(
                src,
                &horizontal_table,
                &mut intermediate,
                row_len,
                workers,
                &tracker,
                &self.cancel,
            )
            .and_then(|()| {
                vertical::run(
                    &intermediate,
                    &vertical_table,
                    &mut out,
                    dst_width,
                    dst_height,
                    channels,
                    workers,
                    &tracker,
                    &self.cancel,
                )
            });

            gate.stop();
            let _ = sampler.join();
            result
        });
        passes?;
        drop(intermediate);

        if self.cancel.is_cancelled() {
            return Err(ResampleError::Cancelled);
        }

        tracker.publish_fraction(&self.listeners, 1.0);
        dest.write_block(&out, 0, 0, dst_width, dst_height);
        Ok(())
    }
}

/// Saturating round-half-up to a byte, applied per channel per sample.
#[inline]
pub(crate) fn to_byte(value: f32) -> u8 {
    if value < 0.0 {
        0
    } else if value > 255.0 {
        255
    } else {
        (value + 0.5) as u8
    }
}

/// Join every pass worker, reporting the last panic as `WorkerFailed`.
pub(crate) fn join_workers(
    handles: Vec<thread::ScopedJoinHandle<'_, ()>>,
) -> Result<(), ResampleError> {
    let mut failure = None;
    for handle in handles {
        if let Err(payload) = handle.join() {
            failure = Some(panic_message(payload));
        }
    }
    match failure {
        Some(message) => Err(ResampleError::WorkerFailed(message)),
        None => Ok(()),
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "worker panicked".to_string()
    }
}

/// RAII reentrancy guard: flips the in-flight flag for the duration of one
/// resample call.
struct InvocationGuard<'a>(&'a AtomicBool);

impl<'a> InvocationGuard<'a> {
    fn enter(flag: &'a AtomicBool) -> Result<Self, ResampleError> {
        if flag.swap(true, Ordering::Acquire) {
            return Err(ResampleError::ConcurrentInvocation);
        }
        Ok(Self(flag))
    }
}

impl Drop for InvocationGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
