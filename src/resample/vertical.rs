//! Vertical pass: resample the intermediate buffer to destination height.
//!
//! Destination columns are striped across workers by modulus. Columns
//! interleave in the flat output buffer, so workers share it through an
//! unsynchronized raw view; disjoint column offsets mean writes never alias.

use std::thread;

use super::progress::ProgressTracker;
use super::weights::WeightTable;
use super::{join_workers, to_byte, CancelToken, ResampleError};

/// Unsynchronized shared view of the output buffer.
///
/// Column striping hands every worker a disjoint set of byte offsets, which
/// is the whole safety argument: no offset is ever written from two threads.
struct SharedOut {
    ptr: *mut u8,
    len: usize,
}

unsafe impl Send for SharedOut {}
unsafe impl Sync for SharedOut {}

impl SharedOut {
    fn new(buf: &mut [u8]) -> Self {
        Self {
            ptr: buf.as_mut_ptr(),
            len: buf.len(),
        }
    }

    /// # Safety
    /// Caller must guarantee `index < len` and that no other thread writes
    /// the same index.
    #[inline]
    unsafe fn write(&self, index: usize, value: u8) {
        debug_assert!(index < self.len);
        // SAFETY: index is in bounds per the caller contract, and the column
        // partition makes this thread the only writer of the offset.
        unsafe { *self.ptr.add(index) = value }
    }
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn run(
    intermediate: &[u8],
    table: &WeightTable,
    out: &mut [u8],
    dst_width: usize,
    dst_height: usize,
    channels: usize,
    workers: usize,
    progress: &ProgressTracker,
    cancel: &CancelToken,
) -> Result<(), ResampleError> {
    let shared = SharedOut::new(out);
    let row_len = dst_width * channels;

    thread::scope(|scope| {
        let shared = &shared;
        let handles: Vec<_> = (0..workers)
            .map(|worker| {
                scope.spawn(move || {
                    resample_columns(
                        intermediate,
                        table,
                        shared,
                        row_len,
                        dst_width,
                        dst_height,
                        channels,
                        worker,
                        workers,
                        progress,
                        cancel,
                    )
                })
            })
            .collect();
        join_workers(handles)
    })
}

#[allow(clippy::too_many_arguments)]
fn resample_columns(
    intermediate: &[u8],
    table: &WeightTable,
    out: &SharedOut,
    row_len: usize,
    dst_width: usize,
    dst_height: usize,
    channels: usize,
    worker: usize,
    workers: usize,
    progress: &ProgressTracker,
    cancel: &CancelToken,
) {
    for x in (worker..dst_width).step_by(workers) {
        if cancel.is_cancelled() {
            return;
        }
        if channels == 1 {
            resample_column_gray(intermediate, table, out, row_len, dst_width, dst_height, x);
        } else {
            resample_column_color(
                intermediate,
                table,
                out,
                row_len,
                dst_width,
                dst_height,
                channels,
                x,
            );
        }
        progress.tick();
    }
}

#[allow(clippy::too_many_arguments)]
fn resample_column_color(
    intermediate: &[u8],
    table: &WeightTable,
    out: &SharedOut,
    row_len: usize,
    dst_width: usize,
    dst_height: usize,
    channels: usize,
    x: usize,
) {
    let use_fourth = channels > 3;
    let x_at = x * channels;
    for y in 0..dst_height {
        let (picks, weights) = table.row(y);

        let mut sample0 = 0.0f32;
        let mut sample1 = 0.0f32;
        let mut sample2 = 0.0f32;
        let mut sample3 = 0.0f32;
        for (&pick, &weight) in picks.iter().zip(weights) {
            let at = pick * row_len + x_at;
            sample0 += intermediate[at] as f32 * weight;
            sample1 += intermediate[at + 1] as f32 * weight;
            sample2 += intermediate[at + 2] as f32 * weight;
            if use_fourth {
                sample3 += intermediate[at + 3] as f32 * weight;
            }
        }

        let at = (y * dst_width + x) * channels;
        // SAFETY: every offset written here derives from column x, and the
        // modulus partition assigns x to exactly one worker.
        unsafe {
            out.write(at, to_byte(sample0));
            out.write(at + 1, to_byte(sample1));
            out.write(at + 2, to_byte(sample2));
            if use_fourth {
                out.write(at + 3, to_byte(sample3));
            }
        }
    }
}

fn resample_column_gray(
    intermediate: &[u8],
    table: &WeightTable,
    out: &SharedOut,
    row_len: usize,
    dst_width: usize,
    dst_height: usize,
    x: usize,
) {
    for y in 0..dst_height {
        let (picks, weights) = table.row(y);

        let mut sample = 0.0f32;
        for (&pick, &weight) in picks.iter().zip(weights) {
            sample += intermediate[pick * row_len + x] as f32 * weight;
        }

        // SAFETY: the offset derives from column x, owned by this worker.
        unsafe { out.write(y * dst_width + x, to_byte(sample)) }
    }
}
