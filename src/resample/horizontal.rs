//! Horizontal pass: resample every source row to destination width.
//!
//! Source rows are striped across workers by modulus, so each worker owns a
//! disjoint set of intermediate rows and no synchronization is needed on the
//! hot path.

use std::thread;

use crate::raster::PixelAccessor;

use super::progress::ProgressTracker;
use super::weights::WeightTable;
use super::{join_workers, to_byte, CancelToken, ResampleError};

pub(crate) fn run(
    src: &dyn PixelAccessor,
    table: &WeightTable,
    intermediate: &mut [u8],
    row_len: usize,
    workers: usize,
    progress: &ProgressTracker,
    cancel: &CancelToken,
) -> Result<(), ResampleError> {
    let mut stripes: Vec<Vec<(usize, &mut [u8])>> = (0..workers).map(|_| Vec::new()).collect();
    for (y, row) in intermediate.chunks_mut(row_len).enumerate() {
        stripes[y % workers].push((y, row));
    }

    thread::scope(|scope| {
        let handles: Vec<_> = stripes
            .into_iter()
            .map(|rows| scope.spawn(move || resample_rows(src, table, rows, progress, cancel)))
            .collect();
        join_workers(handles)
    })
}

/// One worker's share of the pass. The scanline buffer is reused across rows
/// so the hot loop performs no allocation.
fn resample_rows(
    src: &dyn PixelAccessor,
    table: &WeightTable,
    rows: Vec<(usize, &mut [u8])>,
    progress: &ProgressTracker,
    cancel: &CancelToken,
) {
    let channels = src.channels();
    let mut scanline = vec![0u8; src.width() * channels];
    for (y, out_row) in rows {
        if cancel.is_cancelled() {
            return;
        }
        src.read_row(y, &mut scanline);
        if channels == 1 {
            resample_row_gray(&scanline, table, out_row);
        } else {
            resample_row_color(&scanline, channels, table, out_row);
        }
        progress.tick();
    }
}

fn resample_row_color(scanline: &[u8], channels: usize, table: &WeightTable, out: &mut [u8]) {
    let use_fourth = channels > 3;
    for i in 0..table.len() {
        let (picks, weights) = table.row(i);

        let mut sample0 = 0.0f32;
        let mut sample1 = 0.0f32;
        let mut sample2 = 0.0f32;
        let mut sample3 = 0.0f32;
        for (&pick, &weight) in picks.iter().zip(weights) {
            let at = pick * channels;
            sample0 += scanline[at] as f32 * weight;
            sample1 += scanline[at + 1] as f32 * weight;
            sample2 += scanline[at + 2] as f32 * weight;
            if use_fourth {
                sample3 += scanline[at + 3] as f32 * weight;
            }
        }

        let at = i * channels;
        out[at] = to_byte(sample0);
        out[at + 1] = to_byte(sample1);
        out[at + 2] = to_byte(sample2);
        if use_fourth {
            out[at + 3] = to_byte(sample3);
        }
    }
}

fn resample_row_gray(scanline: &[u8], table: &WeightTable, out: &mut [u8]) {
    for i in 0..table.len() {
        let (picks, weights) = table.row(i);

        let mut sample = 0.0f32;
        for (&pick, &weight) in picks.iter().zip(weights) {
            sample += scanline[pick] as f32 * weight;
        }
        out[i] = to_byte(sample);
    }
}
