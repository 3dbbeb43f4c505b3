//! Per-axis contribution tables: which source samples feed each destination
//! sample, and with what normalized weights.

use super::filter::ResampleFilter;
use super::ResampleError;

/// Precomputed contributions for one axis of a resample.
///
/// For destination sample `p`, the used taps live in the flattened
/// `pick_pixels` / `weights` arrays at `[p * num_contributors, p *
/// num_contributors + contributions[p])`. Whenever a row has any nonzero raw
/// weight, its stored weights sum to 1.0; this is what preserves average
/// luminance across the resample.
#[derive(Debug, Clone)]
pub struct WeightTable {
    num_contributors: usize,
    contributions: Vec<usize>,
    pick_pixels: Vec<usize>,
    weights: Vec<f32>,
}

impl WeightTable {
    /// Build the contribution table for one axis.
    ///
    /// Downsampling stretches the filter support by the inverse scale and
    /// renormalizes the sample offsets against the ceiling of the stretched
    /// support; without the ceil-based correction the discrete sampling of
    /// the continuous kernel at non-integer strides produces box artifacts.
    pub fn build(
        filter: &dyn ResampleFilter,
        src_size: usize,
        dst_size: usize,
    ) -> Result<Self, ResampleError> {
        if src_size == 0 || dst_size == 0 {
            return Err(ResampleError::InvalidArgument(format!(
                "cannot sample a {src_size} sample axis to {dst_size} samples"
            )));
        }

        let scale = dst_size as f32 / src_size as f32;
        let raw_radius = filter.sampling_radius();

        let (filter_size, normalization, excess_contributors) = if scale < 1.0 {
            let stretched = raw_radius / scale;
            (stretched, raw_radius / stretched.ceil(), 2)
        } else {
            (raw_radius, 1.0, 1)
        };

        let num_contributors = (filter_size * 2.0) as usize + excess_contributors;
        let mut contributions = vec![0usize; dst_size];
        let mut pick_pixels = vec![0usize; dst_size * num_contributors];
        let mut weights = vec![0.0f32; dst_size * num_contributors];

        let last_src = src_size as i64 - 1;
        for p in 0..dst_size {
            let base = p * num_contributors;
            let center = (p as f32 + 0.5) / scale - 0.5;
            let first = (center - filter_size).floor() as i64;
            let last = (center + filter_size + 1.0).floor() as i64;

            let mut total = 0.0f32;
            let mut used = 0usize;
            for s in first..=last {
                let weight = filter.apply((center - s as f32) * normalization);
                if weight == 0.0 {
                    continue;
                }
                if used == num_contributors {
                    // Filters with closed support at the radius can land one
                    // tap past the headroom; drop it rather than spill into
                    // the next row.
                    break;
                }
                // Mirror reflection without repeating the edge sample: -1
                // maps to 1, src_size maps to src_size - 2. The clamp is a
                // backstop for radii larger than the axis itself.
                let reflected = if s < 0 {
                    -s
                } else if s > last_src {
                    2 * last_src - s
                } else {
                    s
                };
                let pick = reflected.clamp(0, last_src) as usize;

                pick_pixels[base + used] = pick;
                weights[base + used] = weight;
                total += weight;
                used += 1;
            }
            contributions[p] = used;

            if total != 0.0 {
                for weight in &mut weights[base..base + used] {
                    *weight /= total;
                }
            }
        }

        Ok(Self {
            num_contributors,
            contributions,
            pick_pixels,
            weights,
        })
    }

    /// Upper bound on taps per destination sample.
    pub fn num_contributors(&self) -> usize {
        self.num_contributors
    }

    /// Number of destination samples covered by this table.
    pub fn len(&self) -> usize {
        self.contributions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contributions.is_empty()
    }

    /// The used taps of destination sample `p`: parallel slices of source
    /// indices and normalized weights.
    #[inline]
    pub fn row(&self, p: usize) -> (&[usize], &[f32]) {
        let base = p * self.num_contributors;
        let used = self.contributions[p];
        (
            &self.pick_pixels[base..base + used],
            &self.weights[base..base + used],
        )
    }
}
