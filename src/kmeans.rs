//! Lloyd's k-means clustering over 8-bit color samples.
//!
//! Centroids are seeded from uniformly random samples (with replacement)
//! and then refined for a fixed number of iterations. Each iteration recomputes every centroid
//! as the rounded channel-wise mean of its members and then relabels every sample
//! with its nearest centroid by euclidean distance in raw channel space.
//! No convergence check is performed.
//!
//! The perceptual metric in [`difference`](crate::difference) is deliberately not used here:
//! the assignment step runs for every sample on every iteration and must stay cheap.
//!
//! # Examples
//! ```
//! # use huegrade::{kmeans::{Kmeans, KmeansOptions}, ClusterCount, ColorSlice, Error};
//! # use palette::Srgb;
//! # fn main() -> Result<(), Error> {
//! let pixels = [
//!     Srgb::new(255, 0, 0),
//!     Srgb::new(255, 0, 0),
//!     Srgb::new(0, 0, 255),
//!     Srgb::new(0, 0, 255),
//! ];
//!
//! let options = KmeansOptions::new().k(ClusterCount::try_from(2u16)?).seed(7);
//! let mut kmeans = Kmeans::new(ColorSlice::try_from(pixels.as_slice())?, options)?;
//! kmeans.train(5);
//! assert_eq!(kmeans.colors().len(), 2);
//! # Ok(())
//! # }
//! ```

use crate::{
    difference::squared_euclidean_distance, ClusterCount, ColorComponents, ColorSlice, Error,
};
use palette::cast::{self, AsArrays};
use rand::{prelude::Distribution, SeedableRng};
use rand_distr::Uniform;
use rand_xoshiro::Xoroshiro128PlusPlus;
use wide::{f32x8, CmpLt};

#[cfg(feature = "threads")]
use rayon::prelude::*;

/// What to do with a centroid whose cluster has no members when the centroids are recomputed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmptyClusterPolicy {
    /// Keep the centroid from the previous iteration.
    #[default]
    Retain,
    /// Replace the centroid with a uniformly random sample.
    Reseed,
}

/// A builder struct to specify the parameters for k-means.
///
/// # Examples
/// ```
/// # use huegrade::{kmeans::{EmptyClusterPolicy, KmeansOptions}, ClusterCount};
/// let options = KmeansOptions::new()
///     .k(ClusterCount::DEFAULT)
///     .iterations(20)
///     .seed(42)
///     .empty_cluster(EmptyClusterPolicy::Reseed);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KmeansOptions {
    /// The number of clusters.
    pub(crate) k: ClusterCount,
    /// The number of training iterations.
    pub(crate) iterations: u32,
    /// The seed value for the random number generator.
    pub(crate) seed: u64,
    /// The policy for clusters that lose all of their members.
    pub(crate) empty_cluster: EmptyClusterPolicy,
}

impl Default for KmeansOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl KmeansOptions {
    /// The default number of training iterations.
    pub const DEFAULT_ITERATIONS: u32 = 10;

    /// Creates a new [`KmeansOptions`] with default values.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            k: ClusterCount::DEFAULT,
            iterations: Self::DEFAULT_ITERATIONS,
            seed: 0,
            empty_cluster: EmptyClusterPolicy::Retain,
        }
    }

    /// Sets the number of clusters.
    ///
    /// The default is `3`.
    #[must_use]
    pub const fn k(mut self, k: ClusterCount) -> Self {
        self.k = k;
        self
    }

    /// Sets the number of training iterations.
    ///
    /// Training always runs for exactly this many iterations.
    /// The default is `10`.
    #[must_use]
    pub const fn iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations;
        self
    }

    /// Sets the seed value for the random number generator used to pick the initial centroids.
    ///
    /// The default seed is `0`.
    #[must_use]
    pub const fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the policy for clusters that end up with no members.
    ///
    /// The default is [`EmptyClusterPolicy::Retain`].
    #[must_use]
    pub const fn empty_cluster(mut self, policy: EmptyClusterPolicy) -> Self {
        self.empty_cluster = policy;
        self
    }

    /// Gets the number of clusters.
    #[must_use]
    pub const fn get_k(&self) -> ClusterCount {
        self.k
    }

    /// Gets the number of training iterations.
    #[must_use]
    pub const fn get_iterations(&self) -> u32 {
        self.iterations
    }
}

/// The result of a k-means run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KmeansOutput<Color> {
    /// The final centroids in initialization order.
    pub centroids: Vec<Color>,
    /// The number of samples assigned to each centroid.
    pub counts: Vec<u32>,
    /// The cluster label of each sample, in the same order as the samples.
    pub labels: Vec<u8>,
}

/// Packs the centroids into chunks of 8 for SIMD distance computations.
///
/// Unused lanes of the last chunk are set to infinity so that they are never the nearest centroid.
fn simd_components(centroids: &[[u8; 3]]) -> Vec<[f32x8; 3]> {
    let chunks = centroids.chunks(8);
    let mut components = Vec::with_capacity(chunks.len());
    for chunk in chunks {
        let mut arr = [[f32::INFINITY; 8]; 3];
        for (lane, color) in chunk.iter().enumerate() {
            for (arr, &c) in arr.iter_mut().zip(color) {
                arr[lane] = f32::from(c);
            }
        }
        components.push(arr.map(f32x8::new));
    }
    components
}

/// Returns the index of the centroid nearest to `query`.
///
/// Distances between 8-bit colors are exact in `f32`,
/// so ties resolve to the lowest centroid index like a sequential strict less-than scan.
#[inline]
#[allow(clippy::float_cmp)]
fn simd_argmin(points: &[[f32x8; 3]], query: [u8; 3]) -> u8 {
    let query = query.map(|c| f32x8::splat(f32::from(c)));

    let mut cur_chunk = f32x8::ZERO;
    let mut min_chunk = cur_chunk;
    let mut min_distance = f32x8::splat(f32::INFINITY);

    for chunk in points {
        let mut distance = f32x8::ZERO;
        for c in 0..3 {
            let diff = query[c] - chunk[c];
            distance += diff * diff;
        }

        let mask = distance.cmp_lt(min_distance);
        min_chunk = mask.blend(cur_chunk, min_chunk);
        min_distance = mask.blend(distance, min_distance);
        cur_chunk += f32x8::ONE;
    }

    let mut min_index = u32::MAX;
    let mut min_dist = f32::INFINITY;
    for (lane, (&d, &chunk)) in min_distance
        .as_array_ref()
        .iter()
        .zip(min_chunk.as_array_ref())
        .enumerate()
    {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let index = chunk as u32 * 8 + lane as u32;
        if d < min_dist || (d == min_dist && index < min_index) {
            min_dist = d;
            min_index = index;
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    {
        min_index as u8
    }
}

/// A k-means clusterer over a borrowed sample set.
///
/// One [`Kmeans`] is created per image, trained, and then discarded.
/// It exclusively owns its centroids and labels for its whole lifetime.
#[derive(Debug, Clone)]
pub struct Kmeans<'a, Color>
where
    Color: ColorComponents<u8, 3>,
{
    /// The samples to cluster.
    samples: ColorSlice<'a, Color>,
    /// The current centroids, always exactly `k` of them.
    centroids: Vec<Color>,
    /// The current cluster label of each sample.
    labels: Vec<u8>,
    /// Source of randomness for seeding and reseeding centroids.
    rng: Xoroshiro128PlusPlus,
    /// Uniform distribution over sample indices.
    distribution: Uniform<usize>,
    /// The policy for clusters that lose all of their members.
    empty_cluster: EmptyClusterPolicy,
}

impl<'a, Color> Kmeans<'a, Color>
where
    Color: ColorComponents<u8, 3>,
{
    /// Creates a new [`Kmeans`] by picking `k` random samples as the initial centroids
    /// and assigning every sample to its nearest centroid.
    ///
    /// Duplicate picks are allowed, so some of the initial centroids may be equal.
    ///
    /// # Errors
    /// Returns [`Error::TooManyClusters`] if `k` is greater than the number of samples.
    pub fn new(samples: ColorSlice<'a, Color>, options: KmeansOptions) -> Result<Self, Error> {
        let KmeansOptions { k, seed, empty_cluster, .. } = options;

        if k.as_usize() > samples.len() {
            return Err(Error::TooManyClusters { k: k.into_inner(), samples: samples.len() });
        }

        let mut rng = Xoroshiro128PlusPlus::seed_from_u64(seed);
        let distribution = Uniform::new(0, samples.len());
        let centroids = (0..k.as_usize())
            .map(|_| samples[distribution.sample(&mut rng)])
            .collect();

        tracing::debug!(k = k.into_inner(), samples = samples.len(), seed, "initialized k-means");

        let mut kmeans = Self {
            samples,
            centroids,
            labels: vec![0; samples.len()],
            rng,
            distribution,
            empty_cluster,
        };
        kmeans.assign();
        Ok(kmeans)
    }

    /// The number of clusters.
    #[must_use]
    pub fn k(&self) -> usize {
        self.centroids.len()
    }

    /// The current centroids in initialization order.
    #[must_use]
    pub fn colors(&self) -> &[Color] {
        &self.centroids
    }

    /// The current cluster label of each sample.
    ///
    /// For an image, this is a row-major grid with the same shape as the image.
    #[must_use]
    pub fn labels(&self) -> &[u8] {
        &self.labels
    }

    /// The number of samples currently assigned to each cluster.
    #[must_use]
    pub fn counts(&self) -> Vec<u32> {
        let mut counts = vec![0; self.k()];
        for &label in &self.labels {
            counts[usize::from(label)] += 1;
        }
        counts
    }

    /// The sum of squared euclidean distances between each sample and its assigned centroid.
    #[must_use]
    pub fn inertia(&self) -> u64 {
        let centroids: &[[u8; 3]] = self.centroids.as_arrays();
        let samples: &[[u8; 3]] = self.samples.as_slice().as_arrays();
        samples
            .iter()
            .zip(&self.labels)
            .map(|(&color, &label)| {
                u64::from(squared_euclidean_distance(color, centroids[usize::from(label)]))
            })
            .sum()
    }

    /// Runs exactly `iterations` rounds of centroid recomputation followed by reassignment.
    pub fn train(&mut self, iterations: u32) {
        for _ in 0..iterations {
            self.update_centroids();
            self.assign();
        }
        tracing::debug!(iterations, k = self.k(), "trained k-means");
    }

    /// Reassigns every sample to its nearest centroid, returning the number of samples
    /// whose label changed.
    pub fn assign(&mut self) -> usize {
        let centroids: &[[u8; 3]] = self.centroids.as_arrays();
        let components = simd_components(centroids);
        let samples: &[[u8; 3]] = self.samples.as_slice().as_arrays();

        samples
            .iter()
            .zip(&mut self.labels)
            .map(|(&color, label)| {
                let nearest = simd_argmin(&components, color);
                let changed = *label != nearest;
                *label = nearest;
                usize::from(changed)
            })
            .sum()
    }

    /// Recomputes each centroid as the rounded channel-wise mean of its members.
    fn update_centroids(&mut self) {
        let k = self.k();
        let mut sums = vec![[0u64; 3]; k];
        let mut counts = vec![0u64; k];

        let samples: &[[u8; 3]] = self.samples.as_slice().as_arrays();
        for (color, &label) in samples.iter().zip(&self.labels) {
            let i = usize::from(label);
            for (sum, &c) in sums[i].iter_mut().zip(color) {
                *sum += u64::from(c);
            }
            counts[i] += 1;
        }

        for (i, (sum, count)) in sums.into_iter().zip(counts).enumerate() {
            if count == 0 {
                match self.empty_cluster {
                    EmptyClusterPolicy::Retain => {
                        tracing::warn!(cluster = i, "empty cluster, keeping previous centroid");
                    }
                    EmptyClusterPolicy::Reseed => {
                        tracing::warn!(cluster = i, "empty cluster, reseeding centroid");
                        self.centroids[i] = self.samples[self.distribution.sample(&mut self.rng)];
                    }
                }
            } else {
                // round half up; the mean of 8-bit values always fits back into 8 bits
                #[allow(clippy::cast_possible_truncation)]
                let mean = sum.map(|s| ((s + count / 2) / count) as u8);
                self.centroids[i] = cast::from_array(mean);
            }
        }
    }

    /// Consumes the clusterer, returning its centroids, counts, and labels.
    #[must_use]
    pub fn into_output(self) -> KmeansOutput<Color> {
        let counts = self.counts();
        let Self { centroids, labels, .. } = self;
        KmeansOutput { centroids, counts, labels }
    }
}

#[cfg(feature = "threads")]
impl<'a, Color> Kmeans<'a, Color>
where
    Color: ColorComponents<u8, 3>,
{
    /// The parallel version of [`Kmeans::train`].
    ///
    /// The results are identical to the single-threaded version.
    pub fn train_par(&mut self, iterations: u32) {
        for _ in 0..iterations {
            self.update_centroids();
            self.assign_par();
        }
        tracing::debug!(iterations, k = self.k(), "trained k-means in parallel");
    }

    /// The parallel version of [`Kmeans::assign`].
    pub fn assign_par(&mut self) -> usize {
        let centroids: &[[u8; 3]] = self.centroids.as_arrays();
        let components = simd_components(centroids);
        let samples: &[[u8; 3]] = self.samples.as_slice().as_arrays();

        samples
            .par_iter()
            .zip(&mut self.labels)
            .map(|(&color, label)| {
                let nearest = simd_argmin(&components, color);
                let changed = *label != nearest;
                *label = nearest;
                usize::from(changed)
            })
            .sum()
    }
}
