//! Grades the dominant color of an image against a [`ReferencePalette`].

use crate::{
    difference::perceptual_distance,
    kmeans::{Kmeans, KmeansOptions},
    ColorSlice, Error, ReferencePalette,
};
use ordered_float::OrderedFloat;
use palette::Srgb;
use std::cmp::Reverse;

#[cfg(feature = "image")]
use image::RgbImage;

/// Which palette entry counts as the match for a color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchPolicy {
    /// The entry with the smallest perceptual distance.
    #[default]
    Closest,
    /// The entry with the largest perceptual distance.
    Farthest,
    /// Largest distance, with the running maximum truncated to a whole number.
    ///
    /// Entries are scanned in palette order against a maximum that starts at `0`.
    /// An entry wins whenever its distance exceeds the truncated maximum,
    /// so among entries whose distances share the same integer part the later one is picked.
    /// If no distance exceeds `0`, the first entry is returned.
    ///
    /// Combined with [`ReferencePalette::legacy`], this reproduces previously recorded ripeness grades.
    Legacy,
}

impl MatchPolicy {
    /// Whether `candidate` is a strictly better distance than `current` under this policy.
    fn prefers(self, candidate: f64, current: f64) -> bool {
        match self {
            MatchPolicy::Closest => candidate < current,
            MatchPolicy::Farthest | MatchPolicy::Legacy => candidate > current,
        }
    }
}

/// Which cluster centroid is taken as the dominant color of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DominantColor {
    /// The first centroid in initialization order, regardless of its population.
    #[default]
    FirstCluster,
    /// The centroid with the most assigned pixels (ties go to the lower cluster index).
    MostPopulous,
}

impl DominantColor {
    /// Returns the index of the dominant cluster given the population of each cluster.
    #[must_use]
    pub fn select(self, counts: &[u32]) -> usize {
        match self {
            DominantColor::FirstCluster => 0,
            DominantColor::MostPopulous => {
                let mut best = 0;
                for (i, &count) in counts.iter().enumerate() {
                    if count > counts[best] {
                        best = i;
                    }
                }
                best
            }
        }
    }
}

/// A palette entry matched against a color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaletteMatch<'a> {
    /// The index of the entry in the palette.
    pub index: usize,
    /// The label of the entry.
    pub label: &'a str,
    /// The perceptual distance between the entry's color and the matched color.
    pub distance: f64,
}

/// The result of classifying one image.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification<'a> {
    /// The palette entry selected for the dominant color.
    pub matched: PaletteMatch<'a>,
    /// The dominant color that was graded.
    pub color: Srgb<u8>,
    /// The index of the dominant cluster.
    pub cluster: usize,
    /// All cluster centroids in initialization order.
    pub centroids: Vec<Srgb<u8>>,
    /// The number of pixels assigned to each centroid.
    pub counts: Vec<u32>,
}

impl<'a> Classification<'a> {
    /// The label of the matched palette entry.
    #[must_use]
    pub fn label(&self) -> &'a str {
        self.matched.label
    }
}

/// A builder struct that clusters an image and grades its dominant color against a palette.
///
/// # Examples
/// ```
/// # use huegrade::{Classifier, ColorSlice, Error, KmeansOptions, MatchPolicy, ReferencePalette};
/// # use palette::Srgb;
/// # fn main() -> Result<(), Error> {
/// let palette = ReferencePalette::new([
///     ("red", Srgb::new(255, 0, 0)),
///     ("blue", Srgb::new(0, 0, 255)),
/// ])?;
///
/// let pixels = vec![Srgb::new(250, 5, 5); 16];
/// let classification = Classifier::new(&palette)
///     .kmeans(KmeansOptions::new().seed(1))
///     .match_policy(MatchPolicy::Closest)
///     .classify(ColorSlice::try_from(pixels.as_slice())?)?;
///
/// assert_eq!(classification.label(), "red");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Classifier<'a> {
    /// The palette to grade against.
    palette: &'a ReferencePalette,
    /// The k-means parameters.
    kmeans: KmeansOptions,
    /// How to pick the matching palette entry.
    match_policy: MatchPolicy,
    /// How to pick the dominant cluster.
    dominant: DominantColor,
}

impl<'a> Classifier<'a> {
    /// Creates a new [`Classifier`] with default settings for the given palette.
    #[must_use]
    pub fn new(palette: &'a ReferencePalette) -> Self {
        Self {
            palette,
            kmeans: KmeansOptions::new(),
            match_policy: MatchPolicy::default(),
            dominant: DominantColor::default(),
        }
    }

    /// Sets the k-means parameters.
    #[must_use]
    pub fn kmeans(mut self, options: KmeansOptions) -> Self {
        self.kmeans = options;
        self
    }

    /// Sets the palette matching policy.
    ///
    /// The default is [`MatchPolicy::Closest`].
    #[must_use]
    pub fn match_policy(mut self, policy: MatchPolicy) -> Self {
        self.match_policy = policy;
        self
    }

    /// Sets how the dominant cluster is chosen.
    ///
    /// The default is [`DominantColor::FirstCluster`].
    #[must_use]
    pub fn dominant(mut self, dominant: DominantColor) -> Self {
        self.dominant = dominant;
        self
    }

    /// The palette this classifier grades against.
    #[must_use]
    pub fn palette(&self) -> &'a ReferencePalette {
        self.palette
    }

    /// Compares `color` against the palette entry at `index`.
    fn compare(
        &self,
        index: usize,
        label: &'a str,
        reference: Srgb<u8>,
        color: Srgb<u8>,
    ) -> PaletteMatch<'a> {
        let distance = perceptual_distance(reference, color);
        tracing::trace!(label, distance, "compared against reference color");
        PaletteMatch { index, label, distance }
    }

    /// Finds the palette entry matching `color` under the configured policy.
    ///
    /// When several entries are equally good, the first one in palette order wins,
    /// except under [`MatchPolicy::Legacy`] which has its own tie behavior.
    #[must_use]
    pub fn match_color(&self, color: Srgb<u8>) -> PaletteMatch<'a> {
        let (label, reference) = self.palette.first();
        let first = self.compare(0, label, reference, color);
        let rest = self
            .palette
            .iter()
            .enumerate()
            .skip(1)
            .map(|(index, (label, reference))| self.compare(index, label, reference, color));

        match self.match_policy {
            MatchPolicy::Closest | MatchPolicy::Farthest => rest.fold(first, |best, candidate| {
                if self.match_policy.prefers(candidate.distance, best.distance) {
                    candidate
                } else {
                    best
                }
            }),
            MatchPolicy::Legacy => {
                let mut best = first;
                let mut biggest = 0.0;
                for candidate in std::iter::once(first).chain(rest) {
                    if candidate.distance > biggest {
                        biggest = candidate.distance.trunc();
                        best = candidate;
                    }
                }
                best
            }
        }
    }

    /// Returns every palette entry ordered from best to worst match for `color`.
    ///
    /// The sort is stable, so equally good entries keep their palette order.
    /// Under [`MatchPolicy::Legacy`] the selected entry comes first,
    /// followed by the others from farthest to closest.
    #[must_use]
    pub fn rank(&self, color: Srgb<u8>) -> Vec<PaletteMatch<'a>> {
        let mut matches = self
            .palette
            .iter()
            .enumerate()
            .map(|(index, (label, reference))| PaletteMatch {
                index,
                label,
                distance: perceptual_distance(reference, color),
            })
            .collect::<Vec<_>>();

        match self.match_policy {
            MatchPolicy::Closest => matches.sort_by_key(|m| OrderedFloat(m.distance)),
            MatchPolicy::Farthest => matches.sort_by_key(|m| Reverse(OrderedFloat(m.distance))),
            MatchPolicy::Legacy => {
                let selected = self.match_color(color).index;
                matches.sort_by_key(|m| (m.index != selected, Reverse(OrderedFloat(m.distance))));
            }
        }

        matches
    }

    /// Grades a trained clustering.
    fn grade(&self, centroids: Vec<Srgb<u8>>, counts: Vec<u32>) -> Classification<'a> {
        let cluster = self.dominant.select(&counts);
        let color = centroids[cluster];
        let matched = self.match_color(color);

        tracing::debug!(
            cluster,
            color = ?color.into_components(),
            label = matched.label,
            distance = matched.distance,
            "classified dominant color"
        );

        Classification { matched, color, cluster, centroids, counts }
    }

    /// Clusters the given pixels and grades the dominant color.
    ///
    /// # Errors
    /// Returns [`Error::TooManyClusters`] if there are fewer pixels than clusters.
    pub fn classify(&self, colors: ColorSlice<Srgb<u8>>) -> Result<Classification<'a>, Error> {
        let mut kmeans = Kmeans::new(colors, self.kmeans)?;
        kmeans.train(self.kmeans.iterations);
        let output = kmeans.into_output();
        Ok(self.grade(output.centroids, output.counts))
    }

    /// Clusters the pixels of an image and grades the dominant color.
    ///
    /// # Errors
    /// Returns [`Error::EmptyInput`] for an image with no pixels,
    /// or any error from [`Classifier::classify`].
    #[cfg(feature = "image")]
    pub fn classify_rgbimage(&self, image: &RgbImage) -> Result<Classification<'a>, Error> {
        self.classify(image.try_into()?)
    }
}

#[cfg(feature = "threads")]
impl<'a> Classifier<'a> {
    /// The parallel version of [`Classifier::classify`].
    ///
    /// # Errors
    /// See [`Classifier::classify`].
    pub fn classify_par(&self, colors: ColorSlice<Srgb<u8>>) -> Result<Classification<'a>, Error> {
        let mut kmeans = Kmeans::new(colors, self.kmeans)?;
        kmeans.train_par(self.kmeans.iterations);
        let output = kmeans.into_output();
        Ok(self.grade(output.centroids, output.counts))
    }

    /// The parallel version of [`Classifier::classify_rgbimage`].
    ///
    /// # Errors
    /// See [`Classifier::classify_rgbimage`].
    #[cfg(feature = "image")]
    pub fn classify_rgbimage_par(&self, image: &RgbImage) -> Result<Classification<'a>, Error> {
        self.classify_par(image.try_into()?)
    }
}
