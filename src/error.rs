//! The error type returned by fallible operations in this crate.

use crate::{MAX_CLUSTERS, MAX_PIXELS};

/// Everything that can go wrong while building inputs for, or running, a classification.
///
/// All variants are input validation failures: clustering and distance evaluation
/// are pure computations and have no transient failure modes.
/// Callers processing a batch of images typically log the error and move on to the next image.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The sample set (image) contains no pixels.
    #[error("the sample set is empty")]
    EmptyInput,
    /// The sample set has more pixels than [`MAX_PIXELS`].
    #[error("{0} samples is above the maximum of {max}", max = MAX_PIXELS)]
    TooManySamples(usize),
    /// The requested number of clusters is zero or above [`MAX_CLUSTERS`].
    #[error("the number of clusters must be in 1..={max}, got {0}", max = MAX_CLUSTERS)]
    InvalidClusterCount(usize),
    /// More clusters were requested than there are samples to seed them from.
    #[error("cannot form {k} clusters from {samples} samples")]
    TooManyClusters {
        /// The requested number of clusters.
        k: u16,
        /// The number of available samples.
        samples: usize,
    },
    /// A color channel given as a wider integer does not fit in `0..=255`.
    #[error("channel value {value} of `{label}` is outside of 0..=255")]
    ChannelOutOfRange {
        /// The palette label or input name that carried the value.
        label: String,
        /// The offending channel value.
        value: i64,
    },
    /// A reference palette must have at least one entry.
    #[error("the reference palette is empty")]
    EmptyPalette,
    /// Each reference palette label must be unique.
    #[error("duplicate reference palette label `{0}`")]
    DuplicateLabel(String),
    /// The palette description could not be parsed.
    #[error("invalid palette description: {0}")]
    PaletteFormat(String),
}
