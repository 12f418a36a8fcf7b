//! A library for grading the dominant color of an image against a named reference palette.
//!
//! Classification happens in two steps:
//! 1. The pixels of the image are clustered with k-means (see the [`kmeans`] module).
//!    Training uses plain euclidean distance in sRGB channel space, since it runs over every pixel
//!    on every iteration.
//! 2. One of the resulting centroids is taken as the dominant color and compared against each entry of a
//!    [`ReferencePalette`] with the CIEDE2000 perceptual color difference (see the [`difference`] module).
//!
//! # Features
//! - `threads`: exposes parallel versions of the k-means assignment step via [`rayon`].
//! - `image`: enables integration with the [`image`] crate.
//! - `cli`: builds the `huegrade` command line tool for grading whole directories of images.
//!
//! # Example
//! ```no_run
//! # use huegrade::{Classifier, DominantColor, KmeansOptions, MatchPolicy, ReferencePalette};
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let palette = ReferencePalette::default();
//! let img = image::open("some image")?.into_rgb8();
//!
//! let classification = Classifier::new(&palette)
//!     .kmeans(KmeansOptions::new().iterations(10).seed(42))
//!     .match_policy(MatchPolicy::Closest)
//!     .dominant(DominantColor::MostPopulous)
//!     .classify_rgbimage(&img)?;
//!
//! println!("{}", classification.label());
//! # Ok(())
//! # }
//! ```
//!
//! Note that some of the functions above require certain features to be enabled.

#![deny(unsafe_code, unsafe_op_in_unsafe_fn)]
#![warn(
    clippy::pedantic,
    clippy::cargo,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::todo,
    clippy::unimplemented,
    clippy::unwrap_used,
    clippy::unwrap_in_result,
    clippy::expect_used,
    clippy::unneeded_field_pattern,
    clippy::rest_pat_in_fully_bound_structs,
    clippy::unnecessary_self_imports,
    clippy::str_to_string,
    clippy::string_to_string,
    clippy::string_slice,
    missing_docs,
    clippy::missing_docs_in_private_items,
    rustdoc::all,
    clippy::float_cmp_const,
    clippy::lossy_float_literal
)]
#![allow(
    clippy::doc_markdown,
    clippy::module_name_repetitions,
    clippy::many_single_char_names,
    clippy::missing_panics_doc,
    clippy::unreadable_literal,
    clippy::wildcard_imports
)]

mod classify;
mod error;
mod reference;
mod traits;
mod types;

pub mod difference;
pub mod kmeans;

pub use classify::*;
pub use error::Error;
pub use kmeans::{EmptyClusterPolicy, KmeansOptions};
pub use reference::*;
pub use traits::*;
pub use types::*;

/// The maximum supported image size in number of pixels is `u32::MAX`.
pub const MAX_PIXELS: u32 = u32::MAX;

/// The maximum supported number of clusters is `256`, so that each cluster label fits in a `u8`.
pub const MAX_CLUSTERS: u16 = u8::MAX as u16 + 1;

#[cfg(test)]
pub(crate) mod tests {
    use palette::Srgb;
    use rand::{Rng, SeedableRng};
    use rand_xoshiro::Xoroshiro128PlusPlus;

    fn test_data(len: usize, seed: u64) -> Vec<Srgb<u8>> {
        let mut rng = Xoroshiro128PlusPlus::seed_from_u64(seed);
        (0..len).map(|_| Srgb::from(rng.gen::<[u8; 3]>())).collect()
    }

    pub fn test_data_256() -> Vec<Srgb<u8>> {
        test_data(256, 42)
    }

    pub fn test_data_1024() -> Vec<Srgb<u8>> {
        test_data(1024, 1024)
    }

    /// `per_blob` colors scattered by up to `spread` around each center, grouped by center.
    pub fn blobs_data(centers: &[[u8; 3]], per_blob: usize, spread: u8) -> Vec<Srgb<u8>> {
        let mut rng = Xoroshiro128PlusPlus::seed_from_u64(u64::from(spread));
        let spread = i16::from(spread);
        centers
            .iter()
            .flat_map(|center| {
                (0..per_blob)
                    .map(|_| {
                        center.map(|c| {
                            let offset = rng.gen_range(-spread..=spread);
                            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                            {
                                (i16::from(c) + offset).clamp(0, 255) as u8
                            }
                        })
                    })
                    .collect::<Vec<_>>()
            })
            .map(Srgb::from)
            .collect()
    }
}
