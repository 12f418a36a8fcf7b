//! Contains the validated input types shared across the crate.

use crate::{Error, MAX_CLUSTERS, MAX_PIXELS};
use std::{fmt::Display, ops::Deref};
#[cfg(feature = "image")]
use {
    image::RgbImage,
    palette::{cast::ComponentsAs, Srgb},
};

/// A simple new type wrapper around `&'a [Color]` with the invariant that the inner slice
/// is not empty and its length is not greater than [`MAX_PIXELS`].
///
/// This is the sample set for clustering: one color per pixel, in row-major order.
///
/// # Examples
/// Use `try_into` to create [`ColorSlice`]s.
///
/// From a raw color slice:
/// ```
/// # use huegrade::{ColorSlice, Error};
/// # use palette::Srgb;
/// # fn main() -> Result<(), Error> {
/// let srgb = vec![Srgb::new(0, 0, 0)];
/// let colors: ColorSlice<_> = srgb.as_slice().try_into()?;
/// # Ok(())
/// # }
/// ```
///
/// From an image (needs the `image` feature to be enabled):
/// ```no_run
/// # use huegrade::ColorSlice;
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let img = image::open("some image")?.into_rgb8();
/// let colors = ColorSlice::try_from(&img)?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, PartialEq, Eq)]
#[repr(transparent)]
pub struct ColorSlice<'a, Color>(&'a [Color]);

impl<'a, Color> Clone for ColorSlice<'a, Color> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, Color> Copy for ColorSlice<'a, Color> {}

impl<'a, Color> ColorSlice<'a, Color> {
    /// Returns the length of the slice as a `u32`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn num_colors(&self) -> u32 {
        self.0.len() as u32
    }

    /// Returns the inner slice.
    #[must_use]
    pub const fn as_slice(&self) -> &'a [Color] {
        self.0
    }
}

impl<'a, Color> AsRef<[Color]> for ColorSlice<'a, Color> {
    fn as_ref(&self) -> &[Color] {
        self
    }
}

impl<'a, Color> Deref for ColorSlice<'a, Color> {
    type Target = [Color];

    fn deref(&self) -> &Self::Target {
        self.0
    }
}

impl<'a, Color> From<ColorSlice<'a, Color>> for &'a [Color] {
    fn from(val: ColorSlice<'a, Color>) -> Self {
        val.0
    }
}

impl<'a, Color> TryFrom<&'a [Color]> for ColorSlice<'a, Color> {
    type Error = Error;

    fn try_from(slice: &'a [Color]) -> Result<Self, Self::Error> {
        if slice.is_empty() {
            Err(Error::EmptyInput)
        } else if slice.len() > MAX_PIXELS as usize {
            Err(Error::TooManySamples(slice.len()))
        } else {
            Ok(Self(slice))
        }
    }
}

#[cfg(feature = "image")]
impl<'a> TryFrom<&'a RgbImage> for ColorSlice<'a, Srgb<u8>> {
    type Error = Error;

    fn try_from(image: &'a RgbImage) -> Result<Self, Self::Error> {
        let pixels = image.pixels().len();
        let buf = &image.as_raw()[..(pixels * 3)];
        let colors: &[Srgb<u8>] = buf.components_as();
        colors.try_into()
    }
}

/// The number of clusters (`K`) to partition the samples into.
///
/// This is a simple new type wrapper around `u16` with the invariant that it must be
/// in the range `1..=MAX_CLUSTERS`, so that every cluster label fits in a `u8`.
///
/// # Examples
/// ```
/// # use huegrade::{ClusterCount, Error};
/// # fn main() -> Result<(), Error> {
/// let k = ClusterCount::try_from(3u16)?;
/// assert_eq!(k.into_inner(), 3);
/// assert!(ClusterCount::try_from(0u16).is_err());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct ClusterCount(u16);

impl ClusterCount {
    /// The largest supported number of clusters.
    pub const MAX: Self = Self(MAX_CLUSTERS);

    /// The number of clusters used by the batch classifier unless told otherwise.
    pub const DEFAULT: Self = Self(3);

    /// Creates a new [`ClusterCount`], returning `None` if `k` is `0` or above [`MAX_CLUSTERS`].
    #[must_use]
    pub const fn new(k: u16) -> Option<Self> {
        if k == 0 || k > MAX_CLUSTERS {
            None
        } else {
            Some(Self(k))
        }
    }

    /// Gets the inner `u16` value.
    #[must_use]
    pub const fn into_inner(self) -> u16 {
        self.0
    }

    /// The number of clusters as a `usize` for indexing and `Vec` lengths.
    #[must_use]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl Default for ClusterCount {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<ClusterCount> for u16 {
    fn from(val: ClusterCount) -> Self {
        val.into_inner()
    }
}

impl TryFrom<u16> for ClusterCount {
    type Error = Error;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(Error::InvalidClusterCount(value.into()))
    }
}

impl TryFrom<usize> for ClusterCount {
    type Error = Error;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        u16::try_from(value)
            .ok()
            .and_then(Self::new)
            .ok_or(Error::InvalidClusterCount(value))
    }
}

impl Display for ClusterCount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.into_inner())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use palette::Srgb;

    #[test]
    fn empty_slice_is_rejected() {
        let empty: &[Srgb<u8>] = &[];
        assert_eq!(ColorSlice::try_from(empty), Err(Error::EmptyInput));
    }

    #[test]
    fn cluster_count_bounds() {
        assert_eq!(ClusterCount::new(0), None);
        assert_eq!(ClusterCount::new(MAX_CLUSTERS + 1), None);
        assert_eq!(ClusterCount::new(MAX_CLUSTERS), Some(ClusterCount::MAX));
        assert_eq!(
            ClusterCount::try_from(100_000usize),
            Err(Error::InvalidClusterCount(100_000))
        );
    }

    #[test]
    #[cfg(feature = "image")]
    fn empty_image_is_rejected() {
        let image = RgbImage::new(0, 0);
        assert_eq!(ColorSlice::try_from(&image), Err(Error::EmptyInput));

        let image = RgbImage::new(3, 0);
        assert_eq!(ColorSlice::try_from(&image), Err(Error::EmptyInput));
    }

    #[test]
    #[cfg(feature = "image")]
    fn image_pixels_are_row_major() {
        let mut img = RgbImage::new(2, 2);
        img.put_pixel(1, 0, image::Rgb([1, 2, 3]));
        img.put_pixel(0, 1, image::Rgb([4, 5, 6]));

        let colors = ColorSlice::try_from(&img).unwrap();
        assert_eq!(colors.len(), 4);
        assert_eq!(colors[1], Srgb::new(1, 2, 3));
        assert_eq!(colors[2], Srgb::new(4, 5, 6));
    }
}
