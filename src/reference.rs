//! The named reference palette that dominant colors are graded against.

use crate::Error;
use palette::Srgb;
use serde::Deserialize;
use std::collections::HashSet;

/// An ordered, non-empty list of labeled reference colors with unique labels.
///
/// The palette is built once and then shared read-only by every classification.
/// Its order matters: when two entries are equally good matches, the earlier one wins.
///
/// # Examples
/// ```
/// # use huegrade::{Error, ReferencePalette};
/// # use palette::Srgb;
/// # fn main() -> Result<(), Error> {
/// let palette = ReferencePalette::new([
///     ("red", Srgb::new(255, 0, 0)),
///     ("blue", Srgb::new(0, 0, 255)),
/// ])?;
/// assert_eq!(palette.len(), 2);
///
/// let palette = ReferencePalette::from_json(r#"[{ "label": "red", "color": [255, 0, 0] }]"#)?;
/// assert_eq!(palette.get(0), Some(("red", Srgb::new(255, 0, 0))));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferencePalette {
    /// The labeled colors in palette order.
    entries: Vec<(String, Srgb<u8>)>,
}

/// One palette entry as written in a JSON palette description.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct JsonEntry {
    /// The label reported for images matching this color.
    label: String,
    /// The red, green, and blue channels.
    color: [i64; 3],
}

impl ReferencePalette {
    /// Creates a new [`ReferencePalette`] from labeled colors, keeping their order.
    ///
    /// # Errors
    /// Returns [`Error::EmptyPalette`] if there are no entries
    /// or [`Error::DuplicateLabel`] if a label appears more than once.
    pub fn new<Label: Into<String>>(
        entries: impl IntoIterator<Item = (Label, Srgb<u8>)>,
    ) -> Result<Self, Error> {
        let entries: Vec<_> = entries
            .into_iter()
            .map(|(label, color)| (label.into(), color))
            .collect();

        if entries.is_empty() {
            return Err(Error::EmptyPalette);
        }

        let mut seen = HashSet::with_capacity(entries.len());
        for (label, _) in &entries {
            if !seen.insert(label.as_str()) {
                return Err(Error::DuplicateLabel(label.clone()));
            }
        }

        Ok(Self { entries })
    }

    /// Parses a palette from a JSON array of `{ "label": ..., "color": [r, g, b] }` objects.
    ///
    /// # Errors
    /// Returns [`Error::PaletteFormat`] if the JSON is malformed,
    /// [`Error::ChannelOutOfRange`] if any channel is outside of `0..=255`,
    /// or any of the errors from [`ReferencePalette::new`].
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let entries: Vec<JsonEntry> =
            serde_json::from_str(json).map_err(|e| Error::PaletteFormat(e.to_string()))?;

        let entries = entries
            .into_iter()
            .map(|JsonEntry { label, color }| {
                let color = checked_color(&label, color)?;
                Ok((label, color))
            })
            .collect::<Result<Vec<_>, Error>>()?;

        Self::new(entries)
    }

    /// The number of entries in the palette. This is never zero.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always `false`, since palettes cannot be empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the label and color of the entry at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<(&str, Srgb<u8>)> {
        self.entries
            .get(index)
            .map(|(label, color)| (label.as_str(), *color))
    }

    /// The first entry, which always exists.
    pub(crate) fn first(&self) -> (&str, Srgb<u8>) {
        let (label, color) = &self.entries[0];
        (label.as_str(), *color)
    }

    /// The ripeness palette with the red and blue channels of every entry swapped.
    ///
    /// Previously recorded grades were computed against these colors,
    /// because the triples of [`ReferencePalette::default`] were stored in blue, green, red order.
    /// Use together with [`MatchPolicy::Legacy`](crate::MatchPolicy::Legacy) to reproduce those grades.
    #[must_use]
    pub fn legacy() -> Self {
        let mut palette = Self::default();
        for (_, color) in &mut palette.entries {
            *color = Srgb::new(color.blue, color.green, color.red);
        }
        palette
    }

    /// Iterates over the labels and colors in palette order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&str, Srgb<u8>)> + '_ {
        self.entries
            .iter()
            .map(|(label, color)| (label.as_str(), *color))
    }
}

/// The ten-step ripeness palette, from `1` (yellow-green) to `10` (deep red).
///
/// Entries are in lexicographic label order, so `"10"` comes right after `"1"`.
impl Default for ReferencePalette {
    fn default() -> Self {
        let entries = [
            ("1", Srgb::new(162, 152, 52)),
            ("10", Srgb::new(119, 23, 35)),
            ("2", Srgb::new(184, 154, 41)),
            ("3", Srgb::new(164, 116, 40)),
            ("4", Srgb::new(163, 78, 31)),
            ("5", Srgb::new(170, 52, 31)),
            ("6", Srgb::new(178, 53, 31)),
            ("7", Srgb::new(200, 25, 34)),
            ("8", Srgb::new(163, 23, 30)),
            ("9", Srgb::new(101, 16, 18)),
        ];

        Self {
            entries: entries
                .into_iter()
                .map(|(label, color)| (label.to_owned(), color))
                .collect(),
        }
    }
}

/// Converts wide integer channels into an 8-bit color, rejecting out of range values.
///
/// # Errors
/// Returns [`Error::ChannelOutOfRange`] naming `label` and the first offending channel.
pub fn checked_color(label: &str, channels: [i64; 3]) -> Result<Srgb<u8>, Error> {
    let mut rgb = [0; 3];
    for (c, value) in rgb.iter_mut().zip(channels) {
        *c = u8::try_from(value).map_err(|_| Error::ChannelOutOfRange {
            label: label.to_owned(),
            value,
        })?;
    }
    Ok(Srgb::from(rgb))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_palette_order() {
        let palette = ReferencePalette::default();
        let labels = palette.iter().map(|(label, _)| label).collect::<Vec<_>>();
        assert_eq!(labels, ["1", "10", "2", "3", "4", "5", "6", "7", "8", "9"]);

        let mut sorted = labels.clone();
        sorted.sort_unstable();
        assert_eq!(labels, sorted);
    }

    #[test]
    fn legacy_palette_swaps_red_and_blue() {
        let default = ReferencePalette::default();
        let legacy = ReferencePalette::legacy();
        assert_eq!(legacy.len(), default.len());
        assert_eq!(legacy.get(1), Some(("10", Srgb::new(35, 23, 119))));
        for ((label, color), (legacy_label, legacy_color)) in default.iter().zip(legacy.iter()) {
            assert_eq!(label, legacy_label);
            assert_eq!(legacy_color, Srgb::new(color.blue, color.green, color.red));
        }
    }

    #[test]
    fn empty_palette() {
        let entries: [(&str, Srgb<u8>); 0] = [];
        assert_eq!(ReferencePalette::new(entries), Err(Error::EmptyPalette));
        assert_eq!(ReferencePalette::from_json("[]"), Err(Error::EmptyPalette));
    }

    #[test]
    fn duplicate_label() {
        let result = ReferencePalette::new([
            ("a", Srgb::new(0, 0, 0)),
            ("b", Srgb::new(1, 1, 1)),
            ("a", Srgb::new(2, 2, 2)),
        ]);
        assert_eq!(result, Err(Error::DuplicateLabel("a".to_owned())));
    }

    #[test]
    fn json_keeps_order() {
        let json = r#"[
            { "label": "z", "color": [1, 2, 3] },
            { "label": "a", "color": [4, 5, 6] }
        ]"#;
        let palette = ReferencePalette::from_json(json).unwrap();
        assert_eq!(palette.get(0), Some(("z", Srgb::new(1, 2, 3))));
        assert_eq!(palette.get(1), Some(("a", Srgb::new(4, 5, 6))));
        assert_eq!(palette.get(2), None);
    }

    #[test]
    fn json_channel_out_of_range() {
        let json = r#"[{ "label": "hot", "color": [256, 0, 0] }]"#;
        assert_eq!(
            ReferencePalette::from_json(json),
            Err(Error::ChannelOutOfRange { label: "hot".to_owned(), value: 256 })
        );

        let json = r#"[{ "label": "cold", "color": [0, -1, 0] }]"#;
        assert_eq!(
            ReferencePalette::from_json(json),
            Err(Error::ChannelOutOfRange { label: "cold".to_owned(), value: -1 })
        );
    }

    #[test]
    fn json_malformed() {
        assert!(matches!(
            ReferencePalette::from_json(r#"[{ "label": "x", "color": [1, 2] }]"#),
            Err(Error::PaletteFormat(_))
        ));
        assert!(matches!(
            ReferencePalette::from_json(r#"{ "x": [1, 2, 3] }"#),
            Err(Error::PaletteFormat(_))
        ));
    }
}
