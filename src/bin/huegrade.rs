//! Grades the dominant color of every image in a file or directory and writes `path,label` rows to a CSV file.

#![deny(unsafe_code, unsafe_op_in_unsafe_fn)]
#![warn(
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::todo,
    clippy::unimplemented,
    clippy::unwrap_used,
    clippy::unneeded_field_pattern,
    clippy::rest_pat_in_fully_bound_structs,
    clippy::unnecessary_self_imports,
    clippy::str_to_string,
    clippy::string_to_string,
    clippy::string_slice
)]

use std::{
    borrow::Cow,
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use anyhow::{bail, Context};
use clap::{Parser, ValueEnum};
use huegrade::{
    Classifier, ClusterCount, DominantColor, KmeansOptions, MatchPolicy, ReferencePalette,
};
use rayon::prelude::*;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Copy, Clone, ValueEnum)]
enum CliPolicy {
    /// Pick the palette entry with the smallest perceptual difference.
    Closest,
    /// Pick the palette entry with the largest perceptual difference.
    Farthest,
    /// Reproduce previously recorded grades (uses the legacy palette unless --palette is given).
    Legacy,
}

impl From<CliPolicy> for MatchPolicy {
    fn from(value: CliPolicy) -> Self {
        match value {
            CliPolicy::Closest => MatchPolicy::Closest,
            CliPolicy::Farthest => MatchPolicy::Farthest,
            CliPolicy::Legacy => MatchPolicy::Legacy,
        }
    }
}

#[derive(Copy, Clone, ValueEnum)]
enum CliDominant {
    /// The first cluster in initialization order.
    First,
    /// The cluster with the most pixels.
    Populous,
}

impl From<CliDominant> for DominantColor {
    fn from(value: CliDominant) -> Self {
        match value {
            CliDominant::First => DominantColor::FirstCluster,
            CliDominant::Populous => DominantColor::MostPopulous,
        }
    }
}

/// Grade the dominant color of images against a reference palette.
#[derive(Parser)]
#[command(name = "huegrade", version, about)]
struct Options {
    /// An image file or a directory of images
    input: PathBuf,

    /// The CSV file to write `path,label` rows to
    #[arg(short, long, default_value = "data.csv")]
    output: PathBuf,

    /// Number of k-means clusters
    #[arg(short, long, default_value_t = ClusterCount::DEFAULT, value_parser = parse_cluster_count)]
    k: ClusterCount,

    /// Number of k-means iterations
    #[arg(long, default_value_t = KmeansOptions::DEFAULT_ITERATIONS)]
    iterations: u32,

    /// Seed for centroid initialization (random if omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// A JSON palette file (defaults to the built-in ripeness palette)
    #[arg(long)]
    palette: Option<PathBuf>,

    /// How to pick the matching palette entry
    #[arg(long, value_enum, default_value_t = CliPolicy::Closest)]
    policy: CliPolicy,

    /// How to pick the dominant cluster
    #[arg(long, value_enum, default_value_t = CliDominant::First)]
    dominant: CliDominant,

    /// Log per-image details
    #[arg(long)]
    verbose: bool,
}

fn parse_cluster_count(s: &str) -> Result<ClusterCount, String> {
    let value: u16 = s.parse().map_err(|e| format!("{e}"))?;
    value.try_into().map_err(|e| format!("{e}"))
}

fn main() -> anyhow::Result<()> {
    let Options {
        input,
        output,
        k,
        iterations,
        seed,
        palette,
        policy,
        dominant,
        verbose,
    } = Options::parse();

    let default_filter = if verbose { "huegrade=debug" } else { "huegrade=warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();

    let palette = select_palette(palette.as_deref(), policy)?;

    let seed = seed.unwrap_or_else(rand::random);
    tracing::info!(seed, "using k-means seed");

    let classifier = Classifier::new(&palette)
        .kmeans(KmeansOptions::new().k(k).iterations(iterations).seed(seed))
        .match_policy(policy.into())
        .dominant(dominant.into());

    let paths = discover(&input)?;
    tracing::debug!(images = paths.len(), input = %input.display(), "discovered images");

    let results = paths
        .par_iter()
        .map(|path| grade_file(&classifier, path))
        .collect::<Vec<_>>();

    let mut rows = Vec::with_capacity(paths.len());
    for (path, result) in paths.iter().zip(results) {
        match result {
            Ok(label) => rows.push((path.as_path(), label)),
            Err(e) => tracing::warn!(path = %path.display(), "skipping image: {e:#}"),
        }
    }

    let file = File::create(&output)
        .with_context(|| format!("failed to create {}", output.display()))?;
    let mut writer = BufWriter::new(file);
    write_csv(&mut writer, &rows)
        .and_then(|()| writer.flush())
        .with_context(|| format!("failed to write {}", output.display()))?;

    tracing::info!(
        graded = rows.len(),
        skipped = paths.len() - rows.len(),
        output = %output.display(),
        "finished grading"
    );

    Ok(())
}

fn load_palette(path: &Path) -> anyhow::Result<ReferencePalette> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read palette {}", path.display()))?;
    ReferencePalette::from_json(&json)
        .with_context(|| format!("invalid palette {}", path.display()))
}

fn select_palette(path: Option<&Path>, policy: CliPolicy) -> anyhow::Result<ReferencePalette> {
    Ok(match (path, policy) {
        (Some(path), _) => load_palette(path)?,
        (None, CliPolicy::Legacy) => ReferencePalette::legacy(),
        (None, _) => ReferencePalette::default(),
    })
}

/// A file yields itself, a directory yields its files sorted by path.
fn discover(input: &Path) -> anyhow::Result<Vec<PathBuf>> {
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }
    if !input.is_dir() {
        bail!("{} is neither a file nor a directory", input.display());
    }

    let mut paths = std::fs::read_dir(input)
        .with_context(|| format!("failed to read directory {}", input.display()))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("failed to read directory {}", input.display()))?;

    paths.retain(|path| path.is_file());
    paths.sort();
    Ok(paths)
}

fn grade_file(classifier: &Classifier, path: &Path) -> anyhow::Result<String> {
    let image = image::open(path)
        .with_context(|| format!("failed to decode {}", path.display()))?
        .into_rgb8();

    let classification = classifier.classify_rgbimage(&image)?;
    Ok(classification.label().to_owned())
}

/// Quotes a CSV field if it contains a separator, a quote or a line break, doubling inner quotes.
fn csv_field(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

fn write_csv(writer: &mut impl Write, rows: &[(&Path, String)]) -> std::io::Result<()> {
    for (path, label) in rows {
        let path = path.display().to_string();
        writeln!(writer, "{},{}", csv_field(&path), csv_field(label))?;
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use image::RgbImage;
    use palette::Srgb;

    fn solid_image(dir: &Path, name: &str, rgb: [u8; 3]) -> PathBuf {
        let path = dir.join(name);
        RgbImage::from_pixel(4, 4, image::Rgb(rgb)).save(&path).unwrap();
        path
    }

    #[test]
    fn cli_definition() {
        use clap::CommandFactory;
        Options::command().debug_assert();
    }

    #[test]
    fn parses_defaults() {
        let options = Options::try_parse_from(["huegrade", "images"]).unwrap();
        assert_eq!(options.output, PathBuf::from("data.csv"));
        assert_eq!(options.k, ClusterCount::DEFAULT);
        assert_eq!(options.iterations, KmeansOptions::DEFAULT_ITERATIONS);
        assert_eq!(options.seed, None);
        assert!(matches!(options.policy, CliPolicy::Closest));
        assert!(matches!(options.dominant, CliDominant::First));
    }

    #[test]
    fn rejects_invalid_cluster_count() {
        assert!(Options::try_parse_from(["huegrade", "images", "-k", "0"]).is_err());
        assert!(Options::try_parse_from(["huegrade", "images", "-k", "257"]).is_err());
        assert!(Options::try_parse_from(["huegrade", "images", "-k", "256"]).is_ok());
    }

    #[test]
    fn discover_sorts_directory() {
        let dir = tempfile::tempdir().unwrap();
        let b = solid_image(dir.path(), "b.png", [0, 0, 0]);
        let a = solid_image(dir.path(), "a.png", [0, 0, 0]);
        std::fs::create_dir(dir.path().join("nested")).unwrap();

        assert_eq!(discover(dir.path()).unwrap(), [a.clone(), b]);
        assert_eq!(discover(&a).unwrap(), [a]);
        assert!(discover(&dir.path().join("missing")).is_err());
    }

    #[test]
    fn grades_and_skips() {
        let dir = tempfile::tempdir().unwrap();
        let red = solid_image(dir.path(), "red.png", [255, 0, 0]);
        let junk = dir.path().join("junk.png");
        std::fs::write(&junk, b"not an image").unwrap();

        let palette = ReferencePalette::new([
            ("red", Srgb::new(255, 0, 0)),
            ("blue", Srgb::new(0, 0, 255)),
        ])
        .unwrap();
        let classifier = Classifier::new(&palette);

        assert_eq!(grade_file(&classifier, &red).unwrap(), "red");
        assert!(grade_file(&classifier, &junk).is_err());
    }

    #[test]
    fn csv_rows() {
        let rows = [
            (Path::new("img/a.jpg"), "3".to_owned()),
            (Path::new("img/b.jpg"), "10".to_owned()),
        ];
        let mut buf = Vec::new();
        write_csv(&mut buf, &rows).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "img/a.jpg,3\nimg/b.jpg,10\n");
    }

    #[test]
    fn csv_quotes_special_characters() {
        let rows = [
            (Path::new("img/a,b.jpg"), "3".to_owned()),
            (Path::new("img/say \"hi\".jpg"), "1".to_owned()),
            (Path::new("img/two\nlines.jpg"), "10".to_owned()),
        ];
        let mut buf = Vec::new();
        write_csv(&mut buf, &rows).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "\"img/a,b.jpg\",3\n\"img/say \"\"hi\"\".jpg\",1\n\"img/two\nlines.jpg\",10\n"
        );
    }

    #[test]
    fn legacy_policy_uses_legacy_palette() {
        assert_eq!(select_palette(None, CliPolicy::Legacy).unwrap(), ReferencePalette::legacy());
        assert_eq!(select_palette(None, CliPolicy::Closest).unwrap(), ReferencePalette::default());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("palette.json");
        std::fs::write(&path, r#"[{ "label": "green", "color": [0, 255, 0] }]"#).unwrap();
        let palette = select_palette(Some(&path), CliPolicy::Legacy).unwrap();
        assert_eq!(palette.get(0), Some(("green", Srgb::new(0, 255, 0))));

        let options = Options::try_parse_from(["huegrade", "images", "--policy", "legacy"]).unwrap();
        assert!(matches!(options.policy, CliPolicy::Legacy));
    }

    #[test]
    fn loads_palette_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("palette.json");
        std::fs::write(&path, r#"[{ "label": "green", "color": [0, 255, 0] }]"#).unwrap();
        let palette = load_palette(&path).unwrap();
        assert_eq!(palette.len(), 1);

        std::fs::write(&path, r#"[{ "label": "green", "color": [0, 300, 0] }]"#).unwrap();
        assert!(load_palette(&path).is_err());
    }
}
