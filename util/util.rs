#![allow(dead_code)]

use std::{
    path::{Path, PathBuf},
    sync::OnceLock,
};

use image::{Rgb, RgbImage};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoroshiro128PlusPlus;

/// Set to a directory of images to benchmark against real photos instead of synthetic images.
pub const BENCH_IMAGES_VAR: &str = "HUEGRADE_BENCH_IMAGES";

pub fn load_images(images: &[PathBuf]) -> Vec<(String, RgbImage)> {
    images
        .iter()
        .map(|path| {
            image::open(path).map(|image| {
                (
                    path.file_name().unwrap().to_owned().into_string().unwrap(),
                    image.into_rgb8(),
                )
            })
        })
        .collect::<Result<_, _>>()
        .expect("loaded each image")
}

pub fn load_image_dir(dir: impl AsRef<Path>) -> Vec<(String, RgbImage)> {
    let mut paths = std::fs::read_dir(dir)
        .expect("read img directory")
        .collect::<Result<Vec<_>, _>>()
        .expect("read each file")
        .iter()
        .map(std::fs::DirEntry::path)
        .collect::<Vec<_>>();

    paths.sort();

    load_images(&paths)
}

/// A fruit-like image: a few noisy color regions on a dark background.
pub fn synthetic_image(width: u32, height: u32, seed: u64) -> RgbImage {
    const REGIONS: [[u8; 3]; 4] = [[30, 24, 20], [170, 52, 31], [184, 154, 41], [119, 23, 35]];

    let mut rng = Xoroshiro128PlusPlus::seed_from_u64(seed);
    RgbImage::from_fn(width, height, |x, y| {
        let region = REGIONS[((x * 4 / width) + (y * 4 / height)) as usize % REGIONS.len()];
        Rgb(region.map(|c| c.saturating_add(rng.gen_range(0..24))))
    })
}

pub fn load_synthetic_images() -> Vec<(String, RgbImage)> {
    [(64, 64), (256, 256), (640, 480), (1920, 1080)]
        .into_iter()
        .enumerate()
        .map(|(i, (width, height))| {
            (format!("{width}x{height}"), synthetic_image(width, height, i as u64))
        })
        .collect()
}

static BENCH_IMAGES: OnceLock<Vec<(String, RgbImage)>> = OnceLock::new();

pub fn bench_images() -> &'static [(String, RgbImage)] {
    BENCH_IMAGES.get_or_init(|| match std::env::var_os(BENCH_IMAGES_VAR) {
        Some(dir) => load_image_dir(dir),
        None => load_synthetic_images(),
    })
}
