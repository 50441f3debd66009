use std::path::Path;

use image::{GrayImage, ImageError};
use ndarray::{Array1, ArrayView1};

use crate::{NetErr, Result};

/// Characters from lightest to darkest.
const SHADES: &[u8] = b" .:-=+*#%@";

/// Maps a grayscale pixel to a feature: black becomes `1.0` and white `0.001`.
pub fn normalize_pixel(pixel: u8) -> f32 {
    (255. - pixel as f32) / 255. * 0.999 + 0.001
}

/// Decodes the image at `path` into 8 bit grayscale.
///
/// # Errors
/// `InvalidImage` if it can't be decoded, `Io` if it can't be read.
pub fn read_image<P: AsRef<Path>>(path: P) -> Result<GrayImage> {
    let image = image::open(path).map_err(|e| match e {
        ImageError::IoError(e) => NetErr::Io(e),
        e => NetErr::InvalidImage(e.to_string()),
    })?;

    Ok(image.to_luma8())
}

/// The features of a grayscale image, row by row.
pub fn features_of(image: &GrayImage) -> Array1<f32> {
    image.pixels().map(|p| normalize_pixel(p.0[0])).collect()
}

/// Reads the image at `path` as a feature vector.
///
/// # Errors
/// Same as [`read_image`].
pub fn image_features<P: AsRef<Path>>(path: P) -> Result<Array1<f32>> {
    read_image(path).map(|image| features_of(&image))
}

/// Draws a feature vector as text, `width` characters per line.
pub fn render(features: ArrayView1<f32>, width: usize) -> String {
    if width == 0 {
        return String::new();
    }

    let darkest = (SHADES.len() - 1) as f32;
    let shade = |x: f32| {
        let level = ((x - 0.001) / 0.999).clamp(0., 1.);
        SHADES[(level * darkest).round() as usize] as char
    };

    let pixels: Vec<char> = features.iter().map(|&x| shade(x)).collect();
    pixels
        .chunks(width)
        .map(|line| line.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;
    use ndarray::array;

    #[test]
    fn pixel_extremes() {
        assert!((normalize_pixel(0) - 1.).abs() < 1e-6);
        assert!((normalize_pixel(255) - 0.001).abs() < 1e-6);

        let mid = normalize_pixel(128);
        assert!(mid > 0.001 && mid < 1.);
    }

    #[test]
    fn reads_png_row_major() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("digit.png");

        let mut image = GrayImage::new(3, 2);
        image.put_pixel(0, 0, Luma([0]));
        image.put_pixel(2, 1, Luma([0]));
        for (x, y) in [(1, 0), (2, 0), (0, 1), (1, 1)] {
            image.put_pixel(x, y, Luma([255]));
        }
        image.save(&path).unwrap();

        let features = image_features(&path).unwrap();
        assert_eq!(features.len(), 6);
        assert!((features[0] - 1.).abs() < 1e-6);
        assert!((features[5] - 1.).abs() < 1e-6);
        assert!(features.iter().skip(1).take(4).all(|&x| (x - 0.001).abs() < 1e-6));

        let drawing = render(features.view(), 3);
        assert_eq!(drawing, "@  \n  @");
    }

    #[test]
    fn garbage_is_not_an_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("digit.png");
        std::fs::write(&path, b"definitely not a png").unwrap();

        let res = image_features(&path);
        assert!(matches!(res, Err(NetErr::InvalidImage(_))), "{res:?}");
    }

    #[test]
    fn render_shades() {
        let drawing = render(array![0.001, 1., 0.5, 0.001].view(), 2);
        let lines: Vec<_> = drawing.lines().collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], " @");
        assert!(lines[1].starts_with(|c: char| c != ' ' && c != '@'));
    }
}
