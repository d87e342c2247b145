use crate::prelude::{PipelineError, PipelineResult};
use image::{GrayImage, RgbImage};
use ndarray::{Array2, Array3};
use std::path::Path;

/// Writes a `[row, column]` grid as an 8-bit grayscale PNG.
pub fn write_gray<P: AsRef<Path>>(path: P, pixels: &Array2<u8>) -> PipelineResult<()> {
    let (height, width) = pixels.dim();
    let raw: Vec<u8> = pixels.iter().copied().collect();
    let image = GrayImage::from_raw(width as u32, height as u32, raw)
        .ok_or_else(|| PipelineError::InvalidInput("grayscale buffer size mismatch".into()))?;
    image.save(path.as_ref())?;
    Ok(())
}

/// Writes a `[row, column, channel]` grid as an 8-bit RGB PNG.
pub fn write_rgb<P: AsRef<Path>>(path: P, pixels: &Array3<u8>) -> PipelineResult<()> {
    let (height, width, channels) = pixels.dim();
    if channels != 3 {
        return Err(PipelineError::InvalidInput(format!(
            "expected 3 color channels, got {}",
            channels
        )));
    }
    let raw: Vec<u8> = pixels.iter().copied().collect();
    let image = RgbImage::from_raw(width as u32, height as u32, raw)
        .ok_or_else(|| PipelineError::InvalidInput("rgb buffer size mismatch".into()))?;
    image.save(path.as_ref())?;
    Ok(())
}

/// Creates `dir` if it does not exist yet.
pub fn ensure_dir<P: AsRef<Path>>(dir: P) -> PipelineResult<()> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir).map_err(|source| PipelineError::io(dir, source))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gray_png_keeps_row_major_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gray.png");
        let pixels = Array2::from_shape_fn((2, 3), |(r, c)| (r * 3 + c) as u8 * 10);
        write_gray(&path, &pixels).unwrap();

        let decoded = image::open(&path).unwrap().to_luma8();
        assert_eq!(decoded.dimensions(), (3, 2));
        assert_eq!(decoded.get_pixel(2, 1).0, [50]);
    }

    #[test]
    fn rgb_png_requires_three_channels() {
        let dir = tempfile::tempdir().unwrap();
        let pixels = Array3::<u8>::zeros((2, 2, 4));
        assert!(write_rgb(dir.path().join("bad.png"), &pixels).is_err());
    }
}
