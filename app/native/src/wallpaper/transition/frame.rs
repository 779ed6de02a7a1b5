//! CPU rendering of transition frames.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView, ImageReader, Rgba, RgbaImage};
use thiserror::Error;

use super::easing::lerp;
use crate::wallpaper::TransitionEffect;

/// JPEG quality used for saved frames.
const FRAME_QUALITY: u8 = 95;

/// Maximum extra scale applied by the zoom effect.
const ZOOM_FACTOR: f64 = 0.2;

/// Largest pixel block used by the pixelate effect.
const MAX_PIXEL_BLOCK: f64 = 32.0;

/// Errors that can occur while rendering a transition frame.
#[derive(Debug, Error)]
pub enum TransitionError {
    /// An image file could not be opened.
    #[error("Failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// An image could not be decoded.
    #[error("Failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    /// The rendered frame could not be written.
    #[error("Failed to save frame to {path}: {source}")]
    Save {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Loads an image, sniffing the format from its contents.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or decoded.
pub fn load_image(path: &Path) -> Result<DynamicImage, TransitionError> {
    ImageReader::open(path)
        .and_then(ImageReader::with_guessed_format)
        .map_err(|source| TransitionError::Open { path: path.to_path_buf(), source })?
        .decode()
        .map_err(|source| TransitionError::Decode { path: path.to_path_buf(), source })
}

/// Loads a pair of images with `next` resized to the size of `current`.
///
/// # Errors
///
/// Returns an error if either image cannot be loaded.
pub fn load_pair(current: &Path, next: &Path) -> Result<(DynamicImage, DynamicImage), TransitionError> {
    let current = load_image(current)?;
    let next = load_image(next)?;
    let (width, height) = current.dimensions();
    let next = if next.dimensions() == (width, height) {
        next
    } else {
        next.resize_exact(width, height, FilterType::Lanczos3)
    };
    Ok((current, next))
}

/// Composes one frame of `effect` at `progress`.
///
/// `next` must already have the dimensions of `current`. The frame keeps the
/// colour mode of `current`: it carries an alpha channel only if `current`
/// does. `progress` is used as-is and clamped to `[0, 1]`.
#[must_use]
pub fn compose_frame(
    current: &DynamicImage,
    next: &DynamicImage,
    progress: f64,
    effect: TransitionEffect,
) -> DynamicImage {
    let progress = if progress.is_nan() { 0.0 } else { progress.clamp(0.0, 1.0) };
    let from = current.to_rgba8();
    let to = next.to_rgba8();

    let frame = match effect {
        TransitionEffect::Fade | TransitionEffect::Swirl => blend(&from, &to, progress),
        TransitionEffect::Slide => slide(&from, &to, progress),
        TransitionEffect::Zoom => zoom(&from, &to, progress),
        TransitionEffect::Wipe => wipe(&from, &to, progress),
        TransitionEffect::Pixelate => pixelate(&blend(&from, &to, progress), progress),
    };

    if current.color().has_alpha() {
        DynamicImage::ImageRgba8(frame)
    } else {
        DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(frame).to_rgb8())
    }
}

/// Renders a single transition frame from two image files.
///
/// The second image is resized to match the first before blending.
///
/// # Errors
///
/// Returns an error if either image cannot be opened or decoded.
pub fn render_transition_frame(
    current_path: &Path,
    next_path: &Path,
    progress: f64,
    effect: TransitionEffect,
) -> Result<DynamicImage, TransitionError> {
    let (current, next) = load_pair(current_path, next_path)?;
    Ok(compose_frame(&current, &next, progress, effect))
}

/// Renders a transition frame and saves it to `output`.
///
/// # Errors
///
/// Returns an error if either image cannot be loaded or the frame cannot be saved.
pub fn create_transition_image(
    current_path: &Path,
    next_path: &Path,
    progress: f64,
    output: &Path,
    effect: TransitionEffect,
) -> Result<(), TransitionError> {
    let frame = render_transition_frame(current_path, next_path, progress, effect)?;
    save_frame(&frame, output)
}

/// Saves a frame, as JPEG (quality 95) for `.jpg`/`.jpeg` and by extension otherwise.
///
/// # Errors
///
/// Returns an error if the frame cannot be encoded or written.
pub fn save_frame(frame: &DynamicImage, output: &Path) -> Result<(), TransitionError> {
    let save_error = |source| TransitionError::Save { path: output.to_path_buf(), source };
    let is_jpeg = output
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| matches!(ext.to_lowercase().as_str(), "jpg" | "jpeg"));

    if !is_jpeg {
        return frame.save(output).map_err(save_error);
    }

    let file = File::create(output).map_err(|err| save_error(err.into()))?;
    let mut writer = BufWriter::new(file);
    let encoder = JpegEncoder::new_with_quality(&mut writer, FRAME_QUALITY);
    frame.to_rgb8().write_with_encoder(encoder).map_err(save_error)?;
    writer.flush().map_err(|err| save_error(err.into()))
}

// ============================================================================
// Effects
// ============================================================================

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn mix(a: u8, b: u8, t: f64) -> u8 { lerp(f64::from(a), f64::from(b), t).round().clamp(0.0, 255.0) as u8 }

fn blend(from: &RgbaImage, to: &RgbaImage, t: f64) -> RgbaImage {
    RgbaImage::from_fn(from.width(), from.height(), |x, y| {
        let a = from.get_pixel(x, y).0;
        let b = to.get_pixel(x, y).0;
        Rgba([mix(a[0], b[0], t), mix(a[1], b[1], t), mix(a[2], b[2], t), mix(a[3], b[3], t)])
    })
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn offset(extent: u32, t: f64) -> u32 { (f64::from(extent) * t) as u32 }

fn slide(from: &RgbaImage, to: &RgbaImage, t: f64) -> RgbaImage {
    let width = from.width();
    let shift = i64::from(offset(width, t));
    let mut canvas = RgbaImage::new(width, from.height());
    imageops::replace(&mut canvas, from, -shift, 0);
    imageops::replace(&mut canvas, to, i64::from(width) - shift, 0);
    canvas
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn zoom(from: &RgbaImage, to: &RgbaImage, t: f64) -> RgbaImage {
    let (width, height) = from.dimensions();
    let scale = ZOOM_FACTOR.mul_add(t, 1.0);
    let scaled_width = (f64::from(width) * scale) as u32;
    let scaled_height = (f64::from(height) * scale) as u32;
    if (scaled_width, scaled_height) == (width, height) {
        return blend(from, to, t);
    }

    let scaled = imageops::resize(from, scaled_width, scaled_height, FilterType::Lanczos3);
    let left = (scaled_width - width) / 2;
    let top = (scaled_height - height) / 2;
    let cropped = imageops::crop_imm(&scaled, left, top, width, height).to_image();
    blend(&cropped, to, t)
}

fn wipe(from: &RgbaImage, to: &RgbaImage, t: f64) -> RgbaImage {
    let edge = offset(from.width(), t);
    RgbaImage::from_fn(from.width(), from.height(), |x, y| {
        if x < edge { *to.get_pixel(x, y) } else { *from.get_pixel(x, y) }
    })
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn pixelate(image: &RgbaImage, t: f64) -> RgbaImage {
    // Coarsest at the midpoint, sharp at both ends.
    let peak = 1.0 - 2.0f64.mul_add(t, -1.0).abs();
    let block = (MAX_PIXEL_BLOCK - 1.0).mul_add(peak, 1.0).round().max(1.0) as u32;
    if block <= 1 {
        return image.clone();
    }

    let (width, height) = image.dimensions();
    let small = imageops::resize(
        image,
        width.div_ceil(block).max(1),
        height.div_ceil(block).max(1),
        FilterType::Nearest,
    );
    imageops::resize(&small, width, height, FilterType::Nearest)
}

#[cfg(test)]
mod tests {
    use image::{Rgb, RgbImage};

    use super::*;

    fn solid(width: u32, height: u32, color: [u8; 3]) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(color)))
    }

    fn half_split(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, _| {
            if x < width / 2 { Rgb([255, 0, 0]) } else { Rgb([0, 0, 255]) }
        }))
    }

    fn pixel(image: &DynamicImage, x: u32, y: u32) -> [u8; 3] { image.to_rgb8().get_pixel(x, y).0 }

    #[test]
    fn test_fade_blends_linearly() {
        let black = solid(8, 8, [0, 0, 0]);
        let white = solid(8, 8, [200, 200, 200]);

        assert_eq!(pixel(&compose_frame(&black, &white, 0.0, TransitionEffect::Fade), 0, 0), [0, 0, 0]);
        assert_eq!(pixel(&compose_frame(&black, &white, 0.5, TransitionEffect::Fade), 3, 3), [100, 100, 100]);
        assert_eq!(
            pixel(&compose_frame(&black, &white, 1.0, TransitionEffect::Fade), 7, 7),
            [200, 200, 200]
        );
    }

    #[test]
    fn test_frame_keeps_colour_mode_of_first_image() {
        let rgb = solid(4, 4, [10, 10, 10]);
        let frame = compose_frame(&rgb, &rgb, 0.5, TransitionEffect::Fade);
        assert!(!frame.color().has_alpha());

        let rgba = DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 4, Rgba([1, 2, 3, 255])));
        let frame = compose_frame(&rgba, &rgb, 0.5, TransitionEffect::Fade);
        assert!(frame.color().has_alpha());
    }

    #[test]
    fn test_slide_offsets_both_images() {
        let red = solid(10, 2, [255, 0, 0]);
        let blue = solid(10, 2, [0, 0, 255]);

        let frame = compose_frame(&red, &blue, 0.3, TransitionEffect::Slide);
        assert_eq!(pixel(&frame, 0, 0), [255, 0, 0]);
        assert_eq!(pixel(&frame, 6, 0), [255, 0, 0]);
        assert_eq!(pixel(&frame, 7, 0), [0, 0, 255]);
        assert_eq!(pixel(&frame, 9, 1), [0, 0, 255]);
    }

    #[test]
    fn test_slide_endpoints() {
        let red = solid(10, 2, [255, 0, 0]);
        let blue = solid(10, 2, [0, 0, 255]);
        assert_eq!(pixel(&compose_frame(&red, &blue, 0.0, TransitionEffect::Slide), 9, 0), [255, 0, 0]);
        assert_eq!(pixel(&compose_frame(&red, &blue, 1.0, TransitionEffect::Slide), 0, 0), [0, 0, 255]);
    }

    #[test]
    fn test_zoom_at_start_is_current_image() {
        let split = half_split(20, 10);
        let blue = solid(20, 10, [0, 0, 255]);
        let frame = compose_frame(&split, &blue, 0.0, TransitionEffect::Zoom);
        assert_eq!(frame.dimensions(), (20, 10));
        assert_eq!(pixel(&frame, 0, 5), [255, 0, 0]);
    }

    #[test]
    fn test_zoom_at_end_is_next_image() {
        let split = half_split(20, 10);
        let green = solid(20, 10, [0, 255, 0]);
        let frame = compose_frame(&split, &green, 1.0, TransitionEffect::Zoom);
        assert_eq!(pixel(&frame, 10, 5), [0, 255, 0]);
    }

    #[test]
    fn test_wipe_reveals_from_left() {
        let red = solid(10, 2, [255, 0, 0]);
        let blue = solid(10, 2, [0, 0, 255]);
        let frame = compose_frame(&red, &blue, 0.5, TransitionEffect::Wipe);
        assert_eq!(pixel(&frame, 4, 0), [0, 0, 255]);
        assert_eq!(pixel(&frame, 5, 0), [255, 0, 0]);
    }

    #[test]
    fn test_pixelate_is_sharp_at_endpoints() {
        let split = half_split(64, 8);
        let frame = compose_frame(&split, &split, 1.0, TransitionEffect::Pixelate);
        assert_eq!(frame.to_rgb8(), split.to_rgb8());
    }

    #[test]
    fn test_swirl_renders_as_fade() {
        let black = solid(4, 4, [0, 0, 0]);
        let white = solid(4, 4, [250, 250, 250]);
        let swirl = compose_frame(&black, &white, 0.4, TransitionEffect::Swirl);
        let fade = compose_frame(&black, &white, 0.4, TransitionEffect::Fade);
        assert_eq!(swirl, fade);
    }

    #[test]
    fn test_render_frame_resizes_second_image() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("a.png");
        let second = dir.path().join("b.png");
        RgbImage::from_pixel(40, 20, Rgb([0, 0, 0])).save(&first).unwrap();
        RgbImage::from_pixel(10, 10, Rgb([255, 255, 255])).save(&second).unwrap();

        let frame = render_transition_frame(&first, &second, 1.0, TransitionEffect::Fade).unwrap();
        assert_eq!(frame.dimensions(), (40, 20));
        assert!(pixel(&frame, 39, 19).iter().all(|&channel| channel >= 250));
    }

    #[test]
    fn test_render_frame_with_missing_image_fails() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("a.png");
        RgbImage::from_pixel(4, 4, Rgb([0, 0, 0])).save(&first).unwrap();

        let result = render_transition_frame(
            &first,
            &dir.path().join("missing.png"),
            0.5,
            TransitionEffect::Fade,
        );
        assert!(matches!(result, Err(TransitionError::Open { .. })));
    }

    #[test]
    fn test_render_frame_with_corrupt_image_fails() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("a.png");
        let broken = dir.path().join("b.png");
        RgbImage::from_pixel(4, 4, Rgb([0, 0, 0])).save(&first).unwrap();
        std::fs::write(&broken, b"not an image").unwrap();

        let result = render_transition_frame(&first, &broken, 0.5, TransitionEffect::Fade);
        assert!(matches!(result, Err(TransitionError::Decode { .. })));
    }

    #[test]
    fn test_create_transition_image_writes_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("a.png");
        let second = dir.path().join("b.png");
        let output = dir.path().join("frame.jpg");
        RgbImage::from_pixel(16, 16, Rgb([0, 0, 0])).save(&first).unwrap();
        RgbImage::from_pixel(16, 16, Rgb([255, 255, 255])).save(&second).unwrap();

        create_transition_image(&first, &second, 0.5, &output, TransitionEffect::Slide).unwrap();
        let reader = ImageReader::open(&output).unwrap().with_guessed_format().unwrap();
        assert_eq!(reader.format(), Some(image::ImageFormat::Jpeg));
    }

    #[test]
    fn test_create_transition_image_writes_png_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("a.png");
        let output = dir.path().join("frame.png");
        RgbImage::from_pixel(8, 8, Rgb([9, 9, 9])).save(&first).unwrap();

        create_transition_image(&first, &first, 0.2, &output, TransitionEffect::Zoom).unwrap();
        assert_eq!(image::open(&output).unwrap().dimensions(), (8, 8));
    }
}
