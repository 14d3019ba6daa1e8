//! Image normalisation for slides and team portraits.
//!
//! Slides are brought to a 1200x600 (2:1) banner with one of four crop modes, portraits are center
//! cropped to a square and scaled to 400x400. Geometry is kept in small pure functions so it can be
//! checked without decoding real files.

use anyhow::Ok as AnyOk;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat, Rgb, RgbImage};
use log::{debug, info};
use poem_openapi::Object;
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::path::Path;

pub const SLIDE_TARGET_WIDTH: u32 = 1200;
pub const SLIDE_TARGET_HEIGHT: u32 = 600;
pub const SLIDE_ASPECT_RATIO: f64 = 2.0;
pub const SLIDE_JPEG_QUALITY: u8 = 95;

pub const PORTRAIT_SIZE: u32 = 400;
pub const PORTRAIT_JPEG_QUALITY: u8 = 90;

// Ratio difference under which an image is only resized.
const RATIO_TOLERANCE: f64 = 0.1;
// One side has to exceed the other by this factor to count as portrait or landscape.
const ORIENTATION_FACTOR: f64 = 1.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Portrait,
    Landscape,
    Square,
    Unknown,
}

impl Orientation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Orientation::Portrait => "portrait",
            Orientation::Landscape => "landscape",
            Orientation::Square => "square",
            Orientation::Unknown => "unknown",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "portrait" => Orientation::Portrait,
            "landscape" => Orientation::Landscape,
            "square" => Orientation::Square,
            _ => Orientation::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CropMode {
    Smart,
    Crop,
    Fit,
    Fill,
}

impl CropMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CropMode::Smart => "smart",
            CropMode::Crop => "crop",
            CropMode::Fit => "fit",
            CropMode::Fill => "fill",
        }
    }

    /// Unknown modes fall back to `smart`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "crop" => CropMode::Crop,
            "fit" => CropMode::Fit,
            "fill" => CropMode::Fill,
            _ => CropMode::Smart,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Object)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Object)]
pub struct CropBox {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Object)]
pub struct Padding {
    pub x: u32,
    pub y: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Object)]
pub struct ProcessOutcome {
    /// One of `resized`, `cropped_and_resized` or `fitted_with_padding`.
    pub action: String,
    pub original_size: Dimensions,
    pub new_size: Dimensions,
    pub crop_area: Option<CropBox>,
    pub padding: Option<Padding>,
    /// Orientation of the image before processing.
    pub orientation: String,
    pub crop_mode: String,
}

pub fn detect_orientation(width: u32, height: u32) -> Orientation {
    if width == 0 || height == 0 {
        return Orientation::Unknown;
    }

    let (w, h) = (width as f64, height as f64);
    if h > w * ORIENTATION_FACTOR {
        Orientation::Portrait
    } else if w > h * ORIENTATION_FACTOR {
        Orientation::Landscape
    } else {
        Orientation::Square
    }
}

/// Center crop that brings the image to `ratio`, or None when it is already close enough.
pub fn ratio_crop_box(width: u32, height: u32, ratio: f64) -> Option<CropBox> {
    let current = width as f64 / height as f64;
    if (current - ratio).abs() < RATIO_TOLERANCE {
        return None;
    }

    if current > ratio {
        let new_width = ((height as f64 * ratio) as u32).max(1).min(width);
        Some(CropBox {
            left: (width - new_width) / 2,
            top: 0,
            width: new_width,
            height,
        })
    } else {
        let new_height = ((width as f64 / ratio) as u32).max(1).min(height);
        Some(CropBox {
            left: 0,
            top: (height - new_height) / 2,
            width,
            height: new_height,
        })
    }
}

/// Scaled size and offsets for letterboxing into the target box.
pub fn fit_layout(width: u32, height: u32, target: Dimensions) -> (Dimensions, Padding) {
    let scale = f64::min(
        target.width as f64 / width as f64,
        target.height as f64 / height as f64,
    );
    let scaled = Dimensions {
        width: ((width as f64 * scale) as u32).clamp(1, target.width),
        height: ((height as f64 * scale) as u32).clamp(1, target.height),
    };
    let padding = Padding {
        x: (target.width - scaled.width) / 2,
        y: (target.height - scaled.height) / 2,
    };

    (scaled, padding)
}

pub fn square_crop_box(width: u32, height: u32) -> CropBox {
    let side = width.min(height);
    CropBox {
        left: (width - side) / 2,
        top: (height - side) / 2,
        width: side,
        height: side,
    }
}

/// Output format for a stored path. PNG stays PNG, everything else is written as JPEG.
pub fn output_format(path: &str) -> ImageFormat {
    if path.to_lowercase().ends_with(".png") {
        ImageFormat::Png
    } else {
        ImageFormat::Jpeg
    }
}

/// Extension used when storing a processed upload with the given original extension (with dot).
pub fn output_extension(ext: &str) -> &'static str {
    match ext.to_lowercase().as_str() {
        ".png" => "png",
        _ => "jpg",
    }
}

/// Drop alpha by compositing over white.
pub fn flatten_on_white(img: &DynamicImage) -> RgbImage {
    if !img.color().has_alpha() {
        return img.to_rgb8();
    }

    let rgba = img.to_rgba8();
    let mut out = RgbImage::new(rgba.width(), rgba.height());
    for (x, y, px) in rgba.enumerate_pixels() {
        let alpha = px[3] as u32;
        let blend = |c: u8| ((c as u32 * alpha + 255 * (255 - alpha)) / 255) as u8;
        out.put_pixel(x, y, Rgb([blend(px[0]), blend(px[1]), blend(px[2])]));
    }
    out
}

fn resize_exact(img: &RgbImage, width: u32, height: u32) -> RgbImage {
    image::imageops::resize(img, width, height, FilterType::Lanczos3)
}

fn crop(img: &RgbImage, area: CropBox) -> RgbImage {
    image::imageops::crop_imm(img, area.left, area.top, area.width, area.height).to_image()
}

fn crop_to_ratio_and_resize(img: &RgbImage, target: Dimensions) -> (RgbImage, Option<CropBox>) {
    match ratio_crop_box(img.width(), img.height(), SLIDE_ASPECT_RATIO) {
        Some(area) => (
            resize_exact(&crop(img, area), target.width, target.height),
            Some(area),
        ),
        None => (resize_exact(img, target.width, target.height), None),
    }
}

/// Bring a decoded image to the slide banner size.
pub fn transform_slide(img: &DynamicImage, mode: CropMode) -> (RgbImage, ProcessOutcome) {
    let (width, height) = img.dimensions();
    let orientation = detect_orientation(width, height);
    let target = Dimensions {
        width: SLIDE_TARGET_WIDTH,
        height: SLIDE_TARGET_HEIGHT,
    };
    let rgb = flatten_on_white(img);

    let (output, crop_area, padding) = match mode {
        CropMode::Fit => {
            let (scaled, padding) = fit_layout(width, height, target);
            let resized = resize_exact(&rgb, scaled.width, scaled.height);
            let mut canvas = RgbImage::from_pixel(target.width, target.height, Rgb([255, 255, 255]));
            image::imageops::overlay(&mut canvas, &resized, padding.x as i64, padding.y as i64);
            (canvas, None, Some(padding))
        }
        CropMode::Smart if orientation != Orientation::Portrait => {
            (resize_exact(&rgb, target.width, target.height), None, None)
        }
        _ => {
            let (output, crop_area) = crop_to_ratio_and_resize(&rgb, target);
            (output, crop_area, None)
        }
    };

    let action = if padding.is_some() {
        "fitted_with_padding"
    } else if crop_area.is_some() {
        "cropped_and_resized"
    } else {
        "resized"
    };

    let outcome = ProcessOutcome {
        action: action.to_string(),
        original_size: Dimensions { width, height },
        new_size: Dimensions {
            width: output.width(),
            height: output.height(),
        },
        crop_area,
        padding,
        orientation: orientation.as_str().to_string(),
        crop_mode: mode.as_str().to_string(),
    };

    (output, outcome)
}

/// Square crop then scale to the portrait size.
pub fn transform_portrait(img: &DynamicImage) -> (RgbImage, ProcessOutcome) {
    let (width, height) = img.dimensions();
    let area = square_crop_box(width, height);
    let rgb = flatten_on_white(img);
    let output = resize_exact(&crop(&rgb, area), PORTRAIT_SIZE, PORTRAIT_SIZE);

    let outcome = ProcessOutcome {
        action: if width == height {
            "resized".to_string()
        } else {
            "cropped_and_resized".to_string()
        },
        original_size: Dimensions { width, height },
        new_size: Dimensions {
            width: PORTRAIT_SIZE,
            height: PORTRAIT_SIZE,
        },
        crop_area: if width == height { None } else { Some(area) },
        padding: None,
        orientation: detect_orientation(width, height).as_str().to_string(),
        crop_mode: "square".to_string(),
    };

    (output, outcome)
}

pub fn encode(img: &RgbImage, format: ImageFormat, quality: u8) -> Result<Vec<u8>, anyhow::Error> {
    let mut buf: Vec<u8> = Vec::new();
    match format {
        ImageFormat::Png => {
            DynamicImage::ImageRgb8(img.clone()).write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?
        }
        _ => JpegEncoder::new_with_quality(&mut buf, quality).encode_image(img)?,
    }

    AnyOk(buf)
}

/// Decode a stored file by its content. Stored names carry the output extension, so a GIF or
/// WebP upload may sit under `.jpg` until it is processed.
pub fn decode_file(path: &Path) -> Result<DynamicImage, anyhow::Error> {
    let bytes = std::fs::read(path)?;
    let img = image::load_from_memory(&bytes)?;
    AnyOk(img)
}

/// Process a stored slide in place.
pub fn process_slide_file(path: &Path, mode: CropMode) -> Result<ProcessOutcome, anyhow::Error> {
    let img = decode_file(path)?;
    let (output, outcome) = transform_slide(&img, mode);
    let bytes = encode(
        &output,
        output_format(&path.to_string_lossy()),
        SLIDE_JPEG_QUALITY,
    )?;
    std::fs::write(path, bytes)?;

    info!(
        "Processed slide {:?}: {} {}x{} -> {}x{}",
        path,
        outcome.action,
        outcome.original_size.width,
        outcome.original_size.height,
        outcome.new_size.width,
        outcome.new_size.height
    );
    AnyOk(outcome)
}

/// Process a stored team portrait in place.
pub fn process_portrait_file(path: &Path) -> Result<ProcessOutcome, anyhow::Error> {
    let img = decode_file(path)?;
    let (output, outcome) = transform_portrait(&img);
    let bytes = encode(
        &output,
        output_format(&path.to_string_lossy()),
        PORTRAIT_JPEG_QUALITY,
    )?;
    std::fs::write(path, bytes)?;

    debug!("Processed portrait {:?}: {}", path, outcome.action);
    AnyOk(outcome)
}

pub fn image_dimensions(path: &Path) -> Result<Dimensions, anyhow::Error> {
    let (width, height) = decode_file(path)?.dimensions();
    AnyOk(Dimensions { width, height })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn solid(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([10, 20, 30])))
    }

    #[test]
    fn test_detect_orientation() {
        assert_eq!(detect_orientation(1000, 1200), Orientation::Portrait);
        assert_eq!(detect_orientation(1200, 1000), Orientation::Landscape);
        assert_eq!(detect_orientation(1000, 1050), Orientation::Square);
        assert_eq!(detect_orientation(1000, 1100), Orientation::Square);
        assert_eq!(detect_orientation(0, 10), Orientation::Unknown);
    }

    #[test]
    fn test_crop_mode_parse() {
        assert_eq!(CropMode::parse("fit"), CropMode::Fit);
        assert_eq!(CropMode::parse(" FILL "), CropMode::Fill);
        assert_eq!(CropMode::parse("stretch"), CropMode::Smart);
        assert_eq!(CropMode::parse(""), CropMode::Smart);
    }

    #[test]
    fn test_ratio_crop_box() {
        // Close to 2:1 is left alone.
        assert_eq!(ratio_crop_box(1950, 1000, 2.0), None);
        // The tolerance is strict, 1.9 is already cropped.
        assert_eq!(
            ratio_crop_box(1900, 1000, 2.0),
            Some(CropBox { left: 0, top: 25, width: 1900, height: 950 })
        );
        // A tiny image still gets a crop box, so the action reports the crop.
        assert!(ratio_crop_box(1, 1, 2.0).is_some());
        // Too wide, height kept.
        assert_eq!(
            ratio_crop_box(3000, 1000, 2.0),
            Some(CropBox { left: 500, top: 0, width: 2000, height: 1000 })
        );
        // Too tall, width kept.
        assert_eq!(
            ratio_crop_box(800, 1000, 2.0),
            Some(CropBox { left: 0, top: 300, width: 800, height: 400 })
        );
        // Odd sizes truncate.
        assert_eq!(
            ratio_crop_box(1001, 1001, 2.0),
            Some(CropBox { left: 0, top: 250, width: 1001, height: 500 })
        );
    }

    #[test]
    fn test_fit_layout() {
        let target = Dimensions { width: 1200, height: 600 };
        let (scaled, padding) = fit_layout(600, 600, target);
        assert_eq!(scaled, Dimensions { width: 600, height: 600 });
        assert_eq!(padding, Padding { x: 300, y: 0 });

        let (scaled, padding) = fit_layout(2400, 600, target);
        assert_eq!(scaled, Dimensions { width: 1200, height: 300 });
        assert_eq!(padding, Padding { x: 0, y: 150 });
    }

    #[test]
    fn test_square_crop_box() {
        assert_eq!(
            square_crop_box(800, 600),
            CropBox { left: 100, top: 0, width: 600, height: 600 }
        );
        assert_eq!(
            square_crop_box(300, 500),
            CropBox { left: 0, top: 100, width: 300, height: 300 }
        );
    }

    #[test]
    fn test_transform_slide_modes() {
        let (out, outcome) = transform_slide(&solid(400, 800), CropMode::Smart);
        assert_eq!((out.width(), out.height()), (1200, 600));
        assert_eq!(outcome.action, "cropped_and_resized");
        assert_eq!(outcome.orientation, "portrait");

        let (_, outcome) = transform_slide(&solid(800, 600), CropMode::Smart);
        assert_eq!(outcome.action, "resized");
        assert_eq!(outcome.orientation, "landscape");

        let (out, outcome) = transform_slide(&solid(600, 600), CropMode::Fit);
        assert_eq!((out.width(), out.height()), (1200, 600));
        assert_eq!(outcome.action, "fitted_with_padding");
        assert_eq!(outcome.padding, Some(Padding { x: 300, y: 0 }));
        // Padding stays white.
        assert_eq!(out.get_pixel(0, 0), &Rgb([255, 255, 255]));

        // Smart leaves square images to a plain resize, only portraits are cropped.
        let (_, outcome) = transform_slide(&solid(1, 1), CropMode::Smart);
        assert_eq!(outcome.action, "resized");
        assert_eq!(outcome.orientation, "square");
        let (_, outcome) = transform_slide(&solid(1, 1), CropMode::Crop);
        assert_eq!(outcome.action, "cropped_and_resized");

        let (_, outcome) = transform_slide(&solid(1000, 500), CropMode::Crop);
        assert_eq!(outcome.action, "resized");
        assert_eq!(outcome.crop_mode, "crop");

        // Smart stretches a landscape image, crop and fill cut it to 2:1 first.
        for mode in [CropMode::Crop, CropMode::Fill] {
            let (out, outcome) = transform_slide(&solid(800, 600), mode);
            assert_eq!((out.width(), out.height()), (1200, 600));
            assert_eq!(outcome.action, "cropped_and_resized");
            assert_eq!(
                outcome.crop_area,
                Some(CropBox { left: 0, top: 100, width: 800, height: 400 })
            );
        }
    }

    #[test]
    fn test_transform_portrait() {
        let (out, outcome) = transform_portrait(&solid(640, 480));
        assert_eq!((out.width(), out.height()), (400, 400));
        assert_eq!(
            outcome.crop_area,
            Some(CropBox { left: 80, top: 0, width: 480, height: 480 })
        );
    }

    #[test]
    fn test_flatten_on_white() {
        let mut rgba = RgbaImage::from_pixel(2, 1, Rgba([0, 0, 0, 0]));
        rgba.put_pixel(1, 0, Rgba([0, 0, 0, 255]));
        let flat = flatten_on_white(&DynamicImage::ImageRgba8(rgba));
        assert_eq!(flat.get_pixel(0, 0), &Rgb([255, 255, 255]));
        assert_eq!(flat.get_pixel(1, 0), &Rgb([0, 0, 0]));
    }

    #[test]
    fn test_process_slide_file_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slide.jpg");
        let bytes = encode(&solid(900, 300).to_rgb8(), ImageFormat::Jpeg, 90).unwrap();
        std::fs::write(&path, bytes).unwrap();

        let outcome = process_slide_file(&path, CropMode::Fill).unwrap();
        assert_eq!(outcome.action, "cropped_and_resized");
        assert_eq!(
            image_dimensions(&path).unwrap(),
            Dimensions { width: 1200, height: 600 }
        );
    }

    fn encoded(img: &DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut buf: Vec<u8> = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), format).unwrap();
        buf
    }

    #[test]
    fn test_process_files_decode_by_content() {
        let dir = tempfile::tempdir().unwrap();
        let rgba = DynamicImage::ImageRgba8(RgbaImage::from_pixel(300, 600, Rgba([200, 10, 10, 255])));

        // A GIF stored under the `.jpg` name it is given on upload.
        let gif = dir.path().join("hero.jpg");
        std::fs::write(&gif, encoded(&rgba, ImageFormat::Gif)).unwrap();
        let outcome = process_slide_file(&gif, CropMode::Smart).unwrap();
        assert_eq!(outcome.original_size, Dimensions { width: 300, height: 600 });
        assert_eq!(
            image_dimensions(&gif).unwrap(),
            Dimensions { width: 1200, height: 600 }
        );
        let written = std::fs::read(&gif).unwrap();
        assert_eq!(image::guess_format(&written).unwrap(), ImageFormat::Jpeg);

        let webp = dir.path().join("team.jpg");
        std::fs::write(&webp, encoded(&rgba, ImageFormat::WebP)).unwrap();
        let outcome = process_portrait_file(&webp).unwrap();
        assert_eq!(outcome.action, "cropped_and_resized");
        assert_eq!(
            image_dimensions(&webp).unwrap(),
            Dimensions { width: 400, height: 400 }
        );
    }

    #[test]
    fn test_process_file_rejects_non_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.jpg");
        std::fs::write(&path, b"plain text").unwrap();
        assert!(process_slide_file(&path, CropMode::Fit).is_err());
        assert!(image_dimensions(&path).is_err());
    }

    #[test]
    fn test_output_extension() {
        assert_eq!(output_extension(".PNG"), "png");
        assert_eq!(output_extension(".webp"), "jpg");
        assert_eq!(output_format("a/b.png"), ImageFormat::Png);
        assert_eq!(output_format("a/b.jpeg"), ImageFormat::Jpeg);
    }
}
