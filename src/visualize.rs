//! Overlay VOC-like or YOLO-like boxes on their images.

use ab_glyph::{FontVec, PxScale};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use log::info;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::bbox::{to_absolute_corners, PixelBox, RoundingRule};
use crate::category::CategoryTable;
use crate::config::{ShowVoclikeArgs, ShowYololikeArgs};
use crate::error::{Error, Result, ResultExt};
use crate::io::{read_voc_annotation, read_yolo_labels};
use crate::pairing::resolve_pairs;
use crate::types::{VOC_LABEL_EXT, YOLO_LABEL_EXT};
use crate::utils::{create_new_file, create_output_directory, file_name_str};
use crate::voc::VocAnnotation;
use crate::yolo::YoloLabel;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const GREEN: Rgb<u8> = Rgb([0, 255, 0]);
const TEXT_SCALE: f32 = 16.0;

pub fn load_font(path: &Path) -> Result<FontVec> {
    let bytes = fs::read(path).at_path(path)?;
    FontVec::try_from_vec(bytes)
        .map_err(|e| Error::config(format!("invalid font {}: {}", path.display(), e)))
}

/// Draw a box outline `thickness` pixels wide, growing inwards. Both corner
/// pixels are part of the outline.
pub fn draw_box(image: &mut RgbImage, bbox: &PixelBox, color: Rgb<u8>, thickness: u32) {
    for inset in 0..thickness as i64 {
        let width = bbox.xmax - bbox.xmin + 1 - 2 * inset;
        let height = bbox.ymax - bbox.ymin + 1 - 2 * inset;
        if width < 1 || height < 1 {
            break;
        }
        let rect = Rect::at((bbox.xmin + inset) as i32, (bbox.ymin + inset) as i32)
            .of_size(width as u32, height as u32);
        draw_hollow_rect_mut(image, rect, color);
    }
}

fn draw_caption(image: &mut RgbImage, font: &FontVec, bbox: &PixelBox, text: &str) {
    let x = bbox.xmin.max(0) as i32;
    let y = (bbox.ymin - TEXT_SCALE as i64).max(0) as i32;
    draw_text_mut(image, GREEN, x, y, PxScale::from(TEXT_SCALE), font, text);
}

/// Draw every object of a VOC record: white 1px boxes, green names when a
/// font is available. Returns the boxes drawn.
pub fn render_voc_overlay(
    image: &mut RgbImage,
    annotation: &VocAnnotation,
    font: Option<&FontVec>,
) -> Vec<(String, PixelBox)> {
    let mut drawn = Vec::with_capacity(annotation.objects.len());
    for object in &annotation.objects {
        let bbox = PixelBox {
            xmin: object.bndbox.xmin.trunc() as i64,
            ymin: object.bndbox.ymin.trunc() as i64,
            xmax: object.bndbox.xmax.trunc() as i64,
            ymax: object.bndbox.ymax.trunc() as i64,
        };
        draw_box(image, &bbox, WHITE, 1);
        if let Some(font) = font {
            draw_caption(image, font, &bbox, &object.name);
        }
        drawn.push((object.name.clone(), bbox));
    }
    drawn
}

/// Draw YOLO labels using the real image size: green 2px boxes, captioned
/// with the class name (or id without a table) when a font is available.
pub fn render_yolo_overlay(
    image: &mut RgbImage,
    labels: &[YoloLabel],
    rounding: RoundingRule,
    categories: Option<&CategoryTable>,
    font: Option<&FontVec>,
) -> Result<Vec<(String, PixelBox)>> {
    let (width, height) = image.dimensions();
    let mut drawn = Vec::with_capacity(labels.len());
    for label in labels {
        let bbox = to_absolute_corners(&label.bbox, width, height, rounding)?;
        let caption = match categories {
            Some(table) => table.name(label.class_id)?.to_string(),
            None => label.class_id.to_string(),
        };
        draw_box(image, &bbox, GREEN, 2);
        if let Some(font) = font {
            draw_caption(image, font, &bbox, &caption);
        }
        drawn.push((caption, bbox));
    }
    Ok(drawn)
}

/// Encode `image` to a new file, picking the format from the extension.
pub fn save_image(image: RgbImage, path: &Path) -> Result<()> {
    let format = ImageFormat::from_path(path).at_path(path)?;
    let mut writer = create_new_file(path)?;
    DynamicImage::ImageRgb8(image)
        .write_to(&mut writer, format)
        .at_path(path)?;
    writer.flush().at_path(path)
}

fn output_path(dst: Option<&Path>, image_path: &Path) -> Result<Option<PathBuf>> {
    match dst {
        Some(dst) => {
            let dir = create_output_directory(dst)?;
            Ok(Some(dir.join(file_name_str(image_path)?)))
        }
        None => Ok(None),
    }
}

fn report(image_path: &Path, drawn: &[(String, PixelBox)]) {
    info!("{}: {} boxes", image_path.display(), drawn.len());
    for (caption, b) in drawn {
        info!(
            "  {} ({}, {}, {}, {})",
            caption, b.xmin, b.ymin, b.xmax, b.ymax
        );
    }
}

/// Render VOC-like labels for every resolved pair. Returns the number of
/// images rendered.
pub fn show_voclike_labels(args: &ShowVoclikeArgs) -> Result<usize> {
    let pairs = resolve_pairs(&args.image, &args.label, VOC_LABEL_EXT)?;
    let font = args.font.as_deref().map(load_font).transpose()?;

    for pair in &pairs {
        let mut image = image::open(&pair.image).at_path(&pair.image)?.to_rgb8();
        let annotation = read_voc_annotation(&pair.label)?;
        let drawn = render_voc_overlay(&mut image, &annotation, font.as_ref());
        report(&pair.image, &drawn);

        if let Some(path) = output_path(args.dst.as_deref(), &pair.image)? {
            save_image(image, &path)?;
            info!("Save to {}", path.display());
        }
    }
    Ok(pairs.len())
}

/// Render YOLO-like labels for every resolved pair. Returns the number of
/// images rendered.
pub fn show_yololike_labels(args: &ShowYololikeArgs) -> Result<usize> {
    let pairs = resolve_pairs(&args.image, &args.label, YOLO_LABEL_EXT)?;
    let font = args.font.as_deref().map(load_font).transpose()?;
    let categories = args
        .classes
        .as_deref()
        .map(CategoryTable::load)
        .transpose()?;

    for pair in &pairs {
        let mut image = image::open(&pair.image).at_path(&pair.image)?.to_rgb8();
        let labels = read_yolo_labels(&pair.label)?;
        let drawn = render_yolo_overlay(
            &mut image,
            &labels,
            args.rounding,
            categories.as_ref(),
            font.as_ref(),
        )
        .at_path(&pair.label)?;
        report(&pair.image, &drawn);

        if let Some(path) = output_path(args.dst.as_deref(), &pair.image)? {
            save_image(image, &path)?;
            info!("Save to {}", path.display());
        }
    }
    Ok(pairs.len())
}
