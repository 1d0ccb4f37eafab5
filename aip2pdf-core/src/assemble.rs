//! Assembles the page images of one directory into a printable PDF.
//!
//! Images are ordered by prefix bucket (charts before text pages with the default
//! `ED`, `ET`, `AD 2` buckets) and then by name, and laid out two per landscape A4
//! page. A trailing odd image gets a portrait page of its own. For the usual VFR
//! aerodrome entry of two charts and one text page this gives a sheet that folds
//! nicely when printed double-sided.

use std::fs;
use std::path::{Path, PathBuf};

use image::ImageFormat;
use printpdf::{
    Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, Pt, RawImage, RawImageData, RawImageFormat,
    Rect, XObjectTransform,
};
use tracing::{debug, info};

use crate::config::AssembleConfig;
use crate::document::RASTER_EXTENSION;
use crate::error::{ErrorKind, Result, ResultExt};
use crate::sanitize::sanitize_for_path;

pub const A4_SHORT_MM: f32 = 210.0;
pub const A4_LONG_MM: f32 = 297.0;

/// One output page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PagePlan {
    /// Landscape, left image then right image.
    Pair(String, String),
    /// Portrait, single image.
    Single(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssemblyOutcome {
    /// No qualifying images; no file was written.
    Skipped,
    Written { path: PathBuf, pages: usize },
}

/// Position and size of an image on a page, in millimetres from the lower left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x_mm: f32,
    pub y_mm: f32,
    pub width_mm: f32,
    pub height_mm: f32,
}

/// File names of `dir` with a `.jpg` extension, in any letter case.
pub fn raster_files(dir: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let path = entry.path();
        let is_raster = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(RASTER_EXTENSION));
        if is_raster {
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                names.push(name.to_string());
            }
        }
    }
    Ok(names)
}

/// Buckets `names` by the first matching prefix, sorts each bucket by name and
/// concatenates the buckets in prefix order. Names matching no prefix are dropped.
pub fn order_by_buckets(names: &[String], prefixes: &[String]) -> Vec<String> {
    let mut buckets: Vec<Vec<&String>> = vec![Vec::new(); prefixes.len()];
    for name in names {
        match prefixes.iter().position(|p| name.starts_with(p.as_str())) {
            Some(index) => buckets[index].push(name),
            None => debug!(file = %name, "No bucket matches, leaving out of assembly"),
        }
    }
    buckets
        .into_iter()
        .flat_map(|mut bucket| {
            bucket.sort();
            bucket.into_iter().cloned()
        })
        .collect()
}

pub fn plan_pages(names: &[String], prefixes: &[String]) -> Vec<PagePlan> {
    order_by_buckets(names, prefixes)
        .chunks(2)
        .map(|chunk| match chunk {
            [left, right] => PagePlan::Pair(left.clone(), right.clone()),
            [single] => PagePlan::Single(single.clone()),
            _ => unreachable!("chunks(2) yields one or two items"),
        })
        .collect()
}

/// Scales an image of `px_width` x `px_height` to the full `page_height_mm`,
/// shrinking further if it would overflow `slot_width_mm`. The result is centred
/// vertically and, when `center` is set, horizontally within the slot.
pub fn fit_to_slot(
    px_width: u32,
    px_height: u32,
    slot_x_mm: f32,
    slot_width_mm: f32,
    page_height_mm: f32,
    center: bool,
) -> Placement {
    let aspect = px_width as f32 / px_height.max(1) as f32;
    let mut height_mm = page_height_mm;
    let mut width_mm = height_mm * aspect;
    if width_mm > slot_width_mm {
        width_mm = slot_width_mm;
        height_mm = width_mm / aspect;
    }
    let x_mm = if center {
        slot_x_mm + (slot_width_mm - width_mm) / 2.0
    } else {
        slot_x_mm
    };
    Placement {
        x_mm,
        y_mm: (page_height_mm - height_mm) / 2.0,
        width_mm,
        height_mm,
    }
}

/// Output path of the assembled document for `dir`: `<dir>/<sanitised dir name>.pdf`.
pub fn output_path(dir: &Path) -> Result<PathBuf> {
    let name = match dir.file_name() {
        Some(name) => name.to_string_lossy().into_owned(),
        None => dir
            .canonicalize()?
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "aip".to_string()),
    };
    Ok(dir.join(format!("{}.pdf", sanitize_for_path(&name))))
}

/// Rebuilds the PDF of `dir` from the images currently in it.
///
/// Overwrites an earlier PDF; writes nothing when no image qualifies.
pub fn assemble(dir: &Path, config: &AssembleConfig) -> Result<AssemblyOutcome> {
    assemble_inner(dir, config).with_context(|| format!("assembling {}", dir.display()))
}

fn assemble_inner(dir: &Path, config: &AssembleConfig) -> Result<AssemblyOutcome> {
    let names = raster_files(dir)?;
    let plans = plan_pages(&names, &config.prefixes);
    if plans.is_empty() {
        debug!(dir = %dir.display(), "No images to assemble");
        return Ok(AssemblyOutcome::Skipped);
    }

    let path = output_path(dir)?;
    let title = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let bytes = render(dir, &title, &plans)?;
    fs::write(&path, bytes)?;

    info!(path = %path.display(), pages = plans.len(), "Wrote assembled PDF");
    Ok(AssemblyOutcome::Written {
        path,
        pages: plans.len(),
    })
}

fn render(dir: &Path, title: &str, plans: &[PagePlan]) -> Result<Vec<u8>> {
    let mut doc = PdfDocument::new(title);

    for plan in plans {
        let (width_mm, height_mm, ops) = match plan {
            PagePlan::Pair(left, right) => {
                let half = A4_LONG_MM / 2.0;
                let ops = vec![
                    place_image(&mut doc, &dir.join(left), 0.0, half, A4_SHORT_MM, false)?,
                    place_image(&mut doc, &dir.join(right), half, half, A4_SHORT_MM, false)?,
                ];
                (A4_LONG_MM, A4_SHORT_MM, ops)
            }
            PagePlan::Single(name) => {
                let ops = vec![place_image(
                    &mut doc,
                    &dir.join(name),
                    0.0,
                    A4_SHORT_MM,
                    A4_LONG_MM,
                    true,
                )?];
                (A4_SHORT_MM, A4_LONG_MM, ops)
            }
        };
        doc.pages.push(page(width_mm, height_mm, ops));
    }

    let mut warnings = Vec::new();
    let bytes = doc.save(&PdfSaveOptions::default(), &mut warnings);
    if bytes.is_empty() {
        return Err(ErrorKind::Pdf(format!("empty output, warnings: {warnings:?}")).into());
    }
    Ok(bytes)
}

fn place_image(
    doc: &mut PdfDocument,
    path: &Path,
    slot_x_mm: f32,
    slot_width_mm: f32,
    page_height_mm: f32,
    center: bool,
) -> Result<Op> {
    let jpeg = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let rgb = image::load_from_memory_with_format(&jpeg, ImageFormat::Jpeg)
        .with_context(|| format!("decoding {}", path.display()))?
        .to_rgb8();
    let (px_width, px_height) = rgb.dimensions();

    let placement = fit_to_slot(
        px_width,
        px_height,
        slot_x_mm,
        slot_width_mm,
        page_height_mm,
        center,
    );

    let id = doc.add_image(&RawImage {
        pixels: RawImageData::U8(rgb.into_raw()),
        width: px_width as usize,
        height: px_height as usize,
        data_format: RawImageFormat::RGB8,
        tag: Vec::new(),
    });

    // At 72 dpi one pixel is one point, so the scale is the target size in points per pixel.
    let width_pt = Mm(placement.width_mm).into_pt().0;
    let height_pt = Mm(placement.height_mm).into_pt().0;
    Ok(Op::UseXobject {
        id,
        transform: XObjectTransform {
            translate_x: Some(Mm(placement.x_mm).into_pt()),
            translate_y: Some(Mm(placement.y_mm).into_pt()),
            scale_x: Some(width_pt / px_width as f32),
            scale_y: Some(height_pt / px_height as f32),
            dpi: Some(72.0),
            ..Default::default()
        },
    })
}

fn page(width_mm: f32, height_mm: f32, ops: Vec<Op>) -> PdfPage {
    let width = Mm(width_mm).into_pt().0;
    let height = Mm(height_mm).into_pt().0;
    let rect = || Rect {
        x: Pt(0.0),
        y: Pt(0.0),
        width: Pt(width),
        height: Pt(height),
    };
    PdfPage {
        media_box: rect(),
        trim_box: rect(),
        crop_box: rect(),
        ops,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn default_prefixes() -> Vec<String> {
        AssembleConfig::default().prefixes
    }

    #[test]
    fn buckets_come_in_prefix_order_then_by_name() {
        let ordered = order_by_buckets(
            &names(&["AD 2 EDDF.jpg", "ET01.jpg", "ED02.jpg", "ED01.jpg"]),
            &default_prefixes(),
        );
        assert_eq!(ordered, names(&["ED01.jpg", "ED02.jpg", "ET01.jpg", "AD 2 EDDF.jpg"]));
    }

    #[test]
    fn unmatched_names_are_left_out() {
        let ordered = order_by_buckets(
            &names(&["README.jpg", "ED01.jpg", "AD 1 overview.jpg"]),
            &default_prefixes(),
        );
        assert_eq!(ordered, names(&["ED01.jpg"]));
    }

    #[test]
    fn even_count_pairs_up() {
        let plans = plan_pages(
            &names(&["AD 2 EDDF.jpg", "ET01.jpg", "ED01.jpg", "ED02.jpg"]),
            &default_prefixes(),
        );
        assert_eq!(
            plans,
            vec![
                PagePlan::Pair("ED01.jpg".into(), "ED02.jpg".into()),
                PagePlan::Pair("ET01.jpg".into(), "AD 2 EDDF.jpg".into()),
            ]
        );
    }

    #[test]
    fn odd_count_ends_with_single() {
        let plans = plan_pages(
            &names(&["ED03.jpg", "ED01.jpg", "ED02.jpg"]),
            &default_prefixes(),
        );
        assert_eq!(
            plans,
            vec![
                PagePlan::Pair("ED01.jpg".into(), "ED02.jpg".into()),
                PagePlan::Single("ED03.jpg".into()),
            ]
        );
    }

    #[test]
    fn nothing_to_plan_without_matches() {
        assert!(plan_pages(&names(&["x.jpg"]), &default_prefixes()).is_empty());
        assert!(plan_pages(&[], &default_prefixes()).is_empty());
    }

    #[test]
    fn portrait_image_fills_half_page_height() {
        // Narrower than a landscape half page, so the height is the binding side.
        let p = fit_to_slot(1000, 1500, A4_LONG_MM / 2.0, A4_LONG_MM / 2.0, A4_SHORT_MM, false);
        assert_eq!(p.height_mm, A4_SHORT_MM);
        assert_eq!(p.x_mm, A4_LONG_MM / 2.0);
        assert_eq!(p.y_mm, 0.0);
        assert!(p.width_mm <= A4_LONG_MM / 2.0);
    }

    #[test]
    fn wide_image_is_shrunk_and_centred() {
        let p = fit_to_slot(2000, 1000, 0.0, A4_SHORT_MM, A4_LONG_MM, true);
        assert_eq!(p.width_mm, A4_SHORT_MM);
        assert_eq!(p.height_mm, A4_SHORT_MM / 2.0);
        assert_eq!(p.x_mm, 0.0);
        assert!((p.y_mm - (A4_LONG_MM - A4_SHORT_MM / 2.0) / 2.0).abs() < 1e-3);
    }

    #[test]
    fn output_named_after_directory() {
        let path = output_path(Path::new("/mirror/AD 2 EDDF")).unwrap();
        assert_eq!(path, Path::new("/mirror/AD 2 EDDF/AD 2 EDDF.pdf"));
    }
}
