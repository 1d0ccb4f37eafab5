//! Change-aware synchronisation of a single AIP document.
//!
//! A document is mirrored as two sibling files named after its sanitised display
//! name: `<name>.jpg`, the page image, and `<name>.marker`, the relative link the
//! image was downloaded from. The AIP publishes a changed document under a new
//! link, so a marker equal to the current link means the local copy is current.
//! Content that changes behind an unchanged link is not detected.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use base64::prelude::BASE64_STANDARD;
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::ImageFormat;
use scraper::Html;
use tracing::{debug, error, info};
use url::Url;

use crate::contract::{Fetcher, TreeItem};
use crate::error::{ErrorKind, Result, ResultExt};
use crate::fetch::selector;
use crate::sanitize::sanitize_for_path;

pub const RASTER_EXTENSION: &str = "jpg";
pub const MARKER_EXTENSION: &str = "marker";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentOutcome {
    /// Marker matched; nothing was fetched or written.
    Unchanged,
    Downloaded,
}

pub fn raster_path(target_dir: &Path, name: &str) -> PathBuf {
    target_dir.join(format!("{}.{RASTER_EXTENSION}", sanitize_for_path(name)))
}

pub fn marker_path(target_dir: &Path, name: &str) -> PathBuf {
    target_dir.join(format!("{}.{MARKER_EXTENSION}", sanitize_for_path(name)))
}

/// Brings the local copy of `item` up to date.
///
/// The raster is written (atomically) before the marker, so an interrupted run
/// leaves a stale marker and the next run downloads again.
pub async fn sync_document<F>(
    fetcher: &F,
    base_url: &Url,
    target_dir: &Path,
    item: &TreeItem,
    jpeg_quality: u8,
) -> Result<DocumentOutcome>
where
    F: Fetcher + ?Sized,
{
    let raster = raster_path(target_dir, &item.name);
    let marker = marker_path(target_dir, &item.name);

    let abs_url = base_url.join(&item.link)?;
    let frame = || format!("reading document data from {abs_url}");

    if is_current(&marker, &item.link).with_context(frame)? {
        debug!(document = %item.name, link = %item.link, "Marker matches, skipping download");
        return Ok(DocumentOutcome::Unchanged);
    }

    download(fetcher, &abs_url, &raster, &marker, &item.link, jpeg_quality)
        .await
        .with_context(frame)?;

    info!(
        document = %item.name,
        url = %abs_url,
        path = %raster.display(),
        "Downloaded document image"
    );
    Ok(DocumentOutcome::Downloaded)
}

fn is_current(marker: &Path, link: &str) -> Result<bool> {
    if !marker.exists() {
        return Ok(false);
    }
    let previous = fs::read_to_string(marker)
        .with_context(|| format!("reading marker {}", marker.display()))?;
    Ok(previous.trim() == link)
}

async fn download<F>(
    fetcher: &F,
    abs_url: &Url,
    raster: &Path,
    marker: &Path,
    link: &str,
    jpeg_quality: u8,
) -> Result<()>
where
    F: Fetcher + ?Sized,
{
    let page = fetcher.get(abs_url, true).await?;
    let src = embedded_image_src(&Html::parse_document(&page.body))?;
    let png = decode_png_data_uri(&src)?;
    let jpeg = png_to_jpeg(&png, jpeg_quality)?;

    write_atomically(raster, &jpeg)?;
    fs::write(marker, link)?;
    Ok(())
}

/// `src` of the page image (`<img class="pageImage" id="imgAIP">`).
pub fn embedded_image_src(document: &Html) -> Result<String> {
    let img = document
        .select(&selector("img.pageImage#imgAIP"))
        .next()
        .ok_or(ErrorKind::EmbeddedImageMissing)?;
    let src = img
        .value()
        .attr("src")
        .ok_or_else(|| ErrorKind::UnexpectedImageEncoding("img without src".into()))?;
    Ok(src.to_string())
}

/// Decodes a `data:image/png;base64,...` URI into PNG bytes.
///
/// Any other media type or encoding is an [`ErrorKind::UnexpectedImageEncoding`].
pub fn decode_png_data_uri(src: &str) -> Result<Vec<u8>> {
    let (media_type, rest) = src.split_once(';').unwrap_or((src, ""));
    if media_type != "data:image/png" {
        error!(media_type, "Unexpected src type of embedded image");
        return Err(ErrorKind::UnexpectedImageEncoding(format!(
            "unexpected src type {media_type:?}"
        ))
        .into());
    }

    let (coding, payload) = rest.split_once(',').unwrap_or((rest, ""));
    if coding != "base64" {
        error!(coding, "Unexpected src coding of embedded image");
        return Err(ErrorKind::UnexpectedImageEncoding(format!(
            "unexpected src coding {coding:?}"
        ))
        .into());
    }

    Ok(BASE64_STANDARD.decode(payload.trim())?)
}

/// Re-encodes a PNG as JPEG, dropping any alpha channel.
pub fn png_to_jpeg(png: &[u8], quality: u8) -> Result<Vec<u8>> {
    let rgb = image::load_from_memory_with_format(png, ImageFormat::Png)?.to_rgb8();
    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, quality).encode_image(&rgb)?;
    Ok(jpeg)
}

fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
