//! A fake AIP site served through `MockFetcher`, plus helpers to inspect output.
#![allow(dead_code)]

use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;
use std::sync::{Arc, Mutex};

use aip2pdf_core::contract::{FetchedPage, MockFetcher};
use aip2pdf_core::error::ErrorKind;
use base64::prelude::BASE64_STANDARD;
use base64::Engine;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use lopdf::content::Content;
use lopdf::Object;

pub const ROOT: &str = "https://aip.example/vfr/";

/// Every GET the fetcher saw, as `(url, follow_redirects)`.
pub type FetchLog = Arc<Mutex<Vec<(String, bool)>>>;

#[derive(Clone, Default)]
pub struct FakeSite {
    pages: HashMap<String, String>,
}

impl FakeSite {
    /// `path` is relative to [`ROOT`].
    pub fn page(mut self, path: &str, body: impl Into<String>) -> Self {
        self.pages.insert(format!("{ROOT}{path}"), body.into());
        self
    }

    /// A fetcher answering from this site; unknown URLs get a 404.
    pub fn fetcher(&self, log: &FetchLog) -> MockFetcher {
        let pages = self.pages.clone();
        let log = Arc::clone(log);
        let mut fetcher = MockFetcher::new();
        fetcher.expect_get().returning(move |url, follow| {
            log.lock().unwrap().push((url.to_string(), follow));
            match pages.get(url.as_str()) {
                Some(body) => Ok(FetchedPage {
                    url: url.clone(),
                    status: 200,
                    body: body.clone(),
                }),
                None => Err(ErrorKind::HttpStatus {
                    url: url.to_string(),
                    status: 404,
                }
                .into()),
            }
        });
        fetcher
    }
}

pub fn refresh_page(target: &str) -> String {
    format!(
        r#"<html><head><meta http-equiv="Refresh" content="0;url={target}"></head><body></body></html>"#
    )
}

/// Folder page listing `folders` and `documents` as `(english name, href)`.
pub fn folder_page(folders: &[(&str, &str)], documents: &[(&str, &str)]) -> String {
    let mut body = String::from("<html><body><ul>");
    for (name, href) in folders {
        body.push_str(&format!(
            r#"<li class="folder-item"><a class="folder-link" href="{href}"><span class="folder-name" lang="de">x</span><span class="folder-name" lang="en">{name}</span></a></li>"#
        ));
    }
    for (name, href) in documents {
        body.push_str(&format!(
            r#"<li class="document-item"><a class="document-link" href="{href}"><span class="document-name" lang="en">{name}</span></a></li>"#
        ));
    }
    body.push_str("</ul></body></html>");
    body
}

/// Document page embedding a `width` x `height` PNG.
pub fn document_page(width: u32, height: u32) -> String {
    format!(
        r#"<html><body><img class="pageImage" id="imgAIP" src="data:image/png;base64,{}"></body></html>"#,
        BASE64_STANDARD.encode(png(width, height))
    )
}

pub fn png(width: u32, height: u32) -> Vec<u8> {
    let image = RgbImage::from_pixel(width, height, Rgb([200, 30, 30]));
    let mut bytes = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(image)
        .write_to(&mut bytes, ImageFormat::Png)
        .unwrap();
    bytes.into_inner()
}

pub fn write_jpeg(path: &Path, width: u32, height: u32) {
    RgbImage::from_pixel(width, height, Rgb([30, 30, 200]))
        .save_with_format(path, ImageFormat::Jpeg)
        .unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Landscape,
    Portrait,
}

/// `[x0, y0, x1, y1]` of every page of the PDF at `path`, in page order.
pub fn media_boxes(path: &Path) -> Vec<[f32; 4]> {
    let doc = lopdf::Document::load(path).unwrap();
    doc.get_pages()
        .values()
        .map(|id| {
            let page = doc.get_dictionary(*id).unwrap();
            let values = match page.get(b"MediaBox").unwrap() {
                Object::Array(values) => values.clone(),
                other => panic!("MediaBox is not an array: {other:?}"),
            };
            [
                number(&values[0]),
                number(&values[1]),
                number(&values[2]),
                number(&values[3]),
            ]
        })
        .collect()
}

/// Orientation of every page of the PDF at `path`, in page order.
pub fn page_orientations(path: &Path) -> Vec<Orientation> {
    media_boxes(path)
        .into_iter()
        .map(|[x0, y0, x1, y1]| {
            if x1 - x0 > y1 - y0 {
                Orientation::Landscape
            } else {
                Orientation::Portrait
            }
        })
        .collect()
}

/// Where an image was drawn: the `a b c d e f` operands of its `cm` operator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImagePlacement {
    pub width: f32,
    pub height: f32,
    pub x: f32,
    pub y: f32,
}

/// Image placements of every page of the PDF at `path`, in page and drawing order.
///
/// Every `cm` that scales (anything but the identity matrix) is taken as an image.
pub fn image_placements(path: &Path) -> Vec<Vec<ImagePlacement>> {
    let doc = lopdf::Document::load(path).unwrap();
    doc.get_pages()
        .values()
        .map(|id| {
            let content = Content::decode(&doc.get_page_content(*id).unwrap()).unwrap();
            content
                .operations
                .iter()
                .filter(|op| op.operator == "cm" && op.operands.len() == 6)
                .map(|op| {
                    let m: Vec<f32> = op.operands.iter().map(number).collect();
                    ImagePlacement {
                        width: m[0],
                        height: m[3],
                        x: m[4],
                        y: m[5],
                    }
                })
                .filter(|p| p.width != 1.0 || p.height != 1.0)
                .collect()
        })
        .collect()
}

fn number(o: &Object) -> f32 {
    match o {
        Object::Integer(i) => *i as f32,
        Object::Real(r) => *r,
        other => panic!("not a number: {other:?}"),
    }
}

pub fn assert_close(actual: f32, expected: f32) {
    assert!(
        (actual - expected).abs() < 0.5,
        "expected {expected}, got {actual}"
    );
}
