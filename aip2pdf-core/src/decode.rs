//! Extracts folder and document entries from an AIP folder page.
//!
//! Entries look like
//!
//! ```html
//! <li class="folder-item">
//!   <a class="folder-link" href="C0004B.html">
//!     <span class="folder-name" lang="de">Flugplätze</span>
//!     <span class="folder-name" lang="en">Aerodromes</span>
//!   </a>
//! </li>
//! ```
//!
//! with `document-*` classes for documents.

use scraper::{ElementRef, Html};

use crate::contract::TreeItem;
use crate::error::{ErrorKind, Result};
use crate::fetch::selector;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Folder,
    Document,
}

impl ItemKind {
    fn item_selector(self) -> &'static str {
        match self {
            ItemKind::Folder => "li.folder-item",
            ItemKind::Document => "li.document-item",
        }
    }

    fn link_selector(self) -> &'static str {
        match self {
            ItemKind::Folder => "a.folder-link",
            ItemKind::Document => "a.document-link",
        }
    }

    fn name_selector(self) -> &'static str {
        match self {
            ItemKind::Folder => r#"span.folder-name[lang="en"]"#,
            ItemKind::Document => r#"span.document-name[lang="en"]"#,
        }
    }

    fn label(self) -> &'static str {
        match self {
            ItemKind::Folder => "folder",
            ItemKind::Document => "document",
        }
    }
}

pub fn decode_folders(document: &Html) -> Result<Vec<TreeItem>> {
    decode_items(document, ItemKind::Folder)
}

pub fn decode_documents(document: &Html) -> Result<Vec<TreeItem>> {
    decode_items(document, ItemKind::Document)
}

/// All items of `kind`, in page order.
///
/// An item without its link or English name fails the whole decode: the page
/// layout is not what the mirror expects, and skipping would lose data silently.
pub fn decode_items(document: &Html, kind: ItemKind) -> Result<Vec<TreeItem>> {
    let items = selector(kind.item_selector());
    document
        .select(&items)
        .enumerate()
        .map(|(index, item)| decode_item(item, kind, index))
        .collect()
}

fn decode_item(item: ElementRef<'_>, kind: ItemKind, index: usize) -> Result<TreeItem> {
    let failure = |what: &str| {
        ErrorKind::TreeItemDecodeFailure(format!("{} item #{index}: {what}", kind.label()))
    };

    let link = item
        .select(&selector(kind.link_selector()))
        .next()
        .ok_or_else(|| failure("no link element"))?
        .value()
        .attr("href")
        .ok_or_else(|| failure("link element without href"))?;

    let name = item
        .select(&selector(kind.name_selector()))
        .next()
        .ok_or_else(|| failure("no English name element"))?
        .text()
        .collect::<String>();

    Ok(TreeItem::new(name.trim(), link))
}
