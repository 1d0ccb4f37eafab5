//! # contract: seams between the mirror pipeline and its collaborators
//!
//! The HTTP transport is the only external capability the walk needs to swap out
//! in tests, so it sits behind the [`Fetcher`] trait. The real client lives in
//! [`crate::fetch::HttpFetcher`]; tests use the generated `MockFetcher`.
//!
//! Plain data shared by several modules ([`FetchedPage`], [`TreeItem`],
//! [`WalkReport`]) is defined here as well.

use std::path::PathBuf;

use async_trait::async_trait;
use mockall::automock;
use serde::Serialize;
use url::Url;

use crate::error::MirrorError;

/// A single HTTP response, reduced to what the pipeline reads.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL of the response (differs from the request URL after HTTP redirects).
    pub url: Url,
    pub status: u16,
    pub body: String,
}

/// Issues one GET request.
///
/// Implementations surface network failures and error statuses (4xx/5xx) as
/// [`MirrorError`]s and never retry.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// GET `url`. With `follow_redirects == false`, HTTP 3xx responses are returned as-is.
    async fn get(&self, url: &Url, follow_redirects: bool) -> Result<FetchedPage, MirrorError>;
}

/// One entry of a folder page: a sub-folder or a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeItem {
    /// English display name.
    pub name: String,
    /// `href` as written in the page, relative to the page URL.
    pub link: String,
}

impl TreeItem {
    pub fn new(name: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            link: link.into(),
        }
    }
}

/// What a (sub)tree walk did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WalkReport {
    /// Folder pages visited, the root included.
    pub folders: usize,
    pub downloaded: usize,
    pub unchanged: usize,
    /// Assembled PDFs written during the walk, in visit order.
    pub pdfs: Vec<PathBuf>,
}

impl WalkReport {
    pub fn absorb(&mut self, other: WalkReport) {
        self.folders += other.folders;
        self.downloaded += other.downloaded;
        self.unchanged += other.unchanged;
        self.pdfs.extend(other.pdfs);
    }
}
