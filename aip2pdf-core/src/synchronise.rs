//! High-level pipeline: mirrors the AIP tree below a root page into a local directory tree.
//!
//! For every folder page the walk:
//!   - resolves refresh redirects to reach the real page ([`crate::fetch::resolve`])
//!   - creates the matching local directory (existing directories are fine, runs resume)
//!   - synchronises every document of the page, in page order ([`crate::document`])
//!   - rebuilds the directory's PDF from the images now present ([`crate::assemble`])
//!   - recurses into every sub-folder, depth first
//!
//! # Error Handling
//! Fail-fast: the first error aborts the whole walk. On its way up, every folder
//! frame adds a `when processing <url>` line to the error, so the message ends up
//! describing the path from the root to the failing document. A partial mirror is
//! harmless: already downloaded documents are skipped on the next run.
//!
//! # Navigation
//! - Main entrypoint: [`synchronise`]
//! - Output: [`WalkReport`]

use std::fs;
use std::path::PathBuf;

use futures::future::{BoxFuture, FutureExt};
use tracing::{error, info};
use url::Url;

use crate::assemble::{assemble, AssemblyOutcome};
use crate::config::{AssembleConfig, MirrorConfig};
use crate::contract::{Fetcher, WalkReport};
use crate::decode::{decode_documents, decode_folders};
use crate::document::{sync_document, DocumentOutcome};
use crate::error::{ErrorKind, Result, ResultExt};
use crate::fetch::resolve;
use crate::sanitize::sanitize_for_path;

/// Everything a walk reads but never changes.
pub struct Walker<'a, F: Fetcher + ?Sized> {
    pub fetcher: &'a F,
    pub mirror: &'a MirrorConfig,
    pub assemble: &'a AssembleConfig,
}

/// Mirrors the whole tree below `mirror.root_url` into `mirror.output_dir`.
pub async fn synchronise<F>(
    fetcher: &F,
    mirror: &MirrorConfig,
    assemble: &AssembleConfig,
) -> Result<WalkReport>
where
    F: Fetcher + ?Sized,
{
    info!(root_url = %mirror.root_url, output_dir = %mirror.output_dir.display(), "[SYNC] Starting mirror walk");
    let walker = Walker {
        fetcher,
        mirror,
        assemble,
    };
    let report = walk(&walker, mirror.root_url.clone(), mirror.output_dir.clone(), 0).await;
    match &report {
        Ok(report) => info!(
            folders = report.folders,
            downloaded = report.downloaded,
            unchanged = report.unchanged,
            pdfs = report.pdfs.len(),
            "[SYNC] Mirror walk complete"
        ),
        Err(e) => error!(error = %e, "[SYNC][ERROR] Mirror walk failed"),
    }
    report
}

/// Visits the folder page at `url`, mirroring it into `target_dir`, then its sub-folders.
///
/// `depth` is 0 for the root and only drives log indentation and the depth limit.
pub fn walk<'a, F>(
    walker: &'a Walker<'a, F>,
    url: Url,
    target_dir: PathBuf,
    depth: usize,
) -> BoxFuture<'a, Result<WalkReport>>
where
    F: Fetcher + ?Sized + 'a,
{
    async move {
        visit(walker, &url, target_dir, depth)
            .await
            .with_context(|| format!("processing {url}"))
    }
    .boxed()
}

async fn visit<F>(
    walker: &Walker<'_, F>,
    url: &Url,
    target_dir: PathBuf,
    depth: usize,
) -> Result<WalkReport>
where
    F: Fetcher + ?Sized,
{
    let limit = walker.mirror.max_depth;
    if depth > limit {
        return Err(ErrorKind::TreeDepthExceeded {
            url: url.to_string(),
            limit,
        }
        .into());
    }

    let page = resolve(
        walker.fetcher,
        &walker.mirror.root_url,
        url,
        walker.mirror.max_redirect_hops,
    )
    .await?;

    fs::create_dir_all(&target_dir)
        .with_context(|| format!("creating {}", target_dir.display()))?;

    let documents = decode_documents(&page.document())?;

    let mut report = WalkReport {
        folders: 1,
        ..WalkReport::default()
    };

    for item in &documents {
        let outcome = sync_document(
            walker.fetcher,
            &page.url,
            &target_dir,
            item,
            walker.assemble.jpeg_quality,
        )
        .await?;
        match outcome {
            DocumentOutcome::Unchanged => {
                info!(depth, document = %item.name, "{:indent$}<DOC>{} unchanged, skip", "", item.name, indent = depth + 1);
                report.unchanged += 1;
            }
            DocumentOutcome::Downloaded => {
                info!(depth, document = %item.name, "{:indent$}<DOC>{} changed, downloaded", "", item.name, indent = depth + 1);
                report.downloaded += 1;
            }
        }
    }

    if let AssemblyOutcome::Written { path, .. } = assemble(&target_dir, walker.assemble)? {
        report.pdfs.push(path);
    }

    let folders = decode_folders(&page.document())?;
    for item in &folders {
        info!(depth, folder = %item.name, "{:indent$}<FOL>{}", "", item.name, indent = depth + 1);
        let child_url = page.url.join(&item.link)?;
        let child_dir = target_dir.join(sanitize_for_path(&item.name));
        let child = walk(walker, child_url, child_dir, depth + 1).await?;
        report.absorb(child);
    }

    Ok(report)
}
