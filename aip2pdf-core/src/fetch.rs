//! HTTP fetching with transparent handling of the AIP's client-side redirects.
//!
//! The AIP does not redirect with HTTP status codes. Permalink pages instead carry
//! `<meta http-equiv="Refresh" content="0;url=...">`, which no HTTP client follows.
//! [`resolve`] follows those directives until it lands on a page without one.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::redirect::Policy;
use reqwest::Client;
use scraper::{Html, Selector};
use tracing::{debug, error};
use url::Url;

use crate::config::MirrorConfig;
use crate::contract::{FetchedPage, Fetcher};
use crate::error::{ErrorKind, MirrorError, Result};

/// [`Fetcher`] backed by two `reqwest` clients: one that never follows HTTP
/// redirects and one that does.
pub struct HttpFetcher {
    direct: Client,
    following: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self> {
        let build = |policy: Policy| {
            Client::builder()
                .redirect(policy)
                .timeout(timeout)
                .user_agent(user_agent)
                .build()
                .map_err(|e| {
                    error!(error = ?e, "Failed to build HTTP client");
                    MirrorError::new(ErrorKind::Network {
                        url: String::new(),
                        message: e.to_string(),
                    })
                })
        };
        Ok(Self {
            direct: build(Policy::none())?,
            following: build(Policy::limited(10))?,
        })
    }

    pub fn from_config(config: &MirrorConfig) -> Result<Self> {
        Self::new(config.request_timeout(), &config.user_agent)
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn get(&self, url: &Url, follow_redirects: bool) -> Result<FetchedPage> {
        let client = if follow_redirects {
            &self.following
        } else {
            &self.direct
        };
        let network = |e: reqwest::Error| {
            error!(error = ?e, url = %url, "HTTP request failed");
            MirrorError::new(ErrorKind::Network {
                url: url.to_string(),
                message: e.to_string(),
            })
        };

        let response = client.get(url.clone()).send().await.map_err(network)?;
        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            error!(status = %status, url = %url, "Server answered with error status");
            return Err(ErrorKind::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            }
            .into());
        }
        let final_url = response.url().clone();
        let body = response.text().await.map_err(network)?;
        debug!(url = %final_url, status = %status, bytes = body.len(), "Fetched page");

        Ok(FetchedPage {
            url: final_url,
            status: status.as_u16(),
            body,
        })
    }
}

/// A parsed `<meta http-equiv="refresh">` directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshDirective {
    pub delay: u32,
    /// `None` when the directive names no target (`"0"` or `"0;url="`).
    pub target: Option<String>,
}

/// Finds and parses the refresh directive of `document`, if it has one.
///
/// `content` is `<delay>[;<key>=<target>]`. Anything else is malformed and fails
/// with [`ErrorKind::RedirectDirectiveMalformed`] rather than being guessed at.
pub fn refresh_directive(document: &Html) -> Result<Option<RefreshDirective>> {
    let meta = selector("meta");
    let Some(element) = document.select(&meta).find(|el| {
        el.value()
            .attr("http-equiv")
            .is_some_and(|v| v.eq_ignore_ascii_case("refresh"))
    }) else {
        return Ok(None);
    };

    let content = element
        .value()
        .attr("content")
        .ok_or_else(|| malformed("missing content attribute".to_string()))?;
    parse_refresh_content(content).map(Some)
}

fn parse_refresh_content(content: &str) -> Result<RefreshDirective> {
    let parts: Vec<&str> = content.split(';').collect();
    if parts.len() > 2 {
        return Err(malformed(format!("too many parts in content attribute: {content}")));
    }

    let delay = parts[0]
        .trim()
        .parse::<u32>()
        .map_err(|e| malformed(format!("bad delay in {content:?}: {e}")))?;

    let target = match parts.get(1) {
        None => None,
        Some(part) => {
            let value = match part.split('=').collect::<Vec<_>>().as_slice() {
                [_key, value] => *value,
                _ => return Err(malformed(format!("target is not key=value in {content:?}"))),
            };
            let value = value.trim().trim_matches(|c| c == '\'' || c == '"');
            (!value.is_empty()).then(|| value.to_string())
        }
    };

    Ok(RefreshDirective { delay, target })
}

/// A page reached after all refresh redirects were followed.
#[derive(Debug, Clone)]
pub struct ResolvedPage {
    pub url: Url,
    pub body: String,
}

impl ResolvedPage {
    pub fn document(&self) -> Html {
        Html::parse_document(&self.body)
    }
}

/// GETs `url` and follows refresh directives until a page has none.
///
/// The first request does not follow HTTP redirects; the ones issued for refresh
/// targets do. Targets are joined to `root`, never to the page that carried the
/// directive. More than `max_hops` refreshes fail with
/// [`ErrorKind::RedirectHopLimitExceeded`].
pub async fn resolve<F>(fetcher: &F, root: &Url, url: &Url, max_hops: usize) -> Result<ResolvedPage>
where
    F: Fetcher + ?Sized,
{
    let mut page = fetcher.get(url, false).await?;
    let mut hops = 0;

    loop {
        let directive = refresh_directive(&Html::parse_document(&page.body))?;
        let Some(target) = directive.and_then(|d| d.target) else {
            return Ok(ResolvedPage {
                url: page.url,
                body: page.body,
            });
        };

        if hops == max_hops {
            error!(url = %url, limit = max_hops, "Refresh redirect limit exceeded");
            return Err(ErrorKind::RedirectHopLimitExceeded {
                url: url.to_string(),
                limit: max_hops,
            }
            .into());
        }
        hops += 1;

        let next = root.join(&target)?;
        debug!(from = %page.url, to = %next, hop = hops, "Following refresh redirect");
        page = fetcher.get(&next, true).await?;
    }
}

fn malformed(message: String) -> MirrorError {
    MirrorError::new(ErrorKind::RedirectDirectiveMalformed(message))
}

pub(crate) fn selector(css: &'static str) -> Selector {
    Selector::parse(css).expect("static selector must parse")
}
