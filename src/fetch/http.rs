use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response, Url};
use scraper::{Html, Selector};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::{Downloader, download_url};
use crate::report::{Reporter, format_size};
use anyhow::{Context, Result, bail};
use async_trait::async_trait;

/// Interstitial pages followed before giving up.
const MAX_CONFIRMATIONS: usize = 3;

/// Bytes between two download progress lines.
const DEFAULT_PROGRESS_STEP: u64 = 16 * 1024 * 1024;

/// Downloads shared files over HTTP(S), following the "can't scan this file
/// for viruses" confirmation page served for large files.
pub struct HttpDownloader {
    client: Client,
    base_url: String,
    progress_step: u64,
}

impl HttpDownloader {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self::with_client(client, base_url))
    }

    /// Use a preconfigured client (proxies, timeouts, TLS roots)
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            progress_step: DEFAULT_PROGRESS_STEP,
        }
    }

    /// Report progress every `bytes` downloaded instead of every 16 MB
    pub fn with_progress_step(mut self, bytes: u64) -> Self {
        self.progress_step = bytes.max(1);
        self
    }

    /// Resolve the response carrying the file itself.
    async fn resolve(&self, file_id: &str) -> Result<Response> {
        let mut url = Url::parse(&download_url(&self.base_url, file_id))
            .with_context(|| format!("Invalid download URL base: {}", self.base_url))?;

        for _ in 0..=MAX_CONFIRMATIONS {
            log::debug!("GET {}", url);
            let resp = self.client.get(url.clone()).send().await?;

            if !resp.status().is_success() {
                bail!("HTTP request failed with status: {}", resp.status());
            }

            if !is_html(&resp) {
                return Ok(resp);
            }

            let page_url = resp.url().clone();
            let page = resp.text().await?;
            url = match confirmation_url(&page, &page_url) {
                Some(next) => next,
                None => bail!(
                    "Cannot retrieve the file {}: the host returned a web page instead. \
                     Make sure it is shared with 'Anyone with the link'",
                    file_id
                ),
            };
            log::info!("following download confirmation to {}", url);
        }

        bail!("Too many download confirmation pages for {}", file_id)
    }

    /// Stream the response body into `path`, reporting progress every
    /// `progress_step` bytes.
    async fn write_body(
        &self,
        mut resp: Response,
        path: &Path,
        reporter: &Reporter,
    ) -> Result<u64> {
        let total = resp.content_length();
        let mut file = fs::File::create(path)
            .await
            .with_context(|| format!("Failed to create {}", path.display()))?;

        let mut written = 0u64;
        let mut next_report = self.progress_step;
        while let Some(chunk) = resp.chunk().await? {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;

            if written >= next_report {
                match total {
                    Some(total) => reporter.status(format_args!(
                        "Downloaded {} of {}",
                        format_size(written),
                        format_size(total)
                    )),
                    None => reporter.status(format_args!("Downloaded {}", format_size(written))),
                }
                next_report = (written / self.progress_step + 1) * self.progress_step;
            }
        }
        file.flush().await?;

        Ok(written)
    }
}

#[async_trait]
impl Downloader for HttpDownloader {
    async fn download(
        &self,
        file_id: &str,
        destination: &Path,
        reporter: &Reporter,
    ) -> Result<u64> {
        let resp = self.resolve(file_id).await?;

        let part = partial_path(destination);
        let written = match self.write_body(resp, &part, reporter).await {
            Ok(written) => written,
            Err(e) => {
                let _ = fs::remove_file(&part).await;
                return Err(e);
            }
        };

        fs::rename(&part, destination)
            .await
            .with_context(|| format!("Failed to move download to {}", destination.display()))?;

        Ok(written)
    }
}

fn is_html(resp: &Response) -> bool {
    resp.headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim_start().starts_with("text/html"))
}

fn partial_path(destination: &Path) -> PathBuf {
    let mut name = destination.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

/// Find where a download confirmation page sends the browser.
///
/// Two layouts are recognised: a `download-form` whose named inputs become
/// the query string, and the older `uc-download-link` anchor pointing at
/// `/uc?export=download&confirm=...`.
pub fn confirmation_url(page: &str, page_url: &Url) -> Option<Url> {
    let document = Html::parse_document(page);
    form_target(&document, page_url).or_else(|| link_target(&document, page_url))
}

fn form_target(document: &Html, page_url: &Url) -> Option<Url> {
    let form_selector = Selector::parse("form#download-form").ok()?;
    let input_selector = Selector::parse("input[name]").ok()?;

    let form = document.select(&form_selector).next()?;
    let action = form.value().attr("action")?;
    let mut url = page_url.join(action).ok()?;

    let fields: Vec<(&str, &str)> = form
        .select(&input_selector)
        .filter_map(|input| {
            let input = input.value();
            Some((input.attr("name")?, input.attr("value").unwrap_or("")))
        })
        .collect();
    if !fields.is_empty() {
        url.query_pairs_mut().extend_pairs(fields);
    }

    Some(url)
}

fn link_target(document: &Html, page_url: &Url) -> Option<Url> {
    let link_selector =
        Selector::parse(r#"a#uc-download-link[href], a[href^="/uc?export=download"]"#).ok()?;
    let href = document.select(&link_selector).next()?.value().attr("href")?;
    page_url.join(href).ok()
}
