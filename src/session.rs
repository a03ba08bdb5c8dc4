mod cookies;

use std::{
  path::PathBuf,
  sync::{Arc, Mutex, MutexGuard, PoisonError},
  time::Duration,
};

use async_trait::async_trait;
use reqwest::{
  cookie::{CookieStore, Jar},
  header::{self, HeaderMap, HeaderValue},
  Client, Response,
};
use tracing::{debug, info, warn};
use url::Url;

use crate::{Error, Result};

pub use cookies::{CookieCache, StoredCookie};

pub const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
  AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const ACCEPT_HTML: &str =
  "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

const PAGE_TIMEOUT: Duration = Duration::from_secs(15);
const MANIFEST_TIMEOUT: Duration = Duration::from_secs(10);

// any of these in a page body means it is the age-verification interstitial
const AGE_GATE_MARKERS: [&str; 3] =
  ["document.cookie", "location.reload", "goAge"];

const AGE_COOKIES: [(&str, &str); 3] = [
  ("age_verified", "1"),
  ("accessAgeDisclaimerPH", "1"),
  ("accessPH", "1"),
];

/// Text fetches the extractor needs from the network.
#[async_trait]
pub trait Fetch: Send + Sync {
  /// Fetches a text resource (a manifest) on behalf of the page at
  /// `referer`.
  async fn fetch_text(&self, url: &str, referer: &str) -> Result<String>;
}

#[derive(Clone, Debug, Default)]
pub struct SessionConfig {
  pub proxy: Option<String>,
  pub cookie_path: Option<PathBuf>,
}

pub struct Session {
  client: Client,
  jar: Arc<Jar>,
  cache: Mutex<CookieCache>,
  cookie_path: Option<PathBuf>,
}

impl Session {
  pub fn new(config: SessionConfig) -> Result<Self> {
    let cache = match &config.cookie_path {
      Some(path) => CookieCache::load(path).unwrap_or_else(|e| {
        warn!("could not load cookies from {}: {e}", path.display());
        CookieCache::default()
      }),
      None => CookieCache::default(),
    };
    debug!("loaded {} cached cookies", cache.len());

    let jar = Arc::new(Jar::default());
    cache.install(&jar);

    let mut headers = HeaderMap::new();
    headers.insert(header::ACCEPT, HeaderValue::from_static(ACCEPT_HTML));

    let mut builder = Client::builder()
      .user_agent(USER_AGENT)
      .default_headers(headers)
      .cookie_provider(jar.clone());

    if let Some(proxy) = &config.proxy {
      builder = builder.proxy(reqwest::Proxy::all(proxy)?);
    }

    Ok(Self {
      client: builder.build()?,
      jar,
      cache: Mutex::new(cache),
      cookie_path: config.cookie_path,
    })
  }

  /// Downloads a video page. When the site answers with its age gate,
  /// the age cookies are set for the host and the page is fetched once
  /// more.
  pub async fn fetch_page(&self, url: &str) -> Result<String> {
    let html = self.get(url, None, PAGE_TIMEOUT).await?;
    if !is_age_gate(&html) {
      return Ok(html);
    }

    let parsed = Url::parse(url)?;
    let host = parsed
      .host_str()
      .ok_or_else(|| Error::UnsupportedURL(url.into(), "no host"))?;

    info!("age gate on {host}, retrying with age cookies");
    let age_cookies = AGE_COOKIES
      .iter()
      .map(|(name, value)| StoredCookie::new(host, *name, *value));
    self.remember(age_cookies);

    self.get(url, None, PAGE_TIMEOUT).await
  }

  /// `Cookie` header value the jar would send to `url`.
  pub fn cookie_header(&self, url: &str) -> Option<String> {
    let url = Url::parse(url).ok()?;
    let value = self.jar.cookies(&url)?;
    value.to_str().ok().map(str::to_string)
  }

  async fn get(
    &self,
    url: &str,
    referer: Option<&str>,
    timeout: Duration,
  ) -> Result<String> {
    let mut request = self.client.get(url).timeout(timeout);
    if let Some(referer) = referer {
      request = request.header(header::REFERER, referer);
    }

    let resp = request.send().await?.error_for_status()?;
    self.learn(&resp);

    Ok(resp.text().await?)
  }

  // the jar already holds response cookies, the cache only needs them
  // for the next run
  fn learn(&self, resp: &Response) {
    if self.cookie_path.is_none() {
      return;
    }

    let host = resp.url().host_str().unwrap_or_default();
    let learned: Vec<_> = resp
      .cookies()
      .map(|c| {
        StoredCookie::new(c.domain().unwrap_or(host), c.name(), c.value())
      })
      .collect();

    let mut cache = self.cache();
    let changed = learned
      .into_iter()
      .fold(false, |changed, c| cache.insert(c) || changed);
    if changed {
      self.persist(&cache);
    }
  }

  fn remember(&self, fresh: impl IntoIterator<Item = StoredCookie>) {
    let mut cache = self.cache();
    let mut changed = false;
    for cookie in fresh {
      cookies::install(&self.jar, &cookie);
      changed |= cache.insert(cookie);
    }

    if changed {
      self.persist(&cache);
    }
  }

  // the cache is best effort, a panic elsewhere must not disable it
  fn cache(&self) -> MutexGuard<'_, CookieCache> {
    self.cache.lock().unwrap_or_else(PoisonError::into_inner)
  }

  fn persist(&self, cache: &CookieCache) {
    let Some(path) = &self.cookie_path else {
      return;
    };

    match cache.save(path) {
      Ok(()) => debug!("saved {} cookies to {}", cache.len(), path.display()),
      Err(e) => warn!("could not save cookies to {}: {e}", path.display()),
    }
  }
}

#[async_trait]
impl Fetch for Session {
  async fn fetch_text(&self, url: &str, referer: &str) -> Result<String> {
    self.get(url, Some(referer), MANIFEST_TIMEOUT).await
  }
}

pub fn is_age_gate(html: &str) -> bool {
  AGE_GATE_MARKERS.iter().any(|marker| html.contains(marker))
}
