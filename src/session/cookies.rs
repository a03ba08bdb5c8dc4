use std::path::Path;

use cookie::Cookie;
use reqwest::cookie::Jar;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::Result;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCookie {
  pub domain: String,
  pub name: String,
  pub value: String,
}

impl StoredCookie {
  pub fn new(
    domain: impl Into<String>,
    name: impl Into<String>,
    value: impl Into<String>,
  ) -> Self {
    Self {
      domain: domain.into().trim_start_matches('.').to_string(),
      name: name.into(),
      value: value.into(),
    }
  }

  fn set_cookie_str(&self) -> String {
    Cookie::build((self.name.as_str(), self.value.as_str()))
      .domain(self.domain.as_str())
      .path("/")
      .build()
      .to_string()
  }

  fn origin(&self) -> Option<Url> {
    Url::parse(&format!("https://{}/", self.domain)).ok()
  }
}

/// Cookies kept across runs, stored as a json list.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CookieCache {
  cookies: Vec<StoredCookie>,
}

impl CookieCache {
  /// A missing file is an empty cache.
  pub fn load(path: &Path) -> Result<Self> {
    if !path.exists() {
      return Ok(Self::default());
    }

    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
  }

  pub fn save(&self, path: &Path) -> Result<()> {
    let content = serde_json::to_string_pretty(self)?;
    std::fs::write(path, content)?;
    Ok(())
  }

  /// Adds or replaces the cookie with the same domain and name.
  /// Returns whether the cache changed.
  pub fn insert(&mut self, cookie: StoredCookie) -> bool {
    let existing = self
      .cookies
      .iter_mut()
      .find(|c| c.domain == cookie.domain && c.name == cookie.name);

    match existing {
      Some(c) if c.value == cookie.value => false,
      Some(c) => {
        c.value = cookie.value;
        true
      }
      None => {
        self.cookies.push(cookie);
        true
      }
    }
  }

  pub fn install(&self, jar: &Jar) {
    for cookie in &self.cookies {
      install(jar, cookie);
    }
  }

  pub fn len(&self) -> usize {
    self.cookies.len()
  }

  pub fn is_empty(&self) -> bool {
    self.cookies.is_empty()
  }
}

pub fn install(jar: &Jar, cookie: &StoredCookie) {
  match cookie.origin() {
    Some(origin) => jar.add_cookie_str(&cookie.set_cookie_str(), &origin),
    None => tracing::debug!("ignoring cookie for bad domain {}", cookie.domain),
  }
}
