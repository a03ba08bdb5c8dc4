use once_cell::sync::Lazy;
use regex::Regex;

use crate::{extractor::Metadata, util::collapse_whitespace, Error, Result};

static VIDEO_URL_REGEX: Lazy<Regex> = Lazy::new(|| {
  Regex::new(
    r"(?ix)
    ^https?://(?:[^/]+\.)?
    (?:xhamster\.(?:com|one|desi)|xhms\.pro|xhamster\d+\.(?:com|desi)|xhday\.com|xhvid\.com)/
    (?:
      movies/(?P<id>[0-9a-z]+)/[^/]+\.html
      |
      videos/[^/]+-(?P<id2>[0-9a-z]+)
    )",
  )
  .unwrap()
});

static INITIALS_REGEX: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"window\.initials\s*=\s*(\{.+?\})\s*;").unwrap());

const CLOSED_NOTICE_ID: &str = "videoClosed";

pub fn video_id(url: &str) -> Result<String> {
  let caps = VIDEO_URL_REGEX
    .captures(url)
    .ok_or_else(|| Error::UnsupportedURL(url.into(), "not a video page"))?;

  caps
    .name("id")
    .or_else(|| caps.name("id2"))
    .map(|m| m.as_str().to_string())
    .ok_or_else(|| Error::UnsupportedURL(url.into(), "video id not found"))
}

/// Checks a downloaded page for the closed-video notice, then reads the
/// embedded `window.initials` blob.
pub fn inspect(html: &str) -> Result<Metadata> {
  if let Some(message) = closed_notice(html)? {
    return Err(Error::ClosedVideo(message));
  }

  metadata(html)
}

pub fn closed_notice(html: &str) -> Result<Option<String>> {
  let dom = tl::parse(html, tl::ParserOptions::default().track_ids())
    .map_err(|_| Error::InvalidHTML("page"))?;
  let parser = dom.parser();

  let Some(node) = dom.get_element_by_id(CLOSED_NOTICE_ID) else {
    return Ok(None);
  };

  let tag = node
    .get(parser)
    .expect("queried node must be within dom")
    .as_tag()
    .ok_or(Error::InvalidHTML("#videoClosed"))?;

  if !tag.name().as_utf8_str().eq_ignore_ascii_case("div") {
    return Ok(None);
  }

  let message = collapse_whitespace(&tag.inner_text(parser));
  Ok((!message.is_empty()).then_some(message))
}

pub fn metadata(html: &str) -> Result<Metadata> {
  let caps = INITIALS_REGEX.captures(html).ok_or(Error::NoMetadata)?;
  Ok(serde_json::from_str(&caps[1])?)
}
