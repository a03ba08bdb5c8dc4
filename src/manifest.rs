use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::format::{ProtocolKind, Rendition, DEFAULT_CONTAINER};

const STREAM_INF: &str = "#EXT-X-STREAM-INF:";

static ATTRIBUTE_REGEX: Lazy<Regex> =
  Lazy::new(|| Regex::new(r#"([A-Z0-9-]+)=("[^"]+"|[^,"]+)"#).unwrap());

/// Lists the variant streams of a master m3u8 playlist.
///
/// Unknown attributes are ignored. A `#EXT-X-STREAM-INF` with no uri
/// before the next one (or the end of input) yields nothing.
pub fn enumerate(manifest: &str, base: &Url) -> Vec<Rendition> {
  let mut renditions = Vec::new();
  let mut pending: Option<HashMap<&str, &str>> = None;

  for line in manifest.lines().map(str::trim) {
    if let Some(attrs) = line.strip_prefix(STREAM_INF) {
      pending = Some(parse_attributes(attrs));
      continue;
    }

    if line.is_empty() || line.starts_with('#') {
      continue;
    }

    let Some(attrs) = pending.take() else {
      continue;
    };

    match base.join(line) {
      Ok(url) => renditions.push(variant(url.into(), &attrs)),
      Err(e) => tracing::warn!("skipping variant uri {line:?}: {e}"),
    }
  }

  renditions
}

fn parse_attributes(attrs: &str) -> HashMap<&str, &str> {
  ATTRIBUTE_REGEX
    .captures_iter(attrs)
    .filter_map(|caps| {
      let key = caps.get(1)?.as_str();
      let value = caps.get(2)?.as_str().trim_matches('"');
      Some((key, value))
    })
    .collect()
}

fn variant(url: String, attrs: &HashMap<&str, &str>) -> Rendition {
  let height = attrs
    .get("RESOLUTION")
    .and_then(|res| res.split_once('x'))
    .and_then(|(_, h)| h.parse().ok());

  let bitrate_kbps = attrs
    .get("BANDWIDTH")
    .filter(|bw| !bw.is_empty() && bw.bytes().all(|b| b.is_ascii_digit()))
    .and_then(|bw| bw.parse::<u64>().ok())
    .map(|bps| bps / 1000);

  let format_id = match height {
    Some(h) => format!("hls-{h}p"),
    None => "hls-unk".to_string(),
  };

  Rendition {
    url,
    format_id,
    container: DEFAULT_CONTAINER.to_string(),
    protocol: ProtocolKind::AdaptiveSegment,
    height,
    bitrate_kbps,
    quality: None,
  }
}
