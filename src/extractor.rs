mod metadata;

use std::collections::HashSet;

use futures::{stream, StreamExt};
use tracing::{debug, info, warn};
use url::Url;

use crate::{
  decipher::decipher,
  format::{Rendition, VideoInfo},
  manifest, page,
  session::Fetch,
  util::height_from_label,
  Error, Result,
};

pub use metadata::{Candidate, Metadata, VideoModel};

pub const DEFAULT_CONCURRENCY: usize = 4;

/// Turns the metadata of a video page into its playable formats.
///
/// Each candidate url is deciphered and deduplicated; manifests are
/// expanded into their variants, up to `concurrency` at a time, while
/// the result keeps page order. A candidate that cannot be deciphered
/// or whose manifest cannot be fetched is skipped.
pub async fn extract(
  page_url: &str,
  metadata: &Metadata,
  fetcher: &dyn Fetch,
  concurrency: usize,
) -> Result<VideoInfo> {
  let id = page::video_id(page_url)?;
  let video = metadata.video_model.as_ref().ok_or(Error::NoMetadata)?;

  let mut seen = HashSet::new();
  let mut candidates = Vec::new();
  for mut candidate in metadata.candidates() {
    match decipher(&candidate.url) {
      Ok(url) => candidate.url = url,
      Err(e) => {
        warn!("dropping format {}: {e}", candidate.format_id);
        continue;
      }
    }

    if seen.insert(candidate.url.clone()) {
      candidates.push(candidate);
    } else {
      debug!("duplicate url for {}", candidate.format_id);
    }
  }

  let resolved: Vec<Vec<Rendition>> = stream::iter(candidates)
    .map(|candidate| resolve(candidate, page_url, fetcher))
    .buffered(concurrency.max(1))
    .collect()
    .await;

  let mut seen = HashSet::new();
  let formats: Vec<Rendition> = resolved
    .into_iter()
    .flatten()
    .filter(|rendition| seen.insert(rendition.url.clone()))
    .collect();

  if formats.is_empty() {
    return Err(Error::NoFormats);
  }
  info!("found {} formats for {id}", formats.len());

  Ok(VideoInfo {
    title: video.title.clone().unwrap_or_else(|| format!("xhamster-{id}")),
    thumbnail: video.thumb_url.clone(),
    id,
    formats,
  })
}

async fn resolve(
  candidate: Candidate,
  referer: &str,
  fetcher: &dyn Fetch,
) -> Vec<Rendition> {
  if !is_manifest(&candidate.url) {
    return vec![direct(candidate)];
  }

  let base = match Url::parse(&candidate.url) {
    Ok(base) => base,
    Err(e) => {
      warn!("bad manifest url {}: {e}", candidate.url);
      return vec![];
    }
  };

  match fetcher.fetch_text(&candidate.url, referer).await {
    Ok(text) => {
      let variants = manifest::enumerate(&text, &base);
      debug!("{} lists {} variants", candidate.format_id, variants.len());
      variants
    }
    Err(e) => {
      warn!("dropping format {}: {e}", candidate.format_id);
      vec![]
    }
  }
}

fn is_manifest(url: &str) -> bool {
  Url::parse(url)
    .map(|url| url.path().ends_with(".m3u8"))
    .unwrap_or(false)
}

fn direct(candidate: Candidate) -> Rendition {
  Rendition {
    height: height_from_label(&candidate.format_id),
    quality: candidate.quality,
    ..Rendition::direct(candidate.url, candidate.format_id)
  }
}

#[cfg(test)]
mod test {
  use std::{collections::HashMap, sync::Mutex};

  use async_trait::async_trait;

  use super::*;
  use crate::format::ProtocolKind;

  const PAGE_URL: &str = "https://xhamster.com/videos/some-title-xh1a2b3";

  // deciphers to https://cdn.example.com/hls/master/index.m3u8
  const OBFUSCATED_MASTER: &str =
    "https://cdn.example.com/06eb32a4f8650cb935631d70deb639/index.m3u8";

  const MASTER: &str = "#EXTM3U\n\
    #EXT-X-STREAM-INF:BANDWIDTH=5000000,RESOLUTION=1920x1080\n\
    1080/index.m3u8\n\
    #EXT-X-STREAM-INF:BANDWIDTH=2000000,RESOLUTION=1280x720\n\
    720/index.m3u8\n";

  #[derive(Default)]
  struct MockFetch {
    responses: HashMap<String, String>,
    calls: Mutex<Vec<(String, String)>>,
  }

  impl MockFetch {
    fn with(mut self, url: &str, body: &str) -> Self {
      self.responses.insert(url.to_string(), body.to_string());
      self
    }

    fn calls(&self) -> Vec<(String, String)> {
      self.calls.lock().unwrap().clone()
    }
  }

  #[async_trait]
  impl Fetch for MockFetch {
    async fn fetch_text(&self, url: &str, referer: &str) -> Result<String> {
      self
        .calls
        .lock()
        .unwrap()
        .push((url.to_string(), referer.to_string()));

      self.responses.get(url).cloned().ok_or_else(|| {
        Error::IO(std::io::Error::new(std::io::ErrorKind::NotFound, "404"))
      })
    }
  }

  fn metadata(json: &str) -> Metadata {
    serde_json::from_str(json).unwrap()
  }

  #[tokio::test]
  async fn test_extract_full_page() {
    let metadata = metadata(&format!(
      r#"{{
        "videoModel": {{"thumbURL": "https://thumb.example.com/1.jpg", "title": "Some title"}},
        "xplayerSettings": {{"sources": {{
          "hls": {{"url": "{OBFUSCATED_MASTER}", "fallback": "https://cdn.example.com/hls/master/index.m3u8"}},
          "standard": {{
            "h264": [
              {{"url": "https://cdn.example.com/720.mp4", "fallback": "https://fb.example.com/720.mp4", "label": "720p"}},
              {{"url": "https://cdn.example.com/63000000000102030405/1080.mp4", "label": "1080p"}}
            ]
          }}
        }}}}
      }}"#
    ));
    let fetcher = MockFetch::default()
      .with("https://cdn.example.com/hls/master/index.m3u8", MASTER);

    let info = extract(PAGE_URL, &metadata, &fetcher, 2).await.unwrap();

    assert_eq!(info.id, "xh1a2b3");
    assert_eq!(info.title, "Some title");
    assert_eq!(
      info.thumbnail.as_deref(),
      Some("https://thumb.example.com/1.jpg")
    );

    let formats: Vec<_> = info
      .formats
      .iter()
      .map(|f| (f.format_id.as_str(), f.url.as_str(), f.protocol))
      .collect();
    assert_eq!(
      formats,
      vec![
        (
          "hls-1080p",
          "https://cdn.example.com/hls/master/1080/index.m3u8",
          ProtocolKind::AdaptiveSegment
        ),
        (
          "hls-720p",
          "https://cdn.example.com/hls/master/720/index.m3u8",
          ProtocolKind::AdaptiveSegment
        ),
        (
          "h264-720p",
          "https://cdn.example.com/720.mp4",
          ProtocolKind::Direct
        ),
        (
          "h264-720p-fb",
          "https://fb.example.com/720.mp4",
          ProtocolKind::Direct
        ),
      ]
    );

    assert_eq!(info.formats[2].height, Some(720));
    assert_eq!(info.formats[2].quality.as_deref(), Some("720p"));

    // the fallback deciphers to the same manifest, fetched only once
    assert_eq!(
      fetcher.calls(),
      vec![(
        "https://cdn.example.com/hls/master/index.m3u8".to_string(),
        PAGE_URL.to_string()
      )]
    );
  }

  #[tokio::test]
  async fn test_variants_deduplicated_across_manifests() {
    let metadata = metadata(
      r#"{
        "videoModel": {},
        "xplayerSettings": {"sources": {"hls": {
          "url": "https://a.example.com/hls/master.m3u8",
          "fallback": "https://a.example.com/hls/master.m3u8?backup=1"
        }}}
      }"#,
    );
    let fetcher = MockFetch::default()
      .with("https://a.example.com/hls/master.m3u8", MASTER)
      .with("https://a.example.com/hls/master.m3u8?backup=1", MASTER);

    let info = extract(PAGE_URL, &metadata, &fetcher, 4).await.unwrap();

    assert_eq!(info.title, "xhamster-xh1a2b3");
    assert_eq!(info.thumbnail, None);
    assert_eq!(info.formats.len(), 2);
    assert_eq!(fetcher.calls().len(), 2);
  }

  #[tokio::test]
  async fn test_failed_manifest_skipped() {
    let metadata = metadata(
      r#"{
        "videoModel": {},
        "xplayerSettings": {"sources": {
          "hls": {"url": "https://a.example.com/missing.m3u8"},
          "standard": {"h264": [{"url": "https://a.example.com/480.mp4", "label": "480p"}]}
        }}
      }"#,
    );

    let info = extract(PAGE_URL, &metadata, &MockFetch::default(), 1)
      .await
      .unwrap();

    assert_eq!(info.formats.len(), 1);
    assert_eq!(info.formats[0].format_id, "h264-480p");
    assert_eq!(info.formats[0].height, Some(480));
  }

  #[tokio::test]
  async fn test_manifest_url_with_query() {
    let metadata = metadata(
      r#"{
        "videoModel": {},
        "xplayerSettings": {"sources": {"hls": {
          "url": "https://a.example.com/hls/master.m3u8?token=abc"
        }}}
      }"#,
    );
    let fetcher = MockFetch::default()
      .with("https://a.example.com/hls/master.m3u8?token=abc", MASTER);

    let info = extract(PAGE_URL, &metadata, &fetcher, 0).await.unwrap();
    assert_eq!(info.formats[0].url, "https://a.example.com/hls/1080/index.m3u8");
  }

  #[tokio::test]
  async fn test_protocol_relative_source_kept() {
    let metadata = metadata(
      r#"{
        "videoModel": {"title": 7},
        "xplayerSettings": {"sources": {"standard": {"h264": [
          {"url": "//cdn.example.com/videos/720p.mp4", "label": "720p"}
        ]}}}
      }"#,
    );

    let info = extract(PAGE_URL, &metadata, &MockFetch::default(), 1)
      .await
      .unwrap();

    assert_eq!(info.title, "xhamster-xh1a2b3");
    assert_eq!(info.formats.len(), 1);
    assert_eq!(info.formats[0].url, "//cdn.example.com/videos/720p.mp4");
    assert_eq!(info.formats[0].height, Some(720));
  }

  #[tokio::test]
  async fn test_no_video_model() {
    let metadata = metadata(r#"{"xplayerSettings": {}}"#);
    let result = extract(PAGE_URL, &metadata, &MockFetch::default(), 1).await;
    assert!(matches!(result, Err(Error::NoMetadata)));
  }

  #[tokio::test]
  async fn test_no_formats() {
    let metadata = metadata(
      r#"{
        "videoModel": {},
        "xplayerSettings": {"sources": {"standard": {"h264": [
          {"url": "https://cdn.example.com/63000000000102030405/1080.mp4", "label": "1080p"},
          {"url": "", "label": "720p"}
        ]}}}
      }"#,
    );
    let result = extract(PAGE_URL, &metadata, &MockFetch::default(), 1).await;
    assert!(matches!(result, Err(Error::NoFormats)));
  }

  #[tokio::test]
  async fn test_unsupported_page_url() {
    let metadata = metadata(r#"{"videoModel": {}}"#);
    let result = extract(
      "https://example.com/videos/a-1",
      &metadata,
      &MockFetch::default(),
      1,
    )
    .await;
    assert!(matches!(result, Err(Error::UnsupportedURL(..))));
  }
}
