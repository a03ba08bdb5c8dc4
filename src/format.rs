use serde::Serialize;

use crate::util::first_integer;

pub const DEFAULT_CONTAINER: &str = "mp4";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtocolKind {
  Direct,
  /// A variant playlist of an adaptive (m3u8) manifest.
  AdaptiveSegment,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Rendition {
  pub url: String,
  pub format_id: String,
  pub container: String,
  pub protocol: ProtocolKind,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub height: Option<u32>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub bitrate_kbps: Option<u64>,
  /// Label text shown on the page, e.g. `720p`.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub quality: Option<String>,
}

impl Rendition {
  pub fn direct(url: String, format_id: String) -> Self {
    Self {
      url,
      format_id,
      container: DEFAULT_CONTAINER.to_string(),
      protocol: ProtocolKind::Direct,
      height: None,
      bitrate_kbps: None,
      quality: None,
    }
  }

  /// Ranks renditions against each other: any height beats any
  /// bitrate, any bitrate beats a number read from the label (or the
  /// format id when there is no label).
  pub fn score(&self) -> Score {
    if let Some(height) = self.height {
      return Score::Height(height);
    }
    if let Some(kbps) = self.bitrate_kbps {
      return Score::Bitrate(kbps);
    }

    let label = self.quality.as_deref().unwrap_or(&self.format_id);
    Score::Label(first_integer(label).unwrap_or(0))
  }
}

// variant order is the tier order
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Score {
  Label(u64),
  Bitrate(u64),
  Height(u32),
}

#[derive(Clone, Debug, Serialize)]
pub struct VideoInfo {
  pub id: String,
  pub title: String,
  pub thumbnail: Option<String>,
  pub formats: Vec<Rendition>,
}

/// Returns the highest scored rendition, the earliest one on ties.
pub fn select_best(renditions: &[Rendition]) -> Option<&Rendition> {
  renditions.iter().fold(None, |best, r| match best {
    Some(b) if b.score() >= r.score() => Some(b),
    _ => Some(r),
  })
}
