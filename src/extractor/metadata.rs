use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// The `window.initials` blob embedded in a video page.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
  pub video_model: Option<VideoModel>,
  pub xplayer_settings: Option<XplayerSettings>,
}

#[derive(Debug, Default, Deserialize)]
pub struct VideoModel {
  #[serde(rename = "thumbURL", default, deserialize_with = "non_empty_string")]
  pub thumb_url: Option<String>,
  #[serde(default, deserialize_with = "non_empty_string")]
  pub title: Option<String>,
}

// anything but a non-empty string reads as missing
fn non_empty_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
  D: Deserializer<'de>,
{
  Ok(match Value::deserialize(deserializer)? {
    Value::String(s) if !s.is_empty() => Some(s),
    _ => None,
  })
}

#[derive(Debug, Default, Deserialize)]
pub struct XplayerSettings {
  pub sources: Option<Sources>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Sources {
  pub hls: Option<HlsSource>,
  /// Codec name (`h264`, `av1`, ..) to a list of progressive sources.
  pub standard: Option<Map<String, Value>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct HlsSource {
  pub url: Option<String>,
  pub fallback: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StandardSource {
  pub url: Option<String>,
  pub fallback: Option<String>,
  pub label: Option<Value>,
  pub quality: Option<Value>,
}

impl StandardSource {
  pub fn label(&self) -> String {
    [&self.label, &self.quality]
      .into_iter()
      .flatten()
      .find_map(label_text)
      .unwrap_or_default()
  }
}

// empty strings, zero and false count as missing
fn label_text(value: &Value) -> Option<String> {
  match value {
    Value::String(s) if !s.is_empty() => Some(s.clone()),
    Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
    Value::Bool(true) => Some("true".to_string()),
    _ => None,
  }
}

/// A media url found in the metadata, before deciphering.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Candidate {
  pub url: String,
  pub format_id: String,
  pub quality: Option<String>,
}

impl Metadata {
  /// Every media url in page order: hls first, then each standard
  /// source with its fallback.
  pub fn candidates(&self) -> Vec<Candidate> {
    let Some(sources) = self
      .xplayer_settings
      .as_ref()
      .and_then(|s| s.sources.as_ref())
    else {
      return Vec::new();
    };

    let mut candidates = Vec::new();
    let mut push = |url: &Option<String>, format_id: String, quality| {
      match url.as_deref() {
        Some(url) if !url.is_empty() => candidates.push(Candidate {
          url: url.to_string(),
          format_id,
          quality,
        }),
        _ => (),
      }
    };

    if let Some(hls) = &sources.hls {
      push(&hls.url, "hls-url".to_string(), None);
      push(&hls.fallback, "hls-fallback".to_string(), None);
    }

    for (ident, list) in sources.standard.iter().flatten() {
      let Value::Array(entries) = list else {
        continue;
      };

      for entry in entries {
        let Ok(source) = StandardSource::deserialize(entry) else {
          tracing::debug!("skipping malformed {ident} source: {entry}");
          continue;
        };

        let label = source.label();
        let quality = (!label.is_empty()).then(|| label.clone());
        push(&source.url, format!("{ident}-{label}"), quality.clone());
        push(&source.fallback, format!("{ident}-{label}-fb"), quality);
      }
    }

    candidates
  }
}
