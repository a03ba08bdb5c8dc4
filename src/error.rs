use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum Error {
  #[error("unknown keystream algorithm: {0}")]
  UnknownAlgorithm(u8),
  #[error("no metadata found in page")]
  NoMetadata,
  #[error("no playable formats found")]
  NoFormats,
  #[error("video unavailable: {0}")]
  ClosedVideo(String),
  #[error("unsupported url {0}: {1}")]
  UnsupportedURL(String, &'static str),
  #[error("invalid html: {0}")]
  InvalidHTML(&'static str),
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),
  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),
  #[error("invalid url: {0}")]
  Url(#[from] url::ParseError),
  #[error("io error: {0}")]
  IO(#[from] std::io::Error),
  #[error("ffmpeg failed: {0}")]
  Ffmpeg(String),
}
