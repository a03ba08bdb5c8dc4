use std::path::PathBuf;

use clap::Parser;
use xh_extract::{
  download::DEFAULT_FFMPEG, extractor::DEFAULT_CONCURRENCY,
  session::SessionConfig,
};

/// Extract the formats of an xHamster video and save the best one.
#[derive(Debug, Clone, Parser)]
#[command(version, about)]
pub struct Args {
  /// Video page url.
  #[arg(required = true)]
  pub url: String,

  /// Output file. Defaults to the video title with an .mp4 extension.
  #[arg(short, long)]
  pub output: Option<PathBuf>,

  /// JSON file cookies are loaded from and saved to between runs.
  #[arg(long, env = "XH_COOKIES", value_name = "PATH")]
  pub cookies: Option<PathBuf>,

  /// Proxy for every request, e.g. socks5://127.0.0.1:1080.
  #[arg(long, env = "XH_PROXY", value_name = "URL")]
  pub proxy: Option<String>,

  /// Manifests fetched at the same time.
  #[arg(long, env = "XH_CONCURRENCY", default_value_t = DEFAULT_CONCURRENCY)]
  pub concurrency: usize,

  /// Print the formats without downloading.
  #[arg(long)]
  pub no_download: bool,

  #[arg(long, env = "XH_FFMPEG", default_value = DEFAULT_FFMPEG)]
  pub ffmpeg: String,
}

impl Args {
  pub fn session_config(&self) -> SessionConfig {
    SessionConfig {
      proxy: self.proxy.clone(),
      cookie_path: self.cookies.clone(),
    }
  }
}
