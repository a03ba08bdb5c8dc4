use std::{
  path::{Path, PathBuf},
  process::Stdio,
};

use itertools::Itertools;
use tokio::process::Command;
use tracing::info;

use crate::{session::USER_AGENT, util::sanitize_filename, Error, Result};

pub const DEFAULT_FFMPEG: &str = "ffmpeg";

// lines of ffmpeg's stderr kept in the error
const STDERR_TAIL: usize = 5;

pub fn default_output(title: &str) -> PathBuf {
  PathBuf::from(format!("{}.mp4", sanitize_filename(title)))
}

/// Request headers in ffmpeg's `-headers` format. The cdn wants at
/// least a referer.
pub fn header_block(cookie: Option<&str>, referer: Option<&str>) -> String {
  [
    Some(("User-Agent", USER_AGENT)),
    cookie.map(|c| ("Cookie", c)),
    referer.map(|r| ("Referer", r)),
  ]
  .into_iter()
  .flatten()
  .map(|(name, value)| format!("{name}: {value}\r\n"))
  .join("")
}

/// Remuxes `media_url` into `output` without re-encoding.
pub async fn ffmpeg(
  ffmpeg: &str,
  media_url: &str,
  output: &Path,
  headers: &str,
) -> Result<()> {
  info!("running {ffmpeg} for {}", output.display());

  let result = Command::new(ffmpeg)
    .arg("-headers")
    .arg(headers)
    .arg("-i")
    .arg(media_url)
    .args(["-c", "copy", "-bsf:a", "aac_adtstoasc"])
    .arg(output)
    .stdin(Stdio::null())
    .stdout(Stdio::null())
    .stderr(Stdio::piped())
    .output()
    .await?;

  if !result.status.success() {
    let stderr = String::from_utf8_lossy(&result.stderr);
    let lines: Vec<_> = stderr.lines().collect();
    let tail = lines[lines.len().saturating_sub(STDERR_TAIL)..].join("\n");
    return Err(Error::Ffmpeg(format!("{}: {tail}", result.status)));
  }

  info!("saved {}", output.display());
  Ok(())
}
