mod keystream;
mod word32;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::Result;

pub use keystream::{Algorithm, Keystream};
pub use word32::Word32;

// algorithm id (1 byte) + little-endian seed (4 bytes)
const HEADER_LEN: usize = 5;

// scheme and authority, path, then query and fragment (rfc 3986, appendix b)
static URL_PARTS_REGEX: Lazy<Regex> = Lazy::new(|| {
  Regex::new(
    r"(?s)^(?P<origin>(?:[a-zA-Z][a-zA-Z0-9+.-]*:)?(?://[^/?#]*)?)(?P<path>[^?#]*)(?P<tail>.*)$",
  )
  .unwrap()
});

static OBFUSCATED_PATH_REGEX: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"(?s)^/(?P<hex>[0-9a-fA-F]{12,})(?P<rest>[/,].*)?$").unwrap()
});

/// Reverses the per-link path obfuscation of a media url.
///
/// Only the path is rewritten; everything around it is kept byte for
/// byte, and relative urls work the same as absolute ones. Urls whose
/// path does not start with a long hex run are returned unchanged. The
/// only failure is an algorithm id nobody knows about.
pub fn decipher(url: &str) -> Result<String> {
  let Some(parts) = URL_PARTS_REGEX.captures(url) else {
    return Ok(url.to_string());
  };
  let Some(caps) = OBFUSCATED_PATH_REGEX.captures(&parts["path"]) else {
    return Ok(url.to_string());
  };

  let Ok(payload) = hex::decode(&caps["hex"]) else {
    tracing::debug!("odd-length hex path left as is: {url}");
    return Ok(url.to_string());
  };

  let plain = decipher_payload(&payload)?;
  let rest = caps.name("rest").map_or("", |m| m.as_str());

  Ok(format!("{}/{plain}{rest}{}", &parts["origin"], &parts["tail"]))
}

/// Decodes a raw payload: `[algorithm id][seed: i32 le][ciphertext..]`.
///
/// The plaintext is read as latin-1, one char per byte.
pub fn decipher_payload(payload: &[u8]) -> Result<String> {
  let mut header = [0u8; HEADER_LEN];
  let len = payload.len().min(HEADER_LEN);
  header[..len].copy_from_slice(&payload[..len]);

  let seed = i32::from_le_bytes([header[1], header[2], header[3], header[4]]);
  let mut stream = Keystream::new(header[0], seed)?;

  let ciphertext = payload.get(HEADER_LEN..).unwrap_or_default();
  let plain = stream
    .apply(ciphertext)
    .into_iter()
    .map(char::from)
    .collect();

  Ok(plain)
}
