use once_cell::sync::Lazy;
use regex::Regex;

static DIGITS_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());

static HEIGHT_REGEX: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"(\d{3,4})p").unwrap());

static WHITESPACE_REGEX: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"\s+").unwrap());

static FILENAME_RESERVED_REGEX: Lazy<Regex> =
  Lazy::new(|| Regex::new(r#"[<>:"/\\|?*]"#).unwrap());

// a run too long for u64 counts as no number at all
pub fn first_integer(text: &str) -> Option<u64> {
  DIGITS_REGEX.find(text)?.as_str().parse().ok()
}

/// Reads `720` out of labels like `h264-720p`.
pub fn height_from_label(text: &str) -> Option<u32> {
  HEIGHT_REGEX.captures(text)?[1].parse().ok()
}

pub fn collapse_whitespace(text: &str) -> String {
  WHITESPACE_REGEX.replace_all(text, " ").trim().to_string()
}

pub fn sanitize_filename(name: &str) -> String {
  FILENAME_RESERVED_REGEX.replace_all(name, "_").into_owned()
}
