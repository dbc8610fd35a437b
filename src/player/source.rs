use std::fmt;
use std::path::PathBuf;

/// What the parent asked us to play.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaSource {
  /// A file on disk, played directly.
  File(PathBuf),
  /// A network location whose playable sub-item must be resolved first.
  Stream(String),
}

impl MediaSource {
  /// Classify a raw command-line argument.
  ///
  /// Anything of the form `scheme://...` is a stream except `file://`.
  /// Windows drive paths (`C:\...`) never contain `://` and stay files.
  pub fn parse(raw: &str) -> Self {
    match raw.split_once("://") {
      Some((scheme, rest)) if is_scheme(scheme) && !rest.is_empty() => {
        if scheme.eq_ignore_ascii_case("file") {
          MediaSource::File(PathBuf::from(raw))
        } else {
          MediaSource::Stream(raw.to_string())
        }
      }
      _ => MediaSource::File(PathBuf::from(raw)),
    }
  }

  pub fn is_stream(&self) -> bool {
    matches!(self, MediaSource::Stream(_))
  }

  /// The location handed to the engine (before any resolution).
  pub fn location(&self) -> String {
    match self {
      MediaSource::File(path) => path.to_string_lossy().into_owned(),
      MediaSource::Stream(url) => url.clone(),
    }
  }
}

impl fmt::Display for MediaSource {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      MediaSource::File(path) => write!(f, "file {}", path.display()),
      MediaSource::Stream(url) => write!(f, "stream {}", url),
    }
  }
}

// RFC 3986: ALPHA *( ALPHA / DIGIT / "+" / "-" / "." )
fn is_scheme(s: &str) -> bool {
  let mut chars = s.chars();
  match chars.next() {
    Some(c) if c.is_ascii_alphabetic() => {}
    _ => return false,
  }
  s.len() > 1 && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}
