//! URL checks for URL-bearing attributes, including `srcset` candidate lists.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Query parameter reserved for the runtime's CORS handshake. A bound URL
/// must never carry it.
pub const SOURCE_ORIGIN_MARKER: &str = "__amp_source_origin";

static SCHEME: Lazy<Regex> = Lazy::new(|| compile(r"^([^:/?#.]+):[\s\S]*$"));

static SRCSET_CANDIDATE: Lazy<Regex> =
    Lazy::new(|| compile(r"(\S+)(?:\s+(?:(-?\d+(?:\.\d+)?)([a-zA-Z]*)))?\s*(?:,|$)"));

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid pattern {:?}: {}", pattern, e))
}

/// The explicit scheme of `url`, lower-cased. Relative URLs have none.
pub fn scheme(url: &str) -> Option<String> {
    SCHEME
        .captures(url)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim_start().to_ascii_lowercase())
}

/// Whether `url` may be bound given the allowed schemes, if any.
pub fn is_url_allowed(url: &str, allowed_protocols: Option<&[&str]>) -> bool {
    if url.is_empty() {
        return true;
    }
    if url.contains(SOURCE_ORIGIN_MARKER) {
        return false;
    }
    match (allowed_protocols, scheme(url)) {
        (Some(allowed), Some(scheme)) => allowed.contains(&scheme.as_str()),
        _ => true,
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SrcsetError {
    #[error("Srcset must have at least one source")]
    Empty,
    #[error("Srcset must have width or dpr sources: {0}")]
    MixedDescriptors(String),
    #[error("Duplicate width or dpr in srcset: {0}")]
    Duplicate(String),
}

/// One `srcset` candidate with its descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct SrcsetSource {
    pub url: String,
    pub width: Option<u32>,
    pub dpr: Option<f64>,
}

/// A parsed `srcset` attribute value.
#[derive(Debug, Clone, PartialEq)]
pub struct Srcset {
    sources: Vec<SrcsetSource>,
}

impl Srcset {
    /// Parses a comma-separated candidate list. A candidate without a
    /// descriptor means `1x`; candidates with an unknown descriptor unit are
    /// skipped.
    pub fn parse(input: &str) -> Result<Srcset, SrcsetError> {
        let mut sources = Vec::new();
        for captures in SRCSET_CANDIDATE.captures_iter(input) {
            let url = captures[1].to_string();
            let (width, dpr) = match (captures.get(2), captures.get(3)) {
                (Some(number), unit) => {
                    match unit.map_or("", |u| u.as_str()).to_ascii_lowercase().as_str() {
                        "w" => (Some(number.as_str().parse::<f64>().unwrap_or(0.0) as u32), None),
                        "x" => (None, number.as_str().parse::<f64>().ok()),
                        _ => continue,
                    }
                }
                (None, _) => (None, Some(1.0)),
            };
            sources.push(SrcsetSource { url, width, dpr });
        }

        if sources.is_empty() {
            return Err(SrcsetError::Empty);
        }
        let widths = sources.iter().filter(|s| s.width.is_some()).count();
        let dprs = sources.iter().filter(|s| s.dpr.is_some()).count();
        if widths != sources.len() && dprs != sources.len() {
            return Err(SrcsetError::MixedDescriptors(input.to_string()));
        }

        let mut descriptors: Vec<String> = sources
            .iter()
            .map(|s| match (s.width, s.dpr) {
                (Some(w), _) => format!("{}w", w),
                (_, Some(x)) => format!("{}x", x),
                _ => String::new(),
            })
            .collect();
        descriptors.sort();
        if let Some(pair) = descriptors.windows(2).find(|pair| pair[0] == pair[1]) {
            return Err(SrcsetError::Duplicate(pair[0].clone()));
        }

        Ok(Srcset { sources })
    }

    pub fn sources(&self) -> &[SrcsetSource] {
        &self.sources
    }

    pub fn urls(&self) -> impl Iterator<Item = &str> {
        self.sources.iter().map(|s| s.url.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_scheme() {
        assert_eq!(scheme("https://example.com"), Some("https".to_string()));
        assert_eq!(scheme("JavaScript:alert(1)"), Some("javascript".to_string()));
        assert_eq!(scheme("/relative/path"), None);
        assert_eq!(scheme("image.png"), None);
        assert_eq!(scheme("?q=a:b"), None);
    }

    #[test]
    fn test_url_allowed() {
        let allowed: &[&str] = &["http", "https"];
        assert!(is_url_allowed("https://a.b/c", Some(allowed)));
        assert!(is_url_allowed("relative.html", Some(allowed)));
        assert!(!is_url_allowed("javascript:alert(1)", Some(allowed)));
        assert!(is_url_allowed("javascript:alert(1)", None));
        assert!(!is_url_allowed("https://a.b/?__amp_source_origin=x", Some(allowed)));
        assert!(!is_url_allowed("/x?__amp_source_origin=1", None));
    }

    #[test]
    fn test_srcset_dpr() {
        let srcset = Srcset::parse("a.jpg, b.jpg 2x").unwrap();
        assert_eq!(srcset.urls().collect::<Vec<_>>(), vec!["a.jpg", "b.jpg"]);
        assert_eq!(srcset.sources()[0].dpr, Some(1.0));
        assert_eq!(srcset.sources()[1].dpr, Some(2.0));
    }

    #[test]
    fn test_srcset_width() {
        let srcset = Srcset::parse("small.jpg 320w,  large.jpg 1024W").unwrap();
        assert_eq!(srcset.sources()[1].width, Some(1024));
        assert_eq!(srcset.urls().count(), 2);
    }

    #[test]
    fn test_srcset_errors() {
        assert_eq!(Srcset::parse("   "), Err(SrcsetError::Empty));
        assert!(matches!(
            Srcset::parse("a.jpg 100w, b.jpg 2x"),
            Err(SrcsetError::MixedDescriptors(_))
        ));
        assert!(matches!(
            Srcset::parse("a.jpg 1x, b.jpg"),
            Err(SrcsetError::Duplicate(_))
        ));
    }
}
