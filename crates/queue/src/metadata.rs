//! Request metadata as reported by the engine

use indexmap::IndexMap;
use serde::Serialize;
use std::path::PathBuf;

/// Ordered `key -> value` pairs from `key="value"` lines
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Metadata {
    fields: IndexMap<String, String>,
}

impl Metadata {
    /// Parse a metadata payload. Lines that are not `key="value"` are
    /// skipped; a repeated key keeps its first position and last value.
    pub fn parse(payload: &str) -> Self {
        let mut fields = IndexMap::new();
        for line in payload.lines() {
            let line = line.trim_end_matches('\r');
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let key = key.trim();
            let Some(quoted) = value
                .trim()
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
            else {
                continue;
            };
            if key.is_empty() {
                continue;
            }
            fields.insert(key.to_string(), unescape(quoted));
        }
        Self { fields }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Track path: `filename`, falling back to `initial_uri`
    pub fn path(&self) -> Option<PathBuf> {
        self.get("filename")
            .or_else(|| self.get("initial_uri"))
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
    }
}

fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some(next @ ('"' | '\\')) => out.push(next),
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "rid=\"3\"\nstatus=\"playing\"\nfilename=\"/music/Night \\\"Drive\\\".flac\"\ninitial_uri=\"/music/night.flac\"\ntitle=\"a = b\"";

    #[test]
    fn test_parse_keeps_order_and_unescapes() {
        let metadata = Metadata::parse(SAMPLE);
        let keys: Vec<&str> = metadata.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["rid", "status", "filename", "initial_uri", "title"]);
        assert_eq!(metadata.get("filename"), Some("/music/Night \"Drive\".flac"));
        assert_eq!(metadata.get("title"), Some("a = b"));
    }

    #[test]
    fn test_path_falls_back_to_initial_uri() {
        let metadata = Metadata::parse("rid=\"4\"\ninitial_uri=\"/music/b.ogg\"");
        assert_eq!(metadata.path(), Some(PathBuf::from("/music/b.ogg")));

        let metadata = Metadata::parse("rid=\"4\"");
        assert_eq!(metadata.path(), None);
    }

    #[test]
    fn test_skips_malformed_lines() {
        let metadata = Metadata::parse("garbage\nkey=unquoted\n=\"x\"\nok=\"yes\"\r\n");
        assert_eq!(metadata.len(), 1);
        assert_eq!(metadata.get("ok"), Some("yes"));
    }
}
