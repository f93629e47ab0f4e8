use crate::{ENCODED_SLASH, ENCODED_TILDE, FRAGMENT_PREFIX, PATH_SEPARATOR, TILDE};
use percent_encoding::percent_decode_str;
use serde::Serialize;
use serde_json::Value;

/// An RFC-6901 style JSON pointer, rooted at `#`.
///
/// Segments are stored raw and escaped on formatting, so a path template
/// such as `/pet/{petId}` stays addressable and renders as
/// `#/paths/~1pet~1{petId}`.
#[derive(Debug, Clone, Serialize, Default, PartialEq, Eq)]
pub struct JsonPointer(pub Vec<String>);

impl JsonPointer {
    pub fn new() -> Self {
        JsonPointer(Vec::new())
    }

    pub fn add(&mut self, segment: impl AsRef<str>) -> &mut Self {
        self.0.push(segment.as_ref().to_owned());
        self
    }

    /// Returns a new pointer with `segment` appended, leaving `self` intact.
    pub fn child(&self, segment: impl AsRef<str>) -> Self {
        let mut child = self.clone();
        child.add(segment);
        child
    }

    /// Formats the pointer as a fragment string, e.g. `#/paths/~1pets/get`.
    /// The empty pointer formats as `#`.
    pub fn fragment(&self) -> String {
        if self.0.is_empty() {
            return FRAGMENT_PREFIX.to_string();
        }
        let mut fragment = String::from(FRAGMENT_PREFIX);
        for segment in &self.0 {
            fragment.push_str(PATH_SEPARATOR);
            fragment.push_str(&Self::escape(segment));
        }
        fragment
    }

    pub fn escape(segment: &str) -> String {
        if segment.contains(TILDE) || segment.contains(PATH_SEPARATOR) {
            segment
                .replace(TILDE, ENCODED_TILDE)
                .replace(PATH_SEPARATOR, ENCODED_SLASH)
        } else {
            segment.to_owned()
        }
    }

    /// Reverses [`JsonPointer::escape`], additionally percent-decoding the
    /// segment so refs copied out of URLs (`%7BpetId%7D`) still address the
    /// intended node.
    pub fn unescape(segment: &str) -> String {
        let decoded = percent_decode_str(segment)
            .decode_utf8()
            .map(|decoded| decoded.into_owned())
            .unwrap_or_else(|_| segment.to_owned());
        decoded
            .replace(ENCODED_SLASH, PATH_SEPARATOR)
            .replace(ENCODED_TILDE, TILDE)
    }

    /// Parses a fragment string (`#/a/b`, `#` or the empty string) into raw
    /// segments.
    pub fn parse_fragment(fragment: &str) -> Result<Vec<String>, String> {
        let body = fragment.strip_prefix(FRAGMENT_PREFIX).unwrap_or(fragment);
        if body.is_empty() {
            return Ok(Vec::new());
        }
        let Some(body) = body.strip_prefix(PATH_SEPARATOR) else {
            return Err(format!("fragment '{fragment}' must start with '#/'"));
        };
        Ok(body
            .split(PATH_SEPARATOR)
            .map(Self::unescape)
            .collect())
    }

    /// Walks `document` along `segments`, treating numeric segments as array
    /// indices. Returns `None` when any step is absent.
    pub fn lookup<'v>(document: &'v Value, segments: &[String]) -> Option<&'v Value> {
        let mut current = document;
        for segment in segments {
            current = match current {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::JsonPointer;
    use serde_json::json;

    #[test]
    fn test_empty_pointer_formats_as_root() {
        assert_eq!(JsonPointer::new().fragment(), "#");
    }

    #[test]
    fn test_fragment_escapes_slashes_and_tildes() {
        let mut pointer = JsonPointer::new();
        pointer.add("paths").add("/pet/{petId}").add("get");
        assert_eq!(pointer.fragment(), "#/paths/~1pet~1{petId}/get");

        let mut pointer = JsonPointer::new();
        pointer.add("definitions").add("odd~name");
        assert_eq!(pointer.fragment(), "#/definitions/odd~0name");
    }

    #[test]
    fn test_child_leaves_parent_untouched() {
        let mut parent = JsonPointer::new();
        parent.add("paths").add("/pets");
        let child = parent.child("get");
        assert_eq!(parent.fragment(), "#/paths/~1pets");
        assert_eq!(child.fragment(), "#/paths/~1pets/get");
    }

    #[test]
    fn test_parse_fragment_round_trip() {
        let segments = JsonPointer::parse_fragment("#/paths/~1pet~1{petId}/get").unwrap();
        assert_eq!(segments, vec!["paths", "/pet/{petId}", "get"]);

        let mut pointer = JsonPointer::new();
        for segment in &segments {
            pointer.add(segment);
        }
        assert_eq!(pointer.fragment(), "#/paths/~1pet~1{petId}/get");
    }

    #[test]
    fn test_parse_fragment_root_forms() {
        assert!(JsonPointer::parse_fragment("#").unwrap().is_empty());
        assert!(JsonPointer::parse_fragment("").unwrap().is_empty());
        assert!(JsonPointer::parse_fragment("#definitions").is_err());
    }

    #[test]
    fn test_unescape_percent_decodes() {
        assert_eq!(JsonPointer::unescape("%7BpetId%7D"), "{petId}");
        assert_eq!(JsonPointer::unescape("~1pets"), "/pets");
    }

    #[test]
    fn test_lookup_walks_objects_and_arrays() {
        let document = json!({
            "paths": {
                "/pets": {
                    "get": {
                        "parameters": [ { "name": "limit" } ]
                    }
                }
            }
        });
        let segments = JsonPointer::parse_fragment("#/paths/~1pets/get/parameters/0/name").unwrap();
        assert_eq!(
            JsonPointer::lookup(&document, &segments),
            Some(&json!("limit"))
        );

        let missing = JsonPointer::parse_fragment("#/paths/~1pets/post").unwrap();
        assert_eq!(JsonPointer::lookup(&document, &missing), None);
    }
}
