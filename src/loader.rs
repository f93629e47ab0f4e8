use crate::error::{Error, LoadError};
use serde_json::Value;

/// A description source: either an in-memory document or a location to
/// fetch one from.
#[derive(Debug, Clone)]
pub enum Definition {
    Document(Value),
    Location(String),
}

impl From<Value> for Definition {
    fn from(document: Value) -> Self {
        Definition::Document(document)
    }
}

impl From<&str> for Definition {
    fn from(location: &str) -> Self {
        Definition::Location(location.to_string())
    }
}

impl From<String> for Definition {
    fn from(location: String) -> Self {
        Definition::Location(location)
    }
}

/// Normalizes a definition to an in-memory document plus the base location
/// relative references resolve against (`None` for in-memory documents).
pub(crate) async fn load(definition: &Definition) -> Result<(Value, Option<String>), Error> {
    match definition {
        Definition::Document(document) => Ok((document.clone(), None)),
        Definition::Location(location) => {
            let document = load_location(location).await?;
            Ok((document, Some(location.clone())))
        }
    }
}

/// Fetches and parses the document at `location`, a file path or a URL.
pub(crate) async fn load_location(location: &str) -> Result<Value, LoadError> {
    log::debug!("loading document from {}", location);
    let content = if is_url(location) {
        fetch_url(location).await?
    } else {
        tokio::fs::read_to_string(location)
            .await
            .map_err(|io_error| LoadError::unreachable(location, io_error))?
    };
    parse_content(location, &content)
}

pub(crate) fn is_url(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

async fn fetch_url(location: &str) -> Result<String, LoadError> {
    let response = reqwest::get(location)
        .await
        .and_then(|response| response.error_for_status())
        .map_err(|http_error| LoadError::unreachable(location, http_error))?;
    response
        .text()
        .await
        .map_err(|http_error| LoadError::unreachable(location, http_error))
}

/// Parses raw content by extension. Everything that is not explicitly JSON
/// goes through the YAML parser, which accepts JSON as a subset.
fn parse_content(location: &str, content: &str) -> Result<Value, LoadError> {
    if location.ends_with(".json") {
        serde_json::from_str(content)
            .map_err(|parse_error| LoadError::unparsable(location, parse_error))
    } else {
        serde_yaml::from_str(content)
            .map_err(|parse_error| LoadError::unparsable(location, parse_error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LoadErrorKind;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn test_is_url() {
        assert!(is_url("http://localhost:44444/swagger.yaml"));
        assert!(is_url("https://example.com/swagger.json"));
        assert!(!is_url("./swagger.yaml"));
        assert!(!is_url("/tmp/swagger.json"));
    }

    #[test]
    fn test_parse_content_json() {
        let parsed = parse_content("swagger.json", r#"{ "swagger": "2.0" }"#).unwrap();
        assert_eq!(parsed, json!({ "swagger": "2.0" }));
    }

    #[test]
    fn test_parse_content_yaml() {
        let parsed = parse_content("swagger.yaml", "swagger: \"2.0\"\npaths: {}\n").unwrap();
        assert_eq!(parsed, json!({ "swagger": "2.0", "paths": {} }));
    }

    #[test]
    fn test_parse_content_json_through_yaml_parser() {
        // No extension hint: the YAML parser still accepts JSON content.
        let parsed = parse_content("swagger", r#"{ "swagger": "2.0" }"#).unwrap();
        assert_eq!(parsed, json!({ "swagger": "2.0" }));
    }

    #[test]
    fn test_parse_content_rejects_garbage() {
        let error = parse_content("swagger.json", "{ not json").unwrap_err();
        assert_eq!(error.kind, LoadErrorKind::Unparsable);
    }

    #[tokio::test]
    async fn test_load_location_missing_file() {
        let error = load_location("/nonexistent/swagger.yaml").await.unwrap_err();
        assert_eq!(error.kind, LoadErrorKind::Unreachable);
    }

    #[tokio::test]
    async fn test_load_location_yaml_file() {
        let mut file = tempfile::Builder::new()
            .suffix(".yaml")
            .tempfile()
            .unwrap();
        writeln!(file, "swagger: \"2.0\"").unwrap();
        writeln!(file, "paths: {{}}").unwrap();

        let document = load_location(file.path().to_str().unwrap()).await.unwrap();
        assert_eq!(document, json!({ "swagger": "2.0", "paths": {} }));
    }

    #[tokio::test]
    async fn test_load_by_value_returns_no_base_location() {
        let definition = Definition::from(json!({ "swagger": "2.0" }));
        let (document, base) = load(&definition).await.unwrap();
        assert_eq!(document, json!({ "swagger": "2.0" }));
        assert!(base.is_none());
    }
}
