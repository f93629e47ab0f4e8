use crate::error::Error;
use crate::{IN_FIELD, NAME_FIELD, PARAMETERS_FIELD, SECURITY_FIELD, SWAGGER_FIELD};
use serde_json::Value;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

const SWAGGER_20_METHODS: &[&str] = &["get", "put", "post", "delete", "options", "head", "patch"];
const SWAGGER_20_DOCUMENTATION: &str =
    "https://github.com/swagger-api/swagger-spec/blob/master/versions/2.0.md";

/// Version strategy for a supported description format.
///
/// A closed set: adding support for another version means adding a variant
/// here and covering it in every match below. Each variant supplies the
/// version's constants and the extraction rules used while building the
/// operation model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwaggerVersion {
    V20,
}

impl FromStr for SwaggerVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "2.0" {
            Ok(SwaggerVersion::V20)
        } else {
            Err(Error::UnsupportedVersion(Some(s.to_string())))
        }
    }
}

impl Display for SwaggerVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.version())
    }
}

impl SwaggerVersion {
    /// Selects the strategy matching the document's declared version field.
    pub fn from_document(document: &Value) -> Result<Self, Error> {
        match document.get(SWAGGER_FIELD).and_then(Value::as_str) {
            Some(version) => version.parse(),
            None => Err(Error::UnsupportedVersion(None)),
        }
    }

    pub fn version(&self) -> &'static str {
        match self {
            SwaggerVersion::V20 => "2.0",
        }
    }

    /// URL of the specification text this strategy implements.
    pub fn documentation(&self) -> &'static str {
        match self {
            SwaggerVersion::V20 => SWAGGER_20_DOCUMENTATION,
        }
    }

    pub fn supported_http_methods(&self) -> &'static [&'static str] {
        match self {
            SwaggerVersion::V20 => SWAGGER_20_METHODS,
        }
    }

    /// True when `method` is a path-item key naming a supported operation.
    /// Keys match the lowercase method names exactly, so a non-standard
    /// `GET` key is ignored like any other extension key.
    pub fn supports_method(&self, method: &str) -> bool {
        self.supported_http_methods().contains(&method)
    }

    /// Merges path-level and operation-level parameters.
    ///
    /// Path-level parameters come first, operation-level ones follow. An
    /// operation-level parameter with the same `name`+`in` pair as a
    /// path-level one replaces it in place rather than duplicating it. Every
    /// entry keeps the index into whichever array actually defines it.
    pub(crate) fn effective_parameters(
        &self,
        path_item: &Value,
        operation: &Value,
    ) -> Vec<ParameterOrigin> {
        match self {
            SwaggerVersion::V20 => {
                let mut merged: Vec<ParameterOrigin> = parameters_of(path_item)
                    .iter()
                    .enumerate()
                    .map(|(index, definition)| ParameterOrigin {
                        level: ParameterLevel::PathItem,
                        index,
                        definition: definition.clone(),
                    })
                    .collect();

                for (index, definition) in parameters_of(operation).iter().enumerate() {
                    let origin = ParameterOrigin {
                        level: ParameterLevel::Operation,
                        index,
                        definition: definition.clone(),
                    };
                    let overridden = merged.iter_mut().find(|existing| {
                        existing.level == ParameterLevel::PathItem
                            && same_name_and_location(&existing.definition, definition)
                    });
                    match overridden {
                        Some(existing) => *existing = origin,
                        None => merged.push(origin),
                    }
                }

                merged
            }
        }
    }

    /// Picks the effective security requirements: operation-level if present,
    /// else path-item-level, else the document's global default, else empty.
    /// Override, never merge. A present but non-array value falls through to
    /// the next level; only an actual array (even an empty one) wins.
    pub(crate) fn effective_security(
        &self,
        document: &Value,
        path_item: &Value,
        operation: &Value,
    ) -> Vec<Value> {
        match self {
            SwaggerVersion::V20 => {
                for node in [operation, path_item, document] {
                    if let Some(security) = node.get(SECURITY_FIELD).and_then(Value::as_array) {
                        return security.clone();
                    }
                }
                Vec::new()
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ParameterLevel {
    PathItem,
    Operation,
}

/// One effective parameter and the level/index that defines it.
#[derive(Debug)]
pub(crate) struct ParameterOrigin {
    pub(crate) level: ParameterLevel,
    pub(crate) index: usize,
    pub(crate) definition: Value,
}

fn parameters_of(node: &Value) -> &[Value] {
    node.get(PARAMETERS_FIELD)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn same_name_and_location(left: &Value, right: &Value) -> bool {
    let name = |node: &Value| {
        node.get(NAME_FIELD)
            .and_then(Value::as_str)
            .map(str::to_owned)
    };
    let location = |node: &Value| {
        node.get(IN_FIELD)
            .and_then(Value::as_str)
            .map(str::to_owned)
    };
    match (name(left), name(right), location(left), location(right)) {
        (Some(left_name), Some(right_name), Some(left_in), Some(right_in)) => {
            left_name == right_name && left_in == right_in
        }
        _ => false,
    }
}
