use crate::types::pointer::JsonPointer;
use crate::types::version::{ParameterLevel, ParameterOrigin};
use crate::{IN_FIELD, NAME_FIELD, PARAMETERS_FIELD};
use serde::Serialize;
use serde_json::Value;

/// One effective parameter of an operation.
///
/// The pointer addresses the defining fragment in the resolved document:
/// `#/paths/<path>/parameters/<i>` for a path-level parameter,
/// `#/paths/<path>/<method>/parameters/<i>` for an operation-level one. The
/// definition is the resolved fragment verbatim; no coercion or
/// normalization happens here.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Parameter {
    ptr: String,
    definition: Value,
}

impl Parameter {
    pub(crate) fn new(item_pointer: &JsonPointer, method: &str, origin: ParameterOrigin) -> Self {
        let mut pointer = match origin.level {
            ParameterLevel::PathItem => item_pointer.clone(),
            ParameterLevel::Operation => item_pointer.child(method),
        };
        pointer.add(PARAMETERS_FIELD).add(origin.index.to_string());
        Self {
            ptr: pointer.fragment(),
            definition: origin.definition,
        }
    }

    pub fn ptr(&self) -> &str {
        &self.ptr
    }

    pub fn definition(&self) -> &Value {
        &self.definition
    }

    pub fn name(&self) -> Option<&str> {
        self.definition.get(NAME_FIELD).and_then(Value::as_str)
    }

    /// The parameter's `in` field: `path`, `query`, `header`, `formData` or
    /// `body`.
    pub fn location(&self) -> Option<&str> {
        self.definition.get(IN_FIELD).and_then(Value::as_str)
    }
}
