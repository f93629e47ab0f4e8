use crate::types::parameter::Parameter;
use crate::types::pointer::JsonPointer;
use crate::types::version::SwaggerVersion;
use crate::{OPERATION_ID_FIELD, PARAMETERS_FIELD, PATHS_FIELD, SECURITY_FIELD};
use serde::Serialize;
use serde_json::{Map, Value};

/// One HTTP-method-bound path entry of the resolved document.
///
/// The definition is the method-level object with `parameters` and
/// `security` inherited from the enclosing path item per the Swagger 2.0
/// rules. Constructed once at model build time and immutable afterwards.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Operation {
    path: String,
    method: String,
    ptr: String,
    definition: Value,
    security: Vec<Value>,
    #[serde(rename = "parameterObjects")]
    parameters: Vec<Parameter>,
}

impl Operation {
    pub(crate) fn new(
        document: &Value,
        version: SwaggerVersion,
        path: &str,
        method: &str,
        path_item: &Value,
        definition: &Value,
    ) -> Self {
        let mut item_pointer = JsonPointer::new();
        item_pointer.add(PATHS_FIELD).add(path);
        let ptr = item_pointer.child(method).fragment();

        let security = version.effective_security(document, path_item, definition);

        let mut effective: Map<String, Value> =
            definition.as_object().cloned().unwrap_or_default();
        if !effective.contains_key(PARAMETERS_FIELD) {
            // Operation-level parameters win entirely; the path item's array
            // is used only when the operation declares none of its own.
            if let Some(inherited) = path_item.get(PARAMETERS_FIELD) {
                effective.insert(PARAMETERS_FIELD.to_string(), inherited.clone());
            }
        }
        if !effective.contains_key(SECURITY_FIELD) && !security.is_empty() {
            effective.insert(SECURITY_FIELD.to_string(), Value::Array(security.clone()));
        }

        let parameters = version
            .effective_parameters(path_item, definition)
            .into_iter()
            .map(|origin| Parameter::new(&item_pointer, method, origin))
            .collect();

        Self {
            path: path.to_string(),
            method: method.to_string(),
            ptr,
            definition: Value::Object(effective),
            security,
            parameters,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    /// Pointer to this operation in the resolved document, e.g.
    /// `#/paths/~1pet~1{petId}/get`.
    pub fn ptr(&self) -> &str {
        &self.ptr
    }

    pub fn definition(&self) -> &Value {
        &self.definition
    }

    /// Effective security requirements; empty when no level declares any.
    pub fn security(&self) -> &[Value] {
        &self.security
    }

    pub fn operation_id(&self) -> Option<&str> {
        self.definition
            .get(OPERATION_ID_FIELD)
            .and_then(Value::as_str)
    }

    /// The effective parameters, path-level first, then operation-level,
    /// overrides already applied.
    pub fn get_parameters(&self) -> &[Parameter] {
        &self.parameters
    }
}
