use crate::error::Error;
use crate::loader::{self, Definition};
use crate::resolver::{ReferenceEntry, ResolveOptions, ResolvedDocument, Resolver};
use crate::types::operation::Operation;
use crate::types::version::SwaggerVersion;
use crate::{PARAMETERS_FIELD, PATHS_FIELD, SECURITY_FIELD};
use serde_json::Value;
use std::collections::BTreeMap;

/// Options for [`create`].
#[derive(Debug, Clone)]
pub struct CreateOptions {
    pub definition: Definition,
    pub resolve: ResolveOptions,
}

impl CreateOptions {
    pub fn new(definition: impl Into<Definition>) -> Self {
        Self {
            definition: definition.into(),
            resolve: ResolveOptions::default(),
        }
    }

    pub fn fail_on_circular(mut self, fail: bool) -> Self {
        self.resolve.fail_on_circular = fail;
        self
    }
}

/// Builds a [`SwaggerApi`] from a description source.
///
/// Pipeline: load, resolve every `$ref`, select the version strategy,
/// structurally validate, then construct one [`Operation`] per path and
/// supported method. Each call runs independently; the returned model is
/// immutable and safe to share across tasks.
pub async fn create(options: CreateOptions) -> Result<SwaggerApi, Error> {
    let (definition, base) = loader::load(&options.definition).await?;

    let resolver = Resolver::new(options.resolve);
    let ResolvedDocument {
        document: resolved,
        references,
    } = resolver.resolve(&definition, base.as_deref()).await?;

    let version = SwaggerVersion::from_document(&resolved)?;
    validate_structure(&resolved, version)?;
    let operations = build_operations(&resolved, version);
    log::debug!(
        "built {} operation(s) for swagger {} document",
        operations.len(),
        version
    );

    Ok(SwaggerApi {
        definition,
        resolved,
        references,
        version,
        operations,
        options,
    })
}

/// Callback-style adapter over [`create`]: awaits the same pipeline and
/// hands the complete result to `callback`. No pipeline logic lives here.
pub async fn create_with_callback<F>(options: CreateOptions, callback: F)
where
    F: FnOnce(Result<SwaggerApi, Error>),
{
    callback(create(options).await);
}

/// The top-level API model.
///
/// Owns the original and resolved documents, the reference metadata, and
/// the derived operation collection. Fully immutable after construction.
#[derive(Debug)]
pub struct SwaggerApi {
    definition: Value,
    resolved: Value,
    references: BTreeMap<String, ReferenceEntry>,
    version: SwaggerVersion,
    operations: Vec<Operation>,
    options: CreateOptions,
}

impl SwaggerApi {
    /// The raw description document as loaded, before resolution.
    pub fn definition(&self) -> &Value {
        &self.definition
    }

    /// The fully dereferenced document. Deterministically derived from
    /// [`SwaggerApi::definition`].
    pub fn resolved(&self) -> &Value {
        &self.resolved
    }

    /// Per-occurrence `$ref` resolution metadata, keyed by occurrence
    /// pointer.
    pub fn references(&self) -> &BTreeMap<String, ReferenceEntry> {
        &self.references
    }

    pub fn version(&self) -> SwaggerVersion {
        self.version
    }

    pub fn documentation(&self) -> &'static str {
        self.version.documentation()
    }

    pub fn options(&self) -> &CreateOptions {
        &self.options
    }

    pub fn info(&self) -> Option<&Value> {
        self.definition.get("info")
    }

    pub fn host(&self) -> Option<&str> {
        self.definition.get("host").and_then(Value::as_str)
    }

    pub fn base_path(&self) -> Option<&str> {
        self.definition.get("basePath").and_then(Value::as_str)
    }

    pub fn schemes(&self) -> Option<&Value> {
        self.definition.get("schemes")
    }

    pub fn consumes(&self) -> Option<&Value> {
        self.definition.get("consumes")
    }

    pub fn produces(&self) -> Option<&Value> {
        self.definition.get("produces")
    }

    pub fn paths(&self) -> Option<&Value> {
        self.definition.get(PATHS_FIELD)
    }

    pub fn definitions(&self) -> Option<&Value> {
        self.definition.get("definitions")
    }

    pub fn security_definitions(&self) -> Option<&Value> {
        self.definition.get("securityDefinitions")
    }

    pub fn tags(&self) -> Option<&Value> {
        self.definition.get("tags")
    }

    /// All operations, or only those under `path`. An absent path yields an
    /// empty list, never an error. Document path order is preserved, then
    /// method order as encountered.
    pub fn get_operations(&self, path: Option<&str>) -> Vec<&Operation> {
        match path {
            None => self.operations.iter().collect(),
            Some(path) => self
                .operations
                .iter()
                .filter(|operation| operation.path() == path)
                .collect(),
        }
    }

    /// Exact lookup by path and (case-insensitive) method. `None` when
    /// either does not exist; a missing lookup never fails.
    pub fn get_operation(&self, path: &str, method: &str) -> Option<&Operation> {
        let method = method.to_ascii_lowercase();
        self.operations
            .iter()
            .find(|operation| operation.path() == path && operation.method() == method)
    }
}

fn build_operations(resolved: &Value, version: SwaggerVersion) -> Vec<Operation> {
    let mut operations = Vec::new();
    let Some(paths) = resolved.get(PATHS_FIELD).and_then(Value::as_object) else {
        return operations;
    };
    for (path, path_item) in paths {
        let Some(item) = path_item.as_object() else {
            continue;
        };
        for (method, definition) in item {
            if !version.supports_method(method) {
                continue;
            }
            operations.push(Operation::new(
                resolved, version, path, method, path_item, definition,
            ));
        }
    }
    operations
}

/// Structural validation hook: checks the resolved document's coarse shape
/// against the version schema and aggregates every issue found. Deep
/// content validation against the meta-schema is out of scope.
fn validate_structure(resolved: &Value, version: SwaggerVersion) -> Result<(), Error> {
    let mut issues = Vec::new();

    match resolved.as_object() {
        None => issues.push("document root must be an object".to_string()),
        Some(root) => {
            if root
                .get(SECURITY_FIELD)
                .is_some_and(|security| !security.is_array())
            {
                issues.push("'security' must be an array".to_string());
            }
            match root.get(PATHS_FIELD) {
                None => issues.push("'paths' is missing".to_string()),
                Some(paths) => match paths.as_object() {
                    None => issues.push("'paths' must be an object".to_string()),
                    Some(paths) => {
                        for (path, path_item) in paths {
                            let Some(item) = path_item.as_object() else {
                                issues.push(format!("path item '{path}' must be an object"));
                                continue;
                            };
                            if item
                                .get(PARAMETERS_FIELD)
                                .is_some_and(|parameters| !parameters.is_array())
                            {
                                issues.push(format!("'{path}' parameters must be an array"));
                            }
                            if item
                                .get(SECURITY_FIELD)
                                .is_some_and(|security| !security.is_array())
                            {
                                issues.push(format!("'{path}' security must be an array"));
                            }
                            for (method, operation) in item {
                                if !version.supports_method(method) {
                                    continue;
                                }
                                if operation
                                    .get(PARAMETERS_FIELD)
                                    .is_some_and(|parameters| !parameters.is_array())
                                {
                                    issues.push(format!(
                                        "'{path}' {method} parameters must be an array"
                                    ));
                                }
                                if operation
                                    .get(SECURITY_FIELD)
                                    .is_some_and(|security| !security.is_array())
                                {
                                    issues.push(format!(
                                        "'{path}' {method} security must be an array"
                                    ));
                                }
                            }
                        }
                    }
                },
            }
        }
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(Error::Validation(issues))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn petstore() -> Value {
        json!({
            "swagger": "2.0",
            "info": { "title": "Swagger Petstore", "version": "1.0.0" },
            "host": "petstore.example.com",
            "basePath": "/v2",
            "paths": {
                "/pet/{petId}": {
                    "parameters": [
                        { "name": "petId", "in": "path", "required": true, "type": "integer" }
                    ],
                    "get": {
                        "security": [ { "petstore_auth": ["read:pets", "write:pets"] } ],
                        "responses": { "200": { "description": "ok" } }
                    },
                    "post": {
                        "parameters": [
                            { "name": "name", "in": "formData", "type": "string" }
                        ],
                        "responses": { "405": { "description": "invalid input" } }
                    },
                    "delete": {
                        "responses": { "204": { "description": "deleted" } }
                    }
                },
                "/user/{username}": {
                    "get": {
                        "security": [ { "api_key": [] } ],
                        "responses": { "200": { "description": "ok" } }
                    }
                }
            }
        })
    }

    #[tokio::test]
    async fn test_get_operations_counts() {
        let api = create(CreateOptions::new(petstore())).await.unwrap();

        assert_eq!(api.get_operations(None).len(), 4);
        assert_eq!(api.get_operations(Some("/pet/{petId}")).len(), 3);
        assert_eq!(api.get_operations(Some("/user/{username}")).len(), 1);
        assert_eq!(api.get_operations(Some("/some/fake/path")).len(), 0);
    }

    #[tokio::test]
    async fn test_operations_preserve_document_order() {
        let api = create(CreateOptions::new(petstore())).await.unwrap();
        let methods: Vec<(&str, &str)> = api
            .get_operations(None)
            .iter()
            .map(|operation| (operation.path(), operation.method()))
            .collect();
        assert_eq!(
            methods,
            vec![
                ("/pet/{petId}", "get"),
                ("/pet/{petId}", "post"),
                ("/pet/{petId}", "delete"),
                ("/user/{username}", "get"),
            ]
        );
    }

    #[tokio::test]
    async fn test_get_operation_misses_return_none() {
        let api = create(CreateOptions::new(petstore())).await.unwrap();

        assert!(api.get_operation("/pet/{petId}", "get").is_some());
        assert!(api.get_operation("/pet/{petId}", "GET").is_some());
        assert!(api.get_operation("/petz/{petId}", "get").is_none());
        assert!(api.get_operation("/pet/{petId}", "head").is_none());
    }

    #[tokio::test]
    async fn test_named_accessors() {
        let api = create(CreateOptions::new(petstore())).await.unwrap();

        assert_eq!(api.host(), Some("petstore.example.com"));
        assert_eq!(api.base_path(), Some("/v2"));
        assert_eq!(api.info(), Some(&json!({ "title": "Swagger Petstore", "version": "1.0.0" })));
        assert!(api.definitions().is_none());
        assert_eq!(api.version().version(), "2.0");
        assert!(api.documentation().contains("2.0.md"));
    }

    #[tokio::test]
    async fn test_uppercase_method_keys_are_not_operations() {
        let api = create(CreateOptions::new(json!({
            "swagger": "2.0",
            "paths": {
                "/pets": {
                    "GET": { "responses": { "200": { "description": "ok" } } },
                    "get": { "responses": { "200": { "description": "ok" } } }
                }
            }
        })))
        .await
        .unwrap();

        // Only the lowercase key is an operation; both lookup styles agree.
        assert_eq!(api.get_operations(None).len(), 1);
        let operation = api.get_operation("/pets", "GET").unwrap();
        assert_eq!(operation.method(), "get");
        assert_eq!(operation.ptr(), "#/paths/~1pets/get");
    }

    #[tokio::test]
    async fn test_malformed_security_is_a_validation_issue() {
        let result = create(CreateOptions::new(json!({
            "swagger": "2.0",
            "security": "oops",
            "paths": {
                "/pets": {
                    "security": { "api_key": [] },
                    "get": {
                        "security": "also oops",
                        "responses": { "200": { "description": "ok" } }
                    }
                }
            }
        })))
        .await;
        match result {
            Err(Error::Validation(issues)) => {
                assert_eq!(issues.len(), 3);
                assert!(issues.iter().all(|issue| issue.contains("security")));
            }
            other => panic!("expected Validation, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unsupported_version_is_rejected() {
        let result = create(CreateOptions::new(json!({ "swagger": "1.2", "paths": {} }))).await;
        match result {
            Err(Error::UnsupportedVersion(Some(version))) => assert_eq!(version, "1.2"),
            other => panic!("expected UnsupportedVersion, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_validation_aggregates_issues() {
        let result = create(CreateOptions::new(json!({
            "swagger": "2.0",
            "paths": {
                "/broken": "not an object",
                "/also-broken": { "parameters": "not an array" }
            }
        })))
        .await;
        match result {
            Err(Error::Validation(issues)) => {
                assert_eq!(issues.len(), 2);
                assert!(issues.iter().any(|issue| issue.contains("/broken")));
                assert!(issues.iter().any(|issue| issue.contains("/also-broken")));
            }
            other => panic!("expected Validation, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_paths_is_a_validation_issue() {
        let result = create(CreateOptions::new(json!({ "swagger": "2.0" }))).await;
        match result {
            Err(Error::Validation(issues)) => {
                assert_eq!(issues, vec!["'paths' is missing".to_string()]);
            }
            other => panic!("expected Validation, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_callback_adapter_reports_same_result() {
        let mut delivered = None;
        create_with_callback(CreateOptions::new(petstore()), |result| {
            delivered = Some(result);
        })
        .await;
        let api = delivered.unwrap().unwrap();
        assert_eq!(api.get_operations(None).len(), 4);

        let mut delivered = None;
        create_with_callback(
            CreateOptions::new(json!({ "swagger": "1.2", "paths": {} })),
            |result| {
                delivered = Some(result);
            },
        )
        .await;
        match delivered.unwrap() {
            Err(Error::UnsupportedVersion(Some(version))) => assert_eq!(version, "1.2"),
            other => panic!("expected UnsupportedVersion, got {:?}", other),
        }
    }
}
