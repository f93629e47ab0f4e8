//! Swagger 2.0 description model.
//!
//! `swagcore` loads an API description (in-memory value, file path or URL),
//! resolves every `$ref` pointer it contains, and builds an immutable,
//! queryable object graph: a [`SwaggerApi`] owning one [`Operation`] per
//! path/method pair, each owning its effective [`Parameter`] list with
//! path-level and operation-level definitions merged per the Swagger 2.0
//! inheritance rules.
//!
//! ```no_run
//! use serde_json::json;
//!
//! # async fn demo() -> Result<(), swagcore::Error> {
//! let api = swagcore::create(swagcore::CreateOptions::new(json!({
//!     "swagger": "2.0",
//!     "info": { "title": "Petstore", "version": "1.0.0" },
//!     "paths": {
//!         "/pets": { "get": { "responses": { "200": { "description": "ok" } } } }
//!     }
//! })))
//! .await?;
//!
//! if let Some(operation) = api.get_operation("/pets", "GET") {
//!     assert_eq!(operation.ptr(), "#/paths/~1pets/get");
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod error;
pub mod loader;
pub mod resolver;
pub mod types;

pub use api::{CreateOptions, SwaggerApi, create, create_with_callback};
pub use error::{Error, LoadError, LoadErrorKind, ResolutionError, ResolutionFailure};
pub use loader::Definition;
pub use resolver::{ReferenceEntry, ResolveOptions, ResolvedDocument, Resolver};
pub use types::operation::Operation;
pub use types::parameter::Parameter;
pub use types::pointer::JsonPointer;
pub use types::version::SwaggerVersion;

pub(crate) const REF_FIELD: &str = "$ref";
pub(crate) const SWAGGER_FIELD: &str = "swagger";
pub(crate) const PATHS_FIELD: &str = "paths";
pub(crate) const PARAMETERS_FIELD: &str = "parameters";
pub(crate) const SECURITY_FIELD: &str = "security";
pub(crate) const NAME_FIELD: &str = "name";
pub(crate) const IN_FIELD: &str = "in";
pub(crate) const OPERATION_ID_FIELD: &str = "operationId";
pub(crate) const PATH_SEPARATOR: &str = "/";
pub(crate) const TILDE: &str = "~";
pub(crate) const ENCODED_SLASH: &str = "~1";
pub(crate) const ENCODED_TILDE: &str = "~0";
pub(crate) const FRAGMENT_PREFIX: &str = "#";
