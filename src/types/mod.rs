pub mod operation;
pub mod parameter;
pub mod pointer;
pub mod version;

pub use operation::Operation;
pub use parameter::Parameter;
pub use pointer::JsonPointer;
pub use version::SwaggerVersion;
