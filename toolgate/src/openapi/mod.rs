//! OpenAPI support: document model, conversion to function tools, loading,
//! and HTTP execution of the resulting calls.

mod convert;
mod document;
mod executor;
mod loader;
mod processor;

pub use convert::{REQUEST_BODY, convert, convert_operation};
pub use document::{
    Document, Method, Operation, OperationRef, Parameter, ParameterLocation, PathItem,
    RefOr, RequestBody,
};
pub use executor::HttpExecutor;
pub use loader::{
    DEFAULT_FUNCTIONS_FILE, DEFAULT_RAW_SPEC_FILE, SpecLoader, SpecSource, load_functions,
    save_functions,
};
pub use processor::OpenApiProcessor;
