//! rackflow core
//!
//! Formation template rendering shared by every rackflow backend.
//!
//! Templates are Tera documents stored as `{name}{suffix}` under a fixed
//! directory. Rendering executes the template with a JSON object payload and
//! a set of helper functions, then validates and normalizes the output as
//! indented JSON with sorted keys.

pub mod error;
pub mod template;

pub use error::{Result, TemplateError};
pub use template::{DEFAULT_SUFFIX, Helper, TemplateRenderer};
