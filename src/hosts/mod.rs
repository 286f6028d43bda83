//! Image host definitions and the registry that serves them
//!
//! ## Key Components
//!
//! - [`HostDefinition`] - how to call one external image host and read its reply
//! - [`HostRegistry`] - ordered candidate lists plus add/update/remove
//! - [`builtin_hosts`] - providers seeded into an empty store
//!
//! ## Example
//!
//! ```rust,ignore
//! use imgrelay::hosts::{HostRegistry, NewHost};
//!
//! let registry = HostRegistry::new(store);
//! registry.add_definition(NewHost::new("cdn", "https://cdn.example.com/upload", "data.url"))?;
//! let candidates = registry.list_candidates()?;
//! ```

mod builtin;
mod definition;
mod registry;

pub use builtin::builtin_hosts;
pub use definition::{
    HeadersMap, HostDefinition, HostPatch, HostValidationError, HttpMethod, NewHost, validate,
};
pub use registry::{HostRegistry, RegistryError};
