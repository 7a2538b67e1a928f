//! Turns a declarative application specification into a live element graph.
//!
//! A specification is a [`Value`](weir_primitives::Value) tree with one section per element
//! kind. [`AppConstructor::parse`] resolves every entry against the element
//! [`Registry`](weir_registry::Registry), wires references by name and hands the finished
//! graph to a [`MainController`](weir_registry::MainController).

mod config;
mod constructor;
mod error;
mod loader;
mod resolver;

pub use config::ConstructorConfig;
pub use constructor::AppConstructor;
pub use error::{ConfigError, LoadError, Origin, ParseError};
pub use loader::load_spec;
