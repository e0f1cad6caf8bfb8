//! ## Usage
//!
//! Generates TypeScript declarations and typed documents from a GraphQL schema and the operations
//! and fragments of a client project.
//!
//! ```ignore
//! let configuration = Configuration::from_json(serde_json::json!({
//!     "schema": "schema.graphql",
//!     "documents": "src/**/*.graphql",
//!     "generates": { "src/gql/": { "preset": "client" } },
//! }))?;
//! let output = apollo_typegen::generate(&configuration, &schemas, &documents, &cancel)?;
//! output.write(&writer)?;
//! ```
//!
//! Schema and document acquisition, source extraction and file output are provided by the host
//! through the traits of [`loader`]. The library performs no I/O of its own, so a run over the
//! same inputs always produces the same bytes.
//!
//! ## Crate versioning
//!
//! The `apollo-typegen` crate does **not** adhere to [Semantic Versioning](https://semver.org/).
//! Any version may have breaking API changes.

#![warn(
    rustdoc::broken_intra_doc_links,
    unreachable_pub,
    unreachable_patterns,
    unused,
    unused_qualifications,
    dead_code,
    while_true,
    unconditional_panic,
    clippy::all
)]

pub mod configuration;
pub mod document;
pub mod emit;
pub mod error;
mod generator;
pub mod loader;
pub mod naming;
pub mod normalize;
pub mod placement;
pub mod render;
pub mod scalars;
pub mod schema;
pub mod synthesis;

pub use crate::configuration::Configuration;
pub use crate::configuration::EmitterOptions;
pub use crate::document::DocumentSet;
pub use crate::document::SourceText;
pub use crate::error::GenerateError;
pub use crate::error::Warning;
pub use crate::generator::GenerateOutput;
pub use crate::generator::generate;
pub use crate::loader::DocumentLoader;
pub use crate::loader::FileWriter;
pub use crate::loader::SchemaLoader;
pub use crate::loader::SourceExtractor;
pub use crate::schema::SchemaModel;
