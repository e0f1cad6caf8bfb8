//! The emitter registry.
//!
//! Emitters turn the schema, the validated documents and their synthesized descriptors into
//! [`ArtifactFragment`]s. They are a closed set selected by name from the configuration.

mod base_types;
mod fragment_masking;
mod gql_tag;
mod index;
mod operation_types;
mod persisted_documents;
mod prefix;
mod typed_document;

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::Map;
use serde_json::Value;
use strum_macros::Display;
use strum_macros::EnumIter;
use strum_macros::EnumString;
use strum_macros::IntoStaticStr;

use crate::configuration::EmitterOptions;
use crate::document::DocumentSet;
use crate::error::EmitterError;
use crate::placement::ArtifactFragment;
use crate::render::TypeScriptRenderer;
use crate::scalars::ScalarMap;
use crate::schema::SchemaModel;
use crate::synthesis::descriptor::FragmentDescriptor;
use crate::synthesis::descriptor::OperationDescriptor;

/// Artifact paths of the client layout, relative to the destination directory.
pub(crate) const GQL_MODULE: &str = "gql";
pub(crate) const FRAGMENT_MASKING_MODULE: &str = "fragment-masking";
pub(crate) const INDEX_FILE: &str = "index.ts";
pub(crate) const PERSISTED_DOCUMENTS_FILE: &str = "persisted-documents.json";

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString, IntoStaticStr,
)]
pub enum EmitterKind {
    #[strum(to_string = "base-types", serialize = "typescript")]
    BaseTypes,
    #[strum(to_string = "operation-types", serialize = "typescript-operations")]
    OperationTypes,
    #[strum(to_string = "typed-document-node")]
    TypedDocumentNode,
    #[strum(to_string = "gql-tag-registry", serialize = "gql-tag-operations")]
    GqlTagRegistry,
    #[strum(to_string = "fragment-masking")]
    FragmentMasking,
    #[strum(to_string = "persisted-documents")]
    PersistedDocuments,
    #[strum(to_string = "index-reexports")]
    IndexReexports,
    #[strum(to_string = "prefix", serialize = "add")]
    Prefix,
}

impl EmitterKind {
    pub fn emitter(self) -> &'static dyn Emitter {
        match self {
            EmitterKind::BaseTypes => &base_types::BaseTypes,
            EmitterKind::OperationTypes => &operation_types::OperationTypes,
            EmitterKind::TypedDocumentNode => &typed_document::TypedDocumentNode,
            EmitterKind::GqlTagRegistry => &gql_tag::GqlTagRegistry,
            EmitterKind::FragmentMasking => &fragment_masking::FragmentMasking,
            EmitterKind::PersistedDocuments => &persisted_documents::PersistedDocuments,
            EmitterKind::IndexReexports => &index::IndexReexports,
            EmitterKind::Prefix => &prefix::Prefix,
        }
    }

    /// Whether the emitter reads operation or fragment descriptors.
    pub fn uses_descriptors(self) -> bool {
        matches!(
            self,
            EmitterKind::OperationTypes
                | EmitterKind::TypedDocumentNode
                | EmitterKind::PersistedDocuments
        )
    }
}

pub trait Emitter: Send + Sync {
    fn emit(&self, context: &EmitContext<'_>) -> Result<Vec<ArtifactFragment>, EmitterError>;
}

/// A planned output destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    /// The key of the destination in `generates`.
    pub key: String,
    /// The artifact receiving fragments with an empty path.
    pub base_path: PathBuf,
    /// Emitters in invocation order.
    pub emitters: Vec<EmitterKind>,
}

impl Destination {
    pub fn runs(&self, kind: EmitterKind) -> bool {
        self.emitters.contains(&kind)
    }

    /// Import specifier of the base artifact from a sibling module.
    pub fn base_module(&self) -> String {
        let stem = self
            .base_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "graphql".to_owned());
        format!("./{stem}")
    }
}

/// Everything an emitter may read.
pub struct EmitContext<'a> {
    pub schema: &'a SchemaModel,
    pub documents: &'a DocumentSet,
    pub options: &'a EmitterOptions,
    /// Options given to this emitter in the plugin list.
    pub plugin_options: &'a Map<String, Value>,
    pub scalars: &'a ScalarMap,
    /// Named operations in document order. Empty for emitters not using descriptors.
    pub operations: &'a [Arc<OperationDescriptor>],
    /// Fragments in discovery order. Empty for emitters not using descriptors.
    pub fragments: &'a [Arc<FragmentDescriptor>],
    pub destination: &'a Destination,
}

impl EmitContext<'_> {
    pub fn renderer(&self) -> TypeScriptRenderer<'_> {
        TypeScriptRenderer::new(self.options)
    }

    pub fn operation(&self, name: &str) -> Option<&Arc<OperationDescriptor>> {
        self.operations
            .iter()
            .find(|descriptor| descriptor.name.as_str() == name)
    }

    pub fn fragment(&self, name: &str) -> Option<&Arc<FragmentDescriptor>> {
        self.fragments
            .iter()
            .find(|descriptor| descriptor.name.as_str() == name)
    }
}

/// Joins declarations with a blank line into an appendable section.
pub(crate) fn section(declarations: &[String]) -> String {
    if declarations.is_empty() {
        return String::new();
    }
    format!("\n{}\n", declarations.join("\n\n"))
}


#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn emitters_are_named() {
        let names = EmitterKind::iter()
            .map(|kind| kind.to_string())
            .collect::<Vec<_>>();
        assert_eq!(
            names,
            [
                "base-types",
                "operation-types",
                "typed-document-node",
                "gql-tag-registry",
                "fragment-masking",
                "persisted-documents",
                "index-reexports",
                "prefix",
            ]
        );
        for kind in EmitterKind::iter() {
            assert_eq!(kind.to_string().parse::<EmitterKind>(), Ok(kind));
        }
        assert_eq!("typescript".parse(), Ok(EmitterKind::BaseTypes));
        assert_eq!("add".parse(), Ok(EmitterKind::Prefix));
        assert!("typescript-react-apollo".parse::<EmitterKind>().is_err());
    }

    #[test]
    fn base_module_follows_the_base_artifact() {
        let destination = Destination {
            key: "src/types.ts".to_owned(),
            base_path: PathBuf::from("src/types.ts"),
            emitters: vec![EmitterKind::BaseTypes],
        };
        assert_eq!(destination.base_module(), "./types");
        assert!(destination.runs(EmitterKind::BaseTypes));
        assert!(!destination.runs(EmitterKind::Prefix));
    }
}
