//! Contracts of the collaborators the host provides, and in-memory implementations.
use std::path::Path;

use glob::Pattern;
use indexmap::IndexMap;

use crate::configuration::SchemaSource;
use crate::document::SourceText;
use crate::error::DocumentError;
use crate::error::SchemaError;
use crate::schema::SchemaModel;
use crate::schema::SdlSource;
use crate::schema::merge::MergePolicy;

/// Acquires and merges the configured schema sources.
pub trait SchemaLoader {
    fn load(
        &self,
        sources: &[SchemaSource],
        policy: MergePolicy,
    ) -> Result<SchemaModel, SchemaError>;
}

/// Finds the GraphQL texts matched by the include patterns and none of the exclude patterns.
pub trait DocumentLoader {
    fn load(
        &self,
        includes: &[String],
        excludes: &[String],
    ) -> Result<Vec<SourceText>, DocumentError>;
}

/// Pulls GraphQL texts out of a source file.
pub trait SourceExtractor {
    fn extract(&self, path: &Path, bytes: &[u8]) -> Vec<SourceText>;
}

/// Persists generated artifacts.
pub trait FileWriter {
    fn write(&self, path: &Path, bytes: &[u8]) -> std::io::Result<()>;
}

/// Serves SDL files from memory, by path.
#[derive(Debug, Clone, Default)]
pub struct StaticSchemaLoader {
    files: IndexMap<String, String>,
}

impl StaticSchemaLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl Into<String>, sdl: impl Into<String>) -> Self {
        self.files.insert(path.into(), sdl.into());
        self
    }
}

impl SchemaLoader for StaticSchemaLoader {
    fn load(
        &self,
        sources: &[SchemaSource],
        policy: MergePolicy,
    ) -> Result<SchemaModel, SchemaError> {
        let sdl = sources
            .iter()
            .map(|source| {
                let path = source
                    .file()
                    .ok_or_else(|| SchemaError::UnsupportedSource(source.describe()))?;
                let text = self.files.get(path).ok_or_else(|| SchemaError::Read {
                    path: path.to_owned(),
                    reason: "no such file".to_owned(),
                })?;
                Ok(SdlSource::new(path, text.as_str()))
            })
            .collect::<Result<Vec<_>, SchemaError>>()?;
        SchemaModel::load(&sdl, policy)
    }
}

/// Serves documents from memory, filtered by glob patterns on their origin.
#[derive(Debug, Clone, Default)]
pub struct StaticDocumentLoader {
    documents: Vec<SourceText>,
}

impl StaticDocumentLoader {
    pub fn new(documents: Vec<SourceText>) -> Self {
        Self { documents }
    }
}

pub(crate) fn compile_patterns(patterns: &[String]) -> Result<Vec<Pattern>, DocumentError> {
    patterns
        .iter()
        .map(|pattern| {
            Pattern::new(pattern)
                .map_err(|error| DocumentError::Load(format!("invalid pattern '{pattern}': {error}")))
        })
        .collect()
}

impl DocumentLoader for StaticDocumentLoader {
    fn load(
        &self,
        includes: &[String],
        excludes: &[String],
    ) -> Result<Vec<SourceText>, DocumentError> {
        let includes = compile_patterns(includes)?;
        let excludes = compile_patterns(excludes)?;
        Ok(self
            .documents
            .iter()
            .filter(|document| {
                includes
                    .iter()
                    .any(|pattern| pattern.matches(&document.origin))
                    && !excludes
                        .iter()
                        .any(|pattern| pattern.matches(&document.origin))
            })
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn static_schema_sources() {
        let loader = StaticSchemaLoader::new()
            .with_file("a.graphql", "type Query { a: Int }")
            .with_file("b.graphql", "extend type Query { b: Int }");
        let schema = loader
            .load(
                &[
                    SchemaSource::Path("a.graphql".to_owned()),
                    SchemaSource::File {
                        file: "b.graphql".to_owned(),
                    },
                ],
                MergePolicy::Error,
            )
            .unwrap();
        assert!(schema.schema().type_field("Query", "b").is_ok());

        let error = loader
            .load(
                &[SchemaSource::Url {
                    url: "https://example.com/graphql".to_owned(),
                    headers: Default::default(),
                }],
                MergePolicy::Error,
            )
            .unwrap_err();
        assert_eq!(
            error.to_string(),
            "unsupported schema source: url https://example.com/graphql"
        );
        assert!(matches!(
            loader.load(&[SchemaSource::Path("c.graphql".to_owned())], MergePolicy::Error),
            Err(SchemaError::Read { .. })
        ));
    }

    #[test]
    fn static_documents_are_filtered() {
        let loader = StaticDocumentLoader::new(vec![
            SourceText::new("src/a.graphql", "query A { a }"),
            SourceText::new("src/gql/graphql.ts", "query B { b }"),
            SourceText::new("other/c.graphql", "query C { c }"),
        ]);
        let documents = loader
            .load(&["src/**/*".to_owned()], &["src/gql/**".to_owned()])
            .unwrap();
        let origins = documents
            .iter()
            .map(|document| document.origin.as_str())
            .collect::<Vec<_>>();
        assert_eq!(origins, ["src/a.graphql"]);

        assert!(matches!(
            loader.load(&["src/[".to_owned()], &[]),
            Err(DocumentError::Load(_))
        ));
    }
}
