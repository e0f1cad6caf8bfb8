//! Filesystem implementations of the loader contracts, rooted at the configuration's directory.
use std::collections::BTreeSet;
use std::path::Path;
use std::path::PathBuf;

use apollo_typegen::DocumentLoader;
use apollo_typegen::FileWriter;
use apollo_typegen::SchemaLoader;
use apollo_typegen::SchemaModel;
use apollo_typegen::SourceExtractor;
use apollo_typegen::SourceText;
use apollo_typegen::configuration::SchemaSource;
use apollo_typegen::error::DocumentError;
use apollo_typegen::error::SchemaError;
use apollo_typegen::schema::SdlSource;
use apollo_typegen::schema::merge::MergePolicy;
use glob::Pattern;

/// Paths matching `pattern` under `root`, relative to `root`, sorted.
fn matches(root: &Path, pattern: &str) -> Result<BTreeSet<PathBuf>, String> {
    let absolute = root.join(pattern);
    let paths = glob::glob(&absolute.to_string_lossy())
        .map_err(|error| format!("invalid pattern '{pattern}': {error}"))?;
    let mut matched = BTreeSet::new();
    for path in paths {
        let path = path.map_err(|error| error.to_string())?;
        if path.is_file() {
            let relative = path.strip_prefix(root).unwrap_or(&path).to_path_buf();
            matched.insert(relative);
        }
    }
    Ok(matched)
}

fn origin(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Reads SDL files, expanding glob patterns in file sources.
pub(crate) struct FsSchemaLoader {
    root: PathBuf,
}

impl FsSchemaLoader {
    pub(crate) fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl SchemaLoader for FsSchemaLoader {
    fn load(
        &self,
        sources: &[SchemaSource],
        policy: MergePolicy,
    ) -> Result<SchemaModel, SchemaError> {
        let mut sdl = Vec::new();
        for source in sources {
            let pattern = source
                .file()
                .ok_or_else(|| SchemaError::UnsupportedSource(source.describe()))?;
            let read_error = |reason: String| SchemaError::Read {
                path: pattern.to_owned(),
                reason,
            };
            let paths = matches(&self.root, pattern).map_err(read_error)?;
            if paths.is_empty() {
                return Err(read_error("no such file".to_owned()));
            }
            for path in paths {
                let text = std::fs::read_to_string(self.root.join(&path))
                    .map_err(|error| read_error(error.to_string()))?;
                tracing::debug!(path = %path.display(), "read schema source");
                sdl.push(SdlSource::new(origin(&path), text));
            }
        }
        SchemaModel::load(&sdl, policy)
    }
}

/// Finds documents with glob patterns and hands each file to a [`SourceExtractor`].
pub(crate) struct GlobDocumentLoader<E> {
    root: PathBuf,
    extractor: E,
}

impl<E: SourceExtractor> GlobDocumentLoader<E> {
    pub(crate) fn new(root: impl Into<PathBuf>, extractor: E) -> Self {
        Self {
            root: root.into(),
            extractor,
        }
    }
}

impl<E: SourceExtractor> DocumentLoader for GlobDocumentLoader<E> {
    fn load(
        &self,
        includes: &[String],
        excludes: &[String],
    ) -> Result<Vec<SourceText>, DocumentError> {
        let excludes = excludes
            .iter()
            .map(|pattern| {
                Pattern::new(pattern).map_err(|error| {
                    DocumentError::Load(format!("invalid pattern '{pattern}': {error}"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let mut paths = BTreeSet::new();
        for pattern in includes {
            paths.extend(matches(&self.root, pattern).map_err(DocumentError::Load)?);
        }

        let mut sources = Vec::new();
        for path in paths {
            let origin = origin(&path);
            if excludes.iter().any(|pattern| pattern.matches(&origin)) {
                continue;
            }
            let bytes = std::fs::read(self.root.join(&path))
                .map_err(|error| DocumentError::Load(format!("{origin}: {error}")))?;
            sources.extend(self.extractor.extract(Path::new(&origin), &bytes));
        }
        tracing::debug!(documents = sources.len(), "loaded documents");
        Ok(sources)
    }
}

/// Writes artifacts under a root directory, creating parent directories.
pub(crate) struct FsWriter {
    root: PathBuf,
}

impl FsWriter {
    pub(crate) fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl FileWriter for FsWriter {
    fn write(&self, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
        let path = self.root.join(path);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, bytes)?;
        tracing::debug!(path = %path.display(), bytes = bytes.len(), "wrote artifact");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::extract::TaggedTemplateExtractor;

    fn write(root: &Path, path: &str, text: &str) {
        FsWriter::new(root)
            .write(Path::new(path), text.as_bytes())
            .unwrap();
    }

    #[test]
    fn schema_globs_are_merged_in_path_order() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "schema/b.graphql", "extend type Query { b: Int }");
        write(dir.path(), "schema/a.graphql", "type Query { a: Int }");

        let schema = FsSchemaLoader::new(dir.path())
            .load(
                &[SchemaSource::Path("schema/*.graphql".to_owned())],
                MergePolicy::Error,
            )
            .unwrap();
        assert!(schema.schema().type_field("Query", "b").is_ok());

        let error = FsSchemaLoader::new(dir.path())
            .load(
                &[SchemaSource::Path("missing.graphql".to_owned())],
                MergePolicy::Error,
            )
            .unwrap_err();
        assert_eq!(
            error.to_string(),
            "could not read schema source 'missing.graphql': no such file"
        );
    }

    #[test]
    fn documents_are_found_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "src/me.graphql", "query Me { a }");
        write(
            dir.path(),
            "src/app.tsx",
            "const q = graphql(`query App { a }`);",
        );
        write(dir.path(), "src/gql/graphql.ts", "const q = graphql(`query Old { a }`);");

        let loader = GlobDocumentLoader::new(
            dir.path(),
            TaggedTemplateExtractor::new(&["graphql"]).unwrap(),
        );
        let sources = loader
            .load(
                &["src/**/*.tsx".to_owned(), "src/**/*.graphql".to_owned(), "src/**/*.ts".to_owned()],
                &["src/gql/**".to_owned()],
            )
            .unwrap();
        assert_eq!(
            sources,
            [
                SourceText::new("src/app.tsx", "query App { a }"),
                SourceText::new("src/me.graphql", "query Me { a }"),
            ]
        );
    }
}
