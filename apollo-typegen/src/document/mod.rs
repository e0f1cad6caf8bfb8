//! Executable documents and the aggregate document set.
//!
//! Every document is validated against the schema together with the fragments it imports from
//! other documents. The surviving definitions are then combined into one executable document that
//! the synthesizer walks.

pub mod fragments;

use std::collections::HashSet;

use apollo_compiler::ExecutableDocument;
use apollo_compiler::Name;
use apollo_compiler::Node;
use apollo_compiler::ast;
use apollo_compiler::validation::Valid;
use indexmap::IndexMap;
use sha2::Digest;
use sha2::Sha256;
use tokio_util::sync::CancellationToken;

use crate::configuration::AnonymousOperations;
use crate::document::fragments::FragmentTable;
use crate::error::Diagnostics;
use crate::error::DocumentError;
use crate::error::Warning;
use crate::schema::SchemaModel;

/// Validation reports fragments that no operation of their own document uses. Fragments are
/// shared across the whole set, so this one rule is checked on the aggregate instead.
const UNUSED_FRAGMENT_MESSAGE: &str = "must be used in an operation";

/// GraphQL text and where it was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceText {
    pub origin: String,
    pub text: String,
}

impl SourceText {
    pub fn new(origin: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            text: text.into(),
        }
    }
}

/// A parsed executable document. Anonymous operations have been removed.
#[derive(Debug, Clone)]
pub struct Document {
    origin: String,
    text: String,
    hash: String,
    ast: ast::Document,
}

impl Document {
    /// Parses and validates a standalone document. Fragment spreads must resolve locally.
    pub fn load(schema: &SchemaModel, text: &str, origin: &str) -> Result<Self, DocumentError> {
        let mut warnings = Vec::new();
        let document = parse(
            &SourceText::new(origin, text),
            AnonymousOperations::Skip,
            &mut warnings,
        )?;
        validate(schema, &document, &FragmentTable::new())?;
        Ok(document)
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// The text as it was found in the source file.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Lowercase hex SHA-256 of the original text.
    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn ast(&self) -> &ast::Document {
        &self.ast
    }

    pub fn operation_names(&self) -> impl Iterator<Item = &Name> {
        self.ast
            .definitions
            .iter()
            .filter_map(|definition| match definition {
                ast::Definition::OperationDefinition(operation) => operation.name.as_ref(),
                _ => None,
            })
    }

    pub fn fragment_names(&self) -> impl Iterator<Item = &Name> {
        self.ast
            .definitions
            .iter()
            .filter_map(|definition| match definition {
                ast::Definition::FragmentDefinition(fragment) => Some(&fragment.name),
                _ => None,
            })
    }

    /// Fragments used by this document and defined elsewhere.
    fn imports(&self, fragments: &FragmentTable) -> Vec<Name> {
        let local: HashSet<&Name> = self.fragment_names().collect();
        let mut imports = Vec::new();
        for definition in &self.ast.definitions {
            let selections = match definition {
                ast::Definition::OperationDefinition(operation) => &operation.selection_set,
                ast::Definition::FragmentDefinition(fragment) => &fragment.selection_set,
                _ => continue,
            };
            for name in fragments.closure(selections) {
                if !local.contains(&name) && !imports.contains(&name) {
                    imports.push(name);
                }
            }
        }
        imports.sort();
        imports
    }
}

/// How the document set treats problematic documents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DocumentOptions {
    pub anonymous_operations: AnonymousOperations,
    /// Skip invalid documents with a warning instead of failing.
    pub lenient: bool,
}

/// A named operation and the document that declares it.
#[derive(Debug, Clone)]
pub struct OperationEntry {
    pub origin: String,
    pub definition: Node<ast::OperationDefinition>,
}

/// Every valid document of a run, with operations and fragments addressable by name.
#[derive(Debug, Clone)]
pub struct DocumentSet {
    documents: Vec<Document>,
    operations: IndexMap<Name, OperationEntry>,
    fragments: FragmentTable,
    executable: Valid<ExecutableDocument>,
    warnings: Vec<Warning>,
}

impl DocumentSet {
    pub fn build(
        schema: &SchemaModel,
        sources: Vec<SourceText>,
        options: DocumentOptions,
        cancel: &CancellationToken,
    ) -> Result<Self, DocumentError> {
        let mut warnings = Vec::new();
        let mut documents = Vec::new();
        for source in sources {
            if cancel.is_cancelled() {
                return Err(DocumentError::Cancelled);
            }
            match parse(&source, options.anonymous_operations, &mut warnings) {
                Ok(document) if document.ast.definitions.is_empty() => {}
                Ok(document) => documents.push(document),
                Err(error @ DocumentError::Parse { .. }) if options.lenient => {
                    skip(&source.origin, &error, &mut warnings)
                }
                Err(error) => return Err(error),
            }
        }

        let (mut operations, mut fragments) = index(&documents)?;

        let mut skipped: HashSet<String> = HashSet::new();
        for document in &documents {
            if cancel.is_cancelled() {
                return Err(DocumentError::Cancelled);
            }
            match validate(schema, document, &fragments) {
                Ok(()) => {}
                Err(error) if options.lenient => {
                    skip(&document.origin, &error, &mut warnings);
                    skipped.insert(document.origin.clone());
                }
                Err(error) => return Err(error),
            }
        }

        if !skipped.is_empty() {
            skip_dependents(&documents, &fragments, &mut skipped, &mut warnings);
            documents.retain(|document| !skipped.contains(&document.origin));
            operations.retain(|_, entry| !skipped.contains(&entry.origin));
            fragments.retain(|entry| !skipped.contains(&entry.origin));
        }

        let executable = aggregate(schema, &documents)?;

        let mut used: HashSet<Name> = HashSet::new();
        for entry in operations.values() {
            used.extend(fragments.closure(&entry.definition.selection_set));
        }
        for (name, _) in fragments.iter() {
            if !used.contains(name) {
                Warning::UnusedFragment {
                    name: name.to_string(),
                }
                .report(&mut warnings);
            }
        }

        tracing::debug!(
            documents = documents.len(),
            operations = operations.len(),
            fragments = fragments.len(),
            "documents loaded"
        );
        Ok(Self {
            documents,
            operations,
            fragments,
            executable,
            warnings,
        })
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn operations(&self) -> &IndexMap<Name, OperationEntry> {
        &self.operations
    }

    pub fn operation(&self, name: &str) -> Option<&OperationEntry> {
        self.operations.get(name)
    }

    pub fn fragments(&self) -> &FragmentTable {
        &self.fragments
    }

    /// All surviving definitions as one executable document.
    pub fn executable(&self) -> &Valid<ExecutableDocument> {
        &self.executable
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }
}

fn parse(
    source: &SourceText,
    anonymous_operations: AnonymousOperations,
    warnings: &mut Vec<Warning>,
) -> Result<Document, DocumentError> {
    let mut ast = ast::Document::parse(&source.text, &source.origin).map_err(|invalid| {
        DocumentError::Parse {
            origin: source.origin.clone(),
            errors: invalid.errors.into(),
        }
    })?;

    let before = ast.definitions.len();
    ast.definitions.retain(|definition| {
        !matches!(definition, ast::Definition::OperationDefinition(operation) if operation.name.is_none())
    });
    if ast.definitions.len() != before {
        match anonymous_operations {
            AnonymousOperations::Reject => {
                return Err(DocumentError::AnonymousOperation {
                    origin: source.origin.clone(),
                });
            }
            AnonymousOperations::Skip => Warning::AnonymousOperationSkipped {
                origin: source.origin.clone(),
            }
            .report(warnings),
        }
    }

    let mut hasher = Sha256::new();
    hasher.update(source.text.as_bytes());
    Ok(Document {
        origin: source.origin.clone(),
        text: source.text.clone(),
        hash: hex::encode(hasher.finalize()),
        ast,
    })
}

/// Operation and fragment tables over every parsed document.
fn index(
    documents: &[Document],
) -> Result<(IndexMap<Name, OperationEntry>, FragmentTable), DocumentError> {
    let mut operations: IndexMap<Name, OperationEntry> = IndexMap::new();
    let mut fragments = FragmentTable::new();
    for document in documents {
        for definition in &document.ast.definitions {
            match definition {
                ast::Definition::OperationDefinition(operation) => {
                    let Some(name) = &operation.name else {
                        continue;
                    };
                    if let Some(existing) = operations.get(name) {
                        return Err(DocumentError::DuplicateOperation {
                            name: name.to_string(),
                            first: existing.origin.clone(),
                            second: document.origin.clone(),
                        });
                    }
                    operations.insert(
                        name.clone(),
                        OperationEntry {
                            origin: document.origin.clone(),
                            definition: operation.clone(),
                        },
                    );
                }
                ast::Definition::FragmentDefinition(fragment) => {
                    fragments.insert(&document.origin, fragment.clone())?
                }
                _ => {}
            }
        }
    }
    Ok((operations, fragments))
}

/// Validates one document together with the fragments it imports.
fn validate(
    schema: &SchemaModel,
    document: &Document,
    fragments: &FragmentTable,
) -> Result<(), DocumentError> {
    let mut combined = document.ast.clone();
    for name in document.imports(fragments) {
        if let Some(entry) = fragments.get(&name) {
            combined
                .definitions
                .push(ast::Definition::FragmentDefinition(entry.definition.clone()));
        }
    }
    let Err(invalid) = combined.to_executable_validate(schema.schema()) else {
        return Ok(());
    };
    let messages: Vec<String> = Diagnostics::from(&invalid.errors)
        .messages()
        .iter()
        .filter(|message| !message.contains(UNUSED_FRAGMENT_MESSAGE))
        .cloned()
        .collect();
    if messages.is_empty() {
        Ok(())
    } else {
        Err(DocumentError::Validation {
            origin: document.origin.clone(),
            errors: Diagnostics::new(messages),
        })
    }
}

fn skip(origin: &str, error: &DocumentError, warnings: &mut Vec<Warning>) {
    Warning::InvalidDocumentSkipped {
        origin: origin.to_owned(),
        reason: error.to_string(),
    }
    .report(warnings);
}

/// Skips documents importing fragments from skipped documents, until nothing changes.
fn skip_dependents(
    documents: &[Document],
    fragments: &FragmentTable,
    skipped: &mut HashSet<String>,
    warnings: &mut Vec<Warning>,
) {
    loop {
        let mut changed = false;
        for document in documents {
            if skipped.contains(&document.origin) {
                continue;
            }
            let missing = document.imports(fragments).into_iter().find(|name| {
                fragments
                    .get(name)
                    .is_some_and(|entry| skipped.contains(&entry.origin))
            });
            if let Some(name) = missing {
                Warning::InvalidDocumentSkipped {
                    origin: document.origin.clone(),
                    reason: format!("fragment '{name}' comes from a skipped document"),
                }
                .report(warnings);
                skipped.insert(document.origin.clone());
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
}

fn aggregate(
    schema: &SchemaModel,
    documents: &[Document],
) -> Result<Valid<ExecutableDocument>, DocumentError> {
    let mut combined = ast::Document::new();
    for document in documents {
        combined
            .definitions
            .extend(document.ast.definitions.iter().cloned());
    }
    let executable =
        combined
            .to_executable(schema.schema())
            .map_err(|invalid| DocumentError::Validation {
                origin: "<documents>".to_owned(),
                errors: invalid.errors.into(),
            })?;
    Ok(Valid::assume_valid(executable))
}
