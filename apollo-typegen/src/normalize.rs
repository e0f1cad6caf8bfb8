//! Canonical text and hashes of operations, for persisted documents.
use apollo_compiler::Node;
use apollo_compiler::ast;
use schemars::JsonSchema;
use serde::Deserialize;
use serde::Serialize;
use sha1::Sha1;
use sha2::Digest;
use sha2::Sha256;

use crate::document::fragments::FragmentTable;

/// Directives that never reach the server.
const CLIENT_ONLY_DIRECTIVES: [&str; 4] = ["client", "connection", "defer", "stream"];

/// Hash function for persisted document ids.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum HashAlgorithm {
    #[default]
    Sha1,
    Sha256,
}

impl HashAlgorithm {
    /// Lowercase hex digest of `text`.
    pub fn digest(self, text: &str) -> String {
        match self {
            HashAlgorithm::Sha1 => hex::encode(Sha1::digest(text.as_bytes())),
            HashAlgorithm::Sha256 => hex::encode(Sha256::digest(text.as_bytes())),
        }
    }
}

/// Canonical text of an operation followed by its fragment closure, sorted by name.
pub fn normalize(operation: &Node<ast::OperationDefinition>, fragments: &FragmentTable) -> String {
    let mut document = ast::Document::new();
    let mut operation = operation.clone();
    strip_operation(operation.make_mut());
    document
        .definitions
        .push(ast::Definition::OperationDefinition(operation));

    for name in fragments.closure(&document_selections(&document)) {
        let Some(entry) = fragments.get(&name) else {
            continue;
        };
        let mut fragment = entry.definition.clone();
        let definition = fragment.make_mut();
        strip_directives(&mut definition.directives);
        strip_selections(&mut definition.selection_set);
        document
            .definitions
            .push(ast::Definition::FragmentDefinition(fragment));
    }

    canonical_text(&document.to_string())
}

/// Normalizes and hashes in one step.
pub fn hash_operation(
    operation: &Node<ast::OperationDefinition>,
    fragments: &FragmentTable,
    algorithm: HashAlgorithm,
) -> (String, String) {
    let text = normalize(operation, fragments);
    let hash = algorithm.digest(&text);
    (hash, text)
}

fn document_selections(document: &ast::Document) -> Vec<ast::Selection> {
    document
        .definitions
        .iter()
        .flat_map(|definition| match definition {
            ast::Definition::OperationDefinition(operation) => operation.selection_set.clone(),
            _ => Vec::new(),
        })
        .collect()
}

/// LF line endings, no trailing whitespace.
fn canonical_text(printed: &str) -> String {
    printed
        .replace("\r\n", "\n")
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
        .trim_end()
        .to_owned()
}

fn strip_operation(operation: &mut ast::OperationDefinition) {
    strip_directives(&mut operation.directives);
    strip_selections(&mut operation.selection_set);
}

fn strip_directives(directives: &mut ast::DirectiveList) {
    directives.retain(|directive| !CLIENT_ONLY_DIRECTIVES.contains(&directive.name.as_str()));
}

fn strip_selections(selections: &mut [ast::Selection]) {
    for selection in selections {
        match selection {
            ast::Selection::Field(field) => {
                let field = field.make_mut();
                strip_directives(&mut field.directives);
                strip_selections(&mut field.selection_set);
            }
            ast::Selection::FragmentSpread(spread) => {
                strip_directives(&mut spread.make_mut().directives);
            }
            ast::Selection::InlineFragment(inline) => {
                let inline = inline.make_mut();
                strip_directives(&mut inline.directives);
                strip_selections(&mut inline.selection_set);
            }
        }
    }
}
