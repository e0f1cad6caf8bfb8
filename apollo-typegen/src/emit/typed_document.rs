//! Typed document constants binding each operation and fragment to its result type.
use std::collections::HashSet;

use apollo_compiler::Name;
use apollo_compiler::ast;
use serde_json::Map;
use serde_json::Value;

use crate::configuration::DocumentMode;
use crate::document::fragments::direct_spreads;
use crate::emit::EmitContext;
use crate::emit::Emitter;
use crate::emit::EmitterKind;
use crate::emit::section;
use crate::error::EmitterError;
use crate::error::SynthesisError;
use crate::naming;
use crate::placement::ArtifactFragment;
use crate::placement::Placement;
use crate::render::document_ast::document_node;
use crate::synthesis::descriptor::FragmentDescriptor;
use crate::synthesis::descriptor::OperationDescriptor;

const TYPED_DOCUMENT_STRING: &str = "export class TypedDocumentString<TResult, TVariables>
  extends String
  implements DocumentTypeDecoration<TResult, TVariables>
{
  __apiType?: DocumentTypeDecoration<TResult, TVariables>['__apiType'];
  private value: string;
  public __meta__?: Record<string, any> | undefined;

  constructor(value: string, __meta__?: Record<string, any> | undefined) {
    super(value);
    this.value = value;
    this.__meta__ = __meta__;
  }

  override toString(): string & DocumentTypeDecoration<TResult, TVariables> {
    return this.value;
  }
}";

pub(crate) struct TypedDocumentNode;

impl Emitter for TypedDocumentNode {
    fn emit(&self, context: &EmitContext<'_>) -> Result<Vec<ArtifactFragment>, EmitterError> {
        let mode = context.options.document_mode;
        let mut declarations = Vec::new();
        if mode == DocumentMode::String {
            declarations.push(TYPED_DOCUMENT_STRING.to_owned());
        }
        for name in dependency_order(context) {
            let descriptor = context
                .fragment(&name)
                .ok_or_else(|| SynthesisError::UnknownFragment(name.to_string()))?;
            declarations.push(fragment_document(context, descriptor)?);
        }
        for descriptor in context.operations {
            declarations.push(operation_document(context, descriptor)?);
        }
        tracing::debug!(?mode, documents = declarations.len(), "emitted typed documents");
        Ok(vec![
            ArtifactFragment::new("", imports(mode), Placement::Prepend),
            ArtifactFragment::base(section(&declarations)),
        ])
    }
}

fn imports(mode: DocumentMode) -> &'static str {
    match mode {
        DocumentMode::Ast => {
            "import { TypedDocumentNode as DocumentNode } from '@graphql-typed-document-node/core';\n"
        }
        DocumentMode::String => {
            "import { DocumentTypeDecoration } from '@graphql-typed-document-node/core';\n"
        }
        DocumentMode::Tag => {
            "import { TypedDocumentNode as DocumentNode } from '@graphql-typed-document-node/core';\nimport gql from 'graphql-tag';\n"
        }
    }
}

/// Fragments ordered so every fragment follows the fragments it spreads.
fn dependency_order(context: &EmitContext<'_>) -> Vec<Name> {
    fn visit(
        context: &EmitContext<'_>,
        name: &Name,
        visited: &mut HashSet<Name>,
        order: &mut Vec<Name>,
    ) {
        if !visited.insert(name.clone()) {
            return;
        }
        if let Some(entry) = context.documents.fragments().get(name) {
            for dependency in direct_spreads(&entry.definition.selection_set) {
                visit(context, &dependency, visited, order);
            }
        }
        order.push(name.clone());
    }

    let mut visited = HashSet::new();
    let mut order = Vec::new();
    for descriptor in context.fragments {
        visit(context, &descriptor.name, &mut visited, &mut order);
    }
    order
}

fn fragment_definitions(
    context: &EmitContext<'_>,
    names: &[Name],
) -> Result<Vec<ast::Definition>, EmitterError> {
    names
        .iter()
        .map(|name| {
            context
                .documents
                .fragments()
                .get(name)
                .map(|entry| ast::Definition::FragmentDefinition(entry.definition.clone()))
                .ok_or_else(|| SynthesisError::UnknownFragment(name.to_string()).into())
        })
        .collect()
}

fn fragment_document(
    context: &EmitContext<'_>,
    descriptor: &FragmentDescriptor,
) -> Result<String, EmitterError> {
    let convention = context.options.naming_convention;
    let mut definitions = fragment_definitions(context, std::slice::from_ref(&descriptor.name))?;
    let result = naming::fragment_type_name(&descriptor.name, convention);
    let constant = naming::fragment_document_name(&descriptor.name, convention);

    let body = match context.options.document_mode {
        DocumentMode::Ast => {
            definitions.extend(fragment_definitions(context, &descriptor.closure)?);
            ast_literal(&definitions, None)?
        }
        DocumentMode::String => {
            definitions.extend(fragment_definitions(context, &descriptor.closure)?);
            let meta = context.options.string_mode_ready_guard.then(|| {
                let mut meta = Map::new();
                meta.insert(
                    "fragmentName".to_owned(),
                    Value::from(descriptor.name.as_str()),
                );
                meta
            });
            string_literal(&definitions, meta)?
        }
        DocumentMode::Tag => tag_literal(context, &definitions),
    };
    Ok(format!(
        "{}const {constant} = {body} as unknown as {}<{result}, unknown>;",
        context.options.export(),
        document_type(context.options.document_mode),
    ))
}

fn operation_document(
    context: &EmitContext<'_>,
    descriptor: &OperationDescriptor,
) -> Result<String, EmitterError> {
    let options = context.options;
    let entry = context
        .documents
        .operation(&descriptor.name)
        .ok_or_else(|| SynthesisError::UnknownOperation(descriptor.name.to_string()))?;
    let mut definitions = vec![ast::Definition::OperationDefinition(
        entry.definition.clone(),
    )];
    let constant = naming::operation_document_name(&descriptor.name, options.naming_convention);
    let result = naming::operation_type_name(&descriptor.name, descriptor.kind, options);
    let variables = naming::variables_type_name(&descriptor.name, descriptor.kind, options);

    let body = match options.document_mode {
        DocumentMode::Ast => {
            definitions.extend(fragment_definitions(context, &descriptor.closure)?);
            ast_literal(&definitions, operation_meta(context, descriptor))?
        }
        DocumentMode::String => {
            definitions.extend(fragment_definitions(context, &descriptor.closure)?);
            string_literal(&definitions, operation_meta(context, descriptor))?
        }
        DocumentMode::Tag => tag_literal(context, &definitions),
    };
    Ok(format!(
        "{}const {constant} = {body} as unknown as {}<{result}, {variables}>;",
        options.export(),
        document_type(options.document_mode),
    ))
}

fn document_type(mode: DocumentMode) -> &'static str {
    match mode {
        DocumentMode::Ast | DocumentMode::Tag => "DocumentNode",
        DocumentMode::String => "TypedDocumentString",
    }
}

/// `hash` when persisted documents are emitted beside, `deferredFields` when any fragment is deferred.
fn operation_meta(
    context: &EmitContext<'_>,
    descriptor: &OperationDescriptor,
) -> Option<Map<String, Value>> {
    let mut meta = Map::new();
    if context.destination.runs(EmitterKind::PersistedDocuments) {
        meta.insert("hash".to_owned(), Value::from(descriptor.hash.as_str()));
    }
    if !descriptor.deferred_fields.is_empty() {
        let deferred = descriptor
            .deferred_fields
            .iter()
            .map(|(fragment, fields)| (fragment.clone(), Value::from(fields.clone())))
            .collect();
        meta.insert("deferredFields".to_owned(), Value::Object(deferred));
    }
    (!meta.is_empty()).then_some(meta)
}

fn ast_literal(
    definitions: &[ast::Definition],
    meta: Option<Map<String, Value>>,
) -> Result<String, EmitterError> {
    let mut document = document_node(definitions);
    if let (Some(meta), Value::Object(object)) = (meta, &mut document) {
        object.insert("__meta__".to_owned(), Value::Object(meta));
    }
    serde_json::to_string(&document).map_err(|error| EmitterError::Serialize(error.to_string()))
}

fn print(definitions: &[ast::Definition]) -> String {
    let mut document = ast::Document::new();
    document.definitions.extend(definitions.iter().cloned());
    document.to_string().trim().to_owned()
}

fn string_literal(
    definitions: &[ast::Definition],
    meta: Option<Map<String, Value>>,
) -> Result<String, EmitterError> {
    let text = template_text(&print(definitions));
    Ok(match meta {
        Some(meta) => {
            let meta = serde_json::to_string(&meta)
                .map_err(|error| EmitterError::Serialize(error.to_string()))?;
            format!("new TypedDocumentString(`\n    {text}\n    `, {meta})")
        }
        None => format!("new TypedDocumentString(`\n    {text}\n    `)"),
    })
}

/// A `gql` template interpolating the documents of the directly spread fragments.
fn tag_literal(context: &EmitContext<'_>, definitions: &[ast::Definition]) -> String {
    let convention = context.options.naming_convention;
    let mut interpolations = Vec::new();
    for definition in definitions {
        let selections = match definition {
            ast::Definition::OperationDefinition(operation) => &operation.selection_set,
            ast::Definition::FragmentDefinition(fragment) => &fragment.selection_set,
            _ => continue,
        };
        for spread in direct_spreads(selections) {
            interpolations.push(format!(
                "${{{}}}",
                naming::fragment_document_name(&spread, convention)
            ));
        }
    }
    let interpolations = interpolations.join("\n");
    format!(
        "gql`\n    {}\n    {interpolations}`",
        template_text(&print(definitions))
    )
}

/// Escapes text for a template literal.
fn template_text(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('`', "\\`")
        .replace("${", "\\${")
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::emit::test_support::Fixture;

    const DOCUMENTS: [(&str, &str); 2] = [
        (
            "user.graphql",
            "query GetUser($id: ID!) { user(id: $id) { ...UserFields } }",
        ),
        (
            "fragments.graphql",
            "fragment UserFields on User { id ...Names } fragment Names on User { name }",
        ),
    ];

    fn declarations(text: &str) -> Vec<&str> {
        text.trim()
            .split("\n\n")
            .filter(|declaration| declaration.starts_with("export const"))
            .collect()
    }

    #[test]
    fn fragments_follow_their_dependencies() {
        let fixture = Fixture::new(&DOCUMENTS);
        let fragments = fixture.emit(EmitterKind::TypedDocumentNode).unwrap();
        assert_eq!(fragments[0].placement, Placement::Prepend);
        let text = String::from_utf8(fragments[1].bytes.clone()).unwrap();
        let constants = declarations(&text)
            .into_iter()
            .map(|declaration| declaration.split(' ').nth(2).unwrap())
            .collect::<Vec<_>>();
        assert_eq!(
            constants,
            ["NamesFragmentDoc", "UserFieldsFragmentDoc", "GetUserDocument"]
        );
    }

    #[test]
    fn ast_documents() {
        let fixture = Fixture::new(&DOCUMENTS);
        let text = fixture.text(EmitterKind::TypedDocumentNode);
        let declarations = declarations(&text);
        insta::assert_snapshot!(declarations[0], @r#"export const NamesFragmentDoc = {"kind":"Document","definitions":[{"kind":"FragmentDefinition","name":{"kind":"Name","value":"Names"},"typeCondition":{"kind":"NamedType","name":{"kind":"Name","value":"User"}},"selectionSet":{"kind":"SelectionSet","selections":[{"kind":"Field","name":{"kind":"Name","value":"name"}}]}}]} as unknown as DocumentNode<NamesFragment, unknown>;"#);
        assert!(declarations[2].ends_with(
            r#"as unknown as DocumentNode<GetUserQuery, GetUserQueryVariables>;"#
        ));
        let operation = declarations[2];
        let names_at = operation.find(r#""value":"Names"}"#).unwrap();
        let user_fields_at = operation.find(r#""value":"UserFields"},"typeCondition""#).unwrap();
        assert!(names_at < user_fields_at);
        assert!(!operation.contains("__meta__"));
    }

    #[test]
    fn meta_carries_hash_and_deferred_fields() {
        let mut fixture = Fixture::new(&[(
            "user.graphql",
            "query GetUser { user(id: 1) { id ...Names @defer } } fragment Names on User { name }",
        )]);
        fixture.destination.emitters = vec![
            EmitterKind::TypedDocumentNode,
            EmitterKind::PersistedDocuments,
        ];
        let text = fixture.text(EmitterKind::TypedDocumentNode);
        let operation = declarations(&text)[1];
        assert!(
            operation.contains(r#""__meta__":{"hash":""#),
            "{operation}"
        );
        assert!(operation.contains(r#""deferredFields":{"Names":["name"]}}} as unknown"#));
    }

    #[test]
    fn tag_documents_interpolate_fragments() {
        let mut fixture = Fixture::new(&DOCUMENTS);
        fixture.options.document_mode = DocumentMode::Tag;
        let text = fixture.text(EmitterKind::TypedDocumentNode);
        assert!(text.starts_with("import { TypedDocumentNode as DocumentNode } from '@graphql-typed-document-node/core';\nimport gql from 'graphql-tag';\n"));
        let operation = declarations(&text)[2];
        assert!(operation.starts_with("export const GetUserDocument = gql`\n    query GetUser($id: ID!) {"));
        assert!(operation.ends_with(
            "\n    ${UserFieldsFragmentDoc}` as unknown as DocumentNode<GetUserQuery, GetUserQueryVariables>;"
        ));
        assert!(!operation.contains("fragment Names"));
    }

    #[test]
    fn string_documents() {
        let mut fixture = Fixture::new(&DOCUMENTS);
        fixture.options.document_mode = DocumentMode::String;
        fixture.options.string_mode_ready_guard = true;
        let text = fixture.text(EmitterKind::TypedDocumentNode);
        assert!(text.contains("export class TypedDocumentString<TResult, TVariables>"));
        let operation = &text[text.find("export const GetUserDocument").unwrap()..];
        assert!(operation.contains("fragment Names on User"));
        assert!(operation.ends_with(
            "`) as unknown as TypedDocumentString<GetUserQuery, GetUserQueryVariables>;"
        ));
        assert!(text.contains(r#"`, {"fragmentName":"Names"}) as unknown as TypedDocumentString<NamesFragment, unknown>;"#));
    }
}
