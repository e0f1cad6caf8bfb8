//! The `graphql(source)` registry mapping document sources to typed documents.
use apollo_compiler::ast;

use crate::configuration::DocumentMode;
use crate::document::Document;
use crate::emit::EmitContext;
use crate::emit::Emitter;
use crate::emit::GQL_MODULE;
use crate::error::EmitterError;
use crate::naming;
use crate::placement::ArtifactFragment;
use crate::placement::Placement;

pub(crate) struct GqlTagRegistry;

impl Emitter for GqlTagRegistry {
    fn emit(&self, context: &EmitContext<'_>) -> Result<Vec<ArtifactFragment>, EmitterError> {
        let options = context.options;
        let function = &options.gql_tag_name;
        let mut entries = Vec::new();
        for document in context.documents.documents() {
            let Some(constant) = document_constant(context, document) else {
                continue;
            };
            let key = serde_json::to_string(document.text())
                .map_err(|error| EmitterError::Serialize(error.to_string()))?;
            entries.push((key, constant));
        }

        let mut text = String::from("/* eslint-disable */\n");
        text.push_str(&format!(
            "import * as types from '{}';\n",
            context.destination.base_module()
        ));
        if options.document_mode != DocumentMode::String {
            text.push_str("import { TypedDocumentNode as DocumentNode } from '@graphql-typed-document-node/core';\n");
        }
        text.push_str("\n/**\n * Map of all GraphQL operations in the project.\n */\ntype Documents = {\n");
        for (key, constant) in &entries {
            text.push_str(&format!("    {key}: typeof types.{constant},\n"));
        }
        text.push_str("};\nconst documents: Documents = {\n");
        for (key, constant) in &entries {
            text.push_str(&format!("    {key}: types.{constant},\n"));
        }
        text.push_str("};\n\n");

        text.push_str(&format!(
            "/**\n * The {function} function is used to parse GraphQL queries into a document that can be used by GraphQL clients.\n */\nexport function {function}(source: string): unknown;\n"
        ));
        for (key, _) in &entries {
            text.push_str(&format!(
                "\n/**\n * The {function} function is used to parse GraphQL queries into a document that can be used by GraphQL clients.\n */\nexport function {function}(source: {key}): (typeof documents)[{key}];\n"
            ));
        }
        text.push_str(&format!(
            "\nexport function {function}(source: string) {{\n  return (documents as any)[source] ?? {{}};\n}}\n"
        ));
        if options.document_mode != DocumentMode::String {
            text.push_str("\nexport type DocumentType<TDocumentNode extends DocumentNode<any, any>> = TDocumentNode extends DocumentNode<infer TType, any> ? TType : never;\n");
        }

        tracing::debug!(sources = entries.len(), "emitted gql tag registry");
        Ok(vec![ArtifactFragment::new(
            format!("{GQL_MODULE}.ts"),
            text,
            Placement::Append,
        )])
    }
}

/// The constant of the first named definition of `document`.
fn document_constant(context: &EmitContext<'_>, document: &Document) -> Option<String> {
    let convention = context.options.naming_convention;
    document
        .ast()
        .definitions
        .iter()
        .find_map(|definition| match definition {
            ast::Definition::OperationDefinition(operation) => operation
                .name
                .as_ref()
                .filter(|name| context.documents.operation(name).is_some())
                .map(|name| naming::operation_document_name(name, convention)),
            ast::Definition::FragmentDefinition(fragment) => Some(naming::fragment_document_name(
                &fragment.name,
                convention,
            )),
            _ => None,
        })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::emit::EmitterKind;
    use crate::emit::test_support::Fixture;

    #[test]
    fn registry() {
        let fixture = Fixture::new(&[
            ("user.graphql", "query GetUser { user(id: 1) { ...UserFields } }"),
            ("fields.graphql", "fragment UserFields on User { id }"),
        ]);
        let fragments = fixture.emit(EmitterKind::GqlTagRegistry).unwrap();
        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0].path, "gql.ts");
        insta::assert_snapshot!(String::from_utf8(fragments[0].bytes.clone()).unwrap(), @r#"
        /* eslint-disable */
        import * as types from './graphql';
        import { TypedDocumentNode as DocumentNode } from '@graphql-typed-document-node/core';

        /**
         * Map of all GraphQL operations in the project.
         */
        type Documents = {
            "query GetUser { user(id: 1) { ...UserFields } }": typeof types.GetUserDocument,
            "fragment UserFields on User { id }": typeof types.UserFieldsFragmentDoc,
        };
        const documents: Documents = {
            "query GetUser { user(id: 1) { ...UserFields } }": types.GetUserDocument,
            "fragment UserFields on User { id }": types.UserFieldsFragmentDoc,
        };

        /**
         * The graphql function is used to parse GraphQL queries into a document that can be used by GraphQL clients.
         */
        export function graphql(source: string): unknown;

        /**
         * The graphql function is used to parse GraphQL queries into a document that can be used by GraphQL clients.
         */
        export function graphql(source: "query GetUser { user(id: 1) { ...UserFields } }"): (typeof documents)["query GetUser { user(id: 1) { ...UserFields } }"];

        /**
         * The graphql function is used to parse GraphQL queries into a document that can be used by GraphQL clients.
         */
        export function graphql(source: "fragment UserFields on User { id }"): (typeof documents)["fragment UserFields on User { id }"];

        export function graphql(source: string) {
          return (documents as any)[source] ?? {};
        }

        export type DocumentType<TDocumentNode extends DocumentNode<any, any>> = TDocumentNode extends DocumentNode<infer TType, any> ? TType : never;
        "#);
    }

    #[test]
    fn multiline_sources_are_escaped() {
        let mut fixture = Fixture::new(&[("me.graphql", "query Me {\n  user(id: \"1\") { id }\n}\n")]);
        fixture.options.gql_tag_name = "gql".to_owned();
        fixture.options.document_mode = DocumentMode::String;
        let text = fixture.text(EmitterKind::GqlTagRegistry);
        assert!(text.contains(
            r#"    "query Me {\n  user(id: \"1\") { id }\n}\n": typeof types.MeDocument,"#
        ));
        assert!(text.contains("export function gql(source: string) {"));
        assert!(!text.contains("DocumentNode"));
    }
}
