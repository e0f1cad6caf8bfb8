use pretty_assertions::assert_eq;
use serde_json::json;

use crate::Project;
use crate::text;

const SCHEMA: &str = "type Query { me: User } type User { id: ID! name: String avatar: String }";

fn project() -> Project {
    Project::new(SCHEMA)
        .document("src/me.graphql", "query Me { me { id ...Avatar } }")
        .document("src/avatar.graphql", "fragment Avatar on User { name avatar }")
}

#[test]
fn client_layout() {
    let output = project()
        .generate(json!({
            "schema": "schema.graphql",
            "documents": "src/**/*.graphql",
            "generates": {
                "src/gql/": {
                    "preset": "client",
                    "presetConfig": { "persistedDocuments": true },
                },
            },
        }))
        .unwrap();
    assert_eq!(
        output
            .artifacts
            .keys()
            .map(|path| path.to_str().unwrap())
            .collect::<Vec<_>>(),
        [
            "src/gql/graphql.ts",
            "src/gql/gql.ts",
            "src/gql/fragment-masking.ts",
            "src/gql/index.ts",
            "src/gql/persisted-documents.json",
        ]
    );

    let graphql = text(&output, "src/gql/graphql.ts");
    assert!(
        graphql.starts_with(
            "import { TypedDocumentNode as DocumentNode } from '@graphql-typed-document-node/core';\n"
        ),
        "{graphql}"
    );
    assert!(graphql.contains("export type Maybe<T> = T | null;"), "{graphql}");
    assert!(graphql.contains("export type User = {"), "{graphql}");
    assert!(
        graphql.contains(
            "export type MeQuery = { __typename?: 'Query', me?: { __typename?: 'User', id: Scalars['ID']['output'], ' $fragmentRefs'?: { AvatarFragment: AvatarFragment } } | null };"
        ),
        "{graphql}"
    );
    assert!(
        graphql.contains("' $fragmentName'?: 'AvatarFragment' };"),
        "{graphql}"
    );
    assert!(
        graphql.contains("export const AvatarFragmentDoc = {\"kind\":\"Document\""),
        "{graphql}"
    );
    assert!(graphql.contains("\"__meta__\":{\"hash\":\""), "{graphql}");
    assert!(
        graphql.contains("as unknown as DocumentNode<MeQuery, MeQueryVariables>;"),
        "{graphql}"
    );
    // Fragment documents come before the operations that spread them.
    assert!(
        graphql.find("export const AvatarFragmentDoc").unwrap()
            < graphql.find("export const MeDocument").unwrap()
    );

    assert_eq!(
        text(&output, "src/gql/index.ts"),
        "export * from \"./fragment-masking\";\nexport * from \"./gql\";\n"
    );
    let gql = text(&output, "src/gql/gql.ts");
    assert!(
        gql.contains("    \"query Me { me { id ...Avatar } }\": types.MeDocument,\n"),
        "{gql}"
    );
    let fragment_masking = text(&output, "src/gql/fragment-masking.ts");
    assert!(fragment_masking.contains("export function unmaskFragment<TType>("));

    let manifest: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(&text(&output, "src/gql/persisted-documents.json")).unwrap();
    assert_eq!(manifest.len(), 1);
    let (hash, document) = manifest.iter().next().unwrap();
    assert_eq!(hash.len(), 40);
    assert!(graphql.contains(&format!("\"__meta__\":{{\"hash\":\"{hash}\"}}")));
    let document = document.as_str().unwrap();
    assert!(
        document.starts_with("query Me {\n  me {\n    id\n    ...Avatar\n  }\n}"),
        "{document}"
    );
    assert!(
        document.ends_with("fragment Avatar on User {\n  name\n  avatar\n}"),
        "{document}"
    );
}

#[test]
fn preset_without_masking_inlines_fragments() {
    let output = project()
        .generate(json!({
            "schema": "schema.graphql",
            "documents": "src/**/*.graphql",
            "generates": {
                "src/gql/": {
                    "preset": "client",
                    "presetConfig": { "fragmentMasking": false },
                    "config": { "documentMode": "string" },
                },
            },
        }))
        .unwrap();
    assert!(output.get("src/gql/fragment-masking.ts").is_none());
    assert!(output.get("src/gql/persisted-documents.json").is_none());
    assert_eq!(text(&output, "src/gql/index.ts"), "export * from \"./gql\";\n");

    let graphql = text(&output, "src/gql/graphql.ts");
    assert!(
        graphql.contains(
            "me?: { __typename?: 'User', id: Scalars['ID']['output'], name?: Scalars['String']['output'] | null, avatar?: Scalars['String']['output'] | null } | null"
        ),
        "{graphql}"
    );
    assert!(
        graphql.contains("export class TypedDocumentString<TResult, TVariables>"),
        "{graphql}"
    );
    assert!(
        graphql.contains("export const MeDocument = new TypedDocumentString(`"),
        "{graphql}"
    );
}

#[test]
fn extra_plugins_run_after_the_preset() {
    let output = project()
        .generate(json!({
            "schema": "schema.graphql",
            "documents": "src/**/*.graphql",
            "generates": {
                "src/gql/": {
                    "preset": "client",
                    "plugins": [
                        { "add": { "content": "/* generated */" } },
                        { "add": { "content": "// end", "placement": "append", "target": "gql.ts" } },
                    ],
                },
            },
        }))
        .unwrap();
    assert!(text(&output, "src/gql/graphql.ts").starts_with("/* generated */\nimport "));
    assert!(text(&output, "src/gql/gql.ts").ends_with("? TType : never;\n// end\n"));
}

#[test]
fn preset_needs_a_directory() {
    let error = project()
        .generate(json!({
            "schema": "schema.graphql",
            "generates": { "src/gql.ts": { "preset": "client" } },
        }))
        .unwrap_err();
    assert_eq!(
        error.to_string(),
        "configuration error: the client preset needs a directory destination ending with '/', got 'src/gql.ts'"
    );
}
