//! Helpers reading masked fragment data.
use crate::configuration::DocumentMode;
use crate::emit::EmitContext;
use crate::emit::Emitter;
use crate::emit::FRAGMENT_MASKING_MODULE;
use crate::error::EmitterError;
use crate::placement::ArtifactFragment;
use crate::placement::Placement;

const FRAGMENT_TYPE: &str = "export type FragmentType<TDocumentType extends DocumentTypeDecoration<any, any>> = TDocumentType extends DocumentTypeDecoration<
  infer TType,
  any
>
  ? [TType] extends [{ ' $fragmentName'?: infer TKey }]
    ? TKey extends string
      ? { ' $fragmentRefs'?: { [key in TKey]: TType } }
      : never
    : never
  : never;
";

/// Overloads as `(comment, parameter type, return type)`.
const OVERLOADS: [(&str, &str, &str); 8] = [
    (
        "return non-nullable if `fragmentType` is non-nullable",
        "FragmentType<DocumentTypeDecoration<TType, any>>",
        "TType",
    ),
    (
        "return nullable if `fragmentType` is undefined",
        "FragmentType<DocumentTypeDecoration<TType, any>> | undefined",
        "TType | undefined",
    ),
    (
        "return nullable if `fragmentType` is nullable",
        "FragmentType<DocumentTypeDecoration<TType, any>> | null",
        "TType | null",
    ),
    (
        "return nullable if `fragmentType` is nullable or undefined",
        "FragmentType<DocumentTypeDecoration<TType, any>> | null | undefined",
        "TType | null | undefined",
    ),
    (
        "return array of non-nullable if `fragmentType` is array of non-nullable",
        "Array<FragmentType<DocumentTypeDecoration<TType, any>>>",
        "Array<TType>",
    ),
    (
        "return array of nullable if `fragmentType` is array of nullable",
        "Array<FragmentType<DocumentTypeDecoration<TType, any>>> | null | undefined",
        "Array<TType> | null | undefined",
    ),
    (
        "return readonly array of non-nullable if `fragmentType` is array of non-nullable",
        "ReadonlyArray<FragmentType<DocumentTypeDecoration<TType, any>>>",
        "ReadonlyArray<TType>",
    ),
    (
        "return readonly array of nullable if `fragmentType` is array of nullable",
        "ReadonlyArray<FragmentType<DocumentTypeDecoration<TType, any>>> | null | undefined",
        "ReadonlyArray<TType> | null | undefined",
    ),
];

const MAKE_FRAGMENT_DATA: &str = "export function makeFragmentData<
  F extends DocumentTypeDecoration<any, any>,
  FT extends ResultOf<F>
>(data: FT, _fragment: F): FragmentType<F> {
  return data as FragmentType<F>;
}
";

const DOCUMENT_READY_GUARD: &str = "export function isFragmentReady<TQuery, TFrag>(
  queryNode: DocumentTypeDecoration<TQuery, any>,
  fragmentNode: TypedDocumentNode<TFrag>,
  data: FragmentType<TypedDocumentNode<Incremental<TFrag>, any>> | null | undefined
): data is FragmentType<typeof fragmentNode> {
  const deferredFields = (queryNode as { __meta__?: { deferredFields: Record<string, (keyof TFrag)[]> } }).__meta__
    ?.deferredFields;

  if (!deferredFields) return true;

  const fragDef = fragmentNode.definitions[0] as FragmentDefinitionNode | undefined;
  const fragName = fragDef?.name?.value;

  const fields = (fragName && deferredFields[fragName]) || [];
  return fields.length > 0 && fields.every(field => data && field in data);
}
";

const STRING_READY_GUARD: &str = "export function isFragmentReady<TQuery, TFrag>(
  queryNode: TypedDocumentString<TQuery, any>,
  fragmentNode: TypedDocumentString<TFrag, any>,
  data: FragmentType<TypedDocumentString<Incremental<TFrag>, any>> | null | undefined
): data is FragmentType<typeof fragmentNode> {
  const deferredFields = queryNode.__meta__?.deferredFields as Record<string, (keyof TFrag)[]>;
  const fragName = fragmentNode.__meta__?.fragmentName as string | undefined;

  if (!deferredFields || !fragName) return true;

  const fields = deferredFields[fragName] ?? [];
  return fields.length > 0 && fields.every(field => data && field in data);
}
";

pub(crate) struct FragmentMasking;

impl Emitter for FragmentMasking {
    fn emit(&self, context: &EmitContext<'_>) -> Result<Vec<ArtifactFragment>, EmitterError> {
        let options = context.options;
        let base_module = context.destination.base_module();
        let string_guard =
            options.document_mode == DocumentMode::String && options.string_mode_ready_guard;

        let mut text = String::from("/* eslint-disable */\n");
        if string_guard {
            text.push_str("import { ResultOf, DocumentTypeDecoration } from '@graphql-typed-document-node/core';\n");
            text.push_str(&format!(
                "import {{ Incremental, TypedDocumentString }} from '{base_module}';\n"
            ));
        } else {
            text.push_str("import { ResultOf, DocumentTypeDecoration, TypedDocumentNode } from '@graphql-typed-document-node/core';\n");
            text.push_str("import { FragmentDefinitionNode } from 'graphql';\n");
            text.push_str(&format!("import {{ Incremental }} from '{base_module}';\n"));
        }
        text.push('\n');
        text.push_str(FRAGMENT_TYPE);

        let function = &options.unmask_function_name;
        for (comment, parameter, result) in OVERLOADS {
            text.push_str(&format!(
                "\n// {comment}\nexport function {function}<TType>(\n  _documentNode: DocumentTypeDecoration<TType, any>,\n  fragmentType: {parameter}\n): {result};\n"
            ));
        }
        text.push_str(&format!(
            "export function {function}<TType>(
  _documentNode: DocumentTypeDecoration<TType, any>,
  fragmentType: FragmentType<DocumentTypeDecoration<TType, any>> | Array<FragmentType<DocumentTypeDecoration<TType, any>>> | ReadonlyArray<FragmentType<DocumentTypeDecoration<TType, any>>> | null | undefined
): TType | Array<TType> | ReadonlyArray<TType> | null | undefined {{
  return fragmentType as any;
}}
"
        ));
        text.push('\n');
        text.push_str(MAKE_FRAGMENT_DATA);
        text.push_str(if string_guard {
            STRING_READY_GUARD
        } else {
            DOCUMENT_READY_GUARD
        });

        Ok(vec![ArtifactFragment::new(
            format!("{FRAGMENT_MASKING_MODULE}.ts"),
            text,
            Placement::Append,
        )])
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::emit::EmitterKind;
    use crate::emit::test_support::Fixture;

    #[test]
    fn helpers_use_the_configured_function_name() {
        let mut fixture = Fixture::new(&[]);
        fixture.options.unmask_function_name = "useFragment".to_owned();
        let fragments = fixture.emit(EmitterKind::FragmentMasking).unwrap();
        assert_eq!(fragments[0].path, "fragment-masking.ts");
        let text = String::from_utf8(fragments[0].bytes.clone()).unwrap();
        assert_eq!(text.matches("export function useFragment<TType>(").count(), 9);
        assert!(text.contains("import { Incremental } from './graphql';"));
        assert!(text.contains("fragmentNode.definitions[0] as FragmentDefinitionNode"));
        assert!(text.contains("export function makeFragmentData<"));
        assert!(!text.contains("unmaskFragment"));
    }

    #[test]
    fn string_guard_needs_string_documents() {
        let mut fixture = Fixture::new(&[]);
        fixture.options.string_mode_ready_guard = true;
        let text = fixture.text(EmitterKind::FragmentMasking);
        assert!(text.contains("FragmentDefinitionNode"));

        fixture.options.document_mode = DocumentMode::String;
        let text = fixture.text(EmitterKind::FragmentMasking);
        assert!(!text.contains("FragmentDefinitionNode"));
        assert!(text.contains("fragmentNode.__meta__?.fragmentName"));
        assert!(text.contains("import { Incremental, TypedDocumentString } from './graphql';"));
    }
}
