//! Selection-set type synthesis.
//!
//! Walks operation and fragment selection sets against the schema and produces [`TypeIr`]
//! shapes. Fields are merged by response name, fragments are applied by type condition, and the
//! GraphQL list/non-null modifiers are mirrored outside-in.

pub mod descriptor;
pub mod ir;

use apollo_compiler::ExecutableDocument;
use apollo_compiler::Name;
use apollo_compiler::ast;
use apollo_compiler::executable::Fragment;
use apollo_compiler::executable::Operation;
use apollo_compiler::executable::Selection;
use indexmap::IndexMap;

use crate::configuration::EmitterOptions;
use crate::configuration::InlineFragmentTypes;
use crate::configuration::NamingConvention;
use crate::error::SynthesisError;
use crate::naming;
use crate::naming::operation_keyword;
use crate::schema::SchemaModel;
use crate::schema::TypeKind;
pub use crate::synthesis::ir::FieldIr;
pub use crate::synthesis::ir::ObjectIr;
pub use crate::synthesis::ir::TypeIr;

/// Field holding the fragments spread into a masked selection.
pub const FRAGMENT_REFS_FIELD: &str = " $fragmentRefs";
/// Field naming the fragment a masked fragment type belongs to.
pub const FRAGMENT_NAME_FIELD: &str = " $fragmentName";

/// Options that change the synthesized shapes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SynthesisOptions {
    pub skip_typename: bool,
    pub non_optional_typename: bool,
    pub avoid_optionals: bool,
    pub immutable_types: bool,
    pub mask_fragments: bool,
    pub naming_convention: NamingConvention,
}

impl From<&EmitterOptions> for SynthesisOptions {
    fn from(options: &EmitterOptions) -> Self {
        Self {
            skip_typename: options.skip_typename,
            non_optional_typename: options.non_optional_typename,
            avoid_optionals: options.avoid_optionals,
            immutable_types: options.immutable_types,
            mask_fragments: options.inline_fragment_types == InlineFragmentTypes::Mask,
            naming_convention: options.naming_convention,
        }
    }
}

/// How the `__typename` of an object is typed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Typename {
    /// The concrete type is known; optional unless configured otherwise.
    Concrete,
    /// An option of a union; always a required literal.
    UnionOption,
    /// An interface kept as a single object; typed as `String`.
    Interface,
}

/// Selections contributing to one response name.
struct Entry<'a> {
    field_name: Name,
    selections: Vec<&'a [Selection]>,
    /// At least one contribution is neither skipped, included conditionally nor deferred.
    unconditional: bool,
}

#[derive(Default)]
struct Collected<'a> {
    entries: IndexMap<Name, Entry<'a>>,
    fragment_refs: Vec<Name>,
}

/// Produces Type IR for the operations and fragments of one executable document.
pub struct Synthesizer<'a> {
    schema: &'a SchemaModel,
    document: &'a ExecutableDocument,
    options: SynthesisOptions,
}

impl<'a> Synthesizer<'a> {
    pub fn new(
        schema: &'a SchemaModel,
        document: &'a ExecutableDocument,
        options: SynthesisOptions,
    ) -> Self {
        Self {
            schema,
            document,
            options,
        }
    }

    pub fn options(&self) -> SynthesisOptions {
        self.options
    }

    /// Record of the operation's variables.
    pub fn variables(&self, operation: &Operation) -> Result<ObjectIr, SynthesisError> {
        let mut fields = Vec::with_capacity(operation.variables.len());
        for variable in &operation.variables {
            let named = variable.ty.inner_named_type();
            let inner = match self.schema.kind(named) {
                Some(TypeKind::Scalar) => TypeIr::Scalar(named.to_string()),
                Some(TypeKind::Enum) => TypeIr::EnumRef(named.to_string()),
                Some(TypeKind::InputObject) => TypeIr::InputRef(named.to_string()),
                Some(_) => return Err(SynthesisError::NotAnInputType(named.to_string())),
                None => return Err(SynthesisError::UnknownType(named.to_string())),
            };
            let non_null = variable.ty.is_non_null();
            fields.push(FieldIr {
                name: variable.name.to_string(),
                optional: !self.options.avoid_optionals
                    && (!non_null || variable.default_value.is_some()),
                nullable: !non_null,
                readonly: self.options.immutable_types,
                ty: self.wrap(&variable.ty, inner),
            });
        }
        Ok(ObjectIr::new(fields))
    }

    /// Shape of the operation's result.
    pub fn operation(&self, operation: &'a Operation) -> Result<TypeIr, SynthesisError> {
        let root = self
            .schema
            .root_type(operation.operation_type)
            .ok_or_else(|| {
                SynthesisError::MissingRootType(
                    operation_keyword(operation.operation_type).to_owned(),
                )
            })?;
        self.shape(root, &[&operation.selection_set.selections])
    }

    /// Shape of a fragment on its type condition.
    pub fn fragment(&self, fragment: &'a Fragment) -> Result<TypeIr, SynthesisError> {
        let mut shape = self.shape(
            fragment.type_condition(),
            &[&fragment.selection_set.selections],
        )?;
        if self.options.mask_fragments {
            let type_name = naming::fragment_type_name(&fragment.name, self.options.naming_convention);
            let marker = FieldIr {
                name: FRAGMENT_NAME_FIELD.to_owned(),
                optional: true,
                nullable: false,
                readonly: self.options.immutable_types,
                ty: TypeIr::Literal(type_name),
            };
            match &mut shape {
                TypeIr::Object(object) => object.fields.push(marker),
                TypeIr::Union(options) => {
                    for option in options {
                        option.fields.push(marker.clone());
                    }
                }
                _ => {}
            }
        }
        Ok(shape)
    }

    /// Shape of `selections` on a composite type.
    fn shape(&self, parent: &str, selections: &[&'a [Selection]]) -> Result<TypeIr, SynthesisError> {
        match self.schema.kind(parent) {
            Some(TypeKind::Object) => Ok(TypeIr::Object(self.object(
                parent,
                selections,
                Typename::Concrete,
            )?)),
            Some(TypeKind::Union) => self.expand(parent, selections),
            Some(TypeKind::Interface) => {
                if self.narrows(parent, selections, &mut Vec::new())? {
                    self.expand(parent, selections)
                } else {
                    Ok(TypeIr::Object(self.object(
                        parent,
                        selections,
                        Typename::Interface,
                    )?))
                }
            }
            _ => Err(SynthesisError::UnknownType(parent.to_owned())),
        }
    }

    /// One option per possible concrete type.
    fn expand(&self, parent: &str, selections: &[&'a [Selection]]) -> Result<TypeIr, SynthesisError> {
        let options = self
            .schema
            .possible_types(parent)
            .iter()
            .map(|member| self.object(member, selections, Typename::UnionOption))
            .collect::<Result<Vec<_>, _>>()?;
        tracing::trace!(parent, options = options.len(), "expanded abstract type");
        Ok(TypeIr::Union(options))
    }

    /// Whether a fragment in `selections` targets a type `parent` does not satisfy.
    fn narrows(
        &self,
        parent: &str,
        selections: &[&'a [Selection]],
        visited: &mut Vec<Name>,
    ) -> Result<bool, SynthesisError> {
        for selection in selections.iter().flat_map(|selections| selections.iter()) {
            match selection {
                Selection::Field(_) => {}
                Selection::InlineFragment(inline) => {
                    if let Some(condition) = &inline.type_condition {
                        if !self.schema.condition_applies(condition, parent) {
                            return Ok(true);
                        }
                    }
                    if self.narrows(parent, &[&inline.selection_set.selections], visited)? {
                        return Ok(true);
                    }
                }
                Selection::FragmentSpread(spread) => {
                    let fragment = self.fragment_definition(&spread.fragment_name)?;
                    if !self
                        .schema
                        .condition_applies(fragment.type_condition(), parent)
                    {
                        return Ok(true);
                    }
                    if visited.contains(&spread.fragment_name) {
                        continue;
                    }
                    visited.push(spread.fragment_name.clone());
                    if self.narrows(parent, &[&fragment.selection_set.selections], visited)? {
                        return Ok(true);
                    }
                }
            }
        }
        Ok(false)
    }

    fn object(
        &self,
        parent: &str,
        selections: &[&'a [Selection]],
        typename: Typename,
    ) -> Result<ObjectIr, SynthesisError> {
        let mut collected = Collected::default();
        for selections in selections {
            self.collect(parent, selections, false, &mut Vec::new(), &mut collected)?;
        }

        let readonly = self.options.immutable_types;
        let mut leaves = Vec::new();
        let mut composites = Vec::new();

        let explicit_typename = collected.entries.contains_key("__typename");
        if !explicit_typename {
            let synthesized = match typename {
                Typename::UnionOption => Some(FieldIr {
                    readonly,
                    ..FieldIr::required("__typename", TypeIr::Literal(parent.to_owned()))
                }),
                Typename::Concrete | Typename::Interface if !self.options.skip_typename => {
                    Some(FieldIr {
                        name: "__typename".to_owned(),
                        optional: !(self.options.non_optional_typename
                            || self.options.avoid_optionals),
                        nullable: false,
                        readonly,
                        ty: typename_type(typename, parent),
                    })
                }
                _ => None,
            };
            leaves.extend(synthesized);
        }

        for (response_name, entry) in collected.entries {
            if entry.field_name.as_str() == "__typename" {
                leaves.push(FieldIr {
                    readonly,
                    ..FieldIr::required(response_name.as_str(), typename_type(typename, parent))
                });
                continue;
            }
            let definition = self
                .schema
                .schema()
                .type_field(parent, &entry.field_name)
                .map_err(|_| SynthesisError::UnknownField {
                    type_name: parent.to_owned(),
                    field: entry.field_name.to_string(),
                })?;
            let named = definition.ty.inner_named_type();
            let kind = self
                .schema
                .kind(named)
                .ok_or_else(|| SynthesisError::UnknownType(named.to_string()))?;
            let inner = match kind {
                TypeKind::Scalar => TypeIr::Scalar(named.to_string()),
                TypeKind::Enum => TypeIr::EnumRef(named.to_string()),
                _ => self.shape(named, &entry.selections)?,
            };
            let non_null = definition.ty.is_non_null();
            let field = FieldIr {
                name: response_name.to_string(),
                optional: !self.options.avoid_optionals && (!non_null || !entry.unconditional),
                nullable: !non_null,
                readonly,
                ty: self.wrap(&definition.ty, inner),
            };
            if kind.is_leaf() {
                leaves.push(field);
            } else {
                composites.push(field);
            }
        }

        let mut fields = leaves;
        fields.append(&mut composites);
        if !collected.fragment_refs.is_empty() {
            let refs = collected
                .fragment_refs
                .iter()
                .map(|name| {
                    let type_name =
                        naming::fragment_type_name(name, self.options.naming_convention);
                    FieldIr::required(type_name.clone(), TypeIr::NamedRef(type_name))
                })
                .collect();
            fields.push(FieldIr {
                name: FRAGMENT_REFS_FIELD.to_owned(),
                optional: true,
                nullable: false,
                readonly,
                ty: TypeIr::Object(ObjectIr::new(refs)),
            });
        }
        Ok(ObjectIr::new(fields))
    }

    /// Gathers the fields of `selections` that apply to `parent`, merged by response name.
    fn collect(
        &self,
        parent: &str,
        selections: &'a [Selection],
        conditional: bool,
        visited: &mut Vec<Name>,
        collected: &mut Collected<'a>,
    ) -> Result<(), SynthesisError> {
        for selection in selections {
            match selection {
                Selection::Field(field) => {
                    let conditional = conditional || is_conditional(&field.directives);
                    let entry = collected
                        .entries
                        .entry(field.response_key().clone())
                        .or_insert_with(|| Entry {
                            field_name: field.name.clone(),
                            selections: Vec::new(),
                            unconditional: false,
                        });
                    if !field.selection_set.selections.is_empty() {
                        entry.selections.push(&field.selection_set.selections);
                    }
                    entry.unconditional |= !conditional;
                }
                Selection::InlineFragment(inline) => {
                    let applies = inline
                        .type_condition
                        .as_ref()
                        .is_none_or(|condition| self.schema.condition_applies(condition, parent));
                    if applies {
                        let conditional = conditional
                            || is_conditional(&inline.directives)
                            || is_deferred(&inline.directives);
                        self.collect(
                            parent,
                            &inline.selection_set.selections,
                            conditional,
                            visited,
                            collected,
                        )?;
                    }
                }
                Selection::FragmentSpread(spread) => {
                    let name = &spread.fragment_name;
                    let fragment = self.fragment_definition(name)?;
                    if !self
                        .schema
                        .condition_applies(fragment.type_condition(), parent)
                    {
                        tracing::trace!(fragment = %name, parent, "fragment does not apply");
                        continue;
                    }
                    if self.options.mask_fragments {
                        if !collected.fragment_refs.contains(name) {
                            collected.fragment_refs.push(name.clone());
                        }
                        continue;
                    }
                    if visited.contains(name) {
                        continue;
                    }
                    visited.push(name.clone());
                    let conditional = conditional
                        || is_conditional(&spread.directives)
                        || is_deferred(&spread.directives);
                    self.collect(
                        parent,
                        &fragment.selection_set.selections,
                        conditional,
                        visited,
                        collected,
                    )?;
                    visited.pop();
                }
            }
        }
        Ok(())
    }

    fn fragment_definition(&self, name: &Name) -> Result<&'a Fragment, SynthesisError> {
        self.document
            .fragments
            .get(name)
            .map(|fragment| &**fragment)
            .ok_or_else(|| SynthesisError::UnknownFragment(name.to_string()))
    }

    fn wrap(&self, ty: &ast::Type, inner: TypeIr) -> TypeIr {
        wrap_type(ty, inner, self.options.immutable_types)
    }
}

/// Mirrors the GraphQL modifiers of `ty` around `inner`, outside-in.
pub fn wrap_type(ty: &ast::Type, inner: TypeIr, readonly: bool) -> TypeIr {
    match ty {
        ast::Type::Named(_) => TypeIr::nullable(inner),
        ast::Type::NonNullNamed(_) => inner,
        ast::Type::List(element) => {
            TypeIr::nullable(TypeIr::array(wrap_type(element, inner, readonly), readonly))
        }
        ast::Type::NonNullList(element) => {
            TypeIr::array(wrap_type(element, inner, readonly), readonly)
        }
    }
}

fn typename_type(typename: Typename, parent: &str) -> TypeIr {
    match typename {
        Typename::Interface => TypeIr::Scalar("String".to_owned()),
        Typename::Concrete | Typename::UnionOption => TypeIr::Literal(parent.to_owned()),
    }
}

fn boolean_argument(directive: &ast::Directive, name: &str) -> Option<bool> {
    directive
        .arguments
        .iter()
        .find(|argument| argument.name.as_str() == name)
        .and_then(|argument| match &*argument.value {
            ast::Value::Boolean(value) => Some(*value),
            _ => None,
        })
}

/// `@skip`/`@include` whose outcome is not known statically.
fn is_conditional(directives: &ast::DirectiveList) -> bool {
    directives.iter().any(|directive| match directive.name.as_str() {
        "skip" => boolean_argument(directive, "if") != Some(false),
        "include" => boolean_argument(directive, "if") != Some(true),
        _ => false,
    })
}

pub(crate) fn is_deferred(directives: &ast::DirectiveList) -> bool {
    directives.iter().any(|directive| {
        directive.name.as_str() == "defer" && boolean_argument(directive, "if") != Some(false)
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::document::DocumentOptions;
    use crate::document::DocumentSet;
    use crate::document::SourceText;

    const SCHEMA: &str = r#"
        type Query {
          user(id: ID!): User
          me: User
          search(term: String!): [Result!]!
          node(id: ID!): Node
          scores: [Int]
          ids: [Int!]!
          users(limit: Int, filter: Filter, role: Role, ids: [ID!]): [User!]!
        }
        interface Node { id: ID! }
        type User implements Node { id: ID! name: String friends: [User!]! role: Role! }
        type Post implements Node { id: ID! title: String! }
        union Result = User | Post
        enum Role { ADMIN USER }
        input Filter { term: String! limit: Int }
    "#;

    fn setup(text: &str) -> (SchemaModel, DocumentSet) {
        let schema = SchemaModel::parse(SCHEMA, "schema.graphql").unwrap();
        let documents = DocumentSet::build(
            &schema,
            vec![SourceText::new("query.graphql", text)],
            DocumentOptions::default(),
            &CancellationToken::new(),
        )
        .unwrap();
        (schema, documents)
    }

    fn result(text: &str, name: &str, options: SynthesisOptions) -> TypeIr {
        let (schema, documents) = setup(text);
        let document = documents.executable();
        let synthesizer = Synthesizer::new(&schema, document, options);
        synthesizer
            .operation(&document.operations.named[name])
            .unwrap()
    }

    fn untyped() -> SynthesisOptions {
        SynthesisOptions {
            skip_typename: true,
            ..Default::default()
        }
    }

    fn field(name: &str, optional: bool, ty: TypeIr) -> FieldIr {
        FieldIr {
            name: name.to_owned(),
            optional,
            nullable: matches!(ty, TypeIr::Nullable(_)),
            readonly: false,
            ty,
        }
    }

    fn scalar(name: &str) -> TypeIr {
        TypeIr::Scalar(name.to_owned())
    }

    fn object(fields: Vec<FieldIr>) -> TypeIr {
        TypeIr::Object(ObjectIr::new(fields))
    }

    fn field_names(ty: &TypeIr) -> Vec<String> {
        match ty.innermost() {
            TypeIr::Object(object) => object.fields.iter().map(|f| f.name.clone()).collect(),
            other => panic!("not an object: {other:?}"),
        }
    }

    fn child<'t>(ty: &'t TypeIr, name: &str) -> &'t FieldIr {
        match ty.innermost() {
            TypeIr::Object(object) => object.field(name).unwrap(),
            other => panic!("not an object: {other:?}"),
        }
    }

    #[test]
    fn simple_query() {
        let (schema, documents) = setup("query GetUser($id: ID!) { user(id: $id) { id name } }");
        let document = documents.executable();
        let synthesizer = Synthesizer::new(&schema, document, untyped());
        let operation = &document.operations.named["GetUser"];

        assert_eq!(
            synthesizer.variables(operation).unwrap(),
            ObjectIr::new(vec![field("id", false, scalar("ID"))])
        );
        assert_eq!(
            synthesizer.operation(operation).unwrap(),
            object(vec![field(
                "user",
                true,
                TypeIr::nullable(object(vec![
                    field("id", false, scalar("ID")),
                    field("name", true, TypeIr::nullable(scalar("String"))),
                ]))
            )])
        );
    }

    #[test]
    fn union_options_carry_distinct_typenames() {
        let ty = result(
            "query S { search(term: \"x\") { __typename ... on User { name } ... on Post { title } } }",
            "S",
            untyped(),
        );
        let search = child(&ty, "search");
        let TypeIr::Array { element, .. } = &search.ty else {
            panic!("expected a list: {:?}", search.ty);
        };
        assert_eq!(
            **element,
            TypeIr::Union(vec![
                ObjectIr::new(vec![
                    field("__typename", false, TypeIr::Literal("User".to_owned())),
                    field("name", true, TypeIr::nullable(scalar("String"))),
                ]),
                ObjectIr::new(vec![
                    field("__typename", false, TypeIr::Literal("Post".to_owned())),
                    field("title", false, scalar("String")),
                ]),
            ])
        );
    }

    #[test]
    fn union_options_exist_for_every_member() {
        let ty = result(
            "query S { search(term: \"x\") { ... on User { id } } }",
            "S",
            untyped(),
        );
        let TypeIr::Union(options) = child(&ty, "search").ty.innermost() else {
            panic!("expected a union");
        };
        let typenames: Vec<_> = options.iter().map(|option| option.typename()).collect();
        assert_eq!(typenames, [Some("User"), Some("Post")]);
        assert_eq!(options[1].fields.len(), 1);
    }

    #[test]
    fn fragment_spreads_and_aliases_merge_by_response_name() {
        let ty = result(
            "query Me { me { ...F alias: name name } } fragment F on User { id name }",
            "Me",
            untyped(),
        );
        assert_eq!(field_names(&child(&ty, "me").ty), ["id", "name", "alias"]);
    }

    #[test]
    fn repeated_fields_merge_their_selections() {
        let ty = result(
            "query Me { me { friends { id } friends { name } } }",
            "Me",
            untyped(),
        );
        let friends = child(&child(&ty, "me").ty, "friends");
        assert_eq!(field_names(&friends.ty), ["id", "name"]);
    }

    #[test]
    fn scalars_come_before_objects() {
        let ty = result(
            "query Me { me { friends { id } id role } }",
            "Me",
            SynthesisOptions::default(),
        );
        assert_eq!(
            field_names(&child(&ty, "me").ty),
            ["__typename", "id", "role", "friends"]
        );
    }

    #[test]
    fn only_typename() {
        let ty = result("query Me { me { __typename } }", "Me", untyped());
        assert_eq!(
            child(&ty, "me").ty,
            TypeIr::nullable(object(vec![field(
                "__typename",
                false,
                TypeIr::Literal("User".to_owned())
            )]))
        );
    }

    #[test]
    fn list_wrappers() {
        let ty = result("query L { scores ids }", "L", untyped());
        assert_eq!(
            child(&ty, "scores").ty,
            TypeIr::nullable(TypeIr::array(TypeIr::nullable(scalar("Int")), false))
        );
        assert_eq!(
            child(&ty, "ids").ty,
            TypeIr::array(scalar("Int"), false)
        );
    }

    #[test]
    fn interface_fragments_apply_to_implementers() {
        let ty = result(
            "query Me { me { ...N } } fragment N on Node { id }",
            "Me",
            untyped(),
        );
        assert_eq!(field_names(&child(&ty, "me").ty), ["id"]);

        let ty = result(
            "query S { search(term: \"x\") { ... on Post { ...N } } } fragment N on Node { id }",
            "S",
            untyped(),
        );
        let TypeIr::Union(options) = child(&ty, "search").ty.innermost() else {
            panic!("expected a union");
        };
        assert_eq!(options[0].fields.len(), 1);
        assert!(options[1].field("id").is_some());
    }

    #[test]
    fn interfaces_stay_objects_unless_narrowed() {
        let ty = result("query N { node(id: 1) { id } }", "N", SynthesisOptions::default());
        assert_eq!(
            child(&ty, "node").ty,
            TypeIr::nullable(object(vec![
                field("__typename", true, scalar("String")),
                field("id", false, scalar("ID")),
            ]))
        );

        let ty = result(
            "query N { node(id: 1) { id ... on Post { title } } }",
            "N",
            untyped(),
        );
        let TypeIr::Union(options) = child(&ty, "node").ty.innermost() else {
            panic!("expected a union");
        };
        assert_eq!(options.len(), 2);
        assert_eq!(options[1].fields.len(), 3);
    }

    #[test]
    fn conditional_fields_are_optional() {
        let ty = result(
            "query Me($skip: Boolean!) { me { id @skip(if: $skip) name ... @defer { role } } }",
            "Me",
            untyped(),
        );
        let me = &child(&ty, "me").ty;
        assert!(child(me, "id").optional);
        assert!(child(me, "role").optional);
        assert!(!child(me, "role").nullable);

        let ty = result(
            "query Me($skip: Boolean!) { me { id @skip(if: $skip) id } }",
            "Me",
            untyped(),
        );
        assert!(!child(&child(&ty, "me").ty, "id").optional);
    }

    #[test]
    fn avoid_optionals_and_immutable_types() {
        let options = SynthesisOptions {
            avoid_optionals: true,
            immutable_types: true,
            ..untyped()
        };
        let ty = result("query Me { me { name friends { id } } }", "Me", options);
        let me = child(&ty, "me");
        assert!(!me.optional && me.nullable && me.readonly);
        let friends = child(&me.ty, "friends");
        assert!(matches!(friends.ty, TypeIr::Array { readonly: true, .. }));
    }

    #[test]
    fn variables() {
        let (schema, documents) = setup(
            r#"
            query V($id: ID!, $limit: Int = 10, $filter: Filter, $role: Role!, $ids: [ID!]) {
              user(id: $id) { id }
              users(limit: $limit, filter: $filter, role: $role, ids: $ids) { id }
            }
            "#,
        );
        let document = documents.executable();
        let synthesizer = Synthesizer::new(&schema, document, untyped());
        let variables = synthesizer
            .variables(&document.operations.named["V"])
            .unwrap();
        assert_eq!(
            variables,
            ObjectIr::new(vec![
                field("id", false, scalar("ID")),
                field("limit", true, TypeIr::nullable(scalar("Int"))),
                field("filter", true, TypeIr::nullable(TypeIr::InputRef("Filter".to_owned()))),
                field("role", false, TypeIr::EnumRef("Role".to_owned())),
                field(
                    "ids",
                    true,
                    TypeIr::nullable(TypeIr::array(scalar("ID"), false))
                ),
            ])
        );
    }

    #[test]
    fn masked_spreads_become_references() {
        let options = SynthesisOptions {
            mask_fragments: true,
            ..untyped()
        };
        let (schema, documents) =
            setup("query Me { me { id ...UserFields } } fragment UserFields on User { name }");
        let document = documents.executable();
        let synthesizer = Synthesizer::new(&schema, document, options);

        let ty = synthesizer
            .operation(&document.operations.named["Me"])
            .unwrap();
        let me = &child(&ty, "me").ty;
        assert_eq!(field_names(me), ["id", FRAGMENT_REFS_FIELD]);
        assert_eq!(
            child(me, FRAGMENT_REFS_FIELD).ty,
            object(vec![FieldIr::required(
                "UserFieldsFragment",
                TypeIr::NamedRef("UserFieldsFragment".to_owned())
            )])
        );

        let fragment = synthesizer
            .fragment(&document.fragments["UserFields"])
            .unwrap();
        assert_eq!(field_names(&fragment), ["name", FRAGMENT_NAME_FIELD]);
    }

    #[test]
    fn synthesis_is_deterministic() {
        let text = "query S { search(term: \"x\") { ... on User { id friends { name } } ... on Post { title } } me { role } }";
        let first = result(text, "S", SynthesisOptions::default());
        for _ in 0..5 {
            assert_eq!(result(text, "S", SynthesisOptions::default()), first);
        }
    }
}
