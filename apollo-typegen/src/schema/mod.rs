//! GraphQL schema model.
//!
//! A [`SchemaModel`] is built once from one or more SDL sources, merged left to right, and is
//! immutable afterwards. It is shared by reference across the whole pipeline.

pub mod merge;

use apollo_compiler::Name;
use apollo_compiler::Schema;
use apollo_compiler::ast;
use apollo_compiler::executable::OperationType;
use apollo_compiler::schema::ExtendedType;
use apollo_compiler::validation::Valid;
use sha2::Digest;
use sha2::Sha256;

use crate::error::SchemaError;
use crate::schema::merge::MergePolicy;
use crate::schema::merge::ResolvedConflict;

/// One named SDL buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SdlSource {
    pub name: String,
    pub text: String,
}

impl SdlSource {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }
}

/// Kind of a named schema type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Scalar,
    Object,
    Interface,
    Union,
    Enum,
    InputObject,
}

impl TypeKind {
    pub(crate) fn of(ty: &ExtendedType) -> Self {
        match ty {
            ExtendedType::Scalar(_) => TypeKind::Scalar,
            ExtendedType::Object(_) => TypeKind::Object,
            ExtendedType::Interface(_) => TypeKind::Interface,
            ExtendedType::Union(_) => TypeKind::Union,
            ExtendedType::Enum(_) => TypeKind::Enum,
            ExtendedType::InputObject(_) => TypeKind::InputObject,
        }
    }

    pub fn is_leaf(self) -> bool {
        matches!(self, TypeKind::Scalar | TypeKind::Enum)
    }

    pub fn is_abstract(self) -> bool {
        matches!(self, TypeKind::Interface | TypeKind::Union)
    }

    pub(crate) fn describe(self) -> &'static str {
        match self {
            TypeKind::Scalar => "a scalar",
            TypeKind::Object => "an object type",
            TypeKind::Interface => "an interface",
            TypeKind::Union => "a union",
            TypeKind::Enum => "an enum",
            TypeKind::InputObject => "an input object",
        }
    }
}

/// A validated GraphQL schema.
#[derive(Debug, Clone)]
pub struct SchemaModel {
    schema: Valid<Schema>,
    resolved_conflicts: Vec<ResolvedConflict>,
    hash: String,
}

impl SchemaModel {
    /// Parses every source, then merges them left to right under `policy`.
    pub fn load(sources: &[SdlSource], policy: MergePolicy) -> Result<Self, SchemaError> {
        if sources.is_empty() {
            return Err(SchemaError::NoSources);
        }
        let parsed = sources
            .iter()
            .map(|source| {
                let schema = parse_source(source)?;
                Ok((source.name.clone(), schema))
            })
            .collect::<Result<Vec<_>, SchemaError>>()?;
        let mut merged = merge::merge_schemas(parsed, policy)?;
        add_client_directives(&mut merged.schema)?;
        let schema = merged
            .schema
            .validate()
            .map_err(|invalid| SchemaError::Validation(invalid.errors.into()))?;
        tracing::debug!(
            sources = sources.len(),
            types = schema.types.len(),
            resolved_conflicts = merged.resolved_conflicts.len(),
            "schema loaded"
        );
        Ok(Self::new(schema, merged.resolved_conflicts))
    }

    /// Parses a single SDL buffer.
    pub fn parse(sdl: &str, name: &str) -> Result<Self, SchemaError> {
        Self::load(&[SdlSource::new(name, sdl)], MergePolicy::Error)
    }

    fn new(schema: Valid<Schema>, resolved_conflicts: Vec<ResolvedConflict>) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(schema.to_string());
        let hash = format!("{:x}", hasher.finalize());
        Self {
            schema,
            resolved_conflicts,
            hash,
        }
    }

    pub fn schema(&self) -> &Valid<Schema> {
        &self.schema
    }

    /// SHA-256 of the printed merged schema.
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Conflicts settled by the `useFirst`/`useLast` merge policies.
    pub fn resolved_conflicts(&self) -> &[ResolvedConflict] {
        &self.resolved_conflicts
    }

    pub fn root_type(&self, operation_type: OperationType) -> Option<&Name> {
        let definition = &self.schema.schema_definition;
        let root = match operation_type {
            OperationType::Query => definition.query.as_ref(),
            OperationType::Mutation => definition.mutation.as_ref(),
            OperationType::Subscription => definition.subscription.as_ref(),
        };
        root.map(|component| &component.name)
    }

    pub fn get(&self, name: &str) -> Option<&ExtendedType> {
        self.schema.types.get(name)
    }

    pub fn kind(&self, name: &str) -> Option<TypeKind> {
        self.get(name).map(TypeKind::of)
    }

    /// Whether `object` declares `interface` among its implemented interfaces.
    pub fn implements(&self, object: &str, interface: &str) -> bool {
        match self.get(object) {
            Some(ExtendedType::Object(object)) => object
                .implements_interfaces
                .iter()
                .any(|implemented| implemented.name.as_str() == interface),
            Some(ExtendedType::Interface(object)) => object
                .implements_interfaces
                .iter()
                .any(|implemented| implemented.name.as_str() == interface),
            _ => false,
        }
    }

    /// Whether a fragment with type condition `condition` applies to selections on `parent`.
    pub fn condition_applies(&self, condition: &str, parent: &str) -> bool {
        condition == parent || self.schema.is_subtype(condition, parent)
    }

    /// Concrete object types a value of type `name` may have, in a stable order: union members in
    /// declaration order, interface implementers in schema order.
    pub fn possible_types(&self, name: &str) -> Vec<Name> {
        match self.get(name) {
            Some(ExtendedType::Object(object)) => vec![object.name.clone()],
            Some(ExtendedType::Union(union_)) => union_
                .members
                .iter()
                .map(|member| member.name.clone())
                .collect(),
            Some(ExtendedType::Interface(_)) => self
                .schema
                .types
                .iter()
                .filter(|(type_name, ty)| {
                    matches!(ty, ExtendedType::Object(_)) && self.implements(type_name, name)
                })
                .map(|(type_name, _)| type_name.clone())
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Custom (non built-in) scalars in schema order.
    pub fn custom_scalars(&self) -> impl Iterator<Item = &Name> {
        self.schema.types.iter().filter_map(|(name, ty)| match ty {
            ExtendedType::Scalar(_) if !ty.is_built_in() => Some(name),
            _ => None,
        })
    }
}

/// Directives only meaningful to clients. Documents may use them even when no schema source
/// declares them.
const CLIENT_DIRECTIVES: &str = r#"
directive @defer(if: Boolean! = true, label: String) on FRAGMENT_SPREAD | INLINE_FRAGMENT
directive @stream(if: Boolean! = true, label: String, initialCount: Int = 0) on FIELD
directive @client(always: Boolean) on FIELD | FRAGMENT_DEFINITION | INLINE_FRAGMENT
directive @connection(key: String!, filter: [String!]) on FIELD
"#;

fn add_client_directives(schema: &mut Schema) -> Result<(), SchemaError> {
    let document = ast::Document::parse(CLIENT_DIRECTIVES, "client-directives.graphql").map_err(
        |invalid| SchemaError::Parse {
            source_name: "client-directives.graphql".to_owned(),
            errors: invalid.errors.into(),
        },
    )?;
    for definition in &document.definitions {
        if let ast::Definition::DirectiveDefinition(directive) = definition {
            schema
                .directive_definitions
                .entry(directive.name.clone())
                .or_insert_with(|| directive.clone());
        }
    }
    Ok(())
}

fn parse_source(source: &SdlSource) -> Result<Schema, SchemaError> {
    let text = source.text.replace("\r\n", "\n");
    Schema::builder()
        .adopt_orphan_extensions()
        .parse(text, &source.name)
        .build()
        .map_err(|invalid| SchemaError::Parse {
            source_name: source.name.clone(),
            errors: invalid.errors.into(),
        })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const SCHEMA: &str = r#"
        type Query {
          node(id: ID!): Node
          search(term: String!): [SearchResult!]!
        }

        interface Node {
          id: ID!
        }

        type User implements Node {
          id: ID!
          name: String
        }

        type Post implements Node {
          id: ID!
          title: String!
        }

        union SearchResult = Post | User

        scalar DateTime
    "#;

    #[test]
    fn built_in_scalars_are_always_present() {
        let model = SchemaModel::parse("type Query { a: Int }", "schema.graphql").unwrap();
        for scalar in ["ID", "String", "Int", "Float", "Boolean"] {
            assert_eq!(model.kind(scalar), Some(TypeKind::Scalar), "{scalar}");
        }
    }

    #[test]
    fn possible_types_keep_declaration_order() {
        let model = SchemaModel::parse(SCHEMA, "schema.graphql").unwrap();
        let possible = |name: &str| -> Vec<String> {
            model
                .possible_types(name)
                .iter()
                .map(|ty| ty.to_string())
                .collect()
        };
        assert_eq!(possible("SearchResult"), ["Post", "User"]);
        assert_eq!(possible("Node"), ["User", "Post"]);
        assert_eq!(possible("User"), ["User"]);
    }

    #[test]
    fn fragment_conditions() {
        let model = SchemaModel::parse(SCHEMA, "schema.graphql").unwrap();
        assert!(model.condition_applies("Node", "User"));
        assert!(model.condition_applies("SearchResult", "Post"));
        assert!(model.condition_applies("User", "User"));
        assert!(!model.condition_applies("User", "Post"));
        assert!(!model.condition_applies("User", "Node"));
    }

    #[test]
    fn custom_scalars_are_listed() {
        let model = SchemaModel::parse(SCHEMA, "schema.graphql").unwrap();
        let scalars: Vec<_> = model.custom_scalars().map(|name| name.as_str()).collect();
        assert_eq!(scalars, ["DateTime"]);
    }

    #[test]
    fn unresolved_types_are_fatal() {
        let error = SchemaModel::parse("type Query { me: User }", "schema.graphql").unwrap_err();
        assert!(matches!(error, SchemaError::Validation(_)), "{error}");
    }

    #[test]
    fn parse_errors_name_the_source() {
        let error = SchemaModel::parse("type Query {", "broken.graphql").unwrap_err();
        match error {
            SchemaError::Parse { source_name, .. } => assert_eq!(source_name, "broken.graphql"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn client_directives_are_declared() {
        let model = SchemaModel::parse("type Query { a: Int }", "schema.graphql").unwrap();
        for directive in ["defer", "stream", "client", "connection"] {
            assert!(
                model.schema().directive_definitions.contains_key(directive),
                "{directive}"
            );
        }
    }

    #[test]
    fn hash_is_stable() {
        let first = SchemaModel::parse(SCHEMA, "schema.graphql").unwrap();
        let second = SchemaModel::parse(SCHEMA, "schema.graphql").unwrap();
        assert_eq!(first.hash(), second.hash());
        assert_eq!(first.hash().len(), 64);
    }
}
