//! Combines several parsed schemas into one.
//!
//! Sources are merged left to right. Root operation types and types defined only through orphan
//! `extend type` definitions are merged by field union; every other type that appears in more than
//! one source must be compatible, or the [`MergePolicy`] decides which definition wins.
use std::collections::HashMap;
use std::collections::HashSet;
use std::hash::BuildHasher;
use std::sync::Arc;

use apollo_compiler::Name;
use apollo_compiler::Node;
use apollo_compiler::Schema;
use apollo_compiler::ast::DirectiveDefinition;
use apollo_compiler::ast::FieldDefinition;
use apollo_compiler::ast::InputValueDefinition;
use apollo_compiler::ast::Type;
use apollo_compiler::schema::Component;
use apollo_compiler::schema::ComponentOrigin;
use apollo_compiler::schema::ExtendedType;
use displaydoc::Display;
use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::Deserialize;
use serde::Serialize;

use crate::error::SchemaError;
use crate::schema::TypeKind;

/// How conflicting definitions of the same schema element are settled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum MergePolicy {
    /// Fail on the first conflict.
    #[default]
    Error,
    /// Keep the definition from the earliest source.
    UseFirst,
    /// Keep the definition from the latest source.
    UseLast,
}

/// A schema element two sources disagree on.
#[derive(Debug, Display, Clone, PartialEq, Eq)]
pub enum Conflict {
    /// type '{type_name}' ({first} vs {second})
    Kind {
        type_name: String,
        first: String,
        second: String,
    },
    /// field '{type_name}.{field}' ({first} vs {second})
    FieldType {
        type_name: String,
        field: String,
        first: String,
        second: String,
    },
    /// arguments of field '{type_name}.{field}'
    FieldArguments { type_name: String, field: String },
    /// the fields of type '{type_name}'
    DisjointFields { type_name: String },
    /// the values of enum '{type_name}'
    EnumValues { type_name: String },
    /// the members of union '{type_name}'
    UnionMembers { type_name: String },
    /// directive '@{name}'
    Directive { name: String },
    /// the {operation} root type ({first} vs {second})
    RootOperation {
        operation: String,
        first: String,
        second: String,
    },
}

/// A conflict settled by [`MergePolicy::UseFirst`] or [`MergePolicy::UseLast`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConflict {
    pub conflict: Conflict,
    pub kept: String,
    pub discarded: String,
}

/// Result of [`merge_schemas`]: an unvalidated schema and the conflicts the policy settled.
#[derive(Debug)]
pub struct MergeOutcome {
    pub schema: Schema,
    pub resolved_conflicts: Vec<ResolvedConflict>,
}

/// Merges `(source name, schema)` pairs left to right.
pub fn merge_schemas(
    schemas: Vec<(String, Schema)>,
    policy: MergePolicy,
) -> Result<MergeOutcome, SchemaError> {
    let mut schemas = schemas.into_iter();
    let Some((first_name, mut merged)) = schemas.next() else {
        return Err(SchemaError::NoSources);
    };
    let mut merger = Merger::new(policy);
    merger.origins.record_schema(&first_name, &merged);
    for (name, schema) in schemas {
        merger.merge(&mut merged, &name, &schema)?;
    }
    Ok(MergeOutcome {
        schema: merged,
        resolved_conflicts: merger.resolved,
    })
}

/// The source each type and field currently in the merged schema came from.
#[derive(Default)]
struct Origins {
    types: HashMap<Name, String>,
    fields: HashMap<(Name, Name), String>,
    directives: HashMap<Name, String>,
}

impl Origins {
    fn record_schema(&mut self, source: &str, schema: &Schema) {
        for (name, ty) in &schema.types {
            if !ty.is_built_in() {
                self.record_type(source, name, ty);
            }
        }
        for name in schema.directive_definitions.keys() {
            self.directives.insert(name.clone(), source.to_owned());
        }
    }

    fn record_type(&mut self, source: &str, name: &Name, ty: &ExtendedType) {
        self.types.insert(name.clone(), source.to_owned());
        let fields: Vec<&Name> = match ty {
            ExtendedType::Object(object) => object.fields.keys().collect(),
            ExtendedType::Interface(interface) => interface.fields.keys().collect(),
            ExtendedType::InputObject(input) => input.fields.keys().collect(),
            _ => Vec::new(),
        };
        for field in fields {
            self.record_field(source, name, field);
        }
    }

    fn record_field(&mut self, source: &str, type_name: &Name, field: &Name) {
        self.fields
            .insert((type_name.clone(), field.clone()), source.to_owned());
    }

    fn of_type(&self, name: &Name) -> &str {
        self.types.get(name).map(String::as_str).unwrap_or_default()
    }

    fn of_field(&self, type_name: &Name, field: &Name) -> &str {
        self.fields
            .get(&(type_name.clone(), field.clone()))
            .map(String::as_str)
            .unwrap_or_else(|| self.of_type(type_name))
    }
}

/// Shared view over output fields and input fields.
trait FieldLike: Clone {
    fn field_type(&self) -> &Type;
    fn field_arguments(&self) -> &[Node<InputValueDefinition>];
}

impl FieldLike for FieldDefinition {
    fn field_type(&self) -> &Type {
        &self.ty
    }

    fn field_arguments(&self) -> &[Node<InputValueDefinition>] {
        &self.arguments
    }
}

impl FieldLike for InputValueDefinition {
    fn field_type(&self) -> &Type {
        &self.ty
    }

    fn field_arguments(&self) -> &[Node<InputValueDefinition>] {
        &[]
    }
}

enum FieldsMerge {
    Merged,
    Disjoint,
}

struct Merger {
    policy: MergePolicy,
    origins: Origins,
    resolved: Vec<ResolvedConflict>,
    built_in_directives: HashSet<Name>,
}

impl Merger {
    fn new(policy: MergePolicy) -> Self {
        Self {
            policy,
            origins: Origins::default(),
            resolved: Vec::new(),
            built_in_directives: Schema::new().directive_definitions.keys().cloned().collect(),
        }
    }

    /// Returns whether the incoming definition wins.
    fn resolve(
        &mut self,
        conflict: Conflict,
        first: &str,
        second: &str,
    ) -> Result<bool, SchemaError> {
        let (kept, discarded, incoming_wins) = match self.policy {
            MergePolicy::Error => {
                return Err(SchemaError::MergeConflict {
                    conflict,
                    first: first.to_owned(),
                    second: second.to_owned(),
                });
            }
            MergePolicy::UseFirst => (first, second, false),
            MergePolicy::UseLast => (second, first, true),
        };
        tracing::debug!(%conflict, kept, discarded, "resolved schema conflict");
        self.resolved.push(ResolvedConflict {
            conflict,
            kept: kept.to_owned(),
            discarded: discarded.to_owned(),
        });
        Ok(incoming_wins)
    }

    fn merge(
        &mut self,
        merged: &mut Schema,
        source: &str,
        incoming: &Schema,
    ) -> Result<(), SchemaError> {
        let sources = Arc::make_mut(&mut merged.sources);
        for (key, file) in incoming.sources.iter() {
            sources.entry(*key).or_insert_with(|| file.clone());
        }

        let mut roots: HashSet<Name> = root_names(merged);
        roots.extend(root_names(incoming));
        self.merge_roots(merged, source, incoming)?;

        for (name, ty) in &incoming.types {
            if ty.is_built_in() {
                continue;
            }
            let union_merge = roots.contains(name) || is_extension_only(ty);
            self.merge_type(merged, source, name, ty, union_merge)?;
        }

        for (name, directive) in &incoming.directive_definitions {
            if self.built_in_directives.contains(name) {
                continue;
            }
            self.merge_directive(merged, source, name, directive)?;
        }
        Ok(())
    }

    fn merge_roots(
        &mut self,
        merged: &mut Schema,
        source: &str,
        incoming: &Schema,
    ) -> Result<(), SchemaError> {
        let incoming_def = &incoming.schema_definition;
        let merged_def = merged.schema_definition.make_mut();
        let roots = [
            ("query", &mut merged_def.query, &incoming_def.query),
            ("mutation", &mut merged_def.mutation, &incoming_def.mutation),
            (
                "subscription",
                &mut merged_def.subscription,
                &incoming_def.subscription,
            ),
        ];
        for (operation, merged_root, incoming_root) in roots {
            match (merged_root.as_ref(), incoming_root) {
                (_, None) => {}
                (None, Some(_)) => merged_root.clone_from(incoming_root),
                (Some(current), Some(candidate)) if current.name == candidate.name => {}
                (Some(current), Some(candidate)) => {
                    let conflict = Conflict::RootOperation {
                        operation: operation.to_owned(),
                        first: current.name.to_string(),
                        second: candidate.name.to_string(),
                    };
                    let first = self.origins.of_type(&current.name).to_owned();
                    if self.resolve(conflict, &first, source)? {
                        merged_root.clone_from(incoming_root);
                    }
                }
            }
        }
        Ok(())
    }

    fn merge_type(
        &mut self,
        merged: &mut Schema,
        source: &str,
        name: &Name,
        incoming: &ExtendedType,
        union_merge: bool,
    ) -> Result<(), SchemaError> {
        let Some(existing) = merged.types.get_mut(name) else {
            merged.types.insert(name.clone(), incoming.clone());
            self.origins.record_type(source, name, incoming);
            return Ok(());
        };
        let first = self.origins.of_type(name).to_owned();

        let existing_kind = TypeKind::of(existing);
        let incoming_kind = TypeKind::of(incoming);
        if existing_kind != incoming_kind {
            let conflict = Conflict::Kind {
                type_name: name.to_string(),
                first: existing_kind.describe().to_owned(),
                second: incoming_kind.describe().to_owned(),
            };
            if self.resolve(conflict, &first, source)? {
                *existing = incoming.clone();
                self.origins.record_type(source, name, incoming);
            }
            return Ok(());
        }

        let outcome = match (&mut *existing, incoming) {
            (ExtendedType::Scalar(_), ExtendedType::Scalar(_)) => FieldsMerge::Merged,
            (ExtendedType::Enum(current), ExtendedType::Enum(candidate)) => {
                let same = current.values.len() == candidate.values.len()
                    && current
                        .values
                        .keys()
                        .all(|value| candidate.values.contains_key(value));
                if same {
                    FieldsMerge::Merged
                } else {
                    let conflict = Conflict::EnumValues {
                        type_name: name.to_string(),
                    };
                    if self.resolve(conflict, &first, source)? {
                        *current = candidate.clone();
                        self.origins.record_type(source, name, incoming);
                    }
                    return Ok(());
                }
            }
            (ExtendedType::Union(current), ExtendedType::Union(candidate)) => {
                let current_members: HashSet<&Name> =
                    current.members.iter().map(|member| &member.name).collect();
                let candidate_members: HashSet<&Name> =
                    candidate.members.iter().map(|member| &member.name).collect();
                if current_members == candidate_members {
                    FieldsMerge::Merged
                } else {
                    let conflict = Conflict::UnionMembers {
                        type_name: name.to_string(),
                    };
                    if self.resolve(conflict, &first, source)? {
                        *current = candidate.clone();
                        self.origins.record_type(source, name, incoming);
                    }
                    return Ok(());
                }
            }
            (ExtendedType::Object(current), ExtendedType::Object(candidate)) => {
                let current = current.make_mut();
                for interface in &candidate.implements_interfaces {
                    current.implements_interfaces.insert(interface.clone());
                }
                self.merge_fields(
                    name,
                    source,
                    union_merge,
                    &mut current.fields,
                    &candidate.fields,
                )?
            }
            (ExtendedType::Interface(current), ExtendedType::Interface(candidate)) => {
                let current = current.make_mut();
                for interface in &candidate.implements_interfaces {
                    current.implements_interfaces.insert(interface.clone());
                }
                self.merge_fields(
                    name,
                    source,
                    union_merge,
                    &mut current.fields,
                    &candidate.fields,
                )?
            }
            (ExtendedType::InputObject(current), ExtendedType::InputObject(candidate)) => self
                .merge_fields(
                    name,
                    source,
                    union_merge,
                    &mut current.make_mut().fields,
                    &candidate.fields,
                )?,
            _ => FieldsMerge::Merged,
        };

        if let FieldsMerge::Disjoint = outcome {
            let conflict = Conflict::DisjointFields {
                type_name: name.to_string(),
            };
            if self.resolve(conflict, &first, source)? {
                *existing = incoming.clone();
                self.origins.record_type(source, name, incoming);
            }
        }
        Ok(())
    }

    fn merge_fields<F: FieldLike, S: BuildHasher>(
        &mut self,
        type_name: &Name,
        source: &str,
        union_merge: bool,
        current: &mut IndexMap<Name, Component<F>, S>,
        candidate: &IndexMap<Name, Component<F>, S>,
    ) -> Result<FieldsMerge, SchemaError> {
        let current_only = current.keys().any(|field| !candidate.contains_key(field));
        let candidate_only = candidate.keys().any(|field| !current.contains_key(field));
        if !union_merge && current_only && candidate_only {
            return Ok(FieldsMerge::Disjoint);
        }

        for (field_name, field) in candidate {
            let Some(existing) = current.get_mut(field_name) else {
                current.insert(field_name.clone(), field.clone());
                self.origins.record_field(source, type_name, field_name);
                continue;
            };
            let conflict = if existing.field_type() != field.field_type() {
                Some(Conflict::FieldType {
                    type_name: type_name.to_string(),
                    field: field_name.to_string(),
                    first: existing.field_type().to_string(),
                    second: field.field_type().to_string(),
                })
            } else if !same_arguments(existing.field_arguments(), field.field_arguments()) {
                Some(Conflict::FieldArguments {
                    type_name: type_name.to_string(),
                    field: field_name.to_string(),
                })
            } else {
                None
            };
            if let Some(conflict) = conflict {
                let first = self.origins.of_field(type_name, field_name).to_owned();
                if self.resolve(conflict, &first, source)? {
                    *existing = field.clone();
                    self.origins.record_field(source, type_name, field_name);
                }
            }
        }
        Ok(FieldsMerge::Merged)
    }

    fn merge_directive(
        &mut self,
        merged: &mut Schema,
        source: &str,
        name: &Name,
        incoming: &Node<DirectiveDefinition>,
    ) -> Result<(), SchemaError> {
        let Some(existing) = merged.directive_definitions.get_mut(name) else {
            merged
                .directive_definitions
                .insert(name.clone(), incoming.clone());
            self.origins.directives.insert(name.clone(), source.to_owned());
            return Ok(());
        };
        let same = existing.repeatable == incoming.repeatable
            && same_arguments(&existing.arguments, &incoming.arguments)
            && existing.locations.len() == incoming.locations.len()
            && existing
                .locations
                .iter()
                .all(|location| incoming.locations.contains(location));
        if same {
            return Ok(());
        }
        let first = self
            .origins
            .directives
            .get(name)
            .cloned()
            .unwrap_or_default();
        let conflict = Conflict::Directive {
            name: name.to_string(),
        };
        if self.resolve(conflict, &first, source)? {
            *existing = incoming.clone();
            self.origins.directives.insert(name.clone(), source.to_owned());
        }
        Ok(())
    }
}

fn root_names(schema: &Schema) -> HashSet<Name> {
    let definition = &schema.schema_definition;
    [
        &definition.query,
        &definition.mutation,
        &definition.subscription,
    ]
    .into_iter()
    .flatten()
    .map(|root| root.name.clone())
    .collect()
}

/// Whether every field of the type was contributed by an `extend` definition.
fn is_extension_only(ty: &ExtendedType) -> bool {
    fn all_extended<T, S>(fields: &IndexMap<Name, Component<T>, S>) -> bool {
        !fields.is_empty()
            && fields
                .values()
                .all(|field| matches!(field.origin, ComponentOrigin::Extension(_)))
    }
    match ty {
        ExtendedType::Object(object) => all_extended(&object.fields),
        ExtendedType::Interface(interface) => all_extended(&interface.fields),
        ExtendedType::InputObject(input) => all_extended(&input.fields),
        _ => false,
    }
}

/// Argument lists are equal by name and type, in any order.
fn same_arguments(a: &[Node<InputValueDefinition>], b: &[Node<InputValueDefinition>]) -> bool {
    a.len() == b.len()
        && a.iter().all(|argument| {
            b.iter()
                .any(|other| other.name == argument.name && other.ty == argument.ty)
        })
}
