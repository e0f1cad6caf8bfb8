//! Schema-derived declarations: scalars, enums, input objects and output types.
use apollo_compiler::Node;
use apollo_compiler::ast;
use apollo_compiler::schema::EnumType;
use apollo_compiler::schema::ExtendedType;
use apollo_compiler::schema::InputObjectType;
use apollo_compiler::schema::InterfaceType;
use apollo_compiler::schema::ObjectType;
use apollo_compiler::schema::UnionType;
use itertools::Itertools;

use crate::emit::EmitContext;
use crate::emit::Emitter;
use crate::emit::section;
use crate::error::EmitterError;
use crate::naming;
use crate::placement::ArtifactFragment;
use crate::placement::Placement;
use crate::render::RenderContext;
use crate::render::typescript::doc_comment;
use crate::render::typescript::string_literal;
use crate::scalars::ScalarMode;
use crate::schema::TypeKind;
use crate::synthesis::FieldIr;
use crate::synthesis::TypeIr;
use crate::synthesis::wrap_type;

pub(crate) struct BaseTypes;

impl Emitter for BaseTypes {
    fn emit(&self, context: &EmitContext<'_>) -> Result<Vec<ArtifactFragment>, EmitterError> {
        let mut declarations = vec![scalars_table(context)];
        let types = context
            .schema
            .schema()
            .types
            .iter()
            .filter(|(name, ty)| !ty.is_built_in() && !name.starts_with("__"))
            .sorted_by(|(a, _), (b, _)| a.as_str().cmp(b.as_str()));
        for (_, ty) in types {
            match ty {
                ExtendedType::Scalar(_) => {}
                ExtendedType::Enum(ty) => declarations.push(enum_type(context, ty)),
                ExtendedType::InputObject(ty) => declarations.push(input_object(context, ty)),
                ExtendedType::Object(ty) => declarations.extend(object(context, ty)),
                ExtendedType::Interface(ty) => declarations.extend(interface(context, ty)),
                ExtendedType::Union(ty) => declarations.push(union(context, ty)),
            }
        }
        tracing::debug!(declarations = declarations.len(), "emitted base types");
        Ok(vec![
            ArtifactFragment::new("", helpers(context), Placement::Prepend),
            ArtifactFragment::base(section(&declarations)),
        ])
    }
}

fn helpers(context: &EmitContext<'_>) -> String {
    let export = context.options.export();
    format!(
        "{export}type Maybe<T> = {maybe};
{export}type InputMaybe<T> = {input_maybe};
{export}type Exact<T extends {{ [key: string]: unknown }}> = {{ [K in keyof T]: T[K] }};
{export}type MakeOptional<T, K extends keyof T> = Omit<T, K> & {{ [SubKey in K]?: Maybe<T[SubKey]> }};
{export}type MakeMaybe<T, K extends keyof T> = Omit<T, K> & {{ [SubKey in K]: Maybe<T[SubKey]> }};
{export}type MakeEmpty<T extends {{ [key: string]: unknown }}, K extends keyof T> = {{ [_ in K]?: never }};
{export}type Incremental<T> = T | {{ [P in keyof T]?: P extends ' $fragmentName' | '__typename' ? T[P] : never }};
",
        maybe = context.options.maybe_value,
        input_maybe = context.options.input_maybe_value,
    )
}

fn scalars_table(context: &EmitContext<'_>) -> String {
    let mut table = format!(
        "/** All built-in and custom scalars, mapped to their actual values */\n{}type Scalars = {{\n",
        context.options.export()
    );
    for name in context.scalars.table(context.schema) {
        table.push_str(&format!(
            "  {name}: {{ input: {}; output: {}; }}\n",
            context.scalars.render(&name, ScalarMode::Input),
            context.scalars.render(&name, ScalarMode::Output),
        ));
    }
    table.push_str("};");
    table
}

fn type_name(context: &EmitContext<'_>, name: &str) -> String {
    naming::convert(name, context.options.naming_convention)
}

fn enum_type(context: &EmitContext<'_>, ty: &Node<EnumType>) -> String {
    let export = context.options.export();
    let name = type_name(context, &ty.name);
    let mut declaration = doc_comment(ty.description.as_deref(), "");
    if context.options.enums_as_types {
        declaration.push_str(&format!("{export}type {name} =\n"));
        let members = ty
            .values
            .values()
            .map(|value| {
                format!(
                    "{}  | {}",
                    doc_comment(value.description.as_deref(), "  "),
                    string_literal(&value.value)
                )
            })
            .join("\n");
        declaration.push_str(&members);
        declaration.push(';');
    } else {
        declaration.push_str(&format!("{export}enum {name} {{\n"));
        let members = ty
            .values
            .values()
            .map(|value| {
                format!(
                    "{}  {} = {}",
                    doc_comment(value.description.as_deref(), "  "),
                    type_name(context, &value.value),
                    string_literal(&value.value)
                )
            })
            .join(",\n");
        declaration.push_str(&members);
        declaration.push_str("\n}");
    }
    declaration
}

/// Scalar, enum or input object reference for an input position.
fn input_inner(context: &EmitContext<'_>, ty: &ast::Type) -> TypeIr {
    let named = ty.inner_named_type();
    match context.schema.kind(named) {
        Some(TypeKind::Enum) => TypeIr::EnumRef(named.to_string()),
        Some(TypeKind::InputObject) => TypeIr::InputRef(named.to_string()),
        _ => TypeIr::Scalar(named.to_string()),
    }
}

fn output_inner(context: &EmitContext<'_>, ty: &ast::Type) -> TypeIr {
    let named = ty.inner_named_type();
    match context.schema.kind(named) {
        Some(TypeKind::Scalar) | None => TypeIr::Scalar(named.to_string()),
        Some(TypeKind::Enum) => TypeIr::EnumRef(named.to_string()),
        Some(_) => TypeIr::NamedRef(named.to_string()),
    }
}

fn input_field(context: &EmitContext<'_>, value: &ast::InputValueDefinition) -> FieldIr {
    let options = context.options;
    let nullable = !value.ty.is_non_null();
    FieldIr {
        name: value.name.to_string(),
        optional: nullable && !options.avoid_optionals,
        nullable,
        readonly: options.immutable_types,
        ty: wrap_type(
            &value.ty,
            input_inner(context, &value.ty),
            options.immutable_types,
        ),
    }
}

/// A `{ ... }` block with one JSDoc-commented field per line.
fn documented_block<'d>(
    context: &EmitContext<'_>,
    fields: impl IntoIterator<Item = (Option<&'d str>, FieldIr)>,
    render_context: RenderContext,
) -> String {
    let renderer = context.renderer();
    let mut block = String::from("{\n");
    for (description, field) in fields {
        block.push_str(&doc_comment(description, "  "));
        block.push_str("  ");
        block.push_str(&renderer.field(&field, render_context));
        block.push_str(";\n");
    }
    block.push('}');
    block
}

fn input_object(context: &EmitContext<'_>, ty: &Node<InputObjectType>) -> String {
    let fields = ty
        .fields
        .values()
        .map(|field| (field.description.as_deref(), input_field(context, field)));
    format!(
        "{}{}type {} = {};",
        doc_comment(ty.description.as_deref(), ""),
        context.options.export(),
        type_name(context, &ty.name),
        documented_block(context, fields, RenderContext::Input)
    )
}

fn output_fields<'d>(
    context: &EmitContext<'_>,
    fields: impl Iterator<Item = &'d ast::FieldDefinition>,
) -> Vec<(Option<&'d str>, FieldIr)> {
    let options = context.options;
    fields
        .map(|field| {
            let nullable = !field.ty.is_non_null();
            let ir = FieldIr {
                name: field.name.to_string(),
                optional: nullable && !options.avoid_optionals,
                nullable,
                readonly: options.immutable_types,
                ty: wrap_type(
                    &field.ty,
                    output_inner(context, &field.ty),
                    options.immutable_types,
                ),
            };
            (field.description.as_deref(), ir)
        })
        .collect()
}

/// `<Type><Field>Args` records for every field taking arguments.
fn argument_types<'d>(
    context: &EmitContext<'_>,
    parent: &str,
    fields: impl Iterator<Item = &'d ast::FieldDefinition>,
) -> Vec<String> {
    let export = context.options.export();
    fields
        .filter(|field| !field.arguments.is_empty())
        .map(|field| {
            let arguments = field
                .arguments
                .iter()
                .map(|argument| (argument.description.as_deref(), input_field(context, argument)));
            format!(
                "{export}type {}{}Args = {};",
                type_name(context, parent),
                type_name(context, &field.name),
                documented_block(context, arguments, RenderContext::Input)
            )
        })
        .collect()
}

fn object(context: &EmitContext<'_>, ty: &Node<ObjectType>) -> Vec<String> {
    let options = context.options;
    let mut fields = Vec::new();
    if !options.skip_typename {
        let typename = FieldIr {
            name: "__typename".to_owned(),
            optional: !(options.non_optional_typename || options.avoid_optionals),
            nullable: false,
            readonly: options.immutable_types,
            ty: TypeIr::Literal(ty.name.to_string()),
        };
        fields.push((None, typename));
    }
    fields.extend(output_fields(
        context,
        ty.fields.values().map(|field| -> &ast::FieldDefinition { field }),
    ));
    let interfaces = ty
        .implements_interfaces
        .iter()
        .map(|interface| format!("{} & ", type_name(context, &interface.name)))
        .collect::<String>();

    let mut declarations = vec![format!(
        "{}{}type {} = {interfaces}{};",
        doc_comment(ty.description.as_deref(), ""),
        options.export(),
        type_name(context, &ty.name),
        documented_block(context, fields, RenderContext::Base)
    )];
    declarations.extend(argument_types(
        context,
        &ty.name,
        ty.fields.values().map(|field| -> &ast::FieldDefinition { field }),
    ));
    declarations
}

fn interface(context: &EmitContext<'_>, ty: &Node<InterfaceType>) -> Vec<String> {
    let fields = output_fields(
        context,
        ty.fields.values().map(|field| -> &ast::FieldDefinition { field }),
    );
    let mut declarations = vec![format!(
        "{}{}type {} = {};",
        doc_comment(ty.description.as_deref(), ""),
        context.options.export(),
        type_name(context, &ty.name),
        documented_block(context, fields, RenderContext::Base)
    )];
    declarations.extend(argument_types(
        context,
        &ty.name,
        ty.fields.values().map(|field| -> &ast::FieldDefinition { field }),
    ));
    declarations
}

fn union(context: &EmitContext<'_>, ty: &Node<UnionType>) -> String {
    let members = ty
        .members
        .iter()
        .map(|member| type_name(context, &member.name))
        .join(" | ");
    let members = if members.is_empty() {
        "never".to_owned()
    } else {
        members
    };
    format!(
        "{}{}type {} = {members};",
        doc_comment(ty.description.as_deref(), ""),
        context.options.export(),
        type_name(context, &ty.name),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emit::EmitterKind;
    use crate::emit::test_support::Fixture;

    #[test]
    fn base_types() {
        let fixture = Fixture::new(&[]);
        insta::assert_snapshot!(fixture.text(EmitterKind::BaseTypes), @r"
        export type Maybe<T> = T | null;
        export type InputMaybe<T> = Maybe<T>;
        export type Exact<T extends { [key: string]: unknown }> = { [K in keyof T]: T[K] };
        export type MakeOptional<T, K extends keyof T> = Omit<T, K> & { [SubKey in K]?: Maybe<T[SubKey]> };
        export type MakeMaybe<T, K extends keyof T> = Omit<T, K> & { [SubKey in K]: Maybe<T[SubKey]> };
        export type MakeEmpty<T extends { [key: string]: unknown }, K extends keyof T> = { [_ in K]?: never };
        export type Incremental<T> = T | { [P in keyof T]?: P extends ' $fragmentName' | '__typename' ? T[P] : never };

        /** All built-in and custom scalars, mapped to their actual values */
        export type Scalars = {
          ID: { input: string; output: string; }
          String: { input: string; output: string; }
          Boolean: { input: boolean; output: boolean; }
          Int: { input: number; output: number; }
          Float: { input: number; output: number; }
          DateTime: { input: any; output: any; }
        };

        /** An object with an ID */
        export type Node = {
          id: Scalars['ID']['output'];
        };

        export type Post = Node & {
          __typename?: 'Post';
          id: Scalars['ID']['output'];
          title: Scalars['String']['output'];
        };

        export type Query = {
          __typename?: 'Query';
          user?: Maybe<User>;
          search: Array<SearchResult>;
        };

        export type QueryUserArgs = {
          id: Scalars['ID']['input'];
        };

        export type QuerySearchArgs = {
          term: Scalars['String']['input'];
        };

        export enum Role {
          Admin = 'ADMIN',
          User = 'USER'
        }

        export type SearchResult = User | Post;

        /** A person */
        export type User = Node & {
          __typename?: 'User';
          id: Scalars['ID']['output'];
          /** Display name */
          name?: Maybe<Scalars['String']['output']>;
          role: Role;
          friends: Array<User>;
        };

        export type UserFriendsArgs = {
          first?: InputMaybe<Scalars['Int']['input']>;
          after?: InputMaybe<Scalars['String']['input']>;
        };

        export type UserFilter = {
          role?: InputMaybe<Role>;
          term: Scalars['String']['input'];
        };
        ");
    }

    #[test]
    fn enums_as_types_without_export() {
        let mut fixture = Fixture::new(&[]);
        fixture.options.enums_as_types = true;
        fixture.options.no_export = true;
        fixture.options.immutable_types = true;
        let text = fixture.text(EmitterKind::BaseTypes);
        assert!(text.contains("type Role =\n  | 'ADMIN'\n  | 'USER';"));
        assert!(text.contains("  readonly friends: ReadonlyArray<User>;\n"));
        assert!(!text.contains("export "));
    }
}
