//! Serializes executable definitions to the JSON form of a graphql-js `DocumentNode`.
//!
//! Locations are omitted, as are empty argument, directive and variable lists.
use apollo_compiler::Name;
use apollo_compiler::Node;
use apollo_compiler::ast;
use serde_json::Map;
use serde_json::Value;
use serde_json::json;

use crate::naming::operation_keyword;

pub fn document_node<'a>(definitions: impl IntoIterator<Item = &'a ast::Definition>) -> Value {
    let definitions = definitions
        .into_iter()
        .filter_map(|definition| match definition {
            ast::Definition::OperationDefinition(operation) => Some(operation_node(operation)),
            ast::Definition::FragmentDefinition(fragment) => Some(fragment_node(fragment)),
            _ => None,
        })
        .collect::<Vec<_>>();
    json!({ "kind": "Document", "definitions": definitions })
}

fn node(kind: &str) -> Map<String, Value> {
    let mut node = Map::new();
    node.insert("kind".to_owned(), Value::from(kind));
    node
}

fn name_node(name: &Name) -> Value {
    json!({ "kind": "Name", "value": name.as_str() })
}

fn named_type(name: &Name) -> Value {
    json!({ "kind": "NamedType", "name": name_node(name) })
}

/// Inserts `values` under `key` unless there are none.
fn insert_list(node: &mut Map<String, Value>, key: &str, values: Vec<Value>) {
    if !values.is_empty() {
        node.insert(key.to_owned(), Value::Array(values));
    }
}

fn operation_node(operation: &ast::OperationDefinition) -> Value {
    let mut node = node("OperationDefinition");
    node.insert(
        "operation".to_owned(),
        Value::from(operation_keyword(operation.operation_type)),
    );
    if let Some(name) = &operation.name {
        node.insert("name".to_owned(), name_node(name));
    }
    insert_list(
        &mut node,
        "variableDefinitions",
        operation.variables.iter().map(|v| variable_node(v)).collect(),
    );
    insert_list(&mut node, "directives", directives(&operation.directives));
    node.insert(
        "selectionSet".to_owned(),
        selection_set(&operation.selection_set),
    );
    Value::Object(node)
}

fn fragment_node(fragment: &ast::FragmentDefinition) -> Value {
    let mut node = node("FragmentDefinition");
    node.insert("name".to_owned(), name_node(&fragment.name));
    node.insert(
        "typeCondition".to_owned(),
        named_type(&fragment.type_condition),
    );
    insert_list(&mut node, "directives", directives(&fragment.directives));
    node.insert(
        "selectionSet".to_owned(),
        selection_set(&fragment.selection_set),
    );
    Value::Object(node)
}

fn variable_node(variable: &ast::VariableDefinition) -> Value {
    let mut node = node("VariableDefinition");
    node.insert(
        "variable".to_owned(),
        json!({ "kind": "Variable", "name": name_node(&variable.name) }),
    );
    node.insert("type".to_owned(), type_node(&variable.ty));
    if let Some(default_value) = &variable.default_value {
        node.insert("defaultValue".to_owned(), value_node(default_value));
    }
    insert_list(&mut node, "directives", directives(&variable.directives));
    Value::Object(node)
}

fn type_node(ty: &ast::Type) -> Value {
    match ty {
        ast::Type::Named(name) => named_type(name),
        ast::Type::NonNullNamed(name) => json!({ "kind": "NonNullType", "type": named_type(name) }),
        ast::Type::List(element) => json!({ "kind": "ListType", "type": type_node(element) }),
        ast::Type::NonNullList(element) => json!({
            "kind": "NonNullType",
            "type": { "kind": "ListType", "type": type_node(element) },
        }),
    }
}

fn selection_set(selections: &[ast::Selection]) -> Value {
    let selections = selections.iter().map(selection_node).collect::<Vec<_>>();
    json!({ "kind": "SelectionSet", "selections": selections })
}

fn selection_node(selection: &ast::Selection) -> Value {
    match selection {
        ast::Selection::Field(field) => {
            let mut node = node("Field");
            if let Some(alias) = &field.alias {
                node.insert("alias".to_owned(), name_node(alias));
            }
            node.insert("name".to_owned(), name_node(&field.name));
            insert_list(&mut node, "arguments", arguments(&field.arguments));
            insert_list(&mut node, "directives", directives(&field.directives));
            if !field.selection_set.is_empty() {
                node.insert(
                    "selectionSet".to_owned(),
                    selection_set(&field.selection_set),
                );
            }
            Value::Object(node)
        }
        ast::Selection::FragmentSpread(spread) => {
            let mut node = node("FragmentSpread");
            node.insert("name".to_owned(), name_node(&spread.fragment_name));
            insert_list(&mut node, "directives", directives(&spread.directives));
            Value::Object(node)
        }
        ast::Selection::InlineFragment(inline) => {
            let mut node = node("InlineFragment");
            if let Some(condition) = &inline.type_condition {
                node.insert("typeCondition".to_owned(), named_type(condition));
            }
            insert_list(&mut node, "directives", directives(&inline.directives));
            node.insert(
                "selectionSet".to_owned(),
                selection_set(&inline.selection_set),
            );
            Value::Object(node)
        }
    }
}

fn arguments(arguments: &[Node<ast::Argument>]) -> Vec<Value> {
    arguments
        .iter()
        .map(|argument| {
            json!({
                "kind": "Argument",
                "name": name_node(&argument.name),
                "value": value_node(&argument.value),
            })
        })
        .collect()
}

fn directives(directives: &ast::DirectiveList) -> Vec<Value> {
    directives
        .iter()
        .map(|directive| {
            let mut node = node("Directive");
            node.insert("name".to_owned(), name_node(&directive.name));
            insert_list(&mut node, "arguments", arguments(&directive.arguments));
            Value::Object(node)
        })
        .collect()
}

fn value_node(value: &ast::Value) -> Value {
    match value {
        ast::Value::Null => json!({ "kind": "NullValue" }),
        ast::Value::Enum(name) => json!({ "kind": "EnumValue", "value": name.as_str() }),
        ast::Value::Variable(name) => json!({ "kind": "Variable", "name": name_node(name) }),
        ast::Value::String(value) => {
            json!({ "kind": "StringValue", "value": value, "block": false })
        }
        ast::Value::Float(value) => json!({ "kind": "FloatValue", "value": value.as_str() }),
        ast::Value::Int(value) => json!({ "kind": "IntValue", "value": value.as_str() }),
        ast::Value::Boolean(value) => json!({ "kind": "BooleanValue", "value": value }),
        ast::Value::List(values) => json!({
            "kind": "ListValue",
            "values": values.iter().map(|value| value_node(value)).collect::<Vec<_>>(),
        }),
        ast::Value::Object(fields) => json!({
            "kind": "ObjectValue",
            "fields": fields
                .iter()
                .map(|(name, value)| json!({
                    "kind": "ObjectField",
                    "name": name_node(name),
                    "value": value_node(value),
                }))
                .collect::<Vec<_>>(),
        }),
    }
}
