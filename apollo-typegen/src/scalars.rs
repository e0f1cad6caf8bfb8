//! TypeScript types of GraphQL scalars.
use indexmap::IndexMap;

use crate::configuration::ScalarMapping;
use crate::error::Warning;
use crate::schema::SchemaModel;

const BUILT_IN_SCALARS: [(&str, &str); 5] = [
    ("ID", "string"),
    ("String", "string"),
    ("Boolean", "boolean"),
    ("Int", "number"),
    ("Float", "number"),
];

/// Position a scalar appears in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarMode {
    /// Variables and input object fields.
    Input,
    /// Results and output type fields.
    Output,
}

impl ScalarMode {
    pub fn key(self) -> &'static str {
        match self {
            ScalarMode::Input => "input",
            ScalarMode::Output => "output",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ScalarType {
    input: String,
    output: String,
}

/// Built-in scalar types, overridden by configured mappings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScalarMap {
    types: IndexMap<String, ScalarType>,
    fallback: String,
}

impl ScalarMap {
    pub fn new(mappings: &IndexMap<String, ScalarMapping>, fallback: &str) -> Self {
        let mut types: IndexMap<String, ScalarType> = BUILT_IN_SCALARS
            .iter()
            .map(|(name, ty)| {
                (
                    (*name).to_owned(),
                    ScalarType {
                        input: (*ty).to_owned(),
                        output: (*ty).to_owned(),
                    },
                )
            })
            .collect();
        for (name, mapping) in mappings {
            let ty = match mapping {
                ScalarMapping::Same(ty) => ScalarType {
                    input: ty.clone(),
                    output: ty.clone(),
                },
                ScalarMapping::Split { input, output } => ScalarType {
                    input: input.clone(),
                    output: output.clone(),
                },
            };
            types.insert(name.clone(), ty);
        }
        Self {
            types,
            fallback: fallback.to_owned(),
        }
    }

    /// TypeScript type of `name` in the given position.
    pub fn render(&self, name: &str, mode: ScalarMode) -> &str {
        match (self.types.get(name), mode) {
            (Some(ty), ScalarMode::Input) => &ty.input,
            (Some(ty), ScalarMode::Output) => &ty.output,
            (None, _) => &self.fallback,
        }
    }

    pub fn is_mapped(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Built-in scalars first, then the schema's custom scalars sorted by name.
    pub fn table(&self, schema: &SchemaModel) -> Vec<String> {
        let mut custom: Vec<&str> = schema.custom_scalars().map(|name| name.as_str()).collect();
        custom.sort_unstable();
        BUILT_IN_SCALARS
            .iter()
            .map(|(name, _)| *name)
            .chain(custom)
            .map(str::to_owned)
            .collect()
    }

    /// Reports every custom scalar of `schema` without a mapping.
    pub fn report_unmapped(&self, schema: &SchemaModel, warnings: &mut Vec<Warning>) {
        for name in schema.custom_scalars() {
            if self.is_mapped(name) {
                continue;
            }
            let warning = Warning::UnknownScalar {
                name: name.to_string(),
                fallback: self.fallback.clone(),
            };
            if !warnings.contains(&warning) {
                warning.report(warnings);
            }
        }
    }
}
