//! TypeScript rendering of Type IR.
use crate::configuration::EmitterOptions;
use crate::naming;
use crate::scalars::ScalarMode;
use crate::synthesis::FieldIr;
use crate::synthesis::ObjectIr;
use crate::synthesis::TypeIr;

/// Where a rendered type is used. Decides the scalar position and how nullability is spelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderContext {
    /// Operation and fragment results: `T | null`.
    Operation,
    /// Variables and input objects: `InputMaybe<T>`.
    Input,
    /// Schema types: `Maybe<T>`.
    Base,
}

impl RenderContext {
    fn scalar_mode(self) -> ScalarMode {
        match self {
            RenderContext::Input => ScalarMode::Input,
            RenderContext::Operation | RenderContext::Base => ScalarMode::Output,
        }
    }
}

pub struct TypeScriptRenderer<'a> {
    options: &'a EmitterOptions,
}

impl<'a> TypeScriptRenderer<'a> {
    pub fn new(options: &'a EmitterOptions) -> Self {
        Self { options }
    }

    pub fn render(&self, ty: &TypeIr, context: RenderContext) -> String {
        match ty {
            TypeIr::Scalar(name) => format!(
                "Scalars[{}][{}]",
                string_literal(name),
                string_literal(context.scalar_mode().key())
            ),
            TypeIr::EnumRef(name) | TypeIr::InputRef(name) | TypeIr::NamedRef(name) => {
                naming::convert(name, self.options.naming_convention)
            }
            TypeIr::Object(object) => self.inline_object(object, context),
            TypeIr::Union(options) if options.is_empty() => "never".to_owned(),
            TypeIr::Union(options) => options
                .iter()
                .map(|option| self.inline_object(option, context))
                .collect::<Vec<_>>()
                .join(" | "),
            TypeIr::Array { element, readonly } => {
                let array = if *readonly { "ReadonlyArray" } else { "Array" };
                format!("{array}<{}>", self.render(element, context))
            }
            TypeIr::Nullable(inner) => {
                let inner = self.render(inner, context);
                match context {
                    RenderContext::Operation if self.options.strict_nulls => {
                        format!("{inner} | null")
                    }
                    RenderContext::Operation => inner,
                    RenderContext::Input => format!("InputMaybe<{inner}>"),
                    RenderContext::Base => format!("Maybe<{inner}>"),
                }
            }
            TypeIr::Literal(value) => string_literal(value),
        }
    }

    /// `{ a: A, b?: B }`, for nested selection shapes.
    pub fn inline_object(&self, object: &ObjectIr, context: RenderContext) -> String {
        if object.fields.is_empty() {
            return "{}".to_owned();
        }
        let fields = object
            .fields
            .iter()
            .map(|field| self.field(field, context))
            .collect::<Vec<_>>()
            .join(", ");
        format!("{{ {fields} }}")
    }

    /// One field per line, each terminated by `;`.
    pub fn block(&self, object: &ObjectIr, context: RenderContext) -> String {
        let mut block = String::from("{\n");
        for field in &object.fields {
            block.push_str("  ");
            block.push_str(&self.field(field, context));
            block.push_str(";\n");
        }
        block.push('}');
        block
    }

    pub fn field(&self, field: &FieldIr, context: RenderContext) -> String {
        format!(
            "{}{}{}: {}",
            if field.readonly { "readonly " } else { "" },
            property_name(&field.name),
            if field.optional { "?" } else { "" },
            self.render(&field.ty, context)
        )
    }
}

/// Single-quoted TypeScript string literal.
pub fn string_literal(value: &str) -> String {
    let mut literal = String::with_capacity(value.len() + 2);
    literal.push('\'');
    for c in value.chars() {
        match c {
            '\'' => literal.push_str("\\'"),
            '\\' => literal.push_str("\\\\"),
            '\n' => literal.push_str("\\n"),
            c => literal.push(c),
        }
    }
    literal.push('\'');
    literal
}

/// Property key, quoted unless it is a plain identifier.
pub fn property_name(name: &str) -> String {
    if is_identifier(name) {
        name.to_owned()
    } else {
        string_literal(name)
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// JSDoc block for a schema description, indented by `indent`.
pub fn doc_comment(description: Option<&str>, indent: &str) -> String {
    let Some(description) = description.map(str::trim).filter(|text| !text.is_empty()) else {
        return String::new();
    };
    let description = description.replace("*/", "*\\/");
    if !description.contains('\n') {
        return format!("{indent}/** {description} */\n");
    }
    let mut comment = format!("{indent}/**\n");
    for line in description.lines() {
        if line.trim().is_empty() {
            comment.push_str(&format!("{indent} *\n"));
        } else {
            comment.push_str(&format!("{indent} * {}\n", line.trim_end()));
        }
    }
    comment.push_str(&format!("{indent} */\n"));
    comment
}
