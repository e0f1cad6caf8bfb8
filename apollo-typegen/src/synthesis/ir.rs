//! Language-neutral shapes of operation results and variables.

/// Type of a value in a result, a variables record, or a base type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeIr {
    /// A scalar, rendered through the scalar map.
    Scalar(String),
    EnumRef(String),
    InputRef(String),
    /// A named output type; base types and fragment references only.
    NamedRef(String),
    Object(ObjectIr),
    /// One option per concrete type, each with a distinct `__typename` literal.
    Union(Vec<ObjectIr>),
    Array { element: Box<TypeIr>, readonly: bool },
    Nullable(Box<TypeIr>),
    Literal(String),
}

impl TypeIr {
    pub fn nullable(inner: TypeIr) -> Self {
        TypeIr::Nullable(Box::new(inner))
    }

    pub fn array(element: TypeIr, readonly: bool) -> Self {
        TypeIr::Array {
            element: Box::new(element),
            readonly,
        }
    }

    /// Strips array and nullable wrappers.
    pub fn innermost(&self) -> &TypeIr {
        match self {
            TypeIr::Array { element, .. } => element.innermost(),
            TypeIr::Nullable(inner) => inner.innermost(),
            other => other,
        }
    }
}

/// An anonymous record with uniquely named fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ObjectIr {
    pub fields: Vec<FieldIr>,
}

impl ObjectIr {
    pub fn new(fields: Vec<FieldIr>) -> Self {
        Self { fields }
    }

    pub fn field(&self, name: &str) -> Option<&FieldIr> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// The `__typename` literal, when the object's concrete type is known.
    pub fn typename(&self) -> Option<&str> {
        match self.field("__typename").map(|field| &field.ty) {
            Some(TypeIr::Literal(name)) => Some(name),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldIr {
    /// Response name.
    pub name: String,
    /// May be absent from the value.
    pub optional: bool,
    /// May be null.
    pub nullable: bool,
    pub readonly: bool,
    pub ty: TypeIr,
}

impl FieldIr {
    pub fn required(name: impl Into<String>, ty: TypeIr) -> Self {
        Self {
            name: name.into(),
            optional: false,
            nullable: false,
            readonly: false,
            ty,
        }
    }
}
