//! Typegen errors and warnings.
use std::fmt;

use apollo_compiler::validation::DiagnosticList;
use displaydoc::Display;
use serde::Serialize;
use thiserror::Error;

pub use crate::configuration::ConfigurationError;
use crate::schema::merge::Conflict;

/// GraphQL diagnostics reported by the parser or validator, rendered to messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostics {
    messages: Vec<String>,
}

impl Diagnostics {
    pub(crate) fn new(messages: Vec<String>) -> Self {
        Self { messages }
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl From<DiagnosticList> for Diagnostics {
    fn from(errors: DiagnosticList) -> Self {
        Self::from(&errors)
    }
}

impl From<&DiagnosticList> for Diagnostics {
    fn from(errors: &DiagnosticList) -> Self {
        Self {
            messages: errors
                .iter()
                .map(|diagnostic| diagnostic.error.to_string())
                .collect(),
        }
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut messages = self.messages.iter();
        for (i, message) in messages.by_ref().take(5).enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            f.write_str(message)?;
        }
        let remaining = messages.count();
        if remaining > 0 {
            write!(f, "\n...and {remaining} other errors")?;
        }
        Ok(())
    }
}

/// Errors raised while loading and merging schema sources.
#[derive(Debug, Error, Display, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SchemaError {
    /// no schema source was provided
    NoSources,
    /// could not parse schema source '{source_name}': {errors}
    Parse {
        source_name: String,
        errors: Diagnostics,
    },
    /// invalid schema: {0}
    Validation(Diagnostics),
    /// conflicting definitions of {conflict} between '{first}' and '{second}'
    MergeConflict {
        conflict: Conflict,
        first: String,
        second: String,
    },
    /// unsupported schema source: {0}
    UnsupportedSource(String),
    /// could not read schema source '{path}': {reason}
    Read { path: String, reason: String },
}

/// Errors raised while parsing and validating executable documents.
#[derive(Debug, Error, Display, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DocumentError {
    /// could not parse document '{origin}': {errors}
    Parse { origin: String, errors: Diagnostics },
    /// invalid document '{origin}': {errors}
    Validation { origin: String, errors: Diagnostics },
    /// fragment '{name}' is defined in both '{first}' and '{second}'
    DuplicateFragment {
        name: String,
        first: String,
        second: String,
    },
    /// operation '{name}' is defined in both '{first}' and '{second}'
    DuplicateOperation {
        name: String,
        first: String,
        second: String,
    },
    /// anonymous operation in '{origin}': every operation must be named
    AnonymousOperation { origin: String },
    /// could not load documents: {0}
    Load(String),
    /// document loading was cancelled
    Cancelled,
}

/// Invariant violations reached while synthesizing types. Documents are validated upstream, so
/// these only surface when a caller bypasses validation.
#[derive(Debug, Error, Display, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SynthesisError {
    /// cannot query field '{field}' on type '{type_name}'
    UnknownField { type_name: String, field: String },
    /// unknown type '{0}'
    UnknownType(String),
    /// unknown fragment '{0}'
    UnknownFragment(String),
    /// unknown operation '{0}'
    UnknownOperation(String),
    /// the schema does not define a root type for {0} operations
    MissingRootType(String),
    /// type '{0}' cannot be used in an input position
    NotAnInputType(String),
}

/// Errors raised when combining artifact fragments.
#[derive(Debug, Error, Display, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PlacementError {
    /// unknown placement '{0}', expected one of prepend, append, replace
    UnknownPlacement(String),
}

/// Errors raised by a single emitter.
#[derive(Debug, Error, Display, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum EmitterError {
    /// invalid emitter options: {0}
    InvalidOptions(String),
    /// {0}
    Synthesis(#[from] SynthesisError),
    /// {0}
    Placement(#[from] PlacementError),
    /// could not serialize artifact: {0}
    Serialize(String),
}

/// Fatal errors returned by [`crate::generate`].
#[derive(Debug, Error, Display)]
#[non_exhaustive]
pub enum GenerateError {
    /// schema error: {0}
    Schema(#[from] SchemaError),
    /// document error: {0}
    Document(#[from] DocumentError),
    /// configuration error: {0}
    Configuration(#[from] ConfigurationError),
    /// destination '{path}' failed in emitter '{emitter}': {source}
    Destination {
        path: String,
        emitter: String,
        source: EmitterError,
    },
    /// generation was cancelled
    Cancelled,
}

/// Non-fatal conditions collected during generation and returned beside the artifacts.
#[derive(Debug, Display, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Warning {
    /// anonymous operation in '{origin}' was skipped, name it to generate types for it
    AnonymousOperationSkipped { origin: String },
    /// scalar '{name}' has no mapping and is typed as '{fallback}'
    UnknownScalar { name: String, fallback: String },
    /// fragment '{name}' is not used by any operation
    UnusedFragment { name: String },
    /// document '{origin}' was skipped: {reason}
    InvalidDocumentSkipped { origin: String, reason: String },
}

impl Warning {
    /// Logs the warning and records it.
    pub(crate) fn report(self, warnings: &mut Vec<Warning>) {
        tracing::warn!("{self}");
        warnings.push(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostics_are_truncated_after_five_messages() {
        let diagnostics = Diagnostics::new((1..=7).map(|i| format!("error {i}")).collect());
        assert_eq!(
            diagnostics.to_string(),
            "error 1\nerror 2\nerror 3\nerror 4\nerror 5\n...and 2 other errors"
        );
    }

    #[test]
    fn destination_errors_name_the_emitter() {
        let error = GenerateError::Destination {
            path: "src/gql/".to_string(),
            emitter: "typed-document-node".to_string(),
            source: EmitterError::InvalidOptions("unknown variant `json`".to_string()),
        };
        assert_eq!(
            error.to_string(),
            "destination 'src/gql/' failed in emitter 'typed-document-node': invalid emitter options: unknown variant `json`"
        );
    }

    #[test]
    fn warnings_serialize_with_their_kind() {
        let warning = Warning::UnusedFragment {
            name: "UserFields".to_string(),
        };
        assert_eq!(
            serde_json::to_string(&warning).unwrap(),
            r#"{"kind":"unusedFragment","name":"UserFields"}"#
        );
    }
}
