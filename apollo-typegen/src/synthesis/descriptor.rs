//! Per-operation and per-fragment synthesis results, cached for one generator run.
use std::collections::BTreeMap;
use std::collections::HashMap;
use std::sync::Arc;

use apollo_compiler::Name;
use apollo_compiler::ast;
use apollo_compiler::executable::OperationType;

use crate::document::DocumentSet;
use crate::error::SynthesisError;
use crate::normalize;
use crate::normalize::HashAlgorithm;
use crate::synthesis::ObjectIr;
use crate::synthesis::SynthesisOptions;
use crate::synthesis::Synthesizer;
use crate::synthesis::TypeIr;
use crate::synthesis::is_deferred;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationDescriptor {
    pub name: Name,
    pub kind: OperationType,
    /// Canonical text of the operation and its fragment closure.
    pub normalized: String,
    pub hash: String,
    /// Fragments transitively spread, sorted by name.
    pub closure: Vec<Name>,
    pub variables: ObjectIr,
    pub result: TypeIr,
    /// Top-level response names of each fragment spread with `@defer`, by fragment name.
    pub deferred_fields: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentDescriptor {
    pub name: Name,
    pub type_condition: Name,
    pub closure: Vec<Name>,
    pub shape: TypeIr,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct OperationKey {
    operation: Name,
    options: SynthesisOptions,
    hash_algorithm: HashAlgorithm,
}

/// Descriptors keyed by identity and the options that shape them. Lives for one `generate` call.
#[derive(Debug, Default)]
pub struct DescriptorCache {
    operations: HashMap<OperationKey, Arc<OperationDescriptor>>,
    fragments: HashMap<(Name, SynthesisOptions), Arc<FragmentDescriptor>>,
}

impl DescriptorCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.operations.len() + self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn operation(
        &mut self,
        synthesizer: &Synthesizer<'_>,
        documents: &DocumentSet,
        name: &Name,
        hash_algorithm: HashAlgorithm,
    ) -> Result<Arc<OperationDescriptor>, SynthesisError> {
        let key = OperationKey {
            operation: name.clone(),
            options: synthesizer.options(),
            hash_algorithm,
        };
        if let Some(descriptor) = self.operations.get(&key) {
            return Ok(descriptor.clone());
        }

        let entry = documents
            .operation(name)
            .ok_or_else(|| SynthesisError::UnknownOperation(name.to_string()))?;
        let operation = documents
            .executable()
            .operations
            .named
            .get(name)
            .ok_or_else(|| SynthesisError::UnknownOperation(name.to_string()))?;
        let fragments = documents.fragments();
        let closure = fragments.closure(&entry.definition.selection_set);
        let (hash, normalized) =
            normalize::hash_operation(&entry.definition, fragments, hash_algorithm);

        let descriptor = Arc::new(OperationDescriptor {
            name: name.clone(),
            kind: operation.operation_type,
            normalized,
            hash,
            deferred_fields: deferred_fields(documents, &entry.definition.selection_set, &closure),
            closure,
            variables: synthesizer.variables(operation)?,
            result: synthesizer.operation(operation)?,
        });
        tracing::trace!(operation = %name, hash = %descriptor.hash, "described operation");
        self.operations.insert(key, descriptor.clone());
        Ok(descriptor)
    }

    pub fn fragment(
        &mut self,
        synthesizer: &Synthesizer<'_>,
        documents: &DocumentSet,
        name: &Name,
    ) -> Result<Arc<FragmentDescriptor>, SynthesisError> {
        let key = (name.clone(), synthesizer.options());
        if let Some(descriptor) = self.fragments.get(&key) {
            return Ok(descriptor.clone());
        }
        let fragment = documents
            .executable()
            .fragments
            .get(name)
            .ok_or_else(|| SynthesisError::UnknownFragment(name.to_string()))?;
        let descriptor = Arc::new(FragmentDescriptor {
            name: name.clone(),
            type_condition: fragment.type_condition().clone(),
            closure: documents.fragments().closure_of_fragment(name),
            shape: synthesizer.fragment(fragment)?,
        });
        self.fragments.insert(key, descriptor.clone());
        Ok(descriptor)
    }
}

/// Response names of the top-level fields of every fragment spread with `@defer`.
fn deferred_fields(
    documents: &DocumentSet,
    selections: &[ast::Selection],
    closure: &[Name],
) -> BTreeMap<String, Vec<String>> {
    let fragments = documents.fragments();
    let mut deferred = Vec::new();
    let mut visit = |selections: &[ast::Selection]| {
        collect_deferred_spreads(selections, &mut deferred);
    };
    visit(selections);
    for name in closure {
        if let Some(entry) = fragments.get(name) {
            visit(&entry.definition.selection_set);
        }
    }

    let mut fields = BTreeMap::new();
    for name in deferred {
        let Some(entry) = fragments.get(&name) else {
            continue;
        };
        let mut names: Vec<String> = Vec::new();
        for selection in &entry.definition.selection_set {
            if let ast::Selection::Field(field) = selection {
                let response_name = field.alias.as_ref().unwrap_or(&field.name).to_string();
                if !names.contains(&response_name) {
                    names.push(response_name);
                }
            }
        }
        fields.insert(name.to_string(), names);
    }
    fields
}

fn collect_deferred_spreads(selections: &[ast::Selection], deferred: &mut Vec<Name>) {
    for selection in selections {
        match selection {
            ast::Selection::Field(field) => collect_deferred_spreads(&field.selection_set, deferred),
            ast::Selection::InlineFragment(inline) => {
                collect_deferred_spreads(&inline.selection_set, deferred)
            }
            ast::Selection::FragmentSpread(spread) => {
                if is_deferred(&spread.directives) && !deferred.contains(&spread.fragment_name) {
                    deferred.push(spread.fragment_name.clone());
                }
            }
        }
    }
}
