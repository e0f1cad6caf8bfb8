//! Result and variables types of operations, and fragment types.
use apollo_compiler::ast;

use crate::emit::EmitContext;
use crate::emit::Emitter;
use crate::emit::section;
use crate::error::EmitterError;
use crate::error::SynthesisError;
use crate::naming;
use crate::placement::ArtifactFragment;
use crate::render::RenderContext;
use crate::synthesis::descriptor::FragmentDescriptor;
use crate::synthesis::descriptor::OperationDescriptor;

pub(crate) struct OperationTypes;

impl Emitter for OperationTypes {
    fn emit(&self, context: &EmitContext<'_>) -> Result<Vec<ArtifactFragment>, EmitterError> {
        let mut declarations = Vec::new();
        for document in context.documents.documents() {
            for definition in &document.ast().definitions {
                match definition {
                    ast::Definition::OperationDefinition(operation) => {
                        let Some(name) = &operation.name else {
                            continue;
                        };
                        let descriptor = context
                            .operation(name)
                            .ok_or_else(|| SynthesisError::UnknownOperation(name.to_string()))?;
                        declarations.push(variables_type(context, descriptor));
                        declarations.push(result_type(context, descriptor));
                    }
                    ast::Definition::FragmentDefinition(fragment) => {
                        let descriptor = context.fragment(&fragment.name).ok_or_else(|| {
                            SynthesisError::UnknownFragment(fragment.name.to_string())
                        })?;
                        declarations.push(fragment_type(context, descriptor));
                    }
                    _ => {}
                }
            }
        }
        tracing::debug!(declarations = declarations.len(), "emitted operation types");
        Ok(vec![ArtifactFragment::base(section(&declarations))])
    }
}

fn variables_type(context: &EmitContext<'_>, descriptor: &OperationDescriptor) -> String {
    let name = naming::variables_type_name(&descriptor.name, descriptor.kind, context.options);
    let record = if descriptor.variables.fields.is_empty() {
        "{ [key: string]: never; }".to_owned()
    } else {
        context
            .renderer()
            .block(&descriptor.variables, RenderContext::Input)
    };
    format!("{}type {name} = Exact<{record}>;", context.options.export())
}

fn result_type(context: &EmitContext<'_>, descriptor: &OperationDescriptor) -> String {
    format!(
        "{}type {} = {};",
        context.options.export(),
        naming::operation_type_name(&descriptor.name, descriptor.kind, context.options),
        context
            .renderer()
            .render(&descriptor.result, RenderContext::Operation)
    )
}

fn fragment_type(context: &EmitContext<'_>, descriptor: &FragmentDescriptor) -> String {
    format!(
        "{}type {} = {};",
        context.options.export(),
        naming::fragment_type_name(&descriptor.name, context.options.naming_convention),
        context
            .renderer()
            .render(&descriptor.shape, RenderContext::Operation)
    )
}
