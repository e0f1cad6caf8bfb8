//! The `generate` entry point.
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Map;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::configuration::Configuration;
use crate::configuration::ConfigurationError;
use crate::configuration::EmitterOptions;
use crate::configuration::OutputConfig;
use crate::configuration::Preset;
use crate::document::DocumentOptions;
use crate::document::DocumentSet;
use crate::emit::Destination;
use crate::emit::EmitContext;
use crate::emit::EmitterKind;
use crate::error::DocumentError;
use crate::error::EmitterError;
use crate::error::GenerateError;
use crate::error::Warning;
use crate::loader::DocumentLoader;
use crate::loader::FileWriter;
use crate::loader::SchemaLoader;
use crate::placement::PlacementEngine;
use crate::scalars::ScalarMap;
use crate::schema::SchemaModel;
use crate::synthesis::SynthesisOptions;
use crate::synthesis::Synthesizer;
use crate::synthesis::descriptor::DescriptorCache;
use crate::synthesis::descriptor::FragmentDescriptor;
use crate::synthesis::descriptor::OperationDescriptor;

/// Base artifact of a directory destination.
const DIRECTORY_BASE_FILE: &str = "graphql.ts";

/// Artifacts by path, in order of first use, and the warnings of the run.
#[derive(Debug, Default)]
pub struct GenerateOutput {
    pub artifacts: IndexMap<PathBuf, Vec<u8>>,
    pub warnings: Vec<Warning>,
}

impl GenerateOutput {
    pub fn get(&self, path: impl AsRef<Path>) -> Option<&[u8]> {
        self.artifacts.get(path.as_ref()).map(Vec::as_slice)
    }

    /// Writes every artifact, stopping at the first failure.
    pub fn write(&self, writer: &dyn FileWriter) -> std::io::Result<()> {
        for (path, bytes) in &self.artifacts {
            writer.write(path, bytes)?;
        }
        Ok(())
    }
}

/// A destination with its emitters and the options given to each in the plugin list.
#[derive(Debug)]
struct Plan {
    destination: Destination,
    emitters: Vec<(EmitterKind, Map<String, Value>)>,
    options: Map<String, Value>,
}

fn plan(
    key: &str,
    output: &OutputConfig,
    shared: &Map<String, Value>,
) -> Result<Plan, ConfigurationError> {
    let directory = key.ends_with('/');
    let mut options = output.merged_options(shared);
    let mut emitters = Vec::new();
    if let Some(Preset::Client) = output.preset {
        if !directory {
            return Err(ConfigurationError::PresetNeedsDirectory(key.to_owned()));
        }
        emitters.extend([
            EmitterKind::BaseTypes,
            EmitterKind::OperationTypes,
            EmitterKind::TypedDocumentNode,
            EmitterKind::GqlTagRegistry,
        ]);
        if output.preset_config.fragment_masking {
            emitters.push(EmitterKind::FragmentMasking);
            options.insert(
                "inlineFragmentTypes".to_owned(),
                Value::from("mask"),
            );
        }
        emitters.push(EmitterKind::IndexReexports);
        if output.preset_config.persisted_documents {
            emitters.push(EmitterKind::PersistedDocuments);
        }
    }
    let mut emitters: Vec<(EmitterKind, Map<String, Value>)> = emitters
        .into_iter()
        .map(|kind| (kind, Map::new()))
        .collect();

    for entry in &output.plugins {
        for (name, plugin_options) in entry.items() {
            let kind = name
                .parse::<EmitterKind>()
                .map_err(|_| ConfigurationError::UnknownPlugin {
                    destination: key.to_owned(),
                    plugin: name.to_owned(),
                })?;
            emitters.push((kind, plugin_options));
        }
    }
    if emitters.is_empty() {
        return Err(ConfigurationError::NoPlugins(key.to_owned()));
    }

    let base_path = if directory {
        PathBuf::from(format!("{key}{DIRECTORY_BASE_FILE}"))
    } else {
        PathBuf::from(key)
    };
    Ok(Plan {
        destination: Destination {
            key: key.to_owned(),
            base_path,
            emitters: emitters.iter().map(|(kind, _)| *kind).collect(),
        },
        emitters,
        options,
    })
}

/// Generated files must never be read back as documents.
fn destination_excludes(configuration: &Configuration) -> Vec<String> {
    configuration
        .generates
        .keys()
        .map(|key| {
            if key.ends_with('/') {
                format!("{key}**")
            } else {
                key.clone()
            }
        })
        .collect()
}

fn destination_error(key: &str, emitter: EmitterKind, source: EmitterError) -> GenerateError {
    GenerateError::Destination {
        path: key.to_owned(),
        emitter: emitter.to_string(),
        source,
    }
}

type Descriptors = (Vec<Arc<OperationDescriptor>>, Vec<Arc<FragmentDescriptor>>);

fn describe(
    synthesizer: &Synthesizer<'_>,
    documents: &DocumentSet,
    cache: &mut DescriptorCache,
    options: &EmitterOptions,
    cancel: &CancellationToken,
) -> Result<Descriptors, Option<EmitterError>> {
    let mut operations = Vec::with_capacity(documents.operations().len());
    for name in documents.operations().keys() {
        if cancel.is_cancelled() {
            return Err(None);
        }
        let descriptor = cache
            .operation(synthesizer, documents, name, options.hash_algorithm)
            .map_err(|error| Some(EmitterError::from(error)))?;
        operations.push(descriptor);
    }
    let mut fragments = Vec::with_capacity(documents.fragments().len());
    for (name, _) in documents.fragments().iter() {
        let descriptor = cache
            .fragment(synthesizer, documents, name)
            .map_err(|error| Some(EmitterError::from(error)))?;
        fragments.push(descriptor);
    }
    Ok((operations, fragments))
}

/// Runs a code generation: loads the schema and the documents, then runs every destination's
/// emitters in configured order.
///
/// Artifacts are only returned once every destination succeeded. Nothing is written; pass the
/// output to a [`FileWriter`] with [`GenerateOutput::write`].
pub fn generate(
    configuration: &Configuration,
    schema_loader: &dyn SchemaLoader,
    document_loader: &dyn DocumentLoader,
    cancel: &CancellationToken,
) -> Result<GenerateOutput, GenerateError> {
    if configuration.generates.is_empty() {
        return Err(ConfigurationError::NoDestinations.into());
    }
    let plans = configuration
        .generates
        .iter()
        .map(|(key, output)| plan(key, output, &configuration.config))
        .collect::<Result<Vec<_>, _>>()?;

    let schema = schema_loader.load(
        configuration.schema.as_slice(),
        configuration.merge_policy,
    )?;
    tracing::debug!(hash = schema.hash(), "schema loaded");
    if cancel.is_cancelled() {
        return Err(GenerateError::Cancelled);
    }

    let (includes, mut excludes) = configuration.document_patterns();
    excludes.extend(destination_excludes(configuration));
    let sources = if includes.is_empty() {
        Vec::new()
    } else {
        document_loader.load(&includes, &excludes)?
    };
    let documents = DocumentSet::build(
        &schema,
        sources,
        DocumentOptions {
            anonymous_operations: configuration.anonymous_operations,
            lenient: configuration.lenient,
        },
        cancel,
    )
    .map_err(|error| match error {
        DocumentError::Cancelled => GenerateError::Cancelled,
        error => error.into(),
    })?;

    let mut warnings = documents.warnings().to_vec();
    let mut cache = DescriptorCache::new();
    let mut engine = PlacementEngine::new();
    for plan in &plans {
        run_destination(
            plan,
            configuration,
            &schema,
            &documents,
            &mut cache,
            &mut engine,
            &mut warnings,
            cancel,
        )?;
    }

    let artifacts = engine.finish();
    tracing::info!(
        artifacts = artifacts.len(),
        warnings = warnings.len(),
        "generation complete"
    );
    Ok(GenerateOutput {
        artifacts,
        warnings,
    })
}

#[allow(clippy::too_many_arguments)]
fn run_destination(
    plan: &Plan,
    configuration: &Configuration,
    schema: &SchemaModel,
    documents: &DocumentSet,
    cache: &mut DescriptorCache,
    engine: &mut PlacementEngine,
    warnings: &mut Vec<Warning>,
    cancel: &CancellationToken,
) -> Result<(), GenerateError> {
    let destination = &plan.destination;
    let Some((first, _)) = plan.emitters.first() else {
        return Ok(());
    };
    if cancel.is_cancelled() {
        return Err(GenerateError::Cancelled);
    }
    let options = EmitterOptions::from_map(&plan.options).map_err(|error| {
        destination_error(
            &destination.key,
            *first,
            EmitterError::InvalidOptions(error.to_string()),
        )
    })?;
    tracing::debug!(destination = %destination.key, emitters = ?destination.emitters, "generating destination");

    let scalars = ScalarMap::new(&configuration.scalars, &options.default_scalar_type);
    if destination.runs(EmitterKind::BaseTypes) || destination.runs(EmitterKind::OperationTypes) {
        scalars.report_unmapped(schema, warnings);
    }

    let synthesizer = Synthesizer::new(
        schema,
        documents.executable(),
        SynthesisOptions::from(&options),
    );
    let mut descriptors: Option<Descriptors> = None;
    let no_operations = Vec::new();
    let no_fragments = Vec::new();
    for (kind, plugin_options) in &plan.emitters {
        if cancel.is_cancelled() {
            return Err(GenerateError::Cancelled);
        }
        if kind.uses_descriptors() && descriptors.is_none() {
            let described = describe(&synthesizer, documents, cache, &options, cancel).map_err(
                |error| match error {
                    Some(error) => destination_error(&destination.key, *kind, error),
                    None => GenerateError::Cancelled,
                },
            )?;
            descriptors = Some(described);
        }
        let (operations, fragments) = match (&descriptors, kind.uses_descriptors()) {
            (Some((operations, fragments)), true) => (operations, fragments),
            _ => (&no_operations, &no_fragments),
        };
        let context = EmitContext {
            schema,
            documents,
            options: &options,
            plugin_options,
            scalars: &scalars,
            operations,
            fragments,
            destination,
        };
        let fragments = kind
            .emitter()
            .emit(&context)
            .map_err(|error| destination_error(&destination.key, *kind, error))?;
        for fragment in fragments {
            engine.place(&destination.base_path, fragment);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn output(value: Value) -> OutputConfig {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn client_preset_layout() {
        let plan = plan(
            "src/gql/",
            &output(json!({
                "preset": "client",
                "presetConfig": { "persistedDocuments": true },
                "plugins": [{ "add": { "content": "// extra" } }],
            })),
            &Map::new(),
        )
        .unwrap();
        assert_eq!(plan.destination.base_path, PathBuf::from("src/gql/graphql.ts"));
        assert_eq!(
            plan.destination.emitters,
            [
                EmitterKind::BaseTypes,
                EmitterKind::OperationTypes,
                EmitterKind::TypedDocumentNode,
                EmitterKind::GqlTagRegistry,
                EmitterKind::FragmentMasking,
                EmitterKind::IndexReexports,
                EmitterKind::PersistedDocuments,
                EmitterKind::Prefix,
            ]
        );
        assert_eq!(plan.options["inlineFragmentTypes"], json!("mask"));
        assert_eq!(plan.emitters[7].1["content"], json!("// extra"));
    }

    #[test]
    fn planning_errors() {
        assert_eq!(
            plan("types.ts", &output(json!({ "preset": "client" })), &Map::new()).unwrap_err(),
            ConfigurationError::PresetNeedsDirectory("types.ts".to_owned())
        );
        assert_eq!(
            plan("types.ts", &output(json!({})), &Map::new()).unwrap_err(),
            ConfigurationError::NoPlugins("types.ts".to_owned())
        );
        assert_eq!(
            plan(
                "types.ts",
                &output(json!({ "plugins": ["typescript-react-apollo"] })),
                &Map::new()
            )
            .unwrap_err(),
            ConfigurationError::UnknownPlugin {
                destination: "types.ts".to_owned(),
                plugin: "typescript-react-apollo".to_owned(),
            }
        );
    }

    #[test]
    fn destination_options_override_shared_options() {
        let shared = json!({ "enumsAsTypes": true, "strictNulls": false });
        let Value::Object(shared) = shared else {
            unreachable!()
        };
        let plan = plan(
            "types.ts",
            &output(json!({ "plugins": ["base-types"], "config": { "strictNulls": true } })),
            &shared,
        )
        .unwrap();
        let options = EmitterOptions::from_map(&plan.options).unwrap();
        assert!(options.enums_as_types);
        assert!(options.strict_nulls);
        assert_eq!(plan.destination.base_path, PathBuf::from("types.ts"));
    }

    #[test]
    fn generated_paths_are_excluded() {
        let configuration = Configuration::from_json(json!({
            "schema": "schema.graphql",
            "generates": {
                "src/gql/": { "preset": "client" },
                "src/types.ts": { "plugins": ["base-types"] },
            },
        }))
        .unwrap();
        assert_eq!(
            destination_excludes(&configuration),
            ["src/gql/**", "src/types.ts"]
        );
    }
}
