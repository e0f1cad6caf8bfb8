//! Logic for loading configuration in to an object model
use displaydoc::Display;
use indexmap::IndexMap;
use schemars::JsonSchema;
use schemars::r#gen::SchemaSettings;
use schemars::schema::RootSchema;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use thiserror::Error;

use crate::normalize::HashAlgorithm;
use crate::schema::merge::MergePolicy;

/// Configuration error.
#[derive(Debug, Error, Display, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigurationError {
    /// no output destination is configured
    NoDestinations,
    /// destination '{0}' has neither a preset nor plugins
    NoPlugins(String),
    /// unknown plugin '{plugin}' in destination '{destination}'
    UnknownPlugin { destination: String, plugin: String },
    /// the client preset needs a directory destination ending with '/', got '{0}'
    PresetNeedsDirectory(String),
    /// {message}: {error}
    InvalidConfiguration {
        message: &'static str,
        error: String,
    },
    /// could not deserialize configuration: {0}
    DeserializeConfigError(String),
}

/// Either a single value or a list of values.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> Default for OneOrMany<T> {
    fn default() -> Self {
        OneOrMany::Many(Vec::new())
    }
}

impl<T> OneOrMany<T> {
    pub fn as_slice(&self) -> &[T] {
        match self {
            OneOrMany::One(value) => std::slice::from_ref(value),
            OneOrMany::Many(values) => values,
        }
    }
}

/// Where a schema comes from.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(untagged)]
pub enum SchemaSource {
    /// Path to a local SDL file.
    Path(String),
    /// Path to a local SDL file.
    File { file: String },
    /// Remote endpoint to introspect.
    Url {
        url: String,
        #[serde(default)]
        headers: IndexMap<String, String>,
    },
    /// Introspection result stored as JSON.
    Introspection { introspection: String },
}

impl SchemaSource {
    /// The local file path, when the source is a file.
    pub fn file(&self) -> Option<&str> {
        match self {
            SchemaSource::Path(path) | SchemaSource::File { file: path } => Some(path),
            SchemaSource::Url { .. } | SchemaSource::Introspection { .. } => None,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            SchemaSource::Path(path) | SchemaSource::File { file: path } => path.clone(),
            SchemaSource::Url { url, .. } => format!("url {url}"),
            SchemaSource::Introspection { introspection } => {
                format!("introspection {introspection}")
            }
        }
    }
}

/// TypeScript type of a scalar, shared or split by position.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(untagged)]
pub enum ScalarMapping {
    Same(String),
    Split { input: String, output: String },
}

/// What to do with operations that have no name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum AnonymousOperations {
    /// Drop them with a warning.
    #[default]
    Skip,
    /// Fail the run.
    Reject,
}

/// Configuration for a code generation run.
///
/// Can be created through `serde::Deserialize` from various formats,
/// or inline in Rust code with `serde_json::json!` and `serde_json::from_value`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Configuration {
    /// Schema sources, merged in order.
    pub schema: OneOrMany<SchemaSource>,

    /// Glob patterns of files containing GraphQL documents. Patterns starting with `!` exclude.
    #[serde(default)]
    pub documents: OneOrMany<String>,

    /// TypeScript types for custom scalars.
    #[serde(default)]
    pub scalars: IndexMap<String, ScalarMapping>,

    /// How conflicts between schema sources are settled.
    #[serde(default)]
    pub merge_policy: MergePolicy,

    /// What to do with anonymous operations.
    #[serde(default)]
    pub anonymous_operations: AnonymousOperations,

    /// Skip invalid documents with a warning instead of failing.
    #[serde(default)]
    pub lenient: bool,

    /// Emitter options shared by every destination.
    #[serde(default)]
    #[schemars(with = "EmitterOptions")]
    pub config: Map<String, Value>,

    /// Output destinations, generated in order.
    pub generates: IndexMap<String, OutputConfig>,
}

impl Configuration {
    pub fn from_json(value: Value) -> Result<Self, ConfigurationError> {
        serde_json::from_value(value)
            .map_err(|error| ConfigurationError::DeserializeConfigError(error.to_string()))
    }

    /// Include and exclude glob patterns, in configured order.
    pub fn document_patterns(&self) -> (Vec<String>, Vec<String>) {
        let mut includes = Vec::new();
        let mut excludes = Vec::new();
        for pattern in self.documents.as_slice() {
            match pattern.strip_prefix('!') {
                Some(excluded) => excludes.push(excluded.to_owned()),
                None => includes.push(pattern.clone()),
            }
        }
        (includes, excludes)
    }
}

/// Presets expanding one destination into several artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum Preset {
    /// A `graphql.ts`/`gql.ts`/`fragment-masking.ts`/`index.ts` client module.
    Client,
}

/// A plugin name, optionally with plugin-specific options.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(untagged)]
pub enum PluginEntry {
    Name(String),
    Configured(IndexMap<String, Map<String, Value>>),
}

impl PluginEntry {
    /// Flattens entries into `(name, options)` pairs.
    pub fn items(&self) -> Vec<(&str, Map<String, Value>)> {
        match self {
            PluginEntry::Name(name) => vec![(name.as_str(), Map::new())],
            PluginEntry::Configured(plugins) => plugins
                .iter()
                .map(|(name, options)| (name.as_str(), options.clone()))
                .collect(),
        }
    }
}

/// Options of the client preset.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct PresetConfig {
    /// Emit `fragment-masking.ts` and mask fragment spreads.
    pub fragment_masking: bool,
    /// Emit `persisted-documents.json`.
    pub persisted_documents: bool,
}

impl Default for PresetConfig {
    fn default() -> Self {
        Self {
            fragment_masking: true,
            persisted_documents: false,
        }
    }
}

/// One output destination.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct OutputConfig {
    #[serde(default)]
    pub preset: Option<Preset>,

    /// Emitters run in order after the preset's.
    #[serde(default)]
    pub plugins: Vec<PluginEntry>,

    /// Emitter options overriding the shared `config`.
    #[serde(default)]
    #[schemars(with = "EmitterOptions")]
    pub config: Map<String, Value>,

    #[serde(default)]
    pub preset_config: PresetConfig,
}

impl OutputConfig {
    /// Overlays this destination's options on the shared ones.
    pub fn merged_options(&self, shared: &Map<String, Value>) -> Map<String, Value> {
        let mut options = shared.clone();
        for (key, value) in &self.config {
            options.insert(key.clone(), value.clone());
        }
        options
    }
}

/// How typed documents are represented.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum DocumentMode {
    /// A pre-parsed document AST literal.
    #[default]
    #[serde(alias = "documentNode")]
    Ast,
    /// The document source as a string.
    String,
    /// A `gql` tagged template.
    #[serde(alias = "graphQLTag")]
    Tag,
}

/// How generated type names are cased.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum NamingConvention {
    #[default]
    PascalCase,
    Keep,
}

/// How fragment spreads are represented in operation types.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum InlineFragmentTypes {
    /// Spread fields are merged into the selecting object.
    #[default]
    Inline,
    /// Spreads become opaque fragment references.
    Mask,
}

/// Options recognized by the emitters.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct EmitterOptions {
    /// Render `| null` on nullable operation fields.
    pub strict_nulls: bool,
    /// Readonly fields and readonly arrays.
    pub immutable_types: bool,
    /// Enums become string literal unions.
    pub enums_as_types: bool,
    /// Omit `export` on top-level declarations.
    pub no_export: bool,
    /// Do not synthesize `__typename`.
    pub skip_typename: bool,
    /// Drop the `Query`/`Mutation`/`Subscription` suffix of operation type names.
    pub omit_operation_suffix: bool,
    /// Mark every field required.
    pub avoid_optionals: bool,
    /// Body of the `Maybe<T>` helper.
    pub maybe_value: String,
    /// Body of the `InputMaybe<T>` helper.
    pub input_maybe_value: String,
    pub document_mode: DocumentMode,
    /// Make synthesized `__typename` fields required.
    pub non_optional_typename: bool,
    /// Avoid `GetUserQueryQuery` when the operation name already ends with its kind.
    pub dedupe_operation_suffix: bool,
    /// TypeScript type of scalars without a mapping.
    pub default_scalar_type: String,
    pub naming_convention: NamingConvention,
    pub inline_fragment_types: InlineFragmentTypes,
    /// Hash used for persisted documents.
    pub hash_algorithm: HashAlgorithm,
    pub unmask_function_name: String,
    pub gql_tag_name: String,
    /// Emit the string-document form of `isFragmentReady`.
    pub string_mode_ready_guard: bool,
}

impl Default for EmitterOptions {
    fn default() -> Self {
        Self {
            strict_nulls: true,
            immutable_types: false,
            enums_as_types: false,
            no_export: false,
            skip_typename: false,
            omit_operation_suffix: false,
            avoid_optionals: false,
            maybe_value: "T | null".to_owned(),
            input_maybe_value: "Maybe<T>".to_owned(),
            document_mode: DocumentMode::default(),
            non_optional_typename: false,
            dedupe_operation_suffix: false,
            default_scalar_type: "any".to_owned(),
            naming_convention: NamingConvention::default(),
            inline_fragment_types: InlineFragmentTypes::default(),
            hash_algorithm: HashAlgorithm::default(),
            unmask_function_name: "unmaskFragment".to_owned(),
            gql_tag_name: "graphql".to_owned(),
            string_mode_ready_guard: false,
        }
    }
}

impl EmitterOptions {
    pub fn from_map(options: &Map<String, Value>) -> Result<Self, serde_json::Error> {
        serde_json::from_value(Value::Object(options.clone()))
    }

    pub(crate) fn export(&self) -> &'static str {
        if self.no_export { "" } else { "export " }
    }
}

/// Generate a JSON schema for the configuration.
pub fn generate_config_schema() -> RootSchema {
    let settings = SchemaSettings::draft07().with(|s| {
        s.option_nullable = true;
        s.option_add_null_type = false;
        s.inline_subschemas = true;
    });
    settings.into_generator().into_root_schema_for::<Configuration>()
}
