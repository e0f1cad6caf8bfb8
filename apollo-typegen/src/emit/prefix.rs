//! A configured literal placed into an artifact.
use serde::Deserialize;

use crate::emit::EmitContext;
use crate::emit::Emitter;
use crate::error::EmitterError;
use crate::placement::ArtifactFragment;
use crate::placement::Placement;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct PrefixOptions {
    content: String,
    #[serde(default = "default_placement")]
    placement: String,
    /// Relative to the destination's base artifact; empty targets the base artifact itself.
    #[serde(default)]
    target: String,
}

fn default_placement() -> String {
    "prepend".to_owned()
}

pub(crate) struct Prefix;

impl Emitter for Prefix {
    fn emit(&self, context: &EmitContext<'_>) -> Result<Vec<ArtifactFragment>, EmitterError> {
        let options: PrefixOptions =
            serde_json::from_value(serde_json::Value::Object(context.plugin_options.clone()))
                .map_err(|error| EmitterError::InvalidOptions(error.to_string()))?;
        let placement: Placement = options.placement.parse()?;
        let mut content = options.content;
        if !content.ends_with('\n') {
            content.push('\n');
        }
        Ok(vec![ArtifactFragment::new(options.target, content, placement)])
    }
}
