//! The persisted documents manifest.
use std::collections::BTreeMap;

use crate::emit::EmitContext;
use crate::emit::Emitter;
use crate::emit::PERSISTED_DOCUMENTS_FILE;
use crate::error::EmitterError;
use crate::placement::ArtifactFragment;
use crate::placement::Placement;

pub(crate) struct PersistedDocuments;

impl Emitter for PersistedDocuments {
    fn emit(&self, context: &EmitContext<'_>) -> Result<Vec<ArtifactFragment>, EmitterError> {
        let manifest: BTreeMap<&str, &str> = context
            .operations
            .iter()
            .map(|descriptor| (descriptor.hash.as_str(), descriptor.normalized.as_str()))
            .collect();
        let mut json = serde_json::to_string_pretty(&manifest)
            .map_err(|error| EmitterError::Serialize(error.to_string()))?;
        json.push('\n');
        tracing::debug!(documents = manifest.len(), "emitted persisted documents");
        Ok(vec![ArtifactFragment::new(
            PERSISTED_DOCUMENTS_FILE,
            json,
            Placement::Replace,
        )])
    }
}
