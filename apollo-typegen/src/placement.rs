//! Combines artifact fragments targeting the same path.
use std::path::Path;
use std::path::PathBuf;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::Deserialize;
use serde::Serialize;

use crate::error::PlacementError;

/// How a fragment's bytes combine with the other fragments of its artifact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Placement {
    /// Before any existing content.
    Prepend,
    /// After existing content.
    #[default]
    Append,
    /// Discards the content placed so far; later fragments append after it.
    Replace,
}

impl FromStr for Placement {
    type Err = PlacementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "prepend" => Ok(Placement::Prepend),
            "append" => Ok(Placement::Append),
            "replace" => Ok(Placement::Replace),
            other => Err(PlacementError::UnknownPlacement(other.to_owned())),
        }
    }
}

/// Output of an emitter for one artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactFragment {
    /// Empty for the destination's base artifact, otherwise resolved against its directory.
    pub path: String,
    pub bytes: Vec<u8>,
    pub placement: Placement,
}

impl ArtifactFragment {
    pub fn new(path: impl Into<String>, bytes: impl Into<Vec<u8>>, placement: Placement) -> Self {
        Self {
            path: path.into(),
            bytes: bytes.into(),
            placement,
        }
    }

    /// Appended to the destination's base artifact.
    pub fn base(bytes: impl Into<Vec<u8>>) -> Self {
        Self::new("", bytes, Placement::Append)
    }
}

#[derive(Debug, Default)]
struct Buffer {
    prepends: Vec<Vec<u8>>,
    content: Vec<u8>,
    appends: Vec<Vec<u8>>,
}

impl Buffer {
    fn place(&mut self, bytes: Vec<u8>, placement: Placement) {
        match placement {
            Placement::Prepend => self.prepends.push(bytes),
            Placement::Append => self.appends.push(bytes),
            Placement::Replace => self.content = bytes,
        }
    }

    fn finish(self) -> Vec<u8> {
        let mut bytes = Vec::new();
        for prepend in self.prepends.into_iter().rev() {
            bytes.extend(prepend);
        }
        bytes.extend(self.content);
        for append in self.appends {
            bytes.extend(append);
        }
        bytes
    }
}

/// Per-path buffers for one generator run, in order of first use.
#[derive(Debug, Default)]
pub struct PlacementEngine {
    buffers: IndexMap<PathBuf, Buffer>,
}

impl PlacementEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves `path` against `base`: empty inherits it, relative paths land in its directory.
    pub fn resolve(base: &Path, path: &str) -> PathBuf {
        if path.is_empty() {
            return base.to_path_buf();
        }
        let path = Path::new(path);
        if path.is_absolute() {
            return path.to_path_buf();
        }
        match base.parent() {
            Some(directory) => directory.join(path),
            None => path.to_path_buf(),
        }
    }

    pub fn place(&mut self, base: &Path, fragment: ArtifactFragment) {
        let path = Self::resolve(base, &fragment.path);
        tracing::trace!(
            path = %path.display(),
            placement = ?fragment.placement,
            bytes = fragment.bytes.len(),
            "placing fragment"
        );
        self.buffers
            .entry(path)
            .or_default()
            .place(fragment.bytes, fragment.placement);
    }

    pub fn finish(self) -> IndexMap<PathBuf, Vec<u8>> {
        self.buffers
            .into_iter()
            .map(|(path, buffer)| (path, buffer.finish()))
            .collect()
    }
}
