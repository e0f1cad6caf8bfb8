//! GraphQL texts embedded in source files.
use std::path::Path;

use apollo_typegen::SourceExtractor;
use apollo_typegen::SourceText;
use regex::Regex;

const SCRIPT_EXTENSIONS: [&str; 8] = ["ts", "tsx", "js", "jsx", "mjs", "cjs", "mts", "cts"];

/// Reads `.graphql`/`.gql` files whole and pulls `graphql(`...`)`, `` gql`...` `` and
/// `` /* GraphQL */ `...` `` templates out of scripts. Other files yield nothing.
pub(crate) struct TaggedTemplateExtractor {
    template: Regex,
}

impl TaggedTemplateExtractor {
    pub(crate) fn new(tags: &[&str]) -> Result<Self, regex::Error> {
        let tags = tags
            .iter()
            .map(|tag| regex::escape(tag))
            .collect::<Vec<_>>()
            .join("|");
        Ok(Self {
            template: Regex::new(&format!(
                r"(?s)(?:\b(?:{tags})(?:\(\s*)?|/\*\s*GraphQL\s*\*/\s*)`([^`]*)`"
            ))?,
        })
    }
}

impl SourceExtractor for TaggedTemplateExtractor {
    fn extract(&self, path: &Path, bytes: &[u8]) -> Vec<SourceText> {
        let origin = path.to_string_lossy().replace('\\', "/");
        let text = String::from_utf8_lossy(bytes);
        match path.extension().and_then(|extension| extension.to_str()) {
            Some("graphql" | "gql" | "graphqls") => return vec![SourceText::new(origin, text)],
            Some(extension) if SCRIPT_EXTENSIONS.contains(&extension) => {}
            _ => return Vec::new(),
        }
        self.template
            .captures_iter(&text)
            .filter_map(|captures| captures.get(1))
            .map(|template| template.as_str())
            .filter(|template| {
                // Interpolated templates are assembled at runtime.
                if template.contains("${") {
                    tracing::debug!(%origin, "skipping interpolated template");
                    return false;
                }
                !template.trim().is_empty()
            })
            .map(|template| SourceText::new(origin.clone(), template))
            .collect()
    }
}
