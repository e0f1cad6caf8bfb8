//! `index.ts` re-exporting the sibling modules of a destination.
use crate::emit::EmitContext;
use crate::emit::Emitter;
use crate::emit::EmitterKind;
use crate::emit::FRAGMENT_MASKING_MODULE;
use crate::emit::GQL_MODULE;
use crate::emit::INDEX_FILE;
use crate::error::EmitterError;
use crate::placement::ArtifactFragment;
use crate::placement::Placement;

pub(crate) struct IndexReexports;

impl Emitter for IndexReexports {
    fn emit(&self, context: &EmitContext<'_>) -> Result<Vec<ArtifactFragment>, EmitterError> {
        let modules = [
            (EmitterKind::FragmentMasking, FRAGMENT_MASKING_MODULE),
            (EmitterKind::GqlTagRegistry, GQL_MODULE),
        ];
        let text = modules
            .iter()
            .filter(|(kind, _)| context.destination.runs(*kind))
            .map(|(_, module)| format!("export * from \"./{module}\";\n"))
            .collect::<String>();
        if text.is_empty() {
            return Ok(Vec::new());
        }
        Ok(vec![ArtifactFragment::new(INDEX_FILE, text, Placement::Append)])
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::emit::test_support::Fixture;

    #[test]
    fn reexports_enabled_modules() {
        let mut fixture = Fixture::new(&[]);
        assert_eq!(fixture.emit(EmitterKind::IndexReexports).unwrap(), []);

        fixture.destination.emitters = vec![
            EmitterKind::GqlTagRegistry,
            EmitterKind::FragmentMasking,
            EmitterKind::IndexReexports,
        ];
        let fragments = fixture.emit(EmitterKind::IndexReexports).unwrap();
        assert_eq!(fragments[0].path, "index.ts");
        assert_eq!(
            String::from_utf8(fragments[0].bytes.clone()).unwrap(),
            "export * from \"./fragment-masking\";\nexport * from \"./gql\";\n"
        );
    }
}
