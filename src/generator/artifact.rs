use super::writer::{ArtifactWriter, WrittenFile};
use crate::config::EngineSettings;
use crate::error::EngineResult;
use crate::layout::DetectedLayout;
use super::endpoint::mapping_annotation;
use crate::spec::{Operation, OperationCatalog};

/// Everything a generator may read while producing artifacts for one operation.
#[derive(Clone, Copy)]
pub struct GenerationContext<'a> {
    pub layout: &'a DetectedLayout,
    /// Catalog of the spec being generated.
    pub catalog: &'a OperationCatalog,
    /// Legacy catalog, present only when migrating.
    pub legacy: Option<&'a OperationCatalog>,
    pub settings: &'a EngineSettings,
    pub writer: &'a ArtifactWriter,
}

impl<'a> GenerationContext<'a> {
    /// Routable operations sharing `tag` as their primary tag, in catalog order.
    ///
    /// Tag-scoped artifacts are always built from this full set, not from the
    /// operations the run happens to be scoped to. Operations whose verb
    /// cannot be routed fail on their own and appear in no artifact.
    pub fn tag_operations(&self, tag: &str) -> Vec<&'a Operation> {
        self.catalog
            .find_by_tags(&[tag])
            .into_iter()
            .filter(|op| op.primary_tag == tag && mapping_annotation(op.method).is_some())
            .collect()
    }
}

/// One kind of generated artifact.
///
/// Generators are called once per operation in catalog order. Tag-scoped
/// generators emit their artifact on the first operation of a tag and return
/// nothing for the rest; the set of emitted tags lives on the generator so a
/// fresh instance is needed per run.
pub trait ArtifactGenerator {
    /// Short name used in logs (`dto`, `client`, ...).
    fn name(&self) -> &'static str;

    /// Produce (or, under dry-run, plan) the files for `op`.
    fn generate(
        &mut self,
        ctx: &GenerationContext<'_>,
        op: &Operation,
    ) -> EngineResult<Vec<WrittenFile>>;
}
