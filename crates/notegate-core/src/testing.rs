//! Shared unit-test doubles

use notegate_provenance::{Evidence, ProvenanceChain, ProvenanceQuery, ProvenanceSource};
use std::sync::Arc;

mockall::mock! {
    pub Source {}

    impl ProvenanceSource for Source {
        fn name(&self) -> &'static str;
        fn lookup(&self, query: &ProvenanceQuery) -> Evidence;
    }
}

/// Chain with one mocked source always answering `evidence`
pub(crate) fn fixed_chain(evidence: Evidence) -> ProvenanceChain {
    let mut source = MockSource::new();
    source.expect_name().return_const("fixed");
    source.expect_lookup().return_const(evidence);
    ProvenanceChain::new().with_source(Arc::new(source))
}
