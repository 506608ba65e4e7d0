// * Review & Persistence Boundary
// * Everything that happens after a parse: diffing against stored values,
// * folding reviewer selections into a saved record, and learning aliases.

pub mod apply;
pub mod community;
pub mod diff;

// * Re-exports for convenient access
pub use apply::{alias_observations, build_apply_payload, AliasObservation, ApplyPayload, SelectedValues};
pub use community::{
    AsyncResult, CommunityAliasClient, CommunityAliasStore, InMemoryAliasStore, JsonFileAliasStore,
    StoreError,
};
pub use diff::{diff_specs, summarize, DiffEntry, DiffStatus};

impl<S: CommunityAliasStore> CommunityAliasClient<S> {
    /// Records every observation; returns how many were stored
    pub async fn record_observations(&self, observations: &[AliasObservation]) -> usize {
        let mut stored = 0;
        for observation in observations {
            if self
                .record(&observation.source_key, &observation.spec_name, &observation.category)
                .await
            {
                stored += 1;
            }
        }
        stored
    }
}
