//! Persisted per-entity artifacts.

use eventcar_primitives::EntityId;

use crate::ProviderError;

/// One persisted series per entity.
///
/// Presence of an artifact is what makes recomputation a no-op, so `write`
/// must never leave a partially written artifact visible to `exists`.
pub trait ArtifactStore<T> {
    /// Whether an artifact for `entity` is present.
    fn exists(&self, entity: EntityId) -> bool;

    /// Read the artifact for `entity`.
    ///
    /// # Errors
    /// Returns `ProviderError::NoData` if absent, or an IO/malformed error.
    fn read(&self, entity: EntityId) -> Result<Vec<T>, ProviderError>;

    /// Persist `rows` as the artifact for `entity`, replacing any previous one.
    ///
    /// # Errors
    /// Returns `ProviderError` if the artifact cannot be written.
    fn write(&self, entity: EntityId, rows: &[T]) -> Result<(), ProviderError>;
}
