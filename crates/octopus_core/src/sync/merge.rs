//! Pure merge-by-id reconciliation.

use crate::model::entity::Entity;
use std::collections::HashSet;

/// Returns `remote ∪ { e ∈ local : e.id ∉ ids(remote) }`.
///
/// Remote order is kept, followed by local-only entities in cache order.
/// Within each side the first occurrence of an id wins, so the output never
/// holds two entities with the same id.
pub fn merge_by_id<E: Entity>(remote: Vec<E>, local: Vec<E>) -> Vec<E> {
    let mut seen: HashSet<E::Id> = HashSet::with_capacity(remote.len() + local.len());
    let mut merged = Vec::with_capacity(remote.len() + local.len());

    for entity in remote.into_iter().chain(local) {
        if seen.insert(entity.id().clone()) {
            merged.push(entity);
        }
    }
    merged
}
