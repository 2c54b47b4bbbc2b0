//! Generic entity envelope shared by the cache, remote client and synchronizer.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Display;
use std::hash::Hash;

/// A record that can be mirrored between the local cache and a remote collection.
///
/// Records with equal `id()` are the same logical record; when both sides
/// hold one, the remote copy wins.
pub trait Entity: Serialize + DeserializeOwned + Clone {
    /// Stable identifier type. `Display` must produce the remote key value.
    type Id: Eq + Hash + Clone + Display;

    /// Remote collection holding this kind.
    const COLLECTION: &'static str;
    /// Local cache key holding the serialized list of this kind.
    const CACHE_KEY: &'static str;

    fn id(&self) -> &Self::Id;
}
