//! Read-only view of the farm and the backend to virtual host resolution on top of it.

use crate::metrics_defs::TOPOLOGY_UNRESOLVED;
use crate::model::{Entity, EntityType, PROP_TARGET_ID};
use shared::counter;
use std::sync::Arc;

/// Read accessors over the farm's entity collections.
///
/// Implementations are mutated concurrently by their owner; callers get
/// whatever the collections hold at read time.
pub trait TopologyStore: Send + Sync {
    /// First entity of the collection with the given id.
    fn get_by_id(&self, entity_type: EntityType, id: &str) -> Option<Entity>;

    /// The entity stored under exactly this id and parent id.
    fn get(&self, entity_type: EntityType, id: &str, parent_id: Option<&str>) -> Option<Entity>;

    /// All entities of the collection, in iteration order.
    fn get_all(&self, entity_type: EntityType) -> Vec<Entity>;
}

/// Finds the virtual host a backend serves traffic for.
pub trait VirtualHostResolver: Send + Sync {
    /// Returns `None` if any link of the backend -> pool -> rule -> virtual host
    /// chain is missing.
    ///
    /// A backend can belong to several pools. With `pool_id` the backend stored
    /// under that pool is used, otherwise the first one stored with `backend_id`.
    fn resolve_virtual_host_id(&self, backend_id: &str, pool_id: Option<&str>) -> Option<String>;
}

/// Resolves by scanning the farm collections.
///
/// When several rules target the backend's pool, the first rule in collection
/// order decides the virtual host.
pub struct FarmResolver {
    store: Arc<dyn TopologyStore>,
}

impl FarmResolver {
    pub fn new(store: Arc<dyn TopologyStore>) -> Self {
        FarmResolver { store }
    }
}

impl VirtualHostResolver for FarmResolver {
    fn resolve_virtual_host_id(&self, backend_id: &str, pool_id: Option<&str>) -> Option<String> {
        let backend = match pool_id {
            Some(pool_id) => self.store.get(EntityType::Backend, backend_id, Some(pool_id)),
            None => self.store.get_by_id(EntityType::Backend, backend_id),
        };
        let Some(backend) = backend else {
            tracing::warn!(backend_id, pool_id, "backend not found");
            counter!(TOPOLOGY_UNRESOLVED, "missing" => "backend").increment(1);
            return None;
        };

        let pool = backend
            .parent_id
            .as_deref()
            .and_then(|pool_id| self.store.get_by_id(EntityType::BackendPool, pool_id));
        let Some(pool) = pool else {
            tracing::warn!(
                backend_id,
                pool_id = backend.parent_id.as_deref().unwrap_or_default(),
                "backend pool not found"
            );
            counter!(TOPOLOGY_UNRESOLVED, "missing" => "pool").increment(1);
            return None;
        };

        let virtual_host_id = self
            .store
            .get_all(EntityType::Rule)
            .into_iter()
            .filter(|rule| rule.property_str(PROP_TARGET_ID) == Some(pool.id.as_str()))
            .find_map(|rule| rule.parent_id);

        if virtual_host_id.is_none() {
            tracing::warn!(backend_id, pool_id = %pool.id, "no rule targets backend pool");
            counter!(TOPOLOGY_UNRESOLVED, "missing" => "rule").increment(1);
        }
        virtual_host_id
    }
}
