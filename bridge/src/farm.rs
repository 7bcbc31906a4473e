//! In-memory farm holding the backend, pool, rule and virtual host collections.
//! It follows the events channel so the resolver sees the latest topology.

use crate::metrics_defs::FARM_ENTITIES;
use crate::model::{Action, Entity, EntityChangeEvent, EntityType};
use crate::queue::{Inbound, QueueListener};
use crate::topology::TopologyStore;
use indexmap::IndexMap;
use parking_lot::RwLock;
use shared::gauge;
use std::collections::HashMap;

/// Entities are unique per (id, parent id): the same backend may sit in several pools.
type EntityKey = (String, Option<String>);

#[derive(Default)]
pub struct Farm {
    collections: RwLock<HashMap<EntityType, IndexMap<EntityKey, Entity>>>,
}

impl Farm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts the entity or replaces the stored one in place.
    pub fn upsert(&self, entity: Entity) {
        if entity.entity_type == EntityType::Other {
            return;
        }
        let key = (entity.id.clone(), entity.parent_id.clone());
        let mut collections = self.collections.write();
        collections
            .entry(entity.entity_type)
            .or_default()
            .insert(key, entity);
        gauge!(FARM_ENTITIES).set(total(&collections) as f64);
    }

    pub fn remove(&self, entity: &Entity) -> bool {
        let key = (entity.id.clone(), entity.parent_id.clone());
        let mut collections = self.collections.write();
        let removed = collections
            .get_mut(&entity.entity_type)
            .and_then(|collection| collection.shift_remove(&key))
            .is_some();
        gauge!(FARM_ENTITIES).set(total(&collections) as f64);
        removed
    }

    pub fn apply(&self, event: &EntityChangeEvent) {
        match event.action {
            Action::Create | Action::Change => self.upsert(event.entity.clone()),
            Action::Remove => {
                if !self.remove(&event.entity) {
                    tracing::debug!(
                        entity_type = event.entity.entity_type.as_str(),
                        id = %event.entity.id,
                        "removed entity was not in the farm"
                    );
                }
            }
            Action::Unknown => {}
        }
    }

    pub fn len(&self) -> usize {
        total(&self.collections.read())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn total(collections: &HashMap<EntityType, IndexMap<EntityKey, Entity>>) -> usize {
    collections.values().map(IndexMap::len).sum()
}

impl TopologyStore for Farm {
    fn get_by_id(&self, entity_type: EntityType, id: &str) -> Option<Entity> {
        self.collections
            .read()
            .get(&entity_type)?
            .values()
            .find(|entity| entity.id == id)
            .cloned()
    }

    fn get(&self, entity_type: EntityType, id: &str, parent_id: Option<&str>) -> Option<Entity> {
        let key = (id.to_owned(), parent_id.map(str::to_owned));
        self.collections
            .read()
            .get(&entity_type)?
            .get(&key)
            .cloned()
    }

    fn get_all(&self, entity_type: EntityType) -> Vec<Entity> {
        self.collections
            .read()
            .get(&entity_type)
            .map(|collection| collection.values().cloned().collect())
            .unwrap_or_default()
    }
}

impl QueueListener for Farm {
    fn name(&self) -> &'static str {
        "farm"
    }

    fn on_message(&self, message: &Inbound) {
        if let Inbound::Change(event) = message {
            self.apply(event);
        }
    }
}
