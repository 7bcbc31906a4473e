use crate::classifier::Emission;
use crate::farm::Farm;
use crate::forwarder::MetricSink;
use crate::model::{Entity, EntityType, PROP_TARGET_ID};
use crate::topology::VirtualHostResolver;
use parking_lot::Mutex;

/// Sink that keeps every call for later assertions.
#[derive(Default)]
pub struct RecordingSink {
    emissions: Mutex<Vec<Emission>>,
}

impl RecordingSink {
    pub fn emissions(&self) -> Vec<Emission> {
        self.emissions.lock().clone()
    }
}

impl MetricSink for RecordingSink {
    fn count(&self, name: &str, amount: i64) {
        self.emissions.lock().push(Emission::Counter {
            name: name.to_owned(),
            amount,
        });
    }

    fn timing(&self, name: &str, duration_ms: u64) {
        self.emissions.lock().push(Emission::Timing {
            name: name.to_owned(),
            duration_ms,
        });
    }

    fn gauge(&self, name: &str, value: f64) {
        self.emissions.lock().push(Emission::Gauge {
            name: name.to_owned(),
            value,
        });
    }
}

/// Resolves every backend to the same virtual host, or to none.
pub struct StaticResolver(pub Option<String>);

impl VirtualHostResolver for StaticResolver {
    fn resolve_virtual_host_id(&self, _backend_id: &str, _pool_id: Option<&str>) -> Option<String> {
        self.0.clone()
    }
}

/// vh1 -> rule1 -> pool1 <- backend http://10.0.0.1:8080
pub fn sample_farm() -> Farm {
    let farm = Farm::new();
    farm.upsert(Entity::new(EntityType::VirtualHost, "vh1", None));
    farm.upsert(Entity::new(EntityType::BackendPool, "pool1", None));
    farm.upsert(
        Entity::new(EntityType::Rule, "rule1", Some("vh1")).with_property(PROP_TARGET_ID, "pool1"),
    );
    farm.upsert(Entity::new(
        EntityType::Backend,
        "http://10.0.0.1:8080",
        Some("pool1"),
    ));
    farm
}
