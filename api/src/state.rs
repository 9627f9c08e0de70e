use std::sync::Arc;

use plant_advisor_core::measurement::MeasurementFields;

use crate::advisor::AdviceProvider;
use crate::store::DocumentStore;

/// Shared across requests. The store owns its lazily-opened connection;
/// nothing here is mutated after startup.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub advisor: Arc<dyn AdviceProvider>,
    pub fields: Arc<MeasurementFields>,
}
