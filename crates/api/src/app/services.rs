//! Service wiring: stores, pricing, geocoding, state machine, sync worker.

use std::sync::Arc;

use buildmart_orders::{
    InMemoryDeliveryStore, InMemoryOrderStore, InMemoryPaymentStore, OrderStateMachine,
    StatusHistoryLedger,
};
use buildmart_pricing::{
    DeliveryConfig, DeliveryPricingEngine, GeocodeProvider, GeocodingCache, Warehouse,
};
use buildmart_sync::{AccountingClient, LoggingNotifier, SyncOrchestrator};
use buildmart_core::{GeoPoint, WarehouseId};

pub struct AppServices {
    pub machine: OrderStateMachine,
    pub pricing: Arc<DeliveryPricingEngine>,
    pub geocoder: Arc<GeocodingCache>,
}

pub struct ServiceConfig {
    pub warehouses: Vec<Warehouse>,
    pub geocode_provider: Arc<dyn GeocodeProvider>,
    pub accounting: Arc<dyn AccountingClient>,
}

/// Wire the full service graph and spawn the background sync worker. Must
/// run inside a tokio runtime.
pub fn build_services(config: ServiceConfig) -> AppServices {
    let orders = Arc::new(InMemoryOrderStore::new());
    let deliveries = Arc::new(InMemoryDeliveryStore::new());
    let payments = Arc::new(InMemoryPaymentStore::new());
    let ledger = Arc::new(StatusHistoryLedger::new());

    let pricing = Arc::new(DeliveryPricingEngine::new(config.warehouses));
    let geocoder = Arc::new(GeocodingCache::new(config.geocode_provider));

    let orchestrator = Arc::new(SyncOrchestrator::new(
        orders.clone(),
        config.accounting,
        Arc::new(LoggingNotifier),
    ));
    let sync_handle = buildmart_sync::spawn(orchestrator);

    let machine = OrderStateMachine::new(
        orders,
        deliveries,
        payments,
        ledger,
        pricing.clone(),
        geocoder.clone(),
        Arc::new(sync_handle),
    );

    AppServices {
        machine,
        pricing,
        geocoder,
    }
}

/// Built-in warehouse catalog used when no external configuration is
/// supplied. Amounts are in paise.
pub fn default_warehouses() -> Vec<Warehouse> {
    vec![
        Warehouse {
            id: WarehouseId::new("WH-BOM-01"),
            name: "Bhiwandi".to_string(),
            location: GeoPoint::new(19.2813, 73.0483),
            served_categories: vec![
                "cement".to_string(),
                "steel".to_string(),
                "sand".to_string(),
            ],
            delivery: DeliveryConfig {
                base_charge: 5_000,
                per_km_charge: 1_000,
                free_delivery_radius_km: 2.0,
                free_delivery_threshold: 50_000_000,
                minimum_order_value: 0,
            },
        },
        Warehouse {
            id: WarehouseId::new("WH-DEL-01"),
            name: "Ghaziabad".to_string(),
            location: GeoPoint::new(28.6692, 77.4538),
            served_categories: vec!["cement".to_string(), "steel".to_string()],
            delivery: DeliveryConfig {
                base_charge: 6_000,
                per_km_charge: 1_200,
                free_delivery_radius_km: 3.0,
                free_delivery_threshold: 50_000_000,
                minimum_order_value: 0,
            },
        },
        Warehouse {
            id: WarehouseId::new("WH-MAA-01"),
            name: "Sriperumbudur".to_string(),
            location: GeoPoint::new(12.9682, 79.9493),
            served_categories: vec![
                "cement".to_string(),
                "bricks".to_string(),
                "sand".to_string(),
            ],
            delivery: DeliveryConfig {
                base_charge: 4_500,
                per_km_charge: 900,
                free_delivery_radius_km: 2.0,
                free_delivery_threshold: 40_000_000,
                minimum_order_value: 0,
            },
        },
    ]
}
