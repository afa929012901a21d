//! Route table for the exporter's HTTP surface.

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use prometheus::Registry;
use tower_http::trace::TraceLayer;

use super::handlers;

pub fn create_router(registry: Arc<Registry>) -> Router {
    Router::new()
        .route("/metrics", get(handlers::metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::MetricCatalog;
    use crate::core::collector::SystemdCollector;
    use crate::core::systemd::{ManagerError, PropertyValue, UnitInfo, UnitManager};

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    struct StubManager;

    impl UnitManager for StubManager {
        fn list_units(&self) -> Result<Vec<UnitInfo>, ManagerError> {
            Ok(vec![UnitInfo {
                name: "nginx.service".to_string(),
            }])
        }

        fn get_typed_property(
            &self,
            _unit_name: &str,
            _unit_type: &str,
            property: &str,
        ) -> Result<PropertyValue, ManagerError> {
            Ok(match property {
                "CPUUsageNSec" => PropertyValue::Uint64(500_000),
                "TasksCurrent" => PropertyValue::Uint64(7),
                _ => PropertyValue::Other,
            })
        }
    }

    #[tokio::test]
    async fn metrics_endpoint_renders_exposition_text() {
        let registry = Registry::new();
        let collector = SystemdCollector::new(StubManager, MetricCatalog::new().unwrap());
        registry.register(Box::new(collector)).unwrap();

        let app = create_router(Arc::new(registry));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/metrics")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains(
            "systemd_service_cpu_usage_nanoseconds_total{unit=\"nginx.service\"} 500000"
        ));
        assert!(text.contains("systemd_service_tasks_current{unit=\"nginx.service\"} 7"));
    }

    #[tokio::test]
    async fn unknown_paths_are_not_served() {
        let registry = Registry::new();
        let app = create_router(Arc::new(registry));

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
