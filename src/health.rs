//! Health-check handlers.
//!
//! | Probe | Path | Question |
//! |---|---|---|
//! | **Liveness** | `/healthz` | Is the process alive? Failure → restart. |
//! | **Readiness** | `/readyz` | Can the object store be reached? Failure → pulled from the load balancer. |

use std::sync::Arc;

use http::StatusCode;
use tracing::warn;

use crate::assets::{AssetService, COMMON_PREFIX};
use crate::request::Request;
use crate::response::Response;
use crate::store::ListOptions;

/// Liveness probe. Always `200 {"status":"ok"}`; it touches nothing.
pub async fn liveness(_service: Arc<AssetService>, _req: Request) -> Response {
    Response::json(r#"{"status":"ok"}"#)
}

/// Readiness probe. Lists the common prefix as a store round-trip.
pub async fn readiness(service: Arc<AssetService>, _req: Request) -> Response {
    match service.store().list(ListOptions::prefix(COMMON_PREFIX)).await {
        Ok(_) => Response::json(r#"{"status":"ready"}"#),
        Err(e) => {
            warn!(error = %e, "object store not reachable");
            Response::builder()
                .status(StatusCode::SERVICE_UNAVAILABLE)
                .json(r#"{"status":"unavailable"}"#)
        }
    }
}
