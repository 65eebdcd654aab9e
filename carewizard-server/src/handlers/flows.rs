use axum::response::Json;
use carewizard_core::FlowKind;
use serde_json::{json, Value};

use super::{wizard_error, ApiError};

/// Step catalogs of every flow (GET /flows)
pub async fn list_flows() -> Result<Json<Value>, ApiError> {
    let mut flows = Vec::with_capacity(FlowKind::ALL.len());
    for kind in FlowKind::ALL {
        let catalog = kind.catalog().map_err(|e| wizard_error(&e))?;
        flows.push(json!({
            "flow": kind,
            "entity": kind.entity(),
            "supportsEdit": kind.supports_edit(),
            "precondition": kind.precondition(),
            "steps": catalog,
        }));
    }
    Ok(Json(json!({ "flows": flows })))
}
