use anyhow::{Context, Result};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post, put};
use axum::Router;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;

use zone_automation::{
    AppliedFields, GrowthCycleConfigPayload, Recipe, SystemType, ValidationReport, WaterFormState,
    ZoneAutomationForms,
};

use crate::state::{SharedState, Submission};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

pub enum ApiError {
    UnknownZone(String),
    Invalid(ValidationReport),
    /// The request body could not be read as the expected JSON.
    BadBody { status: StatusCode, message: String },
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(status = %rejection.status(), "rejected request body: {}", rejection.body_text());
        ApiError::BadBody {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::UnknownZone(zone_id) => (
                StatusCode::NOT_FOUND,
                Json(serde_json::json!({ "error": format!("unknown zone '{zone_id}'") })),
            )
                .into_response(),
            ApiError::Invalid(report) => (StatusCode::UNPROCESSABLE_ENTITY, Json(report)).into_response(),
            ApiError::BadBody { status, message } => {
                (status, Json(serde_json::json!({ "error": message }))).into_response()
            }
        }
    }
}

type ApiResult<T> = std::result::Result<Json<T>, ApiError>;

// ---------------------------------------------------------------------------
// Request / response bodies
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct SystemTypeRequest {
    system_type: SystemType,
}

#[derive(Serialize)]
struct RecipeApplied {
    forms: ZoneAutomationForms,
    applied: AppliedFields,
}

// ---------------------------------------------------------------------------
// Routes
// ---------------------------------------------------------------------------

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/api/status", get(api_status))
        .route("/api/zones/{zone_id}/forms", get(get_forms).put(put_forms))
        .route("/api/zones/{zone_id}/recipe", put(put_recipe))
        .route("/api/zones/{zone_id}/reset", post(reset))
        .route("/api/zones/{zone_id}/system-type", post(system_type))
        .route("/api/zones/{zone_id}/validation", get(validation))
        .route("/api/zones/{zone_id}/payload", post(payload))
        .with_state(state)
}

async fn api_status(State(state): State<SharedState>) -> impl IntoResponse {
    let st = state.read().await;
    Json(st.to_status())
}

async fn get_forms(
    State(state): State<SharedState>,
    Path(zone_id): Path<String>,
) -> ApiResult<ZoneAutomationForms> {
    let st = state.read().await;
    st.zones
        .get(&zone_id)
        .map(|s| Json(s.forms.clone()))
        .ok_or(ApiError::UnknownZone(zone_id))
}

async fn put_forms(
    State(state): State<SharedState>,
    Path(zone_id): Path<String>,
    body: Result<Json<ZoneAutomationForms>, JsonRejection>,
) -> ApiResult<ZoneAutomationForms> {
    let Json(forms) = body?;
    let mut st = state.write().await;
    st.replace_forms(&zone_id, forms.clone())
        .map(|()| Json(forms))
        .ok_or(ApiError::UnknownZone(zone_id))
}

async fn put_recipe(
    State(state): State<SharedState>,
    Path(zone_id): Path<String>,
    body: Result<Json<Recipe>, JsonRejection>,
) -> ApiResult<RecipeApplied> {
    let Json(recipe) = body?;
    let mut st = state.write().await;
    let applied = st
        .apply_recipe(&zone_id, recipe)
        .ok_or_else(|| ApiError::UnknownZone(zone_id.clone()))?;
    let forms = st.zones[&zone_id].forms.clone();
    Ok(Json(RecipeApplied { forms, applied }))
}

async fn reset(
    State(state): State<SharedState>,
    Path(zone_id): Path<String>,
) -> ApiResult<ZoneAutomationForms> {
    let mut st = state.write().await;
    st.reset(&zone_id).map(Json).ok_or(ApiError::UnknownZone(zone_id))
}

async fn system_type(
    State(state): State<SharedState>,
    Path(zone_id): Path<String>,
    body: Result<Json<SystemTypeRequest>, JsonRejection>,
) -> ApiResult<WaterFormState> {
    let Json(req) = body?;
    let mut st = state.write().await;
    st.switch_system(&zone_id, req.system_type)
        .map(Json)
        .ok_or(ApiError::UnknownZone(zone_id))
}

async fn validation(
    State(state): State<SharedState>,
    Path(zone_id): Path<String>,
) -> ApiResult<ValidationReport> {
    let mut st = state.write().await;
    st.validate(&zone_id).map(Json).ok_or(ApiError::UnknownZone(zone_id))
}

async fn payload(
    State(state): State<SharedState>,
    Path(zone_id): Path<String>,
) -> ApiResult<GrowthCycleConfigPayload> {
    let mut st = state.write().await;
    match st.submit(&zone_id) {
        Some(Submission::Ready(p)) => Ok(Json(p)),
        Some(Submission::Rejected(report)) => Err(ApiError::Invalid(report)),
        None => Err(ApiError::UnknownZone(zone_id)),
    }
}

// ---------------------------------------------------------------------------
// Server entry-point
// ---------------------------------------------------------------------------

pub async fn serve(state: SharedState, port: u16) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind web port {port}"))?;

    tracing::info!(%addr, "zone automation api listening");

    axum::serve(listener, router(state))
        .await
        .context("web server error")
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::HubState;
    use axum::body::Body;
    use axum::http::{header, Method, Request};
    use http_body_util::BodyExt;
    use std::sync::Arc;
    use tokio::sync::RwLock;
    use tower::ServiceExt;

    fn test_state() -> SharedState {
        let mut st = HubState::new();
        let recipe = Recipe::from_json(r#"{"climate":{"day_temp":24},"water":{"ph":5.9}}"#).unwrap();
        st.open_zone("z1", "Zone 1", recipe);
        Arc::new(RwLock::new(st))
    }

    async fn send(
        state: &SharedState,
        method: Method,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        send_text(state, method, uri, body.map(|v| v.to_string())).await
    }

    async fn send_text(
        state: &SharedState,
        method: Method,
        uri: &str,
        body: Option<String>,
    ) -> (StatusCode, serde_json::Value) {
        let mut req = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(text) => {
                req = req.header(header::CONTENT_TYPE, "application/json");
                Body::from(text)
            }
            None => Body::empty(),
        };
        let res = router(Arc::clone(state))
            .oneshot(req.body(body).unwrap())
            .await
            .unwrap();
        let status = res.status();
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    // -- Status ------------------------------------------------------------

    #[tokio::test]
    async fn status_lists_zones() {
        let state = test_state();
        let (status, json) = send(&state, Method::GET, "/api/status", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["zones"][0]["zone_id"], "z1");
        assert_eq!(json["zones"][0]["system_type"], "drip");
        assert_eq!(json["events"][0]["kind"], "system");
    }

    // -- Forms -------------------------------------------------------------

    #[tokio::test]
    async fn get_forms_returns_seeded_forms() {
        let state = test_state();
        let (status, json) = send(&state, Method::GET, "/api/zones/z1/forms", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["climate"]["day_temp"], 24.0);
        assert_eq!(json["water"]["target_ph"], 5.9);
    }

    #[tokio::test]
    async fn unknown_zone_is_404() {
        let state = test_state();
        let (status, json) = send(&state, Method::GET, "/api/zones/zz/forms", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], "unknown zone 'zz'");
    }

    #[tokio::test]
    async fn put_forms_accepts_numeric_strings() {
        let state = test_state();
        let body = serde_json::json!({ "water": { "irrigation_batch_l": "35", "tanks_count": "2" } });
        let (status, json) = send(&state, Method::PUT, "/api/zones/z1/forms", Some(body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["water"]["irrigation_batch_l"], 35.0);
        assert_eq!(state.read().await.zones["z1"].forms.water.irrigation_batch_l, 35.0);
    }

    // -- Recipe / reset / layout -------------------------------------------

    #[tokio::test]
    async fn put_recipe_merges_and_reports_fields() {
        let state = test_state();
        let body = serde_json::json!({ "lighting": { "hours_on": 12 } });
        let (status, json) = send(&state, Method::PUT, "/api/zones/z1/recipe", Some(body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["forms"]["lighting"]["hours_on"], 12.0);
        assert_eq!(json["forms"]["climate"]["day_temp"], 24.0);
        assert_eq!(json["applied"], serde_json::json!([{ "form": "lighting", "field": "hours_on" }]));
    }

    #[tokio::test]
    async fn reset_discards_operator_edits() {
        let state = test_state();
        state.write().await.zones.get_mut("z1").unwrap().forms.climate.day_temp = 11.0;

        let (status, json) = send(&state, Method::POST, "/api/zones/z1/reset", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["climate"]["day_temp"], 24.0);
    }

    #[tokio::test]
    async fn system_type_switch_returns_water_form() {
        let state = test_state();
        let body = serde_json::json!({ "system_type": "nft" });
        let (status, json) = send(&state, Method::POST, "/api/zones/z1/system-type", Some(body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["system_type"], "nft");
        assert_eq!(json["tanks_count"], 1);
        assert_eq!(json["target_ph"], 5.9);
    }

    #[tokio::test]
    async fn unknown_system_type_is_rejected() {
        let state = test_state();
        let body = serde_json::json!({ "system_type": "aeroponics" });
        let (status, json) = send(&state, Method::POST, "/api/zones/z1/system-type", Some(body)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(json["error"].as_str().is_some_and(|e| e.contains("aeroponics")), "got {json}");
        assert_eq!(state.read().await.zones["z1"].forms.water.system_type, SystemType::Drip);
    }

    #[tokio::test]
    async fn malformed_json_body_is_400_with_json_error() {
        let state = test_state();
        for uri in ["/api/zones/z1/forms", "/api/zones/z1/recipe"] {
            let (status, json) =
                send_text(&state, Method::PUT, uri, Some(r#"{"water": "#.into())).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert!(json["error"].is_string(), "{uri}: {json}");
        }
    }

    #[tokio::test]
    async fn non_finite_form_value_is_422_with_json_error() {
        let state = test_state();
        let body = serde_json::json!({ "water": { "nutrient_tank_target_l": "inf" } });
        let (status, json) = send(&state, Method::PUT, "/api/zones/z1/forms", Some(body)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(json["error"].is_string(), "got {json}");
        assert!(state.read().await.zones["z1"].forms.water.nutrient_tank_target_l.is_finite());
    }

    // -- Validation / payload ----------------------------------------------

    #[tokio::test]
    async fn validation_reports_every_error() {
        let state = test_state();
        {
            let mut st = state.write().await;
            let forms = &mut st.zones.get_mut("z1").unwrap().forms;
            forms.climate.vent_min_percent = 80.0;
            forms.climate.vent_max_percent = 20.0;
            forms.lighting.hours_on = 26.0;
        }

        let (status, json) = send(&state, Method::GET, "/api/zones/z1/validation", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["valid"], false);
        assert_eq!(json["errors"].as_array().unwrap().len(), 2);
        assert_eq!(json["errors"][0]["field"], "vent_min_percent");
    }

    #[tokio::test]
    async fn payload_for_valid_forms() {
        let state = test_state();
        let (status, json) = send(&state, Method::POST, "/api/zones/z1/payload", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["climate"]["day_temp"], 24.0);
        assert!(json["water"]["refill_required_node_types"].is_array());
    }

    #[tokio::test]
    async fn payload_for_invalid_forms_is_422() {
        let state = test_state();
        {
            let mut st = state.write().await;
            let water = &mut st.zones.get_mut("z1").unwrap().forms.water;
            water.irrigation_batch_l = 500.0;
            water.nutrient_tank_target_l = 400.0;
        }

        let (status, json) = send(&state, Method::POST, "/api/zones/z1/payload", None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json["errors"][0]["form"], "water");
        assert_eq!(json["errors"][0]["field"], "irrigation_batch_l");
    }
}
