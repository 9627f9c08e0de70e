use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;

use plant_advisor_core::advice::{StructuredAdvice, normalize, validate};
use plant_advisor_core::error::{ApiError, PipelineError};
use plant_advisor_core::measurement::{
    DocumentPath, Measurement, MeasurementFields, extract_measurement,
};
use plant_advisor_core::prompt::build_prompt;

use crate::advisor::AdviceProvider;
use crate::error::AppError;
use crate::extract::AppJson;
use crate::state::AppState;
use crate::store::DocumentStore;

pub fn router() -> Router<AppState> {
    Router::new().route("/plant-status", post(get_plant_status))
}

/// Request for POST /plant-status
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct PlantStatusRequest {
    /// Full path of the store document holding the humidity and temperature readings
    #[schema(example = "jardin/jardin/Maycol/Rositas")]
    pub document_path: String,
}

/// Get care advice for a plant
///
/// Reads the plant's humidity and temperature from the document store, asks
/// the AI provider for advice, and returns the validated recommendation.
#[utoipa::path(
    post,
    path = "/plant-status",
    request_body = PlantStatusRequest,
    responses(
        (status = 200, description = "Care advice", body = StructuredAdvice),
        (status = 400, description = "Empty or collection path, or missing/non-numeric readings", body = ApiError),
        (status = 404, description = "Document not found", body = ApiError),
        (status = 500, description = "AI reply malformed or upstream failure", body = ApiError)
    ),
    tag = "plants"
)]
pub async fn get_plant_status(
    State(state): State<AppState>,
    AppJson(req): AppJson<PlantStatusRequest>,
) -> Result<Json<StructuredAdvice>, AppError> {
    let path = DocumentPath::parse(&req.document_path)?;
    let advice = advise(
        state.store.as_ref(),
        state.advisor.as_ref(),
        &path,
        &state.fields,
    )
    .await?;
    Ok(Json(advice))
}

/// fetch → prompt → single AI call → normalize → validate.
pub async fn advise(
    store: &dyn DocumentStore,
    advisor: &dyn AdviceProvider,
    path: &DocumentPath,
    fields: &MeasurementFields,
) -> Result<StructuredAdvice, AppError> {
    let measurement = fetch_measurement(store, path, fields).await?;
    tracing::debug!(
        path = %path,
        humidity = measurement.humidity(),
        temperature = measurement.temperature(),
        "Fetched measurement"
    );

    let prompt = build_prompt(&measurement);
    let raw = advisor
        .send_prompt(&prompt)
        .await
        .map_err(|err| PipelineError::UpstreamFailure(err.to_string()))?;

    let advice = validate(&normalize(raw)?)?;
    tracing::debug!(
        path = %path,
        needs_watering = advice.needs_watering,
        needs_soil = advice.needs_soil,
        "Advice ready"
    );
    Ok(advice)
}

pub async fn fetch_measurement(
    store: &dyn DocumentStore,
    path: &DocumentPath,
    fields: &MeasurementFields,
) -> Result<Measurement, AppError> {
    let data = store
        .get_document(path)
        .await
        .map_err(|err| AppError::Internal(err.to_string()))?
        .ok_or_else(|| PipelineError::NotFound {
            path: path.to_string(),
        })?;

    Ok(extract_measurement(path, &data, fields)?)
}
