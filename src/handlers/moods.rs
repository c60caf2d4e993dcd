use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::WithRejection;
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};
use crate::export::{csv_stream, CSV_CONTENT_TYPE, CSV_DISPOSITION};
use crate::models::mood::{
    ListMoodsQuery, MoodListResponse, UpsertMoodRequest, UpsertMoodResponse,
};
use crate::store::{self, ListQuery};
use crate::validation;
use crate::AppState;

pub async fn upsert_mood(
    State(state): State<AppState>,
    WithRejection(Json(body), _): WithRejection<Json<UpsertMoodRequest>, AppError>,
) -> AppResult<Json<UpsertMoodResponse>> {
    let entry = validation::normalize(body)?;
    let outcome = state.store.upsert(&entry).await?;

    tracing::info!(
        entry_id = %outcome.entry.id,
        date = %outcome.entry.date,
        mood = %outcome.entry.mood,
        created = outcome.created,
        "Mood entry saved"
    );

    Ok(Json(UpsertMoodResponse::from(&outcome)))
}

pub async fn list_moods(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<ListMoodsQuery>, AppError>,
) -> AppResult<Json<MoodListResponse>> {
    let query = ListQuery::new(
        query.start,
        query.end,
        query.limit,
        state.config.max_list_limit,
    );
    let items = state.store.list(&query).await?;

    Ok(Json(MoodListResponse { items }))
}

pub async fn export_moods(State(state): State<AppState>) -> AppResult<Response> {
    let entries = store::export_all(state.store.clone()).await?;
    let body = Body::from_stream(csv_stream(entries));

    Ok((
        [
            (header::CONTENT_TYPE, CSV_CONTENT_TYPE),
            (header::CONTENT_DISPOSITION, CSV_DISPOSITION),
        ],
        body,
    )
        .into_response())
}

pub async fn delete_mood(
    State(state): State<AppState>,
    WithRejection(Path(entry_id), _): WithRejection<Path<String>, AppError>,
) -> AppResult<Json<Value>> {
    if !state.store.delete(&entry_id).await? {
        return Err(AppError::NotFound("Not found".into()));
    }

    tracing::info!(entry_id = %entry_id, "Mood entry deleted");
    Ok(Json(json!({ "status": "deleted" })))
}
