use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
};

use crate::AppState;
use crate::error::AppResult;
use crate::pipeline::FormattedContent;

pub async fn preview_format(
    State(state): State<AppState>,
    Path(format): Path<String>,
    body: Bytes,
) -> AppResult<Json<FormattedContent>> {
    let formatted = state.facade.preview_format(&format, &body)?;
    Ok(Json(formatted))
}
