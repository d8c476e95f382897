use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use grantline_application::CommandReport;

use crate::dto::{CommandRequest, CommandResponse};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub async fn command_handler(
    State(state): State<AppState>,
    payload: Result<Json<CommandRequest>, JsonRejection>,
) -> ApiResult<Json<CommandResponse>> {
    let Json(request) = payload?;

    match state.command_service.interpret(request.prompt.as_str()).await {
        CommandReport::Success { message } => Ok(Json(CommandResponse { message })),
        CommandReport::Failure {
            error,
            status_category,
        } => Err(ApiError::new(error, status_category)),
    }
}
