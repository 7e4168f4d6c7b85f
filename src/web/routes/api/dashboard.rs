use axum::{
    extract::{rejection::QueryRejection, Query, State},
    response::{IntoResponse, Response},
    Json,
};

use crate::{
    pipeline, stats,
    web::{
        types::{DashboardAction, DashboardQuery},
        Error, WebResult,
    },
    AppState,
};

/// `GET /api/dashboard?action=stats|test-pipeline`
#[tracing::instrument(name = "dashboard", skip(app_state))]
pub async fn dashboard(
    State(app_state): State<AppState>,
    query: Result<Query<DashboardQuery>, QueryRejection>,
) -> WebResult<Response> {
    // A query string that does not deserialize (e.g. a repeated `action`) is just an invalid action.
    let Ok(Query(query)) = query else {
        return Err(Error::InvalidAction);
    };
    let action = query.action.as_deref().ok_or(Error::InvalidAction)?;

    let resp = match DashboardAction::try_from(action)? {
        DashboardAction::Stats => {
            let stats = stats::collect(&app_state.provider_client).await?;
            Json(stats).into_response()
        }
        DashboardAction::TestPipeline => {
            let report = pipeline::run(&app_state.provider_client, &app_state.site_probe).await;
            Json(report).into_response()
        }
    };

    Ok(resp)
}
