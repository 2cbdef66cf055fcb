use anyhow::Context;
use axum::{extract::State, response::IntoResponse};
use diesel::{ExpressionMethods, QueryDsl, SelectableHelper};
use diesel_async::RunQueryDsl;
use utoipa_axum::router::OpenApiRouter;

use crate::{
    app_error::{AppError, StdResponse},
    app_state::AppState,
    middleware,
    models::FoodEntity,
    schema::foods,
};

/// Defines the student-facing food catalog routes with OpenAPI specs.
pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    utoipa_axum::router::OpenApiRouter::new().nest(
        "/students/foods",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(get_foods))
            .route_layer(axum::middleware::from_fn(
                middleware::students_authorization,
            )),
    )
}

/// Fetch the food catalog with current prices and available quantities.
#[utoipa::path(
    get,
    path = "/",
    tags = ["Foods"],
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "List foods", body = StdResponse<Vec<FoodEntity>, String>)
    )
)]
async fn get_foods(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let food_list: Vec<FoodEntity> = foods::table
        .filter(foods::is_active.eq(true))
        .order_by(foods::name.asc())
        .select(FoodEntity::as_select())
        .get_results(conn)
        .await
        .context("Failed to get foods")?;

    Ok(StdResponse {
        data: Some(food_list),
        message: Some("Get foods successfully"),
    })
}
