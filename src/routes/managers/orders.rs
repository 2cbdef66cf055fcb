use anyhow::Context;
use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use diesel::{ExpressionMethods, QueryDsl, SelectableHelper};
use diesel_async::RunQueryDsl;
use serde::Deserialize;
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;

use crate::{
    app_error::{AppError, DieselError, StdResponse},
    app_state::AppState,
    middleware,
    models::OrderEntity,
    schema::orders,
    workflow::{self, Status, StatusOption},
};

/// Defines manager-facing order routes with OpenAPI specs.
pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    utoipa_axum::router::OpenApiRouter::new().nest(
        "/managers/orders",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(get_orders))
            .routes(utoipa_axum::routes!(get_status_dropdown))
            .routes(utoipa_axum::routes!(get_order))
            .routes(utoipa_axum::routes!(change_order_status))
            .route_layer(axum::middleware::from_fn(
                middleware::managers_authorization,
            )),
    )
}

/// Fetch all active orders, regardless of status.
#[utoipa::path(
    get,
    path = "/",
    tags = ["Orders"],
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "List all active orders", body = StdResponse<Vec<OrderEntity>, String>)
    )
)]
async fn get_orders(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let all_orders: Vec<OrderEntity> = orders::table
        .filter(orders::is_active.eq(true))
        .order_by(orders::created_at.desc())
        .select(OrderEntity::as_select())
        .get_results(conn)
        .await
        .context("Failed to get orders")?;

    Ok(StdResponse {
        data: Some(all_orders),
        message: Some("Get orders successfully"),
    })
}

/// Fetch a specific active order.
#[utoipa::path(
    get,
    path = "/{order_id}",
    tags = ["Orders"],
    security(("bearerAuth" = [])),
    params(
        ("order_id" = String, Path, description = "Order identifier to fetch")
    ),
    responses(
        (status = 200, description = "Get order successfully", body = StdResponse<OrderEntity, String>)
    )
)]
async fn get_order(
    Path(order_id): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let order: OrderEntity = orders::table
        .filter(orders::order_id.eq(&order_id))
        .filter(orders::is_active.eq(true))
        .select(OrderEntity::as_select())
        .first(conn)
        .await
        .map_err(|err| match err {
            DieselError::NotFound => AppError::NotFound("Order not found".into()),
            _ => AppError::Other(err.into()),
        })?;

    Ok(StdResponse {
        data: Some(order),
        message: Some("Get order successfully"),
    })
}

/// Fetch the statuses a manager may set an order to, for the status dropdown.
#[utoipa::path(
    get,
    path = "/status-dropdown",
    tags = ["Orders"],
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "List manager-settable statuses", body = StdResponse<Vec<StatusOption>, String>)
    )
)]
async fn get_status_dropdown() -> Result<impl IntoResponse, AppError> {
    Ok(StdResponse {
        data: Some(workflow::manager_status_dropdown()),
        message: Some("Get status dropdown successfully"),
    })
}

#[derive(Deserialize, ToSchema)]
struct ChangeOrderStatusReq {
    /// Target status, e.g. "APPROVED".
    status: String,
    remarks: Option<String>,
}

/// Advance an order through the manager-driven stages, or reject it.
#[utoipa::path(
    patch,
    path = "/{order_id}/status",
    tags = ["Orders"],
    security(("bearerAuth" = [])),
    params(
        ("order_id" = String, Path, description = "Order identifier to update")
    ),
    request_body = ChangeOrderStatusReq,
    responses(
        (status = 200, description = "Changed order status successfully", body = StdResponse<OrderEntity, String>)
    )
)]
async fn change_order_status(
    Path(order_id): Path<String>,
    State(state): State<AppState>,
    Extension(user_id): Extension<i32>,
    Json(body): Json<ChangeOrderStatusReq>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let target =
        Status::parse(&body.status).ok_or_else(|| AppError::Validation("Invalid Status".into()))?;

    let order: OrderEntity = orders::table
        .filter(orders::order_id.eq(&order_id))
        .select(OrderEntity::as_select())
        .first(conn)
        .await
        .map_err(|err| match err {
            DieselError::NotFound => AppError::NotFound("Order not found".into()),
            _ => AppError::Other(err.into()),
        })?;

    let current = Status::parse(&order.status).context("Unknown status stored on order")?;

    if !workflow::manager_transition_allowed(current, target) {
        return Err(AppError::Validation("Something went wrong!!".into()));
    }

    // Filtering on the observed status makes a lost concurrent transition
    // fail instead of silently overwriting it.
    let updated: OrderEntity = diesel::update(
        orders::table
            .find(order.id)
            .filter(orders::status.eq(current.as_str())),
    )
    .set((
        orders::status.eq(target.as_str()),
        orders::remarks.eq(body.remarks),
        orders::modified_by.eq(user_id),
    ))
    .returning(OrderEntity::as_returning())
    .get_result(conn)
    .await
    .map_err(|err| match err {
        DieselError::NotFound => AppError::Validation("Something went wrong!!".into()),
        _ => AppError::Other(err.into()),
    })?;

    tracing::info!(
        order_id = %updated.order_id,
        from = %current,
        to = %target,
        "Order status changed by manager"
    );

    Ok(StdResponse {
        data: Some(updated),
        message: Some("Changed order status successfully"),
    })
}
