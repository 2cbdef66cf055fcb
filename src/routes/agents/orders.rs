use anyhow::Context;
use axum::{
    Extension,
    extract::{Path, State},
    response::IntoResponse,
};
use diesel::{BoolExpressionMethods, ExpressionMethods, QueryDsl, SelectableHelper};
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use utoipa_axum::router::OpenApiRouter;

use crate::{
    app_error::{AppError, DieselError, StdResponse},
    app_state::AppState,
    middleware,
    models::OrderEntity,
    routes::agents::agent_profile,
    schema::orders,
    workflow::{self, Status},
};

/// Defines delivery-agent-facing order routes with OpenAPI specs. Pickup and
/// delivery are separate endpoints matching the two actions in the agent app.
pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    utoipa_axum::router::OpenApiRouter::new().nest(
        "/agents/orders",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(get_orders))
            .routes(utoipa_axum::routes!(pick_order))
            .routes(utoipa_axum::routes!(deliver_order))
            .route_layer(axum::middleware::from_fn(middleware::agents_authorization)),
    )
}

/// Fetch the orders visible to the authenticated agent: everything ready to
/// claim plus everything this agent has already claimed or delivered.
#[utoipa::path(
    get,
    path = "/",
    tags = ["Orders"],
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "List orders available to or owned by this agent", body = StdResponse<Vec<OrderEntity>, String>)
    )
)]
async fn get_orders(
    State(state): State<AppState>,
    Extension(user_id): Extension<i32>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let agent = agent_profile(conn, user_id).await?;

    let agent_orders: Vec<OrderEntity> = orders::table
        .filter(orders::is_active.eq(true))
        .filter(orders::status.eq_any([
            Status::Ready.as_str(),
            Status::Picked.as_str(),
            Status::Delivered.as_str(),
        ]))
        .filter(
            orders::delivery_agent_id
                .eq(agent.id)
                .or(orders::delivery_agent_id.is_null()),
        )
        .order_by(orders::created_at.desc())
        .select(OrderEntity::as_select())
        .get_results(conn)
        .await
        .context("Failed to get orders for agent")?;

    Ok(StdResponse {
        data: Some(agent_orders),
        message: Some("Get orders successfully"),
    })
}

/// Claim a READY order for pickup.
#[utoipa::path(
    post,
    path = "/{order_id}/status/picked",
    tags = ["Orders"],
    security(("bearerAuth" = [])),
    params(
        ("order_id" = String, Path, description = "Order identifier to pick up")
    ),
    responses(
        (status = 200, description = "Picked up order successfully", body = StdResponse<OrderEntity, String>)
    )
)]
async fn pick_order(
    Path(order_id): Path<String>,
    State(state): State<AppState>,
    Extension(user_id): Extension<i32>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let updated = change_order_status(conn, user_id, &order_id, Status::Picked).await?;

    Ok(StdResponse {
        data: Some(updated),
        message: Some("Picked up order successfully"),
    })
}

/// Complete delivery of an order previously picked up by this agent.
#[utoipa::path(
    post,
    path = "/{order_id}/status/delivered",
    tags = ["Orders"],
    security(("bearerAuth" = [])),
    params(
        ("order_id" = String, Path, description = "Order identifier to mark delivered")
    ),
    responses(
        (status = 200, description = "Delivered order successfully", body = StdResponse<OrderEntity, String>)
    )
)]
async fn deliver_order(
    Path(order_id): Path<String>,
    State(state): State<AppState>,
    Extension(user_id): Extension<i32>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let updated = change_order_status(conn, user_id, &order_id, Status::Delivered).await?;

    Ok(StdResponse {
        data: Some(updated),
        message: Some("Delivered order successfully"),
    })
}

/// Agent-initiated transitions. Pickup assigns the acting agent to the order;
/// from then on only that agent may complete the delivery.
async fn change_order_status(
    conn: &mut AsyncPgConnection,
    user_id: i32,
    order_id: &str,
    target: Status,
) -> Result<OrderEntity, AppError> {
    // Both routes hard-code a valid target; this guard only fires for
    // direct callers asking for a non-agent status.
    if !matches!(target, Status::Picked | Status::Delivered) {
        return Err(AppError::Validation("Invalid Status".into()));
    }

    let agent = agent_profile(conn, user_id).await?;

    let order: OrderEntity = orders::table
        .filter(orders::order_id.eq(order_id))
        .filter(orders::is_active.eq(true))
        .select(OrderEntity::as_select())
        .first(conn)
        .await
        .map_err(|err| match err {
            DieselError::NotFound => AppError::NotFound("Order not found".into()),
            _ => AppError::Other(err.into()),
        })?;

    let current = Status::parse(&order.status).context("Unknown status stored on order")?;

    if !workflow::agent_transition_allowed(current, target, order.delivery_agent_id, agent.id) {
        return Err(AppError::Validation("Something went wrong!".into()));
    }

    // The status filters on the UPDATEs make a lost race against another
    // agent fail instead of double-claiming the order.
    let updated = match target {
        Status::Picked => {
            diesel::update(
                orders::table
                    .find(order.id)
                    .filter(orders::status.eq(Status::Ready.as_str())),
            )
            .set((
                orders::status.eq(Status::Picked.as_str()),
                orders::delivery_agent_id.eq(agent.id),
                orders::modified_by.eq(user_id),
            ))
            .returning(OrderEntity::as_returning())
            .get_result(conn)
            .await
        }
        Status::Delivered => {
            diesel::update(
                orders::table
                    .find(order.id)
                    .filter(orders::status.eq(Status::Picked.as_str()))
                    .filter(orders::delivery_agent_id.eq(agent.id)),
            )
            .set((
                orders::status.eq(Status::Delivered.as_str()),
                orders::delivered_time.eq(diesel::dsl::now),
                orders::modified_by.eq(user_id),
            ))
            .returning(OrderEntity::as_returning())
            .get_result(conn)
            .await
        }
        _ => return Err(AppError::Validation("Invalid Status".into())),
    };

    let updated = updated.map_err(|err| match err {
        DieselError::NotFound => AppError::Validation("Something went wrong!".into()),
        _ => AppError::Other(err.into()),
    })?;

    tracing::info!(
        order_id = %updated.order_id,
        agent_id = agent.id,
        to = %target,
        "Order status changed by agent"
    );

    Ok(updated)
}
