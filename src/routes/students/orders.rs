use anyhow::Context;
use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use chrono::Utc;
use diesel::{ExpressionMethods, QueryDsl, SelectableHelper};
use diesel_async::{AsyncConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;

use crate::{
    app_error::{AppError, DieselError, StdResponse},
    app_state::AppState,
    middleware,
    models::{
        CreateOrderEntity, CreateOrderItemEntity, FoodEntity, OrderEntity, OrderItemEntity,
    },
    routes::students::student_profile,
    schema::{foods, order_items, orders},
    workflow::{self, Status},
};

/// Defines student-facing order routes with OpenAPI specs.
pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    utoipa_axum::router::OpenApiRouter::new().nest(
        "/students/orders",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(get_my_orders))
            .routes(utoipa_axum::routes!(place_order))
            .routes(utoipa_axum::routes!(get_order))
            .route_layer(axum::middleware::from_fn(
                middleware::students_authorization,
            )),
    )
}

#[derive(Deserialize, ToSchema)]
struct PlaceOrderReqItem {
    food_id: i32,
    quantity: i32,
}

#[derive(Deserialize, ToSchema)]
struct PlaceOrderReq {
    items: Vec<PlaceOrderReqItem>,
    /// Requested delivery time, e.g. "Aug 23 2026 18:30:00".
    delivery_time: String,
}

#[derive(Serialize, ToSchema)]
struct GetOrderRes {
    pub order: OrderEntity,
    pub order_items: Vec<OrderItemEntity>,
}

/// Place a new order for the authenticated student. All writes, including the
/// per-food stock decrements, commit or roll back together.
#[utoipa::path(
    post,
    path = "/",
    tags = ["Orders"],
    security(("bearerAuth" = [])),
    request_body = PlaceOrderReq,
    responses(
        (status = 200, description = "Placed order successfully", body = StdResponse<GetOrderRes, String>)
    )
)]
async fn place_order(
    State(state): State<AppState>,
    Extension(user_id): Extension<i32>,
    Json(body): Json<PlaceOrderReq>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    if body.items.is_empty() {
        return Err(AppError::BadRequest(
            "Order must contain at least one item".into(),
        ));
    }
    if body.items.iter().any(|item| item.quantity < 1) {
        return Err(AppError::BadRequest("Item quantity must be positive".into()));
    }

    let delivery_time = workflow::parse_delivery_time(&body.delivery_time)
        .ok_or_else(|| AppError::Validation("Invalid delivery time format".into()))?;

    let student = student_profile(conn, user_id).await?;

    let (order, created_items) = conn
        .transaction(move |conn| {
            Box::pin(async move {
                // The count is read inside the transaction so concurrent
                // placements are serialized by the unique order_id insert.
                let order_count: i64 = orders::table
                    .count()
                    .get_result(conn)
                    .await
                    .context("Failed to count orders")?;
                let uid = workflow::order_uid(Utc::now().date_naive(), order_count + 1);

                let order: OrderEntity = diesel::insert_into(orders::table)
                    .values(CreateOrderEntity {
                        order_id: uid,
                        student_id: student.id,
                        status: Status::Placed.to_string(),
                        created_by: user_id,
                        modified_by: user_id,
                    })
                    .returning(OrderEntity::as_returning())
                    .get_result(conn)
                    .await
                    .context("Failed to create order")?;

                let mut created_items = Vec::with_capacity(body.items.len());

                for item in &body.items {
                    let food: FoodEntity = foods::table
                        .find(item.food_id)
                        .select(FoodEntity::as_select())
                        .get_result(conn)
                        .await
                        .map_err(|err| match err {
                            DieselError::NotFound => AppError::NotFound("Food not found".into()),
                            _ => AppError::Other(err.into()),
                        })?;

                    // Conditional decrement: losing a concurrent race on the
                    // last portions surfaces as an ordinary stock failure.
                    let decremented = diesel::update(
                        foods::table
                            .find(food.id)
                            .filter(foods::quantity.ge(item.quantity)),
                    )
                    .set(foods::quantity.eq(foods::quantity - item.quantity))
                    .execute(conn)
                    .await
                    .context("Failed to decrement food stock")?;

                    if decremented == 0 {
                        return Err(AppError::Validation(format!(
                            "No enough Quantity for {}",
                            food.name
                        )));
                    }

                    let price = workflow::line_price(food.price, item.quantity);
                    let order_item: OrderItemEntity = diesel::insert_into(order_items::table)
                        .values(CreateOrderItemEntity {
                            order_id: order.id,
                            food_id: food.id,
                            quantity: item.quantity,
                            price,
                            created_by: user_id,
                            modified_by: user_id,
                        })
                        .returning(OrderItemEntity::as_returning())
                        .get_result(conn)
                        .await
                        .context("Failed to create order item")?;

                    created_items.push(order_item);
                }

                let lines: Vec<(f32, i32)> = created_items
                    .iter()
                    .map(|item| (item.price, item.quantity))
                    .collect();
                let (total_price, total_quantity) = workflow::order_totals(&lines);

                let order: OrderEntity = diesel::update(orders::table.find(order.id))
                    .set((
                        orders::total_price.eq(total_price),
                        orders::total_quantity.eq(total_quantity),
                        orders::delivery_time.eq(delivery_time),
                    ))
                    .returning(OrderEntity::as_returning())
                    .get_result(conn)
                    .await
                    .context("Failed to update order totals")?;

                Ok::<(OrderEntity, Vec<OrderItemEntity>), AppError>((order, created_items))
            })
        })
        .await?;

    tracing::info!(
        order_id = %order.order_id,
        total_price = order.total_price,
        total_quantity = order.total_quantity,
        "Order placed"
    );

    Ok(StdResponse {
        data: Some(GetOrderRes {
            order,
            order_items: created_items,
        }),
        message: Some("Placed order successfully"),
    })
}

/// Fetch all active orders belonging to the authenticated student.
#[utoipa::path(
    get,
    path = "/",
    tags = ["Orders"],
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "List my orders", body = StdResponse<Vec<OrderEntity>, String>)
    )
)]
async fn get_my_orders(
    State(state): State<AppState>,
    Extension(user_id): Extension<i32>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let student = student_profile(conn, user_id).await?;

    let my_orders: Vec<OrderEntity> = orders::table
        .filter(orders::student_id.eq(student.id))
        .filter(orders::is_active.eq(true))
        .order_by(orders::created_at.desc())
        .select(OrderEntity::as_select())
        .get_results(conn)
        .await
        .context("Failed to get my orders")?;

    Ok(StdResponse {
        data: Some(my_orders),
        message: Some("Get orders successfully"),
    })
}

/// Fetch a specific order belonging to the authenticated student. Orders of
/// other students are reported as missing rather than forbidden, so order ids
/// cannot be probed for existence.
#[utoipa::path(
    get,
    path = "/{order_id}",
    tags = ["Orders"],
    security(("bearerAuth" = [])),
    params(
        ("order_id" = String, Path, description = "Order identifier to fetch")
    ),
    responses(
        (status = 200, description = "Get order successfully", body = StdResponse<GetOrderRes, String>)
    )
)]
async fn get_order(
    Path(order_id): Path<String>,
    State(state): State<AppState>,
    Extension(user_id): Extension<i32>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let student = student_profile(conn, user_id).await?;

    let order: OrderEntity = orders::table
        .filter(orders::order_id.eq(&order_id))
        .filter(orders::student_id.eq(student.id))
        .select(OrderEntity::as_select())
        .first(conn)
        .await
        .map_err(|err| match err {
            DieselError::NotFound => AppError::NotFound("Order not found".into()),
            _ => AppError::Other(err.into()),
        })?;

    let items: Vec<OrderItemEntity> = order_items::table
        .filter(order_items::order_id.eq(order.id))
        .select(OrderItemEntity::as_select())
        .get_results(conn)
        .await
        .context("Failed to get order items")?;

    Ok(StdResponse {
        data: Some(GetOrderRes {
            order,
            order_items: items,
        }),
        message: Some("Get order successfully"),
    })
}
