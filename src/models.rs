use chrono::{DateTime, Utc};
use diesel::{
    Selectable,
    prelude::{Identifiable, Insertable, Queryable},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// Profiles

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, ToSchema)]
#[diesel(table_name = crate::schema::students)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct StudentEntity {
    pub id: i32,
    pub user_id: i32,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, ToSchema)]
#[diesel(table_name = crate::schema::delivery_agents)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DeliveryAgentEntity {
    pub id: i32,
    pub user_id: i32,
    pub name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Foods

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, ToSchema)]
#[diesel(table_name = crate::schema::foods)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct FoodEntity {
    pub id: i32,
    pub name: String,
    pub price: f32,
    pub quantity: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Orders

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, ToSchema)]
#[diesel(table_name = crate::schema::orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderEntity {
    pub id: i32,
    /// Human-readable identifier, e.g. ORDER20260823001.
    pub order_id: String,
    pub student_id: i32,
    pub status: String,
    pub total_price: f32,
    pub total_quantity: i32,
    pub delivery_time: Option<DateTime<Utc>>,
    pub delivered_time: Option<DateTime<Utc>>,
    pub remarks: Option<String>,
    pub delivery_agent_id: Option<i32>,
    pub is_active: bool,
    pub created_by: i32,
    pub modified_by: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CreateOrderEntity {
    pub order_id: String,
    pub student_id: i32,
    pub status: String,
    pub created_by: i32,
    pub modified_by: i32,
}

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, ToSchema)]
#[diesel(table_name = crate::schema::order_items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderItemEntity {
    pub id: i32,
    pub order_id: i32,
    pub food_id: i32,
    pub quantity: i32,
    /// Line price, frozen at `food.price * quantity` when the order is placed.
    pub price: f32,
    pub created_by: i32,
    pub modified_by: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Deserialize, Debug)]
#[diesel(table_name = crate::schema::order_items)]
pub struct CreateOrderItemEntity {
    pub order_id: i32,
    pub food_id: i32,
    pub quantity: i32,
    pub price: f32,
    pub created_by: i32,
    pub modified_by: i32,
}
