pub mod orders;

use crate::app_error::AppError;
use crate::models::DeliveryAgentEntity;
use crate::schema::delivery_agents;
use diesel::{ExpressionMethods, QueryDsl, SelectableHelper};
use diesel_async::{AsyncPgConnection, RunQueryDsl};

/// Resolves the active DeliveryAgent profile joined to the authenticated user.
pub(crate) async fn agent_profile(
    conn: &mut AsyncPgConnection,
    user_id: i32,
) -> Result<DeliveryAgentEntity, AppError> {
    delivery_agents::table
        .filter(delivery_agents::user_id.eq(user_id))
        .filter(delivery_agents::is_active.eq(true))
        .select(DeliveryAgentEntity::as_select())
        .first(conn)
        .await
        .map_err(|err| match err {
            crate::app_error::DieselError::NotFound => {
                AppError::Forbidden("No delivery agent profile for this user".into())
            }
            _ => AppError::Other(err.into()),
        })
}
