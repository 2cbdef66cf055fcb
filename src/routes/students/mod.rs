pub mod foods;
pub mod orders;

use crate::app_error::AppError;
use crate::models::StudentEntity;
use crate::schema::students;
use diesel::{ExpressionMethods, QueryDsl, SelectableHelper};
use diesel_async::{AsyncPgConnection, RunQueryDsl};

/// Resolves the Student profile joined to the authenticated user.
pub(crate) async fn student_profile(
    conn: &mut AsyncPgConnection,
    user_id: i32,
) -> Result<StudentEntity, AppError> {
    students::table
        .filter(students::user_id.eq(user_id))
        .select(StudentEntity::as_select())
        .first(conn)
        .await
        .map_err(|err| match err {
            crate::app_error::DieselError::NotFound => {
                AppError::Forbidden("No student profile for this user".into())
            }
            _ => AppError::Other(err.into()),
        })
}
