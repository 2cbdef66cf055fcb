use axum::{
    extract::Request,
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use crate::{
    app_error::AppError,
    auth::{self, Claims, UserRole},
};

pub const NOT_STUDENT_MSG: &str = "User is not a student";
pub const NOT_CANTEEN_MANAGER_MSG: &str = "User is not a canteen manager";
pub const NOT_DELIVERY_AGENT_MSG: &str = "User is not a delivery agent";

fn claims_from_request(req: &Request) -> Result<Claims, AppError> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing authorization header".into()))?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Unauthorized("Invalid authorization header".into()))?;

    auth::decode_token(token).map_err(|_| AppError::Unauthorized("Invalid token".into()))
}

async fn role_authorization(
    mut req: Request,
    next: Next,
    role: UserRole,
    wrong_role_msg: &str,
) -> Result<Response, AppError> {
    let claims = claims_from_request(&req)?;
    if claims.role != role {
        return Err(AppError::Forbidden(wrong_role_msg.into()));
    }
    // Handlers pick the user id up as an `Extension<i32>`.
    req.extensions_mut().insert(claims.sub);
    Ok(next.run(req).await)
}

pub async fn students_authorization(req: Request, next: Next) -> Result<Response, AppError> {
    role_authorization(req, next, UserRole::Student, NOT_STUDENT_MSG).await
}

pub async fn managers_authorization(req: Request, next: Next) -> Result<Response, AppError> {
    role_authorization(req, next, UserRole::Manager, NOT_CANTEEN_MANAGER_MSG).await
}

pub async fn agents_authorization(req: Request, next: Next) -> Result<Response, AppError> {
    role_authorization(req, next, UserRole::Delivery, NOT_DELIVERY_AGENT_MSG).await
}
