// src/web/mw_admin.rs
use crate::{
    error::AppError,
    models::user::ROLE_ADMIN,
    services::user_service,
    state::AppState,
    web::mw_auth::UserId,
};
use axum::{
    extract::{Extension, Request, State},
    middleware::Next,
    response::Response,
};

/// Middleware que exige a role "admin". Deve correr *depois* do require_auth.
pub async fn require_admin(
    State(state): State<AppState>,
    Extension(user_id_ext): Extension<UserId>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user_id = user_id_ext.0;

    match user_service::check_user_role(&state.db_pool, &user_id, ROLE_ADMIN).await {
        Ok(true) => {
            tracing::debug!("Admin MW: acesso concedido para {}.", user_id);
            Ok(next.run(request).await)
        }
        Ok(false) => {
            tracing::warn!("Admin MW: acesso negado para {} (não é admin).", user_id);
            Err(AppError::Unauthorized)
        }
        Err(e) => {
            tracing::error!("Admin MW: erro ao verificar role de {}: {:?}", user_id, e);
            Err(e)
        }
    }
}
