// src/web/mw_device.rs
use crate::{
    error::AppError,
    services::session_service,
    state::AppState,
    web::mw_auth::UserId,
};
use axum::{
    extract::{Extension, Request, State},
    http::header::USER_AGENT,
    middleware::Next,
    response::Response,
};
use tower_sessions::Session;

/// Middleware que regista o dispositivo deste pedido em user_sessions.
/// Corre *depois* do require_auth. Uma falha aqui não bloqueia o pedido.
pub async fn track_device(
    State(state): State<AppState>,
    session: Session,
    Extension(user_id_ext): Extension<UserId>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if let Some(session_id) = session.id() {
        let user_agent = request
            .headers()
            .get(USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("desconhecido")
            .to_string();

        if let Err(e) = session_service::touch(
            &state.db_pool,
            &session_id.to_string(),
            &user_id_ext.0,
            &user_agent,
        )
        .await
        {
            tracing::warn!("Device MW: falha ao registar sessão de dispositivo: {:?}", e);
        }
    }

    Ok(next.run(request).await)
}
