// src/web/mw_auth.rs
use crate::error::AppError;
use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

/// Middleware que exige sessão autenticada. Sem login, redireciona para /login;
/// com login, põe o UserId nas extensões para os handlers seguintes.
pub async fn require_auth(
    session: Session,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    match session.get::<String>("user_id").await {
        Ok(Some(user_id)) => {
            tracing::debug!("Autenticação MW: utilizador '{}' autenticado.", user_id);
            request.extensions_mut().insert(UserId(user_id));
            Ok(next.run(request).await)
        }
        Ok(None) => {
            tracing::debug!("Autenticação MW: sem user_id na sessão, redirecionando para /login");
            Ok(Redirect::to("/login").into_response())
        }
        Err(e) => {
            tracing::error!("Autenticação MW: erro ao ler sessão: {:?}", e);
            Err(AppError::SessionError(format!("Erro ao verificar sessão: {}", e)))
        }
    }
}

/// user_id posto nas extensões da requisição pelo require_auth.
#[derive(Clone, Debug)]
pub struct UserId(pub String);
