// src/web/auth_handlers.rs
use crate::{
    error::{AppError, AppResult},
    models::user::{LoginForm, RegistoForm},
    services::{session_service, user_service},
    state::AppState,
    templates::{LoginPage, RegistoPage},
};
use askama::Template;
use axum::{
    extract::{Form, Query, State},
    response::{Html, IntoResponse, Redirect},
};
use serde::Deserialize;
use tower_sessions::Session;

#[derive(Debug, Deserialize)]
pub struct LoginParams {
    pub error: Option<String>,
    pub info: Option<String>,
}

fn render_login(error: Option<String>, info: Option<String>) -> AppResult<Html<String>> {
    let template = LoginPage { error, info };
    match template.render() {
        Ok(html) => Ok(Html(html)),
        Err(e) => {
            tracing::error!("Falha ao renderizar template de login: {}", e);
            Err(AppError::InternalServerError)
        }
    }
}

// GET /login
pub async fn show_login_form(
    session: Session,
    Query(params): Query<LoginParams>,
) -> AppResult<impl IntoResponse> {
    // Já logado? Vai direto para o dashboard.
    if session.get::<String>("user_id").await.ok().flatten().is_some() {
        tracing::debug!("GET /login: utilizador já logado, redirecionando para /dashboard");
        return Ok(Redirect::to("/dashboard").into_response());
    }
    Ok(render_login(params.error, params.info)?.into_response())
}

// POST /login
pub async fn handle_login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> AppResult<impl IntoResponse> {
    tracing::info!("Tentativa de login para: {}", form.email);

    match user_service::autenticar(&state.db_pool, &form.email, &form.password).await {
        Ok(user) => {
            // Novo ID de sessão após autenticar
            session
                .cycle_id()
                .await
                .map_err(|e| AppError::SessionError(format!("Falha ao rodar ID: {}", e)))?;
            session
                .insert("user_id", &user.id)
                .await
                .map_err(|e| AppError::SessionError(format!("Falha ao inserir na sessão: {}", e)))?;

            tracing::info!("✅ Login bem-sucedido para: {} ({})", user.nome, user.email);
            Ok(Redirect::to("/dashboard").into_response())
        }
        Err(AppError::InvalidCredentials) => {
            tracing::warn!("Credenciais inválidas para: {}", form.email);
            Ok(render_login(Some("E-mail ou senha inválidos.".to_string()), None)?.into_response())
        }
        Err(AppError::ContaPendente) => {
            tracing::warn!("Login de conta pendente: {}", form.email);
            Ok(render_login(
                Some("A sua conta ainda não foi aprovada por um administrador.".to_string()),
                None,
            )?
            .into_response())
        }
        Err(AppError::ContaBloqueada) => {
            tracing::warn!("Login de conta bloqueada: {}", form.email);
            Ok(render_login(Some("A sua conta foi bloqueada.".to_string()), None)?.into_response())
        }
        Err(e) => {
            tracing::error!("Erro ao autenticar {}: {:?}", form.email, e);
            Err(e)
        }
    }
}

// GET /logout
pub async fn handle_logout(
    State(state): State<AppState>,
    session: Session,
) -> AppResult<Redirect> {
    let user_id: Option<String> = session.get("user_id").await.ok().flatten();

    // Remove também a linha de dispositivo desta sessão
    if let Some(session_id) = session.id() {
        if let Err(e) = session_service::apagar(&state.db_pool, &session_id.to_string()).await {
            tracing::warn!("Falha ao remover sessão de dispositivo no logout: {:?}", e);
        }
    }

    session
        .delete()
        .await
        .map_err(|e| AppError::SessionError(format!("Falha ao apagar sessão: {}", e)))?;

    if let Some(id) = user_id {
        tracing::info!("🚪 Utilizador '{}' desligado.", id);
    } else {
        tracing::info!("🚪 Sessão anónima desligada.");
    }

    Ok(Redirect::to("/login"))
}

// GET /registo
pub async fn show_registo_form() -> AppResult<impl IntoResponse> {
    let template = RegistoPage { error: None };
    match template.render() {
        Ok(html) => Ok(Html(html).into_response()),
        Err(e) => {
            tracing::error!("Falha ao renderizar template de registo: {}", e);
            Err(AppError::InternalServerError)
        }
    }
}

// POST /registo
pub async fn handle_registo(
    State(state): State<AppState>,
    Form(form): Form<RegistoForm>,
) -> AppResult<impl IntoResponse> {
    match user_service::registar(&state.db_pool, &form.nome, &form.email, &form.password).await {
        Ok(_) => {
            let info = urlencoding::encode(
                "Conta criada. Poderá entrar assim que um administrador a aprovar.",
            );
            Ok(Redirect::to(&format!("/login?info={}", info)).into_response())
        }
        Err(AppError::Validation(msg)) => {
            let template = RegistoPage { error: Some(msg) };
            match template.render() {
                Ok(html) => Ok(Html(html).into_response()),
                Err(e) => {
                    tracing::error!("Falha ao renderizar registo com erro: {}", e);
                    Err(AppError::InternalServerError)
                }
            }
        }
        Err(e) => {
            tracing::error!("Erro ao registar {}: {:?}", form.email, e);
            Err(e)
        }
    }
}
