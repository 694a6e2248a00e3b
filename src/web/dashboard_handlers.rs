// src/web/dashboard_handlers.rs
use crate::{
    error::{AppError, AppResult},
    services::{estudo_service, notificacao_service, report_service, user_service},
    state::AppState,
    templates::DashboardPage,
    web::mw_auth::UserId,
};
use crate::templates::NotificacoesPage;
use askama::Template;
use axum::{
    extract::{Extension, Path, State},
    response::{Html, IntoResponse, Redirect},
};

// GET /dashboard
pub async fn dashboard_handler(
    State(state): State<AppState>,
    Extension(user_id_ext): Extension<UserId>,
) -> AppResult<impl IntoResponse> {
    let user_id = user_id_ext.0;

    let user = user_service::find_user_by_id(&state.db_pool, &user_id)
        .await?
        .ok_or_else(|| {
            tracing::error!("CRÍTICO: user_id '{}' autenticado não existe na DB!", user_id);
            AppError::InternalServerError
        })?;
    let is_admin = user.is_admin();
    let nao_lidas = notificacao_service::contar_nao_lidas(&state.db_pool, &user_id).await?;
    let reports_abertos = if is_admin {
        report_service::contar_abertos(&state.db_pool).await?
    } else {
        0
    };
    let tem_sessao = estudo_service::obter_progresso(&state.db_pool, &user_id)
        .await?
        .is_some();
    let stats = estudo_service::estatisticas(&state.db_pool, &user_id).await?;
    let historicos = estudo_service::find_historicos(&state.db_pool, &user_id).await?;

    let template = DashboardPage {
        user_nome: user.nome,
        is_admin,
        nao_lidas,
        reports_abertos,
        tem_sessao,
        stats,
        historicos,
    };

    match template.render() {
        Ok(html) => Ok(Html(html).into_response()),
        Err(e) => {
            tracing::error!("Falha ao renderizar DashboardPage: {}", e);
            Err(AppError::InternalServerError)
        }
    }
}

// GET /notificacoes
pub async fn notificacoes_handler(
    State(state): State<AppState>,
    Extension(user_id_ext): Extension<UserId>,
) -> AppResult<impl IntoResponse> {
    let user_id = user_id_ext.0;
    let notificacoes = notificacao_service::find_por_usuario(&state.db_pool, &user_id).await?;
    let nao_lidas = notificacao_service::contar_nao_lidas(&state.db_pool, &user_id).await?;

    let template = NotificacoesPage { notificacoes, nao_lidas };
    match template.render() {
        Ok(html) => Ok(Html(html).into_response()),
        Err(e) => {
            tracing::error!("Falha ao renderizar NotificacoesPage: {}", e);
            Err(AppError::InternalServerError)
        }
    }
}

// POST /notificacoes/{id}/ler
pub async fn handle_marcar_lida(
    State(state): State<AppState>,
    Extension(user_id_ext): Extension<UserId>,
    Path(id): Path<String>,
) -> AppResult<Redirect> {
    notificacao_service::marcar_lida(&state.db_pool, &id, &user_id_ext.0).await?;
    Ok(Redirect::to("/notificacoes"))
}
