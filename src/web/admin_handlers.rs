// src/web/admin_handlers.rs
//
// Painel de administração: aprovação/bloqueio de contas e resolução de
// reports de questões.
use crate::{
    error::{AppError, AppResult},
    models::{
        social::ResolverReportForm,
        user::{STATUS_BLOQUEADO, STATUS_PENDENTE},
    },
    services::{report_service, session_service, user_service},
    state::AppState,
    templates::{AdminReportsPage, AdminUsuariosPage, UsuarioAdminView},
};
use askama::Template;
use axum::{
    extract::{Form, Path, Query, State},
    response::{Html, IntoResponse, Redirect},
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct FeedbackParams {
    pub success: Option<String>,
    pub error: Option<String>,
}

fn render<T: Template>(template: T) -> AppResult<Html<String>> {
    match template.render() {
        Ok(html) => Ok(Html(html)),
        Err(e) => {
            tracing::error!("Falha ao renderizar template: {}", e);
            Err(AppError::InternalServerError)
        }
    }
}

// GET /admin/usuarios
pub async fn show_usuarios_page(
    State(state): State<AppState>,
    Query(params): Query<FeedbackParams>,
) -> AppResult<impl IntoResponse> {
    let users = user_service::find_all_users(&state.db_pool).await?;

    let mut usuarios = Vec::with_capacity(users.len());
    for user in users {
        let sessoes = session_service::listar_por_usuario(&state.db_pool, &user.id).await?;
        usuarios.push(UsuarioAdminView {
            pendente: user.status == STATUS_PENDENTE,
            bloqueado: user.status == STATUS_BLOQUEADO,
            id: user.id,
            nome: user.nome,
            email: user.email,
            role: user.role,
            status: user.status,
            registado_em: user.created_at,
            sessoes,
        });
    }

    let template = AdminUsuariosPage {
        usuarios,
        success_message: params.success,
        error_message: params.error,
    };
    Ok(render(template)?.into_response())
}

fn redirect_usuarios(resultado: AppResult<String>) -> Redirect {
    match resultado {
        Ok(msg) => Redirect::to(&format!(
            "/admin/usuarios?success={}",
            urlencoding::encode(&msg)
        )),
        Err(e) => {
            let msg = match &e {
                AppError::NotFound(what) => format!("{} não encontrado.", what),
                AppError::Validation(msg) => msg.clone(),
                _ => {
                    tracing::error!("Erro em operação de utilizadores: {:?}", e);
                    "Ocorreu um erro inesperado.".to_string()
                }
            };
            Redirect::to(&format!("/admin/usuarios?error={}", urlencoding::encode(&msg)))
        }
    }
}

// POST /admin/usuarios/{id}/aprovar
pub async fn handle_aprovar_usuario(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Redirect {
    let resultado = user_service::aprovar_usuario(&state.db_pool, &id)
        .await
        .map(|_| "Conta aprovada.".to_string());
    redirect_usuarios(resultado)
}

// POST /admin/usuarios/{id}/bloquear
pub async fn handle_bloquear_usuario(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Redirect {
    let resultado = user_service::bloquear_usuario(&state.db_pool, &id)
        .await
        .map(|_| "Conta bloqueada.".to_string());
    redirect_usuarios(resultado)
}

// GET /admin/reports
pub async fn show_reports_page(
    State(state): State<AppState>,
    Query(params): Query<FeedbackParams>,
) -> AppResult<impl IntoResponse> {
    let reports = report_service::find_abertos(&state.db_pool).await?;
    let template = AdminReportsPage {
        reports,
        success_message: params.success,
        error_message: params.error,
    };
    Ok(render(template)?.into_response())
}

// POST /admin/reports/{id}/resolver
pub async fn handle_resolver_report(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<ResolverReportForm>,
) -> Redirect {
    match report_service::resolver(&state.db_pool, &id, &form.resposta).await {
        Ok(()) => Redirect::to(&format!(
            "/admin/reports?success={}",
            urlencoding::encode("Report resolvido e aluno notificado.")
        )),
        Err(e) => {
            let msg = match &e {
                AppError::NotFound(what) => format!("{} não encontrado.", what),
                AppError::Validation(msg) => msg.clone(),
                _ => {
                    tracing::error!("Erro ao resolver report {}: {:?}", id, e);
                    "Ocorreu um erro inesperado.".to_string()
                }
            };
            Redirect::to(&format!("/admin/reports?error={}", urlencoding::encode(&msg)))
        }
    }
}
