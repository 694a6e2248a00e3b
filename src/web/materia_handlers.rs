// src/web/materia_handlers.rs
use crate::{
    error::{AppError, AppResult},
    models::{
        materia::{AssuntoForm, MateriaForm},
        user::ROLE_ADMIN,
    },
    services::{materia_service, user_service},
    state::AppState,
    templates::MateriasPage,
    web::mw_auth::UserId,
};
use askama::Template;
use axum::{
    extract::{Extension, Form, Path, Query, State},
    response::{Html, IntoResponse, Redirect},
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct FeedbackParams {
    pub success: Option<String>,
    pub error: Option<String>,
}

// GET /materias
pub async fn show_materias_page(
    State(state): State<AppState>,
    Extension(user_id_ext): Extension<UserId>,
    Query(params): Query<FeedbackParams>,
) -> AppResult<impl IntoResponse> {
    let is_admin =
        user_service::check_user_role(&state.db_pool, &user_id_ext.0, ROLE_ADMIN).await?;
    let materias = materia_service::find_materias_resumo(&state.db_pool).await?;
    let assuntos = materia_service::find_all_assuntos(&state.db_pool).await?;

    let template = MateriasPage {
        is_admin,
        materias,
        assuntos,
        success_message: params.success,
        error_message: params.error,
    };
    match template.render() {
        Ok(html) => Ok(Html(html).into_response()),
        Err(e) => {
            tracing::error!("Falha ao renderizar MateriasPage: {}", e);
            Err(AppError::InternalServerError)
        }
    }
}

fn redirect_feedback(resultado: AppResult<String>) -> Redirect {
    match resultado {
        Ok(msg) => {
            let msg = urlencoding::encode(&msg).to_string();
            Redirect::to(&format!("/materias?success={}", msg))
        }
        Err(e) => {
            let msg = urlencoding::encode(&feedback_erro(&e)).to_string();
            Redirect::to(&format!("/materias?error={}", msg))
        }
    }
}

fn feedback_erro(e: &AppError) -> String {
    match e {
        AppError::Validation(msg) => msg.clone(),
        AppError::NotFound(what) => format!("{} não encontrado.", what),
        _ => {
            tracing::error!("Erro em operação de matérias: {:?}", e);
            "Ocorreu um erro inesperado.".to_string()
        }
    }
}

// POST /admin/materias/criar
pub async fn handle_create_materia(
    State(state): State<AppState>,
    Form(form): Form<MateriaForm>,
) -> Redirect {
    let resultado = materia_service::create_materia(&state.db_pool, &form.nome, &form.descricao)
        .await
        .map(|_| format!("Matéria '{}' criada.", form.nome.trim()));
    redirect_feedback(resultado)
}

// POST /admin/materias/{id}/editar
pub async fn handle_edit_materia(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<MateriaForm>,
) -> Redirect {
    let resultado =
        materia_service::update_materia(&state.db_pool, &id, &form.nome, &form.descricao)
            .await
            .map(|_| "Matéria atualizada.".to_string());
    redirect_feedback(resultado)
}

// POST /admin/materias/{id}/apagar
pub async fn handle_delete_materia(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Redirect {
    let resultado = materia_service::delete_materia(&state.db_pool, &id)
        .await
        .map(|_| "Matéria apagada.".to_string());
    redirect_feedback(resultado)
}

// POST /admin/assuntos/criar
pub async fn handle_create_assunto(
    State(state): State<AppState>,
    Form(form): Form<AssuntoForm>,
) -> Redirect {
    let resultado =
        materia_service::create_assunto(&state.db_pool, &form.materia_id, &form.nome)
            .await
            .map(|_| format!("Assunto '{}' criado.", form.nome.trim()));
    redirect_feedback(resultado)
}

// POST /admin/assuntos/{id}/editar
pub async fn handle_edit_assunto(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<AssuntoForm>,
) -> Redirect {
    let resultado = materia_service::update_assunto(&state.db_pool, &id, &form.nome)
        .await
        .map(|_| "Assunto atualizado.".to_string());
    redirect_feedback(resultado)
}

// POST /admin/assuntos/{id}/apagar
pub async fn handle_delete_assunto(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Redirect {
    let resultado = materia_service::delete_assunto(&state.db_pool, &id)
        .await
        .map(|_| "Assunto apagado.".to_string());
    redirect_feedback(resultado)
}
