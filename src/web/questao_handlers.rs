// src/web/questao_handlers.rs
//
// Banco de questões: listagem com filtro, detalhe com comentários/reports,
// CRUD de admin e importação em lote a partir de texto.
use crate::{
    error::{AppError, AppResult},
    models::{
        questao::{ImportForm, QuestaoCompleta, QuestaoFiltro, QuestaoForm},
        social::{ComentarioForm, ReportForm},
        user::ROLE_ADMIN,
    },
    services::{
        comentario_service, materia_service, parser,
        questao_service::{self, NovaQuestao, PAGINA_TAMANHO},
        report_service, user_service,
    },
    state::AppState,
    templates::{
        ImportarPage, ImportarPreviewPage, QuestaoDetalhePage, QuestaoFormPage, QuestoesPage,
    },
    web::mw_auth::UserId,
};
use askama::Template;
use axum::{
    extract::{Extension, Form, Path, Query, State},
    response::{Html, IntoResponse, Redirect},
};
use serde::Deserialize;

fn render<T: Template>(template: T) -> AppResult<Html<String>> {
    match template.render() {
        Ok(html) => Ok(Html(html)),
        Err(e) => {
            tracing::error!("Falha ao renderizar template: {}", e);
            Err(AppError::InternalServerError)
        }
    }
}

fn feedback_erro(e: &AppError) -> String {
    match e {
        AppError::Validation(msg) => msg.clone(),
        AppError::NotFound(what) => format!("{} não encontrado.", what),
        _ => {
            tracing::error!("Erro em operação de questões: {:?}", e);
            "Ocorreu um erro inesperado.".to_string()
        }
    }
}

// --- Listagem ---

#[derive(Debug, Deserialize)]
pub struct QuestoesParams {
    pub materia_id: Option<String>,
    pub assunto_id: Option<String>,
    pub tipo: Option<String>,
    pub tag: Option<String>,
    pub pagina: Option<i64>,
    pub success: Option<String>,
    pub error: Option<String>,
}

impl QuestoesParams {
    fn filtro(&self) -> QuestaoFiltro {
        QuestaoFiltro {
            materia_id: self.materia_id.clone(),
            assunto_id: self.assunto_id.clone(),
            tipo: self.tipo.clone(),
            tag: self.tag.clone(),
            pagina: self.pagina,
        }
        .normalizado()
    }
}

/// Query string do filtro atual, terminada em '&' para colar 'pagina=N'.
fn query_base(filtro: &QuestaoFiltro) -> String {
    let mut base = String::new();
    let pares = [
        ("materia_id", &filtro.materia_id),
        ("assunto_id", &filtro.assunto_id),
        ("tipo", &filtro.tipo),
        ("tag", &filtro.tag),
    ];
    for (chave, valor) in pares {
        if let Some(v) = valor {
            base.push_str(chave);
            base.push('=');
            base.push_str(&urlencoding::encode(v));
            base.push('&');
        }
    }
    base
}

// GET /questoes
pub async fn show_questoes_page(
    State(state): State<AppState>,
    Extension(user_id_ext): Extension<UserId>,
    Query(params): Query<QuestoesParams>,
) -> AppResult<impl IntoResponse> {
    let is_admin =
        user_service::check_user_role(&state.db_pool, &user_id_ext.0, ROLE_ADMIN).await?;
    let filtro = params.filtro();
    let pagina = filtro.pagina.unwrap_or(1).max(1);

    let (questoes, total) = questao_service::listar_questoes(&state.db_pool, &filtro).await?;
    let materias = materia_service::find_all_materias(&state.db_pool).await?;
    let assuntos = materia_service::find_all_assuntos(&state.db_pool).await?;
    let tags = questao_service::find_all_tags(&state.db_pool).await?;

    let template = QuestoesPage {
        is_admin,
        questoes,
        total,
        pagina,
        tem_anterior: pagina > 1,
        tem_proxima: pagina * PAGINA_TAMANHO < total,
        query_base: query_base(&filtro),
        materias,
        assuntos,
        tags,
        filtro_materia: filtro.materia_id.clone().unwrap_or_default(),
        filtro_assunto: filtro.assunto_id.clone().unwrap_or_default(),
        filtro_tipo: filtro.tipo.clone().unwrap_or_default(),
        filtro_tag: filtro.tag.clone().unwrap_or_default(),
        success_message: params.success,
        error_message: params.error,
    };
    Ok(render(template)?.into_response())
}

// --- Detalhe ---

#[derive(Debug, Deserialize)]
pub struct FeedbackParams {
    pub success: Option<String>,
    pub error: Option<String>,
}

// GET /questoes/{id}
pub async fn show_questao_page(
    State(state): State<AppState>,
    Extension(user_id_ext): Extension<UserId>,
    Path(id): Path<String>,
    Query(params): Query<FeedbackParams>,
) -> AppResult<impl IntoResponse> {
    let user_id = user_id_ext.0;
    let is_admin = user_service::check_user_role(&state.db_pool, &user_id, ROLE_ADMIN).await?;

    let completa = questao_service::find_questao_completa(&state.db_pool, &id)
        .await?
        .ok_or_else(|| AppError::NotFound("Questão".to_string()))?;
    let comentarios = comentario_service::find_por_questao(&state.db_pool, &id).await?;

    let materia_nome = materia_service::find_materia_by_id(&state.db_pool, &completa.questao.materia_id)
        .await?
        .map(|m| m.nome)
        .unwrap_or_default();
    let assunto_nome = match &completa.questao.assunto_id {
        Some(assunto_id) => {
            materia_service::find_assuntos_da_materia(&state.db_pool, &completa.questao.materia_id)
                .await?
                .into_iter()
                .find(|a| &a.id == assunto_id)
                .map(|a| a.nome)
                .unwrap_or_default()
        }
        None => String::new(),
    };
    let banca_ano = match (&completa.questao.banca, completa.questao.ano) {
        (Some(banca), Some(ano)) => format!("{}/{}", banca, ano),
        (Some(banca), None) => banca.clone(),
        (None, Some(ano)) => ano.to_string(),
        (None, None) => String::new(),
    };

    let template = QuestaoDetalhePage {
        is_admin,
        user_id,
        questao_id: completa.questao.id.clone(),
        certo_errado: completa.questao.is_certo_errado(),
        enunciado: completa.questao.enunciado.clone(),
        gabarito: completa.questao.gabarito.clone(),
        materia_nome,
        assunto_nome,
        banca_ano,
        alternativas: completa.alternativas,
        tags: completa.tags,
        comentarios,
        success_message: params.success,
        error_message: params.error,
    };
    Ok(render(template)?.into_response())
}

// POST /questoes/{id}/comentar
pub async fn handle_comentar(
    State(state): State<AppState>,
    Extension(user_id_ext): Extension<UserId>,
    Path(id): Path<String>,
    Form(form): Form<ComentarioForm>,
) -> Redirect {
    match comentario_service::criar(&state.db_pool, &id, &user_id_ext.0, &form.texto).await {
        Ok(_) => Redirect::to(&format!(
            "/questoes/{}?success={}",
            id,
            urlencoding::encode("Comentário publicado.")
        )),
        Err(e) => Redirect::to(&format!(
            "/questoes/{}?error={}",
            id,
            urlencoding::encode(&feedback_erro(&e))
        )),
    }
}

// POST /questoes/{id}/reportar
pub async fn handle_reportar(
    State(state): State<AppState>,
    Extension(user_id_ext): Extension<UserId>,
    Path(id): Path<String>,
    Form(form): Form<ReportForm>,
) -> Redirect {
    match report_service::criar(&state.db_pool, &id, &user_id_ext.0, &form.motivo).await {
        Ok(_) => Redirect::to(&format!(
            "/questoes/{}?success={}",
            id,
            urlencoding::encode("Report enviado. Obrigado por ajudar a manter o banco limpo.")
        )),
        Err(e) => Redirect::to(&format!(
            "/questoes/{}?error={}",
            id,
            urlencoding::encode(&feedback_erro(&e))
        )),
    }
}

// POST /comentarios/{id}/apagar
pub async fn handle_apagar_comentario(
    State(state): State<AppState>,
    Extension(user_id_ext): Extension<UserId>,
    Path(id): Path<String>,
) -> AppResult<Redirect> {
    let user_id = user_id_ext.0;
    let is_admin = user_service::check_user_role(&state.db_pool, &user_id, ROLE_ADMIN).await?;

    match comentario_service::apagar(&state.db_pool, &id, &user_id, is_admin).await {
        Ok(questao_id) => Ok(Redirect::to(&format!(
            "/questoes/{}?success={}",
            questao_id,
            urlencoding::encode("Comentário apagado.")
        ))),
        Err(AppError::Unauthorized) => Err(AppError::Unauthorized),
        Err(e) => {
            tracing::error!("Erro ao apagar comentário {}: {:?}", id, e);
            Err(e)
        }
    }
}

// --- CRUD de admin ---

fn nova_questao_do_form(form: &QuestaoForm) -> NovaQuestao {
    NovaQuestao {
        materia_id: form.materia_id.clone(),
        assunto_id: if form.assunto_id.trim().is_empty() {
            None
        } else {
            Some(form.assunto_id.trim().to_string())
        },
        tipo: form.tipo.trim().to_string(),
        enunciado: form.enunciado.trim().to_string(),
        gabarito: form.gabarito.trim().to_uppercase(),
        banca: if form.banca.trim().is_empty() {
            None
        } else {
            Some(form.banca.trim().to_string())
        },
        ano: form.ano.trim().parse::<i64>().ok(),
        alternativas: form
            .alternativas()
            .into_iter()
            .map(|(letra, texto)| (letra.to_string(), texto.to_string()))
            .collect(),
        tags: form.tags_lista(),
    }
}

async fn form_page(
    state: &AppState,
    editar: bool,
    action: String,
    form: &QuestaoForm,
    error_message: Option<String>,
) -> AppResult<QuestaoFormPage> {
    Ok(QuestaoFormPage {
        editar,
        action,
        materias: materia_service::find_all_materias(&state.db_pool).await?,
        assuntos: materia_service::find_all_assuntos(&state.db_pool).await?,
        materia_id: form.materia_id.clone(),
        assunto_id: form.assunto_id.clone(),
        tipo: form.tipo.clone(),
        enunciado: form.enunciado.clone(),
        gabarito: form.gabarito.clone(),
        banca: form.banca.clone(),
        ano: form.ano.clone(),
        alt_a: form.alt_a.clone(),
        alt_b: form.alt_b.clone(),
        alt_c: form.alt_c.clone(),
        alt_d: form.alt_d.clone(),
        alt_e: form.alt_e.clone(),
        tags: form.tags.clone(),
        error_message,
    })
}

fn form_vazio() -> QuestaoForm {
    QuestaoForm {
        materia_id: String::new(),
        assunto_id: String::new(),
        tipo: "certo_errado".to_string(),
        enunciado: String::new(),
        gabarito: String::new(),
        banca: String::new(),
        ano: String::new(),
        alt_a: String::new(),
        alt_b: String::new(),
        alt_c: String::new(),
        alt_d: String::new(),
        alt_e: String::new(),
        tags: String::new(),
    }
}

fn form_da_questao(completa: &QuestaoCompleta) -> QuestaoForm {
    let alt = |letra: &str| -> String {
        completa
            .alternativas
            .iter()
            .find(|a| a.letra == letra)
            .map(|a| a.texto.clone())
            .unwrap_or_default()
    };
    QuestaoForm {
        materia_id: completa.questao.materia_id.clone(),
        assunto_id: completa.questao.assunto_id.clone().unwrap_or_default(),
        tipo: completa.questao.tipo.clone(),
        enunciado: completa.questao.enunciado.clone(),
        gabarito: completa.questao.gabarito.clone(),
        banca: completa.questao.banca.clone().unwrap_or_default(),
        ano: completa.questao.ano.map(|a| a.to_string()).unwrap_or_default(),
        alt_a: alt("A"),
        alt_b: alt("B"),
        alt_c: alt("C"),
        alt_d: alt("D"),
        alt_e: alt("E"),
        tags: completa
            .tags
            .iter()
            .map(|t| t.nome.clone())
            .collect::<Vec<_>>()
            .join(", "),
    }
}

// GET /admin/questoes/nova
pub async fn show_nova_questao_form(
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let template = form_page(
        &state,
        false,
        "/admin/questoes/nova".to_string(),
        &form_vazio(),
        None,
    )
    .await?;
    Ok(render(template)?.into_response())
}

// POST /admin/questoes/nova
pub async fn handle_create_questao(
    State(state): State<AppState>,
    Form(form): Form<QuestaoForm>,
) -> AppResult<impl IntoResponse> {
    let nova = nova_questao_do_form(&form);
    match questao_service::create_questao(&state.db_pool, &nova).await {
        Ok(id) => {
            tracing::info!("Questão {} criada manualmente.", id);
            Ok(Redirect::to(&format!(
                "/questoes/{}?success={}",
                id,
                urlencoding::encode("Questão criada.")
            ))
            .into_response())
        }
        Err(AppError::Validation(msg)) => {
            let template = form_page(
                &state,
                false,
                "/admin/questoes/nova".to_string(),
                &form,
                Some(msg),
            )
            .await?;
            Ok(render(template)?.into_response())
        }
        Err(e) => Err(e),
    }
}

// GET /admin/questoes/editar/{id}
pub async fn show_editar_questao_form(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let completa = questao_service::find_questao_completa(&state.db_pool, &id)
        .await?
        .ok_or_else(|| AppError::NotFound("Questão".to_string()))?;
    let template = form_page(
        &state,
        true,
        format!("/admin/questoes/editar/{}", id),
        &form_da_questao(&completa),
        None,
    )
    .await?;
    Ok(render(template)?.into_response())
}

// POST /admin/questoes/editar/{id}
pub async fn handle_editar_questao(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<QuestaoForm>,
) -> AppResult<impl IntoResponse> {
    let nova = nova_questao_do_form(&form);
    match questao_service::update_questao(&state.db_pool, &id, &nova).await {
        Ok(()) => Ok(Redirect::to(&format!(
            "/questoes/{}?success={}",
            id,
            urlencoding::encode("Questão atualizada.")
        ))
        .into_response()),
        Err(AppError::Validation(msg)) => {
            let template = form_page(
                &state,
                true,
                format!("/admin/questoes/editar/{}", id),
                &form,
                Some(msg),
            )
            .await?;
            Ok(render(template)?.into_response())
        }
        Err(e) => Err(e),
    }
}

// POST /admin/questoes/{id}/apagar
pub async fn handle_apagar_questao(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Redirect {
    match questao_service::delete_questao(&state.db_pool, &id).await {
        Ok(()) => Redirect::to(&format!(
            "/questoes?success={}",
            urlencoding::encode("Questão apagada.")
        )),
        Err(e) => Redirect::to(&format!(
            "/questoes?error={}",
            urlencoding::encode(&feedback_erro(&e))
        )),
    }
}

// --- Importação em lote ---

// GET /admin/importar
pub async fn show_importar_form(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let template = ImportarPage {
        materias: materia_service::find_all_materias(&state.db_pool).await?,
        assuntos: materia_service::find_all_assuntos(&state.db_pool).await?,
        error_message: None,
    };
    Ok(render(template)?.into_response())
}

// POST /admin/importar/preview
pub async fn handle_importar_preview(
    State(state): State<AppState>,
    Form(form): Form<ImportForm>,
) -> AppResult<impl IntoResponse> {
    let Some(materia) = materia_service::find_materia_by_id(&state.db_pool, &form.materia_id).await?
    else {
        let template = ImportarPage {
            materias: materia_service::find_all_materias(&state.db_pool).await?,
            assuntos: materia_service::find_all_assuntos(&state.db_pool).await?,
            error_message: Some("Escolha uma matéria válida.".to_string()),
        };
        return Ok(render(template)?.into_response());
    };

    let resultado = parser::parse_texto(&form.texto);
    if resultado.questoes.is_empty() && resultado.erros.is_empty() {
        let template = ImportarPage {
            materias: materia_service::find_all_materias(&state.db_pool).await?,
            assuntos: materia_service::find_all_assuntos(&state.db_pool).await?,
            error_message: Some("O texto não contém nenhum bloco de questão.".to_string()),
        };
        return Ok(render(template)?.into_response());
    }

    let template = ImportarPreviewPage {
        materia_nome: materia.nome,
        materia_id: form.materia_id,
        assunto_id: form.assunto_id,
        texto: form.texto,
        questoes: resultado.questoes,
        erros: resultado.erros,
    };
    Ok(render(template)?.into_response())
}

// POST /admin/importar/confirmar
pub async fn handle_importar_confirmar(
    State(state): State<AppState>,
    Form(form): Form<ImportForm>,
) -> AppResult<Redirect> {
    let resultado = parser::parse_texto(&form.texto);
    let assunto_id = if form.assunto_id.trim().is_empty() {
        None
    } else {
        Some(form.assunto_id.trim().to_string())
    };

    let mut importadas = 0usize;
    let mut falhadas = resultado.erros.len();
    for importada in resultado.questoes {
        let nova = NovaQuestao {
            materia_id: form.materia_id.clone(),
            assunto_id: assunto_id.clone(),
            tipo: importada.tipo.to_string(),
            enunciado: importada.enunciado,
            gabarito: importada.gabarito,
            banca: importada.banca,
            ano: importada.ano,
            alternativas: importada.alternativas,
            tags: importada.tags,
        };
        match questao_service::create_questao(&state.db_pool, &nova).await {
            Ok(_) => importadas += 1,
            Err(e) => {
                tracing::warn!("Bloco importado rejeitado na gravação: {:?}", e);
                falhadas += 1;
            }
        }
    }

    tracing::info!("📥 Importação: {} questões gravadas, {} blocos rejeitados.", importadas, falhadas);
    let msg = if falhadas > 0 {
        format!("{} questões importadas; {} blocos rejeitados.", importadas, falhadas)
    } else {
        format!("{} questões importadas.", importadas)
    };
    Ok(Redirect::to(&format!(
        "/questoes?success={}",
        urlencoding::encode(&msg)
    )))
}
