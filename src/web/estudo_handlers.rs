// src/web/estudo_handlers.rs
//
// Modo estudo: arranque com filtro, sessão questão-a-questão (PRG com
// feedback na query string) e resultado final.
use crate::{
    error::{AppError, AppResult},
    models::{
        estudo::{IniciarSessaoForm, ResponderForm},
        questao::{QuestaoFiltro, TIPO_CERTO_ERRADO, TIPO_MULTIPLA_ESCOLHA},
    },
    services::{estudo_service, materia_service, questao_service},
    state::AppState,
    templates::{EstudarPage, FeedbackView, ProgressoView, ResultadoPage, SessaoPage},
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

fn campo_opcional(valor: &str) -> Option<String> {
    let valor = valor.trim();
    if valor.is_empty() {
        None
    } else {
        Some(valor.to_string())
    }
}

#[derive(Debug, Deserialize)]
pub struct EstudarParams {
    pub error: Option<String>,
}

// GET /estudar
pub async fn show_estudar_page(
    State(state): State<AppState>,
    Extension(user_id_ext): Extension<UserId>,
    Query(params): Query<EstudarParams>,
) -> AppResult<impl IntoResponse> {
    let progresso = estudo_service::obter_progresso(&state.db_pool, &user_id_ext.0).await?;
    let progresso = match progresso {
        Some(p) => Some(ProgressoView {
            descricao: if p.descricao_filtro.is_empty() {
                "Todas as questões".to_string()
            } else {
                p.descricao_filtro.clone()
            },
            respondidas: p.acertos + p.erros,
            total: p.total()?,
        }),
        None => None,
    };

    let template = EstudarPage {
        materias: materia_service::find_all_materias(&state.db_pool).await?,
        assuntos: materia_service::find_all_assuntos(&state.db_pool).await?,
        tags: questao_service::find_all_tags(&state.db_pool).await?,
        progresso,
        error_message: params.error,
    };
    Ok(render(template)?.into_response())
}

/// Descrição legível do filtro, gravada na sessão e no histórico.
async fn descrever_filtro(state: &AppState, filtro: &QuestaoFiltro) -> AppResult<String> {
    let mut partes = Vec::new();
    if let Some(materia_id) = &filtro.materia_id {
        if let Some(materia) = materia_service::find_materia_by_id(&state.db_pool, materia_id).await? {
            let assunto_nome = match &filtro.assunto_id {
                Some(assunto_id) => {
                    materia_service::find_assuntos_da_materia(&state.db_pool, materia_id)
                        .await?
                        .into_iter()
                        .find(|a| &a.id == assunto_id)
                        .map(|a| a.nome)
                }
                None => None,
            };
            match assunto_nome {
                Some(nome) => partes.push(format!("{} / {}", materia.nome, nome)),
                None => partes.push(materia.nome),
            }
        }
    }
    match filtro.tipo.as_deref() {
        Some(TIPO_CERTO_ERRADO) => partes.push("Certo/Errado".to_string()),
        Some(TIPO_MULTIPLA_ESCOLHA) => partes.push("Múltipla escolha".to_string()),
        _ => {}
    }
    if let Some(tag) = &filtro.tag {
        partes.push(format!("#{}", tag));
    }
    if partes.is_empty() {
        Ok("Todas as questões".to_string())
    } else {
        Ok(partes.join(" · "))
    }
}

// POST /estudar/iniciar
pub async fn handle_iniciar(
    State(state): State<AppState>,
    Extension(user_id_ext): Extension<UserId>,
    Form(form): Form<IniciarSessaoForm>,
) -> AppResult<Redirect> {
    let filtro = QuestaoFiltro {
        materia_id: campo_opcional(&form.materia_id),
        assunto_id: campo_opcional(&form.assunto_id),
        tipo: campo_opcional(&form.tipo),
        tag: campo_opcional(&form.tag),
        pagina: None,
    }
    .normalizado();
    let limite = form
        .limite
        .trim()
        .parse::<i64>()
        .unwrap_or(estudo_service::LIMITE_PADRAO);
    let descricao = descrever_filtro(&state, &filtro).await?;

    match estudo_service::iniciar_sessao(&state.db_pool, &user_id_ext.0, &filtro, limite, &descricao)
        .await
    {
        Ok(_) => Ok(Redirect::to("/estudar/sessao")),
        Err(AppError::Validation(msg)) => Ok(Redirect::to(&format!(
            "/estudar?error={}",
            urlencoding::encode(&msg)
        ))),
        Err(e) => Err(e),
    }
}

#[derive(Debug, Deserialize)]
pub struct SessaoParams {
    pub correta: Option<bool>,
    pub gabarito: Option<String>,
    pub error: Option<String>,
}

// GET /estudar/sessao
pub async fn show_sessao_page(
    State(state): State<AppState>,
    Extension(user_id_ext): Extension<UserId>,
    Query(params): Query<SessaoParams>,
) -> AppResult<impl IntoResponse> {
    let user_id = user_id_ext.0;
    let Some(progresso) = estudo_service::obter_progresso(&state.db_pool, &user_id).await? else {
        return Ok(Redirect::to("/estudar").into_response());
    };

    let Some((progresso, completa)) =
        estudo_service::questao_atual(&state.db_pool, &progresso).await?
    else {
        // Fim da lista: fecha a sessão e mostra o resultado
        return match estudo_service::finalizar(&state.db_pool, &user_id).await {
            Ok(historico_id) => {
                Ok(Redirect::to(&format!("/estudar/resultado/{}", historico_id)).into_response())
            }
            Err(AppError::Validation(msg)) => Ok(Redirect::to(&format!(
                "/estudar?error={}",
                urlencoding::encode(&msg)
            ))
            .into_response()),
            Err(e) => Err(e),
        };
    };

    let feedback = match (params.correta, params.gabarito) {
        (Some(correta), Some(gabarito)) => Some(FeedbackView { correta, gabarito }),
        _ => None,
    };

    let template = SessaoPage {
        numero: progresso.indice_atual + 1,
        total: progresso.total()?,
        acertos: progresso.acertos,
        erros: progresso.erros,
        indice: progresso.indice_atual,
        enunciado: completa.questao.enunciado.clone(),
        certo_errado: completa.questao.is_certo_errado(),
        alternativas: completa.alternativas,
        feedback,
        error_message: params.error,
    };
    Ok(render(template)?.into_response())
}

// POST /estudar/responder
pub async fn handle_responder(
    State(state): State<AppState>,
    Extension(user_id_ext): Extension<UserId>,
    Form(form): Form<ResponderForm>,
) -> AppResult<Redirect> {
    match estudo_service::responder(
        &state.db_pool,
        &user_id_ext.0,
        form.indice,
        &form.resposta,
        form.tempo_segundos,
    )
    .await
    {
        Ok(Some(avaliada)) => Ok(Redirect::to(&format!(
            "/estudar/sessao?correta={}&gabarito={}",
            avaliada.correta,
            urlencoding::encode(&avaliada.gabarito)
        ))),
        // Re-submit de um índice antigo: segue sem contar de novo
        Ok(None) => Ok(Redirect::to("/estudar/sessao")),
        Err(AppError::NotFound(_)) => Ok(Redirect::to("/estudar")),
        Err(AppError::Validation(msg)) => Ok(Redirect::to(&format!(
            "/estudar/sessao?error={}",
            urlencoding::encode(&msg)
        ))),
        Err(e) => Err(e),
    }
}

// POST /estudar/finalizar
pub async fn handle_finalizar(
    State(state): State<AppState>,
    Extension(user_id_ext): Extension<UserId>,
) -> AppResult<Redirect> {
    match estudo_service::finalizar(&state.db_pool, &user_id_ext.0).await {
        Ok(historico_id) => Ok(Redirect::to(&format!("/estudar/resultado/{}", historico_id))),
        Err(AppError::Validation(msg)) | Err(AppError::NotFound(msg)) => Ok(Redirect::to(
            &format!("/estudar?error={}", urlencoding::encode(&msg)),
        )),
        Err(e) => Err(e),
    }
}

// POST /estudar/abandonar
pub async fn handle_abandonar(
    State(state): State<AppState>,
    Extension(user_id_ext): Extension<UserId>,
) -> AppResult<Redirect> {
    estudo_service::abandonar(&state.db_pool, &user_id_ext.0).await?;
    Ok(Redirect::to("/estudar"))
}

// GET /estudar/resultado/{id}
pub async fn show_resultado_page(
    State(state): State<AppState>,
    Extension(user_id_ext): Extension<UserId>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let historico = estudo_service::find_historico(&state.db_pool, &id, &user_id_ext.0)
        .await?
        .ok_or_else(|| AppError::NotFound("Resultado".to_string()))?;
    let respostas = estudo_service::find_respostas(&state.db_pool, &id).await?;

    let template = ResultadoPage {
        descricao_filtro: historico.descricao_filtro.clone(),
        total_questoes: historico.total_questoes,
        respondidas: historico.respondidas(),
        acertos: historico.acertos,
        erros: historico.erros,
        percentual: historico.percentual(),
        nota_liquida: historico.nota_liquida(),
        tempo_segundos: historico.tempo_segundos,
        respostas,
    };
    Ok(render(template)?.into_response())
}
