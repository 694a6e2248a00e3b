// src/services/report_service.rs
use crate::{
    error::{AppError, AppResult},
    models::social::{ReportExibicao, REPORT_ABERTO, REPORT_RESOLVIDO},
    services::notificacao_service,
};
use chrono::Local;
use sqlx::SqlitePool;
use uuid::Uuid;

/// Aluno sinaliza um problema numa questão.
pub async fn criar(
    db_pool: &SqlitePool,
    questao_id: &str,
    user_id: &str,
    motivo: &str,
) -> AppResult<String> {
    let motivo = motivo.trim();
    if motivo.is_empty() {
        return Err(AppError::Validation("Descreva o problema encontrado.".to_string()));
    }

    let id = Uuid::new_v4().to_string();
    sqlx::query(
        "INSERT INTO reports (id, questao_id, user_id, motivo, status) VALUES (?1, ?2, ?3, ?4, ?5)",
    )
    .bind(&id)
    .bind(questao_id)
    .bind(user_id)
    .bind(motivo)
    .bind(REPORT_ABERTO)
    .execute(db_pool)
    .await?;
    tracing::info!("🚩 Report {} aberto na questão {} por {}.", id, questao_id, user_id);
    Ok(id)
}

/// Reports abertos, mais antigos primeiro, para o painel de moderação.
pub async fn find_abertos(db_pool: &SqlitePool) -> AppResult<Vec<ReportExibicao>> {
    let reports = sqlx::query_as::<_, ReportExibicao>(
        r#"
        SELECT r.id, r.questao_id, u.nome AS autor, r.motivo,
               substr(q.enunciado, 1, 120) AS enunciado, r.created_at
        FROM reports r
        JOIN usuarios u ON u.id = r.user_id
        JOIN questoes q ON q.id = r.questao_id
        WHERE r.status = ?1
        ORDER BY r.created_at ASC
        "#,
    )
    .bind(REPORT_ABERTO)
    .fetch_all(db_pool)
    .await?;
    Ok(reports)
}

pub async fn contar_abertos(db_pool: &SqlitePool) -> AppResult<i64> {
    let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM reports WHERE status = ?1")
        .bind(REPORT_ABERTO)
        .fetch_one(db_pool)
        .await?;
    Ok(total)
}

/// Fecha o report e notifica quem o abriu.
pub async fn resolver(db_pool: &SqlitePool, report_id: &str, resposta: &str) -> AppResult<()> {
    let reporter: Option<String> =
        sqlx::query_scalar::<_, String>("SELECT user_id FROM reports WHERE id = ?1 AND status = ?2")
            .bind(report_id)
            .bind(REPORT_ABERTO)
            .fetch_optional(db_pool)
            .await?;
    let Some(reporter_id) = reporter else {
        return Err(AppError::NotFound("Report aberto".to_string()));
    };

    let resposta = resposta.trim();
    let now = Local::now().to_rfc3339();
    sqlx::query(
        r#"
        UPDATE reports
        SET status = ?1, resposta_admin = ?2, resolvido_em = ?3
        WHERE id = ?4
        "#,
    )
    .bind(REPORT_RESOLVIDO)
    .bind(if resposta.is_empty() { None } else { Some(resposta) })
    .bind(&now)
    .bind(report_id)
    .execute(db_pool)
    .await?;

    let mensagem = if resposta.is_empty() {
        "O seu report de questão foi analisado e resolvido.".to_string()
    } else {
        format!("O seu report de questão foi resolvido: {}", resposta)
    };
    notificacao_service::notificar(db_pool, &reporter_id, &mensagem).await?;

    tracing::info!("✅ Report {} resolvido.", report_id);
    Ok(())
}
