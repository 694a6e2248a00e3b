// src/services/session_service.rs
//
// Sessões de dispositivo: cada cookie de sessão vivo tem uma linha em
// user_sessions, atualizada pelo middleware a cada pedido autenticado.
use crate::{error::AppResult, models::user::UserSession};
use chrono::{Duration, Local};
use sqlx::SqlitePool;

/// Regista (ou atualiza) a sessão de dispositivo deste pedido.
/// UPSERT: a mesma sessão só muda o last_seen / user_agent.
pub async fn touch(
    db_pool: &SqlitePool,
    session_id: &str,
    user_id: &str,
    user_agent: &str,
) -> AppResult<()> {
    let now = Local::now().to_rfc3339();
    sqlx::query(
        r#"
        INSERT INTO user_sessions (id, user_id, user_agent, last_seen)
        VALUES (?1, ?2, ?3, ?4)
        ON CONFLICT(id) DO UPDATE SET
            user_agent = excluded.user_agent,
            last_seen = excluded.last_seen
        "#,
    )
    .bind(session_id)
    .bind(user_id)
    .bind(user_agent)
    .bind(&now)
    .execute(db_pool)
    .await?;
    Ok(())
}

pub async fn listar_por_usuario(
    db_pool: &SqlitePool,
    user_id: &str,
) -> AppResult<Vec<UserSession>> {
    let sessions = sqlx::query_as::<_, UserSession>(
        r#"
        SELECT user_agent, last_seen
        FROM user_sessions
        WHERE user_id = ?1
        ORDER BY last_seen DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(db_pool)
    .await?;
    Ok(sessions)
}

/// Remove sessões de dispositivo sem atividade há mais de `dias` dias.
pub async fn apagar_antigas(db_pool: &SqlitePool, dias: i64) -> AppResult<u64> {
    let limite = (Local::now() - Duration::days(dias)).to_rfc3339();
    let rows = sqlx::query("DELETE FROM user_sessions WHERE last_seen < ?1")
        .bind(&limite)
        .execute(db_pool)
        .await?
        .rows_affected();
    if rows > 0 {
        tracing::info!("🧹 Removidas {} sessões de dispositivo antigas.", rows);
    }
    Ok(rows)
}

pub async fn apagar(db_pool: &SqlitePool, session_id: &str) -> AppResult<()> {
    sqlx::query("DELETE FROM user_sessions WHERE id = ?1")
        .bind(session_id)
        .execute(db_pool)
        .await?;
    Ok(())
}
