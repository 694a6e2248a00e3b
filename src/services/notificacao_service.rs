// src/services/notificacao_service.rs
use crate::{error::AppResult, models::social::Notificacao};
use sqlx::SqlitePool;
use uuid::Uuid;

pub async fn notificar(db_pool: &SqlitePool, user_id: &str, mensagem: &str) -> AppResult<String> {
    let id = Uuid::new_v4().to_string();
    sqlx::query("INSERT INTO notificacoes (id, user_id, mensagem) VALUES (?1, ?2, ?3)")
        .bind(&id)
        .bind(user_id)
        .bind(mensagem)
        .execute(db_pool)
        .await?;
    tracing::debug!("🔔 Notificação criada para {}.", user_id);
    Ok(id)
}

pub async fn find_por_usuario(db_pool: &SqlitePool, user_id: &str) -> AppResult<Vec<Notificacao>> {
    let notificacoes = sqlx::query_as::<_, Notificacao>(
        r#"
        SELECT id, mensagem, lida, created_at
        FROM notificacoes
        WHERE user_id = ?1
        ORDER BY created_at DESC
        LIMIT 100
        "#,
    )
    .bind(user_id)
    .fetch_all(db_pool)
    .await?;
    Ok(notificacoes)
}

pub async fn contar_nao_lidas(db_pool: &SqlitePool, user_id: &str) -> AppResult<i64> {
    let total = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM notificacoes WHERE user_id = ?1 AND lida = 0",
    )
    .bind(user_id)
    .fetch_one(db_pool)
    .await?;
    Ok(total)
}

/// Marca como lida. Só afeta notificações do próprio utilizador.
pub async fn marcar_lida(db_pool: &SqlitePool, id: &str, user_id: &str) -> AppResult<()> {
    sqlx::query("UPDATE notificacoes SET lida = 1 WHERE id = ?1 AND user_id = ?2")
        .bind(id)
        .bind(user_id)
        .execute(db_pool)
        .await?;
    Ok(())
}
