// src/services/comentario_service.rs
use crate::{
    error::{AppError, AppResult},
    models::social::ComentarioExibicao,
};
use sqlx::SqlitePool;
use uuid::Uuid;

pub async fn find_por_questao(
    db_pool: &SqlitePool,
    questao_id: &str,
) -> AppResult<Vec<ComentarioExibicao>> {
    let comentarios = sqlx::query_as::<_, ComentarioExibicao>(
        r#"
        SELECT c.id, c.user_id, u.nome AS autor, c.texto, c.created_at
        FROM comentarios c
        JOIN usuarios u ON u.id = c.user_id
        WHERE c.questao_id = ?1
        ORDER BY c.created_at ASC
        "#,
    )
    .bind(questao_id)
    .fetch_all(db_pool)
    .await?;
    Ok(comentarios)
}

pub async fn criar(
    db_pool: &SqlitePool,
    questao_id: &str,
    user_id: &str,
    texto: &str,
) -> AppResult<String> {
    let texto = texto.trim();
    if texto.is_empty() {
        return Err(AppError::Validation("O comentário não pode ser vazio.".to_string()));
    }
    if texto.chars().count() > 2000 {
        return Err(AppError::Validation("Comentário demasiado longo.".to_string()));
    }

    let id = Uuid::new_v4().to_string();
    sqlx::query(
        "INSERT INTO comentarios (id, questao_id, user_id, texto) VALUES (?1, ?2, ?3, ?4)",
    )
    .bind(&id)
    .bind(questao_id)
    .bind(user_id)
    .bind(texto)
    .execute(db_pool)
    .await?;
    tracing::debug!("Comentário {} criado na questão {}.", id, questao_id);
    Ok(id)
}

/// Apaga um comentário. Só o autor ou um admin podem apagar.
pub async fn apagar(
    db_pool: &SqlitePool,
    comentario_id: &str,
    user_id: &str,
    is_admin: bool,
) -> AppResult<String> {
    let dono: Option<(String, String)> =
        sqlx::query_as("SELECT user_id, questao_id FROM comentarios WHERE id = ?1")
            .bind(comentario_id)
            .fetch_optional(db_pool)
            .await?;
    let Some((dono_id, questao_id)) = dono else {
        return Err(AppError::NotFound("Comentário".to_string()));
    };
    if dono_id != user_id && !is_admin {
        tracing::warn!(
            "Utilizador {} tentou apagar comentário {} de outro autor.",
            user_id,
            comentario_id
        );
        return Err(AppError::Unauthorized);
    }

    sqlx::query("DELETE FROM comentarios WHERE id = ?1")
        .bind(comentario_id)
        .execute(db_pool)
        .await?;
    Ok(questao_id)
}
