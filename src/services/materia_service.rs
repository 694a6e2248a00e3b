// src/services/materia_service.rs
use crate::{
    error::{AppError, AppResult},
    models::materia::{Assunto, Materia, MateriaResumo},
};
use sqlx::SqlitePool;
use uuid::Uuid;

pub async fn find_all_materias(db_pool: &SqlitePool) -> AppResult<Vec<Materia>> {
    let materias = sqlx::query_as::<_, Materia>(
        "SELECT id, nome FROM materias ORDER BY nome ASC",
    )
    .fetch_all(db_pool)
    .await?;
    Ok(materias)
}

/// Matérias com contagem de assuntos e questões, para a página de catálogo.
pub async fn find_materias_resumo(db_pool: &SqlitePool) -> AppResult<Vec<MateriaResumo>> {
    let resumo = sqlx::query_as::<_, MateriaResumo>(
        r#"
        SELECT
            m.id, m.nome, m.descricao,
            (SELECT COUNT(*) FROM assuntos a WHERE a.materia_id = m.id) AS total_assuntos,
            (SELECT COUNT(*) FROM questoes q WHERE q.materia_id = m.id) AS total_questoes
        FROM materias m
        ORDER BY m.nome ASC
        "#,
    )
    .fetch_all(db_pool)
    .await?;
    Ok(resumo)
}

pub async fn find_materia_by_id(db_pool: &SqlitePool, id: &str) -> AppResult<Option<Materia>> {
    let materia = sqlx::query_as::<_, Materia>(
        "SELECT id, nome FROM materias WHERE id = ?1",
    )
    .bind(id)
    .fetch_optional(db_pool)
    .await?;
    Ok(materia)
}

pub async fn create_materia(db_pool: &SqlitePool, nome: &str, descricao: &str) -> AppResult<String> {
    let nome = nome.trim();
    if nome.is_empty() {
        return Err(AppError::Validation("O nome da matéria é obrigatório.".to_string()));
    }
    let id = Uuid::new_v4().to_string();
    let result = sqlx::query("INSERT INTO materias (id, nome, descricao) VALUES (?1, ?2, ?3)")
        .bind(&id)
        .bind(nome)
        .bind(descricao.trim())
        .execute(db_pool)
        .await;

    // UNIQUE COLLATE NOCASE em materias.nome
    if let Err(sqlx::Error::Database(db_err)) = &result {
        if db_err.is_unique_violation() {
            tracing::warn!("Matéria duplicada recusada: '{}'", nome);
            return Err(AppError::Validation(format!("A matéria '{}' já existe.", nome)));
        }
    }
    result?;
    tracing::info!("✅ Matéria '{}' criada.", nome);
    Ok(id)
}

pub async fn update_materia(
    db_pool: &SqlitePool,
    id: &str,
    nome: &str,
    descricao: &str,
) -> AppResult<()> {
    let nome = nome.trim();
    if nome.is_empty() {
        return Err(AppError::Validation("O nome da matéria é obrigatório.".to_string()));
    }
    let rows = sqlx::query("UPDATE materias SET nome = ?1, descricao = ?2 WHERE id = ?3")
        .bind(nome)
        .bind(descricao.trim())
        .bind(id)
        .execute(db_pool)
        .await?
        .rows_affected();
    if rows == 0 {
        return Err(AppError::NotFound("Matéria".to_string()));
    }
    Ok(())
}

/// Apaga uma matéria. Recusada enquanto houver questões associadas;
/// os assuntos caem por cascade.
pub async fn delete_materia(db_pool: &SqlitePool, id: &str) -> AppResult<()> {
    let questoes: i64 =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM questoes WHERE materia_id = ?1")
            .bind(id)
            .fetch_one(db_pool)
            .await?;
    if questoes > 0 {
        return Err(AppError::Validation(format!(
            "A matéria tem {} questões; apague-as ou mova-as primeiro.",
            questoes
        )));
    }

    let rows = sqlx::query("DELETE FROM materias WHERE id = ?1")
        .bind(id)
        .execute(db_pool)
        .await?
        .rows_affected();
    if rows == 0 {
        return Err(AppError::NotFound("Matéria".to_string()));
    }
    tracing::info!("Matéria '{}' apagada.", id);
    Ok(())
}

// --- Assuntos ---

pub async fn find_assuntos_da_materia(
    db_pool: &SqlitePool,
    materia_id: &str,
) -> AppResult<Vec<Assunto>> {
    let assuntos = sqlx::query_as::<_, Assunto>(
        "SELECT id, materia_id, nome FROM assuntos WHERE materia_id = ?1 ORDER BY nome ASC",
    )
    .bind(materia_id)
    .fetch_all(db_pool)
    .await?;
    Ok(assuntos)
}

pub async fn find_all_assuntos(db_pool: &SqlitePool) -> AppResult<Vec<Assunto>> {
    let assuntos = sqlx::query_as::<_, Assunto>(
        "SELECT id, materia_id, nome FROM assuntos ORDER BY nome ASC",
    )
    .fetch_all(db_pool)
    .await?;
    Ok(assuntos)
}

pub async fn create_assunto(
    db_pool: &SqlitePool,
    materia_id: &str,
    nome: &str,
) -> AppResult<String> {
    let nome = nome.trim();
    if nome.is_empty() {
        return Err(AppError::Validation("O nome do assunto é obrigatório.".to_string()));
    }
    if find_materia_by_id(db_pool, materia_id).await?.is_none() {
        return Err(AppError::NotFound("Matéria".to_string()));
    }

    let id = Uuid::new_v4().to_string();
    let result = sqlx::query("INSERT INTO assuntos (id, materia_id, nome) VALUES (?1, ?2, ?3)")
        .bind(&id)
        .bind(materia_id)
        .bind(nome)
        .execute(db_pool)
        .await;

    if let Err(sqlx::Error::Database(db_err)) = &result {
        if db_err.is_unique_violation() {
            return Err(AppError::Validation(format!(
                "O assunto '{}' já existe nesta matéria.",
                nome
            )));
        }
    }
    result?;
    tracing::info!("✅ Assunto '{}' criado na matéria {}.", nome, materia_id);
    Ok(id)
}

pub async fn update_assunto(db_pool: &SqlitePool, id: &str, nome: &str) -> AppResult<()> {
    let nome = nome.trim();
    if nome.is_empty() {
        return Err(AppError::Validation("O nome do assunto é obrigatório.".to_string()));
    }

    let result = sqlx::query("UPDATE assuntos SET nome = ?1 WHERE id = ?2")
        .bind(nome)
        .bind(id)
        .execute(db_pool)
        .await;

    if let Err(sqlx::Error::Database(db_err)) = &result {
        if db_err.is_unique_violation() {
            return Err(AppError::Validation(format!(
                "O assunto '{}' já existe nesta matéria.",
                nome
            )));
        }
    }
    if result?.rows_affected() == 0 {
        return Err(AppError::NotFound("Assunto".to_string()));
    }
    Ok(())
}

pub async fn delete_assunto(db_pool: &SqlitePool, id: &str) -> AppResult<()> {
    // questoes.assunto_id tem ON DELETE SET NULL; as questões sobrevivem
    let rows = sqlx::query("DELETE FROM assuntos WHERE id = ?1")
        .bind(id)
        .execute(db_pool)
        .await?
        .rows_affected();
    if rows == 0 {
        return Err(AppError::NotFound("Assunto".to_string()));
    }
    Ok(())
}
