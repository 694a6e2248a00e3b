// src/services/user_service.rs
use crate::{
    error::{AppError, AppResult},
    models::user::{Usuario, ROLE_ADMIN, ROLE_ALUNO, STATUS_APROVADO, STATUS_BLOQUEADO, STATUS_PENDENTE},
    services::{auth_service, notificacao_service},
};
use chrono::Local;
use sqlx::SqlitePool;
use uuid::Uuid;

pub async fn find_user_by_id(db_pool: &SqlitePool, user_id: &str) -> AppResult<Option<Usuario>> {
    tracing::debug!("Buscando utilizador por ID: {}", user_id);
    let user = sqlx::query_as::<_, Usuario>(
        r#"
        SELECT id, email, password_hash, nome, role, status, created_at
        FROM usuarios
        WHERE id = ?1
        "#,
    )
    .bind(user_id)
    .fetch_optional(db_pool)
    .await?;
    Ok(user)
}

pub async fn find_user_by_email(db_pool: &SqlitePool, email: &str) -> AppResult<Option<Usuario>> {
    let email = email.trim();
    tracing::debug!("Buscando utilizador por e-mail: {}", email);
    let user = sqlx::query_as::<_, Usuario>(
        r#"
        SELECT id, email, password_hash, nome, role, status, created_at
        FROM usuarios
        WHERE email = ?1 COLLATE NOCASE
        "#,
    )
    .bind(email)
    .fetch_optional(db_pool)
    .await?;
    Ok(user)
}

/// Todos os utilizadores, pendentes primeiro, para o painel de administração.
pub async fn find_all_users(db_pool: &SqlitePool) -> AppResult<Vec<Usuario>> {
    let users = sqlx::query_as::<_, Usuario>(
        r#"
        SELECT id, email, password_hash, nome, role, status, created_at
        FROM usuarios
        ORDER BY
            CASE status WHEN 'pendente' THEN 0 WHEN 'aprovado' THEN 1 ELSE 2 END,
            nome ASC
        "#,
    )
    .fetch_all(db_pool)
    .await?;
    tracing::debug!("Encontrados {} utilizadores.", users.len());
    Ok(users)
}

/// Regista um novo aluno. A conta nasce 'pendente' até aprovação de um admin.
pub async fn registar(
    db_pool: &SqlitePool,
    nome: &str,
    email: &str,
    raw_password: &str,
) -> AppResult<String> {
    let nome = nome.trim();
    let email = email.trim();
    if nome.is_empty() || email.is_empty() || !email.contains('@') {
        return Err(AppError::Validation("Nome ou e-mail inválidos.".to_string()));
    }
    if raw_password.len() < 6 {
        return Err(AppError::Validation(
            "A senha deve ter pelo menos 6 caracteres.".to_string(),
        ));
    }

    if find_user_by_email(db_pool, email).await?.is_some() {
        tracing::warn!("Registo recusado: e-mail '{}' já em uso.", email);
        return Err(AppError::Validation("Este e-mail já está registado.".to_string()));
    }

    let id = Uuid::new_v4().to_string();
    let password_hash = auth_service::hash_password(raw_password).await?;

    sqlx::query(
        r#"
        INSERT INTO usuarios (id, email, password_hash, nome, role, status)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(&id)
    .bind(email)
    .bind(&password_hash)
    .bind(nome)
    .bind(ROLE_ALUNO)
    .bind(STATUS_PENDENTE)
    .execute(db_pool)
    .await?;

    tracing::info!("✅ Novo registo pendente: {} ({})", nome, email);
    Ok(id)
}

/// Valida login: credenciais + estado da conta.
pub async fn autenticar(db_pool: &SqlitePool, email: &str, password: &str) -> AppResult<Usuario> {
    let user = find_user_by_email(db_pool, email)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    if !auth_service::verify_password(password, &user.password_hash).await? {
        tracing::warn!("Senha incorreta para: {}", email);
        return Err(AppError::InvalidCredentials);
    }

    match user.status.as_str() {
        STATUS_APROVADO => Ok(user),
        STATUS_PENDENTE => Err(AppError::ContaPendente),
        _ => Err(AppError::ContaBloqueada),
    }
}

/// Aprova uma conta pendente e notifica o dono.
pub async fn aprovar_usuario(db_pool: &SqlitePool, user_id: &str) -> AppResult<()> {
    let rows = definir_status(db_pool, user_id, STATUS_APROVADO).await?;
    if rows == 0 {
        return Err(AppError::NotFound("Utilizador".to_string()));
    }
    notificacao_service::notificar(
        db_pool,
        user_id,
        "A sua conta foi aprovada. Bons estudos!",
    )
    .await?;
    tracing::info!("✅ Utilizador '{}' aprovado.", user_id);
    Ok(())
}

pub async fn bloquear_usuario(db_pool: &SqlitePool, user_id: &str) -> AppResult<()> {
    let rows = definir_status(db_pool, user_id, STATUS_BLOQUEADO).await?;
    if rows == 0 {
        return Err(AppError::NotFound("Utilizador".to_string()));
    }
    tracing::info!("Utilizador '{}' bloqueado.", user_id);
    Ok(())
}

async fn definir_status(db_pool: &SqlitePool, user_id: &str, status: &str) -> AppResult<u64> {
    let now = Local::now().to_rfc3339();
    let rows = sqlx::query(
        r#"
        UPDATE usuarios SET status = ?1, updated_at = ?2 WHERE id = ?3
        "#,
    )
    .bind(status)
    .bind(&now)
    .bind(user_id)
    .execute(db_pool)
    .await?
    .rows_affected();
    Ok(rows)
}

/// Verifica se o utilizador tem a role pedida (case-insensitive).
pub async fn check_user_role(db_pool: &SqlitePool, user_id: &str, role: &str) -> AppResult<bool> {
    let found: Option<String> =
        sqlx::query_scalar::<_, String>("SELECT role FROM usuarios WHERE id = ?1")
            .bind(user_id)
            .fetch_optional(db_pool)
            .await?;
    Ok(found.map_or(false, |r| r.eq_ignore_ascii_case(role)))
}

/// Cria o admin inicial a partir de ADMIN_EMAIL/ADMIN_PASSWORD se ainda não
/// existir nenhum admin na base.
pub async fn garantir_admin_inicial(db_pool: &SqlitePool) -> AppResult<()> {
    let admins: i64 =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM usuarios WHERE role = ?1")
            .bind(ROLE_ADMIN)
            .fetch_one(db_pool)
            .await?;
    if admins > 0 {
        return Ok(());
    }

    let (email, password) = match (std::env::var("ADMIN_EMAIL"), std::env::var("ADMIN_PASSWORD")) {
        (Ok(e), Ok(p)) if !e.trim().is_empty() && !p.is_empty() => (e, p),
        _ => {
            tracing::warn!(
                "⚠️ Nenhum admin existe e ADMIN_EMAIL/ADMIN_PASSWORD não estão definidos."
            );
            return Ok(());
        }
    };

    let id = Uuid::new_v4().to_string();
    let password_hash = auth_service::hash_password(&password).await?;
    sqlx::query(
        r#"
        INSERT INTO usuarios (id, email, password_hash, nome, role, status)
        VALUES (?1, ?2, ?3, 'Administrador', ?4, ?5)
        "#,
    )
    .bind(&id)
    .bind(email.trim())
    .bind(&password_hash)
    .bind(ROLE_ADMIN)
    .bind(STATUS_APROVADO)
    .execute(db_pool)
    .await?;
    tracing::info!("✅ Admin inicial criado ({}).", email.trim());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::notificacao_service;

    async fn pool_teste() -> SqlitePool {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        crate::db::MIGRATOR.run(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn registo_fica_pendente_ate_aprovacao() {
        let pool = pool_teste().await;
        let id = registar(&pool, "Maria Silva", "maria@teste.pt", "segredo1")
            .await
            .unwrap();

        // Conta pendente ainda não entra
        assert!(matches!(
            autenticar(&pool, "maria@teste.pt", "segredo1").await,
            Err(AppError::ContaPendente)
        ));

        aprovar_usuario(&pool, &id).await.unwrap();
        let user = autenticar(&pool, "maria@teste.pt", "segredo1").await.unwrap();
        assert_eq!(user.nome, "Maria Silva");
        assert!(!user.is_admin());

        // A aprovação deixa uma notificação por ler
        assert_eq!(notificacao_service::contar_nao_lidas(&pool, &id).await.unwrap(), 1);

        bloquear_usuario(&pool, &id).await.unwrap();
        assert!(matches!(
            autenticar(&pool, "maria@teste.pt", "segredo1").await,
            Err(AppError::ContaBloqueada)
        ));
    }

    #[tokio::test]
    async fn autenticar_rejeita_credenciais_invalidas() {
        let pool = pool_teste().await;
        let id = registar(&pool, "João", "joao@teste.pt", "segredo1").await.unwrap();
        aprovar_usuario(&pool, &id).await.unwrap();

        assert!(matches!(
            autenticar(&pool, "joao@teste.pt", "errada99").await,
            Err(AppError::InvalidCredentials)
        ));
        assert!(matches!(
            autenticar(&pool, "ninguem@teste.pt", "segredo1").await,
            Err(AppError::InvalidCredentials)
        ));

        // E-mail é comparado sem distinção de maiúsculas
        assert!(autenticar(&pool, "JOAO@teste.pt", "segredo1").await.is_ok());
    }

    #[tokio::test]
    async fn registo_valida_dados_e_email_duplicado() {
        let pool = pool_teste().await;
        assert!(matches!(
            registar(&pool, "", "a@b.pt", "segredo1").await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            registar(&pool, "Ana", "sem-arroba", "segredo1").await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            registar(&pool, "Ana", "ana@teste.pt", "curta").await,
            Err(AppError::Validation(_))
        ));

        registar(&pool, "Ana", "ana@teste.pt", "segredo1").await.unwrap();
        assert!(matches!(
            registar(&pool, "Outra Ana", "ana@teste.pt", "segredo1").await,
            Err(AppError::Validation(_))
        ));
    }
}
