// src/models/user.rs
use serde::Deserialize;
use sqlx::FromRow;

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_ALUNO: &str = "aluno";

pub const STATUS_PENDENTE: &str = "pendente";
pub const STATUS_APROVADO: &str = "aprovado";
pub const STATUS_BLOQUEADO: &str = "bloqueado";

// Representa um utilizador lido da tabela 'usuarios'
#[derive(Debug, Clone, FromRow)]
pub struct Usuario {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub nome: String,
    pub role: String,   // 'admin' | 'aluno'
    pub status: String, // 'pendente' | 'aprovado' | 'bloqueado'
    pub created_at: String,
}

impl Usuario {
    pub fn is_admin(&self) -> bool {
        self.role.eq_ignore_ascii_case(ROLE_ADMIN)
    }
}

/// Sessão de dispositivo: uma linha por cookie de sessão vivo.
/// O id da sessão fica só na tabela; nunca é exposto nas páginas.
#[derive(Debug, Clone, FromRow)]
pub struct UserSession {
    pub user_agent: String,
    pub last_seen: String,
}

// Struct para dados do formulário de login
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RegistoForm {
    pub nome: String,
    pub email: String,
    pub password: String,
}
