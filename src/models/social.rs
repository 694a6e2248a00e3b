// src/models/social.rs
use serde::Deserialize;
use sqlx::FromRow;

pub const REPORT_ABERTO: &str = "aberto";
pub const REPORT_RESOLVIDO: &str = "resolvido";

/// Comentário com o nome do autor, para exibição.
#[derive(Debug, Clone, FromRow)]
pub struct ComentarioExibicao {
    pub id: String,
    pub user_id: String,
    pub autor: String,
    pub texto: String,
    pub created_at: String,
}

/// Report com contexto (autor + início do enunciado), para o painel admin.
#[derive(Debug, Clone, FromRow)]
pub struct ReportExibicao {
    pub id: String,
    pub questao_id: String,
    pub autor: String,
    pub motivo: String,
    pub enunciado: String,
    pub created_at: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct Notificacao {
    pub id: String,
    pub mensagem: String,
    pub lida: bool,
    pub created_at: String,
}

// --- Formulários ---

#[derive(Debug, Deserialize)]
pub struct ComentarioForm {
    pub texto: String,
}

#[derive(Debug, Deserialize)]
pub struct ReportForm {
    pub motivo: String,
}

#[derive(Debug, Deserialize)]
pub struct ResolverReportForm {
    #[serde(default)]
    pub resposta: String,
}
