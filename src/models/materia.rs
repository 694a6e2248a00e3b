// src/models/materia.rs
use serde::Deserialize;
use sqlx::FromRow;

/// Linha enxuta para <select> de filtros e formulários; a descrição só
/// aparece no catálogo, via MateriaResumo.
#[derive(Debug, Clone, FromRow)]
pub struct Materia {
    pub id: String,
    pub nome: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct Assunto {
    pub id: String,
    pub materia_id: String,
    pub nome: String,
}

/// Matéria com contagens agregadas, para listagens.
#[derive(Debug, Clone, FromRow)]
pub struct MateriaResumo {
    pub id: String,
    pub nome: String,
    pub descricao: String,
    pub total_assuntos: i64,
    pub total_questoes: i64,
}

// --- Formulários ---

#[derive(Debug, Deserialize)]
pub struct MateriaForm {
    pub nome: String,
    #[serde(default)]
    pub descricao: String,
}

#[derive(Debug, Deserialize)]
pub struct AssuntoForm {
    pub materia_id: String,
    pub nome: String,
}
