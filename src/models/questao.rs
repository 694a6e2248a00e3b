// src/models/questao.rs
use serde::Deserialize;
use sqlx::FromRow;

pub const TIPO_CERTO_ERRADO: &str = "certo_errado";
pub const TIPO_MULTIPLA_ESCOLHA: &str = "multipla_escolha";

#[derive(Debug, Clone, FromRow)]
pub struct Questao {
    pub id: String,
    pub materia_id: String,
    pub assunto_id: Option<String>,
    pub tipo: String, // 'certo_errado' | 'multipla_escolha'
    pub enunciado: String,
    pub gabarito: String, // 'C'/'E' ou 'A'..'E'
    pub banca: Option<String>,
    pub ano: Option<i64>,
}

impl Questao {
    pub fn is_certo_errado(&self) -> bool {
        self.tipo == TIPO_CERTO_ERRADO
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct Alternativa {
    pub letra: String,
    pub texto: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct Tag {
    pub nome: String,
}

/// Linha da listagem de questões (JOIN com matéria/assunto).
#[derive(Debug, Clone, FromRow)]
pub struct QuestaoResumo {
    pub id: String,
    pub tipo: String,
    pub enunciado: String,
    pub materia_nome: String,
    pub assunto_nome: Option<String>,
    pub banca: Option<String>,
    pub ano: Option<i64>,
}

/// Questão completa, com alternativas e tags já carregadas.
#[derive(Debug, Clone)]
pub struct QuestaoCompleta {
    pub questao: Questao,
    pub alternativas: Vec<Alternativa>,
    pub tags: Vec<Tag>,
}

// --- Filtro de pesquisa / seleção de questões ---

/// Filtro partilhado entre a listagem e o modo estudo.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuestaoFiltro {
    pub materia_id: Option<String>,
    pub assunto_id: Option<String>,
    pub tipo: Option<String>,
    pub tag: Option<String>,
    pub pagina: Option<i64>,
}

impl QuestaoFiltro {
    /// Normaliza campos vazios vindos de <select> sem escolha.
    pub fn normalizado(mut self) -> Self {
        let limpa = |v: &mut Option<String>| {
            if v.as_deref().map_or(false, |s| s.trim().is_empty()) {
                *v = None;
            }
        };
        limpa(&mut self.materia_id);
        limpa(&mut self.assunto_id);
        limpa(&mut self.tipo);
        limpa(&mut self.tag);
        self
    }
}

// --- Formulários de administração ---

/// Criação/edição manual de uma questão. As alternativas vêm em campos fixos
/// (alt_a..alt_e) e as tags numa única string separada por vírgulas.
#[derive(Debug, Deserialize)]
pub struct QuestaoForm {
    pub materia_id: String,
    #[serde(default)]
    pub assunto_id: String,
    pub tipo: String,
    pub enunciado: String,
    pub gabarito: String,
    #[serde(default)]
    pub banca: String,
    #[serde(default)]
    pub ano: String,
    #[serde(default)]
    pub alt_a: String,
    #[serde(default)]
    pub alt_b: String,
    #[serde(default)]
    pub alt_c: String,
    #[serde(default)]
    pub alt_d: String,
    #[serde(default)]
    pub alt_e: String,
    #[serde(default)]
    pub tags: String,
}

impl QuestaoForm {
    /// Pares (letra, texto) das alternativas preenchidas, pela ordem A..E.
    pub fn alternativas(&self) -> Vec<(&'static str, &str)> {
        [
            ("A", self.alt_a.trim()),
            ("B", self.alt_b.trim()),
            ("C", self.alt_c.trim()),
            ("D", self.alt_d.trim()),
            ("E", self.alt_e.trim()),
        ]
        .into_iter()
        .filter(|(_, t)| !t.is_empty())
        .collect()
    }

    pub fn tags_lista(&self) -> Vec<String> {
        self.tags
            .split(',')
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect()
    }
}

#[derive(Debug, Deserialize)]
pub struct ImportForm {
    pub materia_id: String,
    #[serde(default)]
    pub assunto_id: String,
    pub texto: String,
}
