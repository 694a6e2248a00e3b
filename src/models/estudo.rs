// src/models/estudo.rs
use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Linha da tabela 'progresso_sessao'. A lista de questões vive na coluna
/// questao_ids como JSON; no máximo uma sessão retomável por utilizador.
#[derive(Debug, Clone, FromRow)]
pub struct ProgressoSessao {
    pub user_id: String,
    pub questao_ids: String, // JSON: ["id1", "id2", ...]
    pub respostas: String,   // JSON: Vec<RespostaRegistro>
    pub indice_atual: i64,
    pub acertos: i64,
    pub erros: i64,
    pub tempo_segundos: i64,
    pub descricao_filtro: String,
}

impl ProgressoSessao {
    pub fn ids(&self) -> AppResult<Vec<String>> {
        serde_json::from_str(&self.questao_ids).map_err(|e| {
            tracing::error!("questao_ids corrompido para user {}: {}", self.user_id, e);
            AppError::InternalServerError
        })
    }

    pub fn total(&self) -> AppResult<i64> {
        Ok(self.ids()?.len() as i64)
    }

    /// Sessão completa: o índice já passou da última questão.
    pub fn concluida(&self) -> AppResult<bool> {
        Ok(self.indice_atual >= self.total()?)
    }

    pub fn respostas_lista(&self) -> AppResult<Vec<RespostaRegistro>> {
        serde_json::from_str(&self.respostas).map_err(|e| {
            tracing::error!("respostas corrompidas para user {}: {}", self.user_id, e);
            AppError::InternalServerError
        })
    }
}

/// Uma resposta já dada dentro da sessão em curso. Vive no JSON da coluna
/// 'respostas' e vira linha de historico_respostas ao finalizar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RespostaRegistro {
    pub questao_id: String,
    pub resposta: String,
    pub correta: bool,
    pub tempo_segundos: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct HistoricoEstudo {
    pub id: String,
    pub descricao_filtro: String,
    pub total_questoes: i64,
    pub acertos: i64,
    pub erros: i64,
    pub tempo_segundos: i64,
    pub finalizado_em: String,
}

impl HistoricoEstudo {
    pub fn respondidas(&self) -> i64 {
        self.acertos + self.erros
    }

    pub fn percentual(&self) -> i64 {
        percentual(self.acertos, self.respondidas())
    }

    /// Nota líquida ao estilo Cebraspe: certas menos erradas.
    pub fn nota_liquida(&self) -> i64 {
        self.acertos - self.erros
    }
}

/// Resposta gravada no histórico, com o enunciado da questão quando esta
/// ainda existe.
#[derive(Debug, Clone, FromRow)]
pub struct HistoricoRespostaDetalhe {
    pub resposta: String,
    pub correta: bool,
    pub tempo_segundos: i64,
    pub enunciado: Option<String>,
}

/// Estatísticas agregadas para o dashboard.
#[derive(Debug, Clone, Default)]
pub struct EstatisticasUsuario {
    pub sessoes: i64,
    pub respondidas: i64,
    pub acertos: i64,
    pub erros: i64,
    pub tempo_segundos: i64,
    pub por_materia: Vec<MateriaEstatistica>,
}

impl EstatisticasUsuario {
    pub fn percentual(&self) -> i64 {
        percentual(self.acertos, self.respondidas)
    }

    pub fn nota_liquida(&self) -> i64 {
        self.acertos - self.erros
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct MateriaEstatistica {
    pub materia_nome: String,
    pub respondidas: i64,
    pub acertos: i64,
}

impl MateriaEstatistica {
    pub fn percentual(&self) -> i64 {
        percentual(self.acertos, self.respondidas)
    }
}

pub fn percentual(parte: i64, total: i64) -> i64 {
    if total <= 0 {
        0
    } else {
        (parte * 100) / total
    }
}

// --- Formulários do modo estudo ---

#[derive(Debug, Deserialize)]
pub struct IniciarSessaoForm {
    #[serde(default)]
    pub materia_id: String,
    #[serde(default)]
    pub assunto_id: String,
    #[serde(default)]
    pub tipo: String,
    #[serde(default)]
    pub tag: String,
    #[serde(default)]
    pub limite: String,
}

#[derive(Debug, Deserialize)]
pub struct ResponderForm {
    /// Índice da questão a que esta resposta se refere (guarda contra re-submit).
    pub indice: i64,
    pub resposta: String,
    #[serde(default)]
    pub tempo_segundos: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn progresso(ids: &[&str], indice: i64) -> ProgressoSessao {
        ProgressoSessao {
            user_id: "u1".into(),
            questao_ids: serde_json::to_string(ids).unwrap(),
            respostas: "[]".into(),
            indice_atual: indice,
            acertos: 0,
            erros: 0,
            tempo_segundos: 0,
            descricao_filtro: String::new(),
        }
    }

    #[test]
    fn progresso_ids_roundtrip() {
        let p = progresso(&["a", "b", "c"], 1);
        assert_eq!(p.ids().unwrap(), vec!["a", "b", "c"]);
        assert_eq!(p.total().unwrap(), 3);
        assert!(!p.concluida().unwrap());
    }

    #[test]
    fn progresso_concluida_no_fim() {
        let p = progresso(&["a", "b"], 2);
        assert!(p.concluida().unwrap());
    }

    #[test]
    fn progresso_json_corrompido_e_erro() {
        let mut p = progresso(&["a"], 0);
        p.questao_ids = "not json".into();
        assert!(p.ids().is_err());
    }

    #[test]
    fn percentual_arredonda_para_baixo_e_tolera_zero() {
        assert_eq!(percentual(2, 3), 66);
        assert_eq!(percentual(0, 0), 0);
        assert_eq!(percentual(5, 5), 100);
    }

    #[test]
    fn nota_liquida_desconta_erradas() {
        let h = HistoricoEstudo {
            id: "h".into(),
            descricao_filtro: String::new(),
            total_questoes: 10,
            acertos: 7,
            erros: 3,
            tempo_segundos: 0,
            finalizado_em: String::new(),
        };
        assert_eq!(h.nota_liquida(), 4);
        assert_eq!(h.percentual(), 70);
    }
}
