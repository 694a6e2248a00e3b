// src/services/questao_service.rs
use crate::{
    error::{AppError, AppResult},
    models::questao::{
        Alternativa, Questao, QuestaoCompleta, QuestaoFiltro, QuestaoResumo, Tag,
        TIPO_CERTO_ERRADO, TIPO_MULTIPLA_ESCOLHA,
    },
};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;

pub const PAGINA_TAMANHO: i64 = 20;

/// Dados validados de uma questão nova (do formulário manual ou do parser).
#[derive(Debug, Clone)]
pub struct NovaQuestao {
    pub materia_id: String,
    pub assunto_id: Option<String>,
    pub tipo: String,
    pub enunciado: String,
    pub gabarito: String,
    pub banca: Option<String>,
    pub ano: Option<i64>,
    pub alternativas: Vec<(String, String)>, // (letra, texto)
    pub tags: Vec<String>,
}

impl NovaQuestao {
    /// Regras de coerência entre tipo, gabarito e alternativas.
    pub fn validar(&self) -> AppResult<()> {
        if self.enunciado.trim().is_empty() {
            return Err(AppError::Validation("O enunciado é obrigatório.".to_string()));
        }
        match self.tipo.as_str() {
            TIPO_CERTO_ERRADO => {
                if self.gabarito != "C" && self.gabarito != "E" {
                    return Err(AppError::Validation(
                        "Gabarito de certo/errado deve ser C ou E.".to_string(),
                    ));
                }
                if !self.alternativas.is_empty() {
                    return Err(AppError::Validation(
                        "Questão de certo/errado não tem alternativas.".to_string(),
                    ));
                }
            }
            TIPO_MULTIPLA_ESCOLHA => {
                if self.alternativas.len() < 2 {
                    return Err(AppError::Validation(
                        "Múltipla escolha exige pelo menos 2 alternativas.".to_string(),
                    ));
                }
                if !self
                    .alternativas
                    .iter()
                    .any(|(letra, _)| letra.eq_ignore_ascii_case(&self.gabarito))
                {
                    return Err(AppError::Validation(format!(
                        "O gabarito '{}' não corresponde a nenhuma alternativa.",
                        self.gabarito
                    )));
                }
            }
            outro => {
                return Err(AppError::Validation(format!("Tipo de questão inválido: '{}'.", outro)));
            }
        }
        Ok(())
    }
}

/// Cria a questão, as alternativas e os vínculos de tag numa única transação.
pub async fn create_questao(db_pool: &SqlitePool, nova: &NovaQuestao) -> AppResult<String> {
    nova.validar()?;

    let id = Uuid::new_v4().to_string();
    let mut tx = db_pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO questoes (id, materia_id, assunto_id, tipo, enunciado, gabarito, banca, ano)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(&id)
    .bind(&nova.materia_id)
    .bind(&nova.assunto_id)
    .bind(&nova.tipo)
    .bind(nova.enunciado.trim())
    .bind(nova.gabarito.to_uppercase())
    .bind(&nova.banca)
    .bind(nova.ano)
    .execute(&mut *tx)
    .await?;

    for (letra, texto) in &nova.alternativas {
        sqlx::query(
            "INSERT INTO alternativas (id, questao_id, letra, texto) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&id)
        .bind(letra.to_uppercase())
        .bind(texto.trim())
        .execute(&mut *tx)
        .await?;
    }

    vincular_tags(&mut tx, &id, &nova.tags).await?;

    tx.commit().await?;
    tracing::info!("✅ Questão {} criada ({}).", id, nova.tipo);
    Ok(id)
}

/// Atualiza uma questão existente. Alternativas e tags são substituídas
/// por inteiro, dentro da mesma transação.
pub async fn update_questao(db_pool: &SqlitePool, id: &str, nova: &NovaQuestao) -> AppResult<()> {
    nova.validar()?;

    let mut tx = db_pool.begin().await?;

    let rows = sqlx::query(
        r#"
        UPDATE questoes
        SET materia_id = ?1, assunto_id = ?2, tipo = ?3, enunciado = ?4,
            gabarito = ?5, banca = ?6, ano = ?7
        WHERE id = ?8
        "#,
    )
    .bind(&nova.materia_id)
    .bind(&nova.assunto_id)
    .bind(&nova.tipo)
    .bind(nova.enunciado.trim())
    .bind(nova.gabarito.to_uppercase())
    .bind(&nova.banca)
    .bind(nova.ano)
    .bind(id)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    if rows == 0 {
        tx.rollback().await?;
        return Err(AppError::NotFound("Questão".to_string()));
    }

    sqlx::query("DELETE FROM alternativas WHERE questao_id = ?1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    for (letra, texto) in &nova.alternativas {
        sqlx::query(
            "INSERT INTO alternativas (id, questao_id, letra, texto) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(id)
        .bind(letra.to_uppercase())
        .bind(texto.trim())
        .execute(&mut *tx)
        .await?;
    }

    sqlx::query("DELETE FROM questao_tags WHERE questao_id = ?1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    vincular_tags(&mut tx, id, &nova.tags).await?;

    tx.commit().await?;
    tracing::info!("Questão {} atualizada.", id);
    Ok(())
}

pub async fn delete_questao(db_pool: &SqlitePool, id: &str) -> AppResult<()> {
    // Alternativas, tags, comentários e reports caem por cascade
    let rows = sqlx::query("DELETE FROM questoes WHERE id = ?1")
        .bind(id)
        .execute(db_pool)
        .await?
        .rows_affected();
    if rows == 0 {
        return Err(AppError::NotFound("Questão".to_string()));
    }
    tracing::info!("Questão {} apagada.", id);
    Ok(())
}

/// Resolve nomes de tags em ids (criando as que faltam) e liga-as à questão.
async fn vincular_tags(
    tx: &mut sqlx::Transaction<'_, Sqlite>,
    questao_id: &str,
    tags: &[String],
) -> AppResult<()> {
    for nome in tags {
        let nome = nome.trim();
        if nome.is_empty() {
            continue;
        }
        let tag_id: Option<String> =
            sqlx::query_scalar::<_, String>("SELECT id FROM tags WHERE nome = ?1 COLLATE NOCASE")
                .bind(nome)
                .fetch_optional(&mut **tx)
                .await?;
        let tag_id = match tag_id {
            Some(id) => id,
            None => {
                let id = Uuid::new_v4().to_string();
                sqlx::query("INSERT INTO tags (id, nome) VALUES (?1, ?2)")
                    .bind(&id)
                    .bind(nome)
                    .execute(&mut **tx)
                    .await?;
                id
            }
        };
        sqlx::query("INSERT OR IGNORE INTO questao_tags (questao_id, tag_id) VALUES (?1, ?2)")
            .bind(questao_id)
            .bind(&tag_id)
            .execute(&mut **tx)
            .await?;
    }
    Ok(())
}

// --- Leitura ---

pub async fn find_questao_by_id(db_pool: &SqlitePool, id: &str) -> AppResult<Option<Questao>> {
    let questao = sqlx::query_as::<_, Questao>(
        r#"
        SELECT id, materia_id, assunto_id, tipo, enunciado, gabarito, banca, ano
        FROM questoes WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(db_pool)
    .await?;
    Ok(questao)
}

/// Questão com alternativas e tags carregadas.
pub async fn find_questao_completa(
    db_pool: &SqlitePool,
    id: &str,
) -> AppResult<Option<QuestaoCompleta>> {
    let Some(questao) = find_questao_by_id(db_pool, id).await? else {
        return Ok(None);
    };

    let alternativas = sqlx::query_as::<_, Alternativa>(
        r#"
        SELECT letra, texto
        FROM alternativas WHERE questao_id = ?1 ORDER BY letra ASC
        "#,
    )
    .bind(id)
    .fetch_all(db_pool)
    .await?;

    let tags = sqlx::query_as::<_, Tag>(
        r#"
        SELECT t.nome
        FROM tags t
        JOIN questao_tags qt ON qt.tag_id = t.id
        WHERE qt.questao_id = ?1
        ORDER BY t.nome ASC
        "#,
    )
    .bind(id)
    .fetch_all(db_pool)
    .await?;

    Ok(Some(QuestaoCompleta { questao, alternativas, tags }))
}

fn aplicar_filtro<'a>(builder: &mut QueryBuilder<'a, Sqlite>, filtro: &'a QuestaoFiltro) {
    if let Some(materia_id) = &filtro.materia_id {
        builder.push(" AND q.materia_id = ").push_bind(materia_id.as_str());
    }
    if let Some(assunto_id) = &filtro.assunto_id {
        builder.push(" AND q.assunto_id = ").push_bind(assunto_id.as_str());
    }
    if let Some(tipo) = &filtro.tipo {
        builder.push(" AND q.tipo = ").push_bind(tipo.as_str());
    }
    if let Some(tag) = &filtro.tag {
        builder
            .push(
                " AND EXISTS (SELECT 1 FROM questao_tags qt JOIN tags t ON t.id = qt.tag_id \
                 WHERE qt.questao_id = q.id AND t.nome = ",
            )
            .push_bind(tag.as_str())
            .push(" COLLATE NOCASE)");
    }
}

/// Listagem paginada para a página de questões.
pub async fn listar_questoes(
    db_pool: &SqlitePool,
    filtro: &QuestaoFiltro,
) -> AppResult<(Vec<QuestaoResumo>, i64)> {
    let pagina = filtro.pagina.unwrap_or(1).max(1);

    let mut count_builder: QueryBuilder<Sqlite> =
        QueryBuilder::new("SELECT COUNT(*) FROM questoes q WHERE 1=1");
    aplicar_filtro(&mut count_builder, filtro);
    let total: i64 = count_builder.build_query_scalar().fetch_one(db_pool).await?;

    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
        r#"
        SELECT q.id, q.tipo, q.enunciado, m.nome AS materia_nome,
               a.nome AS assunto_nome, q.banca, q.ano
        FROM questoes q
        JOIN materias m ON m.id = q.materia_id
        LEFT JOIN assuntos a ON a.id = q.assunto_id
        WHERE 1=1
        "#,
    );
    aplicar_filtro(&mut builder, filtro);
    builder
        .push(" ORDER BY q.created_at DESC LIMIT ")
        .push_bind(PAGINA_TAMANHO)
        .push(" OFFSET ")
        .push_bind((pagina - 1) * PAGINA_TAMANHO);

    let questoes = builder.build_query_as::<QuestaoResumo>().fetch_all(db_pool).await?;
    Ok((questoes, total))
}

/// IDs de questões que satisfazem o filtro, para montar uma sessão de estudo.
pub async fn selecionar_ids(
    db_pool: &SqlitePool,
    filtro: &QuestaoFiltro,
    limite: i64,
) -> AppResult<Vec<String>> {
    let mut builder: QueryBuilder<Sqlite> =
        QueryBuilder::new("SELECT q.id FROM questoes q WHERE 1=1");
    aplicar_filtro(&mut builder, filtro);
    builder.push(" ORDER BY q.created_at DESC LIMIT ").push_bind(limite.max(1));

    let ids = builder.build_query_scalar::<String>().fetch_all(db_pool).await?;
    Ok(ids)
}

pub async fn find_all_tags(db_pool: &SqlitePool) -> AppResult<Vec<Tag>> {
    let tags = sqlx::query_as::<_, Tag>("SELECT nome FROM tags ORDER BY nome ASC")
        .fetch_all(db_pool)
        .await?;
    Ok(tags)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> NovaQuestao {
        NovaQuestao {
            materia_id: "m1".into(),
            assunto_id: None,
            tipo: TIPO_CERTO_ERRADO.into(),
            enunciado: "Julgue o item.".into(),
            gabarito: "C".into(),
            banca: None,
            ano: None,
            alternativas: vec![],
            tags: vec![],
        }
    }

    #[test]
    fn certo_errado_valido() {
        assert!(base().validar().is_ok());
    }

    #[test]
    fn certo_errado_recusa_gabarito_de_letra() {
        let mut q = base();
        q.gabarito = "B".into();
        assert!(q.validar().is_err());
    }

    #[test]
    fn multipla_exige_gabarito_entre_alternativas() {
        let mut q = base();
        q.tipo = TIPO_MULTIPLA_ESCOLHA.into();
        q.alternativas = vec![("A".into(), "um".into()), ("B".into(), "dois".into())];
        q.gabarito = "D".into();
        assert!(q.validar().is_err());
        q.gabarito = "b".into();
        assert!(q.validar().is_ok());
    }

    #[test]
    fn multipla_exige_duas_alternativas() {
        let mut q = base();
        q.tipo = TIPO_MULTIPLA_ESCOLHA.into();
        q.alternativas = vec![("A".into(), "um".into())];
        q.gabarito = "A".into();
        assert!(q.validar().is_err());
    }
}
