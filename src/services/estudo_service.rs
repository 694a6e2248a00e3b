// src/services/estudo_service.rs
//
// Motor do modo estudo: monta a lista de questões, avança uma a uma,
// persiste o progresso retomável a cada resposta e fecha a sessão no
// histórico. A base é a autoridade; não há estado em memória.
use crate::{
    error::{AppError, AppResult},
    models::{
        estudo::{
            EstatisticasUsuario, HistoricoEstudo, HistoricoRespostaDetalhe, MateriaEstatistica,
            ProgressoSessao, RespostaRegistro,
        },
        questao::{QuestaoCompleta, QuestaoFiltro},
    },
    services::questao_service,
};
use chrono::Local;
use rand::seq::SliceRandom;
use sqlx::SqlitePool;
use uuid::Uuid;

pub const LIMITE_PADRAO: i64 = 20;
pub const LIMITE_MAXIMO: i64 = 120;

/// Resultado de uma resposta aceite.
#[derive(Debug, Clone)]
pub struct RespostaAvaliada {
    pub correta: bool,
    pub gabarito: String,
}

/// Cria (ou substitui) a sessão retomável do utilizador a partir do filtro.
/// A ordem das questões é baralhada uma única vez, no arranque.
pub async fn iniciar_sessao(
    db_pool: &SqlitePool,
    user_id: &str,
    filtro: &QuestaoFiltro,
    limite: i64,
    descricao: &str,
) -> AppResult<i64> {
    let limite = limite.clamp(1, LIMITE_MAXIMO);
    let mut ids = questao_service::selecionar_ids(db_pool, filtro, limite).await?;
    if ids.is_empty() {
        return Err(AppError::Validation(
            "Nenhuma questão corresponde ao filtro escolhido.".to_string(),
        ));
    }
    ids.shuffle(&mut rand::thread_rng());

    let questao_ids = serde_json::to_string(&ids).map_err(|e| {
        tracing::error!("Falha ao serializar questao_ids: {}", e);
        AppError::InternalServerError
    })?;
    let now = Local::now().to_rfc3339();

    // Uma sessão por utilizador: INSERT OR REPLACE descarta a anterior
    sqlx::query(
        r#"
        INSERT OR REPLACE INTO progresso_sessao
            (user_id, questao_ids, respostas, indice_atual, acertos, erros,
             tempo_segundos, descricao_filtro, updated_at)
        VALUES (?1, ?2, '[]', 0, 0, 0, 0, ?3, ?4)
        "#,
    )
    .bind(user_id)
    .bind(&questao_ids)
    .bind(descricao)
    .bind(&now)
    .execute(db_pool)
    .await?;

    tracing::info!("▶️ Sessão iniciada para {} com {} questões.", user_id, ids.len());
    Ok(ids.len() as i64)
}

pub async fn obter_progresso(
    db_pool: &SqlitePool,
    user_id: &str,
) -> AppResult<Option<ProgressoSessao>> {
    let progresso = sqlx::query_as::<_, ProgressoSessao>(
        r#"
        SELECT user_id, questao_ids, respostas, indice_atual, acertos, erros,
               tempo_segundos, descricao_filtro
        FROM progresso_sessao
        WHERE user_id = ?1
        "#,
    )
    .bind(user_id)
    .fetch_optional(db_pool)
    .await?;
    Ok(progresso)
}

/// Questão apontada pelo índice atual, já com alternativas e tags.
/// Questões entretanto apagadas são removidas da lista sem penalizar o
/// aluno; devolve None quando a sessão chega ao fim.
pub async fn questao_atual(
    db_pool: &SqlitePool,
    progresso: &ProgressoSessao,
) -> AppResult<Option<(ProgressoSessao, QuestaoCompleta)>> {
    let mut progresso = progresso.clone();
    loop {
        let ids = progresso.ids()?;
        let indice = progresso.indice_atual as usize;
        let Some(questao_id) = ids.get(indice) else {
            return Ok(None);
        };

        match questao_service::find_questao_completa(db_pool, questao_id).await? {
            Some(completa) => return Ok(Some((progresso, completa))),
            None => {
                // Questão apagada depois do início da sessão: encolhe a lista
                tracing::warn!(
                    "Questão {} da sessão de {} já não existe; removendo.",
                    questao_id,
                    progresso.user_id
                );
                let restantes: Vec<String> =
                    ids.iter().filter(|id| *id != questao_id).cloned().collect();
                if restantes.is_empty() {
                    return Ok(None);
                }
                progresso.questao_ids = serde_json::to_string(&restantes)
                    .map_err(|_| AppError::InternalServerError)?;
                gravar_progresso(db_pool, &progresso).await?;
            }
        }
    }
}

/// Avalia a resposta do índice indicado e avança a sessão.
/// Um re-submit de um índice já avançado devolve None e não conta duas vezes.
pub async fn responder(
    db_pool: &SqlitePool,
    user_id: &str,
    indice: i64,
    resposta: &str,
    tempo_segundos: i64,
) -> AppResult<Option<RespostaAvaliada>> {
    let Some(mut progresso) = obter_progresso(db_pool, user_id).await? else {
        return Err(AppError::NotFound("Sessão de estudo".to_string()));
    };

    if indice != progresso.indice_atual {
        tracing::debug!(
            "Resposta ignorada para {}: índice {} != atual {}.",
            user_id,
            indice,
            progresso.indice_atual
        );
        return Ok(None);
    }
    if progresso.concluida()? {
        return Err(AppError::Validation("A sessão já terminou.".to_string()));
    }

    let ids = progresso.ids()?;
    let questao_id = ids[progresso.indice_atual as usize].clone();
    let questao = questao_service::find_questao_by_id(db_pool, &questao_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Questão".to_string()))?;

    let resposta_norm = normalizar_resposta(resposta, questao.is_certo_errado())?;
    let correta = resposta_norm.eq_ignore_ascii_case(&questao.gabarito);

    let mut respostas = progresso.respostas_lista()?;
    respostas.push(RespostaRegistro {
        questao_id,
        resposta: resposta_norm,
        correta,
        tempo_segundos: tempo_segundos.max(0),
    });
    progresso.respostas =
        serde_json::to_string(&respostas).map_err(|_| AppError::InternalServerError)?;
    progresso.indice_atual += 1;
    if correta {
        progresso.acertos += 1;
    } else {
        progresso.erros += 1;
    }
    progresso.tempo_segundos += tempo_segundos.max(0);

    gravar_progresso(db_pool, &progresso).await?;

    Ok(Some(RespostaAvaliada { correta, gabarito: questao.gabarito }))
}

fn normalizar_resposta(resposta: &str, certo_errado: bool) -> AppResult<String> {
    let r = resposta.trim().to_uppercase();
    if certo_errado {
        match r.as_str() {
            "C" | "CERTO" => Ok("C".to_string()),
            "E" | "ERRADO" => Ok("E".to_string()),
            _ => Err(AppError::Validation("Responda Certo ou Errado.".to_string())),
        }
    } else {
        match r.as_str() {
            "A" | "B" | "C" | "D" | "E" => Ok(r),
            _ => Err(AppError::Validation("Escolha uma alternativa.".to_string())),
        }
    }
}

async fn gravar_progresso(db_pool: &SqlitePool, progresso: &ProgressoSessao) -> AppResult<()> {
    let now = Local::now().to_rfc3339();
    sqlx::query(
        r#"
        UPDATE progresso_sessao
        SET questao_ids = ?1, respostas = ?2, indice_atual = ?3, acertos = ?4,
            erros = ?5, tempo_segundos = ?6, updated_at = ?7
        WHERE user_id = ?8
        "#,
    )
    .bind(&progresso.questao_ids)
    .bind(&progresso.respostas)
    .bind(progresso.indice_atual)
    .bind(progresso.acertos)
    .bind(progresso.erros)
    .bind(progresso.tempo_segundos)
    .bind(&now)
    .bind(&progresso.user_id)
    .execute(db_pool)
    .await?;
    Ok(())
}

/// Fecha a sessão: grava o resumo e as respostas detalhadas numa transação
/// e apaga o progresso. Pode ser chamada antes do fim (sessão parcial).
pub async fn finalizar(db_pool: &SqlitePool, user_id: &str) -> AppResult<String> {
    let Some(progresso) = obter_progresso(db_pool, user_id).await? else {
        return Err(AppError::NotFound("Sessão de estudo".to_string()));
    };
    let respostas = progresso.respostas_lista()?;
    if respostas.is_empty() {
        // Nada respondido: só descarta
        abandonar(db_pool, user_id).await?;
        return Err(AppError::Validation(
            "A sessão foi descartada: nenhuma questão respondida.".to_string(),
        ));
    }

    let historico_id = Uuid::new_v4().to_string();
    let now = Local::now().to_rfc3339();
    let total = progresso.total()?;

    let mut tx = db_pool.begin().await?;
    sqlx::query(
        r#"
        INSERT INTO historico_estudos
            (id, user_id, descricao_filtro, total_questoes, acertos, erros,
             tempo_segundos, finalizado_em)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(&historico_id)
    .bind(user_id)
    .bind(&progresso.descricao_filtro)
    .bind(total)
    .bind(progresso.acertos)
    .bind(progresso.erros)
    .bind(progresso.tempo_segundos)
    .bind(&now)
    .execute(&mut *tx)
    .await?;

    for registro in &respostas {
        sqlx::query(
            r#"
            INSERT INTO historico_respostas
                (id, historico_id, questao_id, resposta, correta, tempo_segundos)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&historico_id)
        .bind(&registro.questao_id)
        .bind(&registro.resposta)
        .bind(registro.correta)
        .bind(registro.tempo_segundos)
        .execute(&mut *tx)
        .await?;
    }

    sqlx::query("DELETE FROM progresso_sessao WHERE user_id = ?1")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    tracing::info!(
        "🏁 Sessão de {} finalizada: {}/{} acertos.",
        user_id,
        progresso.acertos,
        respostas.len()
    );
    Ok(historico_id)
}

/// Descarta a sessão em curso sem registar histórico.
pub async fn abandonar(db_pool: &SqlitePool, user_id: &str) -> AppResult<()> {
    sqlx::query("DELETE FROM progresso_sessao WHERE user_id = ?1")
        .bind(user_id)
        .execute(db_pool)
        .await?;
    tracing::info!("Sessão de {} abandonada.", user_id);
    Ok(())
}

// --- Histórico e estatísticas ---

pub async fn find_historicos(
    db_pool: &SqlitePool,
    user_id: &str,
) -> AppResult<Vec<HistoricoEstudo>> {
    let historicos = sqlx::query_as::<_, HistoricoEstudo>(
        r#"
        SELECT id, descricao_filtro, total_questoes, acertos, erros,
               tempo_segundos, finalizado_em
        FROM historico_estudos
        WHERE user_id = ?1
        ORDER BY finalizado_em DESC
        LIMIT 50
        "#,
    )
    .bind(user_id)
    .fetch_all(db_pool)
    .await?;
    Ok(historicos)
}

/// Busca um resultado do próprio utilizador (dono verificado na query).
pub async fn find_historico(
    db_pool: &SqlitePool,
    historico_id: &str,
    user_id: &str,
) -> AppResult<Option<HistoricoEstudo>> {
    let historico = sqlx::query_as::<_, HistoricoEstudo>(
        r#"
        SELECT id, descricao_filtro, total_questoes, acertos, erros,
               tempo_segundos, finalizado_em
        FROM historico_estudos
        WHERE id = ?1 AND user_id = ?2
        "#,
    )
    .bind(historico_id)
    .bind(user_id)
    .fetch_optional(db_pool)
    .await?;
    Ok(historico)
}

/// Respostas detalhadas de um resultado, pela ordem em que foram dadas.
/// O enunciado vem a None quando a questão entretanto foi apagada.
pub async fn find_respostas(
    db_pool: &SqlitePool,
    historico_id: &str,
) -> AppResult<Vec<HistoricoRespostaDetalhe>> {
    let respostas = sqlx::query_as::<_, HistoricoRespostaDetalhe>(
        r#"
        SELECT hr.resposta, hr.correta, hr.tempo_segundos, q.enunciado
        FROM historico_respostas hr
        LEFT JOIN questoes q ON q.id = hr.questao_id
        WHERE hr.historico_id = ?1
        ORDER BY hr.rowid ASC
        "#,
    )
    .bind(historico_id)
    .fetch_all(db_pool)
    .await?;
    Ok(respostas)
}

pub async fn estatisticas(db_pool: &SqlitePool, user_id: &str) -> AppResult<EstatisticasUsuario> {
    let linha: Option<(i64, i64, i64, i64)> = sqlx::query_as(
        r#"
        SELECT COUNT(*), COALESCE(SUM(acertos), 0), COALESCE(SUM(erros), 0),
               COALESCE(SUM(tempo_segundos), 0)
        FROM historico_estudos
        WHERE user_id = ?1
        "#,
    )
    .bind(user_id)
    .fetch_optional(db_pool)
    .await?;
    let (sessoes, acertos, erros, tempo_segundos) = linha.unwrap_or_default();

    let por_materia = sqlx::query_as::<_, MateriaEstatistica>(
        r#"
        SELECT m.nome AS materia_nome,
               COUNT(*) AS respondidas,
               SUM(CASE WHEN hr.correta THEN 1 ELSE 0 END) AS acertos
        FROM historico_respostas hr
        JOIN historico_estudos h ON h.id = hr.historico_id
        JOIN questoes q ON q.id = hr.questao_id
        JOIN materias m ON m.id = q.materia_id
        WHERE h.user_id = ?1
        GROUP BY m.id
        ORDER BY respondidas DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(db_pool)
    .await?;

    Ok(EstatisticasUsuario {
        sessoes,
        respondidas: acertos + erros,
        acertos,
        erros,
        tempo_segundos,
        por_materia,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizar_certo_errado_aceita_extensos() {
        assert_eq!(normalizar_resposta("certo", true).unwrap(), "C");
        assert_eq!(normalizar_resposta(" ERRADO ", true).unwrap(), "E");
        assert!(normalizar_resposta("A", true).is_err());
    }

    #[test]
    fn normalizar_multipla_aceita_letras() {
        assert_eq!(normalizar_resposta("b", false).unwrap(), "B");
        assert!(normalizar_resposta("F", false).is_err());
        assert!(normalizar_resposta("", false).is_err());
    }

    use crate::{
        models::questao::{TIPO_CERTO_ERRADO, TIPO_MULTIPLA_ESCOLHA},
        services::{materia_service, questao_service::NovaQuestao},
    };

    async fn pool_teste() -> SqlitePool {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        crate::db::MIGRATOR.run(&pool).await.unwrap();
        pool
    }

    async fn semear_usuario(pool: &SqlitePool, id: &str) {
        sqlx::query(
            r#"
            INSERT INTO usuarios (id, email, password_hash, nome, role, status)
            VALUES (?1, ?2, 'hash', 'Aluno Teste', 'aluno', 'aprovado')
            "#,
        )
        .bind(id)
        .bind(format!("{}@teste.pt", id))
        .execute(pool)
        .await
        .unwrap();
    }

    fn questao_ce(materia_id: &str, enunciado: &str, gabarito: &str) -> NovaQuestao {
        NovaQuestao {
            materia_id: materia_id.to_string(),
            assunto_id: None,
            tipo: TIPO_CERTO_ERRADO.to_string(),
            enunciado: enunciado.to_string(),
            gabarito: gabarito.to_string(),
            banca: None,
            ano: None,
            alternativas: vec![],
            tags: vec![],
        }
    }

    fn questao_me(materia_id: &str, enunciado: &str, gabarito: &str) -> NovaQuestao {
        NovaQuestao {
            materia_id: materia_id.to_string(),
            assunto_id: None,
            tipo: TIPO_MULTIPLA_ESCOLHA.to_string(),
            enunciado: enunciado.to_string(),
            gabarito: gabarito.to_string(),
            banca: None,
            ano: None,
            alternativas: vec![
                ("A".to_string(), "primeira".to_string()),
                ("B".to_string(), "segunda".to_string()),
                ("C".to_string(), "terceira".to_string()),
            ],
            tags: vec![],
        }
    }

    #[tokio::test]
    async fn fluxo_de_sessao_completo() {
        let pool = pool_teste().await;
        semear_usuario(&pool, "u1").await;
        let materia_id = materia_service::create_materia(&pool, "Direito Penal", "")
            .await
            .unwrap();
        for i in 0..3 {
            questao_service::create_questao(&pool, &questao_ce(&materia_id, &format!("Item {}", i), "C"))
                .await
                .unwrap();
        }

        let filtro = QuestaoFiltro::default();
        let total = iniciar_sessao(&pool, "u1", &filtro, 10, "Direito Penal").await.unwrap();
        assert_eq!(total, 3);

        // Responde as três: duas certas, a última errada
        for indice in 0..3i64 {
            let progresso = obter_progresso(&pool, "u1").await.unwrap().unwrap();
            let (progresso, _completa) =
                questao_atual(&pool, &progresso).await.unwrap().unwrap();
            assert_eq!(progresso.indice_atual, indice);
            assert_eq!(progresso.acertos + progresso.erros, indice);

            let resposta = if indice == 2 { "E" } else { "Certo" };
            let avaliada = responder(&pool, "u1", indice, resposta, 5)
                .await
                .unwrap()
                .unwrap();
            assert_eq!(avaliada.correta, indice != 2);
            assert_eq!(avaliada.gabarito, "C");
        }

        // Re-submit de um índice já avançado não conta duas vezes
        assert!(responder(&pool, "u1", 1, "C", 5).await.unwrap().is_none());

        let historico_id = finalizar(&pool, "u1").await.unwrap();
        let historico = find_historico(&pool, &historico_id, "u1").await.unwrap().unwrap();
        assert_eq!(historico.total_questoes, 3);
        assert_eq!(historico.acertos, 2);
        assert_eq!(historico.erros, 1);
        assert_eq!(historico.tempo_segundos, 15);
        assert_eq!(historico.nota_liquida(), 1);
        assert!(obter_progresso(&pool, "u1").await.unwrap().is_none());

        let respostas = find_respostas(&pool, &historico_id).await.unwrap();
        assert_eq!(respostas.len(), 3);
        assert!(respostas[0].correta);
        assert!(!respostas[2].correta);
        assert_eq!(respostas[2].resposta, "E");
        assert!(respostas[0].enunciado.is_some());

        // Outro utilizador não vê este resultado
        semear_usuario(&pool, "u2").await;
        assert!(find_historico(&pool, &historico_id, "u2").await.unwrap().is_none());

        let stats = estatisticas(&pool, "u1").await.unwrap();
        assert_eq!(stats.sessoes, 1);
        assert_eq!(stats.respondidas, 3);
        assert_eq!(stats.acertos, 2);
        assert_eq!(stats.por_materia.len(), 1);
        assert_eq!(stats.por_materia[0].materia_nome, "Direito Penal");
    }

    #[tokio::test]
    async fn sessao_multipla_escolha_compara_letra_com_gabarito() {
        let pool = pool_teste().await;
        semear_usuario(&pool, "u1").await;
        let materia_id = materia_service::create_materia(&pool, "Informática", "").await.unwrap();
        questao_service::create_questao(&pool, &questao_me(&materia_id, "Qual delas?", "B"))
            .await
            .unwrap();
        questao_service::create_questao(&pool, &questao_me(&materia_id, "E agora?", "C"))
            .await
            .unwrap();
        iniciar_sessao(&pool, "u1", &QuestaoFiltro::default(), 10, "").await.unwrap();

        // Letra fora de A..E é recusada e não avança a sessão
        assert!(matches!(
            responder(&pool, "u1", 0, "X", 5).await,
            Err(AppError::Validation(_))
        ));
        let progresso = obter_progresso(&pool, "u1").await.unwrap().unwrap();
        assert_eq!(progresso.indice_atual, 0);

        // Primeira questão: letra do gabarito em minúscula conta como acerto
        let (_, completa) = questao_atual(&pool, &progresso).await.unwrap().unwrap();
        assert_eq!(completa.alternativas.len(), 3);
        let certa = completa.questao.gabarito.to_lowercase();
        let avaliada = responder(&pool, "u1", 0, &certa, 5).await.unwrap().unwrap();
        assert!(avaliada.correta);
        assert_eq!(avaliada.gabarito, completa.questao.gabarito);

        // Segunda questão: letra diferente do gabarito conta como erro
        let progresso = obter_progresso(&pool, "u1").await.unwrap().unwrap();
        let (_, completa) = questao_atual(&pool, &progresso).await.unwrap().unwrap();
        let errada = if completa.questao.gabarito == "A" { "B" } else { "A" };
        let avaliada = responder(&pool, "u1", 1, errada, 5).await.unwrap().unwrap();
        assert!(!avaliada.correta);

        let historico_id = finalizar(&pool, "u1").await.unwrap();
        let historico = find_historico(&pool, &historico_id, "u1").await.unwrap().unwrap();
        assert_eq!(historico.acertos, 1);
        assert_eq!(historico.erros, 1);
        assert_eq!(historico.nota_liquida(), 0);
    }

    #[tokio::test]
    async fn questao_apagada_sai_da_sessao_sem_penalizar() {
        let pool = pool_teste().await;
        semear_usuario(&pool, "u1").await;
        let materia_id = materia_service::create_materia(&pool, "Português", "").await.unwrap();
        for i in 0..2 {
            questao_service::create_questao(&pool, &questao_ce(&materia_id, &format!("Item {}", i), "E"))
                .await
                .unwrap();
        }
        iniciar_sessao(&pool, "u1", &QuestaoFiltro::default(), 10, "").await.unwrap();

        let progresso = obter_progresso(&pool, "u1").await.unwrap().unwrap();
        let (_, atual) = questao_atual(&pool, &progresso).await.unwrap().unwrap();
        questao_service::delete_questao(&pool, &atual.questao.id).await.unwrap();

        let progresso = obter_progresso(&pool, "u1").await.unwrap().unwrap();
        let (progresso, outra) = questao_atual(&pool, &progresso).await.unwrap().unwrap();
        assert_ne!(outra.questao.id, atual.questao.id);
        assert_eq!(progresso.total().unwrap(), 1);
        assert_eq!(progresso.indice_atual, 0);
        assert_eq!(progresso.acertos + progresso.erros, 0);
    }

    #[tokio::test]
    async fn finalizar_sem_respostas_descarta_sessao() {
        let pool = pool_teste().await;
        semear_usuario(&pool, "u1").await;
        let materia_id = materia_service::create_materia(&pool, "Legislação", "").await.unwrap();
        questao_service::create_questao(&pool, &questao_ce(&materia_id, "Item", "C"))
            .await
            .unwrap();
        iniciar_sessao(&pool, "u1", &QuestaoFiltro::default(), 10, "").await.unwrap();

        assert!(matches!(
            finalizar(&pool, "u1").await,
            Err(AppError::Validation(_))
        ));
        assert!(obter_progresso(&pool, "u1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn iniciar_sem_questoes_devolve_erro() {
        let pool = pool_teste().await;
        semear_usuario(&pool, "u1").await;
        assert!(matches!(
            iniciar_sessao(&pool, "u1", &QuestaoFiltro::default(), 10, "").await,
            Err(AppError::Validation(_))
        ));
    }
}
