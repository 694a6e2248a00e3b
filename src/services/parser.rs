// src/services/parser.rs
//
// Importação em lote: converte texto colado (provas em texto puro) em
// questões estruturadas. Blocos separados por linha em branco; o gabarito
// é reconhecido por regex numa linha própria.
use crate::models::questao::{TIPO_CERTO_ERRADO, TIPO_MULTIPLA_ESCOLHA};
use regex::Regex;
use std::sync::LazyLock;

// Cabeçalho opcional "(BANCA-2023)" ou "(BANCA/2023)" no início do bloco
static RE_CABECALHO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\(([^()\d][^()]*?)[-/](\d{4})\)\s*(.*)$").unwrap());
// Alternativa: "A) texto", "b. texto", "C- texto"
static RE_ALTERNATIVA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Ea-e])[\)\.\-]\s*(\S.*)$").unwrap());
// Linha de gabarito: "Gabarito: B", "gabarito - Certo"
static RE_GABARITO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^gabarito\s*[:\-]\s*([A-Za-z]+)\s*$").unwrap());
// Linha de tags: "Tags: penal, doutrina"
static RE_TAGS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^tags\s*:\s*(.+)$").unwrap());

/// Questão extraída do texto, ainda sem matéria/assunto (escolhidos no form).
#[derive(Debug, Clone, PartialEq)]
pub struct QuestaoImportada {
    pub tipo: &'static str,
    pub enunciado: String,
    pub gabarito: String,
    pub banca: Option<String>,
    pub ano: Option<i64>,
    pub alternativas: Vec<(String, String)>,
    pub tags: Vec<String>,
}

/// Bloco rejeitado, com a linha onde começa para o utilizador corrigir.
#[derive(Debug, Clone)]
pub struct ErroImportacao {
    pub linha: usize,
    pub mensagem: String,
}

/// Resultado do parse: blocos bons importam mesmo quando outros falham.
#[derive(Debug, Default)]
pub struct ResultadoParse {
    pub questoes: Vec<QuestaoImportada>,
    pub erros: Vec<ErroImportacao>,
}

pub fn parse_texto(texto: &str) -> ResultadoParse {
    let mut resultado = ResultadoParse::default();

    for (linha_inicio, bloco) in blocos(texto) {
        match parse_bloco(&bloco) {
            Ok(questao) => resultado.questoes.push(questao),
            Err(mensagem) => {
                tracing::debug!("Bloco na linha {} rejeitado: {}", linha_inicio, mensagem);
                resultado.erros.push(ErroImportacao { linha: linha_inicio, mensagem });
            }
        }
    }

    tracing::info!(
        "Parse concluído: {} questões, {} blocos rejeitados.",
        resultado.questoes.len(),
        resultado.erros.len()
    );
    resultado
}

/// Divide o texto em blocos não vazios, guardando a linha (1-based) onde
/// cada bloco começa.
fn blocos(texto: &str) -> Vec<(usize, Vec<String>)> {
    let mut saida = Vec::new();
    let mut atual: Vec<String> = Vec::new();
    let mut inicio = 0usize;

    for (i, linha) in texto.lines().enumerate() {
        if linha.trim().is_empty() {
            if !atual.is_empty() {
                saida.push((inicio, std::mem::take(&mut atual)));
            }
        } else {
            if atual.is_empty() {
                inicio = i + 1;
            }
            atual.push(linha.trim_end().to_string());
        }
    }
    if !atual.is_empty() {
        saida.push((inicio, atual));
    }
    saida
}

fn parse_bloco(linhas: &[String]) -> Result<QuestaoImportada, String> {
    let mut enunciado = String::new();
    let mut alternativas: Vec<(String, String)> = Vec::new();
    let mut gabarito_bruto: Option<String> = None;
    let mut tags: Vec<String> = Vec::new();
    let mut banca = None;
    let mut ano = None;

    // Cabeçalho só vale na primeira linha do bloco
    let mut linhas = linhas.to_vec();
    if let Some(caps) = RE_CABECALHO.captures(&linhas[0]) {
        banca = Some(caps[1].trim().to_string());
        ano = caps[2].parse::<i64>().ok();
        linhas[0] = caps[3].to_string();
    }

    for linha in linhas.iter() {
        let linha = linha.as_str();
        if linha.trim().is_empty() {
            continue;
        }

        if let Some(caps) = RE_GABARITO.captures(linha) {
            if gabarito_bruto.is_some() {
                return Err("Bloco com mais de uma linha de gabarito.".to_string());
            }
            gabarito_bruto = Some(caps[1].to_uppercase());
        } else if let Some(caps) = RE_TAGS.captures(linha) {
            tags = caps[1]
                .split(',')
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect();
        } else if let Some(caps) = RE_ALTERNATIVA.captures(linha) {
            alternativas.push((caps[1].to_uppercase(), caps[2].trim().to_string()));
        } else if let Some((_, texto)) = alternativas.last_mut() {
            // Continuação da alternativa anterior
            texto.push(' ');
            texto.push_str(linha.trim());
        } else {
            if !enunciado.is_empty() {
                enunciado.push(' ');
            }
            enunciado.push_str(linha.trim());
        }
    }

    if enunciado.trim().is_empty() {
        return Err("Bloco sem enunciado.".to_string());
    }
    let Some(gabarito) = gabarito_bruto else {
        return Err("Bloco sem linha 'Gabarito:'.".to_string());
    };

    if alternativas.is_empty() {
        // Certo/errado: aceita C, E, CERTO, ERRADO
        let normalizado = match gabarito.as_str() {
            "C" | "CERTO" => "C",
            "E" | "ERRADO" => "E",
            outro => {
                return Err(format!(
                    "Gabarito '{}' sem alternativas: esperado Certo/Errado.",
                    outro
                ));
            }
        };
        Ok(QuestaoImportada {
            tipo: TIPO_CERTO_ERRADO,
            enunciado,
            gabarito: normalizado.to_string(),
            banca,
            ano,
            alternativas,
            tags,
        })
    } else {
        if alternativas.len() < 2 {
            return Err("Múltipla escolha com menos de 2 alternativas.".to_string());
        }
        if gabarito.len() != 1 || !("A"..="E").contains(&gabarito.as_str()) {
            return Err(format!("Gabarito '{}' não é uma letra A-E.", gabarito));
        }
        if !alternativas.iter().any(|(letra, _)| *letra == gabarito) {
            return Err(format!("Gabarito '{}' não corresponde a nenhuma alternativa.", gabarito));
        }
        Ok(QuestaoImportada {
            tipo: TIPO_MULTIPLA_ESCOLHA,
            enunciado,
            gabarito,
            banca,
            ano,
            alternativas,
            tags,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bloco_certo_errado_simples() {
        let r = parse_texto("Julgue o item: a PMDF integra a SSP-DF.\nGabarito: Certo");
        assert_eq!(r.erros.len(), 0);
        assert_eq!(r.questoes.len(), 1);
        let q = &r.questoes[0];
        assert_eq!(q.tipo, TIPO_CERTO_ERRADO);
        assert_eq!(q.gabarito, "C");
        assert!(q.enunciado.starts_with("Julgue o item"));
    }

    #[test]
    fn bloco_multipla_escolha_com_cabecalho_e_tags() {
        let texto = "(CESPE-2023) Qual o prazo?\nA) 10 dias\nB) 15 dias\nC) 30 dias\nTags: prazos, processo\nGabarito: B";
        let r = parse_texto(texto);
        assert_eq!(r.erros.len(), 0);
        let q = &r.questoes[0];
        assert_eq!(q.tipo, TIPO_MULTIPLA_ESCOLHA);
        assert_eq!(q.banca.as_deref(), Some("CESPE"));
        assert_eq!(q.ano, Some(2023));
        assert_eq!(q.alternativas.len(), 3);
        assert_eq!(q.gabarito, "B");
        assert_eq!(q.tags, vec!["prazos", "processo"]);
    }

    #[test]
    fn blocos_separados_por_varias_linhas_vazias() {
        let texto = "Primeira questão.\nGabarito: E\n\n\n\nSegunda questão.\nGabarito: C\n";
        let r = parse_texto(texto);
        assert_eq!(r.questoes.len(), 2);
        assert_eq!(r.questoes[0].gabarito, "E");
        assert_eq!(r.questoes[1].gabarito, "C");
    }

    #[test]
    fn bloco_mau_nao_derruba_os_bons() {
        let texto = "Sem gabarito nenhum.\n\nBoa questão.\nGabarito: Errado";
        let r = parse_texto(texto);
        assert_eq!(r.questoes.len(), 1);
        assert_eq!(r.erros.len(), 1);
        assert_eq!(r.erros[0].linha, 1);
    }

    #[test]
    fn gabarito_de_letra_exige_alternativa_correspondente() {
        let texto = "Pergunta?\nA) um\nB) dois\nGabarito: D";
        let r = parse_texto(texto);
        assert_eq!(r.questoes.len(), 0);
        assert_eq!(r.erros.len(), 1);
    }

    #[test]
    fn continuacao_de_alternativa_junta_linhas() {
        let texto = "Pergunta?\nA) começo da alternativa\nque continua aqui\nB) outra\nGabarito: A";
        let r = parse_texto(texto);
        assert_eq!(r.questoes.len(), 1);
        assert_eq!(r.questoes[0].alternativas[0].1, "começo da alternativa que continua aqui");
    }

    #[test]
    fn alternativas_com_ponto_e_minusculas() {
        let texto = "Pergunta?\na. um\nb. dois\nGabarito: a";
        let r = parse_texto(texto);
        assert_eq!(r.questoes.len(), 1);
        assert_eq!(r.questoes[0].alternativas[0].0, "A");
        assert_eq!(r.questoes[0].gabarito, "A");
    }

    #[test]
    fn certo_errado_nao_aceita_letra_fora_de_c_e() {
        let r = parse_texto("Julgue.\nGabarito: B");
        assert_eq!(r.questoes.len(), 0);
        assert_eq!(r.erros.len(), 1);
    }
}
