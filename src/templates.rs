// src/templates.rs
use crate::{
    models::{
        estudo::{EstatisticasUsuario, HistoricoEstudo, HistoricoRespostaDetalhe},
        materia::{Assunto, Materia, MateriaResumo},
        questao::{Alternativa, QuestaoResumo, Tag},
        social::{ComentarioExibicao, Notificacao, ReportExibicao},
        user::UserSession,
    },
    services::parser::{ErroImportacao, QuestaoImportada},
};
use askama::Template;

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginPage {
    pub error: Option<String>,
    pub info: Option<String>,
}

#[derive(Template)]
#[template(path = "registo.html")]
pub struct RegistoPage {
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardPage {
    pub user_nome: String,
    pub is_admin: bool,
    pub nao_lidas: i64,
    pub reports_abertos: i64,
    pub tem_sessao: bool,
    pub stats: EstatisticasUsuario,
    pub historicos: Vec<HistoricoEstudo>,
}

#[derive(Template)]
#[template(path = "materias.html")]
pub struct MateriasPage {
    pub is_admin: bool,
    pub materias: Vec<MateriaResumo>,
    pub assuntos: Vec<Assunto>,
    pub success_message: Option<String>,
    pub error_message: Option<String>,
}

#[derive(Template)]
#[template(path = "questoes.html")]
pub struct QuestoesPage {
    pub is_admin: bool,
    pub questoes: Vec<QuestaoResumo>,
    pub total: i64,
    pub pagina: i64,
    pub tem_anterior: bool,
    pub tem_proxima: bool,
    /// Query string do filtro atual (sem 'pagina'), para os links do pager.
    pub query_base: String,
    pub materias: Vec<Materia>,
    pub assuntos: Vec<Assunto>,
    pub tags: Vec<Tag>,
    pub filtro_materia: String,
    pub filtro_assunto: String,
    pub filtro_tipo: String,
    pub filtro_tag: String,
    pub success_message: Option<String>,
    pub error_message: Option<String>,
}

#[derive(Template)]
#[template(path = "questao_detalhe.html")]
pub struct QuestaoDetalhePage {
    pub is_admin: bool,
    pub user_id: String,
    pub questao_id: String,
    pub certo_errado: bool,
    pub enunciado: String,
    pub gabarito: String,
    pub materia_nome: String,
    pub assunto_nome: String,
    pub banca_ano: String,
    pub alternativas: Vec<Alternativa>,
    pub tags: Vec<Tag>,
    pub comentarios: Vec<ComentarioExibicao>,
    pub success_message: Option<String>,
    pub error_message: Option<String>,
}

/// Formulário de criação/edição de questão. Campos pré-preenchidos como
/// Strings simples para manter o template direto.
#[derive(Template)]
#[template(path = "questao_form.html")]
pub struct QuestaoFormPage {
    pub editar: bool,
    pub action: String,
    pub materias: Vec<Materia>,
    pub assuntos: Vec<Assunto>,
    pub materia_id: String,
    pub assunto_id: String,
    pub tipo: String,
    pub enunciado: String,
    pub gabarito: String,
    pub banca: String,
    pub ano: String,
    pub alt_a: String,
    pub alt_b: String,
    pub alt_c: String,
    pub alt_d: String,
    pub alt_e: String,
    pub tags: String,
    pub error_message: Option<String>,
}

#[derive(Template)]
#[template(path = "importar.html")]
pub struct ImportarPage {
    pub materias: Vec<Materia>,
    pub assuntos: Vec<Assunto>,
    pub error_message: Option<String>,
}

#[derive(Template)]
#[template(path = "importar_preview.html")]
pub struct ImportarPreviewPage {
    pub materia_nome: String,
    pub materia_id: String,
    pub assunto_id: String,
    pub texto: String,
    pub questoes: Vec<QuestaoImportada>,
    pub erros: Vec<ErroImportacao>,
}

/// Sessão retomável resumida, mostrada na página de arranque do estudo.
pub struct ProgressoView {
    pub descricao: String,
    pub respondidas: i64,
    pub total: i64,
}

#[derive(Template)]
#[template(path = "estudar.html")]
pub struct EstudarPage {
    pub materias: Vec<Materia>,
    pub assuntos: Vec<Assunto>,
    pub tags: Vec<Tag>,
    pub progresso: Option<ProgressoView>,
    pub error_message: Option<String>,
}

pub struct FeedbackView {
    pub correta: bool,
    pub gabarito: String,
}

#[derive(Template)]
#[template(path = "estudo_sessao.html")]
pub struct SessaoPage {
    pub numero: i64, // 1-based, para exibição
    pub total: i64,
    pub acertos: i64,
    pub erros: i64,
    pub indice: i64, // 0-based, vai no form como guarda de re-submit
    pub enunciado: String,
    pub certo_errado: bool,
    pub alternativas: Vec<Alternativa>,
    pub feedback: Option<FeedbackView>,
    pub error_message: Option<String>,
}

#[derive(Template)]
#[template(path = "estudo_resultado.html")]
pub struct ResultadoPage {
    pub descricao_filtro: String,
    pub total_questoes: i64,
    pub respondidas: i64,
    pub acertos: i64,
    pub erros: i64,
    pub percentual: i64,
    pub nota_liquida: i64,
    pub tempo_segundos: i64,
    pub respostas: Vec<HistoricoRespostaDetalhe>,
}

pub struct UsuarioAdminView {
    pub id: String,
    pub nome: String,
    pub email: String,
    pub role: String,
    pub status: String,
    pub registado_em: String,
    pub pendente: bool,
    pub bloqueado: bool,
    pub sessoes: Vec<UserSession>,
}

#[derive(Template)]
#[template(path = "admin_usuarios.html")]
pub struct AdminUsuariosPage {
    pub usuarios: Vec<UsuarioAdminView>,
    pub success_message: Option<String>,
    pub error_message: Option<String>,
}

#[derive(Template)]
#[template(path = "admin_reports.html")]
pub struct AdminReportsPage {
    pub reports: Vec<ReportExibicao>,
    pub success_message: Option<String>,
    pub error_message: Option<String>,
}

#[derive(Template)]
#[template(path = "notificacoes.html")]
pub struct NotificacoesPage {
    pub notificacoes: Vec<Notificacao>,
    pub nao_lidas: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dashboard_renderiza_estatisticas_e_badges_admin() {
        let template = DashboardPage {
            user_nome: "Maria".to_string(),
            is_admin: true,
            nao_lidas: 2,
            reports_abertos: 1,
            tem_sessao: false,
            stats: EstatisticasUsuario {
                sessoes: 1,
                respondidas: 3,
                acertos: 2,
                erros: 1,
                tempo_segundos: 90,
                por_materia: vec![],
            },
            historicos: vec![],
        };
        let html = template.render().unwrap();
        assert!(html.contains("Olá, Maria"));
        assert!(html.contains("Notificações (2)"));
        assert!(html.contains("Reports (1)"));
        assert!(html.contains("Nota líquida"));
    }

    #[test]
    fn sessao_mostra_mensagem_de_resposta_invalida() {
        let template = SessaoPage {
            numero: 1,
            total: 5,
            acertos: 0,
            erros: 0,
            indice: 0,
            enunciado: "Julgue o item.".to_string(),
            certo_errado: true,
            alternativas: vec![],
            feedback: None,
            error_message: Some("Responda Certo ou Errado.".to_string()),
        };
        let html = template.render().unwrap();
        assert!(html.contains("Responda Certo ou Errado."));
        assert!(html.contains("Questão 1 de 5"));
    }
}
