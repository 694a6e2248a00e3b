// src/web/routes.rs
use crate::{
    state::AppState,
    web::{
        admin_handlers, auth_handlers, dashboard_handlers, estudo_handlers, materia_handlers,
        mw_admin, mw_auth, mw_device, questao_handlers,
    },
};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};

pub fn create_router(app_state: AppState) -> Router {
    // --- Rotas Públicas ---
    let public_routes = Router::new()
        .route(
            "/login",
            get(auth_handlers::show_login_form).post(auth_handlers::handle_login),
        )
        .route(
            "/registo",
            get(auth_handlers::show_registo_form).post(auth_handlers::handle_registo),
        )
        .route("/logout", get(auth_handlers::handle_logout))
        .route("/", get(|| async { axum::response::Redirect::permanent("/login") }));

    // --- Rotas de Admin ---
    // Exigem login E role admin
    let admin_routes = Router::new()
        .route("/usuarios", get(admin_handlers::show_usuarios_page))
        .route("/usuarios/{id}/aprovar", post(admin_handlers::handle_aprovar_usuario))
        .route("/usuarios/{id}/bloquear", post(admin_handlers::handle_bloquear_usuario))
        .route("/reports", get(admin_handlers::show_reports_page))
        .route("/reports/{id}/resolver", post(admin_handlers::handle_resolver_report))
        .route("/materias/criar", post(materia_handlers::handle_create_materia))
        .route("/materias/{id}/editar", post(materia_handlers::handle_edit_materia))
        .route("/materias/{id}/apagar", post(materia_handlers::handle_delete_materia))
        .route("/assuntos/criar", post(materia_handlers::handle_create_assunto))
        .route("/assuntos/{id}/editar", post(materia_handlers::handle_edit_assunto))
        .route("/assuntos/{id}/apagar", post(materia_handlers::handle_delete_assunto))
        .route(
            "/questoes/nova",
            get(questao_handlers::show_nova_questao_form)
                .post(questao_handlers::handle_create_questao),
        )
        .route(
            "/questoes/editar/{id}",
            get(questao_handlers::show_editar_questao_form)
                .post(questao_handlers::handle_editar_questao),
        )
        .route("/questoes/{id}/apagar", post(questao_handlers::handle_apagar_questao))
        .route("/importar", get(questao_handlers::show_importar_form))
        .route("/importar/preview", post(questao_handlers::handle_importar_preview))
        .route("/importar/confirmar", post(questao_handlers::handle_importar_confirmar))
        // Apenas mw_admin aqui (mw_auth é aplicado no router pai)
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            mw_admin::require_admin,
        ));

    // --- Modo estudo ---
    let estudo_routes = Router::new()
        .route("/", get(estudo_handlers::show_estudar_page))
        .route("/iniciar", post(estudo_handlers::handle_iniciar))
        .route("/sessao", get(estudo_handlers::show_sessao_page))
        .route("/responder", post(estudo_handlers::handle_responder))
        .route("/finalizar", post(estudo_handlers::handle_finalizar))
        .route("/abandonar", post(estudo_handlers::handle_abandonar))
        .route("/resultado/{id}", get(estudo_handlers::show_resultado_page));

    // --- Rotas Autenticadas ---
    let authenticated_routes = Router::new()
        .route("/dashboard", get(dashboard_handlers::dashboard_handler))
        .route("/materias", get(materia_handlers::show_materias_page))
        .route("/questoes", get(questao_handlers::show_questoes_page))
        .route("/questoes/{id}", get(questao_handlers::show_questao_page))
        .route("/questoes/{id}/comentar", post(questao_handlers::handle_comentar))
        .route("/questoes/{id}/reportar", post(questao_handlers::handle_reportar))
        .route(
            "/comentarios/{id}/apagar",
            post(questao_handlers::handle_apagar_comentario),
        )
        .route("/notificacoes", get(dashboard_handlers::notificacoes_handler))
        .route("/notificacoes/{id}/ler", post(dashboard_handlers::handle_marcar_lida))
        .nest("/estudar", estudo_routes)
        .nest("/admin", admin_routes)
        // Regista o dispositivo e exige login em tudo o que está acima
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            mw_device::track_device,
        ))
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            mw_auth::require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(authenticated_routes)
        .with_state(app_state)
}
