// src/services/mod.rs
pub mod auth_service;
pub mod comentario_service;
pub mod estudo_service;
pub mod materia_service;
pub mod notificacao_service;
pub mod parser;
pub mod questao_service;
pub mod report_service;
pub mod session_service;
pub mod user_service;
