// src/web/mod.rs
pub mod admin_handlers;
pub mod auth_handlers;
pub mod dashboard_handlers;
pub mod estudo_handlers;
pub mod materia_handlers;
pub mod mw_admin;
pub mod mw_auth;
pub mod mw_device;
pub mod questao_handlers;
pub mod routes;
