// src/models/mod.rs
pub mod estudo;
pub mod materia;
pub mod questao;
pub mod social;
pub mod user;
