//! # Módulo del Servidor HTTP
//! src/server/mod.rs
//!
//! Este módulo implementa el servidor TCP que:
//! 1. Escucha en un puerto con el backlog configurado
//! 2. Acepta conexiones entrantes
//! 3. Lee y valida el request
//! 4. Envía el recurso resuelto y cierra la conexión

pub mod listener;
pub mod tcp;

// Re-exportar para facilitar el uso
pub use tcp::{ConnectionHandler, Exchange, Server};
