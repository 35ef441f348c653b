//! # Static HTTPD
//! src/lib.rs
//!
//! Servidor HTTP/1.x mínimo: sirve una tabla de recursos que se cargan a
//! memoria una sola vez al arrancar. Cada conexión recibe una única
//! respuesta y se cierra.
//!
//! ## Arquitectura
//!
//! El servidor está dividido en módulos especializados:
//! - `http`: lectura del request, validación de la request line y envío de la respuesta
//! - `router`: tabla de recursos y resolución de alias
//! - `resource`: modelo de un recurso y su carga desde disco
//! - `server`: socket de escucha y loop de conexiones
//! - `config`: CLI y archivo de configuración
//! - `logger`: log append-only del proceso
//! - `privilege`: bajada de privilegios después del bind
//!
//! ## Ejemplo de uso
//!
//! ```no_run
//! use static_httpd::config::Config;
//! use static_httpd::logger::Logger;
//! use static_httpd::router::ResourceTable;
//! use static_httpd::server::Server;
//! use std::sync::Arc;
//!
//! let config = Config::default();
//! let logger = Arc::new(Logger::new(&config.log_file));
//! let server = Server::bind(&config, Arc::clone(&logger)).expect("bind");
//! let table = ResourceTable::load(&config, &logger).expect("recursos");
//! server.run(table).expect("Error al iniciar servidor");
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod logger;
pub mod privilege;
pub mod resource;
pub mod router;
pub mod server;
