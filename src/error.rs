//! # Errores del servidor
//! src/error.rs
//!
//! Tres familias de errores:
//!
//! - [`ConfigError`]: el archivo de configuración no se pudo leer o es inválido.
//! - [`ServerError`]: fallos de arranque. Todos terminan el proceso con código 1.
//! - [`ConnectionError`]: fallos de una sola conexión. Se registran y el
//!   loop de `accept` sigue atendiendo.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::http::status::InvalidStatusLine;

/// Errores al cargar o validar la configuración
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid TOML in {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid port: {0:?}")]
    InvalidPort(String),

    #[error(transparent)]
    StatusLine(#[from] InvalidStatusLine),

    #[error("invalid content type: {0:?}")]
    ContentType(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Errores fatales de arranque
#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to load resource {path}")]
    ResourceLoad {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to compile request grammar: {0}")]
    Grammar(#[from] regex::Error),

    #[error("failed to {step} on {address}")]
    Listen {
        step: &'static str,
        address: String,
        #[source]
        source: io::Error,
    },

    #[error("{step}: failed to drop privileges")]
    Privilege {
        step: &'static str,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl ServerError {
    /// Error del sistema operativo asociado, si lo hay.
    ///
    /// El logger lo usa para imprimir la línea `Error #<code>: <texto>`.
    pub fn os_error(&self) -> Option<&io::Error> {
        match self {
            ServerError::ResourceLoad { source, .. }
            | ServerError::Listen { source, .. }
            | ServerError::Privilege { source, .. }
            | ServerError::Io(source) => Some(source),
            ServerError::Config(ConfigError::Read { source, .. }) => Some(source),
            _ => None,
        }
    }
}

/// Errores de una conexión individual
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// La primera lectura falló: no se envía respuesta
    #[error("failed to read request")]
    Read(#[source] io::Error),

    /// Una escritura falló a mitad de la respuesta
    #[error("failed to write response after {sent} bytes")]
    Write {
        sent: usize,
        #[source]
        source: io::Error,
    },

    /// El socket quedó no bloqueante después de drenar
    #[error("failed to restore blocking mode")]
    Blocking(#[source] io::Error),
}

impl ConnectionError {
    pub fn io_error(&self) -> &io::Error {
        match self {
            ConnectionError::Read(source)
            | ConnectionError::Write { source, .. }
            | ConnectionError::Blocking(source) => source,
        }
    }
}
