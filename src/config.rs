//! # Configuración del Servidor
//! src/config.rs
//!
//! La configuración viene de dos fuentes:
//!
//! 1. Argumentos CLI / variables de entorno (ruta del archivo y overrides).
//! 2. Un archivo de configuración, TOML o JSON según la extensión.
//!
//! ## Ejemplos de uso
//!
//! ### CLI
//! ```bash
//! ./static_httpd --config site.toml --port 8080 --threaded
//! ```
//!
//! ### Variables de entorno
//! ```bash
//! STATIC_HTTPD_CONFIG=site.json STATIC_HTTPD_PORT=9000 ./static_httpd
//! ```
//!
//! ### Archivo
//! ```toml
//! log_file = "static_httpd.log"
//! port = "8080"
//! buffer_size = 8192
//! backlog = 10
//!
//! [[resources]]
//! path = "www/main.htm"
//! alias = "index"
//! contentType = "text/html"
//!
//! [[resources]]
//! path = "www/gone.htm"
//! alias = "old"
//! statusCode = "410 Gone"
//! ```

use crate::error::ConfigError;
use crate::http::status::DEFAULT_STATUS;
use crate::resource::DEFAULT_CONTENT_TYPE;
use clap::Parser;
use serde::{Deserialize, Deserializer};
use std::fs;
use std::path::{Path, PathBuf};

/// Argumentos de línea de comandos
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "static_httpd")]
#[command(about = "Servidor HTTP/1.x mínimo que sirve recursos precargados en memoria")]
#[command(version = "0.1.0")]
pub struct Cli {
    /// Archivo de configuración (.toml o .json)
    #[arg(short, long, default_value = "static_httpd.toml", env = "STATIC_HTTPD_CONFIG")]
    pub config: PathBuf,

    /// Puerto (número o nombre de servicio); reemplaza al del archivo
    #[arg(short, long, env = "STATIC_HTTPD_PORT")]
    pub port: Option<String>,

    /// Host/IP en el que escucha; reemplaza al del archivo
    #[arg(long, env = "STATIC_HTTPD_HOST")]
    pub host: Option<String>,

    /// Archivo de log; reemplaza al del archivo
    #[arg(long, env = "STATIC_HTTPD_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// Un thread por conexión en vez de atender de a una
    #[arg(long)]
    pub threaded: bool,
}

/// Definición de un recurso tal como aparece en el archivo.
///
/// `path` y `alias` son obligatorios; si falta alguno la definición se
/// descarta sin abortar el arranque.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDef {
    pub path: Option<PathBuf>,
    pub alias: Option<String>,
    pub status_code: Option<String>,
    pub content_type: Option<String>,
}

/// Recurso con los campos obligatorios presentes y los defaults aplicados
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceEntry {
    pub path: PathBuf,
    pub alias: String,
    pub status_code: String,
    pub content_type: String,
}

impl ResourceDef {
    /// Aplica defaults; `None` si falta `path` o `alias`
    pub fn to_entry(&self) -> Option<ResourceEntry> {
        let path = self.path.clone()?;
        let alias = self.alias.clone().filter(|alias| !alias.is_empty())?;
        Some(ResourceEntry {
            path,
            alias,
            status_code: self.status_code.clone().unwrap_or_else(|| DEFAULT_STATUS.to_string()),
            content_type: self
                .content_type
                .clone()
                .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
        })
    }
}

/// Reemplazo opcional de la página integrada de "no encontrado"
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FallbackDef {
    pub path: Option<PathBuf>,
    pub status_code: Option<String>,
    pub content_type: Option<String>,
}

/// Configuración completa del servidor
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Archivo de log (se usa solo sin privilegios de root)
    pub log_file: PathBuf,

    /// Host/IP en el que escucha
    pub host: String,

    /// Puerto, como texto: número o nombre de servicio
    #[serde(deserialize_with = "port_text")]
    pub port: String,

    /// Capacidad máxima del buffer de lectura por conexión
    pub buffer_size: usize,

    /// Largo de la cola de `listen`
    pub backlog: i32,

    /// Usuario al que se bajan los privilegios si se arranca como root
    pub user_id: u32,

    /// Grupo al que se bajan los privilegios si se arranca como root
    pub group_id: u32,

    /// Un thread por conexión
    pub threaded: bool,

    pub fallback: Option<FallbackDef>,

    pub resources: Vec<ResourceDef>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_file: PathBuf::from("static_httpd.log"),
            host: "0.0.0.0".to_string(),
            port: "8080".to_string(),
            buffer_size: 8192,
            backlog: 10,
            user_id: 1000,
            group_id: 1000,
            threaded: false,
            fallback: None,
            resources: Vec::new(),
        }
    }
}

/// El puerto se acepta como string (`"8080"`, `"http"`) o como número
fn port_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Port {
        Text(String),
        Number(u16),
    }

    Ok(match Port::deserialize(deserializer)? {
        Port::Text(text) => text,
        Port::Number(number) => number.to_string(),
    })
}

/// Formato del archivo de configuración
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Toml,
    Json,
}

impl Format {
    /// `.json` es JSON; cualquier otra extensión se lee como TOML
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Format::Json,
            _ => Format::Toml,
        }
    }
}

impl Config {
    /// Lee el archivo indicado por la CLI y aplica los overrides
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let config = Self::from_file(&cli.config)?.with_overrides(cli);
        config.validate()?;
        Ok(config)
    }

    /// Lee y parsea un archivo de configuración
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_text(&text, Format::from_path(path), path)
    }

    /// Parsea el contenido de un archivo; `origin` solo se usa en los errores
    pub fn from_text(text: &str, format: Format, origin: &Path) -> Result<Self, ConfigError> {
        match format {
            Format::Toml => toml::from_str(text).map_err(|source| ConfigError::Toml {
                path: origin.to_path_buf(),
                source,
            }),
            Format::Json => serde_json::from_str(text).map_err(|source| ConfigError::Json {
                path: origin.to_path_buf(),
                source,
            }),
        }
    }

    /// Aplica los valores que vinieron por CLI o entorno
    pub fn with_overrides(mut self, cli: &Cli) -> Self {
        if let Some(port) = &cli.port {
            self.port = port.clone();
        }
        if let Some(host) = &cli.host {
            self.host = host.clone();
        }
        if let Some(log_file) = &cli.log_file {
            self.log_file = log_file.clone();
        }
        self.threaded |= cli.threaded;
        self
    }

    /// Valida la configuración
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.port_number()?;

        // El terminador \r\n\r\n tiene que caber en el buffer
        if self.buffer_size < 4 {
            return Err(ConfigError::Invalid(format!(
                "buffer_size must be >= 4, got {}",
                self.buffer_size
            )));
        }
        if self.backlog <= 0 {
            return Err(ConfigError::Invalid(format!(
                "backlog must be > 0, got {}",
                self.backlog
            )));
        }
        Ok(())
    }

    /// Resuelve el puerto: número decimal o nombre de servicio conocido
    ///
    /// # Ejemplo
    /// ```
    /// use static_httpd::config::Config;
    ///
    /// let mut config = Config::default();
    /// config.port = "http".to_string();
    /// assert_eq!(config.port_number().unwrap(), 80);
    /// ```
    pub fn port_number(&self) -> Result<u16, ConfigError> {
        let port = self.port.trim();
        if let Ok(number) = port.parse::<u16>() {
            return Ok(number);
        }
        match port {
            "http" | "www" => Ok(80),
            "https" => Ok(443),
            "http-alt" => Ok(8080),
            _ => Err(ConfigError::InvalidPort(self.port.clone())),
        }
    }
}
