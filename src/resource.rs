//! # Recursos servibles
//! src/resource.rs
//!
//! Un [`Resource`] es un blob de bytes con nombre (alias), tipo MIME y línea
//! de estado. Se construye una sola vez al arrancar, leyendo el archivo
//! completo a memoria, y nunca se modifica después.

use crate::error::{ConfigError, ServerError};
use crate::http::status::is_header_text;
use crate::http::StatusLine;
use std::fs;
use std::path::Path;

/// Tipo MIME por defecto cuando la configuración no especifica `contentType`
pub const DEFAULT_CONTENT_TYPE: &str = "text/plain";

/// Página que se sirve cuando ningún alias coincide
pub const NOT_FOUND_BODY: &str = "<HTML><BODY>Not found.</BODY></HTML>";

/// Alias interno de la página de "no encontrado"
pub const NOT_FOUND_ALIAS: &str = "Not found.";

/// Valida un `contentType` de la configuración.
///
/// Se copia tal cual al header `Content-Type`, así que no puede estar vacío
/// ni contener `\r` o `\n`.
pub fn check_content_type(text: &str) -> Result<&str, ConfigError> {
    if is_header_text(text) {
        Ok(text)
    } else {
        Err(ConfigError::ContentType(text.to_string()))
    }
}

/// Un recurso servible, inmutable después de construido
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    /// Clave de routing (ej: "index")
    alias: String,

    /// Tipo MIME para el header `Content-Type`
    content_type: String,

    /// Texto de la línea de estado (ej: "200 OK")
    status: StatusLine,

    /// Contenido completo
    body: Vec<u8>,

    /// `body.len()` ya formateado en decimal, para no formatearlo en cada request
    length_text: String,
}

impl Resource {
    /// Crea un recurso a partir de bytes en memoria
    ///
    /// # Ejemplo
    /// ```
    /// use static_httpd::http::StatusLine;
    /// use static_httpd::resource::Resource;
    ///
    /// let page = Resource::new("index", "text/html", StatusLine::default(), b"hello".to_vec());
    /// assert_eq!(page.length_text(), "5");
    /// ```
    pub fn new(alias: &str, content_type: &str, status: StatusLine, body: Vec<u8>) -> Self {
        let length_text = body.len().to_string();
        Self {
            alias: alias.to_string(),
            content_type: content_type.to_string(),
            status,
            body,
            length_text,
        }
    }

    /// Lee el archivo completo y construye el recurso
    pub fn load(
        path: &Path,
        alias: &str,
        content_type: &str,
        status: StatusLine,
    ) -> Result<Self, ServerError> {
        let body = fs::read(path).map_err(|source| ServerError::ResourceLoad {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(alias, content_type, status, body))
    }

    /// Página integrada de "no encontrado"
    pub fn not_found(status: StatusLine) -> Self {
        Self::new(NOT_FOUND_ALIAS, "text/html", status, NOT_FOUND_BODY.as_bytes().to_vec())
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn status(&self) -> &StatusLine {
        &self.status
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    /// Un recurso sin bytes cuenta como ausente para el resolver
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    pub fn length_text(&self) -> &str {
        &self.length_text
    }
}
