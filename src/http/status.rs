//! # Línea de estado HTTP
//!
//! El código de estado de cada recurso viene de la configuración como texto
//! libre (ej: `"200 OK"`, `"404 Not Found"`) y se copia tal cual después de
//! `HTTP/1.1 ` en la respuesta. Solo validamos que no rompa el formato:
//! no puede estar vacío ni contener `\r` o `\n`.

use thiserror::Error;

/// Texto por defecto cuando la configuración no especifica `statusCode`
pub const DEFAULT_STATUS: &str = "200 OK";

/// Texto de estado inválido (vacío o con saltos de línea)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid status line: {0:?}")]
pub struct InvalidStatusLine(pub String);

/// Texto de la línea de estado, ya validado
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine(String);

impl StatusLine {
    /// Valida el texto de estado
    ///
    /// # Ejemplo
    /// ```
    /// use static_httpd::http::StatusLine;
    ///
    /// let status = StatusLine::parse("404 Not Found").unwrap();
    /// assert_eq!(status.code(), Some(404));
    /// assert!(StatusLine::parse("200 OK\r\nX-Evil: 1").is_err());
    /// ```
    pub fn parse(text: &str) -> Result<Self, InvalidStatusLine> {
        if !is_header_text(text) {
            return Err(InvalidStatusLine(text.to_string()));
        }
        Ok(Self(text.to_string()))
    }

    /// Código numérico, si el texto empieza con tres dígitos
    pub fn code(&self) -> Option<u16> {
        let digits = self.0.get(..3)?;
        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Texto que se puede copiar tal cual a una línea del bloque de headers
pub(crate) fn is_header_text(text: &str) -> bool {
    !text.trim().is_empty() && !text.contains(['\r', '\n'])
}

impl Default for StatusLine {
    fn default() -> Self {
        Self(DEFAULT_STATUS.to_string())
    }
}

impl std::fmt::Display for StatusLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
