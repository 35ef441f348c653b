//! # Validación de la request line
//! src/http/matcher.rs
//!
//! No es un parser HTTP general: es una whitelist. Solo se acepta
//!
//! ```text
//! GET /<alias> HTTP/1.0\r\n
//! GET /<alias> HTTP/1.1\r\n
//! ```
//!
//! como primera línea del buffer, donde `<alias>` usa únicamente
//! `[A-Za-z0-9._-]` (sin `/`, sin query string, sin escapes). Todo lo demás
//! es [`Target::BadRequest`]; nunca se acepta un match parcial.

use regex::bytes::Regex;

/// Gramática de la primera línea. `\A` la ancla al inicio del buffer y el
/// salto de línea final exige que la línea esté completa.
pub const REQUEST_LINE_PATTERN: &str = r"\AGET /([A-Za-z0-9._-]*) HTTP/1\.[01]\r?\n";

/// Alias que se usa cuando el path es `/`
pub const INDEX_ALIAS: &str = "index";

/// Identificador con el que se resuelve un request inválido
pub const BAD_REQUEST_ALIAS: &str = "400";

/// Resultado de validar un request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Alias validado (o `"index"` para `/`)
    Alias(String),

    /// La request line no cumple la gramática
    BadRequest,
}

impl Target {
    /// Identificador con el que se busca en la tabla de recursos.
    ///
    /// `BadRequest` se resuelve como el alias `"400"`: si la tabla no lo
    /// define, se sirve la página de "no encontrado" con su propio estado.
    pub fn identifier(&self) -> &str {
        match self {
            Target::Alias(alias) => alias,
            Target::BadRequest => BAD_REQUEST_ALIAS,
        }
    }

    pub fn is_bad_request(&self) -> bool {
        matches!(self, Target::BadRequest)
    }
}

/// Gramática compilada. Se crea una sola vez al arrancar y se comparte.
#[derive(Debug, Clone)]
pub struct RequestMatcher {
    grammar: Regex,
}

impl RequestMatcher {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            grammar: Regex::new(REQUEST_LINE_PATTERN)?,
        })
    }

    /// Extrae el alias pedido del buffer recibido
    ///
    /// # Ejemplo
    /// ```
    /// use static_httpd::http::{RequestMatcher, Target};
    ///
    /// let matcher = RequestMatcher::new().unwrap();
    /// assert_eq!(
    ///     matcher.match_request(b"GET /about.html HTTP/1.1\r\nHost: x\r\n\r\n"),
    ///     Target::Alias("about.html".to_string())
    /// );
    /// assert_eq!(matcher.match_request(b"POST / HTTP/1.1\r\n\r\n"), Target::BadRequest);
    /// ```
    pub fn match_request(&self, buffer: &[u8]) -> Target {
        if !buffer.starts_with(b"GET ") {
            return Target::BadRequest;
        }

        let Some(captures) = self.grammar.captures(buffer) else {
            return Target::BadRequest;
        };

        match captures.get(1).map(|path| path.as_bytes()) {
            Some(path) if !path.is_empty() => {
                // La clase de caracteres es ASCII, la conversión no pierde nada
                Target::Alias(String::from_utf8_lossy(path).into_owned())
            }
            _ => Target::Alias(INDEX_ALIAS.to_string()),
        }
    }
}
