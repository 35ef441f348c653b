//! # Envío de la respuesta
//!
//! Cada conexión recibe exactamente una respuesta:
//!
//! ```text
//! HTTP/1.1 200 OK\r\n
//! Content-Type: text/html\r\n
//! Content-Length: 5\r\n
//! Connection: close\r\n
//! \r\n
//! hello
//! ```
//!
//! Un `write` no garantiza consumir todo el buffer, así que tanto el bloque
//! de headers como el body se envían en loop hasta completarlos. Un error
//! corta el envío en el acto; no hay reintentos.

use crate::error::ConnectionError;
use crate::resource::Resource;
use std::io::{self, Write};

/// Respuesta para un recurso ya resuelto
#[derive(Debug, Clone, Copy)]
pub struct Response<'a> {
    resource: &'a Resource,
}

impl<'a> Response<'a> {
    pub fn new(resource: &'a Resource) -> Self {
        Self { resource }
    }

    /// Status line y headers en un único buffer contiguo
    ///
    /// # Ejemplo
    /// ```
    /// use static_httpd::http::{Response, StatusLine};
    /// use static_httpd::resource::Resource;
    ///
    /// let page = Resource::new("index", "text/html", StatusLine::default(), b"hello".to_vec());
    /// let head = Response::new(&page).header_bytes();
    /// assert!(head.starts_with(b"HTTP/1.1 200 OK\r\n"));
    /// assert!(head.ends_with(b"Connection: close\r\n\r\n"));
    /// ```
    pub fn header_bytes(&self) -> Vec<u8> {
        format!(
            "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            self.resource.status(),
            self.resource.content_type(),
            self.resource.length_text(),
        )
        .into_bytes()
    }

    /// Escribe headers y body completos. Retorna el total de bytes enviados.
    pub fn write_to<W: Write>(&self, stream: &mut W) -> Result<usize, ConnectionError> {
        let header = self.header_bytes();
        let header_sent = send_all(stream, &header, 0)?;
        let body_sent = send_all(stream, self.resource.body(), header_sent)?;
        stream.flush().map_err(|source| ConnectionError::Write {
            sent: header_sent + body_sent,
            source,
        })?;
        Ok(header_sent + body_sent)
    }
}

/// Envía `bytes` completo, reemitiendo `write` por lo que falte.
///
/// `already_sent` solo se usa para reportar el total en caso de error.
fn send_all<W: Write>(stream: &mut W, bytes: &[u8], already_sent: usize) -> Result<usize, ConnectionError> {
    let mut sent = 0;
    while sent < bytes.len() {
        match stream.write(&bytes[sent..]) {
            Ok(0) => {
                return Err(ConnectionError::Write {
                    sent: already_sent + sent,
                    source: io::Error::from(io::ErrorKind::WriteZero),
                });
            }
            Ok(n) => {
                sent += n;
                if sent < bytes.len() {
                    tracing::trace!(sent, remaining = bytes.len() - sent, "partial write");
                }
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(source) => {
                return Err(ConnectionError::Write {
                    sent: already_sent + sent,
                    source,
                });
            }
        }
    }
    Ok(sent)
}
