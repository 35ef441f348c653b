//! # Lectura del request
//! src/http/reader.rs
//!
//! Acumula bytes de la conexión en un único buffer hasta que:
//!
//! 1. los últimos cuatro bytes son `\r\n\r\n` (fin de headers),
//! 2. el buffer llega a su capacidad máxima, o
//! 3. el peer cierra o hay un error de I/O.
//!
//! Una sola llamada a `read` puede traer solo una parte del request, así que
//! se lee en loop. El buffer nunca crece más allá de la capacidad configurada.

use super::transport::Transport;
use crate::error::ConnectionError;
use std::io::{self, Read};

/// Fin de la sección de headers
pub const HEADER_TERMINATOR: &[u8; 4] = b"\r\n\r\n";

/// Cómo terminó la lectura
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadStatus {
    /// Se vio el terminador
    Complete,

    /// Se llenó el buffer sin ver el terminador; se atiende igual
    TooLarge,

    /// El peer cerró después de mandar algo
    PeerClosed,

    /// El peer cerró sin mandar nada
    Empty,

    /// Error de I/O después de haber leído algo
    Aborted,
}

impl ReadStatus {
    /// Solo en estos casos se drena la entrada antes de responder
    pub fn should_drain(self) -> bool {
        matches!(self, ReadStatus::Complete | ReadStatus::TooLarge)
    }
}

/// Bytes recibidos en una conexión
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundRequest {
    buffer: Vec<u8>,
    status: ReadStatus,
}

impl InboundRequest {
    pub fn bytes(&self) -> &[u8] {
        &self.buffer
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn status(&self) -> ReadStatus {
        self.status
    }
}

/// Lee un request de hasta `capacity` bytes.
///
/// Un error en la primera lectura se propaga (no se responde nada). Un error
/// en una lectura posterior termina la lectura con [`ReadStatus::Aborted`] y
/// se atiende lo que se alcanzó a leer.
pub fn read_request<R: Read>(stream: &mut R, capacity: usize) -> Result<InboundRequest, ConnectionError> {
    let mut buffer = vec![0u8; capacity];
    let mut filled = 0;

    let status = loop {
        if filled >= capacity {
            break ReadStatus::TooLarge;
        }

        let n = match stream.read(&mut buffer[filled..]) {
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) if filled == 0 => return Err(ConnectionError::Read(e)),
            Err(e) => {
                tracing::debug!(filled, error = %e, "read failed mid-request");
                break ReadStatus::Aborted;
            }
        };

        if n == 0 {
            break if filled == 0 { ReadStatus::Empty } else { ReadStatus::PeerClosed };
        }

        filled += n;
        tracing::trace!(read = n, filled, "request bytes");

        if buffer[..filled].ends_with(HEADER_TERMINATOR) {
            break ReadStatus::Complete;
        }
    };

    buffer.truncate(filled);
    Ok(InboundRequest { buffer, status })
}

/// Descarta lo que el peer haya mandado después del request.
///
/// Lee de a un byte en modo no bloqueante hasta que no haya nada disponible,
/// para que el cierre no le llegue al cliente como un reset.
/// Retorna la cantidad de bytes descartados.
///
/// Falla solo si el socket no pudo volver a modo bloqueante; en ese caso la
/// respuesta no se puede escribir y la conexión se corta.
pub fn drain<T: Transport>(stream: &mut T) -> io::Result<usize> {
    if let Err(e) = stream.set_nonblocking(true) {
        tracing::debug!(error = %e, "cannot switch to non-blocking, skipping drain");
        return Ok(0);
    }

    let drained = discard_pending(stream);
    stream.set_nonblocking(false)?;
    Ok(drained)
}

fn discard_pending<R: Read>(stream: &mut R) -> usize {
    let mut byte = [0u8; 1];
    let mut drained = 0;
    loop {
        match stream.read(&mut byte) {
            Ok(0) => break,
            Ok(_) => drained += 1,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(_) => break,
        }
    }
    drained
}
