//! # Transporte de una conexión
//!
//! El reader y el writer solo necesitan `Read`/`Write`, pero el drenado
//! posterior a la lectura necesita poner el socket en modo no bloqueante.

use std::io::{self, Read, Write};
use std::net::TcpStream;

/// Stream bidireccional que puede alternar entre modo bloqueante y no bloqueante
pub trait Transport: Read + Write {
    fn set_nonblocking(&self, nonblocking: bool) -> io::Result<()>;
}

impl Transport for TcpStream {
    fn set_nonblocking(&self, nonblocking: bool) -> io::Result<()> {
        TcpStream::set_nonblocking(self, nonblocking)
    }
}
