//! # Socket de escucha
//! src/server/listener.rs
//!
//! `std::net::TcpListener::bind` no permite elegir el largo de la cola de
//! `listen`, así que el socket se arma con `socket2` y después se convierte
//! a un `TcpListener` normal.

use crate::error::ServerError;
use socket2::{Domain, Protocol, Socket, Type};
use std::io;
use std::net::{SocketAddr, TcpListener, ToSocketAddrs};

/// Crea, bindea y pone a escuchar un socket TCP
pub fn bind(host: &str, port: u16, backlog: i32) -> Result<TcpListener, ServerError> {
    let address = format!("{}:{}", host, port);
    let listen_error = |step: &'static str| {
        let address = address.clone();
        move |source: io::Error| ServerError::Listen { step, address, source }
    };

    let socket_addr: SocketAddr = (host, port)
        .to_socket_addrs()
        .map_err(listen_error("resolve"))?
        .next()
        .ok_or_else(|| ServerError::Listen {
            step: "resolve",
            address: address.clone(),
            source: io::Error::from(io::ErrorKind::AddrNotAvailable),
        })?;

    let socket = Socket::new(Domain::for_address(socket_addr), Type::STREAM, Some(Protocol::TCP))
        .map_err(listen_error("create socket"))?;
    socket
        .set_reuse_address(true)
        .map_err(listen_error("set SO_REUSEADDR"))?;
    socket
        .bind(&socket_addr.into())
        .map_err(listen_error("bind"))?;
    socket.listen(backlog).map_err(listen_error("listen"))?;

    Ok(socket.into())
}
