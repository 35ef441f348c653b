//! # Servidor TCP
//! src/server/tcp.rs
//!
//! Loop de `accept` y manejo de cada conexión:
//!
//! ```text
//! read_request → drain → match_request → resolve → Response::write_to → close
//! ```
//!
//! Por defecto atiende una conexión a la vez: la siguiente se acepta recién
//! cuando la anterior se cerró. Con `threaded` cada conexión va a su propio
//! thread. En ambos modos la tabla de recursos y la gramática se crean una
//! sola vez y se comparten de solo lectura.

use crate::config::Config;
use crate::error::{ConnectionError, ServerError};
use crate::http::reader::{self, ReadStatus};
use crate::http::{RequestMatcher, Response, StatusLine, Target, Transport};
use crate::logger::Logger;
use crate::router::ResourceTable;
use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;

/// Resumen de una conexión atendida
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    /// Cómo terminó la lectura
    pub read_status: ReadStatus,

    /// Resultado de validar la request line
    pub target: Target,

    /// Alias del recurso servido
    pub served: String,

    /// Estado con el que se respondió
    pub status: StatusLine,

    /// Bytes escritos (headers + body)
    pub bytes_sent: usize,
}

/// Todo lo que necesita una conexión. Clonarlo solo clona los `Arc`.
#[derive(Debug, Clone)]
pub struct ConnectionHandler {
    table: Arc<ResourceTable>,
    matcher: Arc<RequestMatcher>,
    logger: Arc<Logger>,
    buffer_size: usize,
}

impl ConnectionHandler {
    pub fn new(
        table: Arc<ResourceTable>,
        matcher: Arc<RequestMatcher>,
        logger: Arc<Logger>,
        buffer_size: usize,
    ) -> Self {
        Self {
            table,
            matcher,
            logger,
            buffer_size,
        }
    }

    /// Atiende una conexión aceptada y la cierra.
    ///
    /// Los errores quedan en el log; nunca se propagan al loop de `accept`.
    pub fn handle(&self, mut stream: TcpStream) {
        let peer = stream
            .peer_addr()
            .map(|addr| addr.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        match self.serve(&mut stream) {
            Ok(exchange) => {
                self.logger.log(&format!(
                    "{} requested {:?}, served \"{}\" ({}, {} bytes).",
                    peer,
                    exchange.target.identifier(),
                    exchange.served,
                    exchange.status,
                    exchange.bytes_sent
                ));
            }
            Err(e @ ConnectionError::Read(_)) => {
                self.logger.log_error(&format!("{}: failed to read request.", peer), e.io_error());
            }
            Err(e @ (ConnectionError::Write { .. } | ConnectionError::Blocking(_))) => {
                self.logger.log_error(&format!("{}: {}.", peer, e), e.io_error());
            }
        }
        // `stream` se cierra al salir: no hay keep-alive
    }

    /// Lee, valida, resuelve y responde sobre cualquier transporte
    pub fn serve<T: Transport>(&self, stream: &mut T) -> Result<Exchange, ConnectionError> {
        let request = reader::read_request(stream, self.buffer_size)?;
        tracing::debug!(bytes = request.len(), status = ?request.status(), "request read");

        if request.status() == ReadStatus::TooLarge {
            self.logger.log(&format!(
                "Request header too large (buffer of {} bytes filled without terminator).",
                self.buffer_size
            ));
        }

        if request.status().should_drain() {
            let drained = reader::drain(stream).map_err(ConnectionError::Blocking)?;
            if drained > 0 {
                tracing::debug!(drained, "discarded trailing input");
            }
        }

        let target = self.matcher.match_request(request.bytes());
        if target.is_bad_request() {
            self.logger.log("Bad request line.");
        }

        let resource = self.table.resolve(&target);
        let bytes_sent = Response::new(resource).write_to(stream)?;

        Ok(Exchange {
            read_status: request.status(),
            target,
            served: resource.alias().to_string(),
            status: resource.status().clone(),
            bytes_sent,
        })
    }
}

/// Servidor HTTP con su socket ya escuchando.
///
/// La tabla de recursos no es parte del servidor: se carga recién después de
/// bajar privilegios y se entrega a [`Server::run`].
pub struct Server {
    listener: TcpListener,
    matcher: Arc<RequestMatcher>,
    logger: Arc<Logger>,
    buffer_size: usize,
    threaded: bool,
}

impl Server {
    /// Compila la gramática y abre el socket de escucha. No lee ningún recurso.
    pub fn bind(config: &Config, logger: Arc<Logger>) -> Result<Self, ServerError> {
        let matcher = RequestMatcher::new()?;
        let listener = super::listener::bind(&config.host, config.port_number()?, config.backlog)?;

        Ok(Self {
            listener,
            matcher: Arc::new(matcher),
            logger,
            buffer_size: config.buffer_size,
            threaded: config.threaded,
        })
    }

    /// Arranque completo: bind, `lower_privileges`, carga de recursos.
    ///
    /// Los archivos se leen con los privilegios que queden después de
    /// `lower_privileges`; si esa bajada falla no se lee ninguno.
    pub fn start<F>(
        config: &Config,
        logger: Arc<Logger>,
        lower_privileges: F,
    ) -> Result<(Self, ResourceTable), ServerError>
    where
        F: FnOnce() -> Result<(), ServerError>,
    {
        let server = Self::bind(config, Arc::clone(&logger))?;
        lower_privileges()?;
        let table = ResourceTable::load(config, &logger)?;
        Ok((server, table))
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Handler de conexiones sobre `table`
    pub fn handler(&self, table: ResourceTable) -> ConnectionHandler {
        ConnectionHandler::new(
            Arc::new(table),
            Arc::clone(&self.matcher),
            Arc::clone(&self.logger),
            self.buffer_size,
        )
    }

    /// Loop de `accept`. Solo retorna si el listener deja de producir conexiones.
    pub fn run(&self, table: ResourceTable) -> Result<(), ServerError> {
        let handler = self.handler(table);
        let mode = if self.threaded { "one thread per connection" } else { "one connection at a time" };
        self.logger.log(&format!(
            "Listening on {} ({}).",
            self.local_addr()?,
            mode
        ));

        for stream in self.listener.incoming() {
            match stream {
                Ok(stream) if self.threaded => {
                    let handler = handler.clone();
                    thread::spawn(move || handler.handle(stream));
                }
                Ok(stream) => handler.handle(stream),
                Err(e) => {
                    self.logger.log_error("Failed to accept connection.", &e);
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResourceDef;
    use crate::http::transport::mock::ChunkedStream;
    use crate::resource::Resource;
    use std::fs;
    use std::io::{Read, Write};
    use std::path::PathBuf;
    use std::sync::Mutex;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Captured {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn handler_with(buffer_size: usize) -> (ConnectionHandler, Captured) {
        let mut table = ResourceTable::new(Resource::not_found(StatusLine::default()));
        table.push(Resource::new(
            "index",
            "text/html",
            StatusLine::default(),
            b"<html>ok</html>".to_vec(),
        ));
        table.push(Resource::new(
            "old",
            "text/plain",
            StatusLine::parse("410 Gone").unwrap(),
            b"gone".to_vec(),
        ));

        let captured = Captured::default();
        let handler = ConnectionHandler::new(
            Arc::new(table),
            Arc::new(RequestMatcher::new().unwrap()),
            Arc::new(Logger::with_writer(captured.clone())),
            buffer_size,
        );
        (handler, captured)
    }

    fn ephemeral_listener() -> TcpListener {
        TcpListener::bind("127.0.0.1:0").expect("bind")
    }

    #[test]
    fn test_serve_index() {
        let (handler, _) = handler_with(1024);
        let mut stream = ChunkedStream::new(&[b"GET /index HTTP/1.1\r\nHost: x\r\n\r\n"]);

        let exchange = handler.serve(&mut stream).unwrap();

        assert_eq!(exchange.served, "index");
        assert_eq!(exchange.read_status, ReadStatus::Complete);
        let text = String::from_utf8(stream.written).unwrap();
        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.ends_with("\r\n\r\n<html>ok</html>"));
    }

    #[test]
    fn test_serve_root_is_index() {
        let (handler, _) = handler_with(1024);
        let mut stream = ChunkedStream::new(&[b"GET / HTTP/1.0\r\n\r\n"]);
        let exchange = handler.serve(&mut stream).unwrap();
        assert_eq!(exchange.target, Target::Alias("index".to_string()));
        assert_eq!(exchange.served, "index");
    }

    #[test]
    fn test_serve_configured_status() {
        let (handler, _) = handler_with(1024);
        let mut stream = ChunkedStream::new(&[b"GET /old HTTP/1.1\r\n\r\n"]);
        handler.serve(&mut stream).unwrap();
        assert!(stream.written.starts_with(b"HTTP/1.1 410 Gone\r\n"));
    }

    #[test]
    fn test_bad_request_serves_fallback_page() {
        let (handler, captured) = handler_with(1024);
        let mut stream = ChunkedStream::new(&[b"DELETE /index HTTP/1.1\r\n\r\n"]);

        let exchange = handler.serve(&mut stream).unwrap();

        assert!(exchange.target.is_bad_request());
        assert_eq!(exchange.status.as_str(), "200 OK");
        assert!(String::from_utf8_lossy(&stream.written).ends_with("Not found.</BODY></HTML>"));
        assert!(captured.text().contains("Bad request line."));
    }

    #[test]
    fn test_empty_request_still_answers() {
        let (handler, _) = handler_with(1024);
        let mut stream = ChunkedStream::new(&[]);
        stream.close_at_end = true;

        let exchange = handler.serve(&mut stream).unwrap();

        assert_eq!(exchange.read_status, ReadStatus::Empty);
        assert!(exchange.target.is_bad_request());
        assert!(stream.written.starts_with(b"HTTP/1.1 200 OK\r\n"));
    }

    #[test]
    fn test_too_large_is_logged_and_served() {
        let (handler, captured) = handler_with(16);
        let mut stream = ChunkedStream::new(&[b"GET /index HTTP/1.1\r\nHost: a-very-long-host\r\n\r\n"]);

        let exchange = handler.serve(&mut stream).unwrap();

        assert_eq!(exchange.read_status, ReadStatus::TooLarge);
        // 16 bytes no alcanzan para una línea completa
        assert!(exchange.target.is_bad_request());
        assert!(captured.text().contains("Request header too large"));
    }

    #[test]
    fn test_trailing_body_is_drained() {
        let (handler, _) = handler_with(1024);
        let mut stream = ChunkedStream::new(&[b"GET /index HTTP/1.1\r\n\r\n"]);
        stream.trailing.extend(b"unwanted body");

        handler.serve(&mut stream).unwrap();

        assert!(stream.trailing.is_empty());
        assert!(!stream.is_nonblocking());
    }

    #[test]
    fn test_stuck_nonblocking_aborts_before_writing() {
        let (handler, _) = handler_with(1024);
        let mut stream = ChunkedStream::new(&[b"GET /index HTTP/1.1\r\n\r\n"]);
        stream.fail_restore = true;

        let err = handler.serve(&mut stream).unwrap_err();

        assert!(matches!(err, ConnectionError::Blocking(_)));
        assert!(stream.written.is_empty());
    }

    #[test]
    fn test_first_read_error_sends_nothing() {
        let (handler, _) = handler_with(1024);
        let mut stream = ChunkedStream::new(&[]);

        let err = handler.serve(&mut stream).unwrap_err();

        assert!(matches!(err, ConnectionError::Read(_)));
        assert!(stream.written.is_empty());
    }

    #[test]
    fn test_write_failure_is_reported() {
        let (handler, _) = handler_with(1024);
        let mut stream = ChunkedStream::new(&[b"GET /index HTTP/1.1\r\n\r\n"]);
        stream.fail_after = Some(5);

        let err = handler.serve(&mut stream).unwrap_err();
        assert!(matches!(err, ConnectionError::Write { sent: 5, .. }));
    }

    #[test]
    fn test_handle_over_loopback() {
        let listener = ephemeral_listener();
        let addr = listener.local_addr().unwrap();
        let (handler, captured) = handler_with(1024);

        let t = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            handler.handle(stream);
        });

        let mut client = TcpStream::connect(addr).unwrap();
        client.write_all(b"GET /index HTTP/1.1\r\n\r\n").unwrap();

        // Sin shutdown de escritura: el servidor corta en el terminador
        let mut buf = Vec::new();
        client.read_to_end(&mut buf).unwrap();
        t.join().unwrap();

        assert_eq!(
            buf,
            b"HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: 15\r\nConnection: close\r\n\r\n<html>ok</html>"
        );
        assert!(captured.text().contains("served \"index\" (200 OK, "));
    }

    #[test]
    fn test_handle_peer_closed_immediately() {
        let listener = ephemeral_listener();
        let addr = listener.local_addr().unwrap();
        let (handler, captured) = handler_with(1024);

        let t = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            handler.handle(stream);
        });

        drop(TcpStream::connect(addr).unwrap());
        t.join().unwrap();

        // Se intenta responder aunque el peer ya no esté; lo que pase queda en el log
        assert!(!captured.text().is_empty());
    }

    fn loopback_config(resources: Vec<ResourceDef>) -> Config {
        Config {
            host: "127.0.0.1".to_string(),
            port: "0".to_string(),
            resources,
            ..Config::default()
        }
    }

    #[test]
    fn test_start_loads_resources_after_lowering_privileges() {
        let dir = tempfile::tempdir().unwrap();
        let index = dir.path().join("main.htm");
        fs::write(&index, "<html>ok</html>").unwrap();
        let config = loopback_config(vec![ResourceDef {
            path: Some(index),
            alias: Some("index".to_string()),
            ..Default::default()
        }]);

        let captured = Captured::default();
        let logger = Arc::new(Logger::with_writer(captured.clone()));
        let marker = Arc::clone(&logger);

        let (server, table) = Server::start(&config, logger, move || {
            marker.log("privileges lowered");
            Ok(())
        })
        .unwrap();

        let log = captured.text();
        let lowered = log.find("privileges lowered").unwrap();
        let loaded = log.find("Loaded 1 resources.").unwrap();
        assert!(lowered < loaded);
        assert_eq!(table.len(), 2);
        assert!(server.local_addr().unwrap().port() > 0);
    }

    #[test]
    fn test_start_reads_nothing_if_lowering_fails() {
        // Un archivo inexistente daría ResourceLoad si se llegara a leer
        let config = loopback_config(vec![ResourceDef {
            path: Some(PathBuf::from("/definitely/not/here.htm")),
            alias: Some("index".to_string()),
            ..Default::default()
        }]);
        let logger = Arc::new(Logger::with_writer(io::sink()));

        let err = Server::start(&config, logger, || {
            Err(ServerError::Privilege {
                step: "setuid",
                source: io::Error::from_raw_os_error(1),
            })
        })
        .err()
        .unwrap();

        assert!(matches!(err, ServerError::Privilege { step: "setuid", .. }));
    }

    #[test]
    fn test_bind_does_not_touch_resources() {
        let config = loopback_config(vec![ResourceDef {
            path: Some(PathBuf::from("/definitely/not/here.htm")),
            alias: Some("index".to_string()),
            ..Default::default()
        }]);
        let server = Server::bind(&config, Arc::new(Logger::with_writer(io::sink()))).unwrap();
        assert!(server.local_addr().is_ok());
    }
}
