//! # Módulo HTTP
//!
//! El protocolo que habla el servidor es deliberadamente mínimo:
//!
//! - Solo `GET`, solo `HTTP/1.0` y `HTTP/1.1`
//! - Una respuesta por conexión (`Connection: close`)
//! - Sin chunked transfer encoding ni keep-alive
//!
//! ### Formato de Request
//!
//! ```text
//! GET /alias HTTP/1.1\r\n
//! Header-Name: Header-Value\r\n
//! \r\n
//! ```
//!
//! ### Formato de Response
//!
//! ```text
//! HTTP/1.1 200 OK\r\n
//! Content-Type: text/html\r\n
//! Content-Length: 15\r\n
//! Connection: close\r\n
//! \r\n
//! <html>ok</html>
//! ```

pub mod matcher;   // Validación de la request line
pub mod reader;    // Lectura del request desde el socket
pub mod response;  // Envío de la respuesta
pub mod status;    // Texto de la línea de estado
pub mod transport; // Abstracción del socket

pub use matcher::{RequestMatcher, Target};
pub use reader::{InboundRequest, ReadStatus};
pub use response::Response;
pub use status::StatusLine;
pub use transport::Transport;
