//! # Log del servidor
//! src/logger.rs
//!
//! Log append-only con una línea por evento:
//!
//! ```text
//! [1760862000] Program started.
//! [1760862003] Failed to write response.
//! Error #32: Broken pipe
//! ```
//!
//! Mientras el proceso corre como root se escribe en stdout (no se toca el
//! filesystem con privilegios); después de bajar privilegios se escribe en el
//! archivo de log. El destino se decide en cada llamada.
//!
//! El `Logger` se construye explícitamente en `main` y se comparte por `Arc`.

use crate::privilege;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

enum Destination {
    /// stdout con root, archivo sin root
    Auto { path: PathBuf },

    /// Writer fijo (tests, o salida redirigida)
    Writer(Mutex<Box<dyn Write + Send>>),
}

/// Sink de log del proceso
pub struct Logger {
    destination: Destination,
}

impl Logger {
    /// Logger que escribe en `path` (o en stdout mientras haya privilegios)
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            destination: Destination::Auto { path: path.into() },
        }
    }

    /// Logger que siempre escribe en `writer`
    pub fn with_writer<W: Write + Send + 'static>(writer: W) -> Self {
        Self {
            destination: Destination::Writer(Mutex::new(Box::new(writer))),
        }
    }

    pub fn log(&self, message: &str) {
        self.emit(&format_entry(now(), message, None));
    }

    /// Registra el mensaje y, si es un error del sistema, su código y texto
    pub fn log_error(&self, message: &str, error: &io::Error) {
        self.emit(&format_entry(now(), message, Some(error)));
    }

    fn emit(&self, entry: &str) {
        match &self.destination {
            Destination::Auto { path } => {
                if privilege::is_elevated() {
                    let mut stdout = io::stdout().lock();
                    let _ = stdout.write_all(entry.as_bytes());
                    let _ = stdout.flush();
                    return;
                }
                let written = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .and_then(|mut file| file.write_all(entry.as_bytes()));
                if let Err(e) = written {
                    tracing::warn!(path = %path.display(), error = %e, "cannot write log file");
                    eprint!("{}", entry);
                }
            }
            Destination::Writer(writer) => {
                // Un writer envenenado sigue sirviendo para escribir
                let mut writer = writer.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                let _ = writer.write_all(entry.as_bytes());
                let _ = writer.flush();
            }
        }
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.destination {
            Destination::Auto { path } => f.debug_struct("Logger").field("path", path).finish(),
            Destination::Writer(_) => f.debug_struct("Logger").field("path", &"<writer>").finish(),
        }
    }
}

fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}

/// Formatea una entrada completa, incluyendo el salto de línea final.
///
/// La línea `Error #...` solo aparece para errores con código del sistema.
pub fn format_entry(timestamp: u64, message: &str, error: Option<&io::Error>) -> String {
    let mut entry = format!("[{}] {}\n", timestamp, message);
    if let Some(code) = error.and_then(io::Error::raw_os_error) {
        entry.push_str(&format!("Error #{}: {}\n", code, os_error_text(code)));
    }
    entry
}

#[cfg(unix)]
fn os_error_text(code: i32) -> &'static str {
    nix::errno::Errno::from_raw(code).desc()
}

#[cfg(not(unix))]
fn os_error_text(code: i32) -> String {
    io::Error::from_raw_os_error(code).to_string()
}
