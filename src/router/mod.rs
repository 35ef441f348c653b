//! # Tabla de recursos
//! src/router/mod.rs
//!
//! Mapea el identificador extraído del request a un recurso precargado.
//!
//! ```text
//! Target → ResourceTable::resolve → Resource
//! ```
//!
//! La tabla es una lista ordenada con la página de "no encontrado" en la
//! posición 0. Son decenas de entradas como mucho, así que la búsqueda es
//! lineal.
//!
//! ## Desempate
//!
//! Si varios recursos comparten alias gana el **último** de la lista que
//! tenga contenido. Los recursos vacíos se ignoran.

use crate::config::{Config, ResourceDef};
use crate::error::{ConfigError, ServerError};
use crate::http::{StatusLine, Target};
use crate::logger::Logger;
use crate::resource::{check_content_type, Resource, DEFAULT_CONTENT_TYPE, NOT_FOUND_ALIAS};

/// Recursos servibles, inmutables después del arranque
#[derive(Debug, Clone)]
pub struct ResourceTable {
    /// `entries[0]` es siempre la página de "no encontrado"
    entries: Vec<Resource>,
}

impl ResourceTable {
    /// Crea una tabla que solo contiene el fallback
    pub fn new(fallback: Resource) -> Self {
        Self {
            entries: vec![fallback],
        }
    }

    /// Agrega un recurso al final de la tabla
    pub fn push(&mut self, resource: Resource) {
        self.entries.push(resource);
    }

    /// Construye la tabla completa desde la configuración.
    ///
    /// Las definiciones sin `path` o `alias` se descartan con un aviso en el
    /// log. Un archivo que no se puede leer aborta el arranque.
    pub fn load(config: &Config, logger: &Logger) -> Result<Self, ServerError> {
        let mut table = Self::new(Self::load_fallback(config)?);

        for (position, def) in config.resources.iter().enumerate() {
            let Some(entry) = def.to_entry() else {
                logger.log(&skipped_message(position, def));
                continue;
            };

            let status = StatusLine::parse(&entry.status_code).map_err(ConfigError::from)?;
            let content_type = check_content_type(&entry.content_type)?;
            let resource = Resource::load(&entry.path, &entry.alias, content_type, status)?;
            if resource.is_empty() {
                logger.log(&format!(
                    "Resource \"{}\" ({}) is empty and will never be served.",
                    entry.alias,
                    entry.path.display()
                ));
            }
            table.push(resource);
        }

        logger.log(&format!("Loaded {} resources.", table.len() - 1));
        Ok(table)
    }

    fn load_fallback(config: &Config) -> Result<Resource, ServerError> {
        let Some(fallback) = &config.fallback else {
            return Ok(Resource::not_found(StatusLine::default()));
        };

        let status = match &fallback.status_code {
            Some(text) => StatusLine::parse(text).map_err(ConfigError::from)?,
            None => StatusLine::default(),
        };
        match &fallback.path {
            Some(path) => {
                let content_type =
                    check_content_type(fallback.content_type.as_deref().unwrap_or(DEFAULT_CONTENT_TYPE))?;
                Resource::load(path, NOT_FOUND_ALIAS, content_type, status)
            }
            None => Ok(Resource::not_found(status)),
        }
    }

    /// Página que se sirve cuando ningún alias coincide
    pub fn fallback(&self) -> &Resource {
        &self.entries[0]
    }

    /// Cantidad de entradas, incluyendo el fallback
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// La tabla siempre tiene al menos el fallback
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn iter(&self) -> impl Iterator<Item = &Resource> {
        self.entries.iter()
    }

    /// Resuelve un identificador a un recurso.
    ///
    /// Parte del fallback y recorre el resto en orden; cada entrada con el
    /// mismo alias y contenido no vacío reemplaza al resultado, así que gana
    /// la última.
    ///
    /// # Ejemplo
    /// ```
    /// use static_httpd::http::{StatusLine, Target};
    /// use static_httpd::resource::Resource;
    /// use static_httpd::router::ResourceTable;
    ///
    /// let mut table = ResourceTable::new(Resource::not_found(StatusLine::default()));
    /// table.push(Resource::new("x", "text/plain", StatusLine::default(), b"1".to_vec()));
    /// table.push(Resource::new("x", "text/plain", StatusLine::default(), b"2".to_vec()));
    ///
    /// let found = table.resolve(&Target::Alias("x".to_string()));
    /// assert_eq!(found.body(), b"2");
    /// ```
    pub fn resolve(&self, target: &Target) -> &Resource {
        let identifier = target.identifier();

        let mut result = self.fallback();
        for entry in &self.entries[1..] {
            if entry.alias() == identifier && !entry.is_empty() {
                result = entry;
            }
        }
        result
    }
}

fn skipped_message(position: usize, def: &ResourceDef) -> String {
    let missing = match (&def.path, def.alias.as_deref().filter(|alias| !alias.is_empty())) {
        (None, None) => "path and alias",
        (None, Some(_)) => "path",
        _ => "alias",
    };
    format!("Skipping resource #{}: missing {}.", position, missing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FallbackDef;
    use std::fs;
    use std::io::{self, Write};
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    fn page(alias: &str, body: &[u8]) -> Resource {
        Resource::new(alias, "text/plain", StatusLine::default(), body.to_vec())
    }

    fn table(entries: &[Resource]) -> ResourceTable {
        let mut table = ResourceTable::new(Resource::not_found(StatusLine::default()));
        for entry in entries {
            table.push(entry.clone());
        }
        table
    }

    fn alias(name: &str) -> Target {
        Target::Alias(name.to_string())
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_exact_match() {
        let table = table(&[page("a", b"A"), page("b", b"B")]);
        assert_eq!(table.resolve(&alias("b")).body(), b"B");
        assert_eq!(table.resolve(&alias("a")).body(), b"A");
    }

    #[test]
    fn test_last_match_wins() {
        let table = table(&[page("x", b"1"), page("x", b"2")]);
        assert_eq!(table.resolve(&alias("x")).body(), b"2");
    }

    #[test]
    fn test_empty_body_is_ignored() {
        let table = table(&[page("x", b"")]);
        assert_eq!(table.resolve(&alias("x")), table.fallback());
    }

    #[test]
    fn test_empty_later_entry_does_not_override() {
        let table = table(&[page("x", b"1"), page("x", b"")]);
        assert_eq!(table.resolve(&alias("x")).body(), b"1");
    }

    #[test]
    fn test_unknown_alias_gets_fallback() {
        let table = table(&[page("a", b"A")]);
        assert_eq!(table.resolve(&alias("zzz")), table.fallback());
    }

    #[test]
    fn test_match_is_case_sensitive() {
        let table = table(&[page("Index", b"I")]);
        assert_eq!(table.resolve(&alias("index")), table.fallback());
    }

    #[test]
    fn test_bad_request_uses_fallback_status() {
        let table = table(&[page("a", b"A")]);
        let resolved = table.resolve(&Target::BadRequest);
        assert_eq!(resolved, table.fallback());
        assert_eq!(resolved.status().as_str(), "200 OK");
    }

    #[test]
    fn test_bad_request_can_be_configured() {
        let bad = Resource::new(
            "400",
            "text/plain",
            StatusLine::parse("400 Bad Request").unwrap(),
            b"bad request".to_vec(),
        );
        let table = table(&[bad]);
        assert_eq!(table.resolve(&Target::BadRequest).status().code(), Some(400));
    }

    #[test]
    fn test_fallback_alias_is_not_routable() {
        let table = table(&[]);
        assert_eq!(table.len(), 1);
        // El fallback nunca participa del recorrido
        assert_eq!(table.resolve(&alias(crate::resource::NOT_FOUND_ALIAS)), table.fallback());
    }

    #[test]
    fn test_load_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let index = dir.path().join("main.htm");
        fs::write(&index, "<html>ok</html>").unwrap();

        let config = Config {
            resources: vec![
                ResourceDef {
                    path: Some(index.clone()),
                    alias: Some("index".to_string()),
                    content_type: Some("text/html".to_string()),
                    ..Default::default()
                },
                ResourceDef {
                    alias: Some("orphan".to_string()),
                    ..Default::default()
                },
            ],
            ..Config::default()
        };
        let captured = Captured::default();
        let logger = Logger::with_writer(captured.clone());

        let table = ResourceTable::load(&config, &logger).unwrap();

        assert_eq!(table.len(), 2);
        let resolved = table.resolve(&alias("index"));
        assert_eq!(resolved.body(), b"<html>ok</html>");
        assert_eq!(resolved.content_type(), "text/html");
        assert_eq!(resolved.status().as_str(), "200 OK");

        let log = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(log.contains("Skipping resource #1: missing path."));
        assert!(log.contains("Loaded 1 resources."));
    }

    #[test]
    fn test_load_missing_file_is_fatal() {
        let config = Config {
            resources: vec![ResourceDef {
                path: Some(PathBuf::from("/definitely/not/here.htm")),
                alias: Some("index".to_string()),
                ..Default::default()
            }],
            ..Config::default()
        };
        let logger = Logger::with_writer(io::sink());

        let err = ResourceTable::load(&config, &logger).unwrap_err();
        assert!(matches!(err, ServerError::ResourceLoad { .. }));
    }

    #[test]
    fn test_load_rejects_bad_status_line() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.txt");
        fs::write(&file, "a").unwrap();

        let config = Config {
            resources: vec![ResourceDef {
                path: Some(file),
                alias: Some("a".to_string()),
                status_code: Some("200 OK\r\nSet-Cookie: x".to_string()),
                ..Default::default()
            }],
            ..Config::default()
        };

        let err = ResourceTable::load(&config, &Logger::with_writer(io::sink())).unwrap_err();
        assert!(matches!(err, ServerError::Config(_)));
    }

    #[test]
    fn test_load_rejects_bad_content_type() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.txt");
        fs::write(&file, "a").unwrap();

        let config = Config {
            resources: vec![ResourceDef {
                path: Some(file),
                alias: Some("a".to_string()),
                content_type: Some("text/html\r\nSet-Cookie: x=1".to_string()),
                ..Default::default()
            }],
            ..Config::default()
        };

        let err = ResourceTable::load(&config, &Logger::with_writer(io::sink())).unwrap_err();
        assert!(matches!(err, ServerError::Config(ConfigError::ContentType(_))));
    }

    #[test]
    fn test_fallback_rejects_bad_content_type() {
        let dir = tempfile::tempdir().unwrap();
        let page = dir.path().join("404.htm");
        fs::write(&page, "<p>nothing</p>").unwrap();

        let config = Config {
            fallback: Some(FallbackDef {
                path: Some(page),
                content_type: Some("text/html\nX-Injected: 1".to_string()),
                ..Default::default()
            }),
            ..Config::default()
        };

        let err = ResourceTable::load(&config, &Logger::with_writer(io::sink())).unwrap_err();
        assert!(matches!(err, ServerError::Config(ConfigError::ContentType(_))));
    }

    #[test]
    fn test_configured_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let missing_page = dir.path().join("404.htm");
        fs::write(&missing_page, "<p>nothing here</p>").unwrap();

        let config = Config {
            fallback: Some(FallbackDef {
                path: Some(missing_page),
                status_code: Some("404 Not Found".to_string()),
                content_type: Some("text/html".to_string()),
            }),
            ..Config::default()
        };

        let table = ResourceTable::load(&config, &Logger::with_writer(io::sink())).unwrap();
        let fallback = table.fallback();
        assert_eq!(fallback.body(), b"<p>nothing here</p>");
        assert_eq!(fallback.status().code(), Some(404));
        assert_eq!(fallback.content_type(), "text/html");
    }

    #[test]
    fn test_fallback_status_only() {
        let config = Config {
            fallback: Some(FallbackDef {
                status_code: Some("404 Not Found".to_string()),
                ..Default::default()
            }),
            ..Config::default()
        };
        let table = ResourceTable::load(&config, &Logger::with_writer(io::sink())).unwrap();
        assert_eq!(table.fallback().body(), crate::resource::NOT_FOUND_BODY.as_bytes());
        assert_eq!(table.fallback().status().as_str(), "404 Not Found");
    }
}
