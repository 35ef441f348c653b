//! # Static HTTPD - Entry Point
//! src/main.rs
//!
//! Secuencia de arranque:
//!
//! 1. CLI + archivo de configuración
//! 2. Logger
//! 3. Gramática + socket de escucha
//! 4. Si corremos como root, bajar privilegios
//! 5. Carga de recursos a memoria, ya sin privilegios
//! 6. Loop de conexiones
//!
//! Cualquier fallo en 1-5 termina el proceso con código 1.

use clap::Parser;
use static_httpd::config::{Cli, Config};
use static_httpd::error::ServerError;
use static_httpd::logger::Logger;
use static_httpd::privilege;
use static_httpd::server::Server;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Sin configuración todavía no sabemos dónde está el log
    let config = match Config::load(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("💥 Error de configuración: {}", e);
            std::process::exit(1);
        }
    };

    println!("=================================");
    println!("  Static HTTPD");
    println!("=================================\n");
    println!("⚙️  Configuración:");
    println!("   Puerto: {}", config.port);
    println!("   Host: {}", config.host);
    println!("   Log: {}", config.log_file.display());
    println!("   Recursos: {}", config.resources.len());
    println!();

    let logger = Arc::new(Logger::new(&config.log_file));

    if let Err(e) = run(&config, Arc::clone(&logger)) {
        match e.os_error() {
            Some(os_error) => logger.log_error(&e.to_string(), os_error),
            None => logger.log(&e.to_string()),
        }
        eprintln!("💥 Error fatal: {}", e);
        std::process::exit(1);
    }

    logger.log("Program ended.");
}

fn run(config: &Config, logger: Arc<Logger>) -> Result<(), ServerError> {
    logger.log("Program started.");

    let (server, table) = Server::start(config, Arc::clone(&logger), || {
        if privilege::is_elevated() {
            logger.log("Root privileges detected. Dropping.");
            privilege::drop_privileges(config.user_id, config.group_id)?;
            logger.log("Root privileges dropped.");
        }
        Ok(())
    })?;
    for resource in table.iter().skip(1) {
        tracing::info!(alias = resource.alias(), bytes = resource.len(), "resource loaded");
    }

    server.run(table)
}
