//! Interactive mode for the server.
//!
//! Prompts the user for bind address, port and store backend before
//! starting the server.

use dialoguer::{Confirm, Input, Select};

/// Runs the server in interactive mode, prompting for configuration.
///
/// Asks the user for a bind address, port and store backend, sets the
/// corresponding environment variables (`BIND_ADDR`, `PORT`,
/// `SAFETY_MAP_STORE_BACKEND`), and delegates to [`super::run_server`].
///
/// # Errors
///
/// Returns an `std::io::Result` error if the store cannot be configured
/// or the underlying server fails to start.
#[allow(clippy::future_not_send)]
pub async fn run() -> std::io::Result<()> {
    println!("Safety Map Server");
    println!();

    let bind_addr: String = Input::new()
        .with_prompt("Bind address")
        .default("127.0.0.1".to_string())
        .interact_text()
        .unwrap_or_else(|_| "127.0.0.1".to_string());

    let port_str: String = Input::new()
        .with_prompt("Port")
        .default("8080".to_string())
        .interact_text()
        .unwrap_or_else(|_| "8080".to_string());

    let backends = ["rest", "memory"];
    let backend = Select::new()
        .with_prompt("Store backend")
        .items(&backends)
        .default(0)
        .interact()
        .unwrap_or(0);

    // SAFETY: We are single-threaded at this point (before server starts) and
    // these variables are only read once during server initialisation.
    unsafe {
        std::env::set_var("BIND_ADDR", &bind_addr);
        std::env::set_var("PORT", &port_str);
        std::env::set_var("SAFETY_MAP_STORE_BACKEND", backends[backend]);
    }

    if !Confirm::new()
        .with_prompt(format!("Start server on {bind_addr}:{port_str}?"))
        .default(true)
        .interact()
        .unwrap_or(true)
    {
        println!("Cancelled.");
        return Ok(());
    }

    let store = super::store_from_env().map_err(std::io::Error::other)?;
    super::run_server(store).await
}
