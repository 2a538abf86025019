use cotiza_core::config::{AppConfig, LoadOptions};
use secrecy::ExposeSecret;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    lines.push(render_line("database.url", &config.database.url));
    lines.push(render_line(
        "database.max_connections",
        &config.database.max_connections.to_string(),
    ));
    lines.push(render_line("database.timeout_secs", &config.database.timeout_secs.to_string()));
    lines.push(render_line("server.bind_address", &config.server.bind_address));
    lines.push(render_line("server.port", &config.server.port.to_string()));
    lines.push(render_line("llm.base_url", &config.llm.base_url));
    lines.push(render_line("llm.model", &config.llm.model));
    lines.push(render_line("llm.api_key", &redact(config.llm.api_key.as_ref())));
    lines.push(render_line("email.base_url", &config.email.base_url));
    lines.push(render_line("email.sender", &config.email.sender));
    lines.push(render_line("email.api_key", &redact(config.email.api_key.as_ref())));
    lines.push(render_line(
        "storage.signature_max_bytes",
        &config.storage.signature_max_bytes.to_string(),
    ));
    lines.push(render_line("storage.logo_max_bytes", &config.storage.logo_max_bytes.to_string()));
    lines.push(render_line("logging.level", &config.logging.level));
    lines.push(render_line("logging.format", &format!("{:?}", config.logging.format)));

    lines.join("\n")
}

fn render_line(key: &str, value: &str) -> String {
    format!("  {key} = {value}")
}

fn redact(secret: Option<&secrecy::SecretString>) -> String {
    match secret {
        None => "(unset)".to_string(),
        Some(value) if value.expose_secret().trim().is_empty() => "(unset)".to_string(),
        Some(_) => "********".to_string(),
    }
}
