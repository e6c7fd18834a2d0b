use std::net::SocketAddr;

use super::schema::Config;

/// Validate configuration at startup.
/// Returns all validation errors at once (not just the first).
pub fn validate_config(config: &Config) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if config.server.bind.parse::<SocketAddr>().is_err() {
        errors.push(format!(
            "server.bind: invalid socket address '{}'",
            config.server.bind
        ));
    }

    let url = config.classifier.url.trim();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        errors.push(format!(
            "classifier.url: must be an http(s) URL, got '{}'",
            config.classifier.url
        ));
    }

    if let Err(e) = humantime::parse_duration(&config.classifier.timeout) {
        errors.push(format!(
            "classifier.timeout: invalid duration '{}' - {}",
            config.classifier.timeout, e
        ));
    }

    if config.ranking.max_concurrent_classifications == 0 {
        errors.push("ranking.max_concurrent_classifications: must be at least 1".to_string());
    }

    if let Err(e) = humantime::parse_duration(&config.ranking.request_timeout) {
        errors.push(format!(
            "ranking.request_timeout: invalid duration '{}' - {}",
            config.ranking.request_timeout, e
        ));
    }

    if config.ranking.default_years.iter().all(|y| y.trim().is_empty()) {
        errors.push("ranking.default_years: must name at least one year".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
