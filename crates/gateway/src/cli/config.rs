use cm_domain::config::{Config, ConfigSeverity};

/// Print every validation issue. Returns `false` when any is an error.
pub fn validate(config: &Config, config_path: &str) -> bool {
    let issues = config.validate();

    if issues.is_empty() {
        println!("Config OK ({config_path})");
        return true;
    }

    let error_count = issues
        .iter()
        .filter(|e| e.severity == ConfigSeverity::Error)
        .count();
    let warning_count = issues.len() - error_count;

    for issue in &issues {
        println!("{issue}");
    }

    println!("\n{error_count} error(s), {warning_count} warning(s) in {config_path}");

    error_count == 0
}

/// Dump the resolved config (with all defaults filled in) as TOML.
///
/// Credentials are referenced by env var name; inline keys are masked.
pub fn show(config: &Config) -> anyhow::Result<()> {
    let output = render(config)?;
    print!("{output}");
    Ok(())
}

fn render(config: &Config) -> anyhow::Result<String> {
    let mut redacted = config.clone();
    mask(&mut redacted.llm.auth.key);
    mask(&mut redacted.sources.tmdb.auth.key);
    mask(&mut redacted.sources.rawg.auth.key);
    mask(&mut redacted.sources.serper.auth.key);
    toml::to_string_pretty(&redacted).map_err(|e| anyhow::anyhow!("serializing config: {e}"))
}

fn mask(key: &mut Option<String>) {
    if key.is_some() {
        *key = Some("********".into());
    }
}
