//! `heartline config` — Print or check configuration.

use heartline_config::AppConfig;

const REDACTED: &str = "***";

/// A copy of `config` safe to print: every API key is masked.
fn redacted(config: &AppConfig) -> AppConfig {
    let mut config = config.clone();
    if config.api_key.is_some() {
        config.api_key = Some(REDACTED.into());
    }
    for provider in config.providers.values_mut() {
        if provider.api_key.is_some() {
            provider.api_key = Some(REDACTED.into());
        }
    }
    config
}

pub fn show() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    println!("{}", toml::to_string_pretty(&redacted(&config))?);
    Ok(())
}

pub fn defaults() -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", AppConfig::default_toml());
    Ok(())
}

pub fn path() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = AppConfig::config_dir().join("config.toml");
    println!("{}", config_path.display());
    Ok(())
}

/// Warnings about a config that parsed but will degrade at runtime.
fn warnings(config: &AppConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if !config.has_api_key() && config.default_provider != "ollama" {
        warnings.push("No API key set (set OPENROUTER_API_KEY or HEARTLINE_API_KEY)".to_string());
    }

    if matches!(config.index.backend.as_str(), "sqlite" | "file")
        && !config.index.resolved_path().exists()
    {
        warnings.push(format!(
            "Index file {} does not exist; replies will use no exemplars",
            config.index.resolved_path().display()
        ));
    }

    if config.index.backend == "none" {
        warnings.push("Index backend is 'none'; every emotion will be neutral".to_string());
    }

    if config
        .fallback_providers
        .iter()
        .any(|p| p == &config.default_provider)
    {
        warnings.push("Default provider is also listed as a fallback".to_string());
    }

    warnings
}

pub fn validate() -> Result<(), Box<dyn std::error::Error>> {
    println!("Validating configuration...");

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            println!("   Config error: {e}");
            return Err(e.into());
        }
    };
    println!("   Config parsed successfully");

    let warnings = warnings(&config);
    if warnings.is_empty() {
        println!("   All checks passed");
    } else {
        println!();
        for w in &warnings {
            println!("   warning: {w}");
        }
    }

    println!();
    println!("   Provider:  {}", config.default_provider);
    println!("   Model:     {}", config.default_model);
    println!("   Index:     {} ({})", config.index.backend, config.index.collection);
    println!("   Embedder:  {}", config.index.embedding_provider);

    Ok(())
}
