use dotenvy::dotenv;
use regex::{Captures, Regex};
use serde::de::DeserializeOwned;
use std::path::Path;
use std::{env, fs};
use thiserror::Error;

#[allow(clippy::enum_variant_names)]
#[derive(Debug, Error)]
pub enum LoadConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),
    #[error("Regex error: {0}")]
    RegexError(#[from] regex::Error),
}

pub async fn load_from_file<T: DeserializeOwned>(file_name: impl AsRef<Path>) -> Result<T, LoadConfigError> {
    dotenv().ok();
    let contents = tokio::fs::read_to_string(file_name).await?;
    parse_with_env(&contents)
}

pub fn load_from_file_sync<T: DeserializeOwned>(file_name: impl AsRef<Path>) -> Result<T, LoadConfigError> {
    dotenv().ok();
    let contents = fs::read_to_string(file_name)?;
    parse_with_env(&contents)
}

/// Parse TOML after substituting `${VAR}` references from the environment.
pub fn parse_with_env<T: DeserializeOwned>(raw_config: &str) -> Result<T, LoadConfigError> {
    let contents = expand_vars(raw_config)?;
    let config: T = toml::from_str(&contents)?;
    Ok(config)
}

fn expand_vars(raw_config: &str) -> Result<String, LoadConfigError> {
    let re = Regex::new(r"\$\{([a-zA-Z_][0-9a-zA-Z_]*)\}")?;
    Ok(re
        .replace_all(raw_config, |caps: &Captures| match env::var(&caps[1]) {
            Ok(val) => val,
            Err(_) => caps[0].to_string(),
        })
        .to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Section {
        url: String,
    }

    #[test]
    fn test_unknown_vars_are_left_untouched() {
        let section: Section = parse_with_env("url = \"${SPLIT_ROUTE_SURELY_UNSET_VAR}/rpc\"").unwrap();
        assert_eq!(section.url, "${SPLIT_ROUTE_SURELY_UNSET_VAR}/rpc");
    }

    #[test]
    fn test_known_vars_are_expanded() {
        // PATH is set in every test environment
        let path = env::var("PATH").unwrap();
        let section: Section = parse_with_env("url = \"${PATH}\"").unwrap();
        assert_eq!(section.url, path);
    }

    #[test]
    fn test_missing_file() {
        let result = load_from_file_sync::<Section>("/definitely/not/here.toml");
        assert!(matches!(result, Err(LoadConfigError::IoError(_))));
    }
}
