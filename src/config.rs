//! Configuration management for the render server

use std::env;
use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

/// 8192 x 8192
pub const DEFAULT_MAX_PIXELS: u64 = 67_108_864;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub pdfium: PdfiumConfig,
    pub render: RenderConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PdfiumConfig {
    /// Directory holding the PDFium shared library
    pub library_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RenderConfig {
    /// Largest output a single render may produce
    pub max_pixels: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            pdfium: PdfiumConfig { library_path: None },
            render: RenderConfig {
                max_pixels: DEFAULT_MAX_PIXELS,
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Config::default();

        Ok(Config {
            server: ServerConfig {
                host: var("SERVER_HOST").unwrap_or(defaults.server.host),
                port: parse_var(&var, "SERVER_PORT")?.unwrap_or(defaults.server.port),
            },
            pdfium: PdfiumConfig {
                library_path: var("PDFIUM_LIBRARY_PATH")
                    .filter(|p| !p.trim().is_empty())
                    .map(PathBuf::from),
            },
            render: RenderConfig {
                max_pixels: parse_var::<u64>(&var, "RENDER_MAX_PIXELS")?
                    .filter(|&n| n > 0)
                    .unwrap_or(defaults.render.max_pixels),
            },
        })
    }
}

fn parse_var<T: std::str::FromStr>(
    var: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<T>, ConfigError> {
    match var(name) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.render.max_pixels, DEFAULT_MAX_PIXELS);
        assert!(config.pdfium.library_path.is_none());
    }

    #[test]
    fn test_reads_values() {
        let config = Config::from_lookup(lookup(&[
            ("SERVER_HOST", "127.0.0.1"),
            ("SERVER_PORT", "8080"),
            ("PDFIUM_LIBRARY_PATH", "/opt/pdfium/lib"),
            ("RENDER_MAX_PIXELS", "1000000"),
        ]))
        .unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(
            config.pdfium.library_path,
            Some(PathBuf::from("/opt/pdfium/lib"))
        );
        assert_eq!(config.render.max_pixels, 1_000_000);
    }

    #[test]
    fn test_invalid_port() {
        let err = Config::from_lookup(lookup(&[("SERVER_PORT", "eighty")])).unwrap_err();
        assert!(err.to_string().contains("SERVER_PORT"));
    }
}
