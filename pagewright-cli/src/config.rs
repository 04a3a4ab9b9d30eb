use anyhow::{Result, bail};
use clap::ArgMatches;
use config::{Config as ConfigBuilder, Environment, File};
use pagewright_core::Format;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_CONFIG_FILE: &str = "./pagewright.toml";

/// Complete configuration that merges CLI args, env vars, config files, and defaults
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PagewrightConfig {
    pub build: BuildConfig,
    pub serve: ServeConfig,
    /// Site configuration (from pagewright-core)
    #[serde(flatten)]
    pub core: pagewright_core::config::Config,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Output directory, or `-` for stdout
    pub output: String,
    /// `md` or `html`
    pub format: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            output: "-".to_string(),
            format: Format::Markdown.as_str().to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServeConfig {
    pub host: String,
    pub port: u16,
    pub open: bool,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            open: false,
        }
    }
}

impl PagewrightConfig {
    /// Load configuration with cascading precedence:
    /// 1. CLI arguments (highest priority)
    /// 2. Environment variables (PAGEWRIGHT_*)
    /// 3. Configuration file
    /// 4. Defaults (lowest priority)
    pub fn load(args: &ArgMatches) -> Result<Self> {
        let explicit = args.try_get_one::<String>("config").unwrap_or(None);
        let config_file = explicit.map(String::as_str).unwrap_or(DEFAULT_CONFIG_FILE);

        let mut builder = ConfigBuilder::builder().add_source(ConfigBuilder::try_from(&Self::default())?);

        if Path::new(config_file).exists() {
            tracing::debug!(file = config_file, "Reading configuration file");
            builder = builder.add_source(File::from(Path::new(config_file)));
        } else if explicit.is_some() {
            bail!("Configuration file not found: {config_file}");
        }

        builder = builder.add_source(
            Environment::with_prefix("PAGEWRIGHT")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        // Only override with CLI args that are actually defined for this command
        if let Some(output) = args.try_get_one::<String>("output").unwrap_or(None) {
            builder = builder.set_override("build.output", output.as_str())?;
        }
        if let Some(format) = args.try_get_one::<String>("format").unwrap_or(None) {
            builder = builder.set_override("build.format", format.as_str())?;
        }
        if let Some(host) = args.try_get_one::<String>("host").unwrap_or(None) {
            builder = builder.set_override("serve.host", host.as_str())?;
        }
        if let Some(port) = args.try_get_one::<u16>("port").unwrap_or(None) {
            builder = builder.set_override("serve.port", i64::from(*port))?;
        }
        if args.try_get_one::<bool>("open").unwrap_or(None) == Some(&true) {
            builder = builder.set_override("serve.open", true)?;
        }

        let config: PagewrightConfig = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    pub fn format(&self) -> Result<Format> {
        Ok(self.build.format.parse()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::{Arg, ArgAction, Command};

    fn command() -> Command {
        Command::new("test")
            .arg(Arg::new("output").short('o').long("output"))
            .arg(Arg::new("format").short('f').long("format"))
            .arg(Arg::new("config").short('c').long("config"))
            .arg(Arg::new("port").long("port").value_parser(clap::value_parser!(u16)))
            .arg(Arg::new("open").long("open").action(ArgAction::SetTrue))
    }

    #[test]
    fn test_default_config() {
        let config = PagewrightConfig::default();
        assert_eq!(config.build.output, "-");
        assert_eq!(config.build.format, "md");
        assert_eq!(config.serve.port, 8000);
        assert_eq!(config.core.site.mount_path, "docs");
    }

    #[test]
    fn test_config_file_and_cli_override() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("site.toml");
        std::fs::write(
            &file,
            r#"
[build]
output = "from-file"
format = "html"

[serve]
port = 9000

[site]
mount_path = "guide"

[site.file_type_paths]
image = "images"
"#,
        )
        .unwrap();

        let matches = command()
            .try_get_matches_from(["test", "-c", file.to_str().unwrap(), "-o", "/custom/out", "--open"])
            .unwrap();
        let config = PagewrightConfig::load(&matches).unwrap();

        assert_eq!(config.build.output, "/custom/out");
        assert_eq!(config.format().unwrap(), Format::Html);
        assert_eq!(config.serve.port, 9000);
        assert!(config.serve.open);
        assert_eq!(config.core.site.mount_path(), Some("guide"));
        assert_eq!(
            config.core.site.file_type_paths.get("image").map(String::as_str),
            Some("images")
        );
        // Untouched values keep their defaults
        assert_eq!(config.serve.host, "127.0.0.1");
        assert_eq!(config.core.site.html_default_layout, "base.html");
    }

    #[test]
    fn test_missing_explicit_config_file() {
        let matches = command()
            .try_get_matches_from(["test", "-c", "/definitely/not/here.toml"])
            .unwrap();
        assert!(PagewrightConfig::load(&matches).is_err());
    }
}
