use clap::Parser;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Tracing filter directive, e.g. "info" or "warn,queryscope=debug"
    pub level: String,
    /// Optional log file; stderr only when unset
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "warn".to_string(), file: None }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
    /// Rows shown in the operator cost ranking of the text summary
    pub top_operators: usize,
    /// Pretty-print JSON output
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { format: OutputFormat::Summary, top_operators: 5, pretty: false }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Serialized ProfileReport
    Json,
    /// Human-readable breakdown tables
    Summary,
}

/// Command line arguments for configuration overrides
#[derive(Parser, Debug, Clone)]
#[command(name = "queryscope")]
#[command(version, about = "Queryscope - query profile performance analysis")]
pub struct CommandLineArgs {
    /// Path to the profile JSON document ("-" reads stdin)
    pub profile: String,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Logging level (overrides config file, e.g. "info,queryscope=debug")
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Output format (overrides config file)
    #[arg(long, value_enum, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Operator ranking rows in the summary (overrides config file)
    #[arg(long, value_name = "N")]
    pub top: Option<usize>,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,
}

impl Config {
    /// Load configuration with command line, environment variable, and
    /// file support.
    ///
    /// Loading order (priority from highest to lowest):
    /// 1. Command line arguments
    /// 2. Environment variables (prefixed with APP_)
    /// 3. Configuration file (queryscope.toml)
    /// 4. Default values
    pub fn load(cli_args: &CommandLineArgs) -> Result<Self, anyhow::Error> {
        // .env is optional; env overrides may come from it
        dotenvy::dotenv().ok();

        let config_path = cli_args.config.clone().or_else(Self::find_config_file);
        let mut config = if let Some(config_path) = config_path {
            Self::from_toml(&config_path)?
        } else {
            Config::default()
        };

        config.apply_env_overrides();
        config.apply_cli_overrides(cli_args);
        config.validate()?;

        Ok(config)
    }

    fn from_toml(path: &str) -> Result<Self, anyhow::Error> {
        let content = fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {}", path, e))?;
        toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("failed to parse config file {}: {}", path, e))
    }

    fn find_config_file() -> Option<String> {
        ["queryscope.toml", "conf/queryscope.toml"]
            .into_iter()
            .find(|p| Path::new(p).exists())
            .map(str::to_string)
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - APP_LOG_LEVEL: Logging level (e.g. "info,queryscope=debug")
    /// - APP_LOG_FILE: Log file path
    /// - APP_OUTPUT_FORMAT: Output format ("json" or "summary")
    /// - APP_TOP_OPERATORS: Operator ranking rows in the summary
    fn apply_env_overrides(&mut self) {
        if let Ok(level) = std::env::var("APP_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(file) = std::env::var("APP_LOG_FILE") {
            self.logging.file = Some(file);
        }
        if let Ok(format) = std::env::var("APP_OUTPUT_FORMAT") {
            match format.to_lowercase().as_str() {
                "json" => self.output.format = OutputFormat::Json,
                "summary" => self.output.format = OutputFormat::Summary,
                other => tracing::warn!("ignoring unknown APP_OUTPUT_FORMAT '{}'", other),
            }
        }
        if let Ok(top) = std::env::var("APP_TOP_OPERATORS")
            && let Ok(top) = top.parse()
        {
            self.output.top_operators = top;
        }
    }

    /// Apply command line overrides (highest priority)
    fn apply_cli_overrides(&mut self, args: &CommandLineArgs) {
        if let Some(level) = &args.log_level {
            self.logging.level = level.clone();
        }
        if let Some(format) = args.format {
            self.output.format = format;
        }
        if let Some(top) = args.top {
            self.output.top_operators = top;
        }
        if args.pretty {
            self.output.pretty = true;
        }
    }

    fn validate(&self) -> Result<(), anyhow::Error> {
        if self.logging.level.trim().is_empty() {
            anyhow::bail!("logging.level must not be empty");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(profile: &str) -> CommandLineArgs {
        CommandLineArgs {
            profile: profile.to_string(),
            config: None,
            log_level: None,
            format: None,
            top: None,
            pretty: false,
        }
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.output.format, OutputFormat::Summary);
        assert_eq!(config.output.top_operators, 5);
        assert!(!config.output.pretty);
    }

    #[test]
    fn test_cli_overrides_take_priority() {
        let mut cli = args("profile.json");
        cli.log_level = Some("debug".to_string());
        cli.format = Some(OutputFormat::Json);
        cli.top = Some(12);
        cli.pretty = true;

        let mut config = Config::default();
        config.apply_cli_overrides(&cli);

        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.output.format, OutputFormat::Json);
        assert_eq!(config.output.top_operators, 12);
        assert!(config.output.pretty);
    }

    #[test]
    fn test_toml_sections_are_optional() {
        let config: Config = toml::from_str("[output]\nformat = \"json\"\n").unwrap();
        assert_eq!(config.output.format, OutputFormat::Json);
        assert_eq!(config.logging.level, "warn");
    }
}
