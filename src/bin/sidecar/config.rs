//! Configuration for `Sidecar`.
//!
//! Handles reading configuration from CLI arguments and the user config file.

use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use serde::Deserialize;

use sidecar_dump::SearchOptions;

use crate::Args;

const DEFAULT_RAW_SUFFIX: &str = ".CR2";
const DEFAULT_SIDECAR_SUFFIX: &str = ".xmp";

/// Config from the user config file.
#[derive(Debug, Default, Deserialize)]
pub struct SidecarConfig {
    #[serde(default)]
    auto: bool,
    #[serde(default)]
    check_time: bool,
    #[serde(default)]
    destination: Option<PathBuf>,
    #[serde(default)]
    dryrun: bool,
    #[serde(default)]
    hidden: bool,
    #[serde(default)]
    log: bool,
    #[serde(default)]
    raw_suffix: Option<String>,
    #[serde(default)]
    sidecar_suffix: Option<String>,
    #[serde(default)]
    verbose: bool,
}

/// Wrapper needed for parsing the config file section.
#[derive(Debug, Default, Deserialize)]
struct UserConfig {
    #[serde(default)]
    sidecar: SidecarConfig,
}

/// Final config created from CLI arguments and user config file.
#[derive(Debug, Clone)]
pub struct Config {
    pub(crate) auto: bool,
    pub(crate) check_time: bool,
    pub(crate) debug: bool,
    pub(crate) destination: Option<PathBuf>,
    pub(crate) dryrun: bool,
    pub(crate) folder_name: Option<String>,
    pub(crate) hidden: bool,
    pub(crate) log: bool,
    pub(crate) raw_suffix: String,
    pub(crate) sidecar_suffix: String,
    pub(crate) verbose: bool,
}

impl SidecarConfig {
    /// Try to read user config from the file if it exists.
    /// Otherwise, fall back to default config.
    ///
    /// # Errors
    /// Returns an error if config file exists but cannot be read or parsed.
    pub(crate) fn get_user_config() -> Result<Self> {
        let Some(path) = sidecar_dump::config::CONFIG_PATH.as_deref() else {
            return Ok(Self::default());
        };

        match fs::read_to_string(path) {
            Ok(content) => Self::from_toml_str(&content)
                .map_err(|e| anyhow::anyhow!("Failed to parse config file {}:\n{e}", path.display())),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(error) => Err(anyhow::anyhow!(
                "Failed to read config file {}: {error}",
                path.display()
            )),
        }
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    /// Returns an error if the TOML string is invalid.
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        toml::from_str::<UserConfig>(toml_str)
            .map(|config| config.sidecar)
            .map_err(|e| anyhow::anyhow!("Failed to parse config: {e}"))
    }
}

impl Config {
    /// Create config from given command line args and user config file.
    ///
    /// # Errors
    /// Returns an error if the config file cannot be read or parsed.
    pub fn from_args(args: Args) -> Result<Self> {
        let user_config = SidecarConfig::get_user_config()?;
        Ok(Self::from_parts(args, user_config))
    }

    /// Combine CLI arguments with an already loaded user config.
    /// CLI values take priority over config file values.
    pub(crate) fn from_parts(args: Args, user_config: SidecarConfig) -> Self {
        let raw_suffix = args
            .raw
            .or(user_config.raw_suffix)
            .map_or_else(|| DEFAULT_RAW_SUFFIX.to_string(), |suffix| normalize_suffix(&suffix));

        let sidecar_suffix = args
            .sidecar
            .or(user_config.sidecar_suffix)
            .map_or_else(|| DEFAULT_SIDECAR_SUFFIX.to_string(), |suffix| normalize_suffix(&suffix));

        Self {
            auto: args.auto || user_config.auto,
            check_time: args.time || user_config.check_time,
            debug: args.debug,
            destination: args.dest.or(user_config.destination),
            dryrun: args.print || user_config.dryrun,
            folder_name: args.name.map(|name| name.trim().to_string()),
            hidden: args.hidden || user_config.hidden,
            log: args.log || user_config.log,
            raw_suffix,
            sidecar_suffix,
            verbose: args.verbose || user_config.verbose,
        }
    }

    /// Search parameters for the sidecar index builder.
    pub(crate) fn search_options(&self) -> SearchOptions {
        SearchOptions::new(&self.raw_suffix, &self.sidecar_suffix, self.check_time).skip_hidden(!self.hidden)
    }
}

/// Treat a bare extension like `CR2` as the suffix `.CR2`.
/// Anything already containing a dot is used as is.
pub(crate) fn normalize_suffix(suffix: &str) -> String {
    let suffix = suffix.trim();
    if suffix.is_empty() || suffix.contains('.') {
        suffix.to_string()
    } else {
        format!(".{suffix}")
    }
}

#[cfg(test)]
mod sidecar_config_tests {
    use super::*;

    use clap::Parser;

    #[test]
    fn from_toml_str_parses_empty_config() {
        let config = SidecarConfig::from_toml_str("").expect("should parse empty config");
        assert!(!config.auto);
        assert!(!config.check_time);
        assert!(!config.dryrun);
        assert!(!config.hidden);
        assert!(!config.log);
        assert!(!config.verbose);
        assert!(config.destination.is_none());
        assert!(config.raw_suffix.is_none());
        assert!(config.sidecar_suffix.is_none());
    }

    #[test]
    fn from_toml_str_parses_sidecar_section() {
        let toml = r#"
[sidecar]
auto = true
check_time = true
destination = "/backup/sidecars"
dryrun = true
hidden = true
log = true
raw_suffix = "NEF"
sidecar_suffix = ".xmp"
verbose = true
"#;
        let config = SidecarConfig::from_toml_str(toml).expect("should parse config");
        assert!(config.auto);
        assert!(config.check_time);
        assert!(config.dryrun);
        assert!(config.hidden);
        assert!(config.log);
        assert!(config.verbose);
        assert_eq!(config.destination, Some(PathBuf::from("/backup/sidecars")));
        assert_eq!(config.raw_suffix.as_deref(), Some("NEF"));
        assert_eq!(config.sidecar_suffix.as_deref(), Some(".xmp"));
    }

    #[test]
    fn from_toml_str_invalid_toml_returns_error() {
        assert!(SidecarConfig::from_toml_str("this is not valid toml {{{").is_err());
    }

    #[test]
    fn from_toml_str_ignores_other_sections() {
        let toml = r"
[other_section]
some_value = true

[sidecar]
verbose = true
";
        let config = SidecarConfig::from_toml_str(toml).expect("should parse config");
        assert!(config.verbose);
        assert!(!config.auto);
    }

    #[test]
    fn defaults_without_args_or_config() {
        let args = Args::try_parse_from(["test"]).expect("should parse");
        let config = Config::from_parts(args, SidecarConfig::default());
        assert_eq!(config.raw_suffix, ".CR2");
        assert_eq!(config.sidecar_suffix, ".xmp");
        assert!(!config.check_time);
        assert!(config.destination.is_none());
        assert!(config.folder_name.is_none());
        assert!(config.search_options().skip_hidden);
    }

    #[test]
    fn cli_suffixes_override_config() {
        let user_config = SidecarConfig::from_toml_str(
            r#"
[sidecar]
raw_suffix = "NEF"
sidecar_suffix = "pp3"
"#,
        )
        .expect("should parse config");
        let args = Args::try_parse_from(["test", "-r", "ARW"]).expect("should parse");
        let config = Config::from_parts(args, user_config);
        assert_eq!(config.raw_suffix, ".ARW");
        assert_eq!(config.sidecar_suffix, ".pp3");
    }

    #[test]
    fn flags_combine_with_config() {
        let user_config = SidecarConfig::from_toml_str("[sidecar]\ncheck_time = true\n").expect("should parse config");
        let args = Args::try_parse_from(["test", "-H", "-p", "-n", " dump "]).expect("should parse");
        let config = Config::from_parts(args, user_config);
        assert!(config.check_time);
        assert!(config.hidden);
        assert!(config.dryrun);
        assert_eq!(config.folder_name.as_deref(), Some("dump"));

        let options = config.search_options();
        assert!(options.check_time_coherence);
        assert!(!options.skip_hidden);
    }

    #[test]
    fn normalize_suffix_adds_dot_to_bare_extension() {
        assert_eq!(normalize_suffix("CR2"), ".CR2");
        assert_eq!(normalize_suffix(" xmp "), ".xmp");
        assert_eq!(normalize_suffix(".xmp"), ".xmp");
        assert_eq!(normalize_suffix("_master.tif"), "_master.tif");
        assert_eq!(normalize_suffix(""), "");
    }
}
