use anyhow::Result;
use figment::{providers::{Env, Format, Toml}, Figment};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::domain::Zone;
use crate::flow_graph::{BuildOptions, FilenameParser, MergePolicy};
use crate::flow_graph::filename::{DEFAULT_PREFIX, DEFAULT_SUFFIX};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub data: DataConfig,
    #[serde(default)]
    pub parser: ParserConfig,
    #[serde(default)]
    pub build: BuildConfig,
    #[serde(default)]
    pub topology: TopologyConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig { pub flows_dir: PathBuf }

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    pub prefix: String,
    pub suffix: String,
    pub compound_codes: Vec<Zone>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            suffix: DEFAULT_SUFFIX.to_string(),
            compound_codes: vec![Zone::from("DE_LU")],
        }
    }
}

impl ParserConfig {
    pub fn filename_parser(&self) -> FilenameParser {
        FilenameParser::new(&self.prefix, &self.suffix, self.compound_codes.iter().cloned())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    pub sort_files: bool,
    pub merge_policy: MergePolicy,
    pub timeout_seconds: Option<u64>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            sort_files: true,
            merge_policy: MergePolicy::LastWriteWins,
            timeout_seconds: None,
        }
    }
}

impl BuildConfig {
    pub fn options(&self) -> BuildOptions {
        BuildOptions {
            sort_files: self.sort_files,
            merge_policy: self.merge_policy,
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_seconds.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TopologyConfig {
    /// TOML zone table replacing the built-in European one
    pub path: Option<PathBuf>,
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_figment(
            Figment::new()
                .merge(Toml::file("config/default.toml"))
                .merge(Env::prefixed("FLOWGRAPH__").split("__")),
        )
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        Ok(figment.extract()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_defaults_from_file() {
        Jail::expect_with(|jail| {
            jail.create_dir("config")?;
            jail.create_file(
                "config/default.toml",
                r#"
                [data]
                flows_dir = "data/processed/flows"
                "#,
            )?;

            let cfg = Config::load().map_err(|e| e.to_string())?;
            assert_eq!(cfg.data.flows_dir, PathBuf::from("data/processed/flows"));
            assert_eq!(cfg.parser.prefix, "flows_");
            assert_eq!(cfg.parser.compound_codes, vec![Zone::from("DE_LU")]);
            assert!(cfg.build.sort_files);
            assert_eq!(cfg.build.merge_policy, MergePolicy::LastWriteWins);
            assert!(cfg.build.timeout().is_none());
            assert!(cfg.topology.path.is_none());
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides() {
        Jail::expect_with(|jail| {
            jail.create_dir("config")?;
            jail.create_file(
                "config/default.toml",
                r#"
                [data]
                flows_dir = "flows"

                [build]
                merge_policy = "last_write_wins"
                "#,
            )?;
            jail.set_env("FLOWGRAPH__BUILD__MERGE_POLICY", "reject_conflicts");
            jail.set_env("FLOWGRAPH__BUILD__TIMEOUT_SECONDS", "30");
            jail.set_env("FLOWGRAPH__DATA__FLOWS_DIR", "/srv/flows");

            let cfg = Config::load().map_err(|e| e.to_string())?;
            assert_eq!(cfg.build.merge_policy, MergePolicy::RejectConflicts);
            assert_eq!(cfg.build.timeout(), Some(Duration::from_secs(30)));
            assert_eq!(cfg.data.flows_dir, PathBuf::from("/srv/flows"));
            Ok(())
        });
    }

    #[test]
    fn test_missing_data_section_fails() {
        let figment = Figment::new().merge(Toml::string("[build]\nsort_files = false"));
        assert!(Config::from_figment(figment).is_err());
    }
}
