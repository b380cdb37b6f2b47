use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::view::ViewOptions;
use crate::shared::constants;

/// Settings read from `cueclock.config`, one `key = value` per line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub match_duration_secs: u32,
    pub shot_clock_secs: u32,
    /// Zero disables periodic refetch.
    pub refresh_interval_secs: u64,
    pub store_path: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            match_duration_secs: constants::DEFAULT_MATCH_DURATION_SECS,
            shot_clock_secs: constants::DEFAULT_SHOT_CLOCK_SECS,
            refresh_interval_secs: constants::DEFAULT_REFRESH_INTERVAL_SECS,
            store_path: default_store_path(),
        }
    }
}

impl AppConfig {
    /// Load settings from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = Self::default();

        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(config),
            Err(err) => {
                return Err(err).with_context(|| format!("failed to read {}", path.display()))
            }
        };

        for (idx, line) in content.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let Some((key, value)) = trimmed.split_once('=') else {
                anyhow::bail!("{}:{}: expected `key = value`", path.display(), idx + 1);
            };
            let (key, value) = (key.trim(), value.trim());

            match key {
                "match-duration" => config.match_duration_secs = parse_number(path, idx, key, value)?,
                "shot-clock" => config.shot_clock_secs = parse_number(path, idx, key, value)?,
                "refresh-interval" => {
                    config.refresh_interval_secs = parse_number(path, idx, key, value)?
                }
                "store" => config.store_path = PathBuf::from(value),
                other => crate::utils::logger::debug(&format!(
                    "{}:{}: ignoring unknown key '{}'",
                    path.display(),
                    idx + 1,
                    other
                )),
            }
        }

        if config.match_duration_secs == 0 {
            anyhow::bail!("{}: match-duration must be greater than zero", path.display());
        }

        Ok(config)
    }

    pub fn refresh_interval(&self) -> Option<Duration> {
        (self.refresh_interval_secs > 0).then(|| Duration::from_secs(self.refresh_interval_secs))
    }

    pub fn view_options(&self, read_only: bool) -> ViewOptions {
        ViewOptions {
            read_only,
            full_duration: self.match_duration_secs,
            tick_period: constants::TICK_PERIOD,
            refresh_interval: self.refresh_interval(),
        }
    }
}

fn parse_number<T: std::str::FromStr>(path: &Path, idx: usize, key: &str, value: &str) -> Result<T> {
    value.parse::<T>().map_err(|_| {
        anyhow::anyhow!(
            "{}:{}: '{}' is not a valid number for {}",
            path.display(),
            idx + 1,
            value,
            key
        )
    })
}

/// `matches.json` in the working directory when it exists, otherwise under
/// the platform data directory.
pub fn default_store_path() -> PathBuf {
    let local = PathBuf::from(constants::STORE_FILE);
    if local.exists() {
        return local;
    }

    dirs::data_dir()
        .map(|dir| dir.join(constants::DATA_DIR_NAME).join(constants::STORE_FILE))
        .unwrap_or(local)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig::load(&dir.path().join("absent.config")).unwrap();

        assert_eq!(config.match_duration_secs, 1800);
        assert_eq!(config.shot_clock_secs, 30);
        assert_eq!(config.refresh_interval(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn reads_known_keys_and_skips_comments() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cueclock.config");
        fs::write(
            &path,
            "# league night\nmatch-duration = 2400\nshot-clock=45\n\nrefresh-interval = 0\nstore = /tmp/league.json\ncolor = red\n",
        )
        .unwrap();

        let config = AppConfig::load(&path).unwrap();

        assert_eq!(config.match_duration_secs, 2400);
        assert_eq!(config.shot_clock_secs, 45);
        assert_eq!(config.refresh_interval(), None);
        assert_eq!(config.store_path, PathBuf::from("/tmp/league.json"));
    }

    #[test]
    fn rejects_malformed_numbers() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cueclock.config");
        fs::write(&path, "match-duration = thirty\n").unwrap();

        let err = AppConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("match-duration"));
    }

    #[test]
    fn rejects_zero_duration_and_bare_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cueclock.config");

        fs::write(&path, "match-duration = 0\n").unwrap();
        assert!(AppConfig::load(&path).is_err());

        fs::write(&path, "match-duration\n").unwrap();
        assert!(AppConfig::load(&path).is_err());
    }

    #[test]
    fn view_options_carry_duration_and_refresh() {
        let config = AppConfig {
            match_duration_secs: 2400,
            refresh_interval_secs: 0,
            ..AppConfig::default()
        };

        let options = config.view_options(true);
        assert!(options.read_only);
        assert_eq!(options.full_duration, 2400);
        assert_eq!(options.refresh_interval, None);
    }
}
