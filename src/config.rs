use std::{env, num::NonZeroUsize, path::PathBuf, str::FromStr};

use chrono::Duration;
use thiserror::Error;

#[cfg(test)]
use once_cell::sync::Lazy;
#[cfg(test)]
pub(crate) static ENV_MUTEX: Lazy<std::sync::Mutex<()>> = Lazy::new(|| std::sync::Mutex::new(()));

/// 取り込み時に適用する時間窓。バッチ内の最新`created_at`から遡って測る。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timeframe {
    Hour,
    Day,
    Week,
    Month,
    Year,
    All,
}

impl Timeframe {
    /// 窓の幅。`All`はフィルタ無し（None）。
    #[must_use]
    pub fn window(self) -> Option<Duration> {
        match self {
            Self::Hour => Some(Duration::hours(1)),
            Self::Day => Some(Duration::days(1)),
            Self::Week => Some(Duration::days(7)),
            Self::Month => Some(Duration::days(30)),
            Self::Year => Some(Duration::days(365)),
            Self::All => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hour => "hour",
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
            Self::All => "all",
        }
    }
}

impl FromStr for Timeframe {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.to_lowercase().as_str() {
            "hour" => Ok(Self::Hour),
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "year" => Ok(Self::Year),
            "all" => Ok(Self::All),
            other => Err(anyhow::anyhow!("unknown timeframe: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    input_path: PathBuf,
    output_path: PathBuf,
    groups: Vec<String>,
    timeframe: Timeframe,
    post_limit: NonZeroUsize,
    sarcasm_model_dir: Option<PathBuf>,
    topic_count: NonZeroUsize,
    topic_min_probability: f64,
    trend_trees: NonZeroUsize,
    trend_seed: u64,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing environment variable: {0}")]
    Missing(&'static str),
    #[error("invalid value for {name}: {source}")]
    Invalid {
        name: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl Config {
    /// 環境変数からワーカーの設定値を読み込み、検証する。
    ///
    /// # Errors
    /// `SENTIMENT_INPUT_PATH`が未設定、もしくは各種値のパースに失敗した場合は
    /// [`ConfigError`]を返す。
    pub fn from_env() -> Result<Self, ConfigError> {
        let input_path = PathBuf::from(env_var("SENTIMENT_INPUT_PATH")?);
        let output_path = PathBuf::from(
            env::var("SENTIMENT_OUTPUT_PATH").unwrap_or_else(|_| "output.json".to_string()),
        );
        let groups = parse_csv("SENTIMENT_GROUPS", "wallstreetbets,stocks,investing");
        let timeframe = parse_timeframe("SENTIMENT_TIMEFRAME", Timeframe::Week)?;
        let post_limit = parse_non_zero_usize("SENTIMENT_POST_LIMIT", 100)?;
        let sarcasm_model_dir = env::var("SARCASM_MODEL_DIR").ok().map(PathBuf::from);
        let topic_count = parse_non_zero_usize("TOPIC_COUNT", 5)?;
        let topic_min_probability = parse_unit_f64("TOPIC_MIN_PROBABILITY", 0.01)?;
        let trend_trees = parse_non_zero_usize("TREND_TREES", 100)?;
        let trend_seed = parse_u64("TREND_SEED", 42)?;

        Ok(Self {
            input_path,
            output_path,
            groups,
            timeframe,
            post_limit,
            sarcasm_model_dir,
            topic_count,
            topic_min_probability,
            trend_trees,
            trend_seed,
        })
    }

    #[must_use]
    pub fn input_path(&self) -> &std::path::Path {
        &self.input_path
    }

    #[must_use]
    pub fn output_path(&self) -> &std::path::Path {
        &self.output_path
    }

    /// 許可するgroup_idの一覧。空なら全群を通す。
    #[must_use]
    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    #[must_use]
    pub fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    /// 群ごとの投稿数上限。入力順で先頭N件を残す。
    #[must_use]
    pub fn post_limit(&self) -> NonZeroUsize {
        self.post_limit
    }

    /// 皮肉分類器のローカルモデルディレクトリ。未設定なら段階退化。
    #[must_use]
    pub fn sarcasm_model_dir(&self) -> Option<&std::path::Path> {
        self.sarcasm_model_dir.as_deref()
    }

    #[must_use]
    pub fn topic_count(&self) -> NonZeroUsize {
        self.topic_count
    }

    #[must_use]
    pub fn topic_min_probability(&self) -> f64 {
        self.topic_min_probability
    }

    #[must_use]
    pub fn trend_trees(&self) -> NonZeroUsize {
        self.trend_trees
    }

    #[must_use]
    pub fn trend_seed(&self) -> u64 {
        self.trend_seed
    }
}

fn env_var(name: &'static str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::Missing(name))
}

fn parse_timeframe(name: &'static str, default: Timeframe) -> Result<Timeframe, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.parse().map_err(|error| ConfigError::Invalid {
            name,
            source: error,
        }),
        Err(_) => Ok(default),
    }
}

fn parse_non_zero_usize(name: &'static str, default: usize) -> Result<NonZeroUsize, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    let parsed = raw.parse::<usize>().map_err(|error| ConfigError::Invalid {
        name,
        source: anyhow::Error::new(error),
    })?;
    NonZeroUsize::new(parsed).ok_or_else(|| ConfigError::Invalid {
        name,
        source: anyhow::anyhow!("must be greater than zero"),
    })
}

fn parse_u64(name: &'static str, default: u64) -> Result<u64, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    raw.parse::<u64>().map_err(|error| ConfigError::Invalid {
        name,
        source: anyhow::Error::new(error),
    })
}

fn parse_unit_f64(name: &'static str, default: f64) -> Result<f64, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    let parsed = raw.parse::<f64>().map_err(|error| ConfigError::Invalid {
        name,
        source: anyhow::Error::new(error),
    })?;
    if !(0.0..=1.0).contains(&parsed) {
        return Err(ConfigError::Invalid {
            name,
            source: anyhow::anyhow!("value must be between 0 and 1"),
        });
    }
    Ok(parsed)
}

fn parse_csv(name: &'static str, default: &str) -> Vec<String> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
