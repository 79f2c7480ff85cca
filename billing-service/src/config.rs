use serde::Deserialize;
use std::{fs, path::PathBuf};

use anyhow::{bail, Context};
use time::{macros::format_description, UtcOffset};

use crate::engine::{accumulator::MAX_DELTA_KWH, tariff, CostAccumulator, TariffSchedule};

pub const CONFIG_ENV: &str = "BILLING_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "billing-config.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub path: PathBuf,
    pub delimiter: char,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("test-input.csv"),
            delimiter: ',',
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub path: PathBuf,
    /// Optional JSON batch report.
    pub report_path: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("output.csv"),
            report_path: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TariffConfig {
    /// Fixed civil-time offset for the peak window, e.g. `"+01:00"` or `"Z"`.
    pub utc_offset: String,
    pub gas_price: f64,
    pub default_electricity_price: f64,
    pub weekday_peak_electricity_price: f64,
    pub peak_after_hour: u8,
    pub peak_before_hour: u8,
}

impl Default for TariffConfig {
    fn default() -> Self {
        Self {
            utc_offset: "Z".to_string(),
            gas_price: tariff::GAS_PRICE,
            default_electricity_price: tariff::DEFAULT_ELECTRICITY_PRICE,
            weekday_peak_electricity_price: tariff::WEEKDAY_PEAK_ELECTRICITY_PRICE,
            peak_after_hour: 7,
            peak_before_hour: 23,
        }
    }
}

fn parse_utc_offset(s: &str) -> anyhow::Result<UtcOffset> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("z") || s.eq_ignore_ascii_case("utc") {
        return Ok(UtcOffset::UTC);
    }
    UtcOffset::parse(s, format_description!("[offset_hour sign:mandatory]:[offset_minute]"))
        .with_context(|| format!("invalid tariff.utc_offset '{s}', expected e.g. +01:00"))
}

impl TariffConfig {
    pub fn schedule(&self) -> anyhow::Result<TariffSchedule> {
        for (name, price) in [
            ("gas_price", self.gas_price),
            ("default_electricity_price", self.default_electricity_price),
            ("weekday_peak_electricity_price", self.weekday_peak_electricity_price),
        ] {
            if !price.is_finite() || price < 0.0 {
                bail!("tariff.{name} must be a non-negative number, got {price}");
            }
        }
        if self.peak_before_hour > 24 || self.peak_after_hour >= self.peak_before_hour {
            bail!(
                "tariff peak window ({}, {}) is invalid: need peak_after_hour < peak_before_hour <= 24",
                self.peak_after_hour,
                self.peak_before_hour
            );
        }

        Ok(TariffSchedule {
            gas_price: self.gas_price,
            default_electricity_price: self.default_electricity_price,
            weekday_peak_electricity_price: self.weekday_peak_electricity_price,
            peak_after_hour: self.peak_after_hour,
            peak_before_hour: self.peak_before_hour,
            offset: parse_utc_offset(&self.utc_offset)?,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub max_delta_kwh: f64,
    pub workers: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_delta_kwh: MAX_DELTA_KWH,
            workers: 1,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    /// Prometheus text exposition written once the batch finishes.
    pub textfile_path: PathBuf,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub input: InputConfig,
    pub output: OutputConfig,
    pub tariff: TariffConfig,
    pub engine: EngineConfig,
    pub metrics: Option<MetricsConfig>,
}

impl AppConfig {
    /// Load from `$BILLING_CONFIG`, else `billing-config.toml` when present,
    /// else built-in defaults.
    pub fn load() -> anyhow::Result<Self> {
        use std::env;

        match env::var(CONFIG_ENV) {
            Ok(path) => Self::from_file(&path),
            Err(_) if std::path::Path::new(DEFAULT_CONFIG_PATH).exists() => Self::from_file(DEFAULT_CONFIG_PATH),
            Err(_) => {
                tracing::debug!("no billing config file, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path).with_context(|| format!("failed to read config {path}"))?;
        Self::from_toml_str(&contents).with_context(|| format!("invalid config {path}"))
    }

    pub fn from_toml_str(contents: &str) -> anyhow::Result<Self> {
        let cfg: AppConfig = toml::from_str(contents)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.tariff.schedule()?;
        self.input_delimiter()?;
        if !self.engine.max_delta_kwh.is_finite() || self.engine.max_delta_kwh < 0.0 {
            bail!("engine.max_delta_kwh must be a non-negative number");
        }
        if self.engine.workers == 0 {
            bail!("engine.workers must be at least 1");
        }
        Ok(())
    }

    pub fn input_delimiter(&self) -> anyhow::Result<u8> {
        let d = self.input.delimiter;
        if !d.is_ascii() {
            bail!("input.delimiter must be a single ASCII character, got '{d}'");
        }
        Ok(d as u8)
    }

    pub fn cost_accumulator(&self) -> anyhow::Result<CostAccumulator> {
        Ok(CostAccumulator::new(self.tariff.schedule()?, self.engine.max_delta_kwh))
    }
}
