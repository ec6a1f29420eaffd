use serde::{de::Deserializer, Deserialize, Serialize};
use std::{fmt, path::PathBuf, str::FromStr};

/// Shop-wide preferences plus the tunables the analytics engine reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub locale: String,
    pub currency: String,
    #[serde(default = "Config::default_currency_precision")]
    pub currency_precision: u32,
    #[serde(default = "Config::default_ui_color_enabled")]
    pub ui_color_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_opened_ledger: Option<String>,
    #[serde(default)]
    pub analytics: AnalyticsSettings,

    #[serde(skip_serializing_if = "Option::is_none")]
    /// Optional custom root directory for ledgers. Defaults to `~/Documents/Consignment`.
    pub default_ledger_root: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    /// Optional custom root directory for backups. Defaults to `~/Documents/Consignment/backups`.
    pub default_backup_root: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            locale: "en-US".into(),
            currency: "USD".into(),
            currency_precision: Self::default_currency_precision(),
            ui_color_enabled: Self::default_ui_color_enabled(),
            last_opened_ledger: None,
            analytics: AnalyticsSettings::default(),
            default_ledger_root: None,
            default_backup_root: None,
        }
    }
}

impl Config {
    pub fn default_currency_precision() -> u32 {
        2
    }

    pub fn default_ui_color_enabled() -> bool {
        true
    }

    pub fn resolve_default_ledger_root(&self) -> PathBuf {
        if let Some(path) = &self.default_ledger_root {
            return path.clone();
        }
        documents_base().join("Consignment")
    }

    pub fn resolve_default_backup_root(&self) -> PathBuf {
        if let Some(path) = &self.default_backup_root {
            return path.clone();
        }
        documents_base().join("Consignment").join("backups")
    }
}

fn documents_base() -> PathBuf {
    dirs::document_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Thresholds and conventions shared by every report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsSettings {
    #[serde(default)]
    pub week_start: WeekStart,
    /// Emit zero-valued buckets for periods without activity.
    #[serde(default)]
    pub dense_series: bool,
    #[serde(default = "AnalyticsSettings::default_slow_mover_days")]
    pub slow_mover_days: u32,
    #[serde(default = "AnalyticsSettings::default_fast_mover_days")]
    pub fast_mover_days: u32,
    #[serde(default = "AnalyticsSettings::default_upcoming_window_days")]
    pub upcoming_window_days: u32,
    #[serde(default = "AnalyticsSettings::default_cash_flow_window_days")]
    pub cash_flow_window_days: u32,
    #[serde(default)]
    pub payout_readiness: PayoutReadiness,
}

impl AnalyticsSettings {
    pub fn default_slow_mover_days() -> u32 {
        90
    }

    pub fn default_fast_mover_days() -> u32 {
        30
    }

    pub fn default_upcoming_window_days() -> u32 {
        7
    }

    pub fn default_cash_flow_window_days() -> u32 {
        30
    }
}

impl Default for AnalyticsSettings {
    fn default() -> Self {
        Self {
            week_start: WeekStart::default(),
            dense_series: false,
            slow_mover_days: Self::default_slow_mover_days(),
            fast_mover_days: Self::default_fast_mover_days(),
            upcoming_window_days: Self::default_upcoming_window_days(),
            cash_flow_window_days: Self::default_cash_flow_window_days(),
            payout_readiness: PayoutReadiness::default(),
        }
    }
}

/// First day of a weekly trend bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WeekStart {
    #[default]
    Sunday,
    Monday,
}

impl WeekStart {
    fn from_value(value: Option<String>) -> Self {
        value
            .and_then(|v| v.parse().ok())
            .unwrap_or_default()
    }
}

impl FromStr for WeekStart {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sunday" | "sun" => Ok(WeekStart::Sunday),
            "monday" | "mon" => Ok(WeekStart::Monday),
            other => Err(format!("unsupported week start `{other}`")),
        }
    }
}

impl fmt::Display for WeekStart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            WeekStart::Sunday => "sunday",
            WeekStart::Monday => "monday",
        };
        f.write_str(label)
    }
}

// Unknown or missing values fall back to Sunday instead of failing the load.
impl<'de> Deserialize<'de> for WeekStart {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<String>::deserialize(deserializer)?;
        Ok(WeekStart::from_value(value))
    }
}

/// Decides when a sold item is waiting on a vendor payout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PayoutReadiness {
    /// Pending until payouts reach the full settlement target.
    #[default]
    FullSettlement,
}

impl FromStr for PayoutReadiness {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "full_settlement" | "full" => Ok(PayoutReadiness::FullSettlement),
            other => Err(format!("unsupported payout readiness `{other}`")),
        }
    }
}

impl fmt::Display for PayoutReadiness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayoutReadiness::FullSettlement => f.write_str("full settlement"),
        }
    }
}
