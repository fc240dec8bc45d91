use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::fact::{HourConvention, TimeLabels};
use super::ui::Locator;

/// Default filename pattern: `VRChat_YYYY-MM-DD_HH-MM-SS...`.
pub const DEFAULT_FILENAME_PATTERN: &str =
    r"VRChat_(\d{4})-(\d{2})-(\d{2})_(\d{2})-(\d{2})-(\d{2})";

/// Main configuration structure for dateinsert
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Collection page to reconcile
    #[serde(default = "default_target_url")]
    pub target_url: String,

    /// Time given to the collection page to render after navigation or refresh
    #[serde(default = "default_initial_wait_ms")]
    pub initial_wait_ms: u64,

    /// Upper bound on collection passes
    #[serde(default = "default_max_passes")]
    pub max_passes: u32,

    /// Regex with year, month, day, hour, minute (and optionally second) groups
    #[serde(default = "default_filename_pattern")]
    pub filename_pattern: String,

    /// How the boundary hour is written
    #[serde(default)]
    pub hour_convention: HourConvention,

    /// URL fragments that indicate a redirect to a sign-in page
    #[serde(default = "default_auth_redirect_markers")]
    pub auth_redirect_markers: Vec<String>,

    #[serde(default)]
    pub browser: BrowserConfig,

    #[serde(default)]
    pub waits: WaitConfig,

    #[serde(default)]
    pub ui: UiSelectors,

    #[serde(default)]
    pub locale: LocaleConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_target_url() -> String {
    "https://www.amazon.co.jp/photos/all?timeYear=1000&lcf=time".to_string()
}

const fn default_initial_wait_ms() -> u64 {
    5_000
}

const fn default_max_passes() -> u32 {
    10
}

fn default_filename_pattern() -> String {
    DEFAULT_FILENAME_PATTERN.to_string()
}

fn default_auth_redirect_markers() -> Vec<String> {
    vec!["signin".to_string(), "ap/signin".to_string()]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target_url: default_target_url(),
            initial_wait_ms: default_initial_wait_ms(),
            max_passes: default_max_passes(),
            filename_pattern: default_filename_pattern(),
            hour_convention: HourConvention::default(),
            auth_redirect_markers: default_auth_redirect_markers(),
            browser: BrowserConfig::default(),
            waits: WaitConfig::default(),
            ui: UiSelectors::default(),
            locale: LocaleConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    pub const fn initial_wait(&self) -> Duration {
        Duration::from_millis(self.initial_wait_ms)
    }

    /// True when `url` looks like a sign-in redirect.
    pub fn is_auth_redirect(&self, url: &str) -> bool {
        self.auth_redirect_markers
            .iter()
            .any(|marker| !marker.is_empty() && url.contains(marker.as_str()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowserKind {
    #[default]
    Firefox,
    Chrome,
}

impl BrowserKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Firefox => "firefox",
            Self::Chrome => "chrome",
        }
    }

    /// Executable name of the matching WebDriver server.
    pub const fn driver_binary(&self) -> &'static str {
        match (self, cfg!(windows)) {
            (Self::Firefox, false) => "geckodriver",
            (Self::Firefox, true) => "geckodriver.exe",
            (Self::Chrome, false) => "chromedriver",
            (Self::Chrome, true) => "chromedriver.exe",
        }
    }
}

impl std::str::FromStr for BrowserKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "firefox" => Ok(Self::Firefox),
            "chrome" => Ok(Self::Chrome),
            other => Err(format!("unsupported browser: {other}")),
        }
    }
}

/// Browser and WebDriver configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct BrowserConfig {
    #[serde(default)]
    pub kind: BrowserKind,

    /// Browser executable; auto-detected from standard locations when unset
    #[serde(default)]
    pub binary_path: Option<PathBuf>,

    /// Firefox profile directory, or Chrome user data dir
    #[serde(default)]
    pub profile_path: Option<PathBuf>,

    /// Chrome profile directory name inside the user data dir
    #[serde(default)]
    pub profile_directory: Option<String>,

    /// geckodriver / chromedriver executable; the browser's default name when unset
    #[serde(default)]
    pub driver_path: Option<PathBuf>,

    /// Connect to an already running WebDriver server instead of spawning one
    #[serde(default)]
    pub driver_url: Option<String>,

    #[serde(default = "default_driver_port")]
    pub driver_port: u16,

    #[serde(default)]
    pub headless: bool,

    #[serde(default = "default_startup_timeout_ms")]
    pub startup_timeout_ms: u64,

    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

const fn default_driver_port() -> u16 {
    4444
}

const fn default_startup_timeout_ms() -> u64 {
    15_000
}

const fn default_request_timeout_ms() -> u64 {
    60_000
}

impl BrowserConfig {
    pub fn driver_path(&self) -> PathBuf {
        self.driver_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(self.kind.driver_binary()))
    }

    pub const fn startup_timeout(&self) -> Duration {
        Duration::from_millis(self.startup_timeout_ms)
    }

    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            kind: BrowserKind::default(),
            binary_path: None,
            profile_path: None,
            profile_directory: None,
            driver_path: None,
            driver_url: None,
            driver_port: default_driver_port(),
            headless: false,
            startup_timeout_ms: default_startup_timeout_ms(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

/// Readiness schedules and settle delays
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WaitConfig {
    /// Elapsed offsets (ms) at which an element lookup is attempted
    #[serde(default = "default_schedule_ms")]
    pub schedule_ms: Vec<u64>,

    /// Timeout for single bounded waits on a condition
    #[serde(default = "default_condition_timeout_ms")]
    pub condition_timeout_ms: u64,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Pause after opening an item in its own context
    #[serde(default = "default_context_settle_ms")]
    pub context_settle_ms: u64,

    /// Pause after opening the add/edit form
    #[serde(default = "default_affordance_settle_ms")]
    pub affordance_settle_ms: u64,

    /// Pause after blurring the last field
    #[serde(default = "default_fill_settle_ms")]
    pub fill_settle_ms: u64,

    /// Pause after save so the remote state settles
    #[serde(default = "default_save_settle_ms")]
    pub save_settle_ms: u64,
}

fn default_schedule_ms() -> Vec<u64> {
    vec![1_000, 2_000, 3_000, 5_000, 10_000]
}

const fn default_condition_timeout_ms() -> u64 {
    10_000
}

const fn default_poll_interval_ms() -> u64 {
    250
}

const fn default_context_settle_ms() -> u64 {
    1_000
}

const fn default_affordance_settle_ms() -> u64 {
    500
}

const fn default_fill_settle_ms() -> u64 {
    1_000
}

const fn default_save_settle_ms() -> u64 {
    2_000
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            schedule_ms: default_schedule_ms(),
            condition_timeout_ms: default_condition_timeout_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            context_settle_ms: default_context_settle_ms(),
            affordance_settle_ms: default_affordance_settle_ms(),
            fill_settle_ms: default_fill_settle_ms(),
            save_settle_ms: default_save_settle_ms(),
        }
    }
}

impl WaitConfig {
    /// Waits with every delay set to zero and a short schedule, for tests.
    pub fn immediate() -> Self {
        Self {
            schedule_ms: vec![0, 1, 2],
            condition_timeout_ms: 5,
            poll_interval_ms: 1,
            context_settle_ms: 0,
            affordance_settle_ms: 0,
            fill_settle_ms: 0,
            save_settle_ms: 0,
        }
    }

    pub fn schedule(&self) -> Vec<Duration> {
        self.schedule_ms.iter().copied().map(Duration::from_millis).collect()
    }

    pub const fn condition_timeout(&self) -> Duration {
        Duration::from_millis(self.condition_timeout_ms)
    }

    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub const fn context_settle(&self) -> Duration {
        Duration::from_millis(self.context_settle_ms)
    }

    pub const fn affordance_settle(&self) -> Duration {
        Duration::from_millis(self.affordance_settle_ms)
    }

    pub const fn fill_settle(&self) -> Duration {
        Duration::from_millis(self.fill_settle_ms)
    }

    pub const fn save_settle(&self) -> Duration {
        Duration::from_millis(self.save_settle_ms)
    }
}

/// CSS selectors of the photo library UI
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct UiSelectors {
    pub photo_links: String,
    pub info_button: String,
    pub filename_label: String,
    pub date_edit_button: String,
    pub date_label: String,
    pub time_label: String,
    pub add_button: String,
    pub year_input: String,
    pub month_input: String,
    pub day_input: String,
    pub time_input: String,
    pub save_button: String,
}

impl Default for UiSelectors {
    fn default() -> Self {
        Self {
            photo_links: ".mosaic-item a".to_string(),
            info_button: "button.info".to_string(),
            filename_label: ".detail-item.file-info .label".to_string(),
            date_edit_button: ".detail-item.date-info h4 button.edit-btn".to_string(),
            date_label: ".detail-item.date-info .label".to_string(),
            time_label: ".detail-item.date-info .subs span".to_string(),
            add_button: ".info-item.editable .edit-btn".to_string(),
            year_input: ".year.date-piece input[name='year']".to_string(),
            month_input: ".month.date-piece input[name='month']".to_string(),
            day_input: ".day.date-piece input[name='day']".to_string(),
            time_input: ".hour-minute.date-piece input[name='time']".to_string(),
            save_button: "button.button[aria-label='保存']".to_string(),
        }
    }
}

impl UiSelectors {
    /// (name, selector) pairs, used for validation and diagnostics.
    pub fn entries(&self) -> [(&'static str, &str); 12] {
        [
            ("photo_links", &self.photo_links),
            ("info_button", &self.info_button),
            ("filename_label", &self.filename_label),
            ("date_edit_button", &self.date_edit_button),
            ("date_label", &self.date_label),
            ("time_label", &self.time_label),
            ("add_button", &self.add_button),
            ("year_input", &self.year_input),
            ("month_input", &self.month_input),
            ("day_input", &self.day_input),
            ("time_input", &self.time_input),
            ("save_button", &self.save_button),
        ]
    }

    pub fn locator(selector: &str) -> Locator {
        Locator::css(selector)
    }
}

/// Locale-dependent texts of the photo library UI
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct LocaleConfig {
    /// Half-day markers and hour/minute suffixes
    pub time: TimeLabels,

    /// Regex with year, month, day groups for the rendered date label
    pub date_pattern: String,

    /// The rendered time label carries a prefix (weekday) up to this separator
    pub prefix_separator: String,

    /// Text of the edit button when a date is already set
    pub edit_label: String,

    /// Text of the button that adds a date when none is set
    pub add_label: String,
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self {
            time: TimeLabels::default(),
            date_pattern: r"(\d{4})年(\d{1,2})月(\d{1,2})日".to_string(),
            prefix_separator: ", ".to_string(),
            edit_label: "編集".to_string(),
            add_label: "日付と時刻を追加".to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Console format: json, pretty or compact
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for the JSON log file; console only when unset
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    #[serde(default = "default_log_file_name")]
    pub file_name: String,

    #[serde(default = "default_true")]
    pub enable_stdout: bool,

    /// File rotation: daily, hourly or never
    #[serde(default = "default_rotation")]
    pub rotation: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "compact".to_string()
}

fn default_log_file_name() -> String {
    "dateinsert.log".to_string()
}

const fn default_true() -> bool {
    true
}

fn default_rotation() -> String {
    "never".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            file_name: default_log_file_name(),
            enable_stdout: true,
            rotation: default_rotation(),
        }
    }
}
