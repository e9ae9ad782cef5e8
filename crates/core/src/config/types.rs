use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub account: AccountConfig,
    #[serde(default)]
    pub portal: PortalConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub trigger: TriggerConfig,
    #[serde(default)]
    pub submission: SubmissionConfig,
    #[serde(default)]
    pub captcha: CaptchaConfig,
    #[serde(default)]
    pub encryptor: EncryptorConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Account credentials (usually supplied on the command line instead)
#[derive(Clone, Default, Deserialize, Serialize)]
pub struct AccountConfig {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl std::fmt::Debug for AccountConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountConfig")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Remote portal endpoints and transport settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PortalConfig {
    /// CAS login page (GET for the form, POST to authenticate)
    #[serde(default = "default_login_url")]
    pub login_url: String,
    /// Paginated activity listing
    #[serde(default = "default_activity_list_url")]
    pub activity_list_url: String,
    /// Captcha challenge image
    #[serde(default = "default_captcha_url")]
    pub captcha_url: String,
    /// Reservation submission
    #[serde(default = "default_reserve_url")]
    pub reserve_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Per-request timeout in seconds (default: 3)
    #[serde(default = "default_portal_timeout")]
    pub timeout_secs: u32,
    /// UTC offset the portal's timestamps are expressed in
    #[serde(default = "default_utc_offset")]
    pub utc_offset: String,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            login_url: default_login_url(),
            activity_list_url: default_activity_list_url(),
            captcha_url: default_captcha_url(),
            reserve_url: default_reserve_url(),
            user_agent: default_user_agent(),
            timeout_secs: default_portal_timeout(),
            utc_offset: default_utc_offset(),
        }
    }
}

fn default_login_url() -> String {
    "https://newids.seu.edu.cn/authserver/login".to_string()
}

fn default_activity_list_url() -> String {
    "http://ehall.seu.edu.cn/gsapp/sys/jzxxtjapp/hdyy/queryActivityList.do".to_string()
}

fn default_captcha_url() -> String {
    "http://ehall.seu.edu.cn/gsapp/sys/jzxxtjapp/hdyy/vcode.do".to_string()
}

fn default_reserve_url() -> String {
    "http://ehall.seu.edu.cn/gsapp/sys/jzxxtjapp/hdyy/yySave.do".to_string()
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/102.0.0.0 Safari/537.36".to_string()
}

fn default_portal_timeout() -> u32 {
    3
}

fn default_utc_offset() -> String {
    "+08:00".to_string()
}

/// Catalog pagination
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogConfig {
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
        }
    }
}

fn default_page_size() -> u32 {
    10
}

/// Retry policy for login and catalog retrieval
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetryConfig {
    /// Maximum attempts before giving up (must be at least 1).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay after the first failure in milliseconds.
    #[serde(default = "default_initial_delay")]
    pub initial_delay_ms: u64,
    /// Upper bound for the delay in milliseconds.
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,
    /// Exponential backoff multiplier.
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay(),
            max_delay_ms: default_max_delay(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}

fn default_max_attempts() -> u32 {
    100
}

fn default_initial_delay() -> u64 {
    100
}

fn default_max_delay() -> u64 {
    2000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

/// Precision trigger timing
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TriggerConfig {
    /// How long before the opening instant the job starts (login etc).
    #[serde(default = "default_lead")]
    pub lead_secs: u64,
    /// Poll interval of the final wait in milliseconds (1-99).
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            lead_secs: default_lead(),
            poll_interval_ms: default_poll_interval(),
        }
    }
}

fn default_lead() -> u64 {
    10
}

fn default_poll_interval() -> u64 {
    5
}

/// Submission loop limits
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SubmissionConfig {
    /// Operator deadline for the whole submission loop, in seconds.
    #[serde(default = "default_max_duration")]
    pub max_duration_secs: u64,
    /// Pause between retryable attempts in milliseconds (default: none).
    #[serde(default)]
    pub retry_delay_ms: u64,
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            max_duration_secs: default_max_duration(),
            retry_delay_ms: 0,
        }
    }
}

fn default_max_duration() -> u64 {
    300
}

/// External captcha recognition command
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CaptchaConfig {
    /// Program that reads image bytes on stdin and prints the code.
    #[serde(default = "default_captcha_command")]
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default = "default_captcha_timeout")]
    pub timeout_secs: u64,
}

impl Default for CaptchaConfig {
    fn default() -> Self {
        Self {
            command: default_captcha_command(),
            args: Vec::new(),
            timeout_secs: default_captcha_timeout(),
        }
    }
}

fn default_captcha_command() -> String {
    "slotgrab-ocr".to_string()
}

fn default_captcha_timeout() -> u64 {
    5
}

/// Password encryption script run under Node
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EncryptorConfig {
    #[serde(default = "default_node_path")]
    pub node_path: PathBuf,
    /// The portal's own encryption script.
    #[serde(default = "default_script_path")]
    pub script_path: PathBuf,
    /// Global function in the script called as `f(password, salt)`.
    #[serde(default = "default_function")]
    pub function: String,
    #[serde(default = "default_encryptor_timeout")]
    pub timeout_secs: u64,
}

impl Default for EncryptorConfig {
    fn default() -> Self {
        Self {
            node_path: default_node_path(),
            script_path: default_script_path(),
            function: default_function(),
            timeout_secs: default_encryptor_timeout(),
        }
    }
}

fn default_node_path() -> PathBuf {
    PathBuf::from("node")
}

fn default_script_path() -> PathBuf {
    PathBuf::from("encrypt.js")
}

fn default_function() -> String {
    "encryptAES".to_string()
}

fn default_encryptor_timeout() -> u64 {
    5
}

/// Log file output
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Directory for per-run log files; stderr only when unset.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

/// Sanitized config for display (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub username: Option<String>,
    pub password_configured: bool,
    pub portal: PortalConfig,
    pub catalog: CatalogConfig,
    pub retry: RetryConfig,
    pub trigger: TriggerConfig,
    pub submission: SubmissionConfig,
    pub captcha: CaptchaConfig,
    pub encryptor: EncryptorConfig,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            username: config.account.username.clone(),
            password_configured: config
                .account
                .password
                .as_ref()
                .is_some_and(|p| !p.is_empty()),
            portal: config.portal.clone(),
            catalog: config.catalog.clone(),
            retry: config.retry.clone(),
            trigger: config.trigger.clone(),
            submission: config.submission.clone(),
            captcha: config.captcha.clone(),
            encryptor: config.encryptor.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.portal.timeout_secs, 3);
        assert_eq!(config.portal.utc_offset, "+08:00");
        assert_eq!(config.catalog.page_size, 10);
        assert_eq!(config.retry.max_attempts, 100);
        assert_eq!(config.trigger.lead_secs, 10);
        assert_eq!(config.trigger.poll_interval_ms, 5);
        assert_eq!(config.submission.max_duration_secs, 300);
        assert_eq!(config.encryptor.function, "encryptAES");
        assert!(config.account.username.is_none());
        assert!(config.logging.dir.is_none());
    }

    #[test]
    fn test_deserialize_overrides() {
        let toml = r#"
[account]
username = "220201234"
password = "hunter2"

[portal]
login_url = "http://127.0.0.1:9000/login"
timeout_secs = 5

[catalog]
page_size = 25

[captcha]
command = "python3"
args = ["ocr.py"]
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.account.username.as_deref(), Some("220201234"));
        assert_eq!(config.portal.login_url, "http://127.0.0.1:9000/login");
        assert_eq!(config.portal.timeout_secs, 5);
        // untouched fields keep their defaults
        assert_eq!(config.portal.utc_offset, "+08:00");
        assert_eq!(config.catalog.page_size, 25);
        assert_eq!(config.captcha.command, "python3");
        assert_eq!(config.captcha.args, vec!["ocr.py".to_string()]);
    }

    #[test]
    fn test_account_debug_redacts_password() {
        let account = AccountConfig {
            username: Some("alice".to_string()),
            password: Some("hunter2".to_string()),
        };
        let debug = format!("{:?}", account);
        assert!(debug.contains("alice"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_sanitized_config() {
        let mut config = Config::default();
        config.account.username = Some("alice".to_string());
        config.account.password = Some("hunter2".to_string());

        let sanitized = SanitizedConfig::from(&config);
        assert_eq!(sanitized.username.as_deref(), Some("alice"));
        assert!(sanitized.password_configured);

        let json = serde_json::to_string(&sanitized).unwrap();
        assert!(!json.contains("hunter2"));
    }

    #[test]
    fn test_sanitized_config_without_password() {
        let sanitized = SanitizedConfig::from(&Config::default());
        assert!(!sanitized.password_configured);
    }
}
