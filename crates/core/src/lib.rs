pub mod captcha;
pub mod catalog;
pub mod config;
pub mod crypto;
pub mod exec;
pub mod orchestrator;
pub mod portal;
pub mod retry;
pub mod session;
pub mod submission;
pub mod testing;
pub mod trigger;

pub use captcha::{CaptchaError, CaptchaRecognizer, CaptchaSolver, CommandRecognizer};
pub use catalog::{Activity, Catalog, CatalogError, CatalogFetcher};
pub use config::{
    load_config, load_config_from_env, load_config_from_str, validate_config, Config, ConfigError,
    SanitizedConfig,
};
pub use crypto::{EncryptError, NodeScriptEncryptor, PasswordEncryptor};
pub use orchestrator::{ReservationOrchestrator, ReservationReport, ReserveError};
pub use portal::PortalError;
pub use retry::{retry, RetryError, RetryEvent, RetryHook, RetryPolicy, Retryable};
pub use session::{Credentials, Session, SessionError, SessionManager};
pub use submission::{RetryReason, SubmissionError, SubmissionOutcome, Submitter};
pub use trigger::{Clock, PrecisionTrigger, Shutdown, SystemClock, TriggerError};
