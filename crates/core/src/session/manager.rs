//! CAS login handshake.

use std::sync::{Arc, OnceLock};

use regex_lite::Regex;
use tracing::{debug, info};

use crate::config::PortalConfig;
use crate::crypto::PasswordEncryptor;
use crate::portal::{build_client, read_body, PortalError};
use crate::retry::{retry, RetryError, RetryPolicy};

use super::{Credentials, FieldKind, HiddenField, LoginForm, Session, SessionError};

const HIDDEN_INPUT_PATTERN: &str = r#"<input type="hidden" (name|id)="(.*?)" value="(.*?)"/?>"#;

fn hidden_input_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(HIDDEN_INPUT_PATTERN).expect("hidden input pattern is valid"))
}

/// Scrape hidden `<input>` fields from the login page, in page order.
pub fn extract_hidden_fields(page: &str) -> Vec<HiddenField> {
    hidden_input_regex()
        .captures_iter(page)
        .map(|caps| HiddenField {
            kind: if &caps[1] == "id" {
                FieldKind::Id
            } else {
                FieldKind::Name
            },
            key: caps[2].to_string(),
            value: caps[3].to_string(),
        })
        .collect()
}

/// The salt is the value of the id-kind field (the last one, if the page has several).
pub fn find_salt(fields: &[HiddenField]) -> Option<&str> {
    fields
        .iter()
        .rev()
        .find(|f| f.kind == FieldKind::Id)
        .map(|f| f.value.as_str())
}

/// Build the submission form: username, every scraped field verbatim, and
/// the encrypted password.
pub fn build_login_form(
    username: &str,
    fields: &[HiddenField],
    encrypted_password: &str,
) -> LoginForm {
    let mut form = LoginForm::new();
    form.set("username", username);
    for field in fields {
        form.set(field.key.as_str(), field.value.as_str());
        if field.kind == FieldKind::Id {
            form.set("password", encrypted_password);
        }
    }
    form
}

/// Performs logins against the portal.
pub struct SessionManager {
    config: PortalConfig,
    encryptor: Arc<dyn PasswordEncryptor>,
    retry_policy: RetryPolicy,
}

impl SessionManager {
    pub fn new(
        config: PortalConfig,
        encryptor: Arc<dyn PasswordEncryptor>,
        retry_policy: RetryPolicy,
    ) -> Self {
        Self {
            config,
            encryptor,
            retry_policy,
        }
    }

    /// One login attempt.
    ///
    /// Any HTTP status on the form POST yields a session; bad credentials only
    /// show up later as failing portal calls.
    pub async fn login(&self, credentials: &Credentials) -> Result<Session, SessionError> {
        let client = build_client(&self.config)?;

        let response = client
            .get(&self.config.login_url)
            .send()
            .await
            .map_err(PortalError::from)?;
        let page = read_body(response).await?;

        let fields = extract_hidden_fields(&page);
        if fields.is_empty() {
            return Err(SessionError::MalformedLoginPage(
                "no hidden form fields".to_string(),
            ));
        }
        let salt = find_salt(&fields).ok_or_else(|| {
            SessionError::MalformedLoginPage("no password salt field".to_string())
        })?;
        debug!(fields = fields.len(), "Scraped login form");

        let encrypted = self
            .encryptor
            .encrypt(credentials.password(), salt)
            .await?;
        let form = build_login_form(credentials.username(), &fields, &encrypted);

        let response = client
            .post(&self.config.login_url)
            .form(form.fields())
            .send()
            .await
            .map_err(PortalError::from)?;

        let session = Session::new(client);
        info!(
            session = session.id(),
            username = credentials.username(),
            status = response.status().as_u16(),
            "Login form submitted"
        );
        Ok(session)
    }

    /// Log in, retrying transient failures under the configured policy.
    pub async fn login_with_retry(
        &self,
        credentials: &Credentials,
    ) -> Result<Session, RetryError<SessionError>> {
        retry(&self.retry_policy, "login", |_| self.login(credentials)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOGIN_PAGE: &str = r#"
<form id="pwdFromId" method="post">
<input type="hidden" name="lt" value="LT-1234-abcdef"/>
<input type="hidden" name="dllt" value="generalLogin"/>
<input type="hidden" name="execution" value="e1s1"/>
<input type="hidden" name="_eventId" value="submit"/>
<input type="hidden" name="rmShown" value="1">
<input type="hidden" id="pwdDefaultEncryptSalt" value="rjBFAaHsNkKAhpoi"/>
</form>
"#;

    #[test]
    fn test_extract_hidden_fields() {
        let fields = extract_hidden_fields(LOGIN_PAGE);
        assert_eq!(fields.len(), 6);
        assert_eq!(fields[0].kind, FieldKind::Name);
        assert_eq!(fields[0].key, "lt");
        assert_eq!(fields[0].value, "LT-1234-abcdef");
        assert_eq!(fields[4].key, "rmShown");
        assert_eq!(fields[5].kind, FieldKind::Id);
        assert_eq!(fields[5].key, "pwdDefaultEncryptSalt");
    }

    #[test]
    fn test_extract_ignores_visible_inputs() {
        let page = r#"<input type="text" name="username" value=""/><input type="password" id="password" value=""/>"#;
        assert!(extract_hidden_fields(page).is_empty());
    }

    #[test]
    fn test_find_salt() {
        let fields = extract_hidden_fields(LOGIN_PAGE);
        assert_eq!(find_salt(&fields), Some("rjBFAaHsNkKAhpoi"));
        assert_eq!(find_salt(&fields[..5]), None);
    }

    #[test]
    fn test_build_login_form() {
        let fields = extract_hidden_fields(LOGIN_PAGE);
        let form = build_login_form("220201234", &fields, "CIPHERTEXT");

        assert_eq!(form.fields()[0], ("username".to_string(), "220201234".to_string()));
        assert_eq!(form.get("password"), Some("CIPHERTEXT"));
        // anti-automation fields round-trip unchanged
        assert_eq!(form.get("lt"), Some("LT-1234-abcdef"));
        assert_eq!(form.get("execution"), Some("e1s1"));
        assert_eq!(form.get("_eventId"), Some("submit"));
        assert_eq!(form.get("pwdDefaultEncryptSalt"), Some("rjBFAaHsNkKAhpoi"));
        assert_eq!(form.len(), 8);
    }
}
