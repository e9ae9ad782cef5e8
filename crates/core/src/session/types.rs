use std::sync::atomic::{AtomicU64, Ordering};

use reqwest::Client;

/// Portal account credentials. The password never appears in `Debug` output.
#[derive(Clone)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// An authenticated portal session: one HTTP client with its own cookie jar.
///
/// Owned by exactly one holder at a time and closed by value.
#[derive(Debug)]
pub struct Session {
    id: u64,
    client: Client,
}

impl Session {
    pub(crate) fn new(client: Client) -> Self {
        Self {
            id: NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed),
            client,
        }
    }

    /// Process-unique id, for log correlation.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub(crate) fn client(&self) -> &Client {
        &self.client
    }

    /// Discard the session and its cookies.
    pub fn close(self) {
        tracing::debug!(session = self.id, "Session closed");
    }
}

/// How a hidden input names itself on the login page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// `name="..."`: a form field echoed back verbatim.
    Name,
    /// `id="..."`: carries the password salt.
    Id,
}

/// A hidden `<input>` scraped from the login page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HiddenField {
    pub kind: FieldKind,
    pub key: String,
    pub value: String,
}

/// Login form fields in submission order; setting a key twice keeps the last value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginForm {
    fields: Vec<(String, String)>,
}

impl LoginForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.fields.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
