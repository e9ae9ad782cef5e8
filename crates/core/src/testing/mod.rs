//! Testing utilities and mock implementations.
//!
//! Mocks stand in for the pieces that touch the outside world (password
//! helper, captcha engine, wall clock) so a reservation can be exercised end
//! to end against a mock portal.
//!
//! # Example
//!
//! ```rust,ignore
//! use slotgrab_core::testing::{MockClock, MockEncryptor, MockRecognizer};
//!
//! let clock = MockClock::at(Utc.with_ymd_and_hms(2029, 12, 31, 15, 59, 50).unwrap());
//! let recognizer = MockRecognizer::new("ab12");
//! recognizer.push_guesses(["wrong", "wrong"]).await;
//! ```

mod mock_clock;
mod mock_encryptor;
mod mock_recognizer;

pub use mock_clock::MockClock;
pub use mock_encryptor::{MockEncryptor, RecordedEncryption};
pub use mock_recognizer::MockRecognizer;

/// Portal payload fixtures.
pub mod fixtures {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde_json::{json, Value};

    use crate::catalog::Activity;

    /// Salt carried by [`LOGIN_PAGE`].
    pub const LOGIN_SALT: &str = "rjBFAaHsNkKAhpoi";

    /// A login page with the usual hidden fields and an id-addressed salt.
    pub const LOGIN_PAGE: &str = r#"<!DOCTYPE html>
<html><body>
<form id="casLoginForm" method="post" action="/authserver/login">
<input id="username" name="username" type="text" value=""/>
<input id="password" type="password" value=""/>
<input type="hidden" name="lt" value="LT-5517-qRBvT0e5dAfmVeZT"/>
<input type="hidden" name="dllt" value="userNamePasswordLogin"/>
<input type="hidden" name="execution" value="e1s1"/>
<input type="hidden" name="_eventId" value="submit"/>
<input type="hidden" name="rmShown" value="1">
<input type="hidden" id="pwdDefaultEncryptSalt" value="rjBFAaHsNkKAhpoi"/>
</form>
</body></html>"#;

    /// A page that is clearly not a login form.
    pub const MAINTENANCE_PAGE: &str = "<html><body><h1>系统维护中</h1></body></html>";

    /// Create an activity.
    pub fn activity(id: &str, name: &str, opens_at: &str) -> Activity {
        Activity {
            id: id.to_string(),
            name: name.to_string(),
            opens_at_raw: opens_at.to_string(),
        }
    }

    /// Numbered activities `act-1..=act-n`, all opening at `opens_at`.
    pub fn activities(n: usize, opens_at: &str) -> Vec<Activity> {
        (1..=n)
            .map(|i| {
                let id = format!("act-{}", i);
                activity(&id, &format!("讲座 {}", i), opens_at)
            })
            .collect()
    }

    /// The listing endpoint's JSON for one page.
    pub fn activity_page(
        activities: &[Activity],
        page_index: u64,
        page_size: u64,
        total: u64,
    ) -> Value {
        json!({
            "datas": activities,
            "pageIndex": page_index,
            "pageSize": page_size,
            "total": total,
        })
    }

    /// The captcha endpoint's JSON, wrapping `image` as a data URL.
    pub fn captcha_body(image: &[u8]) -> Value {
        json!({ "result": format!("data:image/jpeg;base64,{}", STANDARD.encode(image)) })
    }

    /// A reserve endpoint reply.
    pub fn reserve_reply(code: u16, msg: &str) -> Value {
        json!({ "code": code, "msg": msg })
    }
}
