//! Runs the portal's own encryption script under Node.

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use crate::config::EncryptorConfig;
use crate::exec::run_piped;

use super::{EncryptError, PasswordEncryptor};

/// Loads the script into a fresh VM context and calls `function(plaintext, salt)`.
///
/// Arguments travel on stdin so the password never shows up in a process list.
const LOADER: &str = r#"
const fs = require('fs');
const vm = require('vm');
const input = JSON.parse(fs.readFileSync(0, 'utf8'));
const context = {};
vm.createContext(context);
vm.runInContext(fs.readFileSync(input.script, 'utf8'), context);
const fn = context[input.function];
if (typeof fn !== 'function') {
  process.stderr.write('function not found: ' + input.function);
  process.exit(2);
}
process.stdout.write(String(fn(input.plaintext, input.salt)));
"#;

/// Encryptor backed by a Node process running the portal's script unchanged.
pub struct NodeScriptEncryptor {
    config: EncryptorConfig,
}

impl NodeScriptEncryptor {
    pub fn new(config: EncryptorConfig) -> Self {
        Self { config }
    }

    fn loader_args() -> Vec<String> {
        vec!["-e".to_string(), LOADER.to_string()]
    }
}

#[async_trait]
impl PasswordEncryptor for NodeScriptEncryptor {
    fn name(&self) -> &str {
        "node-script"
    }

    async fn encrypt(&self, plaintext: &str, salt: &str) -> Result<String, EncryptError> {
        if !self.config.script_path.exists() {
            return Err(EncryptError::ScriptNotFound(
                self.config.script_path.display().to_string(),
            ));
        }

        let input = json!({
            "script": self.config.script_path,
            "function": self.config.function,
            "plaintext": plaintext,
            "salt": salt,
        });

        debug!(
            script = %self.config.script_path.display(),
            function = %self.config.function,
            "Encrypting password"
        );
        let stdout = run_piped(
            &self.config.node_path,
            &Self::loader_args(),
            input.to_string().as_bytes(),
            self.config.timeout_secs,
        )
        .await?;

        let ciphertext = String::from_utf8_lossy(&stdout).trim().to_string();
        if ciphertext.is_empty() {
            return Err(EncryptError::EmptyOutput);
        }
        Ok(ciphertext)
    }
}
