use std::{env, fs};

use tracing::error;

/// Reads a secret from the file named by `file_env_var_name`, falling back
/// to the plain `env_var_name` variable.
///
/// File contents are trimmed so a trailing newline does not end up in
/// credentials.
pub fn get_secret(file_env_var_name: &str, env_var_name: &str) -> Option<String> {
    if let Ok(secret_file_path) = env::var(file_env_var_name) {
        match fs::read_to_string(&secret_file_path) {
            Ok(content) => Some(content.trim().to_string()),
            Err(e) => {
                error!(%secret_file_path, ?e, "Error reading secret file");
                None
            }
        }
    } else {
        env::var(env_var_name).ok()
    }
}
