use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Load environment variables from .env file with robust parsing.
/// Handles values with spaces without requiring quotes.
pub fn load_dotenv() {
    let env_path = Path::new(".env");
    if !env_path.exists() {
        return;
    }

    let content = match fs::read_to_string(env_path) {
        Ok(c) => c,
        Err(_) => return,
    };

    for line in content.lines() {
        let line = line.trim();

        // Skip empty lines and comments
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        // Find the first '=' and split there
        if let Some(eq_pos) = line.find('=') {
            let key = line[..eq_pos].trim();
            let mut value = line[eq_pos + 1..].trim();

            // Remove surrounding quotes if present
            if (value.starts_with('"') && value.ends_with('"'))
                || (value.starts_with('\'') && value.ends_with('\''))
            {
                value = &value[1..value.len() - 1];
            }

            // Only set if not already set (env vars take precedence)
            if std::env::var(key).is_err() {
                std::env::set_var(key, value);
            }
        }
    }
}

/// One parking space: a stable id plus the BCM pin pair of its HC-SR04.
///
/// Defined once at startup and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpaceConfig {
    pub id: String,
    pub trig: u8,
    pub echo: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub firebase: FirebaseConfig,
    pub monitor: MonitorConfig,
    pub spaces: Vec<SpaceConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirebaseConfig {
    /// Base URL of the Realtime Database instance.
    pub database_url: String,
    /// Auth token appended to every request (`?auth=`). Takes precedence
    /// over `credential_file` when both are set.
    pub auth_token: Option<String>,
    /// Path to a file whose (trimmed) contents are the auth token.
    pub credential_file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Pause between full sweeps of all spaces, in seconds.
    pub sweep_interval_secs: u64,
    /// Bounded wait for each echo edge, in milliseconds.
    pub echo_timeout_ms: u64,
    /// Distances below this (cm) mean a car is parked in the space.
    pub occupied_threshold_cm: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            firebase: FirebaseConfig {
                database_url:
                    "https://carstop-b1c30-default-rtdb.europe-west1.firebasedatabase.app"
                        .to_string(),
                auth_token: None,
                credential_file: None,
            },
            monitor: MonitorConfig {
                sweep_interval_secs: 2,
                echo_timeout_ms: 50,
                occupied_threshold_cm: 10.0,
            },
            spaces: vec![
                SpaceConfig {
                    id: "space_1".to_string(),
                    trig: 23,
                    echo: 24,
                },
                SpaceConfig {
                    id: "space_2".to_string(),
                    trig: 17,
                    echo: 27,
                },
                SpaceConfig {
                    id: "space_3".to_string(),
                    trig: 22,
                    echo: 5,
                },
            ],
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("FIREBASE_DATABASE_URL") {
            config.firebase.database_url = url;
        }
        if let Ok(token) = std::env::var("FIREBASE_AUTH_TOKEN") {
            config.firebase.auth_token = Some(token);
        }
        if let Ok(path) = std::env::var("FIREBASE_CREDENTIAL_FILE") {
            config.firebase.credential_file = Some(path);
        }

        if let Ok(secs) = std::env::var("SWEEP_INTERVAL_SECS") {
            if let Ok(s) = secs.parse() {
                config.monitor.sweep_interval_secs = s;
            }
        }
        if let Ok(ms) = std::env::var("ECHO_TIMEOUT_MS") {
            if let Ok(m) = ms.parse() {
                config.monitor.echo_timeout_ms = m;
            }
        }
        if let Ok(cm) = std::env::var("OCCUPIED_THRESHOLD_CM") {
            if let Ok(c) = cm.parse() {
                config.monitor.occupied_threshold_cm = c;
            }
        }

        // Space list as a JSON array, e.g.
        // SPACES=[{"id":"space_1","trig":23,"echo":24}]
        if let Ok(json) = std::env::var("SPACES") {
            match serde_json::from_str::<Vec<SpaceConfig>>(&json) {
                Ok(spaces) if !spaces.is_empty() => config.spaces = spaces,
                Ok(_) => warn!("SPACES is an empty list, keeping defaults"),
                Err(e) => warn!("Could not parse SPACES, keeping defaults: {}", e),
            }
        }

        config
    }
}
