// Startup configuration. Everything the bridge needs is read exactly once
// here: four required environment variables plus the broker's trust-anchor
// certificate from a fixed relative path. The resulting `Config` is
// immutable and handed to the bridge explicitly; nothing else in the
// program touches the environment.
use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result, bail};

/// Fixed relative path of the broker CA certificate. The file is read once
/// at startup; its absence is a fatal configuration error.
pub const CA_CERT_PATH: &str = "ca.crt";

const REQUIRED_VARS: &[&str] = &["MQTT_BROKER_URL", "MQTT_PORT", "TOPIC", "DISCORD_WEBHOOK_URL"];

#[derive(Debug, Clone)]
pub struct Config {
    pub broker_host: String,
    pub broker_port: u16,
    pub topic: String,
    pub webhook_url: String,
    /// PEM bytes of the broker CA, fed to the TLS transport as-is.
    pub ca: Vec<u8>,
}

impl Config {
    /// Load configuration from the process environment and `ca.crt`.
    /// A `.env` file in the working directory is honored if present.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::load(|key| std::env::var(key).ok(), Path::new(CA_CERT_PATH))
    }

    /// Inner loader with the variable lookup and certificate path injected,
    /// so tests can drive it without mutating the process environment.
    fn load(lookup: impl Fn(&str) -> Option<String>, ca_path: &Path) -> Result<Self> {
        let mut values = HashMap::new();
        let mut missing = Vec::new();
        for &name in REQUIRED_VARS {
            match lookup(name) {
                Some(v) => {
                    values.insert(name, v);
                }
                None => missing.push(name),
            }
        }
        // Report every missing variable in one error instead of failing on
        // the first so an operator fixes the whole set in one pass.
        if !missing.is_empty() {
            bail!("missing required environment variables: {}", missing.join(", "));
        }

        let port_raw = &values["MQTT_PORT"];
        let broker_port = port_raw
            .trim()
            .parse::<u16>()
            .with_context(|| format!("MQTT_PORT must be a port number, got {port_raw:?}"))?;

        let ca = std::fs::read(ca_path)
            .with_context(|| format!("reading trust anchor certificate {}", ca_path.display()))?;

        Ok(Config {
            broker_host: host_from_url(&values["MQTT_BROKER_URL"]),
            broker_port,
            topic: values["TOPIC"].clone(),
            webhook_url: values["DISCORD_WEBHOOK_URL"].clone(),
            ca,
        })
    }
}

/// Accept both a bare hostname and a URL form (`mqtts://broker.example.com`)
/// for MQTT_BROKER_URL; rumqttc wants just the host.
fn host_from_url(url: &str) -> String {
    let host = match url.split_once("://") {
        Some((_scheme, rest)) => rest,
        None => url,
    };
    host.trim_end_matches('/').to_string()
}

//   TESTS
//
