// MQTT side of the bridge. `run()` loads configuration, connects to the
// broker over TLS using `rumqttc`, subscribes once the broker acknowledges
// the connection, and relays every publish on the topic to the Discord
// webhook. The loop never returns in normal operation; the process runs
// until killed.
use anyhow::Result;
use chrono::Utc;
use rumqttc::{AsyncClient, Event, EventLoop, Incoming, MqttOptions, QoS, TlsConfiguration, Transport};
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::discord;
use crate::notification::VacancyNotification;

pub async fn run() -> Result<()> {
    init_logging();

    let cfg = Config::from_env()?;
    let http = reqwest::Client::new();
    let (client, mut eventloop) = mqtt_client(&cfg);

    info!(host = %cfg.broker_host, port = cfg.broker_port, "connecting to MQTT broker");

    loop {
        match eventloop.poll().await {
            // Broker accepted the connection: issue the subscribe request.
            // rumqttc re-emits ConnAck after its automatic reconnects, so
            // the subscription is re-established the same way.
            Ok(Event::Incoming(Incoming::ConnAck(_))) => {
                info!(topic = %cfg.topic, "connected, subscribing");
                if let Err(e) = client.subscribe(&cfg.topic, QoS::AtLeastOnce).await {
                    // Not retried and not fatal; the bridge stays up and
                    // simply receives nothing until the next ConnAck.
                    error!(error = %e, topic = %cfg.topic, "subscribe request failed");
                }
            }
            Ok(Event::Incoming(Incoming::Publish(p))) => {
                let payload = String::from_utf8_lossy(&p.payload);
                debug!(topic = %p.topic, len = p.payload.len(), "message received");
                // Awaited inline, so inbound messages are handled strictly
                // one at a time in arrival order.
                relay_payload(&http, &cfg.webhook_url, &payload).await;
            }
            Ok(Event::Incoming(i)) => {
                debug!("incoming = {i:?}");
            }
            Ok(Event::Outgoing(o)) => {
                debug!("outgoing = {o:?}");
            }
            Err(e) => {
                // Back off on errors to avoid busy loops; the next poll
                // lets rumqttc attempt its own reconnect.
                error!(error = %e, "mqtt event loop error");
                tokio::time::sleep(std::time::Duration::from_secs(1)).await;
            }
        }
    }
}

/// Parse one inbound payload and forward it to the webhook. Both failure
/// modes end the same way: log and drop, no retry, no dead-letter.
async fn relay_payload(http: &reqwest::Client, webhook_url: &str, payload: &str) {
    let note: VacancyNotification = match serde_json::from_str(payload) {
        Ok(note) => note,
        Err(e) => {
            warn!(error = %e, "dropping unparseable vacancy payload");
            return;
        }
    };

    let body = discord::format_notification(&note);
    match discord::post_webhook(http, webhook_url, &body).await {
        Ok(()) => info!("notification delivered to Discord"),
        Err(e) => error!(error = %e, "webhook delivery failed, notification dropped"),
    }
}

fn mqtt_client(cfg: &Config) -> (AsyncClient, EventLoop) {
    // Unique client id per process start so a restart never collides with
    // a lingering broker-side session.
    let client_id = format!("mqtt-discord-bridge-{}", Utc::now().timestamp_millis());
    let mut options = MqttOptions::new(client_id, &cfg.broker_host, cfg.broker_port);
    options.set_keep_alive(std::time::Duration::from_secs(5));
    options.set_transport(Transport::Tls(TlsConfiguration::Simple {
        ca: cfg.ca.clone(),
        alpn: None,
        client_auth: None,
    }));

    AsyncClient::new(options, 10)
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .compact(),
        )
        .init();
}

//   TESTS
//
