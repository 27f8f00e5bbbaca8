// Discord side of the bridge: the webhook body types, the pure formatter
// that turns a `VacancyNotification` into an embed, and the one-shot HTTP
// sink. The formatter is stateless so it can be tested without any I/O;
// the sink makes exactly one attempt and leaves retrying to nobody.
use anyhow::Result;
use chrono::Utc;
use serde::Serialize;

use crate::notification::VacancyNotification;

const EMBED_COLOR: u32 = 0x1abc9c;
const APARTMENTS_LINK: &str =
    "[View Apartments](https://www.psoas.fi/en/apartments/?_sfm_huoneistojen_tilanne=vapaa_ja_vapautumassa)";
// Zero-width space: Discord rejects embed fields with an empty value, so
// label-only lines carry this as their value.
const BLANK_VALUE: &str = "\u{200B}";

#[derive(Debug, Serialize)]
pub struct WebhookPayload {
    pub content: String,
    pub embeds: Vec<Embed>,
}

#[derive(Debug, Serialize)]
pub struct Embed {
    pub color: u32,
    pub title: String,
    pub fields: Vec<EmbedField>,
    pub footer: EmbedFooter,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Serialize)]
pub struct EmbedFooter {
    pub text: String,
}

impl EmbedField {
    fn label(name: String) -> Self {
        EmbedField { name, value: BLANK_VALUE.to_string(), inline: false }
    }
}

/// Render a notification as a Discord webhook body. Each field becomes its
/// own labeled line; absent or empty text fields show `N/A`, absent counts
/// show `0`. The timestamp is generated here, not taken from the message.
pub fn format_notification(note: &VacancyNotification) -> WebhookPayload {
    let fields = vec![
        EmbedField::label(format!("📅 Date: {}", render_or(&note.date, "N/A"))),
        EmbedField::label(format!("⏰ Time: {}", render_or(&note.time, "N/A"))),
        EmbedField::label(format!("📊 Total Vacant: {}", render_or(&note.count, "0"))),
        EmbedField::label(format!("🏠 Shared Apartments: {}", render_or(&note.shared, "0"))),
        EmbedField::label(format!("🛏️ Studio Apartments: {}", render_or(&note.studio, "0"))),
        EmbedField::label(format!("👨‍👩‍👧‍👦 Family Apartments: {}", render_or(&note.family, "0"))),
        EmbedField {
            name: "📍 Addresses".to_string(),
            value: render_addresses(&note.addresses),
            inline: true,
        },
        EmbedField {
            name: "🔗 Link".to_string(),
            value: APARTMENTS_LINK.to_string(),
            inline: false,
        },
    ];

    WebhookPayload {
        content: "**🏢 Apartment Vacancy Update**".to_string(),
        embeds: vec![Embed {
            color: EMBED_COLOR,
            title: "Details of Available Apartments".to_string(),
            fields,
            footer: EmbedFooter { text: "Vacancy data received via MQTT".to_string() },
            timestamp: Utc::now().to_rfc3339(),
        }],
    }
}

// Every field arrives as an arbitrary JSON value; the labeled lines fall
// back to their placeholder for absent, empty-string, `false`, and zero
// values. Strings pass through and any other value keeps its JSON text so
// a malformed field is still visible in the channel.
fn render_or(value: &serde_json::Value, placeholder: &str) -> String {
    use serde_json::Value;
    match value {
        Value::Null | Value::Bool(false) => placeholder.to_string(),
        Value::String(s) if s.is_empty() => placeholder.to_string(),
        Value::Number(n) if n.as_f64() == Some(0.0) => placeholder.to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// Addresses have no fallback line of their own, only an absent-safe
// placeholder; whatever value arrives is shown as-is.
fn render_addresses(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => "N/A".to_string(),
        other => other.to_string(),
    }
}

/// Deliver one payload to the webhook. Single attempt, client-default
/// timeout, non-2xx status counts as failure. The caller logs and drops.
pub async fn post_webhook(
    client: &reqwest::Client,
    webhook_url: &str,
    payload: &WebhookPayload,
) -> Result<()> {
    client
        .post(webhook_url)
        .json(payload)
        .send()
        .await?
        .error_for_status()?;
    Ok(())
}

//   TESTS
//

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn note_from(json: &str) -> VacancyNotification {
        serde_json::from_str(json).expect("parse test notification")
    }

    fn field_names(payload: &WebhookPayload) -> Vec<&str> {
        payload.embeds[0].fields.iter().map(|f| f.name.as_str()).collect()
    }

    #[test]
    fn full_notification_renders_every_field() {
        let note = note_from(
            r#"{"date":"2024-01-01","time":"10:00","count":5,"shared":2,"studio":3,"family":0,"addresses":"Main St 1"}"#,
        );
        let payload = format_notification(&note);

        assert_eq!(payload.content, "**🏢 Apartment Vacancy Update**");
        let embed = &payload.embeds[0];
        assert_eq!(embed.color, 0x1abc9c);
        assert_eq!(embed.title, "Details of Available Apartments");
        assert_eq!(embed.footer.text, "Vacancy data received via MQTT");

        let names = field_names(&payload);
        assert_eq!(names[0], "📅 Date: 2024-01-01");
        assert_eq!(names[1], "⏰ Time: 10:00");
        assert_eq!(names[2], "📊 Total Vacant: 5");
        assert_eq!(names[3], "🏠 Shared Apartments: 2");
        assert_eq!(names[4], "🛏️ Studio Apartments: 3");
        assert_eq!(names[5], "👨‍👩‍👧‍👦 Family Apartments: 0");
        assert_eq!(names[6], "📍 Addresses");
        assert_eq!(embed.fields[6].value, "Main St 1");
        assert!(embed.fields[6].inline);
        assert_eq!(names[7], "🔗 Link");
        assert!(embed.fields[7].value.contains("psoas.fi"));
    }

    #[test]
    fn sparse_notification_renders_placeholders() {
        let note = note_from(r#"{"addresses":"Oak Ave 2"}"#);
        let payload = format_notification(&note);

        let names = field_names(&payload);
        assert_eq!(names[0], "📅 Date: N/A");
        assert_eq!(names[1], "⏰ Time: N/A");
        assert_eq!(names[2], "📊 Total Vacant: 0");
        assert_eq!(names[3], "🏠 Shared Apartments: 0");
        assert_eq!(names[4], "🛏️ Studio Apartments: 0");
        assert_eq!(names[5], "👨‍👩‍👧‍👦 Family Apartments: 0");
        assert_eq!(payload.embeds[0].fields[6].value, "Oak Ave 2");
    }

    #[test]
    fn missing_addresses_renders_placeholder() {
        let payload = format_notification(&note_from("{}"));
        assert_eq!(payload.embeds[0].fields[6].value, "N/A");
    }

    #[test]
    fn wrong_typed_addresses_keeps_json_text() {
        let payload = format_notification(&note_from(r#"{"addresses":42}"#));
        assert_eq!(payload.embeds[0].fields[6].value, "42");
    }

    #[test]
    fn wrong_typed_count_still_renders() {
        let payload = format_notification(&note_from(r#"{"count":"5","addresses":"X"}"#));
        assert_eq!(field_names(&payload)[2], "📊 Total Vacant: 5");
    }

    #[test]
    fn wrong_typed_date_keeps_json_text() {
        let payload = format_notification(&note_from(r#"{"date":20240101,"addresses":"X"}"#));
        assert_eq!(field_names(&payload)[0], "📅 Date: 20240101");
    }

    #[test]
    fn empty_strings_render_placeholders() {
        let payload =
            format_notification(&note_from(r#"{"date":"","time":"","count":"","addresses":"X"}"#));
        let names = field_names(&payload);
        assert_eq!(names[0], "📅 Date: N/A");
        assert_eq!(names[1], "⏰ Time: N/A");
        assert_eq!(names[2], "📊 Total Vacant: 0");
    }

    #[test]
    fn falsy_values_render_placeholders() {
        let payload =
            format_notification(&note_from(r#"{"count":0,"shared":false,"addresses":"X"}"#));
        let names = field_names(&payload);
        assert_eq!(names[2], "📊 Total Vacant: 0");
        assert_eq!(names[3], "🏠 Shared Apartments: 0");
    }

    #[test]
    fn timestamp_is_rfc3339() {
        let payload = format_notification(&note_from(r#"{"addresses":"X"}"#));
        let ts = &payload.embeds[0].timestamp;
        assert!(chrono::DateTime::parse_from_rfc3339(ts).is_ok(), "bad timestamp: {ts}");
    }

    #[test]
    fn label_fields_carry_zero_width_space_value() {
        let payload = format_notification(&note_from(r#"{"addresses":"X"}"#));
        for field in &payload.embeds[0].fields[..6] {
            assert_eq!(field.value, "\u{200B}");
            assert!(!field.inline);
        }
    }

    #[tokio::test]
    async fn sink_posts_payload_once() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/webhook")
                    .header("content-type", "application/json")
                    .json_body_partial(r#"{"content": "**🏢 Apartment Vacancy Update**"}"#);
                then.status(204);
            })
            .await;

        let payload = format_notification(&note_from(r#"{"addresses":"Main St 1"}"#));
        let client = reqwest::Client::new();
        post_webhook(&client, &server.url("/webhook"), &payload)
            .await
            .expect("delivery should succeed");

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn sink_reports_http_failure() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/webhook");
                then.status(500);
            })
            .await;

        let payload = format_notification(&note_from(r#"{"addresses":"X"}"#));
        let client = reqwest::Client::new();
        let result = post_webhook(&client, &server.url("/webhook"), &payload).await;
        assert!(result.is_err(), "5xx response must surface as an error");
    }
}
