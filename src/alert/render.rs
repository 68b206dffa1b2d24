use crate::alert::severity::{severity_color, severity_name};
use crate::batch::AlertEvent;
use crate::config::types::duration_format::format_duration;
use chrono::Local;
use std::time::Duration;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedAlert {
    pub subject: String,
    pub body: String,
}

/// Escape the characters HTML treats as markup.
pub fn html_escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Subjects end up in mail headers: no line breaks or other control characters.
fn header_safe(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect()
}

/// Turns [`AlertEvent`]s into a subject line and an HTML body.
#[derive(Debug, Clone)]
pub struct AlertRenderer {
    host: String,
    window: Duration,
}

impl AlertRenderer {
    pub fn new(host: impl Into<String>, window: Duration) -> Self {
        Self {
            host: host.into(),
            window,
        }
    }

    pub fn render(&self, event: &AlertEvent) -> RenderedAlert {
        RenderedAlert {
            subject: self.subject(event),
            body: self.body(event),
        }
    }

    fn subject(&self, event: &AlertEvent) -> String {
        let service = display_or(&event.representative.service_id, "unknown");
        let mut subject = format!(
            "[{}] System Alert: {} on {}",
            severity_name(event.priority),
            service,
            self.host
        );
        if event.is_batched() {
            subject.push_str(&format!(" ({} occurrences)", event.count));
        }
        header_safe(&subject)
    }

    fn body(&self, event: &AlertEvent) -> String {
        let record = &event.representative;
        let color = severity_color(event.priority);
        let name = severity_name(event.priority);
        let host = html_escape(&self.host);
        let service = html_escape(display_or(&record.service_id, "unknown"));
        let unit = html_escape(display_or(&record.unit, "N/A"));
        let message = html_escape(&record.message);
        let time = record
            .timestamp
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S %Z")
            .to_string();

        let mut rows = String::new();
        rows.push_str(&table_row("Host", &host));
        rows.push_str(&table_row("Service", &service));
        rows.push_str(&table_row("Unit", &unit));
        rows.push_str(&table_row("Time", &time));
        if event.is_batched() {
            let span = (event.last_seen - event.first_seen)
                .to_std()
                .unwrap_or(Duration::ZERO);
            rows.push_str(&table_row("Occurrences", &event.count.to_string()));
            rows.push_str(&table_row(
                "Window",
                &format!(
                    "{} (observed over {})",
                    format_duration(self.window),
                    format_duration(Duration::from_secs(span.as_secs()))
                ),
            ));
        }

        let hint = if record.unit.is_empty() {
            format!("journalctl -t {} -n 50 --no-pager", service)
        } else {
            format!("journalctl -u {} -n 50 --no-pager", unit)
        };

        format!(
            r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>System Alert</title>
</head>
<body style="margin: 0; padding: 0; font-family: -apple-system, 'Segoe UI', Roboto, Arial, sans-serif; background: #1a1a2e; color: #e0e0e0;">
    <div style="max-width: 700px; margin: 40px auto; background: #0f1419; border-radius: 16px; overflow: hidden;">
        <div style="background: {color}; padding: 32px 30px; text-align: center;">
            <h1 style="margin: 0; font-size: 28px; color: white;">System Alert</h1>
            <p style="margin: 8px 0 0 0; color: rgba(255,255,255,0.9); font-size: 15px;">journalmon detected an issue on {host}</p>
        </div>
        <div style="padding: 30px;">
            <span class="severity severity-{class}" style="display: inline-block; background: {color}; color: white; padding: 8px 18px; border-radius: 50px; font-size: 14px; font-weight: 600;">{badge}</span>
            <table style="width: 100%; border-collapse: collapse; margin: 24px 0;">
{rows}            </table>
            <pre style="margin: 0 0 24px 0; padding: 18px 22px; border-left: 4px solid {color}; background: rgba(0,0,0,0.3); color: #f0f0f0; font-family: 'Courier New', monospace; white-space: pre-wrap; word-wrap: break-word;">{message}</pre>
            <p style="margin: 0; text-align: center;"><code style="background: rgba(0,0,0,0.4); color: #60a5fa; padding: 10px 16px; border-radius: 8px;">{hint}</code></p>
        </div>
        <div style="background: rgba(0,0,0,0.3); padding: 20px 30px; text-align: center; color: #6b7280; font-size: 12px;">
            Automated alert from journalmon v{version}. Please do not reply.
        </div>
    </div>
</body>
</html>
"#,
            color = color,
            host = host,
            class = name.to_lowercase(),
            badge = name.to_uppercase(),
            rows = rows,
            message = message,
            hint = hint,
            version = VERSION,
        )
    }
}

fn display_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.is_empty() {
        fallback
    } else {
        value
    }
}

/// `value` must already be escaped.
fn table_row(label: &str, value: &str) -> String {
    format!(
        "                <tr><td style=\"padding: 10px 0; color: #8b92a7; font-size: 13px; text-transform: uppercase;\">{}</td><td style=\"padding: 10px 0; text-align: right;\">{}</td></tr>\n",
        label, value
    )
}
