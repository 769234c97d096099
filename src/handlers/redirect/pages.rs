// Minimal HTML pages the resolver redirects to
// Everything user-controlled goes through `escape_html` before it is interpolated.

use crate::models::content::{QrContent, VcardContent, WifiContent};
use crate::models::QrCode;
use crate::services::DenyReason;

pub fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Shared document shell. `title` is escaped; `body` must already be safe.
fn page(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <meta name="robots" content="noindex">
    <title>{}</title>
    <style>
        body {{
            margin: 0;
            padding: 0;
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            background: linear-gradient(135deg, #667eea 0%, #764ba2 100%);
            color: #1f2937;
            min-height: 100vh;
            display: flex;
            align-items: center;
            justify-content: center;
        }}
        .container {{
            width: 100%;
            max-width: 420px;
            margin: 1rem;
            padding: 2rem;
            background: white;
            border-radius: 16px;
            box-shadow: 0 20px 40px rgba(0, 0, 0, 0.15);
        }}
        h1 {{
            margin: 0 0 1rem;
            font-size: 1.5rem;
        }}
        p {{
            line-height: 1.6;
            color: #4b5563;
        }}
        dl {{
            margin: 0;
        }}
        dt {{
            font-size: 0.8rem;
            text-transform: uppercase;
            color: #6b7280;
            margin-top: 0.75rem;
        }}
        dd {{
            margin: 0.25rem 0 0;
            word-break: break-word;
        }}
        .text {{
            white-space: pre-wrap;
        }}
        pre {{
            background: #f3f4f6;
            padding: 0.75rem;
            border-radius: 8px;
            overflow-x: auto;
        }}
        input {{
            width: 100%;
            box-sizing: border-box;
            padding: 0.75rem;
            border: 1px solid #d1d5db;
            border-radius: 8px;
            font-size: 1rem;
            margin-bottom: 0.75rem;
        }}
        button, .button {{
            display: inline-block;
            width: 100%;
            box-sizing: border-box;
            padding: 0.75rem;
            border: none;
            border-radius: 8px;
            background: #667eea;
            color: white;
            font-size: 1rem;
            text-align: center;
            text-decoration: none;
            cursor: pointer;
            margin-top: 1rem;
        }}
        .error {{
            color: #b91c1c;
            min-height: 1.5rem;
        }}
    </style>
</head>
<body>
    <div class="container">
{}
    </div>
</body>
</html>"#,
        escape_html(title),
        body
    )
}

/// Password form for a protected code; posts to the verification endpoint
pub fn challenge_page(slug: &str) -> String {
    let slug = escape_html(slug);
    let body = format!(
        r#"        <h1>Password required</h1>
        <p>This QR code is protected. Enter the password to continue.</p>
        <form id="verify-form">
            <input type="password" id="password" name="password" placeholder="Password" autocomplete="current-password" required autofocus>
            <div class="error" id="error"></div>
            <button type="submit">Continue</button>
        </form>
        <script>
            document.getElementById('verify-form').addEventListener('submit', async (event) => {{
                event.preventDefault();
                const error = document.getElementById('error');
                error.textContent = '';
                try {{
                    const response = await fetch('/api/v1/qr/verify-password', {{
                        method: 'POST',
                        headers: {{ 'Content-Type': 'application/json' }},
                        credentials: 'same-origin',
                        body: JSON.stringify({{
                            slug: '{slug}',
                            password: document.getElementById('password').value
                        }})
                    }});
                    const data = await response.json();
                    if (response.ok && data.success) {{
                        window.location.href = data.redirect;
                    }} else {{
                        error.textContent = data.error || 'Incorrect password';
                    }}
                }} catch (e) {{
                    error.textContent = 'Something went wrong. Please try again.';
                }}
            }});
        </script>"#,
        slug = slug
    );

    page("Password required", &body)
}

/// Reason-aware unavailable page
pub fn expired_page(reason: Option<DenyReason>) -> String {
    let (heading, message) = match reason {
        Some(DenyReason::Limit) => (
            "Scan limit reached",
            "This QR code has reached the maximum number of scans its owner allowed.",
        ),
        Some(DenyReason::Subscription) => (
            "QR code inactive",
            "The owner's plan for this QR code is no longer active.",
        ),
        _ => (
            "QR code unavailable",
            "This QR code does not exist or has been disabled by its owner.",
        ),
    };

    page(
        heading,
        &format!(
            "        <h1>{}</h1>\n        <p>{}</p>",
            heading, message
        ),
    )
}

fn detail(label: &str, value: &str) -> String {
    format!("<dt>{}</dt><dd>{}</dd>", label, escape_html(value))
}

fn detail_link(label: &str, href: &str, text: &str) -> String {
    format!(
        r#"<dt>{}</dt><dd><a href="{}">{}</a></dd>"#,
        label,
        escape_html(href),
        escape_html(text)
    )
}

fn optional(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn vcard_body(slug: &str, vcard: &VcardContent, pass: Option<&str>) -> String {
    let download = match pass {
        Some(pass) => format!("/view/{}/contact.vcf?pass={}", slug, pass),
        None => format!("/view/{}/contact.vcf", slug),
    };
    let name = vcard.full_name();
    let mut rows = Vec::new();
    if let Some(org) = optional(&vcard.organization) {
        rows.push(detail("Organization", org));
    }
    if let Some(title) = optional(&vcard.title) {
        rows.push(detail("Title", title));
    }
    if let Some(phone) = optional(&vcard.phone) {
        rows.push(detail_link("Phone", &format!("tel:{}", phone), phone));
    }
    if let Some(email) = optional(&vcard.email) {
        rows.push(detail_link("Email", &format!("mailto:{}", email), email));
    }
    if let Some(website) = optional(&vcard.website) {
        rows.push(detail_link("Website", website, website));
    }
    if let Some(address) = optional(&vcard.address) {
        rows.push(detail("Address", address));
    }

    format!(
        r#"        <h1>{}</h1>
        <dl>{}</dl>
        <a class="button" href="{}">Save contact</a>"#,
        escape_html(if name.is_empty() { "Contact" } else { &name }),
        rows.join(""),
        escape_html(&download)
    )
}

fn wifi_body(wifi: &WifiContent) -> String {
    let mut rows = vec![detail("Network", &wifi.ssid)];
    if let Some(password) = optional(&wifi.password) {
        rows.push(detail("Password", password));
    }
    rows.push(detail(
        "Security",
        wifi.encryption.as_deref().unwrap_or("WPA"),
    ));
    if wifi.hidden {
        rows.push(detail("Hidden", "yes"));
    }

    format!(
        "        <h1>WiFi network</h1>\n        <dl>{}</dl>\n        <pre>{}</pre>",
        rows.join(""),
        escape_html(&QrContent::wifi_string(wifi))
    )
}

/// Landing page for content that is not itself a URL
/// Rendered content of a non-URL code. `pass` is forwarded to the vCard download.
pub fn landing_page(qr: &QrCode, pass: Option<&str>) -> String {
    let body = match qr.typed_content() {
        QrContent::Vcard(vcard) => vcard_body(&qr.slug, &vcard, pass),
        QrContent::Wifi(wifi) => wifi_body(&wifi),
        QrContent::Text(text) => format!(
            "        <h1>{}</h1>\n        <p class=\"text\">{}</p>",
            escape_html(&qr.name),
            escape_html(&text.text)
        ),
        QrContent::Email(email) => {
            let mut rows = vec![detail_link(
                "To",
                &format!("mailto:{}", email.email),
                &email.email,
            )];
            if let Some(subject) = optional(&email.subject) {
                rows.push(detail("Subject", subject));
            }
            if let Some(message) = optional(&email.body) {
                rows.push(detail("Message", message));
            }
            format!("        <h1>Send an email</h1>\n        <dl>{}</dl>", rows.join(""))
        },
        QrContent::Phone(phone) => format!(
            "        <h1>Call</h1>\n        <a class=\"button\" href=\"{}\">{}</a>",
            escape_html(&format!("tel:{}", phone.phone)),
            escape_html(&phone.phone)
        ),
        QrContent::Sms(sms) => {
            let mut rows = vec![detail_link(
                "To",
                &format!("sms:{}", sms.phone),
                &sms.phone,
            )];
            if let Some(message) = optional(&sms.message) {
                rows.push(detail("Message", message));
            }
            format!("        <h1>Send a text</h1>\n        <dl>{}</dl>", rows.join(""))
        },
        QrContent::Location(location) => {
            let label = optional(&location.label)
                .map(str::to_string)
                .unwrap_or_else(|| format!("{}, {}", location.latitude, location.longitude));
            format!(
                "        <h1>{}</h1>\n        <a class=\"button\" href=\"{}\">Open in maps</a>",
                escape_html(&label),
                escape_html(&format!(
                    "https://www.google.com/maps/search/?api=1&query={},{}",
                    location.latitude, location.longitude
                ))
            )
        },
        // URL types only land here when their URL is unusable
        QrContent::Website(c) | QrContent::Video(c) => format!(
            "        <h1>{}</h1>\n        <p>This code points to an address that cannot be opened:</p>\n        <pre>{}</pre>",
            escape_html(&qr.name),
            escape_html(&c.url)
        ),
        QrContent::Social { url, .. } => format!(
            "        <h1>{}</h1>\n        <p>This code points to an address that cannot be opened:</p>\n        <pre>{}</pre>",
            escape_html(&qr.name),
            escape_html(&url)
        ),
        QrContent::Opaque { payload, .. } => format!(
            "        <h1>{}</h1>\n        <pre>{}</pre>",
            escape_html(&qr.name),
            escape_html(&serde_json::to_string_pretty(&payload).unwrap_or_default())
        ),
    };

    page(&qr.name, &body)
}
