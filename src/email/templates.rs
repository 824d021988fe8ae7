const BUTTON_STYLE: &str = "display: inline-block; padding: 10px 20px; background: #e8590c; color: white; text-decoration: none; border-radius: 4px;";

fn layout(heading: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"></head>
<body style="font-family: sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;">
    <h2>{heading}</h2>
    {content}
    <p style="color: #666; font-size: 14px;">HomeFix</p>
</body>
</html>"#
    )
}

fn button(url: &str, label: &str) -> String {
    format!(r#"<p><a href="{url}" style="{BUTTON_STYLE}">{label}</a></p>"#)
}

/// Minimal HTML escaping for user-supplied text.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn render_welcome(name: &str, base_url: &str) -> String {
    let name = escape(name);
    layout(
        "Welcome to HomeFix",
        &format!(
            "<p>Hi {name},</p>\n    <p>Your account has been created.</p>\n    {}",
            button(base_url, "Open HomeFix")
        ),
    )
}

pub fn render_password_reset(reset_url: &str) -> String {
    layout(
        "Password Reset",
        &format!(
            "<p>A password reset was requested for your HomeFix account.</p>\n    {}\n    <p style=\"color: #666; font-size: 14px;\">This link expires in 1 hour. If you didn't request this, you can ignore it.</p>",
            button(reset_url, "Reset Password")
        ),
    )
}

pub fn render_profile_updated(name: &str) -> String {
    let name = escape(name);
    layout(
        "Profile updated",
        &format!(
            "<p>Hi {name},</p>\n    <p>Your HomeFix profile was just changed. If this wasn't you, reset your password.</p>"
        ),
    )
}

pub fn render_account_deleted(name: &str) -> String {
    let name = escape(name);
    layout(
        "Account deleted",
        &format!(
            "<p>Hi {name},</p>\n    <p>Your HomeFix account and its requests, messages and reviews have been removed.</p>"
        ),
    )
}

pub fn render_request_received(name: &str, title: &str, request_url: &str) -> String {
    let (name, title) = (escape(name), escape(title));
    layout(
        "Request received",
        &format!(
            "<p>Hi {name},</p>\n    <p>We received your request <strong>{title}</strong>. We'll let you know when a technician takes it.</p>\n    {}",
            button(request_url, "View request")
        ),
    )
}

pub fn render_technician_assigned(
    client_name: &str,
    technician_name: &str,
    title: &str,
    request_url: &str,
) -> String {
    let (client_name, technician_name, title) =
        (escape(client_name), escape(technician_name), escape(title));
    layout(
        "A technician is on it",
        &format!(
            "<p>Hi {client_name},</p>\n    <p><strong>{technician_name}</strong> was assigned to <strong>{title}</strong>.</p>\n    {}",
            button(request_url, "Open conversation")
        ),
    )
}

pub fn render_new_assignment(technician_name: &str, title: &str, request_url: &str) -> String {
    let (technician_name, title) = (escape(technician_name), escape(title));
    layout(
        "New job assigned",
        &format!(
            "<p>Hi {technician_name},</p>\n    <p>You were assigned to <strong>{title}</strong>.</p>\n    {}",
            button(request_url, "View job")
        ),
    )
}

pub fn render_rate_service(client_name: &str, title: &str, request_url: &str) -> String {
    let (client_name, title) = (escape(client_name), escape(title));
    layout(
        "How did it go?",
        &format!(
            "<p>Hi {client_name},</p>\n    <p><strong>{title}</strong> was marked as completed. Tell others how it went.</p>\n    {}",
            button(request_url, "Leave a review")
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_text_is_escaped() {
        let html = render_request_received("<b>Ana</b>", "Tap & sink", "https://homefix.pt/r/1");
        assert!(html.contains("&lt;b&gt;Ana&lt;/b&gt;"));
        assert!(html.contains("Tap &amp; sink"));
        assert!(!html.contains("<b>Ana</b>"));
    }
}
