use crate::auth::reset_token::RESET_TOKEN_TTL_MINUTES;

pub fn render_password_reset(name: &str, reset_url: &str) -> String {
    let name = escape(name);
    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"></head>
<body style="font-family: sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;">
    <h2>Hello {name}</h2>
    <p>Please use the link below to reset your password.</p>
    <p><a href="{reset_url}" clicktracking="off" style="display: inline-block; padding: 10px 20px; background: #0070f3; color: white; text-decoration: none; border-radius: 4px;">Reset Password</a></p>
    <p style="color: #666; font-size: 14px;">This link is valid for {RESET_TOKEN_TTL_MINUTES} minutes. If you didn't request this, you can ignore it.</p>
    <p>Regards.</p>
</body>
</html>"#
    )
}

pub fn render_contact(from_name: &str, from_email: &str, message: &str) -> String {
    let from_name = escape(from_name);
    let from_email = escape(from_email);
    let message = escape(message).replace('\n', "<br>");
    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"></head>
<body style="font-family: sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;">
    <p><strong>{from_name}</strong> &lt;{from_email}&gt; wrote:</p>
    <p>{message}</p>
</body>
</html>"#
    )
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
