//! Server-rendered HTML for the login popup.

// self
use crate::auth::TargetOrigin;

const STYLE: &str = "body{font-family:system-ui,sans-serif;max-width:22rem;margin:3rem auto;padding:0 1rem}\
label{display:block;margin-top:1rem}input{width:100%;padding:.4rem;box-sizing:border-box}\
button{margin-top:1.5rem;padding:.5rem 1rem}";

/// Milliseconds the completion page stays open after posting the code.
pub const CLOSE_DELAY_MS: u64 = 1_500;

/// Escapes text for HTML element content and double-quoted attributes.
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

/// Makes serialized JSON safe to inline inside a `<script>` element.
fn script_safe(json: &str) -> String {
	json.replace('<', "\\u003c").replace('>', "\\u003e").replace('&', "\\u0026")
}

fn document(title: &str, body: &str) -> String {
	format!(
		"<!doctype html><html lang=\"en\"><head><meta charset=\"utf-8\">\
		 <meta name=\"viewport\" content=\"width=device-width,initial-scale=1\">\
		 <title>{title}</title><style>{STYLE}</style></head><body>{body}</body></html>",
		title = escape_html(title),
	)
}

/// Short banner served at `/`.
pub fn banner() -> &'static str {
	"Auth handoff service is running."
}

/// Username/password form. `target` is echoed back as the `redirect` field.
pub fn login_form(target: &TargetOrigin) -> String {
	let redirect = match target {
		TargetOrigin::Exact(origin) => escape_html(origin.as_str()),
		TargetOrigin::Any => String::new(),
	};
	let body = format!(
		"<h1>Sign in</h1>\
		 <form method=\"post\" action=\"/auth/submit\" autocomplete=\"off\">\
		 <input type=\"hidden\" name=\"redirect\" value=\"{redirect}\">\
		 <label>Username<input name=\"username\" required></label>\
		 <label>Password<input name=\"password\" type=\"password\" required></label>\
		 <button type=\"submit\">Sign in</button></form>"
	);

	document("Sign in", &body)
}

/// Completion page: posts `message_json` to the opener at `target`, then closes itself.
pub fn completion(target: &TargetOrigin, message_json: &str) -> String {
	let target_json = serde_json::Value::from(target.as_post_message_target()).to_string();
	let body = format!(
		"<h1>Signed in</h1><p>You can close this window.</p><script>\
		 (function(){{var message={message};var target={target};\
		 if(window.opener){{window.opener.postMessage(message,target);}}\
		 setTimeout(function(){{window.close();}},{CLOSE_DELAY_MS});}})();</script>",
		message = script_safe(message_json),
		target = script_safe(&target_json),
	);

	document("Signed in", &body)
}

/// Generic failure page. Never receives user input.
pub fn failure(title: &str, detail: &str) -> String {
	let body = format!("<h1>{}</h1><p>{}</p>", escape_html(title), escape_html(detail));

	document(title, &body)
}
