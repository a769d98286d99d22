use chrono::{Datelike, Utc};

const BASE_STYLES: &str = r#"
        :root { color-scheme: light; }
        body { font-family: "Helvetica Neue", Arial, sans-serif; margin: 0; background: #f8fafc; color: #0f172a; }
        header { background: #ffffff; padding: 1.5rem; border-bottom: 1px solid #e2e8f0; display: flex; justify-content: space-between; align-items: center; flex-wrap: wrap; gap: 1rem; }
        header h1 { margin: 0; font-size: 1.4rem; }
        header form { margin: 0; }
        main { padding: 2rem 1.5rem; max-width: 960px; margin: 0 auto; box-sizing: border-box; }
        .panel { background: #ffffff; border-radius: 12px; border: 1px solid #e2e8f0; padding: 1.5rem; box-shadow: 0 18px 40px rgba(15, 23, 42, 0.08); }
        .panel h2 { margin-top: 0; }
        label { display: block; margin-top: 1rem; font-weight: 600; }
        input, select, textarea { width: 100%; padding: 0.7rem; margin-top: 0.4rem; border-radius: 8px; border: 1px solid #cbd5f5; background: #f8fafc; color: #0f172a; box-sizing: border-box; font-size: 0.95rem; }
        .grid { display: grid; grid-template-columns: repeat(auto-fit, minmax(260px, 1fr)); gap: 0 1.25rem; }
        button { margin-top: 1.5rem; padding: 0.8rem 1.2rem; border: none; border-radius: 8px; background: #2563eb; color: #ffffff; font-weight: 600; cursor: pointer; }
        button:hover { background: #1d4ed8; }
        .link-list a { display: block; padding: 0.75rem 0; color: #1d4ed8; font-weight: 600; text-decoration: none; border-bottom: 1px solid #e2e8f0; }
        .flash { padding: 0.85rem 1rem; border-radius: 8px; margin-bottom: 1rem; }
        .flash.error { background: #fee2e2; color: #b91c1c; }
        .flash.success { background: #dcfce7; color: #166534; }
        .note { color: #475569; font-size: 0.95rem; }
        .app-footer { margin-top: 3rem; text-align: center; font-size: 0.85rem; color: #94a3b8; }
"#;

fn render_page(title: &str, header_actions: &str, body: &str) -> String {
    let footer = render_footer();
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>{title}</title>
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <meta name="robots" content="noindex,nofollow">
    <style>
{styles}
    </style>
</head>
<body>
    <header>
        <h1>{title}</h1>
        {header_actions}
    </header>
    <main>
{body}
        {footer}
    </main>
</body>
</html>"#,
        title = escape_html(title),
        styles = BASE_STYLES,
    )
}

fn logout_button() -> &'static str {
    r#"<form method="post" action="/logout"><button type="submit">Log out</button></form>"#
}

fn flash_error(error: Option<&str>) -> String {
    error
        .map(|message| format!(r#"<div class="flash error">{}</div>"#, escape_html(message)))
        .unwrap_or_default()
}

/// Which credential form to render; both speak the same protocol.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoginKind {
    User,
    Admin,
}

pub fn render_login_page(kind: LoginKind, error: Option<&str>) -> String {
    let (title, action, email_field, password_field, switch_link) = match kind {
        LoginKind::User => (
            "MBTB Portal Login",
            "/login",
            "user_email",
            "user_password",
            r#"<a href="/admin_login">Administrator login</a>"#,
        ),
        LoginKind::Admin => (
            "MBTB Administrator Login",
            "/admin_login",
            "admin_email",
            "admin_password",
            r#"<a href="/login">Researcher login</a>"#,
        ),
    };

    let body = format!(
        r#"        <section class="panel">
            {flash}
            <form method="post" action="{action}">
                <label for="{email_field}">Email</label>
                <input id="{email_field}" name="{email_field}" type="email" required>
                <label for="{password_field}">Password</label>
                <input id="{password_field}" name="{password_field}" type="password" required>
                <button type="submit">Log in</button>
            </form>
            <p class="note">{switch_link}</p>
        </section>"#,
        flash = flash_error(error),
    );

    render_page(title, "", &body)
}

pub fn render_message_page(title: &str, message: &str) -> String {
    let class = if title == "Error" { "error" } else { "success" };
    let body = format!(
        r#"        <section class="panel">
            <div class="flash {class}">{message}</div>
            <p class="note"><a href="/">Back to home</a></p>
        </section>"#,
        message = escape_html(message),
    );
    render_page(title, logout_button(), &body)
}

pub fn render_user_home() -> String {
    let body = r#"        <section class="panel">
            <h2>Welcome</h2>
            <p class="note">You are signed in to the Maritime Brain Tissue Bank portal.</p>
        </section>"#;
    render_page("MBTB Portal", logout_button(), body)
}

pub fn render_admin_home() -> String {
    let body = r#"        <section class="panel link-list">
            <h2>Administration</h2>
            <a href="/add_new_data">Add a tissue record</a>
        </section>"#;
    render_page("MBTB Administration", logout_button(), body)
}

const RECORD_TEXT_FIELDS: &[(&str, &str, bool)] = &[
    ("mbtb_code", "MBTB code", true),
    ("sex", "Sex", true),
    ("age", "Age", true),
    ("race", "Race", false),
    ("clinical_diagnosis", "Clinical diagnosis", true),
    ("duration", "Duration (years)", false),
    ("clinical_history", "Clinical history", true),
    ("cause_of_death", "Cause of death", false),
    ("postmortem_interval", "Postmortem interval", true),
    ("time_in_fix", "Time in fixative", true),
    ("neuoropathology_diagnosis", "Neuropathology diagnosis", true),
    ("neuoropathology_detailed", "Neuropathology (detailed)", false),
    ("neuoropathology_gross", "Neuropathology (gross)", false),
    ("neuoropathology_micro", "Neuropathology (micro)", false),
    ("neuoropathology_criteria", "Neuropathology criteria", false),
    ("cerad", "CERAD", false),
    ("braak_stage", "Braak stage", false),
    ("khachaturian", "Khachaturian", false),
    ("abc", "ABC score", false),
    ("autopsy_type", "Autopsy type", true),
    ("tissue_type", "Tissue type", true),
];

pub fn render_add_record_page() -> String {
    let inputs = RECORD_TEXT_FIELDS
        .iter()
        .map(|(name, label, required)| {
            let required = if *required { " required" } else { "" };
            format!(
                r#"                <div><label for="{name}">{label}</label><input id="{name}" name="{name}"{required}></div>"#
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let body = format!(
        r#"        <section class="panel">
            <h2>Add a tissue record</h2>
            <form method="post" action="/insert_single_row_data">
            <div class="grid">
{inputs}
                <div><label for="brain_weight">Brain weight (g)</label><input id="brain_weight" name="brain_weight" type="number" step="any" required></div>
                <div>
                    <label for="storage_method">Storage method</label>
                    <select id="storage_method" name="storage_method" required>
                        <option value="Formalin-Fixed">Formalin-Fixed</option>
                        <option value="Fresh Frozen">Fresh Frozen</option>
                        <option value="Both">Both</option>
                    </select>
                </div>
            </div>
                <button type="submit">Submit record</button>
            </form>
        </section>"#
    );

    render_page("Add Tissue Record", logout_button(), &body)
}

/// Client half of the revert flow: the endpoint answers the literal
/// `approved` on success and anything else on failure.
pub const REVERT_REQUEST_SCRIPT: &str = r#"(function () {
  function revertTissueRequest(requestId) {
    fetch('/revert_archive_tissue_requests/', {
      method: 'POST',
      credentials: 'same-origin',
      headers: { 'Content-Type': 'application/json' },
      body: JSON.stringify({ requests_ids: [requestId] })
    })
      .then(function (response) { return response.text(); })
      .then(function (body) {
        if (body === 'approved') {
          alert('Your selected request is reverted.');
          window.location.href = '/get_archive_tissue_requests';
        } else {
          alert('Something went wrong, Please try again.');
        }
      })
      .catch(function () {
        alert('Something went wrong, Please try again.');
      });
  }

  document.querySelectorAll('[data-revert-request-id]').forEach(function (button) {
    button.addEventListener('click', function () {
      revertTissueRequest(Number(button.getAttribute('data-revert-request-id')));
    });
  });
})();
"#;

pub fn render_footer() -> String {
    let current_year = Utc::now().year();
    format!(
        r#"<footer class="app-footer">© 2019-{year} Maritime Brain Tissue Bank, internal use only</footer>"#,
        year = current_year
    )
}

pub fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_page_escapes_api_text() {
        let html = render_message_page("Error", "<script>alert(1)</script>");
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>alert(1)"));
        assert!(html.contains(r#"class="flash error""#));
    }

    #[test]
    fn login_pages_post_to_their_own_endpoint() {
        let user = render_login_page(LoginKind::User, Some("bad"));
        assert!(user.contains(r#"action="/login""#));
        assert!(user.contains(r#"name="user_email""#));
        assert!(user.contains("bad"));

        let admin = render_login_page(LoginKind::Admin, None);
        assert!(admin.contains(r#"action="/admin_login""#));
        assert!(!admin.contains("flash error"));
    }

    #[test]
    fn record_form_offers_every_storage_method() {
        let html = render_add_record_page();
        for method in ["Formalin-Fixed", "Fresh Frozen", "Both"] {
            assert!(html.contains(&format!(r#"value="{method}""#)));
        }
        assert!(html.contains(r#"name="neuoropathology_criteria""#));
    }

    #[test]
    fn admin_home_links_only_to_portal_pages() {
        let html = render_admin_home();
        assert!(html.contains(r#"href="/add_new_data""#));
        assert!(!html.contains("get_archive_tissue_requests"));
    }
}
