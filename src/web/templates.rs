use std::borrow::Cow;

use chrono::{Datelike, Utc};

use crate::routes::Route;

const PAGE_BASE_STYLES: &str = r#"
        :root { color-scheme: light; }
        body { font-family: "Helvetica Neue", Arial, sans-serif; margin: 0; background: #f8fafc; color: #0f172a; display: flex; min-height: 100vh; }
        .vertical-navbar { width: 5rem; background: #0e5ae5; display: flex; flex-direction: column; align-items: center; gap: 1.5rem; padding-top: 2rem; }
        .vertical-navbar a { color: #ffffff; opacity: 0.6; text-decoration: none; font-size: 1.4rem; }
        .vertical-navbar a.active-icon { opacity: 1; }
        .vertical-navbar form { margin-top: auto; margin-bottom: 2rem; }
        .vertical-navbar button { background: transparent; border: 1px solid #ffffff; color: #ffffff; padding: 0.35rem 0.6rem; border-radius: 6px; cursor: pointer; }
        .content { flex: 1; padding: 2rem 2.5rem; box-sizing: border-box; }
        .content-header { display: flex; justify-content: space-between; align-items: center; flex-wrap: wrap; gap: 1rem; }
        .content-title { margin: 0; font-size: 1.6rem; }
        .user-badge { color: #475569; font-size: 0.9rem; }
        .panel { background: #ffffff; border-radius: 12px; border: 1px solid #e2e8f0; padding: 1.5rem; box-shadow: 0 18px 40px rgba(15, 23, 42, 0.08); margin-top: 1.5rem; }
        label { display: block; margin-bottom: 0.4rem; font-weight: 600; color: #0f172a; }
        input, select, textarea { width: 100%; padding: 0.65rem; border-radius: 8px; border: 1px solid #cbd5f5; background: #f8fafc; color: #0f172a; box-sizing: border-box; margin-bottom: 1rem; }
        button.btn-primary { padding: 0.75rem 1.2rem; border: none; border-radius: 8px; background: #0e5ae5; color: #ffffff; font-weight: 600; cursor: pointer; }
        button.btn-primary:hover { background: #1d4ed8; }
        table { width: 100%; border-collapse: collapse; margin-top: 1.5rem; background: #ffffff; border: 1px solid #e2e8f0; }
        th, td { padding: 0.75rem 1rem; border-bottom: 1px solid #e2e8f0; text-align: left; }
        th { background: #f1f5f9; font-weight: 600; }
        .status-tag { display: inline-flex; padding: 0.2rem 0.7rem; border-radius: 999px; font-size: 0.85rem; font-weight: 600; }
        .status-tag.pending { background: #fef3c7; color: #92400e; }
        .status-tag.accepted { background: #dcfce7; color: #166534; }
        .status-tag.refused { background: #fee2e2; color: #b91c1c; }
        .error-message { color: #b91c1c; font-weight: 600; margin: -0.5rem 0 1rem; }
        .hidden { display: none; }
        .flash { padding: 0.75rem 1rem; border-radius: 8px; margin-top: 1rem; }
        .flash.success { background: #dcfce7; color: #166534; }
        .flash.error { background: #fee2e2; color: #b91c1c; }
        .modal { position: fixed; inset: 0; background: rgba(15, 23, 42, 0.6); display: flex; align-items: center; justify-content: center; }
        .modal-body { background: #ffffff; border-radius: 12px; padding: 1.5rem; max-width: 80vw; max-height: 80vh; overflow: auto; }
        .modal-body img { max-width: 100%; }
        .app-footer { margin-top: 3rem; text-align: center; font-size: 0.85rem; color: #94a3b8; }
"#;

pub struct PageLayout<'a> {
    pub meta_title: &'a str,
    pub page_heading: &'a str,
    pub user_email: &'a str,
    pub active: Route,
    pub body_html: Cow<'a, str>,
    pub body_scripts: Vec<Cow<'a, str>>,
}

pub fn render_page(layout: PageLayout<'_>) -> String {
    let PageLayout {
        meta_title,
        page_heading,
        user_email,
        active,
        body_html,
        body_scripts,
    } = layout;

    let nav_links = [
        (Route::Bills, "icon-window", "&#128196;"),
        (Route::NewBill, "icon-mail", "&#9993;"),
        (Route::Dashboard, "icon-dashboard", "&#128202;"),
    ]
    .into_iter()
    .filter(|(route, _, _)| match active {
        Route::Dashboard => *route == Route::Dashboard,
        _ => *route != Route::Dashboard,
    })
    .map(|(route, testid, glyph)| {
        let class = if route == active { " class=\"active-icon\"" } else { "" };
        format!(
            r#"<a href="{href}" data-route="{route}" data-testid="{testid}"{class}>{glyph}</a>"#,
            href = route.href(),
            route = route.path(),
        )
    })
    .collect::<Vec<_>>()
    .join("\n            ");

    let scripts = body_scripts
        .into_iter()
        .map(|script| script.into_owned())
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"<!DOCTYPE html>
<html lang="fr">
<head>
    <meta charset="UTF-8">
    <title>{meta_title}</title>
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <meta name="robots" content="noindex,nofollow">
    <style>
{styles}
    </style>
</head>
<body>
    <nav class="vertical-navbar">
            {nav_links}
        <form method="post" action="/logout">
            <button type="submit" data-testid="layout-disconnect">Quitter</button>
        </form>
    </nav>
    <main class="content">
        <div class="content-header">
            <h1 class="content-title">{page_heading}</h1>
            <span class="user-badge">{user_email}</span>
        </div>
{body_html}
        {footer}
    </main>
{scripts}
</body>
</html>"#,
        meta_title = escape_html(meta_title),
        page_heading = escape_html(page_heading),
        user_email = escape_html(user_email),
        styles = PAGE_BASE_STYLES,
        footer = render_footer(),
    )
}

pub fn render_login_page() -> String {
    let footer = render_footer();
    format!(
        r#"<!DOCTYPE html>
<html lang="fr">
<head>
    <meta charset="UTF-8">
    <title>Billed</title>
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <meta name="robots" content="noindex,nofollow">
    <style>
        :root {{ color-scheme: light; }}
        body {{ font-family: "Helvetica Neue", Arial, sans-serif; display: flex; flex-direction: column; align-items: center; justify-content: center; min-height: 100vh; margin: 0; background: #f1f5f9; color: #0f172a; padding: 1.5rem; box-sizing: border-box; gap: 1.5rem; }}
        main {{ width: 100%; max-width: 880px; display: flex; flex-wrap: wrap; justify-content: center; gap: 1.5rem; }}
        .panel {{ background: #ffffff; padding: 2.25rem 2rem; border-radius: 18px; box-shadow: 0 20px 60px rgba(15, 23, 42, 0.08); flex: 1 1 320px; border: 1px solid #e2e8f0; box-sizing: border-box; }}
        h1 {{ margin: 0; font-size: 2rem; text-align: center; width: 100%; }}
        h2 {{ margin: 0 0 1rem; font-size: 1.3rem; text-align: center; }}
        label {{ display: block; margin-top: 1.2rem; font-weight: 600; color: #0f172a; }}
        input {{ width: 100%; padding: 0.85rem; margin-top: 0.65rem; border-radius: 10px; border: 1px solid #cbd5f5; background: #f8fafc; color: #0f172a; font-size: 1rem; box-sizing: border-box; }}
        input:focus {{ outline: none; border-color: #0e5ae5; box-shadow: 0 0 0 3px rgba(37, 99, 235, 0.15); }}
        button {{ margin-top: 2rem; width: 100%; padding: 0.95rem; border: none; border-radius: 10px; background: #0e5ae5; color: #ffffff; font-weight: 600; font-size: 1.05rem; cursor: pointer; }}
        button:hover {{ background: #1d4ed8; }}
        .app-footer {{ margin-top: 2.5rem; text-align: center; font-size: 0.85rem; color: #64748b; }}
    </style>
</head>
<body>
    <h1>Billed</h1>
    <main>
        <section class="panel">
            <h2>Employé</h2>
            <form method="post" action="/login/employee" data-testid="form-employee">
                <label for="employee-email">Votre email</label>
                <input id="employee-email" type="email" name="email" data-testid="employee-email-input" placeholder="johndoe@email.com" required>
                <label for="employee-password">Mot de passe</label>
                <input id="employee-password" type="password" name="password" data-testid="employee-password-input" placeholder="******" required>
                <button type="submit" data-testid="employee-login-button">Se connecter</button>
            </form>
        </section>
        <section class="panel">
            <h2>Administration</h2>
            <form method="post" action="/login/admin" data-testid="form-admin">
                <label for="admin-email">Votre email</label>
                <input id="admin-email" type="email" name="email" data-testid="admin-email-input" placeholder="johndoe@email.com" required>
                <label for="admin-password">Mot de passe</label>
                <input id="admin-password" type="password" name="password" data-testid="admin-password-input" placeholder="******" required>
                <button type="submit" data-testid="admin-login-button">Se connecter</button>
            </form>
        </section>
    </main>
    {footer}
</body>
</html>"#,
        footer = footer,
    )
}

pub fn render_footer() -> String {
    let current_year = Utc::now().year();
    format!(
        r#"<footer class="app-footer">© 2020-{year} Billed</footer>"#,
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
