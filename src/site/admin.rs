//! The admin panel shell.
//!
//! Server-rendered pages that require a session; data is loaded from the REST API
//! by a small inline script. Requests without a valid session are redirected to
//! `/admin/login` rather than answered with 401.

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
};
use maud::{DOCTYPE, Markup, PreEscaped, html};

use crate::{
    AppState,
    auth::{self, AuthUser},
    error::AppResult,
};

/// Admin sections: URL segment under `/admin`, menu label and backing API list.
const SECTIONS: &[(&str, &str, &str)] = &[
    ("pages", "Pages", "/api/pages"),
    ("sections", "Homepage", "/api/sections"),
    ("categories", "Categories", "/api/categories"),
    ("products", "Products", "/api/products"),
    ("news", "News", "/api/news"),
    ("navigation", "Navigation", "/api/navigation"),
    ("media", "Media", "/api/media"),
    ("faq", "FAQ", "/api/faq"),
    ("contact", "Inbox", "/api/contact-submissions"),
    ("users", "Users", "/api/users"),
    ("settings", "Settings", "/api/settings/site"),
];

const LOGIN_SCRIPT: &str = r#"
document.getElementById('login-form').addEventListener('submit', async (event) => {
  event.preventDefault();
  const data = Object.fromEntries(new FormData(event.target).entries());
  const res = await fetch('/api/auth/login', {method: 'POST', headers: {'Content-Type': 'application/json'}, body: JSON.stringify(data)});
  if (res.ok) { window.location.href = '/admin'; }
  else { const err = await res.json(); document.getElementById('login-error').textContent = err.error; }
});
"#;

const SECTION_SCRIPT: &str = r#"
(async () => {
  const root = document.getElementById('section');
  const res = await fetch(root.dataset.api, {credentials: 'same-origin'});
  if (res.status === 401) { window.location.href = '/admin/login'; return; }
  const data = await res.json();
  if (!res.ok) { root.textContent = data.error; return; }
  const rows = Array.isArray(data) ? data : [data];
  if (rows.length === 0) { root.textContent = 'Nothing here yet.'; return; }
  const keys = Object.keys(rows[0]).filter(k => typeof rows[0][k] !== 'object' || rows[0][k] === null);
  const table = document.createElement('table');
  const head = table.insertRow();
  keys.forEach(k => { const th = document.createElement('th'); th.textContent = k; head.appendChild(th); });
  rows.forEach(row => { const tr = table.insertRow(); keys.forEach(k => { tr.insertCell().textContent = row[k] ?? ''; }); });
  root.appendChild(table);
})();
document.getElementById('logout').addEventListener('click', async () => {
  await fetch('/api/auth/logout', {method: 'POST'});
  window.location.href = '/admin/login';
});
"#;

fn document(title: &str, body: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="robots" content="noindex";
                title { (title) " | Admin" }
            }
            body.admin { (body) }
        }
    }
}

fn shell(user: &AuthUser, active: &str, content: Markup) -> Markup {
    let title = SECTIONS
        .iter()
        .find(|(segment, _, _)| *segment == active)
        .map_or("Dashboard", |(_, label, _)| *label);

    document(
        title,
        html! {
            header {
                a href="/admin" { "Dashboard" }
                " "
                span { (user.name) " (" (format!("{:?}", user.role)) ")" }
                " "
                button id="logout" { "Log out" }
            }
            nav {
                ul {
                    @for (segment, label, _) in SECTIONS.iter().filter(|(segment, _, _)| *segment != "users" || user.is_admin()) {
                        li {
                            @if *segment == active {
                                a href={ "/admin/" (segment) } aria-current="page" { (label) }
                            } @else {
                                a href={ "/admin/" (segment) } { (label) }
                            }
                        }
                    }
                }
            }
            main {
                h1 { (title) }
                (content)
            }
            script { (PreEscaped(SECTION_SCRIPT)) }
        },
    )
}

/// GET /admin/login
pub async fn login_page(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if auth::authenticate(&headers, &state.repo, &state.config).await.is_ok() {
        return Redirect::to("/admin").into_response();
    }
    let body = html! {
        main.login {
            h1 { "Sign in" }
            form id="login-form" {
                label { "Email " input name="email" type="email" autocomplete="username" required; }
                label { "Password " input name="password" type="password" autocomplete="current-password" required; }
                button type="submit" { "Sign in" }
            }
            p id="login-error" role="alert" {}
        }
        script { (PreEscaped(LOGIN_SCRIPT)) }
    };
    document("Sign in", body).into_response()
}

/// GET /admin
pub async fn dashboard(State(state): State<AppState>, headers: HeaderMap) -> AppResult<Response> {
    let Ok(user) = auth::authenticate(&headers, &state.repo, &state.config).await else {
        return Ok(Redirect::to("/admin/login").into_response());
    };

    let stats = state.repo.get_stats().await?;
    let cards = [
        ("Pages", stats.pages, "pages"),
        ("Products", stats.products, "products"),
        ("Categories", stats.categories, "categories"),
        ("News", stats.news, "news"),
        ("Media", stats.media, "media"),
        ("FAQ", stats.faqs, "faq"),
        ("Users", stats.users, "users"),
        ("Unread messages", stats.unread_contacts, "contact"),
    ];

    let content = html! {
        div.stats {
            @for (label, count, segment) in &cards {
                a.stat href={ "/admin/" (segment) } {
                    strong { (count) }
                    " " (label)
                }
            }
        }
        div id="section" data-api="/api/auth/me" {}
    };
    Ok(shell(&user, "", content).into_response())
}

/// GET /admin/{*path}
///
/// The first path segment selects the section; deeper paths (`/admin/pages/new`)
/// land on the same section view.
pub async fn section(State(state): State<AppState>, headers: HeaderMap, Path(path): Path<String>) -> Response {
    let Ok(user) = auth::authenticate(&headers, &state.repo, &state.config).await else {
        return Redirect::to("/admin/login").into_response();
    };

    let segment = path.split('/').next().unwrap_or_default();
    let Some((segment, _, api)) = SECTIONS.iter().find(|(s, _, _)| *s == segment) else {
        return Redirect::to("/admin").into_response();
    };
    if *segment == "users" && !user.is_admin() {
        return Redirect::to("/admin").into_response();
    }

    let content = html! { div id="section" data-api=(api) {} };
    shell(&user, segment, content).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserRole;

    fn user(role: UserRole) -> AuthUser {
        AuthUser {
            id: uuid::Uuid::nil(),
            session_id: uuid::Uuid::nil(),
            role,
            email: "ed@example.com".into(),
            name: "Ed <Editor>".into(),
        }
    }

    #[test]
    fn editors_do_not_see_user_management() {
        let html = shell(&user(UserRole::Editor), "pages", html! {}).into_string();
        assert!(!html.contains("/admin/users"));
        assert!(html.contains("<a href=\"/admin/pages\" aria-current=\"page\">Pages</a>"));
        assert!(html.contains("Ed &lt;Editor&gt;"));

        let html = shell(&user(UserRole::Admin), "", html! {}).into_string();
        assert!(html.contains("/admin/users"));
    }
}
