use std::borrow::Cow;

use axum::{
    Router,
    extract::{Form, Query, State},
    response::{Html, Redirect},
    routing::{get, post},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use tracing::error;

use crate::{
    containers::{BillRow, Dashboard, Decision, StatusGroup},
    model::{BillStatus, UserType},
    routes::Route,
    store::StoreError,
    web::{
        AppState,
        admin_utils::compose_flash_message,
        auth::require_user,
        bills::{sort_rows_by_date_desc, status_class},
        escape_html,
        templates::{PageLayout, render_page},
    },
};

const DECISION_PATH: &str = "/admin/dashboard/bills/decision";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/dashboard", get(dashboard_page))
        .route(DECISION_PATH, post(submit_decision))
}

#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    pub status: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DecisionForm {
    #[serde(default)]
    pub bill_id: String,
    pub decision: Decision,
    #[serde(default)]
    pub comment: Option<String>,
}

pub async fn dashboard_page(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<DashboardQuery>,
) -> Result<Html<String>, Redirect> {
    let session = require_user(&state, &jar, UserType::Admin).await?;
    let dashboard = Dashboard::new(state.store(), session.jwt.as_deref());

    let flash = compose_flash_message(query.status.as_deref(), query.error.as_deref());
    let groups = match dashboard.get_bills_by_status().await {
        Ok(mut groups) => {
            for group in &mut groups {
                sort_rows_by_date_desc(&mut group.rows);
            }
            groups
                .iter()
                .map(render_group)
                .collect::<Vec<_>>()
                .join("\n")
        }
        Err(err) => {
            error!(?err, "failed to load dashboard bills");
            r#"        <div class="panel" data-testid="error-message">
            <p>Impossible de charger les notes de frais.</p>
        </div>"#
                .to_string()
        }
    };

    Ok(Html(render_page(PageLayout {
        meta_title: "Billed - Validations",
        page_heading: "Validations",
        user_email: &session.user.email,
        active: Route::Dashboard,
        body_html: Cow::Owned(format!("        {flash}\n{groups}")),
        body_scripts: Vec::new(),
    })))
}

pub async fn submit_decision(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<DecisionForm>,
) -> Redirect {
    let session = match require_user(&state, &jar, UserType::Admin).await {
        Ok(session) => session,
        Err(redirect) => return redirect,
    };

    let bill_id = form.bill_id.trim();
    if bill_id.is_empty() {
        return flash_redirect("error", "missing_bill");
    }

    let dashboard = Dashboard::new(state.store(), session.jwt.as_deref());
    let comment = form.comment.as_deref();
    let result = match form.decision {
        Decision::Accept => dashboard.handle_accept_submit(bill_id, comment).await,
        Decision::Refuse => dashboard.handle_refuse_submit(bill_id, comment).await,
    };

    match result {
        Ok(bill) => flash_redirect("status", bill.status.as_str()),
        Err(StoreError::NotFound(_)) => flash_redirect("error", "not_found"),
        Err(StoreError::Unauthorized) => flash_redirect("error", "unauthorized"),
        Err(err) => {
            error!(?err, %bill_id, "bill decision failed");
            flash_redirect("error", "update_failed")
        }
    }
}

fn flash_redirect(key: &str, code: &str) -> Redirect {
    Redirect::to(&format!("{}?{key}={code}", Route::Dashboard.href()))
}

fn render_group(group: &StatusGroup) -> String {
    let rows = if group.rows.is_empty() {
        r#"<tr><td colspan="6">Aucune note de frais.</td></tr>"#.to_string()
    } else {
        group
            .rows
            .iter()
            .map(|row| render_row(row, group.status == BillStatus::Pending))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        r#"        <section class="panel" data-testid="status-group">
            <h2>{label} ({count})</h2>
            <table>
                <thead>
                    <tr><th>Employé</th><th>Nom</th><th>Date</th><th>Montant</th><th>Statut</th><th>Décision</th></tr>
                </thead>
                <tbody>
{rows}
                </tbody>
            </table>
        </section>"#,
        label = escape_html(group.label()),
        count = group.rows.len(),
    )
}

fn render_row(row: &BillRow, reviewable: bool) -> String {
    let id = row.bill.id.as_deref().unwrap_or_default();
    let decision = if reviewable && !id.is_empty() {
        format!(
            r#"<form method="post" action="{DECISION_PATH}">
                            <input type="hidden" name="bill_id" value="{id}">
                            <textarea name="comment" data-testid="commentary2" rows="2" placeholder="Commentaire"></textarea>
                            <button type="submit" name="decision" value="accept" class="btn-primary" data-testid="btn-accept-bill">Accepter</button>
                            <button type="submit" name="decision" value="refuse" class="btn-primary" data-testid="btn-refuse-bill">Refuser</button>
                        </form>"#,
            id = escape_html(id),
        )
    } else {
        row.bill
            .comment_admin
            .as_deref()
            .map(escape_html)
            .unwrap_or_default()
    };
    let amount = row
        .bill
        .amount
        .map(|amount| format!("{amount} €"))
        .unwrap_or_default();

    format!(
        r#"                    <tr data-testid="dashboard-row">
                        <td>{email}</td>
                        <td>{name}</td>
                        <td>{date}</td>
                        <td>{amount}</td>
                        <td><span class="status-tag {status_class}">{status}</span></td>
                        <td>{decision}</td>
                    </tr>"#,
        email = escape_html(&row.bill.email),
        name = escape_html(&row.bill.name),
        date = escape_html(&row.date),
        status_class = status_class(&row.bill.status),
        status = escape_html(&row.status),
    )
}
