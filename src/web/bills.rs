use std::{borrow::Cow, cmp::Reverse};

use axum::{
    Router,
    extract::State,
    response::{Html, Redirect},
    routing::get,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::error;

use crate::{
    containers::{BillRow, Bills},
    format::parse_bill_date,
    model::{BillStatus, UserType},
    routes::Route,
    web::{
        AppState,
        auth::require_user,
        escape_html,
        templates::{PageLayout, render_page},
    },
};

const PREVIEW_SCRIPT: &str = r#"<script>
(() => {
    const modal = document.getElementById('modaleFile');
    const image = modal.querySelector('img');
    const caption = modal.querySelector('figcaption');
    document.querySelectorAll('[data-testid="icon-eye"]').forEach((icon) => {
        icon.addEventListener('click', () => {
            image.src = icon.dataset.billUrl;
            image.alt = icon.dataset.fileName;
            caption.textContent = icon.dataset.fileName;
            modal.classList.remove('hidden');
        });
    });
    modal.addEventListener('click', (event) => {
        if (event.target === modal) {
            modal.classList.add('hidden');
        }
    });
})();
</script>"#;

pub fn router() -> Router<AppState> {
    Router::new().route("/employee/bills", get(bills_page))
}

/// Newest first. Rows whose date does not parse go last, in arrival order.
pub fn sort_rows_by_date_desc(rows: &mut [BillRow]) {
    rows.sort_by_key(|row| Reverse(parse_bill_date(row.raw_date())));
}

pub async fn bills_page(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Html<String>, Redirect> {
    let session = require_user(&state, &jar, UserType::Employee).await?;
    let bills = Bills::new(state.store(), session.jwt.as_deref());

    let body = match bills.get_bills().await {
        Ok(mut rows) => {
            sort_rows_by_date_desc(&mut rows);
            render_bills_body(&bills, &rows)
        }
        Err(err) => {
            error!(?err, email = %session.user.email, "failed to load bills");
            render_error_body()
        }
    };

    Ok(Html(render_page(PageLayout {
        meta_title: "Billed - Mes notes de frais",
        page_heading: "Mes notes de frais",
        user_email: &session.user.email,
        active: Route::Bills,
        body_html: Cow::Owned(body),
        body_scripts: vec![Cow::Borrowed(PREVIEW_SCRIPT)],
    })))
}

fn render_bills_body(bills: &Bills<'_>, rows: &[BillRow]) -> String {
    let table_rows = if rows.is_empty() {
        r#"<tr><td colspan="6">Aucune note de frais pour le moment.</td></tr>"#.to_string()
    } else {
        rows.iter()
            .map(|row| render_row(bills, row))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        r#"        <div class="content-header">
            <span></span>
            <a href="{new_bill}"><button type="button" class="btn-primary" data-testid="btn-new-bill">Nouvelle note de frais</button></a>
        </div>
        <table>
            <thead>
                <tr><th>Type</th><th>Nom</th><th>Date</th><th>Montant</th><th>Statut</th><th>Actions</th></tr>
            </thead>
            <tbody data-testid="tbody">
{table_rows}
            </tbody>
        </table>
        <div id="modaleFile" class="modal hidden" data-testid="modaleFile">
            <figure class="modal-body">
                <img src="" alt="">
                <figcaption></figcaption>
            </figure>
        </div>"#,
        new_bill = bills.handle_click_new_bill().href(),
    )
}

fn render_row(bills: &Bills<'_>, row: &BillRow) -> String {
    let eye = match bills.handle_click_icon_eye(row) {
        Some(preview) => format!(
            r#"<span data-testid="icon-eye" data-bill-url="{url}" data-file-name="{name}" role="button" title="Voir le justificatif">&#128065;</span>"#,
            url = escape_html(&preview.url),
            name = escape_html(&preview.file_name),
        ),
        None => String::new(),
    };
    let amount = row
        .bill
        .amount
        .map(|amount| format!("{amount} €"))
        .unwrap_or_default();

    format!(
        r#"                <tr data-testid="bill-row">
                    <td>{expense_type}</td>
                    <td>{name}</td>
                    <td>{date}</td>
                    <td>{amount}</td>
                    <td><span class="status-tag {status_class}">{status}</span></td>
                    <td>{eye}</td>
                </tr>"#,
        expense_type = escape_html(&row.bill.expense_type),
        name = escape_html(&row.bill.name),
        date = escape_html(&row.date),
        status_class = status_class(&row.bill.status),
        status = escape_html(&row.status),
    )
}

pub fn status_class(status: &BillStatus) -> &'static str {
    match status {
        BillStatus::Pending => "pending",
        BillStatus::Accepted => "accepted",
        BillStatus::Refused => "refused",
        BillStatus::Other(_) => "",
    }
}

fn render_error_body() -> String {
    r#"        <div class="panel" data-testid="error-message">
            <p>Impossible de charger vos notes de frais pour le moment.</p>
        </div>"#
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        containers::bills::format_bill,
        model::Bill,
        store::fake::FakeStore,
        web::test_support::{employee_jar, location, memory_state},
    };

    fn row(id: &str, date: &str) -> BillRow {
        format_bill(Bill {
            id: Some(id.to_string()),
            date: date.to_string(),
            ..Bill::default()
        })
    }

    fn ids(rows: &[BillRow]) -> Vec<&str> {
        rows.iter()
            .map(|row| row.bill.id.as_deref().unwrap_or_default())
            .collect()
    }

    #[test]
    fn rows_sort_newest_first() {
        let mut rows = vec![
            row("sept", "2023-09-15"),
            row("oct", "2023-10-01"),
            row("jan", "2022-01-03"),
        ];
        sort_rows_by_date_desc(&mut rows);
        assert_eq!(ids(&rows), vec!["oct", "sept", "jan"]);
    }

    #[test]
    fn unparseable_dates_sink_in_arrival_order() {
        let mut rows = vec![
            row("bad-1", "n/a"),
            row("good", "2021-05-05"),
            row("bad-2", ""),
        ];
        sort_rows_by_date_desc(&mut rows);
        assert_eq!(ids(&rows), vec!["good", "bad-1", "bad-2"]);
    }

    #[test]
    fn malformed_date_between_valid_ones_keeps_their_order() {
        let mut rows = vec![
            row("may", "2021-05-05"),
            row("bad", "n/a"),
            row("oct", "2023-10-01"),
        ];
        sort_rows_by_date_desc(&mut rows);
        assert_eq!(ids(&rows), vec!["oct", "may", "bad"]);
    }

    #[test]
    fn rows_render_eye_icon_only_with_attachment() {
        let store = FakeStore::new();
        let bills = Bills::new(&store, None);
        let mut with_file = row("1", "2023-10-01");
        with_file.bill.file_url = Some("/attachments/k/a.png".to_string());
        with_file.bill.file_name = Some("a.png".to_string());
        let without_file = row("2", "2023-10-01");

        let html = render_bills_body(&bills, &[with_file, without_file]);
        assert_eq!(html.matches(r#"data-testid="icon-eye""#).count(), 1);
        assert!(html.contains(r#"data-bill-url="/attachments/k/a.png""#));
        assert!(html.contains(r#"data-testid="btn-new-bill""#));
        assert!(html.contains(r#"href="/employee/bill/new""#));
    }

    #[tokio::test]
    async fn page_lists_the_employee_bills() {
        let dir = tempfile::tempdir().unwrap();
        let state = memory_state(dir.path()).await;
        let jar = employee_jar(&state, "a@a").await;

        let Html(html) = bills_page(State(state), jar).await.unwrap();
        assert!(html.contains("Mes notes de frais"));
        assert!(html.contains("Aucune note de frais"));
    }

    #[tokio::test]
    async fn anonymous_visitor_is_redirected() {
        let dir = tempfile::tempdir().unwrap();
        let state = memory_state(dir.path()).await;
        let redirect = bills_page(State(state), CookieJar::new()).await.unwrap_err();
        assert_eq!(location(redirect), "/");
    }
}
