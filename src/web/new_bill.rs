use std::borrow::Cow;

use axum::{
    Json, Router,
    extract::{Form, Multipart, State},
    http::StatusCode,
    response::{Html, Redirect},
    routing::{get, post},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::warn;

use crate::{
    containers::{FileChange, NewBill, NewBillForm, new_bill::ALLOWED_EXTENSIONS},
    model::UserType,
    routes::Route,
    web::{
        ApiMessage, AppState,
        auth::{SessionUser, require_user},
        json_error,
        responses::FileUploaded,
        templates::{PageLayout, render_page},
        uploads::{UploadError, read_single_file},
    },
};

const EXPENSE_TYPES: [&str; 7] = [
    "Transports",
    "Restaurants et bars",
    "Hôtel et logement",
    "Services en ligne",
    "IT et électronique",
    "Equipement et matériel",
    "Fournitures de bureau",
];

const FILE_FIELD: &str = "file";

const FILE_CHANGE_SCRIPT: &str = r#"<script>
(() => {
    const input = document.querySelector('input[data-testid="file"]');
    const errorMessage = document.querySelector('.error-message');
    input.addEventListener('change', async () => {
        const file = input.files[0];
        if (!file) {
            return;
        }
        const data = new FormData();
        data.append('file', file);
        const response = await fetch('/employee/bill/new/file', { method: 'POST', body: data });
        if (response.status === 415) {
            input.value = '';
            errorMessage.classList.remove('hidden');
            return;
        }
        errorMessage.classList.add('hidden');
    });
})();
</script>"#;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/employee/bill/new", get(new_bill_page).post(submit_new_bill))
        .route("/employee/bill/new/file", post(change_file))
}

pub async fn new_bill_page(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Html<String>, Redirect> {
    let session = require_user(&state, &jar, UserType::Employee).await?;
    Ok(Html(render_new_bill_page(&session, None)))
}

/// File input change: validate the extension, then create the bill record with the attachment.
pub async fn change_file(
    State(state): State<AppState>,
    jar: CookieJar,
    multipart: Multipart,
) -> Result<Json<FileUploaded>, (StatusCode, Json<ApiMessage>)> {
    let session = require_user(&state, &jar, UserType::Employee)
        .await
        .map_err(|_| json_error(StatusCode::UNAUTHORIZED, "Veuillez vous connecter."))?;

    let file = read_single_file(multipart, FILE_FIELD, state.config().max_upload_bytes)
        .await
        .map_err(|err| {
            warn!(?err, "unreadable attachment upload");
            match err {
                UploadError::TooLarge { .. } => json_error(
                    StatusCode::PAYLOAD_TOO_LARGE,
                    "Le justificatif est trop volumineux.",
                ),
                _ => json_error(StatusCode::BAD_REQUEST, "Formulaire d'envoi invalide."),
            }
        })?;
    let file_name = file.as_ref().map(|file| file.name.clone());

    let mut guard = session.handle.lock().await;
    let context = &mut *guard;
    let outcome = NewBill::new(state.store(), &context.storage, &mut context.draft)
        .handle_change_file(file)
        .await;

    match outcome {
        FileChange::Uploaded { file_url, bill_id } => Ok(Json(FileUploaded {
            file_url,
            file_name: file_name.unwrap_or_default(),
            key: bill_id,
        })),
        FileChange::NoFile => Err(json_error(
            StatusCode::BAD_REQUEST,
            "Aucun fichier sélectionné.",
        )),
        FileChange::Rejected { extension } => Err(json_error(
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            format!("Format .{extension} refusé. {}", rejected_message()),
        )),
        FileChange::UploadFailed => Err(json_error(
            StatusCode::BAD_GATEWAY,
            "L'envoi du justificatif a échoué.",
        )),
    }
}

/// Form submission: on success go to the bill list, otherwise stay on the form.
pub async fn submit_new_bill(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<NewBillForm>,
) -> Result<Redirect, (StatusCode, Html<String>)> {
    let session = match require_user(&state, &jar, UserType::Employee).await {
        Ok(session) => session,
        Err(redirect) => return Ok(redirect),
    };

    let route = {
        let mut guard = session.handle.lock().await;
        let context = &mut *guard;
        NewBill::new(state.store(), &context.storage, &mut context.draft)
            .handle_submit(form)
            .await
    };

    match route {
        Some(route) => Ok(Redirect::to(route.href())),
        None => Err((
            StatusCode::BAD_GATEWAY,
            Html(render_new_bill_page(
                &session,
                Some("L'envoi de la note de frais a échoué, veuillez réessayer."),
            )),
        )),
    }
}

fn rejected_message() -> String {
    format!(
        "Seuls les fichiers {} sont acceptés.",
        ALLOWED_EXTENSIONS.join(", ")
    )
}

fn render_new_bill_page(session: &SessionUser, failure: Option<&str>) -> String {
    let options = EXPENSE_TYPES
        .iter()
        .map(|expense_type| format!(r#"<option>{expense_type}</option>"#))
        .collect::<Vec<_>>()
        .join("");
    let flash = failure
        .map(|message| format!(r#"<div class="flash error">{message}</div>"#))
        .unwrap_or_default();

    let body = format!(
        r#"{flash}
        <form class="panel" method="post" action="{action}" data-testid="form-new-bill">
            <label for="expense-type">Type de dépense</label>
            <select id="expense-type" name="type" data-testid="expense-type" required>{options}</select>
            <label for="expense-name">Nom de la dépense</label>
            <input id="expense-name" type="text" name="name" data-testid="expense-name" placeholder="Vol Paris Londres">
            <label for="datepicker">Date</label>
            <input id="datepicker" type="date" name="date" data-testid="datepicker" required>
            <label for="amount">Montant TTC</label>
            <input id="amount" type="number" name="amount" data-testid="amount" placeholder="348" required>
            <label for="vat">TVA</label>
            <input id="vat" type="number" name="vat" data-testid="vat" placeholder="70">
            <input type="number" name="pct" data-testid="pct" placeholder="20" required>
            <label for="commentary">Commentaire</label>
            <textarea id="commentary" name="commentary" data-testid="commentary" rows="3"></textarea>
            <label for="file">Justificatif</label>
            <input id="file" type="file" name="file" data-testid="file" accept=".jpg,.jpeg,.png" required>
            <p class="error-message hidden">{rejected}</p>
            <button type="submit" id="btn-send-bill" class="btn-primary">Envoyer</button>
        </form>"#,
        action = Route::NewBill.href(),
        rejected = rejected_message(),
    );

    render_page(PageLayout {
        meta_title: "Billed - Nouvelle note de frais",
        page_heading: "Envoyer une note de frais",
        user_email: &session.user.email,
        active: Route::NewBill,
        body_html: Cow::Owned(body),
        body_scripts: vec![Cow::Borrowed(FILE_CHANGE_SCRIPT)],
    })
}
