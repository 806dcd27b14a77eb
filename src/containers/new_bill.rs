use serde::Deserialize;
use tracing::{error, info, warn};

use crate::{
    format::parse_int,
    model::{Bill, BillStatus, DEFAULT_PCT},
    routes::Route,
    session::{SessionStore, session_jwt, session_user},
    store::{BillUpdate, BillUpload, CreateHeaders, RemoteStore, StoreError},
};

pub const ALLOWED_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Upload state kept between the file selection and the form submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewBillDraft {
    pub file_url: Option<String>,
    pub file_name: Option<String>,
    pub bill_id: Option<String>,
}

/// File picked in the new-bill form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Outcome of a file selection. Only `Rejected` shows the error and clears the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileChange {
    NoFile,
    Rejected { extension: String },
    Uploaded {
        file_url: Option<String>,
        bill_id: Option<String>,
    },
    UploadFailed,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewBillForm {
    #[serde(rename = "type", default)]
    pub expense_type: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub amount: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub vat: String,
    #[serde(default)]
    pub pct: String,
    #[serde(default)]
    pub commentary: String,
}

/// Text after the last dot, lowercased. A name without a dot is its own extension.
pub fn file_extension(file_name: &str) -> String {
    file_name
        .rsplit('.')
        .next()
        .unwrap_or(file_name)
        .to_lowercase()
}

pub fn is_allowed_extension(extension: &str) -> bool {
    ALLOWED_EXTENSIONS.contains(&extension)
}

/// Assemble the record submitted for `email` from the form and the upload draft.
pub fn build_bill(email: &str, form: &NewBillForm, draft: &NewBillDraft) -> Bill {
    Bill {
        id: None,
        email: email.to_string(),
        expense_type: form.expense_type.clone(),
        name: form.name.clone(),
        amount: parse_int(&form.amount),
        date: form.date.clone(),
        vat: form.vat.clone(),
        pct: parse_int(&form.pct)
            .filter(|pct| *pct != 0)
            .unwrap_or(DEFAULT_PCT),
        commentary: form.commentary.clone(),
        file_url: draft.file_url.clone(),
        file_name: draft.file_name.clone(),
        status: BillStatus::Pending,
        comment_admin: None,
    }
}

/// Drives the new-bill form: attachment selection and submission.
pub struct NewBill<'a, S: SessionStore + ?Sized> {
    store: &'a dyn RemoteStore,
    session: &'a S,
    draft: &'a mut NewBillDraft,
}

impl<'a, S: SessionStore + ?Sized> NewBill<'a, S> {
    pub fn new(store: &'a dyn RemoteStore, session: &'a S, draft: &'a mut NewBillDraft) -> Self {
        Self {
            store,
            session,
            draft,
        }
    }

    pub async fn handle_change_file(&mut self, file: Option<SelectedFile>) -> FileChange {
        let Some(file) = file else {
            return FileChange::NoFile;
        };

        let extension = file_extension(&file.name);
        if !is_allowed_extension(&extension) {
            info!(file = %file.name, %extension, "rejected attachment type");
            return FileChange::Rejected { extension };
        }

        let Some(user) = session_user(self.session) else {
            error!(file = %file.name, "attachment selected without a session user");
            return FileChange::UploadFailed;
        };

        let upload = BillUpload {
            file_name: file.name.clone(),
            content_type: file.content_type,
            bytes: file.bytes,
            email: user.email,
        };
        let headers = CreateHeaders {
            no_content_type: true,
        };
        let jwt = session_jwt(self.session);

        match self
            .store
            .create_bill(jwt.as_deref(), upload, headers)
            .await
        {
            Ok(stored) => {
                self.draft.bill_id = stored.key.clone();
                self.draft.file_url = stored.file_url.clone();
                self.draft.file_name = Some(file.name);
                FileChange::Uploaded {
                    file_url: stored.file_url,
                    bill_id: stored.key,
                }
            }
            Err(err) => {
                error!(?err, file = %file.name, "attachment upload failed");
                FileChange::UploadFailed
            }
        }
    }

    /// Returns the route to follow, or `None` to stay on the form.
    pub async fn handle_submit(&mut self, form: NewBillForm) -> Option<Route> {
        let Some(user) = session_user(self.session) else {
            error!("bill submitted without a session user");
            return None;
        };

        let bill = build_bill(&user.email, &form, self.draft);
        match self.update_bill(&bill).await {
            Ok(_) => {
                info!(bill_id = ?self.draft.bill_id, "bill submitted");
                *self.draft = NewBillDraft::default();
                Some(Route::Bills)
            }
            Err(err) => {
                error!(?err, bill_id = ?self.draft.bill_id, "bill submission failed");
                None
            }
        }
    }

    pub async fn update_bill(&self, bill: &Bill) -> Result<Bill, StoreError> {
        if self.draft.bill_id.is_none() {
            warn!("submitting a bill without an uploaded attachment");
        }
        let update = BillUpdate {
            data: bill.clone(),
            selector: self.draft.bill_id.clone(),
        };
        let jwt = session_jwt(self.session);
        self.store.update_bill(jwt.as_deref(), &update).await
    }
}
