use tracing::warn;

use crate::{
    format::{format_date, format_status},
    model::Bill,
    routes::Route,
    store::{RemoteStore, StoreError},
};

/// A bill prepared for display. Only `date` and `status` differ from the stored record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillRow {
    pub bill: Bill,
    pub date: String,
    pub status: String,
}

impl BillRow {
    pub fn raw_date(&self) -> &str {
        &self.bill.date
    }
}

/// Attachment shown in the preview modal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentPreview {
    pub url: String,
    pub file_name: String,
}

/// Format one record; a date that does not parse is kept as stored.
pub fn format_bill(bill: Bill) -> BillRow {
    let date = match format_date(&bill.date) {
        Ok(formatted) => formatted,
        Err(err) => {
            warn!(?err, bill_id = ?bill.id, "keeping unformatted bill date");
            bill.date.clone()
        }
    };
    let status = format_status(&bill.status);
    BillRow { bill, date, status }
}

pub struct Bills<'a> {
    store: &'a dyn RemoteStore,
    jwt: Option<&'a str>,
}

impl<'a> Bills<'a> {
    pub fn new(store: &'a dyn RemoteStore, jwt: Option<&'a str>) -> Self {
        Self { store, jwt }
    }

    pub async fn get_bills(&self) -> Result<Vec<BillRow>, StoreError> {
        let bills = self.store.list_bills(self.jwt).await?;
        Ok(bills.into_iter().map(format_bill).collect())
    }

    pub fn handle_click_new_bill(&self) -> Route {
        Route::NewBill
    }

    pub fn handle_click_icon_eye(&self, row: &BillRow) -> Option<AttachmentPreview> {
        let url = row.bill.file_url.clone().filter(|url| !url.is_empty())?;
        Some(AttachmentPreview {
            url,
            file_name: row.bill.file_name.clone().unwrap_or_default(),
        })
    }
}
