use serde::Deserialize;
use tracing::info;

use crate::{
    containers::bills::{BillRow, format_bill},
    model::{Bill, BillStatus},
    store::{BillUpdate, RemoteStore, StoreError},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusGroup {
    pub status: BillStatus,
    pub rows: Vec<BillRow>,
}

impl StatusGroup {
    pub fn label(&self) -> &str {
        self.status.label_fr()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Accept,
    Refuse,
}

impl Decision {
    pub fn status(&self) -> BillStatus {
        match self {
            Decision::Accept => BillStatus::Accepted,
            Decision::Refuse => BillStatus::Refused,
        }
    }
}

/// Group rows by status: pending, accepted, refused, then any other status in arrival order.
pub fn group_by_status(rows: Vec<BillRow>) -> Vec<StatusGroup> {
    let mut groups: Vec<StatusGroup> = [
        BillStatus::Pending,
        BillStatus::Accepted,
        BillStatus::Refused,
    ]
    .into_iter()
    .map(|status| StatusGroup {
        status,
        rows: Vec::new(),
    })
    .collect();

    for row in rows {
        match groups
            .iter_mut()
            .find(|group| group.status == row.bill.status)
        {
            Some(group) => group.rows.push(row),
            None => groups.push(StatusGroup {
                status: row.bill.status.clone(),
                rows: vec![row],
            }),
        }
    }

    groups
}

/// Admin view over every bill, with accept/refuse decisions.
pub struct Dashboard<'a> {
    store: &'a dyn RemoteStore,
    jwt: Option<&'a str>,
}

impl<'a> Dashboard<'a> {
    pub fn new(store: &'a dyn RemoteStore, jwt: Option<&'a str>) -> Self {
        Self { store, jwt }
    }

    pub async fn get_bills_by_status(&self) -> Result<Vec<StatusGroup>, StoreError> {
        let bills = self.store.list_bills(self.jwt).await?;
        Ok(group_by_status(bills.into_iter().map(format_bill).collect()))
    }

    pub async fn handle_accept_submit(
        &self,
        bill_id: &str,
        comment: Option<&str>,
    ) -> Result<Bill, StoreError> {
        self.decide(bill_id, Decision::Accept, comment).await
    }

    pub async fn handle_refuse_submit(
        &self,
        bill_id: &str,
        comment: Option<&str>,
    ) -> Result<Bill, StoreError> {
        self.decide(bill_id, Decision::Refuse, comment).await
    }

    pub async fn decide(
        &self,
        bill_id: &str,
        decision: Decision,
        comment: Option<&str>,
    ) -> Result<Bill, StoreError> {
        let mut bill = self
            .store
            .list_bills(self.jwt)
            .await?
            .into_iter()
            .find(|bill| bill.id.as_deref() == Some(bill_id))
            .ok_or_else(|| StoreError::NotFound(bill_id.to_string()))?;

        bill.status = decision.status();
        bill.comment_admin = comment
            .map(str::trim)
            .filter(|comment| !comment.is_empty())
            .map(str::to_string);

        let update = BillUpdate {
            data: bill,
            selector: Some(bill_id.to_string()),
        };
        let updated = self.store.update_bill(self.jwt, &update).await?;
        info!(%bill_id, status = decision.status().as_str(), "bill reviewed");
        Ok(updated)
    }
}
