use std::borrow::Cow;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub const USER_STATUS_CONNECTED: &str = "connected";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserType {
    Employee,
    Admin,
}

impl UserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::Employee => "Employee",
            UserType::Admin => "Admin",
        }
    }
}

/// Session record stored under the `user` key.
///
/// Field order matters: the serialized form is compared byte-for-byte by
/// consumers of the session store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "type")]
    pub user_type: UserType,
    pub email: String,
    pub password: String,
    pub status: String,
}

impl User {
    pub fn connected(
        user_type: UserType,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            user_type,
            email: email.into(),
            password: password.into(),
            status: USER_STATUS_CONNECTED.to_string(),
        }
    }

    pub fn credentials(&self) -> Credentials {
        Credentials {
            email: self.email.clone(),
            password: self.password.clone(),
        }
    }

    /// Account payload sent when the remote login fails and a registration is attempted.
    pub fn registration(&self) -> NewUser {
        let name = self
            .email
            .split('@')
            .next()
            .unwrap_or_default()
            .to_string();
        NewUser {
            user_type: self.user_type,
            name,
            email: self.email.clone(),
            password: self.password.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    #[serde(rename = "type")]
    pub user_type: UserType,
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BillStatus {
    Pending,
    Accepted,
    Refused,
    Other(Cow<'static, str>),
}

impl BillStatus {
    pub fn as_str(&self) -> &str {
        match self {
            BillStatus::Pending => "pending",
            BillStatus::Accepted => "accepted",
            BillStatus::Refused => "refused",
            BillStatus::Other(value) => value.as_ref(),
        }
    }

    pub fn label_fr(&self) -> &str {
        match self {
            BillStatus::Pending => "En attente",
            BillStatus::Accepted => "Accepté",
            BillStatus::Refused => "Refused",
            BillStatus::Other(value) => value.as_ref(),
        }
    }

    pub fn from_str(value: &str) -> Self {
        match value {
            "pending" => BillStatus::Pending,
            "accepted" => BillStatus::Accepted,
            "refused" => BillStatus::Refused,
            other => BillStatus::Other(Cow::Owned(other.to_string())),
        }
    }
}

impl Default for BillStatus {
    fn default() -> Self {
        BillStatus::Pending
    }
}

impl Serialize for BillStatus {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for BillStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<String>::deserialize(deserializer)?;
        Ok(value
            .map(|value| BillStatus::from_str(&value))
            .unwrap_or_default())
    }
}

/// Expense report record as exchanged with the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bill {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub email: String,
    #[serde(rename = "type", default, deserialize_with = "null_as_empty")]
    pub expense_type: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(default)]
    pub amount: Option<i64>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub date: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub vat: String,
    #[serde(default = "default_pct", deserialize_with = "null_as_default_pct")]
    pub pct: i64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub commentary: String,
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub status: BillStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment_admin: Option<String>,
}

pub const DEFAULT_PCT: i64 = 20;

impl Default for Bill {
    fn default() -> Self {
        Self {
            id: None,
            email: String::new(),
            expense_type: String::new(),
            name: String::new(),
            amount: None,
            date: String::new(),
            vat: String::new(),
            pct: DEFAULT_PCT,
            commentary: String::new(),
            file_url: None,
            file_name: None,
            status: BillStatus::Pending,
            comment_admin: None,
        }
    }
}

fn default_pct() -> i64 {
    DEFAULT_PCT
}

/// Records created by the upload step carry `null` in the fields filled on submission.
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_default_pct<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<i64>::deserialize(deserializer)?.unwrap_or(DEFAULT_PCT))
}

/// File reference handed back by the remote store after an attachment upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredFile {
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default)]
    pub key: Option<String>,
}
