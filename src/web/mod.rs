pub mod admin_utils;
pub mod auth;
pub mod bills;
pub mod dashboard;
pub mod new_bill;
pub mod responses;
pub mod router;
pub mod state;
pub mod storage;
pub mod templates;
#[cfg(test)]
pub mod test_support;
pub mod uploads;

pub use auth::SESSION_TTL_DAYS;
pub use responses::{ApiMessage, json_error};
pub use state::AppState;
pub use templates::{escape_html, render_login_page};
