//! Page controllers. Each one turns a submitted form into session updates and
//! remote store calls, and answers with the route to navigate to.

pub mod bills;
pub mod dashboard;
pub mod login;
pub mod new_bill;

pub use bills::{BillRow, Bills};
pub use dashboard::{Dashboard, Decision, StatusGroup};
pub use login::{Login, LoginForm, landing_route};
pub use new_bill::{FileChange, NewBill, NewBillDraft, NewBillForm, SelectedFile};
