use std::{path::Path, sync::Arc};

use axum::{
    extract::{Form, State},
    http::header,
    response::{IntoResponse, Redirect},
};
use axum_extra::extract::cookie::CookieJar;

use crate::{
    config::AppConfig,
    containers::LoginForm,
    store::{MemoryStore, RemoteStore},
    web::{AppState, auth},
};

pub const ADMIN_EMAIL: &str = "admin@billed.local";
pub const ADMIN_PASSWORD: &str = "admin-pw";

/// App state backed by a fresh in-memory store with attachments under `dir`.
pub async fn memory_state(dir: &Path) -> AppState {
    let store = MemoryStore::new(dir);
    store
        .ensure_seed_admin(ADMIN_EMAIL, ADMIN_PASSWORD)
        .await
        .unwrap();
    let store: Arc<dyn RemoteStore> = Arc::new(store);
    let config = AppConfig {
        attachments_dir: dir.to_path_buf(),
        ..AppConfig::from_lookup(|_| None).unwrap()
    };
    AppState::with_store(store, config)
}

pub fn location(redirect: Redirect) -> String {
    redirect.into_response().headers()[header::LOCATION]
        .to_str()
        .unwrap()
        .to_string()
}

pub async fn employee_jar(state: &AppState, email: &str) -> CookieJar {
    let form = LoginForm {
        email: Some(email.to_string()),
        password: Some("pw".to_string()),
    };
    match auth::process_employee_login(State(state.clone()), CookieJar::new(), Form(form)).await {
        Ok((jar, _)) => jar,
        Err(_) => panic!("employee login failed"),
    }
}

pub async fn admin_jar(state: &AppState) -> CookieJar {
    let form = LoginForm {
        email: Some(ADMIN_EMAIL.to_string()),
        password: Some(ADMIN_PASSWORD.to_string()),
    };
    match auth::process_admin_login(State(state.clone()), CookieJar::new(), Form(form)).await {
        Ok((jar, _)) => jar,
        Err(_) => panic!("admin login failed"),
    }
}
