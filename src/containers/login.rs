use serde::Deserialize;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::{
    model::{User, UserType},
    routes::{NavigationContext, Route},
    session::{JWT_KEY, SessionStore, USER_KEY},
    store::{RemoteStore, StoreError},
};

/// Submitted login sub-form. A missing field means the form was not the one we expect.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Error)]
pub enum LoginError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("no token received from the remote store")]
    MissingToken,
    #[error("failed to serialize session user: {0}")]
    Session(#[from] serde_json::Error),
}

pub fn landing_route(user_type: UserType) -> Route {
    match user_type {
        UserType::Employee => Route::Bills,
        UserType::Admin => Route::Dashboard,
    }
}

/// Drives the employee and admin login forms.
pub struct Login<'a, S: SessionStore + ?Sized> {
    store: &'a dyn RemoteStore,
    session: &'a mut S,
    navigation: &'a mut NavigationContext,
}

impl<'a, S: SessionStore + ?Sized> Login<'a, S> {
    pub fn new(
        store: &'a dyn RemoteStore,
        session: &'a mut S,
        navigation: &'a mut NavigationContext,
    ) -> Self {
        Self {
            store,
            session,
            navigation,
        }
    }

    pub async fn handle_submit_employee(
        &mut self,
        form: LoginForm,
    ) -> Result<Option<Route>, LoginError> {
        self.handle_submit(UserType::Employee, form).await
    }

    pub async fn handle_submit_admin(
        &mut self,
        form: LoginForm,
    ) -> Result<Option<Route>, LoginError> {
        self.handle_submit(UserType::Admin, form).await
    }

    /// Returns `Ok(None)` when the form lacks an input; nothing is stored in that case.
    async fn handle_submit(
        &mut self,
        user_type: UserType,
        form: LoginForm,
    ) -> Result<Option<Route>, LoginError> {
        let (Some(email), Some(password)) = (form.email, form.password) else {
            return Ok(None);
        };

        let user = User::connected(user_type, email, password);
        self.session.set(USER_KEY, serde_json::to_string(&user)?);

        if let Err(err) = self.login(&user).await {
            warn!(?err, email = %user.email, "login failed, registering account");
            self.create_user(&user).await?;
        }

        info!(email = %user.email, user_type = user_type.as_str(), "user logged in");
        Ok(Some(self.navigation.navigate(landing_route(user_type))))
    }

    pub async fn login(&mut self, user: &User) -> Result<(), LoginError> {
        let response = self.store.login(&user.credentials()).await?;
        let Some(token) = response.token() else {
            error!(email = %user.email, "login response carried no token");
            return Err(LoginError::MissingToken);
        };
        self.session.set(JWT_KEY, token.to_string());
        Ok(())
    }

    /// Register the account, then log in with it.
    pub async fn create_user(&mut self, user: &User) -> Result<(), LoginError> {
        self.store.create_user(&user.registration()).await?;
        self.login(user).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        session::MemorySessionStore,
        store::{
            LoginResponse,
            fake::{Call, FakeStore},
        },
    };

    fn form(email: &str, password: &str) -> LoginForm {
        LoginForm {
            email: Some(email.to_string()),
            password: Some(password.to_string()),
        }
    }

    #[tokio::test]
    async fn employee_login_stores_user_and_token() {
        let store =
            FakeStore::new().with_logins(vec![Ok(LoginResponse::with_jwt("fake-jwt-token"))]);
        let mut session = MemorySessionStore::default();
        let mut navigation = NavigationContext::default();

        let route = Login::new(&store, &mut session, &mut navigation)
            .handle_submit_employee(form("johndoe@email.com", "azerty"))
            .await
            .unwrap();

        assert_eq!(route.map(|r| r.path()), Some("#employee/bills"));
        assert_eq!(
            session.get(USER_KEY).as_deref(),
            Some(
                r#"{"type":"Employee","email":"johndoe@email.com","password":"azerty","status":"connected"}"#
            )
        );
        assert_eq!(session.get(JWT_KEY).as_deref(), Some("fake-jwt-token"));
        assert_eq!(navigation.previous_location, Some(Route::Bills));
        assert_eq!(store.count(|call| matches!(call, Call::CreateUser(_))), 0);
    }

    #[tokio::test]
    async fn admin_login_lands_on_dashboard() {
        let store = FakeStore::new().with_logins(vec![Ok(LoginResponse::with_jwt("fake-jwt"))]);
        let mut session = MemorySessionStore::default();
        let mut navigation = NavigationContext::default();

        let route = Login::new(&store, &mut session, &mut navigation)
            .handle_submit_admin(form("johndoe@email.com", "azerty"))
            .await
            .unwrap();

        assert_eq!(route, Some(Route::Dashboard));
        assert_eq!(
            session.get(USER_KEY).as_deref(),
            Some(
                r#"{"type":"Admin","email":"johndoe@email.com","password":"azerty","status":"connected"}"#
            )
        );
    }

    #[tokio::test]
    async fn failed_login_registers_once_then_retries() {
        let store = FakeStore::new().with_logins(vec![
            Err(StoreError::Unauthorized),
            Ok(LoginResponse::with_jwt("second")),
        ]);
        let mut session = MemorySessionStore::default();
        let mut navigation = NavigationContext::default();

        let route = Login::new(&store, &mut session, &mut navigation)
            .handle_submit_employee(form("new.hire@corp.test", "pw"))
            .await
            .unwrap();

        assert_eq!(route, Some(Route::Bills));
        assert_eq!(session.get(JWT_KEY).as_deref(), Some("second"));

        let calls = store.calls();
        assert_eq!(calls.len(), 3);
        assert!(matches!(calls[0], Call::Login(_)));
        match &calls[1] {
            Call::CreateUser(payload) => {
                assert_eq!(payload.name, "new.hire");
                assert_eq!(payload.user_type, UserType::Employee);
            }
            other => panic!("expected account creation, got {other:?}"),
        }
        assert!(matches!(calls[2], Call::Login(_)));
    }

    #[tokio::test]
    async fn missing_token_falls_back_then_aborts() {
        let store = FakeStore::new().with_logins(vec![
            Ok(LoginResponse::default()),
            Ok(LoginResponse::default()),
        ]);
        let mut session = MemorySessionStore::default();
        let mut navigation = NavigationContext::default();

        let result = Login::new(&store, &mut session, &mut navigation)
            .handle_submit_employee(form("a@a", "pw"))
            .await;

        assert!(matches!(result, Err(LoginError::MissingToken)));
        assert_eq!(store.count(|call| matches!(call, Call::CreateUser(_))), 1);
        assert_eq!(session.get(JWT_KEY), None);
        assert!(session.get(USER_KEY).is_some());
        assert_eq!(navigation.previous_location, None);
    }

    #[tokio::test]
    async fn failed_registration_aborts_without_second_login() {
        let store = FakeStore::new()
            .with_logins(vec![Err(StoreError::Unauthorized)])
            .with_create_user_error(StoreError::Transport("down".to_string()));
        let mut session = MemorySessionStore::default();
        let mut navigation = NavigationContext::default();

        let result = Login::new(&store, &mut session, &mut navigation)
            .handle_submit_admin(form("a@a", "pw"))
            .await;

        assert!(matches!(result, Err(LoginError::Store(StoreError::Transport(_)))));
        assert_eq!(store.count(|call| matches!(call, Call::Login(_))), 1);
        assert_eq!(navigation.previous_location, None);
    }

    #[tokio::test]
    async fn missing_input_aborts_silently() {
        let store = FakeStore::new();
        let mut session = MemorySessionStore::default();
        let mut navigation = NavigationContext::default();

        let route = Login::new(&store, &mut session, &mut navigation)
            .handle_submit_admin(LoginForm {
                email: Some("a@a".to_string()),
                password: None,
            })
            .await
            .unwrap();

        assert_eq!(route, None);
        assert!(store.calls().is_empty());
        assert_eq!(session.get(USER_KEY), None);
    }

    #[tokio::test]
    async fn token_field_names_are_all_accepted() {
        let response: LoginResponse = serde_json::from_str(r#"{"accessToken":"xyz"}"#).unwrap();
        let store = FakeStore::new().with_logins(vec![Ok(response)]);
        let mut session = MemorySessionStore::default();
        let mut navigation = NavigationContext::default();

        Login::new(&store, &mut session, &mut navigation)
            .handle_submit_employee(form("a@a", "pw"))
            .await
            .unwrap();

        assert_eq!(session.get(JWT_KEY).as_deref(), Some("xyz"));
    }
}
