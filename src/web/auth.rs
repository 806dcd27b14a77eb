use axum::{
    Router,
    extract::{Form, State},
    http::StatusCode,
    response::{Html, Redirect},
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use cookie::time::Duration as CookieDuration;
use tracing::{error, info};
use uuid::Uuid;

use crate::{
    containers::{Login, LoginForm, landing_route},
    model::{User, UserType},
    routes::Route,
    session::SessionHandle,
    web::{AppState, render_login_page},
};

pub const SESSION_COOKIE: &str = "billed_session";
pub const SESSION_TTL_DAYS: i64 = 7;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(login_page))
        .route("/login/employee", post(process_employee_login))
        .route("/login/admin", post(process_admin_login))
        .route("/logout", post(logout))
}

/// Logged-in user resolved from the session cookie.
pub struct SessionUser {
    pub handle: SessionHandle,
    pub user: User,
    pub jwt: Option<String>,
}

pub async fn login_page(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Html<String>, Redirect> {
    if let Some(redirect) = redirect_if_authenticated(&state, &jar).await {
        return Err(redirect);
    }

    Ok(Html(render_login_page()))
}

pub async fn process_employee_login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<(CookieJar, Redirect), (StatusCode, CookieJar, Html<String>)> {
    process_login(&state, jar, UserType::Employee, form).await
}

pub async fn process_admin_login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<(CookieJar, Redirect), (StatusCode, CookieJar, Html<String>)> {
    process_login(&state, jar, UserType::Admin, form).await
}

async fn process_login(
    state: &AppState,
    jar: CookieJar,
    user_type: UserType,
    form: LoginForm,
) -> Result<(CookieJar, Redirect), (StatusCode, CookieJar, Html<String>)> {
    let (id, handle) = state.sessions().open(session_id(&jar)).await;

    let mut guard = handle.lock().await;
    let context = &mut *guard;
    let mut login = Login::new(state.store(), &mut context.storage, &mut context.navigation);

    let outcome = match user_type {
        UserType::Employee => login.handle_submit_employee(form).await,
        UserType::Admin => login.handle_submit_admin(form).await,
    };

    match outcome {
        Ok(Some(route)) => Ok((jar.add(session_cookie(id)), Redirect::to(route.href()))),
        Ok(None) => {
            let authenticated = context.jwt().is_some();
            drop(guard);
            if authenticated {
                return Ok((jar.add(session_cookie(id)), Redirect::to(Route::Login.href())));
            }
            state.sessions().discard(id).await;
            Ok((jar, Redirect::to(Route::Login.href())))
        }
        Err(err) => {
            error!(?err, user_type = user_type.as_str(), "login aborted");
            context.reset();
            drop(guard);
            state.sessions().discard(id).await;
            Err((
                StatusCode::UNAUTHORIZED,
                jar.remove(removal_cookie()),
                login_failed(),
            ))
        }
    }
}

pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, Redirect) {
    if let Some(id) = session_id(&jar) {
        if let Some(handle) = state.sessions().get(id).await {
            handle.lock().await.reset();
        }
        state.sessions().discard(id).await;
        info!(session = %id, "session closed");
    }

    (jar.remove(removal_cookie()), Redirect::to(Route::Login.href()))
}

async fn redirect_if_authenticated(state: &AppState, jar: &CookieJar) -> Option<Redirect> {
    let session = require_session(state, jar).await.ok()?;
    let previous = session.handle.lock().await.navigation.previous_location;
    let route = previous.unwrap_or_else(|| landing_route(session.user.user_type));
    Some(Redirect::to(route.href()))
}

/// Resolve the session user of any type, or send the browser to the login page.
pub async fn require_session(state: &AppState, jar: &CookieJar) -> Result<SessionUser, Redirect> {
    let to_login = || Redirect::to(Route::Login.href());

    let id = session_id(jar).ok_or_else(to_login)?;
    let handle = state.sessions().get(id).await.ok_or_else(to_login)?;
    let (user, jwt) = {
        let context = handle.lock().await;
        (context.user(), context.jwt())
    };
    let user = user.ok_or_else(to_login)?;
    if jwt.is_none() {
        return Err(to_login());
    }

    Ok(SessionUser { handle, user, jwt })
}

/// Like [`require_session`], but a user of the other type lands on their own home page.
pub async fn require_user(
    state: &AppState,
    jar: &CookieJar,
    user_type: UserType,
) -> Result<SessionUser, Redirect> {
    let session = require_session(state, jar).await?;
    if session.user.user_type != user_type {
        return Err(Redirect::to(landing_route(session.user.user_type).href()));
    }
    Ok(session)
}

fn session_id(jar: &CookieJar) -> Option<Uuid> {
    let cookie = jar.get(SESSION_COOKIE)?;
    Uuid::parse_str(cookie.value()).ok()
}

fn session_cookie(id: Uuid) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, id.to_string());
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_max_age(CookieDuration::days(SESSION_TTL_DAYS));
    cookie
}

fn removal_cookie() -> Cookie<'static> {
    let mut removal = Cookie::new(SESSION_COOKIE, "");
    removal.set_path("/");
    removal.set_http_only(true);
    removal.set_same_site(SameSite::Lax);
    removal.set_max_age(CookieDuration::seconds(0));
    removal
}

fn login_failed() -> Html<String> {
    Html(
        "<h1>Connexion impossible</h1><p>Le serveur n'a pas délivré de jeton. <a href=\"/\">Réessayer</a></p>"
            .to_string(),
    )
}

#[cfg(test)]
mod tests {
    use axum::extract::Query;

    use super::*;
    use crate::{
        session::{JWT_KEY, SessionStore, USER_KEY},
        web::{
            dashboard::{DashboardQuery, dashboard_page},
            test_support::{ADMIN_EMAIL, location, memory_state},
        },
    };

    fn form(email: &str, password: &str) -> LoginForm {
        LoginForm {
            email: Some(email.to_string()),
            password: Some(password.to_string()),
        }
    }

    #[tokio::test]
    async fn new_employee_is_registered_and_lands_on_bills() {
        let dir = tempfile::tempdir().unwrap();
        let state = memory_state(dir.path()).await;

        let Ok((jar, redirect)) = process_employee_login(
            State(state.clone()),
            CookieJar::new(),
            Form(form("johndoe@email.com", "azerty")),
        )
        .await
        else {
            panic!("login should succeed");
        };

        assert_eq!(location(redirect), "/employee/bills");
        let id = session_id(&jar).unwrap();
        let handle = state.sessions().get(id).await.unwrap();
        let context = handle.lock().await;
        assert!(context.storage.get(USER_KEY).is_some());
        assert!(context.storage.get(JWT_KEY).is_some());
        assert_eq!(context.navigation.previous_location, Some(Route::Bills));
    }

    #[tokio::test]
    async fn seeded_admin_lands_on_dashboard() {
        let dir = tempfile::tempdir().unwrap();
        let state = memory_state(dir.path()).await;

        let Ok((jar, redirect)) = process_admin_login(
            State(state.clone()),
            CookieJar::new(),
            Form(form("admin@billed.local", "admin-pw")),
        )
        .await
        else {
            panic!("login should succeed");
        };
        assert_eq!(location(redirect), "/admin/dashboard");

        let session = require_user(&state, &jar, UserType::Admin).await.ok().unwrap();
        assert_eq!(session.user.email, "admin@billed.local");

        let wrong_type = require_user(&state, &jar, UserType::Employee).await;
        assert_eq!(location(wrong_type.err().unwrap()), "/admin/dashboard");
    }

    #[tokio::test]
    async fn incomplete_form_stays_on_login() {
        let dir = tempfile::tempdir().unwrap();
        let state = memory_state(dir.path()).await;

        let Ok((_, redirect)) = process_employee_login(
            State(state.clone()),
            CookieJar::new(),
            Form(LoginForm {
                email: Some("a@a".to_string()),
                password: None,
            }),
        )
        .await
        else {
            panic!("missing input is not an error");
        };
        assert_eq!(location(redirect), "/");
        assert_eq!(state.sessions().len().await, 0);
    }

    #[tokio::test]
    async fn rejected_admin_login_does_not_open_the_dashboard() {
        let dir = tempfile::tempdir().unwrap();
        let state = memory_state(dir.path()).await;

        let Err((status, jar, _)) = process_admin_login(
            State(state.clone()),
            CookieJar::new(),
            Form(form(ADMIN_EMAIL, "wrong-password")),
        )
        .await
        else {
            panic!("a wrong admin password must be refused");
        };
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(state.sessions().len().await, 0);

        let page = dashboard_page(
            State(state.clone()),
            jar.clone(),
            Query(DashboardQuery::default()),
        )
        .await;
        assert_eq!(location(page.err().unwrap()), "/");
        assert!(require_user(&state, &jar, UserType::Admin).await.is_err());
    }

    #[tokio::test]
    async fn session_without_token_is_not_authenticated() {
        let dir = tempfile::tempdir().unwrap();
        let state = memory_state(dir.path()).await;
        let (id, handle) = state.sessions().open(None).await;
        handle.lock().await.storage.set(
            USER_KEY,
            serde_json::to_string(&User::connected(UserType::Admin, ADMIN_EMAIL, "x")).unwrap(),
        );
        let jar = CookieJar::new().add(session_cookie(id));

        let result = require_user(&state, &jar, UserType::Admin).await;
        assert_eq!(location(result.err().unwrap()), "/");
    }

    #[tokio::test]
    async fn logout_drops_the_session() {
        let dir = tempfile::tempdir().unwrap();
        let state = memory_state(dir.path()).await;

        let Ok((jar, _)) = process_employee_login(
            State(state.clone()),
            CookieJar::new(),
            Form(form("a@a", "pw")),
        )
        .await
        else {
            panic!("login should succeed");
        };
        let id = session_id(&jar).unwrap();

        let (_, redirect) = logout(State(state.clone()), jar.clone()).await;
        assert_eq!(location(redirect), "/");
        assert!(state.sessions().get(id).await.is_none());
        assert!(require_session(&state, &jar).await.is_err());
    }

    #[tokio::test]
    async fn anonymous_requests_are_sent_to_login() {
        let dir = tempfile::tempdir().unwrap();
        let state = memory_state(dir.path()).await;
        let result = require_user(&state, &CookieJar::new(), UserType::Employee).await;
        assert_eq!(location(result.err().unwrap()), "/");
    }
}
