/// Navigation targets exchanged between containers and the web layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Bills,
    NewBill,
    Dashboard,
}

impl Route {
    /// Route identifier understood by the navigation callback.
    pub fn path(&self) -> &'static str {
        match self {
            Route::Login => "/",
            Route::Bills => "#employee/bills",
            Route::NewBill => "#employee/bill/new",
            Route::Dashboard => "#admin/dashboard",
        }
    }

    /// Server path serving the page behind the route.
    pub fn href(&self) -> &'static str {
        match self {
            Route::Login => "/",
            Route::Bills => "/employee/bills",
            Route::NewBill => "/employee/bill/new",
            Route::Dashboard => "/admin/dashboard",
        }
    }
}

/// Per-session record of where the last successful navigation went.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavigationContext {
    pub previous_location: Option<Route>,
}

impl NavigationContext {
    pub fn navigate(&mut self, route: Route) -> Route {
        self.previous_location = Some(route);
        route
    }
}
