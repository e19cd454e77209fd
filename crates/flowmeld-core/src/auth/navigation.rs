/// Where the front end should be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Register,
    Dashboard,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::Register => "/register",
            Route::Dashboard => "/dashboard",
        }
    }

    /// Only reachable with an authenticated session.
    pub fn is_protected(&self) -> bool {
        matches!(self, Route::Dashboard)
    }

    /// Where a request for this route actually lands. Anonymous users are
    /// redirected from protected routes to the login entry point.
    pub fn resolve(self, is_authenticated: bool) -> Route {
        if self.is_protected() && !is_authenticated {
            Route::Login
        } else {
            self
        }
    }
}

/// Session transitions broadcast by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    LoggedIn,
    LoggedOut,
}

impl SessionEvent {
    /// The navigation this transition asks the front end for.
    pub fn route(&self) -> Route {
        match self {
            SessionEvent::LoggedIn => Route::Dashboard,
            SessionEvent::LoggedOut => Route::Login,
        }
    }
}
