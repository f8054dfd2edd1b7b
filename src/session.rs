use log::info;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub uid: String,
    pub email: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
}

impl User {
    /// Falls back to the local part of the email, then to "User".
    pub fn display_name(&self) -> String {
        if let Some(name) = self.display_name.as_deref().filter(|n| !n.trim().is_empty()) {
            return name.to_string();
        }
        match self.email.split('@').next() {
            Some(local) if !local.is_empty() => local.to_string(),
            _ => "User".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPhase {
    /// Waiting for the provider's first auth-state callback.
    Initializing,
    SignedOut,
    SignedIn,
}

#[derive(Debug, Clone)]
pub struct SessionContext {
    phase: AuthPhase,
    user: Option<User>,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::init()
    }
}

impl SessionContext {
    pub fn init() -> Self {
        Self {
            phase: AuthPhase::Initializing,
            user: None,
        }
    }

    /// Applies an auth-state change reported by the identity provider.
    pub fn on_auth_state_changed(&mut self, user: Option<User>) {
        match user {
            Some(user) => self.sign_in(user),
            None => self.sign_out(),
        }
    }

    pub fn sign_in(&mut self, user: User) {
        info!("Signed in as {}", user.email);
        self.user = Some(user);
        self.phase = AuthPhase::SignedIn;
    }

    pub fn sign_out(&mut self) {
        if let Some(user) = self.user.take() {
            info!("Signed out {}", user.email);
        }
        self.phase = AuthPhase::SignedOut;
    }

    pub fn phase(&self) -> AuthPhase {
        self.phase
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.phase == AuthPhase::SignedIn
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Route {
    Root,
    Login,
    SignUp,
    Dashboard,
    Company { symbol: String },
    Chatbot,
}

impl Route {
    pub fn parse(path: &str) -> Option<Self> {
        let trimmed = path.trim_end_matches('/');
        match trimmed {
            "" => Some(Route::Root),
            "/login" => Some(Route::Login),
            "/signup" => Some(Route::SignUp),
            "/dashboard" => Some(Route::Dashboard),
            "/chatbot" => Some(Route::Chatbot),
            _ => {
                let symbol = trimmed.strip_prefix("/company/")?;
                (!symbol.is_empty()).then(|| Route::Company {
                    symbol: symbol.to_string(),
                })
            }
        }
    }

    pub fn is_public(&self) -> bool {
        matches!(self, Route::Login | Route::SignUp)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Root => write!(f, "/"),
            Route::Login => write!(f, "/login"),
            Route::SignUp => write!(f, "/signup"),
            Route::Dashboard => write!(f, "/dashboard"),
            Route::Company { symbol } => write!(f, "/company/{}", symbol),
            Route::Chatbot => write!(f, "/chatbot"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    /// Auth state not known yet; show a spinner.
    Wait,
    Allow(Route),
    Redirect(Route),
}

pub fn guard(route: Route, session: &SessionContext) -> RouteDecision {
    if session.phase() == AuthPhase::Initializing {
        return RouteDecision::Wait;
    }

    let signed_in = session.is_authenticated();
    match route {
        Route::Root if signed_in => RouteDecision::Redirect(Route::Dashboard),
        Route::Root => RouteDecision::Redirect(Route::Login),
        r if r.is_public() && signed_in => RouteDecision::Redirect(Route::Dashboard),
        r if r.is_public() => RouteDecision::Allow(r),
        r if signed_in => RouteDecision::Allow(r),
        _ => RouteDecision::Redirect(Route::Login),
    }
}
