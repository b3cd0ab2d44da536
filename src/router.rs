//! Route table
//!
//! Maps URL paths to the application's pages. Navigation is a capability
//! ([`Navigator`]) handed to whoever needs it, never a global.

use crate::notification::{Notice, Notifier};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Mutex;

/// Which role's copy the login page shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Patient,
    Doctor,
    Authority,
}

impl Role {
    /// Parse the `type` query value of `/login`
    pub fn from_query(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "patient" | "user" => Some(Role::Patient),
            "doctor" => Some(Role::Doctor),
            "authority" | "hospital" => Some(Role::Authority),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Patient => "patient",
            Role::Doctor => "doctor",
            Role::Authority => "authority",
        }
    }

    /// Dashboard the role lands on after login
    pub fn dashboard(&self) -> Route {
        match self {
            Role::Patient => Route::UserDashboard,
            Role::Doctor => Route::DoctorDashboard,
            Role::Authority => Route::HospitalDashboard,
        }
    }
}

/// A resolved page
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Route {
    Index,
    Login(Option<Role>),
    UserDashboard,
    DoctorDashboard,
    HospitalDashboard,
    SymptomChecker,
    Telemedicine,
    Emergency,
    MedicineTracker,
    HealthRecords,
    /// Catch-all; keeps the path that failed to match
    NotFound(String),
}

impl Route {
    /// Resolve a path (optionally with a query string) to a route.
    pub fn parse(target: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (target, None),
        };
        let normalized = if path.len() > 1 {
            path.trim_end_matches('/')
        } else {
            path
        };

        match normalized {
            "/" => Route::Index,
            "/login" => Route::Login(query.and_then(login_role)),
            "/user-dashboard" => Route::UserDashboard,
            "/doctor-dashboard" => Route::DoctorDashboard,
            "/hospital-dashboard" => Route::HospitalDashboard,
            "/symptom-checker" => Route::SymptomChecker,
            "/telemedicine" => Route::Telemedicine,
            "/emergency" => Route::Emergency,
            "/medicine-tracker" => Route::MedicineTracker,
            "/health-records" => Route::HealthRecords,
            _ => Route::NotFound(path.to_string()),
        }
    }

    /// Canonical path for this route
    pub fn path(&self) -> String {
        match self {
            Route::Index => "/".to_string(),
            Route::Login(None) => "/login".to_string(),
            Route::Login(Some(role)) => format!("/login?type={}", role.as_str()),
            Route::UserDashboard => "/user-dashboard".to_string(),
            Route::DoctorDashboard => "/doctor-dashboard".to_string(),
            Route::HospitalDashboard => "/hospital-dashboard".to_string(),
            Route::SymptomChecker => "/symptom-checker".to_string(),
            Route::Telemedicine => "/telemedicine".to_string(),
            Route::Emergency => "/emergency".to_string(),
            Route::MedicineTracker => "/medicine-tracker".to_string(),
            Route::HealthRecords => "/health-records".to_string(),
            Route::NotFound(path) => path.clone(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Route::NotFound(_))
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

fn login_role(query: &str) -> Option<Role> {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == "type")
        .and_then(|(_, value)| {
            let value = value.replace('+', " ");
            let decoded = urlencoding::decode(&value).ok()?;
            Role::from_query(&decoded)
        })
}

/// Submit the login form for `role`.
///
/// There is no credential check: the login page is shown, a welcome notice
/// goes out and the role's dashboard becomes the current page.
pub fn sign_in(role: Role, navigator: &dyn Navigator, notifier: &dyn Notifier) -> Route {
    tracing::info!(role = role.as_str(), "Signing in");
    navigator.navigate(Route::Login(Some(role)));
    notifier.notify(&Notice::new(
        "Login Successful!",
        format!("Welcome to Code4Care {} dashboard", role.as_str()),
    ));
    let dashboard = role.dashboard();
    navigator.navigate(dashboard.clone());
    dashboard
}

/// Capability for moving between pages
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}

/// Navigator that remembers every route it was sent to
#[derive(Debug, Default)]
pub struct HistoryNavigator {
    visited: Mutex<Vec<Route>>,
}

impl HistoryNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<Route> {
        self.visited.lock().ok().and_then(|v| v.last().cloned())
    }

    pub fn history(&self) -> Vec<Route> {
        self.visited.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

impl Navigator for HistoryNavigator {
    fn navigate(&self, route: Route) {
        tracing::debug!(route = %route, "Navigating");
        if let Ok(mut visited) = self.visited.lock() {
            visited.push(route);
        }
    }
}
