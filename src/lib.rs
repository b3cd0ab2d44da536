//! Code4Care Library
//!
//! This library provides the emergency side of the Code4Care app:
//! - SOS countdown controller with cancel and dispatch
//! - Emergency desk (service directory, nearby hospitals)
//! - Route table and injected navigation/notification capabilities

pub mod config;
pub mod emergency;
pub mod error;
pub mod logging;
pub mod notification;
pub mod router;
pub mod sos;

pub use config::AppConfig;
pub use emergency::EmergencyDesk;
pub use error::{Code4CareError, Result};
pub use notification::{Notice, Notifier};
pub use router::{Navigator, Route};
pub use sos::{SosController, SosEvent, SosSession, SosState, SosTimer};
