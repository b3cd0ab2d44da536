//! Emergency desk
//!
//! Everything behind the emergency page: the SOS button, direct calls to
//! emergency services, the nearby hospital list and the way back to the
//! patient dashboard. While SOS is armed, direct calls and leaving the page
//! are refused.

use crate::config::AppConfig;
use crate::error::{EmergencyError, EmergencyResult};
use crate::notification::{Notice, Notifier};
use crate::router::{Navigator, Route};
use crate::sos::{self, ActivationId, SharedController, SosController, SosEvent, SosSession, SosTimer};
use serde::Serialize;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// A directly callable emergency service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EmergencyContact {
    pub service: &'static str,
    pub number: &'static str,
}

/// A hospital near the caller
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NearbyHospital {
    pub name: &'static str,
    pub distance_km: f32,
    pub eta_minutes: u32,
    pub available: bool,
}

pub static EMERGENCY_CONTACTS: [EmergencyContact; 4] = [
    EmergencyContact {
        service: "Ambulance",
        number: "108",
    },
    EmergencyContact {
        service: "Police",
        number: "100",
    },
    EmergencyContact {
        service: "Fire",
        number: "101",
    },
    EmergencyContact {
        service: "Helpline",
        number: "1075",
    },
];

pub static NEARBY_HOSPITALS: [NearbyHospital; 3] = [
    NearbyHospital {
        name: "Nabha Civil Hospital",
        distance_km: 2.1,
        eta_minutes: 8,
        available: true,
    },
    NearbyHospital {
        name: "Max Super Specialty",
        distance_km: 5.7,
        eta_minutes: 15,
        available: true,
    },
    NearbyHospital {
        name: "Apollo Clinic",
        distance_km: 3.2,
        eta_minutes: 12,
        available: false,
    },
];

/// Find a contact by service name or number, ignoring case
pub fn find_contact(query: &str) -> Option<&'static EmergencyContact> {
    let query = query.trim();
    EMERGENCY_CONTACTS
        .iter()
        .find(|c| c.service.eq_ignore_ascii_case(query) || c.number == query)
}

/// Emergency page state and actions
pub struct EmergencyDesk {
    timer: SosTimer,
    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigator>,
}

impl EmergencyDesk {
    pub fn new(
        config: &AppConfig,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let controller: SharedController = Arc::new(Mutex::new(SosController::new(&config.sos)));
        Self {
            timer: SosTimer::new(controller, Arc::clone(&notifier), config.sos.tick_interval()),
            notifier,
            navigator,
        }
    }

    pub fn controller(&self) -> &SharedController {
        self.timer.controller()
    }

    pub fn snapshot(&self) -> SosSession {
        sos::timer::lock(self.controller()).snapshot()
    }

    pub fn is_sos_active(&self) -> bool {
        self.snapshot().armed
    }

    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<SosEvent> {
        sos::timer::lock(self.controller()).subscribe()
    }

    pub fn contacts(&self) -> &'static [EmergencyContact] {
        &EMERGENCY_CONTACTS
    }

    pub fn hospitals(&self) -> &'static [NearbyHospital] {
        &NEARBY_HOSPITALS
    }

    pub fn available_hospitals(&self) -> impl Iterator<Item = &'static NearbyHospital> {
        NEARBY_HOSPITALS.iter().filter(|h| h.available)
    }

    /// Press the SOS button. Must be called from within a tokio runtime.
    pub fn activate_sos(&mut self) -> EmergencyResult<ActivationId> {
        Ok(self.timer.arm()?)
    }

    pub fn cancel_sos(&mut self) -> EmergencyResult<()> {
        Ok(self.timer.cancel()?)
    }

    /// Call a service directly (by name or number).
    pub fn call_service(&self, service: &str) -> EmergencyResult<&'static EmergencyContact> {
        let contact = find_contact(service).ok_or_else(|| EmergencyError::UnknownService {
            name: service.trim().to_string(),
        })?;

        if self.is_sos_active() {
            tracing::warn!(service = contact.service, "Direct call refused while SOS is active");
            return Err(EmergencyError::SosActive);
        }

        tracing::info!(service = contact.service, number = contact.number, "Calling emergency service");
        self.notifier.notify(&Notice::new(
            format!("Calling {}", contact.service),
            format!("Dialing {}...", contact.number),
        ));
        Ok(contact)
    }

    /// Leave the emergency page for the patient dashboard.
    pub fn back_to_dashboard(&self) -> EmergencyResult<()> {
        if self.is_sos_active() {
            return Err(EmergencyError::SosActive);
        }
        self.navigator.navigate(Route::UserDashboard);
        Ok(())
    }
}
