//! Code4Care - emergency console
//!
//! Drives the emergency desk from stdin: arm and cancel the SOS countdown,
//! call services directly, list nearby hospitals and move between pages.

use code4care::emergency::EmergencyDesk;
use code4care::logging;
use code4care::notification::{DesktopNotifier, FanoutNotifier, MemoryNotifier, TracingNotifier};
use code4care::router::{self, HistoryNavigator, Navigator, Role, Route};
use code4care::{AppConfig, SosEvent};
use std::process::ExitCode;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Sos,
    Cancel,
    Call(String),
    Contacts,
    Hospitals,
    Status,
    Go(String),
    Login(String),
    Back,
    History,
    Help,
    Quit,
    Empty,
    Unknown(String),
}

impl Command {
    fn parse(line: &str) -> Self {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        match word.to_lowercase().as_str() {
            "" => Command::Empty,
            "sos" | "activate" => Command::Sos,
            "cancel" => Command::Cancel,
            "call" if !rest.is_empty() => Command::Call(rest.to_string()),
            "contacts" => Command::Contacts,
            "hospitals" => Command::Hospitals,
            "status" => Command::Status,
            "go" if !rest.is_empty() => Command::Go(rest.to_string()),
            "login" if !rest.is_empty() => Command::Login(rest.to_string()),
            "back" => Command::Back,
            "history" => Command::History,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            _ => Command::Unknown(line.to_string()),
        }
    }
}

const HELP: &str = "\
Commands:
  sos              arm the SOS countdown
  cancel           cancel an armed SOS
  call <service>   call Ambulance, Police, Fire or Helpline directly
  contacts         list emergency numbers
  hospitals        list nearby hospitals
  status           print the SOS session as JSON
  go <path>        navigate to a page (e.g. /login?type=doctor)
  login <role>     sign in as patient, doctor or authority
  back             return to the patient dashboard
  history          show notices received so far
  quit             leave";

fn print_event(event: &SosEvent) {
    match event {
        SosEvent::Armed {
            seconds_remaining, ..
        } => println!("!! SOS ACTIVE - contacting services in {seconds_remaining}s (type 'cancel')"),
        SosEvent::Tick {
            seconds_remaining, ..
        } if *seconds_remaining > 0 => println!("   {seconds_remaining}..."),
        SosEvent::Dispatched { .. } => println!("!! Emergency services contacted"),
        SosEvent::Cancelled { .. } => println!("   SOS cancelled"),
        _ => {}
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("code4care: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> code4care::Result<()> {
    let config = AppConfig::load()?;
    config.validate()?;
    let _log_guard = logging::init_logging(&config.logging)?;

    let history = Arc::new(MemoryNotifier::new());
    let notifier = FanoutNotifier::new()
        .with(Arc::new(TracingNotifier))
        .with(history.clone())
        .with(Arc::new(DesktopNotifier::new(config.notification.clone())));
    let navigator = Arc::new(HistoryNavigator::new());
    navigator.navigate(Route::Emergency);

    let notifier = Arc::new(notifier);
    let mut desk = EmergencyDesk::new(&config, notifier.clone(), navigator.clone());
    let mut events = desk.subscribe();
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            print_event(&event);
        }
    });

    println!("{HELP}");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match Command::parse(&line) {
            Command::Empty => {}
            Command::Sos => {
                if let Err(e) = desk.activate_sos() {
                    println!("{e}");
                }
            }
            Command::Cancel => {
                if let Err(e) = desk.cancel_sos() {
                    println!("{e}");
                }
            }
            Command::Call(service) => match desk.call_service(&service) {
                Ok(contact) => println!("Dialing {} ({})...", contact.number, contact.service),
                Err(e) => println!("{e}"),
            },
            Command::Contacts => {
                for contact in desk.contacts() {
                    println!("  {:<10} {}", contact.service, contact.number);
                }
            }
            Command::Hospitals => {
                for hospital in desk.hospitals() {
                    println!(
                        "  {:<22} {:>4.1} km  {:>3} min  {}",
                        hospital.name,
                        hospital.distance_km,
                        hospital.eta_minutes,
                        if hospital.available { "Available" } else { "Busy" }
                    );
                }
            }
            Command::Status => match serde_json::to_string(&desk.snapshot()) {
                Ok(json) => println!("{json}"),
                Err(e) => tracing::warn!("Failed to serialize session: {}", e),
            },
            Command::Go(target) => {
                if desk.is_sos_active() {
                    println!("Unavailable while SOS is active");
                } else {
                    let route = Route::parse(&target);
                    if route.is_not_found() {
                        println!("404: no page at {route}");
                    }
                    navigator.navigate(route);
                }
            }
            Command::Login(role) => match Role::from_query(&role) {
                _ if desk.is_sos_active() => println!("Unavailable while SOS is active"),
                Some(role) => {
                    let dashboard = router::sign_in(role, navigator.as_ref(), notifier.as_ref());
                    println!("Signed in, now at {dashboard}");
                }
                None => println!("Unknown role '{role}', use patient, doctor or authority"),
            },
            Command::Back => match desk.back_to_dashboard() {
                Ok(()) => println!("Back at {}", Route::UserDashboard),
                Err(e) => println!("{e}"),
            },
            Command::History => {
                for notice in history.notices() {
                    println!(
                        "  [{}] {}: {}",
                        notice.at.format("%H:%M:%S"),
                        notice.title,
                        notice.description
                    );
                }
            }
            Command::Help => println!("{HELP}"),
            Command::Quit => break,
            Command::Unknown(input) => println!("Unknown command '{input}', try 'help'"),
        }
    }

    // Dropping the desk stops any pending countdown
    drop(desk);
    tracing::info!("Emergency console closed");
    Ok(())
}
