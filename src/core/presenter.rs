//! Presentation events pushed by the core

use super::currency::CurrencyRecord;
use std::sync::Mutex;

pub const OFFLINE_MESSAGE: &str =
    "It looks like you are offline. Go online to fully experience the functionalities of this app.";

/// Receives results and status changes. The core never reads back from it.
pub trait Presenter: Send + Sync {
    fn result(&self, to_currency: &str, value: f64);
    fn status_message(&self, text: &str);
    fn offline_failure(&self, text: &str);
    /// A currency list to display. A cached list may be replaced by a network one.
    fn currencies(&self, currencies: &[CurrencyRecord], from_network: bool);
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Result { to_currency: String, value: f64 },
    Status(String),
    OfflineFailure(String),
    Currencies { ids: Vec<String>, from_network: bool },
}

/// Presenter that keeps every event in order, for embedding and tests.
#[derive(Default)]
pub struct EventLog {
    events: Mutex<Vec<Event>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// The value currently on display: the last result pushed.
    pub fn displayed_result(&self) -> Option<f64> {
        self.events().iter().rev().find_map(|event| match event {
            Event::Result { value, .. } => Some(*value),
            _ => None,
        })
    }

    pub fn results(&self) -> Vec<f64> {
        self.events()
            .iter()
            .filter_map(|event| match event {
                Event::Result { value, .. } => Some(*value),
                _ => None,
            })
            .collect()
    }

    pub fn has_offline_failure(&self) -> bool {
        self.events()
            .iter()
            .any(|event| matches!(event, Event::OfflineFailure(_)))
    }

    fn push(&self, event: Event) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

impl Presenter for EventLog {
    fn result(&self, to_currency: &str, value: f64) {
        self.push(Event::Result {
            to_currency: to_currency.to_string(),
            value,
        });
    }

    fn status_message(&self, text: &str) {
        self.push(Event::Status(text.to_string()));
    }

    fn offline_failure(&self, text: &str) {
        self.push(Event::OfflineFailure(text.to_string()));
    }

    fn currencies(&self, currencies: &[CurrencyRecord], from_network: bool) {
        self.push(Event::Currencies {
            ids: currencies.iter().map(|c| c.id.clone()).collect(),
            from_network,
        });
    }
}
