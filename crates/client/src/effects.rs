//! User-facing side effects triggered by the gateway: transient
//! notifications and navigation.
//!
//! The gateway never renders or routes on its own; it calls these traits.
//! Hosts plug in whatever fits (a toast component, a terminal, the browser
//! location).

use std::sync::{Arc, Mutex};

/// Transient user-facing notification ("toast").
pub trait Notifier: Send + Sync {
    fn error(&self, message: &str);

    fn success(&self, message: &str) {
        let _ = message;
    }
}

/// Leaves the current view and lands on `route`.
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: &str);
}

/// Notifier that only logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn error(&self, message: &str) {
        tracing::error!(target: "ecowiser::notify", "{message}");
    }

    fn success(&self, message: &str) {
        tracing::info!(target: "ecowiser::notify", "{message}");
    }
}

/// Navigator that only logs. Useful for headless hosts.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNavigator;

impl Navigator for TracingNavigator {
    fn navigate(&self, route: &str) {
        tracing::info!(target: "ecowiser::navigate", route, "navigation requested");
    }
}

/// One recorded side effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Error(String),
    Success(String),
    Navigate(String),
}

/// Notifier + navigator that remembers everything, in order.
///
/// Clones share the same log.
#[derive(Debug, Default, Clone)]
pub struct EffectLog {
    effects: Arc<Mutex<Vec<Effect>>>,
}

impl EffectLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, effect: Effect) {
        self.effects
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(effect);
    }

    pub fn effects(&self) -> Vec<Effect> {
        self.effects
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.effects()
            .into_iter()
            .filter_map(|e| match e {
                Effect::Error(m) => Some(m),
                _ => None,
            })
            .collect()
    }

    pub fn navigations(&self) -> Vec<String> {
        self.effects()
            .into_iter()
            .filter_map(|e| match e {
                Effect::Navigate(r) => Some(r),
                _ => None,
            })
            .collect()
    }
}

impl Notifier for EffectLog {
    fn error(&self, message: &str) {
        self.push(Effect::Error(message.to_string()));
    }

    fn success(&self, message: &str) {
        self.push(Effect::Success(message.to_string()));
    }
}

impl Navigator for EffectLog {
    fn navigate(&self, route: &str) {
        self.push(Effect::Navigate(route.to_string()));
    }
}
