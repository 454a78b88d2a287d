//! Session event fan-out
//!
//! The dashboard's router is an external collaborator. Instead of
//! navigating directly, the session layer publishes [`SessionEvent`]s on a
//! broadcast channel and the router (or a CLI, or a test) subscribes.

use tokio::sync::broadcast;
use tracing::{debug, info};

use super::traits::LoginNavigator;
use super::types::SessionEvent;

const EVENT_CAPACITY: usize = 16;

/// [`LoginNavigator`] that broadcasts [`SessionEvent`]s to subscribers
#[derive(Debug, Clone)]
pub struct BroadcastNavigator {
    login_route: String,
    sender: broadcast::Sender<SessionEvent>,
}

impl BroadcastNavigator {
    /// Navigator redirecting to `login_route`
    #[must_use]
    pub fn new(login_route: impl Into<String>) -> Self {
        let (sender, _) = broadcast::channel(EVENT_CAPACITY);
        Self { login_route: login_route.into(), sender }
    }

    /// Receive every event published after this call
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }

    /// Route published with [`SessionEvent::LoginRequired`]
    #[must_use]
    pub fn login_route(&self) -> &str {
        &self.login_route
    }

    fn publish(&self, event: SessionEvent) {
        // No subscribers is fine: nobody is listening for navigation yet.
        if self.sender.send(event).is_err() {
            debug!("Session event dropped, no subscribers");
        }
    }
}

impl LoginNavigator for BroadcastNavigator {
    fn redirect_to_login(&self) {
        info!(route = %self.login_route, "Session ended, redirecting to login");
        self.publish(SessionEvent::LoginRequired { route: self.login_route.clone() });
    }

    fn session_refreshed(&self) {
        self.publish(SessionEvent::Refreshed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_login_required() {
        let navigator = BroadcastNavigator::new("/login");
        let mut events = navigator.subscribe();

        navigator.redirect_to_login();

        assert_eq!(
            events.recv().await.unwrap(),
            SessionEvent::LoginRequired { route: "/login".to_string() }
        );
    }

    #[tokio::test]
    async fn subscribers_receive_refreshed() {
        let navigator = BroadcastNavigator::new("/login");
        let mut events = navigator.subscribe();

        navigator.session_refreshed();

        assert_eq!(events.recv().await.unwrap(), SessionEvent::Refreshed);
    }

    #[test]
    fn publishing_without_subscribers_is_harmless() {
        let navigator = BroadcastNavigator::new("/login");
        navigator.redirect_to_login();
        navigator.session_refreshed();
        assert_eq!(navigator.login_route(), "/login");
    }
}
