//! Event listener port.

use crate::domain::KeyEvent;
use async_trait::async_trait;

/// Receives every successful lifecycle transition.
///
/// Listeners run inline after the store write; they cannot fail the
/// operation that produced the event.
#[async_trait]
pub trait KeyEventListener: Send + Sync {
    async fn on_event(&self, event: &KeyEvent);
}
