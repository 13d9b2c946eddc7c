//! Identity signal surface.
//!
//! The identity provider is an external collaborator; all the cart needs
//! from it is one value, "authenticated as X" or "anonymous", plus a change
//! notification. That maps onto a [`watch`] channel: the auth layer holds
//! the [`IdentitySignal`] and publishes transitions, the cart manager holds
//! an [`IdentityWatch`] and reloads on every observed change.

use tokio::sync::watch;

use lockerroom_core::UserId;

/// Publisher half of the identity signal, held by the auth layer.
#[derive(Debug, Clone)]
pub struct IdentitySignal {
    tx: watch::Sender<Option<UserId>>,
}

/// Observer half of the identity signal, held by each cart manager.
pub type IdentityWatch = watch::Receiver<Option<UserId>>;

impl IdentitySignal {
    /// Create a signal with a known starting identity.
    #[must_use]
    pub fn new(initial: Option<UserId>) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    /// Publish the current identity. Observers are only woken when the value
    /// actually changes; republishing the same identity is a no-op.
    pub fn set(&self, identity: Option<UserId>) {
        self.tx.send_if_modified(|current| {
            if *current == identity {
                false
            } else {
                *current = identity;
                true
            }
        });
    }

    /// Subscribe a new observer. The value at subscription time counts as
    /// already seen.
    #[must_use]
    pub fn subscribe(&self) -> IdentityWatch {
        self.tx.subscribe()
    }

    /// The identity as currently published.
    #[must_use]
    pub fn current(&self) -> Option<UserId> {
        *self.tx.borrow()
    }
}

/// Starts anonymous.
impl Default for IdentitySignal {
    fn default() -> Self {
        Self::new(None)
    }
}
