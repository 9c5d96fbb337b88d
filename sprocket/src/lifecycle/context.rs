//! Browsing context lifetime, tied explicitly to the main loop's presence.
//!
//! The context's teardown needs the main loop to still be conceptually
//! alive. Instead of relying on call-order convention, the context holds a
//! capability token issued by [`MainLoopPresence`]; destroying the context
//! after the presence is retired is a programming error caught by
//! assertion.

use std::cell::Cell;
use std::rc::Rc;

use crate::trace::{debug, warn};

/// Marks the main loop as conceptually present and issues [`LoopToken`]s.
#[derive(Debug)]
pub struct MainLoopPresence {
    live: Rc<Cell<bool>>,
}

impl Default for MainLoopPresence {
    fn default() -> Self {
        Self::new()
    }
}

impl MainLoopPresence {
    #[must_use]
    pub fn new() -> Self {
        Self {
            live: Rc::new(Cell::new(true)),
        }
    }

    /// Issues a token valid until [`retire`](MainLoopPresence::retire).
    #[must_use]
    pub fn token(&self) -> LoopToken {
        LoopToken {
            live: Rc::clone(&self.live),
        }
    }

    /// Marks the loop as gone; all issued tokens go dead.
    pub fn retire(self) {
        self.live.set(false);
    }
}

/// Capability proving the main loop is still present.
#[derive(Debug, Clone)]
pub struct LoopToken {
    live: Rc<Cell<bool>>,
}

impl LoopToken {
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.live.get()
    }
}

/// Long-lived browsing context owned by the host.
///
/// Must be destroyed explicitly, after the main loop exits but before the
/// owning process host tears down.
pub struct BrowsingContext {
    token: LoopToken,
    destroyed: bool,
}

impl BrowsingContext {
    #[must_use]
    pub fn new(token: LoopToken) -> Self {
        Self {
            token,
            destroyed: false,
        }
    }

    /// Tears the context down.
    ///
    /// # Panics
    ///
    /// Panics if the main loop presence was already retired: teardown uses
    /// loop facilities and must run while the token is live.
    pub fn destroy(mut self) {
        assert!(
            self.token.is_live(),
            "browsing context destroyed after main loop teardown"
        );
        self.destroyed = true;
        debug!("browsing context destroyed");
    }
}

impl Drop for BrowsingContext {
    fn drop(&mut self) {
        if !self.destroyed {
            warn!("browsing context dropped without explicit destroy");
        }
    }
}
