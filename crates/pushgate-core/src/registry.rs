//! Screen key to foreground receiver registrations.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, error};

use crate::receivers::ForegroundFactory;
use crate::types::ScreenKey;

/// A screen's foreground receiver factory.
#[derive(Debug, Clone)]
pub struct ReceiverRegistration {
    screen: ScreenKey,
    factory: ForegroundFactory,
}

impl ReceiverRegistration {
    pub fn screen(&self) -> &ScreenKey {
        &self.screen
    }

    pub fn factory(&self) -> &ForegroundFactory {
        &self.factory
    }
}

/// Registry that holds at most one registration per screen.
#[derive(Debug, Default)]
pub struct RegistrationRegistry {
    registrations: RwLock<HashMap<ScreenKey, ReceiverRegistration>>,
}

impl RegistrationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<ScreenKey, ReceiverRegistration>> {
        match self.registrations.read() {
            Ok(guard) => guard,
            Err(poisoned) => {
                error!(event = "core.registry.lock_poisoned");
                poisoned.into_inner()
            }
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<ScreenKey, ReceiverRegistration>> {
        match self.registrations.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                error!(event = "core.registry.lock_poisoned");
                poisoned.into_inner()
            }
        }
    }

    /// Register `factory` for `screen`, replacing any previous registration.
    ///
    /// Returns the replaced registration, if any.
    pub fn register(
        &self,
        screen: ScreenKey,
        factory: ForegroundFactory,
    ) -> Option<ReceiverRegistration> {
        debug!(
            event = "core.registry.registered",
            screen = %screen,
            policy = factory.policy()
        );
        let registration = ReceiverRegistration {
            screen: screen.clone(),
            factory,
        };
        self.write().insert(screen, registration)
    }

    /// Remove the registration for `screen`. Missing keys are a no-op.
    pub fn unregister(&self, screen: &ScreenKey) -> Option<ReceiverRegistration> {
        let removed = self.write().remove(screen);
        debug!(
            event = "core.registry.unregistered",
            screen = %screen,
            found = removed.is_some()
        );
        removed
    }

    pub fn lookup(&self, screen: &ScreenKey) -> Option<ReceiverRegistration> {
        self.read().get(screen).cloned()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn clear(&self) {
        self.write().clear();
    }
}
