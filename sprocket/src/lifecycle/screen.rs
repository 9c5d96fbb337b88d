//! Display/screen abstraction installed before any window exists.

/// Bounds of a display in device pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DisplayBounds {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Source of display geometry for the embedding host.
pub trait ScreenProvider {
    /// The primary display.
    fn primary(&self) -> DisplayBounds;

    /// All displays; single-screen hosts report just the primary.
    fn displays(&self) -> Vec<DisplayBounds> {
        vec![self.primary()]
    }
}

/// Fixed-geometry provider for hosts that report a single screen.
#[derive(Debug, Clone, Copy)]
pub struct HostScreen {
    bounds: DisplayBounds,
}

impl HostScreen {
    #[must_use]
    pub fn new(bounds: DisplayBounds) -> Self {
        Self { bounds }
    }
}

impl ScreenProvider for HostScreen {
    fn primary(&self) -> DisplayBounds {
        self.bounds
    }
}

/// Engine-side slot for the screen provider.
///
/// Installed exactly once, before any window is created; both a second
/// install and a lookup before install are programming errors.
#[derive(Default)]
pub struct ScreenRegistry {
    provider: Option<Box<dyn ScreenProvider>>,
}

impl ScreenRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs the provider.
    ///
    /// # Panics
    ///
    /// Panics if a provider is already installed.
    pub fn install(&mut self, provider: Box<dyn ScreenProvider>) {
        assert!(
            self.provider.is_none(),
            "screen provider installed twice"
        );
        self.provider = Some(provider);
    }

    #[must_use]
    pub fn is_installed(&self) -> bool {
        self.provider.is_some()
    }

    /// The installed provider.
    ///
    /// # Panics
    ///
    /// Panics if no provider was installed.
    #[must_use]
    pub fn get(&self) -> &dyn ScreenProvider {
        self.provider
            .as_deref()
            .expect("no screen provider installed")
    }
}
