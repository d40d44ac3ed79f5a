//! Application lifecycle state machine.
//!
//! The windowing layer reports readiness, window-count changes and
//! activations; the state machine answers with the single action the shell
//! should take. Window creation itself belongs to the windowing layer.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Chromium switches appended before the first window is created
pub const COMMAND_LINE_SWITCHES: &[(&str, Option<&str>)] = &[
    // Suppresses GPU VSync errors on Linux
    ("disable-gpu-vsync", None),
    // Keeps DevTools from logging Autofill protocol errors
    ("disable-features", Some("AutofillServerCommunication")),
];

/// Options for the main window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WindowOptions {
    /// Width in logical pixels
    pub width: u32,
    /// Height in logical pixels
    pub height: u32,
    /// Background color shown before the page paints
    pub background_color: String,
    /// Page loaded into the window, relative to the app root
    pub entry: String,
    /// Renderer runs in an isolated context
    pub context_isolation: bool,
    /// Renderer gets no direct host API access
    pub node_integration: bool,
    /// Attach DevTools once the window exists
    pub open_devtools: bool,
}

impl Default for WindowOptions {
    fn default() -> Self {
        Self {
            width: 900,
            height: 700,
            background_color: "#1a1a2e".to_string(),
            entry: "renderer/index.html".to_string(),
            context_isolation: true,
            node_integration: false,
            open_devtools: false,
        }
    }
}

/// Platform family, as far as lifecycle rules care
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// Apps stay alive with no windows open
    MacOs,
    /// Apps quit when the last window closes
    Other,
}

impl Platform {
    /// Platform of the running process
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            Platform::MacOs
        } else {
            Platform::Other
        }
    }
}

/// Lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Waiting for the windowing layer to become ready
    Starting,
    /// At least one window exists or is being created
    Running,
    /// Every window has closed but the process lives on
    NoWindows,
}

/// Events reported by the windowing layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// The windowing layer finished initializing
    Ready,
    /// The number of open windows changed
    WindowCountChanged(usize),
    /// The app was activated (dock click and similar)
    Activated {
        /// Windows open at activation time
        window_count: usize,
    },
}

/// What the shell must do in response to an event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleAction {
    /// Nothing to do
    None,
    /// Create one window with these options
    CreateWindow(WindowOptions),
    /// Terminate the process
    Quit,
}

/// Lifecycle state machine
#[derive(Debug)]
pub struct AppLifecycle {
    state: LifecycleState,
    platform: Platform,
    window: WindowOptions,
}

impl AppLifecycle {
    /// Create a state machine for the given platform
    pub fn new(platform: Platform, window: WindowOptions) -> Self {
        Self {
            state: LifecycleState::Starting,
            platform,
            window,
        }
    }

    /// Current state
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Feed one event and get the resulting action
    pub fn handle(&mut self, event: LifecycleEvent) -> LifecycleAction {
        let (next, action) = match (self.state, event) {
            (LifecycleState::Starting, LifecycleEvent::Ready) => (
                LifecycleState::Running,
                LifecycleAction::CreateWindow(self.window.clone()),
            ),
            // Activation is only wired up after ready.
            (LifecycleState::Starting, _) => (LifecycleState::Starting, LifecycleAction::None),

            (_, LifecycleEvent::Ready) => (self.state, LifecycleAction::None),

            (_, LifecycleEvent::WindowCountChanged(0)) => match self.platform {
                Platform::MacOs => (LifecycleState::NoWindows, LifecycleAction::None),
                Platform::Other => (LifecycleState::NoWindows, LifecycleAction::Quit),
            },
            (_, LifecycleEvent::WindowCountChanged(_)) => {
                (LifecycleState::Running, LifecycleAction::None)
            }

            // Running already means a window exists or is on its way.
            (LifecycleState::NoWindows, LifecycleEvent::Activated { window_count: 0 }) => (
                LifecycleState::Running,
                LifecycleAction::CreateWindow(self.window.clone()),
            ),
            (LifecycleState::NoWindows, LifecycleEvent::Activated { .. }) => {
                (LifecycleState::Running, LifecycleAction::None)
            }
            (LifecycleState::Running, LifecycleEvent::Activated { .. }) => {
                (LifecycleState::Running, LifecycleAction::None)
            }
        };

        if next != self.state {
            debug!(from = ?self.state, to = ?next, event = ?event, "Lifecycle transition");
        }
        self.state = next;
        action
    }
}
