// Library interface for pitwall
// This allows integration tests and benches to drive the refresh engine directly

pub mod compose;
pub mod config;
pub mod dashboard;
pub mod errors;
pub mod panel;
pub mod session;
pub mod views;

// Re-export commonly used types
pub use compose::{FrameCell, FrameComposer, RenderedFrame};
pub use config::{DashboardConfig, PanelLayout};
pub use dashboard::{Dashboard, DashboardHandle, DashboardState};
pub use errors::PitwallError;
pub use panel::{Panel, PanelStatus};
pub use session::{FileSessionProvider, MockSessionProvider, SessionProvider, SessionSnapshot};
pub use views::{ViewDeriver, ViewKind, ViewModel};
