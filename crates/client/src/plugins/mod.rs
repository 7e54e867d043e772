//! # Client Plugins
//!
//! Presentation layered over the geo scene.
//!
//! ## Usage
//! ```rust,ignore
//! app.add_plugins(CelestialPlugin)
//!    .add_plugins(HudPlugin);
//! ```

pub mod celestial_plugin;
pub mod hud_plugin;

pub use celestial_plugin::CelestialPlugin;
pub use hud_plugin::HudPlugin;
