//! Content-script features layered over the host page.
//!
//! [`inject::ReactInjector`] is the core: it ships selector descriptions to
//! the page realm and swaps the placeholders that come back for real markup.
//! The remaining modules are the page glue built on top of it.

pub mod assets;
pub mod format;
pub mod inject;
pub mod linkify;
pub mod pager;
pub mod pages;
pub mod settings;
pub mod themes;
pub mod time;

pub use inject::{IndexInput, InjectCallback, InjectDescriptor, InjectError, PendingInjection, ReactInjector};
pub use linkify::Linkifier;
pub use settings::{Settings, SettingsError, SettingsStore};
pub use themes::{ActiveStyles, StyleHost, ThemeManager};
