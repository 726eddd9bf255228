//! Browser runtime for buildscope dashboards.
//!
//! Bridges a [`Dashboard`](crate::Dashboard) to the page: reads the route and
//! link parameters from `window.location`, fetches through a JavaScript
//! function returning a Promise, and renders markup into a container.

#[cfg(target_arch = "wasm32")]
mod app;

#[cfg(target_arch = "wasm32")]
pub use app::App;
