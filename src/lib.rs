//! Air drawing over live video: a pinch paints, a closed fist erases.
//!
//! Each camera frame flows through landmark detection, [`gesture::classify`],
//! a [`stroke::StrokeSession`] and [`compositor::composite`] before it is
//! shown. [`session::SessionControls`] runs that loop on its own thread.

pub mod compositor;
pub mod config;
pub mod error;
pub mod gesture;
pub mod model_download;
pub mod pipeline;
pub mod raster;
pub mod session;
pub mod stroke;
pub mod types;
pub mod ui;
