pub mod assess;
pub mod controller;
pub mod error;
pub mod format;
pub mod logging;
pub mod model;
pub mod overlay;
pub mod portfolio;
pub mod render;
pub mod scheduler;
pub mod services;
pub mod severity;
pub mod state;
pub mod transport;
pub mod workflow;
