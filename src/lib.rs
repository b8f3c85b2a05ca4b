pub mod cli;
pub mod config;
pub mod error;
pub mod ml;
pub mod model;
pub mod server;
pub mod training;
pub mod vitals;

pub use config::AppConfig;
pub use error::{OrchidError, PredictError, Result};
pub use model::VitalsModel;
pub use server::{create_router, AppState};
pub use training::{run_training, TrainingOptions, TrainingReport};
pub use vitals::{VitalsSample, FEATURE_COLUMNS};
