//! Cargo Tracking edge functions
//!
//! HTTP functions backing the cargo-tracking platform: shipping-company
//! account creation with emailed credentials, a proxy to the Fleet Engine
//! Deliveries API, and status-change email notifications.

pub mod api;
pub mod backend;
pub mod config;
pub mod error;
pub mod service;
pub mod templates;

pub use error::{AppError, Result};

use std::sync::Arc;

use backend::{
    Database, FleetApi, FleetEngineClient, Mailer, ResendMailer, SupabaseClient,
};
use config::Settings;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub database: Arc<dyn Database>,
    pub mailer: Arc<dyn Mailer>,
    pub fleet: Arc<dyn FleetApi>,
}

impl AppState {
    /// Wire the HTTP-backed clients described by `settings`
    pub fn from_settings(settings: Settings) -> Result<Self> {
        let database = SupabaseClient::new(&settings.database)?;
        let mailer = ResendMailer::new(&settings.email)?;
        let fleet = FleetEngineClient::new(settings.fleet.clone())?;

        Ok(Self {
            settings: Arc::new(settings),
            database: Arc::new(database),
            mailer: Arc::new(mailer),
            fleet: Arc::new(fleet),
        })
    }
}
