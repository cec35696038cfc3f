//! Backend module - clients for the external services the functions call

pub mod database;
pub mod email;
pub mod fleet;
pub mod token;

pub use database::{
    AuthUser, Carga, Database, Embarcador, NewAuthUser, NewEmbarcador, NewUsuario, RowId,
    SupabaseClient, Usuario,
};
pub use email::{EmailReceipt, Mailer, OutgoingEmail, ResendMailer};
pub use fleet::{AssignTask, CreateTask, CreateVehicle, FleetApi, FleetEngineClient, UpdateLocation};
pub use token::{AccessToken, TokenProvider};
