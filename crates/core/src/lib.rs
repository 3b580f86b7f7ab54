//! `bazaar-core`: primitives shared by the server gate and the client.
//!
//! This crate is pure: no HTTP, no storage, no async runtime.

pub mod error;
pub mod mode;
pub mod route;
pub mod settings;
pub mod token;

pub use error::{CoreError, CoreResult};
pub use mode::RunMode;
pub use route::{MatchRule, RouteClass, RouteTable, normalize_path};
pub use settings::{
    MaintenanceDenial, MaintenanceStatus, MaintenanceStatusResponse, SiteSettings, SiteSummary,
};
pub use token::{TokenKind, is_placeholder, is_real};
