//! HTTP API.
//!
//! | Method | Path                        | Handler                     |
//! |--------|-----------------------------|-----------------------------|
//! | GET    | `/health`                   | [`handlers::health`]        |
//! | GET    | `/sites`                    | [`handlers::list_sites`]    |
//! | POST   | `/scan`                     | [`handlers::start_scan`]    |
//! | GET    | `/scan/{job_id}`            | [`handlers::scan_status`]   |
//! | POST   | `/scan/{job_id}/cancel`     | [`handlers::cancel_scan`]   |
//! | POST   | `/optimize`                 | [`handlers::optimize`]      |
//! | POST   | `/test_optimization_config` | [`handlers::probe_config`]  |

pub mod dto;
pub mod error;
pub mod handlers;
pub mod router;
pub mod state;

pub use error::{AppError, AppResult};
pub use router::build_router;
pub use state::AppState;
