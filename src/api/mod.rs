//! HTTP handlers
//!
//! - `home`: landing page and pattern form
//! - `views`: HTML rendering

mod home;
mod views;

pub use home::{home_router, india_time};
pub use views::HomePage;
