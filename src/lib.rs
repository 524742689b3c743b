pub mod backend;
pub mod config;
pub mod email;
pub mod error;
pub mod export;
pub mod model;
pub mod state;
pub mod store;

mod api;
mod pages;

use actix_web::web;

/// Registers the JSON API under `/api` and the HTML pages at the root
pub fn app_config(config: &mut web::ServiceConfig) {
    api::config(config);
    pages::config(config);
}
