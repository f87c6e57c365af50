#[macro_use]
extern crate rocket;
#[macro_use]
extern crate diesel;

mod catchers;
mod guards;

pub mod configuration;
pub mod dispatch;
pub mod domain;
pub mod models;
pub mod push;
pub mod registration;
pub mod routes;
pub mod scheduler;
pub mod schema;
pub mod startup;
pub mod store;
pub mod telemetry;
pub mod vapid;
