pub mod ask;
pub mod health_route;
pub mod index;
pub mod ingest;
pub mod reset_route;
