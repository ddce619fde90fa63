pub mod alert;
pub mod config;
pub mod dashboard;
pub mod dev_mode;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod sites;
pub mod verify;
