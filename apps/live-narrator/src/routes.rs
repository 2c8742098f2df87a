pub mod connect;
pub mod health;
pub mod metrics;
pub mod ws;
