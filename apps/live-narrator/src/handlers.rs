pub mod connect;
pub mod health;
pub mod ws;
