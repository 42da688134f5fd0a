pub mod account;
pub mod admin;
pub mod app;
pub mod auth;
pub mod config;
pub mod db;
pub mod dto;
pub mod error;
pub mod extract;
pub mod ledger;
pub mod mail;
pub mod state;
pub mod store;
pub mod telemetry;
