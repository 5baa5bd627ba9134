pub mod catalog;
pub mod config;
pub mod db;
pub mod dto;
pub mod email;
pub mod entity;
pub mod error;
pub mod models;
pub mod payments;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;
