pub mod app;
pub mod commands;
pub mod controllers;
pub mod models;
pub mod seeders;
pub mod services;
pub mod workers;
