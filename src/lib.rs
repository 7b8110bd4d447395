//! SmartBin dashboard: polls the SmartBin telemetry API and renders
//! fill-level status cards in the terminal or a local web page.

pub mod api;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod diagnostics;
pub mod render;
pub mod view;
pub mod web;
