//! HTTP surface of the AmuseFit verification service

pub mod app;
pub mod dto;
pub mod handlers;
pub mod i18n;
pub mod logging;
pub mod middleware;
pub mod routes;
