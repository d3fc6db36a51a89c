//! Conduit - article query and aggregation engine
//!
//! This library implements the article listing, feed and favorite
//! aggregation core of a social blogging API. HTTP routing, JWT
//! authentication, request validation and the user/profile subsystem live
//! in the embedding application and talk to this crate through the
//! service layer.

pub mod config;
pub mod db;
pub mod models;
pub mod services;
