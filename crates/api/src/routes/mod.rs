//! HTTP routes

pub mod capture;
pub mod gallery;
