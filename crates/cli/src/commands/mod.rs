//! CLI Commands

pub mod auth;
pub mod contact;
pub mod service;
pub mod vm;
