//! # IO Layer
//!
//! Interfaces exposing the domain services to clients. Only REST is
//! provided.

pub mod rest;
