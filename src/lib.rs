//! Tradepost - Marketplace Core
//!
//! This crate implements the core of a marketplace where sellers list items
//! and buyers submit monetary offers, with a seller accepting at most one
//! offer per listing. It provides a concurrent, time-windowed login-failure
//! limiter and an offer lifecycle engine that keeps listing aggregates
//! consistent under parallel requests. HTTP handling, rendering, credential
//! verification, and durable storage are external collaborators.

pub mod config;
pub mod error;
pub mod market;
pub mod ratelimit;
