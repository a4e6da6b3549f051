#![doc = "note-autopost-core: core logic library for note-autopost."]

//! This crate contains the whole autopost pipeline: generating an article, rendering its markup
//! to HTML, harvesting a logged-in platform session, and publishing through the platform API.
//! The CLI crate only parses arguments, loads configuration and wires real clients together.
//!
//! # Usage
//! Build an [`config::AutopostConfig`], construct the three collaborators (or mocks from
//! [`contract`]), and call [`autopost::autopost`].

pub mod autopost;
pub mod config;
pub mod contract;
pub mod error;
pub mod generate;
pub mod publish;
pub mod render;
pub mod session;
