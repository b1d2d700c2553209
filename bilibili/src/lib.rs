//! Client library for the bilibili video platform.
//!
//! Covers the pieces a downloader needs: the av/bv identifier codec
//! ([`ids`]), qr code login with session persistence ([`login`],
//! [`session`]), and metadata plus stream resolution ([`resolve`]).
//! Everything network goes through a [`Client`], which is blocking and
//! reuses one connection pool.

pub mod ids;
pub mod login;
pub mod qr;
pub mod resolve;
pub mod season;
pub mod session;
pub mod video;

mod client;
mod error;

pub use client::{Client, MediaStream, NavInfo};
pub use error::{Error, Result};
