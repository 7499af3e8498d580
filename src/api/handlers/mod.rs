//! Each handler module exposes plain operations taking `&AppState`, used by
//! both the REST routes and the `/rpc` dispatcher, plus the axum wrappers.

pub mod generate;
pub mod health;
pub mod network;
pub mod session;
pub mod waits;
