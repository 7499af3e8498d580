pub mod action;
pub mod element;
pub mod network;
pub mod requests;
pub mod responses;
pub mod session;

pub use action::*;
pub use element::*;
pub use network::*;
pub use requests::*;
pub use responses::*;
pub use session::*;
