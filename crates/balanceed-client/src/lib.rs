//! BalancEED API client
//!
//! REST client, session identity, realtime chat channel and the view/form
//! controllers built on top of them.

pub mod api;
pub mod chat;
pub mod controllers;
pub mod session;

pub use api::ApiClient;
pub use chat::{ChatRooms, MessageLog, RoomChannel};
pub use controllers::{BrainTraining, Contact, Dashboard, Donations, Pathways, StudentLog, Survey};
pub use session::{
    FileStorage, Identity, MemoryStorage, Session, SessionStorage, TOKEN_KEY, USER_KEY,
};
