pub mod types;
pub mod client;
pub mod directory;

pub use types::{Privacy, RoomListFilter, RoomSummary, UpdateRoomRequest};
pub use client::{HipChatClient, TlsVerification};
pub use directory::{DirectoryError, RoomDirectory};
