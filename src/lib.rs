//! Client SDK for a customer support service desk.
//!
//! [`ServiceDesk`] is the entry point: it reads the user's feed and tickets,
//! creates tickets and posts comments with file attachments, keeps an offline
//! copy of what it has seen and relays live updates to subscribers.

pub mod api;
pub mod config;
pub mod data;
pub mod files;
pub mod repository;
pub mod response;
pub mod sdk;
pub mod storage;
pub mod sync;
pub mod updates;
pub mod upload;
pub mod utils;

#[cfg(test)]
mod test_support;

pub use config::{ConfigError, SdkConfig};
pub use data::{Attachment, Comment, Ticket, TicketDescription, TicketId, TicketShortDescription};
pub use response::{Response, ResponseError};
pub use sdk::{SdkError, ServiceDesk};
pub use upload::{SharedHooks, UploadFileHooks, UploadHooks};
