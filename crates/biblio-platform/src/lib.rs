//! # biblio-platform
//!
//! In-process services agents depend on: a capability directory, mailboxes
//! with selective receive, and notification sinks for observers.
//!
//! ```rust
//! use biblio_platform::Platform;
//! use biblio_proto::{AgentId, Capability};
//!
//! let platform = Platform::default();
//! let clerk = platform.attach(AgentId::new("clerk").unwrap()).unwrap();
//! clerk.register(&Capability::library_service(), "Library clerk").unwrap();
//!
//! let reader = platform.attach(AgentId::new("reader").unwrap()).unwrap();
//! let clerks = reader.discover(&Capability::library_service()).unwrap();
//! assert_eq!(clerks, vec![clerk.id().clone()]);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod directory;
pub mod error;
pub mod mailbox;
pub mod platform;
pub mod post_office;
pub mod sink;

pub use directory::{Directory, InMemoryDirectory, Registration};
pub use error::PlatformError;
pub use mailbox::Mailbox;
pub use platform::{AgentContext, Platform};
pub use post_office::{PostOffice, Transport};
pub use sink::{
    CompositeSink, EventLog, Notification, NotificationCategory, NotificationSink, TracingSink,
};
