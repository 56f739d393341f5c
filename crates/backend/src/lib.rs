//! Client for the hosted backend platform.
//!
//! The platform owns identity (`/auth/v1/…`) and persistence (`/rest/v1/…`,
//! PostgREST-style row access). Everything this service knows about users,
//! agents, and chat history goes through the [`PlatformStore`] trait so the
//! gateway can run against an in-memory fake in tests.

pub mod rest;
pub mod store;
pub mod types;

// Re-exports for convenience.
pub use rest::RestPlatformClient;
pub use store::PlatformStore;
pub use types::{
    AgentFilter, AgentPatch, FileExcerpt, HistoryTurn, NewAgent, NewInteraction, UserIdentity,
};
