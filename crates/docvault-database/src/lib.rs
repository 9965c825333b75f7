//! # docvault-database
//!
//! Persistence contracts for resources, grants, share tokens, and the
//! group/role directory, with two backends: [`MemoryStore`], an arena with
//! copy-on-write transactions, and [`PgStore`] on PostgreSQL.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod postgres;
pub mod store;

pub use connection::open_postgres;
pub use memory::{MemoryArena, MemoryStore};
pub use postgres::PgStore;
pub use store::{
    DeleteSummary, DirectoryRepository, GrantRepository, ResourceRepository, ShareTokenRepository,
    Store, StoreHealth,
};
