//! Database layer for data persistence and access.
//!
//! SQLite through SQLx, organised as repositories over table models:
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  (API request handlers)
//! └──────┬──────┘
//!        ↓
//! ┌─────────────┐
//! │ Repositories│  (db::handlers - queries)
//! └──────┬──────┘
//!        ↓
//! ┌─────────────┐
//! │   Models    │  (db::models - database records)
//! └──────┬──────┘
//!        ↓
//! ┌─────────────┐
//! │   SQLite    │
//! └─────────────┘
//! ```
//!
//! Repositories borrow a `SqliteConnection`, so they work equally over a pooled connection
//! or an open transaction:
//!
//! ```ignore
//! use attrition::db::handlers::{Employees, Repository};
//!
//! let mut tx = pool.begin().await?;
//! let mut repo = Employees::new(&mut tx);
//! let employee = repo.create(&request).await?;
//! tx.commit().await?;
//! ```

pub mod errors;
pub mod handlers;
pub mod models;
