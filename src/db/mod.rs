//! Database layer
//!
//! SQLite (default, single-file deployments) and MySQL behind one
//! `DatabasePool` abstraction, embedded migrations, and the generic
//! entity repository that backs every listing.
//!
//! ```ignore
//! use charitas::config::DatabaseConfig;
//! use charitas::db::{create_pool, migrations};
//!
//! let pool = create_pool(&DatabaseConfig::default()).await?;
//! migrations::run_migrations(&pool).await?;
//! pool.ping().await?;
//! ```

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{
    create_pool, create_test_pool, mysql_pool, sqlite_pool, DatabasePool, DynDatabasePool,
    MysqlDatabase, SqliteDatabase,
};
