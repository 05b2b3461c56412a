//! Rollback-guaranteed Postgres transactions for tests.
//!
//! [`TestDb`] opens one connection, begins one transaction, and hands the
//! test a handle that is safe to share across threads. Every operation on
//! the handle runs inside that transaction, and dropping the handle rolls
//! the transaction back, so tests can run real queries against a shared
//! database without leaving state behind.
//!
//! ```no_run
//! use txguard::{Config, TestDb};
//!
//! let db = TestDb::connect(Config::from_env());
//! db.batch_execute("CREATE TABLE visitors (id INT PRIMARY KEY, name TEXT)")
//!     .unwrap();
//! db.execute(
//!     "INSERT INTO visitors (id, name) VALUES ($1, $2)",
//!     &[&1_i32, &"ada"],
//! )
//! .unwrap();
//! let row = db
//!     .query_one("SELECT name FROM visitors WHERE id = $1", &[&1_i32])
//!     .unwrap();
//! assert_eq!(row.get::<_, String>(0), "ada");
//! // dropping `db` rolls everything back
//! ```

mod config;
mod error;
mod guard;

pub use config::{AccessMode, Config, IsolationLevel, POSTGRES_URL_ENV, TxOptions};
pub use error::{RollbackError, SetupError};
pub use guard::TestDb;
