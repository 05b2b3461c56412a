use std::{
    sync::{Mutex, MutexGuard, PoisonError},
    thread,
};

use postgres::{
    Client, NoTls, Row,
    binary_copy::BinaryCopyInWriter,
    types::{ToSql, Type},
};

use crate::{
    config::Config,
    error::{RollbackError, SetupError},
};

const ROLLBACK_SQL: &str = "ROLLBACK";

/// A single test transaction behind an exclusive lock.
///
/// The handle keeps exactly one connection with one open transaction, so
/// everything the test does can be rolled back as a unit. It is similar to
/// a pool handle except that all traffic is serialized onto the one
/// connection, which is slower and only suitable for tests.
///
/// Dropping the handle rolls the transaction back. A rollback failure
/// panics (unless the thread is already panicking), so a fixture that could
/// not be undone still fails the test.
pub struct TestDb<'c> {
    conn: Mutex<Conn<'c>>,
}

enum Conn<'c> {
    Owned(Client),
    Borrowed(&'c mut Client),
}

impl Conn<'_> {
    fn client(&mut self) -> &mut Client {
        match self {
            Conn::Owned(client) => client,
            Conn::Borrowed(client) => client,
        }
    }
}

impl TestDb<'static> {
    /// Dials `config.url` and begins the test transaction.
    ///
    /// # Panics
    ///
    /// Panics on a missing url, a connection failure or timeout, or a
    /// failed `BEGIN`. Setup failures are fatal for the enclosing test;
    /// no transaction is left behind.
    #[must_use]
    pub fn connect(config: Config) -> TestDb<'static> {
        match Self::establish(&config) {
            Ok(db) => db,
            Err(error) => panic!("{error}"),
        }
    }

    fn establish(config: &Config) -> Result<TestDb<'static>, SetupError> {
        let url = config.url.as_deref().ok_or(SetupError::MissingUrl)?;

        let mut pg_config = url
            .parse::<postgres::Config>()
            .map_err(|source| connect_error(config, source))?;
        pg_config.connect_timeout(config.timeout);
        // Bounds later BEGIN/ROLLBACK round trips against a dead peer.
        pg_config.tcp_user_timeout(config.timeout);

        let mut client = pg_config
            .connect(NoTls)
            .map_err(|source| connect_error(config, source))?;
        begin(&mut client, config)?;

        Ok(TestDb {
            conn: Mutex::new(Conn::Owned(client)),
        })
    }
}

impl<'c> TestDb<'c> {
    /// Begins the test transaction on a caller-supplied client.
    ///
    /// The caller keeps ownership: once the handle is dropped the client is
    /// usable again, with the transaction rolled back. `config.url` is
    /// ignored here.
    ///
    /// # Panics
    ///
    /// Panics if `BEGIN` fails.
    #[must_use]
    pub fn on_client(client: &'c mut Client, config: Config) -> TestDb<'c> {
        if let Err(error) = begin(client, &config) {
            panic!("{error}");
        }
        TestDb {
            conn: Mutex::new(Conn::Borrowed(client)),
        }
    }

    /// Executes a statement and returns the number of rows affected.
    pub fn execute(
        &self,
        query: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<u64, postgres::Error> {
        self.lock().client().execute(query, params)
    }

    /// Runs a query and returns the resulting rows.
    ///
    /// Rows are collected under the lock; the sync driver's lazy row
    /// iterator would have to keep the connection locked across caller
    /// iteration.
    pub fn query(
        &self,
        query: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Vec<Row>, postgres::Error> {
        self.lock().client().query(query, params)
    }

    /// Runs a query expected to return exactly one row.
    pub fn query_one(
        &self,
        query: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Row, postgres::Error> {
        self.lock().client().query_one(query, params)
    }

    /// Runs a query expected to return zero or one row.
    pub fn query_opt(
        &self,
        query: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Option<Row>, postgres::Error> {
        self.lock().client().query_opt(query, params)
    }

    /// Executes a semicolon-separated script, e.g. a schema fixture.
    pub fn batch_execute(&self, sql: &str) -> Result<(), postgres::Error> {
        self.lock().client().batch_execute(sql)
    }

    /// Bulk-loads rows into `table` through binary `COPY ... FROM STDIN`.
    ///
    /// `table` is given as identifier parts (`&["schema", "name"]` or just
    /// `&["name"]`). Column types are resolved from the table itself, so
    /// the target may have been created earlier in this transaction. The
    /// row-source is any iterator of parameter slices, one per row, each
    /// matching `columns` in order and length.
    ///
    /// Returns the number of rows written.
    pub fn copy_from<'r, I>(
        &self,
        table: &[&str],
        columns: &[&str],
        rows: I,
    ) -> Result<u64, postgres::Error>
    where
        I: IntoIterator<Item = &'r [&'r (dyn ToSql + Sync)]>,
    {
        let mut conn = self.lock();
        let client = conn.client();

        let table = qualified_name(table);
        let column_list = columns
            .iter()
            .map(|column| quote_identifier(column))
            .collect::<Vec<_>>()
            .join(", ");

        let probe = client.prepare(&format!("SELECT {column_list} FROM {table} LIMIT 0"))?;
        let types = probe
            .columns()
            .iter()
            .map(|column| column.type_().clone())
            .collect::<Vec<Type>>();

        let copy_sql = format!("COPY {table} ({column_list}) FROM STDIN WITH (FORMAT binary)");
        let sink = client.copy_in(copy_sql.as_str())?;
        let mut writer = BinaryCopyInWriter::new(sink, &types);
        for row in rows {
            writer.write(row)?;
        }
        writer.finish()
    }

    fn lock(&self) -> MutexGuard<'_, Conn<'c>> {
        // A panic while the lock was held cannot tear client-side state, so
        // the poisoned value is taken as-is and the error (if any) keeps
        // flowing through the driver.
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for TestDb<'_> {
    fn drop(&mut self) {
        let conn = self
            .conn
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        if let Err(source) = conn.client().batch_execute(ROLLBACK_SQL) {
            let error = RollbackError {
                source: Box::new(source),
            };
            if thread::panicking() {
                eprintln!("{error}");
            } else {
                panic!("{error}");
            }
        }
    }
}

fn begin(client: &mut Client, config: &Config) -> Result<(), SetupError> {
    let begin_sql = config.tx.begin_sql();
    match client.batch_execute(&begin_sql) {
        Ok(()) => Ok(()),
        Err(source) => Err(SetupError::Begin {
            begin_sql,
            source: Box::new(source),
        }),
    }
}

fn connect_error(config: &Config, source: postgres::Error) -> SetupError {
    SetupError::Connect {
        timeout: config.timeout,
        source: Box::new(source),
    }
}

fn qualified_name(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|part| quote_identifier(part))
        .collect::<Vec<_>>()
        .join(".")
}

fn quote_identifier(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}
