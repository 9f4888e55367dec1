//! AGE client over a single PostgreSQL connection
//!
//! Statements run inside a transaction that is opened lazily and stays open
//! until `commit`, the same way a non-autocommit DB-API connection behaves.

use agstore_core::{GraphError, GraphStoreConfig, Result};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgConnection, PgRow};
use sqlx::{Connection, Executor, Row};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{agtype, cypher};

/// One result row: a decoded agtype value per requested column
pub type AgRow = Vec<Value>;

/// Column list used when the caller does not name any
const DEFAULT_COLUMNS: &[&str] = &["v"];

/// Capability the graph store needs from the underlying engine
#[async_trait]
pub trait GraphClient: Send + Sync {
    /// Connect to the graph named in `config`
    async fn connect(config: &GraphStoreConfig) -> Result<Self>
    where
        Self: Sized;

    /// Run a Cypher statement.
    ///
    /// `query` uses `%s` positional placeholders that are filled from
    /// `params` as quoted string literals. `columns` names the result
    /// columns; an empty slice means a single `v` column.
    async fn execute(&self, query: &str, columns: &[&str], params: &[&str]) -> Result<Vec<AgRow>>;

    /// Commit the open transaction, if any
    async fn commit(&self) -> Result<()>;

    /// Drop a whole graph with everything in it
    async fn delete_graph(&self, graph_name: &str) -> Result<()>;
}

struct Session {
    conn: PgConnection,
    in_transaction: bool,
}

impl Session {
    async fn begin_if_needed(&mut self) -> Result<()> {
        if !self.in_transaction {
            (&mut self.conn).execute("BEGIN").await?;
            self.in_transaction = true;
        }
        Ok(())
    }

    async fn commit(&mut self) -> Result<()> {
        if self.in_transaction {
            (&mut self.conn).execute("COMMIT").await?;
            self.in_transaction = false;
        }
        Ok(())
    }

    /// An aborted transaction rejects every later statement, so drop it
    async fn recover(&mut self) {
        if !self.in_transaction {
            return;
        }
        self.in_transaction = false;
        if let Err(e) = (&mut self.conn).execute("ROLLBACK").await {
            warn!(error = %e, "rollback after failed statement failed");
        }
    }
}

/// Production [`GraphClient`] for PostgreSQL with the AGE extension
pub struct AgeClient {
    session: Mutex<Session>,
    graph_name: String,
}

impl AgeClient {
    /// Close the connection, discarding any uncommitted work
    pub async fn close(self) -> Result<()> {
        let session = self.session.into_inner();
        session.conn.close().await?;
        Ok(())
    }

    /// Load AGE into the session and make sure the graph exists
    async fn setup(conn: &mut PgConnection, graph_name: &str) -> Result<()> {
        (&mut *conn).execute("LOAD 'age'").await?;
        (&mut *conn)
            .execute(r#"SET search_path = ag_catalog, "$user", public"#)
            .await?;

        let row = (&mut *conn)
            .fetch_one(
                sqlx::query(
                    "SELECT EXISTS (SELECT 1 FROM ag_catalog.ag_graph WHERE name = $1::name)",
                )
                .bind(graph_name.to_string()),
            )
            .await?;
        let exists: bool = row.try_get(0)?;

        if !exists {
            (&mut *conn)
                .execute(
                    sqlx::query("SELECT ag_catalog.create_graph($1::name)")
                        .bind(graph_name.to_string()),
                )
                .await?;
            info!(graph = %graph_name, "created graph");
        }

        Ok(())
    }
}

/// Wrap Cypher text in the SQL call AGE expects, casting every column to text
pub(crate) fn build_sql(graph_name: &str, cypher_text: &str, columns: &[&str]) -> String {
    let columns = if columns.is_empty() {
        DEFAULT_COLUMNS
    } else {
        columns
    };

    let select = columns
        .iter()
        .map(|c| format!("{}::text", cypher::sql_identifier(c)))
        .collect::<Vec<_>>()
        .join(", ");
    let definition = columns
        .iter()
        .map(|c| format!("{} agtype", cypher::sql_identifier(c)))
        .collect::<Vec<_>>()
        .join(", ");
    let tag = cypher::dollar_tag(cypher_text);

    format!(
        "SELECT {select} FROM ag_catalog.cypher({graph}, {tag} {cypher_text} {tag}) AS ({definition})",
        graph = cypher::sql_literal(graph_name),
    )
}

fn decode_row(row: &PgRow, width: usize) -> Result<AgRow> {
    (0..width)
        .map(|i| {
            let text: Option<String> = row.try_get(i)?;
            agtype::parse_opt(text.as_deref())
        })
        .collect()
}

#[async_trait]
impl GraphClient for AgeClient {
    async fn connect(config: &GraphStoreConfig) -> Result<Self> {
        let options = config.connect_options()?;

        let mut conn = match PgConnection::connect_with(&options).await {
            Ok(conn) => conn,
            Err(e) => {
                warn!(error = %e, "PostgreSQL connection failed");
                return Err(GraphError::Connection);
            }
        };

        if let Err(e) = Self::setup(&mut conn, &config.graph_name).await {
            warn!(error = %e, graph = %config.graph_name, "AGE session setup failed");
            return Err(GraphError::Connection);
        }

        info!(graph = %config.graph_name, "connected to AGE");

        Ok(Self {
            session: Mutex::new(Session {
                conn,
                in_transaction: false,
            }),
            graph_name: config.graph_name.clone(),
        })
    }

    async fn execute(&self, query: &str, columns: &[&str], params: &[&str]) -> Result<Vec<AgRow>> {
        let cypher_text = cypher::render(query, params)?;
        let sql = build_sql(&self.graph_name, &cypher_text, columns);
        debug!(graph = %self.graph_name, cypher = %cypher_text.trim(), "executing cypher");

        let mut session = self.session.lock().await;
        session.begin_if_needed().await?;

        let rows = match (&mut session.conn).fetch_all(sql.as_str()).await {
            Ok(rows) => rows,
            Err(e) => {
                session.recover().await;
                return Err(e.into());
            }
        };

        let width = columns.len().max(1);
        rows.iter().map(|row| decode_row(row, width)).collect()
    }

    async fn commit(&self) -> Result<()> {
        let mut session = self.session.lock().await;
        session.commit().await
    }

    async fn delete_graph(&self, graph_name: &str) -> Result<()> {
        let mut session = self.session.lock().await;

        let dropped = (&mut session.conn)
            .execute(
                sqlx::query("SELECT ag_catalog.drop_graph($1::name, true)")
                    .bind(graph_name.to_string()),
            )
            .await;
        if let Err(e) = dropped {
            session.recover().await;
            return Err(e.into());
        }

        session.commit().await?;
        info!(graph = %graph_name, "dropped graph");
        Ok(())
    }
}
