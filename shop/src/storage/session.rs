use async_trait::async_trait;
use sea_orm::{
    ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbBackend, DbErr, ExecResult,
    QueryResult, Statement, TransactionTrait,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, trace};

/// Request-scoped database handle.
///
/// Every repository call receives a `&Session` explicitly. The session owns
/// one database transaction for its whole lifetime and counts the
/// statements issued through it. Dropping a session without calling
/// [`Session::commit`] rolls the transaction back.
pub struct Session {
    txn: DatabaseTransaction,
    label: &'static str,
    statements: AtomicUsize,
}

impl Session {
    pub async fn begin(db: &DatabaseConnection, label: &'static str) -> Result<Self, DbErr> {
        let txn = db.begin().await?;
        debug!(session = label, "Session opened");
        Ok(Self {
            txn,
            label,
            statements: AtomicUsize::new(0),
        })
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Statements executed so far in this session.
    pub fn statement_count(&self) -> usize {
        self.statements.load(Ordering::Relaxed)
    }

    /// Commits the transaction and returns the number of statements it ran.
    pub async fn commit(self) -> Result<usize, DbErr> {
        let statements = self.statement_count();
        self.txn.commit().await?;
        debug!(session = self.label, statements, "Session committed");
        Ok(statements)
    }

    pub async fn rollback(self) -> Result<(), DbErr> {
        let statements = self.statement_count();
        self.txn.rollback().await?;
        debug!(session = self.label, statements, "Session rolled back");
        Ok(())
    }

    fn record(&self, sql: &str) {
        let n = self.statements.fetch_add(1, Ordering::Relaxed) + 1;
        trace!(session = self.label, statement = n, sql, "Executing statement");
    }
}

#[async_trait]
impl ConnectionTrait for Session {
    fn get_database_backend(&self) -> DbBackend {
        self.txn.get_database_backend()
    }

    async fn execute(&self, stmt: Statement) -> Result<ExecResult, DbErr> {
        self.record(&stmt.sql);
        self.txn.execute(stmt).await
    }

    async fn execute_unprepared(&self, sql: &str) -> Result<ExecResult, DbErr> {
        self.record(sql);
        self.txn.execute_unprepared(sql).await
    }

    async fn query_one(&self, stmt: Statement) -> Result<Option<QueryResult>, DbErr> {
        self.record(&stmt.sql);
        self.txn.query_one(stmt).await
    }

    async fn query_all(&self, stmt: Statement) -> Result<Vec<QueryResult>, DbErr> {
        self.record(&stmt.sql);
        self.txn.query_all(stmt).await
    }

    fn support_returning(&self) -> bool {
        self.txn.support_returning()
    }
}
