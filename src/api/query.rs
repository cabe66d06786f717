use crate::error::BoxError;
use crate::source::RowSource;
use crate::value::Value;

/// The `Querier` trait is implemented by whatever can run a query and hand
/// back its rows: a connection, a pool, a transaction.
pub trait Querier {
    type Rows: RowSource;

    fn query(&self, sql: &str, args: &[Value]) -> Result<Self::Rows, BoxError>;
}
