//! Shared helpers for the SeaORM repositories.

use omr_domain::error::Error;

pub(crate) fn db_err<E>(context: &str, source: E) -> Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    Error::Database {
        message: context.to_owned(),
        source: Some(Box::new(source)),
    }
}
