use thiserror::Error;

/// Failures surfaced by a [`crate::UsageStore`].
///
/// The dashboard reports these two kinds differently: a connection failure
/// stops the page from rendering, an insert failure only discards the
/// upload.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    Connection(#[source] sqlx::Error),

    #[error("{0}")]
    Insert(#[source] sqlx::Error),
}
