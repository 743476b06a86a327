use thiserror::Error;

pub type Error = anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// The failures a storage backend reports to its caller. Decoding problems and an unavailable
/// engine are not here: backends and the selector recover from those and log them instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("An entity with id {0} already exists")]
    DuplicateId(i32),
    #[error("A budget for category {category_id} in {month_year} already exists")]
    DuplicateKey { category_id: i32, month_year: String },
    #[error("Not found")]
    NotFound,
    #[error("Unable to persist the collection: {0}")]
    Persist(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("The engine handle has already been released")]
    Released,
}

impl StoreError {
    /// Builds a `Persist` error that keeps the whole `anyhow` context chain.
    pub(crate) fn persist(e: &Error) -> Self {
        StoreError::Persist(format!("{e:#}"))
    }
}
