use thiserror::Error;

pub type ShoprecResult<T> = Result<T, ShoprecError>;

#[derive(Error, Debug)]
pub enum ShoprecError {
    #[error("Empty dataset: {0}")]
    EmptyDataset(String),

    #[error("Invalid threshold: {0}")]
    InvalidThreshold(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Mining cancelled before level {0}")]
    Cancelled(usize),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_errors_convert() {
        let io = std::io::Error::from(std::io::ErrorKind::NotFound);
        let err: ShoprecError = io.into();
        assert!(matches!(err, ShoprecError::Io(_)));
        assert!(err.to_string().starts_with("IO error:"));
    }
}
