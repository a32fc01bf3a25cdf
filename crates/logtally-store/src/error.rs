use std::io;

use thiserror::Error;

/// Storage failures
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("failed to encode record: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("corrupt record at line {line}: {source}")]
    Corrupt {
        line: u64,
        #[source]
        source: serde_json::Error,
    },

    #[error("store rejected batch {batch}")]
    Injected { batch: u64 },
}
