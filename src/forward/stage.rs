//! Request body staging.
//!
//! Mutating requests with opaque bodies are written to temporary storage
//! before the backend call, so the upload never has to fit in memory. The
//! temp file is anonymous (unlinked at creation), which makes release
//! unconditional: whenever the handle drops, on any path, the data is gone.

use std::path::Path;

use axum::body::Body;
use futures_util::TryStreamExt;
use tokio::io::{AsyncSeekExt, AsyncWriteExt};
use tokio_util::io::ReaderStream;

use crate::error::ApiError;

/// Read-back granularity for staged bodies.
pub const CHUNK_SIZE: usize = 40 * 1024;

/// A request body materialized in temporary storage, rewound for
/// sequential reads.
pub struct StagedBody {
    file: tokio::fs::File,
    len: u64,
}

impl StagedBody {
    /// Drain `body` into an anonymous temp file and reopen it for reading.
    pub async fn stage(body: Body, staging_dir: Option<&Path>) -> Result<Self, ApiError> {
        let std_file = match staging_dir {
            Some(dir) => tempfile::tempfile_in(dir)?,
            None => tempfile::tempfile()?,
        };
        let mut file = tokio::fs::File::from_std(std_file);

        let mut stream = body.into_data_stream();
        let mut len: u64 = 0;
        while let Some(chunk) = stream
            .try_next()
            .await
            .map_err(|e| ApiError::Io(std::io::Error::other(e)))?
        {
            file.write_all(&chunk).await?;
            len += chunk.len() as u64;
        }
        file.flush().await?;
        file.rewind().await?;

        Ok(Self { file, len })
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Consume the staged body into a streaming request body.
    pub fn into_body(self) -> Body {
        Body::from_stream(ReaderStream::with_capacity(self.file, CHUNK_SIZE))
    }
}
