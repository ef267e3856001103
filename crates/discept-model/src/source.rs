//! Readable text resources: files on disk or text already in memory.

use std::future::Future;
use std::path::{Path, PathBuf};

use discept_core::Result;

/// Something whose full text content can be read asynchronously.
pub trait TextResource {
    fn read_text(&self) -> impl Future<Output = Result<String>> + Send;
}

impl TextResource for Path {
    fn read_text(&self) -> impl Future<Output = Result<String>> + Send {
        async move { Ok(tokio::fs::read_to_string(self).await?) }
    }
}

impl TextResource for PathBuf {
    fn read_text(&self) -> impl Future<Output = Result<String>> + Send {
        self.as_path().read_text()
    }
}

impl TextResource for str {
    fn read_text(&self) -> impl Future<Output = Result<String>> + Send {
        std::future::ready(Ok(self.to_string()))
    }
}

impl TextResource for String {
    fn read_text(&self) -> impl Future<Output = Result<String>> + Send {
        self.as_str().read_text()
    }
}
