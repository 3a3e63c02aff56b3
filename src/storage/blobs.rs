//! Blob storage: uploaded photos as plain files.
//!
//! A blob's URI is `<public-base-url>/<name>` when a base URL is configured,
//! so whatever serves the blob directory makes the link publicly readable.
//! Without one, the URI is a `file://` path.

use std::{fs, io};

use super::{BlobStore, Result, Storage};

impl BlobStore for Storage {
    fn upload(&self, bytes: &[u8], name: &str) -> Result<String> {
        if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid blob name: {name:?}"),
            )
            .into());
        }

        let path = self.blob_dir().join(name);
        fs::write(&path, bytes)?;

        Ok(match &self.public_base_url {
            Some(base) => format!("{base}/{name}"),
            None => format!("file://{}", path.display()),
        })
    }
}
