// Copyright 2024 The playattest Authors.
// SPDX-License-Identifier: Apache-2.0

use super::errors::Error;
use super::ledger::NonceLedger;
use super::INonceStore;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

/// A nonce store backed by a JSON document on the local file system.
///
/// Writes go to a sibling temporary file which is then renamed over the
/// target, so a reader never observes a half-written document.
#[derive(Debug, Clone)]
pub struct FileNonceStore {
    path: PathBuf,
}

impl FileNonceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut p = self.path.clone().into_os_string();
        p.push(".tmp");
        PathBuf::from(p)
    }
}

#[async_trait]
impl INonceStore for FileNonceStore {
    async fn load(&self) -> Result<NonceLedger, Error> {
        match fs::read_to_string(&self.path).await {
            Ok(j) => NonceLedger::parse(&j),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(NonceLedger::new()),
            Err(e) => Err(Error::Io(format!("{}: {e}", self.path.display()))),
        }
    }

    async fn save(&self, ledger: &NonceLedger) -> Result<(), Error> {
        let j = ledger.to_json()?;
        let tmp = self.tmp_path();

        fs::write(&tmp, j)
            .await
            .map_err(|e| Error::Io(format!("{}: {e}", tmp.display())))?;

        fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| Error::Io(format!("{}: {e}", self.path.display())))
    }
}
