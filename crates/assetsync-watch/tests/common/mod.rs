//! Shared fixtures for integration tests.

#![allow(dead_code)]

use assetsync_core::test_support::{MockCatalogClient, MockImageTransform};
use assetsync_core::{IdentityCodec, IdentityToken};
use assetsync_watch::{EngineOptions, SyncEngine, SyncHandler};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// A structurally valid JPEG whose pixel data depends on `seed`.
pub fn jpeg(seed: u8) -> Vec<u8> {
    vec![
        0xFF, 0xD8, // SOI
        0xFF, 0xE0, 0x00, 0x07, b'J', b'F', b'I', b'F', 0x00, // APP0
        0xFF, 0xDB, 0x00, 0x03, seed, // DQT
        0xFF, 0xDA, 0x00, 0x02, seed, 0x11, 0x22, // SOS + scan data
        0xFF, 0xD9, // EOI
    ]
}

/// [`jpeg`] carrying `token`.
pub fn tagged_jpeg(seed: u8, token: &str) -> Vec<u8> {
    let token = IdentityToken::new(token).unwrap();
    IdentityCodec::write(&jpeg(seed), &token).unwrap()
}

/// Token embedded in the file at `path`.
pub fn token_in(path: &Path) -> Option<IdentityToken> {
    IdentityCodec::read(&fs::read(path).unwrap())
}

/// A temp tree, an engine over it and a handler wired to mocks.
pub struct Harness {
    pub temp: TempDir,
    pub catalog: MockCatalogClient,
    pub transform: MockImageTransform,
    pub handler: SyncHandler,
}

impl Harness {
    pub async fn new(files: &[(&str, Vec<u8>)]) -> Self {
        Self::with_catalog(files, MockCatalogClient::new()).await
    }

    pub async fn with_catalog(files: &[(&str, Vec<u8>)], catalog: MockCatalogClient) -> Self {
        let temp = TempDir::new().unwrap();
        for (name, bytes) in files {
            let path = temp.path().join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, bytes).unwrap();
        }

        let engine = SyncEngine::initialize(temp.path(), EngineOptions::default())
            .await
            .unwrap();
        let transform = MockImageTransform::new(temp.path());
        let handler = SyncHandler::new(
            engine,
            Arc::new(catalog.clone()),
            Arc::new(transform.clone()),
        );

        Self {
            temp,
            catalog,
            transform,
            handler,
        }
    }

    pub fn engine(&self) -> &SyncEngine {
        self.handler.engine()
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.temp.path().join(name)
    }

    pub fn generated(&self, name: &str) -> PathBuf {
        self.temp.path().join("watermarked").join(name)
    }
}
