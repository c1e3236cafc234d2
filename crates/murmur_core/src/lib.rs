/*
 * SPDX-FileCopyrightText: 2026 RedHunt07 - FEDI3 Project
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use anyhow::Result;
use std::sync::Arc;

pub mod activity;
pub mod api;
pub mod config;
pub mod counters;
pub mod directory;
pub mod feed;
pub mod ledger;
pub mod notifier;
pub mod outcome;
pub mod social_db;
pub mod store;
pub mod views;

use config::ServiceConfig;
use counters::LikeCounter;
use directory::Directory;
use feed::Feed;
use ledger::Ledger;
use social_db::SocialDb;
use store::SocialStore;

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Writers, readers and the directory wired to one store.
#[derive(Clone)]
pub struct Engine {
    store: Arc<dyn SocialStore>,
    pub ledger: Ledger,
    pub feed: Feed,
    pub directory: Directory,
}

impl Engine {
    pub fn new(store: Arc<dyn SocialStore>) -> Self {
        let ledger = Ledger::new(store.clone());
        Self {
            feed: Feed::new(store.clone()),
            directory: Directory::new(store.clone(), ledger.clone()),
            ledger,
            store,
        }
    }

    pub fn open(cfg: &ServiceConfig) -> Result<Self> {
        let db = SocialDb::open(&cfg.db_path)?;
        Ok(Self::new(Arc::new(db)).with_page_sizes(cfg.default_page_size, cfg.max_page_size))
    }

    pub fn with_page_sizes(mut self, default_page_size: u32, max_page_size: u32) -> Self {
        self.feed = self.feed.with_page_sizes(default_page_size, max_page_size);
        self.directory = self.directory.with_page_sizes(default_page_size, max_page_size);
        self
    }

    pub fn store(&self) -> &Arc<dyn SocialStore> {
        &self.store
    }

    pub fn likes(&self) -> &LikeCounter {
        self.ledger.like_counter()
    }
}
