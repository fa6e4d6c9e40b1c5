// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory document store for tests and offline development.

use super::{DocumentStore, StoreError};
use crate::models::{NewProfile, UserProfile};
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// Deterministic store: every write advances a logical clock by one second.
pub struct MockProfileStore {
    docs: Mutex<HashMap<String, UserProfile>>,
    ticks: AtomicUsize,
    reads: AtomicUsize,
    writes: AtomicUsize,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl Default for MockProfileStore {
    fn default() -> Self {
        Self {
            docs: Mutex::new(HashMap::new()),
            ticks: AtomicUsize::new(0),
            reads: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
        }
    }
}

impl MockProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent read fail.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent write fail.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Insert a document directly, bypassing counters.
    pub fn insert(&self, profile: UserProfile) {
        self.docs
            .lock()
            .unwrap()
            .insert(profile.uid.clone(), profile);
    }

    pub fn profile(&self, uid: &str) -> Option<UserProfile> {
        self.docs.lock().unwrap().get(uid).cloned()
    }

    pub fn len(&self) -> usize {
        self.docs.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn now(&self) -> DateTime<Utc> {
        let tick = self.ticks.fetch_add(1, Ordering::SeqCst) as i64;
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap() + Duration::seconds(tick)
    }

    fn begin_write(&self) -> Result<(), StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError("mock store is read-only".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MockProfileStore {
    async fn get_profile(&self, uid: &str) -> Result<Option<UserProfile>, StoreError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError("mock store is unreachable".to_string()));
        }
        Ok(self.profile(uid))
    }

    async fn create_profile(&self, profile: &NewProfile) -> Result<(), StoreError> {
        self.begin_write()?;
        let doc = profile.clone().into_profile(self.now());
        self.insert(doc);
        Ok(())
    }

    async fn record_login(&self, uid: &str, photo_url: Option<&str>) -> Result<(), StoreError> {
        self.begin_write()?;
        let now = self.now();
        let mut docs = self.docs.lock().unwrap();
        let doc = docs
            .get_mut(uid)
            .ok_or_else(|| StoreError(format!("no profile for uid {uid}")))?;
        doc.last_login = Some(now);
        doc.photo_url = photo_url.map(str::to_string);
        Ok(())
    }
}
