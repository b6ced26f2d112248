use crate::kv::{KeyValueStore, StoreError};
use crate::models::{default_subjects, Checkpoint, NewCheckpoint, Subject};
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, error, info, warn};

pub type CheckpointMap = BTreeMap<String, Vec<Checkpoint>>;

pub struct CheckpointStore<K> {
    kv: K,
    last_stamp: i64,
}

impl<K: KeyValueStore> CheckpointStore<K> {
    pub const SUBJECTS_KEY: &'static str = "checkpoint-subjects";
    pub const DATA_KEY: &'static str = "checkpoint-data";

    pub fn new(kv: K) -> Self {
        Self { kv, last_stamp: 0 }
    }

    pub fn kv(&self) -> &K {
        &self.kv
    }

    pub fn into_inner(self) -> K {
        self.kv
    }

    pub fn restore(&mut self, kv: K) {
        self.kv = kv;
    }

    /// Seeds the defaults only when the subject record was never written.
    pub fn list_subjects(&mut self) -> Vec<Subject> {
        if self.kv.get_item(Self::SUBJECTS_KEY).is_none() {
            let defaults = default_subjects();
            match self.write_record(Self::SUBJECTS_KEY, &defaults) {
                Ok(()) => info!(count = defaults.len(), "seeded default subjects"),
                Err(err) => error!("failed to seed default subjects: {err}"),
            }
            return defaults;
        }
        self.read_record(Self::SUBJECTS_KEY)
    }

    pub fn subject(&mut self, id: &str) -> Option<Subject> {
        self.list_subjects().into_iter().find(|subject| subject.id == id)
    }

    pub fn create_subject(&mut self, name: &str, emoji: &str) -> Option<Subject> {
        let (name, emoji) = (name.trim(), emoji.trim());
        if name.is_empty() || emoji.is_empty() {
            warn!("refusing to create subject with blank name or emoji");
            return None;
        }

        let mut subjects = self.writable_subjects()?;
        let mut data = self.writable_map()?;
        let mut stamp = self.next_stamp();
        while subjects
            .iter()
            .any(|subject| subject.id == format!("subject-{stamp}"))
        {
            stamp = self.next_stamp();
        }
        let subject = Subject::new(format!("subject-{stamp}"), name, emoji);
        subjects.push(subject.clone());
        data.entry(subject.id.clone()).or_default();

        self.write_pair(&subjects, &data).ok()?;
        info!(id = %subject.id, name = %subject.name, "created subject");
        Some(subject)
    }

    pub fn delete_subject(&mut self, id: &str) -> bool {
        let Some(mut subjects) = self.writable_subjects() else {
            return false;
        };
        let Some(mut data) = self.writable_map() else {
            return false;
        };
        let before = subjects.len();
        subjects.retain(|subject| subject.id != id);
        let had_data = data.remove(id).is_some();

        if subjects.len() == before && !had_data {
            debug!(id, "delete of unknown subject ignored");
            return true;
        }

        let committed = self.write_pair(&subjects, &data).is_ok();
        if committed {
            info!(id, "deleted subject");
        }
        committed
    }

    pub fn list_checkpoints(&self, subject_id: &str) -> Vec<Checkpoint> {
        self.checkpoint_map().remove(subject_id).unwrap_or_default()
    }

    pub fn checkpoint_map(&self) -> CheckpointMap {
        self.read_record(Self::DATA_KEY)
    }

    pub fn upsert_checkpoint(&mut self, subject_id: &str, checkpoint: Checkpoint) -> bool {
        let Some(mut data) = self.writable_map() else {
            return false;
        };
        let list = data.entry(subject_id.to_string()).or_default();
        match list.iter_mut().find(|existing| existing.id == checkpoint.id) {
            Some(existing) => *existing = checkpoint,
            None => list.push(checkpoint),
        }
        self.commit_map(&data)
    }

    pub fn add_checkpoint(&mut self, subject_id: &str, new: NewCheckpoint) -> Option<Checkpoint> {
        let existing = self.list_checkpoints(subject_id);
        let mut id = self.next_stamp();
        while existing.iter().any(|checkpoint| checkpoint.id == id) {
            id = self.next_stamp();
        }

        let checkpoint = new.into_checkpoint(id);
        if !self.upsert_checkpoint(subject_id, checkpoint.clone()) {
            return None;
        }
        info!(subject_id, id, title = %checkpoint.title, "added checkpoint");
        Some(checkpoint)
    }

    pub fn set_completed(
        &mut self,
        subject_id: &str,
        checkpoint_id: i64,
        completed: bool,
    ) -> Option<Checkpoint> {
        let Some(mut checkpoint) = self
            .list_checkpoints(subject_id)
            .into_iter()
            .find(|checkpoint| checkpoint.id == checkpoint_id)
        else {
            warn!(subject_id, checkpoint_id, "checkpoint not found");
            return None;
        };

        checkpoint.completed = completed;
        if !self.upsert_checkpoint(subject_id, checkpoint.clone()) {
            return None;
        }
        Some(checkpoint)
    }

    pub fn delete_checkpoint(&mut self, subject_id: &str, checkpoint_id: i64) -> bool {
        let Some(mut data) = self.writable_map() else {
            return false;
        };
        let Some(list) = data.get_mut(subject_id) else {
            return true;
        };
        let before = list.len();
        list.retain(|checkpoint| checkpoint.id != checkpoint_id);
        if list.len() == before {
            debug!(subject_id, checkpoint_id, "delete of unknown checkpoint ignored");
            return true;
        }
        self.commit_map(&data)
    }

    fn commit_map(&mut self, data: &CheckpointMap) -> bool {
        match self.write_record(Self::DATA_KEY, data) {
            Ok(()) => true,
            Err(err) => {
                error!("failed to save checkpoints: {err}");
                false
            }
        }
    }

    fn writable_subjects(&mut self) -> Option<Vec<Subject>> {
        match self.try_read_record(Self::SUBJECTS_KEY) {
            Ok(Some(subjects)) => Some(subjects),
            Ok(None) => Some(self.list_subjects()),
            Err(err) => {
                error!("refusing to overwrite subjects: {err}");
                None
            }
        }
    }

    fn writable_map(&self) -> Option<CheckpointMap> {
        match self.try_read_record(Self::DATA_KEY) {
            Ok(data) => Some(data.unwrap_or_default()),
            Err(err) => {
                error!("refusing to overwrite checkpoints: {err}");
                None
            }
        }
    }

    /// Writes both records, restoring the checkpoint record if the subject write fails.
    fn write_pair(&mut self, subjects: &[Subject], data: &CheckpointMap) -> Result<(), StoreError> {
        let previous = self.kv.get_item(Self::DATA_KEY);
        if let Err(err) = self.write_record(Self::DATA_KEY, data) {
            error!("failed to save checkpoints: {err}");
            return Err(err);
        }
        if let Err(err) = self.write_record(Self::SUBJECTS_KEY, &subjects) {
            error!("failed to save subjects: {err}");
            match previous {
                Some(text) => {
                    if let Err(restore) = self.kv.set_item(Self::DATA_KEY, text) {
                        error!("failed to restore checkpoints: {restore}");
                    }
                }
                None => self.kv.remove_item(Self::DATA_KEY),
            }
            return Err(err);
        }
        Ok(())
    }

    fn try_read_record<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        let Some(text) = self.kv.get_item(key) else {
            return Ok(None);
        };
        serde_json::from_str(&text)
            .map(Some)
            .map_err(|source| StoreError::Corrupt {
                key: key.to_string(),
                source,
            })
    }

    fn read_record<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        match self.try_read_record(key) {
            Ok(value) => value.unwrap_or_default(),
            Err(err) => {
                error!("{err}");
                T::default()
            }
        }
    }

    fn write_record<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> Result<(), StoreError> {
        let text = serde_json::to_string(value).map_err(StoreError::Serialize)?;
        self.kv.set_item(key, text)
    }

    /// Millisecond timestamp, strictly greater than any stamp this store handed out.
    fn next_stamp(&mut self) -> i64 {
        let stamp = Utc::now().timestamp_millis().max(self.last_stamp + 1);
        self.last_stamp = stamp;
        stamp
    }
}
