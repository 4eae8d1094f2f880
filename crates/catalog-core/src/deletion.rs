//! Software effort deletion

use catalog_model::ProfileKind;
use catalog_store::{CatalogTx, StoreError, StoreResult};
use tracing::{info, warn};
use uuid::Uuid;

/// Hard-delete an effort and its local profiles
///
/// Returns `false` when no effort has this UUID. Child efforts become
/// top-level; links naming the effort are dropped by the store.
///
/// # Errors
/// Returns error on storage failure; the transaction must then be dropped
pub fn delete_effort_in(tx: &mut dyn CatalogTx, uuid: &Uuid) -> StoreResult<bool> {
    let Some(record) = tx.effort_by_uuid(uuid)? else {
        info!(uuid = %uuid, "software effort not found, nothing deleted");
        return Ok(false);
    };

    for kind in ProfileKind::ALL {
        let Some(profile) = record.attributes.local(kind) else {
            continue;
        };
        match tx.delete_profile(kind, profile) {
            Ok(()) => {}
            Err(StoreError::NotFound { .. }) => {
                warn!(uuid = %uuid, kind = %kind, profile = %profile, "local profile already gone");
            }
            Err(e) => return Err(e),
        }
    }

    tx.delete_effort(record.key)?;
    info!(uuid = %uuid, name = %record.attributes.name, "software effort deleted");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_model::EffortAttributes;
    use catalog_store::{CatalogStore, MemoryStore};
    use std::io;
    use std::sync::{Arc, Mutex};
    use tracing::Level;
    use tracing_subscriber::fmt::MakeWriter;

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    struct BufferWriter(Arc<Mutex<Vec<u8>>>);

    impl<'a> MakeWriter<'a> for SharedBuffer {
        type Writer = BufferWriter;

        fn make_writer(&'a self) -> Self::Writer {
            BufferWriter(Arc::clone(&self.0))
        }
    }

    impl io::Write for BufferWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn captured(f: impl FnOnce()) -> Vec<serde_json::Value> {
        let sink = SharedBuffer::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(sink.clone())
            .json()
            .with_max_level(Level::INFO)
            .finish();
        tracing::subscriber::with_default(subscriber, f);

        let text = String::from_utf8(sink.0.lock().unwrap().clone()).unwrap();
        text.lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn unknown_uuid_is_logged_and_reports_false() {
        let store = MemoryStore::new();
        let uuid = Uuid::new_v4();
        let mut deleted = None;

        let lines = captured(|| {
            let mut tx = store.begin().unwrap();
            deleted = Some(delete_effort_in(&mut *tx, &uuid).unwrap());
        });

        assert_eq!(deleted, Some(false));
        let line = lines
            .iter()
            .find(|l| l["fields"]["message"] == "software effort not found, nothing deleted")
            .unwrap();
        assert_eq!(line["level"], "INFO");
        assert_eq!(line["fields"]["uuid"], uuid.to_string());
    }

    #[test]
    fn known_uuid_is_deleted() {
        let store = MemoryStore::new();
        let uuid = Uuid::new_v4();
        let mut tx = store.begin().unwrap();
        tx.insert_effort(uuid, &EffortAttributes::new("Gone", "1"))
            .unwrap();

        assert!(delete_effort_in(&mut *tx, &uuid).unwrap());
        assert!(tx.effort_by_uuid(&uuid).unwrap().is_none());
    }
}
