use crate::keys;
use binding::{BindingError, SharedStore, Value};
use session::SessionDefinition;

/// Loads a session into the authoritative store under the widget keys.
pub fn seed_store(store: &SharedStore, session: &SessionDefinition) -> Result<(), BindingError> {
    store.set(keys::TITLE, Value::from(session.title.clone()))?;
    store.set(keys::CHANNEL_NAMES, Value::from(session.channel_names.clone()))?;
    store.set(keys::TIMES, Value::from(session.times.clone()))?;
    store.set(keys::VALUES, Value::from(session.values.clone()))?;
    store.set(keys::DURATION, Value::from(session.duration()))?;
    store.set(keys::IS_RUNNING, Value::Bool(false))?;
    store.set(keys::SYNC_TIME, Value::from(0.0))?;
    store.set(keys::TAGS, Value::from(session.tags.clone()))?;
    let annotations = serde_json::to_value(&session.annotations).unwrap_or_else(|err| {
        log::warn!("session annotations could not be encoded: {err}");
        Value::Array(Vec::new())
    });
    store.set(keys::ANNOTATIONS, annotations)?;
    if let Some(video) = &session.video {
        store.set(keys::VIDEO_URL, Value::from(video.display().to_string()))?;
    }
    Ok(())
}

/// Reads the current store contents back into a session, for saving edits.
pub fn snapshot_session(store: &SharedStore, base: &SessionDefinition) -> SessionDefinition {
    let mut session = base.clone();
    if let Some(value) = store.get(keys::ANNOTATIONS) {
        match serde_json::from_value(value) {
            Ok(annotations) => session.annotations = annotations,
            Err(err) => log::warn!("stored annotations are malformed: {err}"),
        }
    }
    if let Some(value) = store.get(keys::TAGS) {
        session.tags = keys::string_array(&value);
    }
    session
}
