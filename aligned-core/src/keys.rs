//! Store keys shared by every widget.

use crate::WidgetError;
use binding::{HostBinding, Value};

pub const IS_RUNNING: &str = "is_running";
pub const SYNC_TIME: &str = "sync_time";
pub const DURATION: &str = "duration";
pub const TIMES: &str = "times";
pub const VALUES: &str = "values";
pub const CHANNEL_NAMES: &str = "channel_names";
pub const TITLE: &str = "title";
pub const ANNOTATIONS: &str = "annotations";
pub const TAGS: &str = "tags";
pub const VIDEO_URL: &str = "video_url";

pub(crate) fn f64_array(value: &Value, key: &'static str) -> Result<Vec<f64>, WidgetError> {
    let items = value.as_array().ok_or_else(|| WidgetError::InvalidValue {
        key,
        reason: "expected an array of numbers".to_string(),
    })?;
    items
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            item.as_f64().ok_or_else(|| WidgetError::InvalidValue {
                key,
                reason: format!("element {idx} is not a finite number"),
            })
        })
        .collect()
}

pub(crate) fn required_f64_array<B: HostBinding + ?Sized>(
    binding: &B,
    key: &'static str,
) -> Result<Vec<f64>, WidgetError> {
    let value = binding.read(key).ok_or(WidgetError::MissingKey(key))?;
    f64_array(&value, key)
}

pub(crate) fn string_array(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

pub(crate) fn read_string<B: HostBinding + ?Sized>(binding: &B, key: &str) -> String {
    binding
        .read(key)
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default()
}
