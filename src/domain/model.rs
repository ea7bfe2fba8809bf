use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// A streaming station as stored in the catalog.
///
/// `id` never changes once created; everything else is editable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Station {
    pub id: String,
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default = "Utc::now")]
    pub date_added: DateTime<Utc>,
}

impl Station {
    /// Builds a new station with a fresh id (epoch millis plus a random suffix).
    pub fn new(name: impl Into<String>, url: impl Into<String>, image: Option<String>) -> Self {
        let now = Utc::now();
        let suffix: u32 = rand::thread_rng().gen_range(0..1_000);
        Self {
            id: format!("{}{suffix:03}", now.timestamp_millis()),
            name: name.into(),
            url: url.into(),
            image,
            date_added: now,
        }
    }

    pub(crate) fn preset(id: &str, name: &str, url: &str, image: &str) -> Self {
        Self {
            id: id.to_owned(),
            name: name.to_owned(),
            url: url.to_owned(),
            image: Some(image.to_owned()),
            date_added: Utc::now(),
        }
    }

    pub fn same_id(&self, other: &Station) -> bool {
        self.id == other.id
    }
}
