//! Ordered, persisted list of stations.
//!
//! The catalog never talks to playback; callers hand a [`Station`] to the
//! playback controller themselves.

mod presets;

pub use presets::default_stations;

use url::Url;

use crate::domain::Station;
use crate::error::CatalogError;
use crate::store::JsonStore;

const STATIONS_KEY: &str = "stations";

/// Field changes for [`StationCatalog::update`]; `None` keeps the old value.
#[derive(Debug, Clone, Default)]
pub struct StationEdit {
    pub name: Option<String>,
    pub url: Option<String>,
    /// `Some(None)` clears the image.
    pub image: Option<Option<String>>,
}

pub struct StationCatalog {
    store: JsonStore,
    stations: Vec<Station>,
}

impl StationCatalog {
    /// Loads the stored list, seeding presets when it is missing, empty or unreadable.
    pub fn open(store: JsonStore) -> Self {
        let stations = match store.load::<Vec<Station>>(STATIONS_KEY) {
            Ok(Some(list)) if !list.is_empty() => {
                tracing::debug!(count = list.len(), "stations loaded");
                list
            }
            Ok(_) => {
                tracing::info!("no saved stations, seeding presets");
                Vec::new()
            }
            Err(e) => {
                tracing::warn!(err = %e, "stored stations unreadable, seeding presets");
                Vec::new()
            }
        };

        let mut catalog = Self { store, stations };
        if catalog.stations.is_empty() {
            catalog.stations = default_stations();
            if let Err(e) = catalog.persist() {
                tracing::warn!(err = %e, "failed to save preset stations");
            }
        }
        catalog
    }

    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Station> {
        self.stations.iter().find(|s| s.id == id)
    }

    /// Accepts either a station id or a 1-based position in the list.
    pub fn resolve(&self, token: &str) -> Option<&Station> {
        let token = token.trim();
        if let Some(s) = self.get(token) {
            return Some(s);
        }
        let pos: usize = token.parse().ok()?;
        pos.checked_sub(1).and_then(|i| self.stations.get(i))
    }

    /// Station `offset` places away from `id`, wrapping at both ends.
    pub fn neighbor(&self, id: &str, offset: isize) -> Option<&Station> {
        let len = self.stations.len() as isize;
        if len == 0 {
            return None;
        }
        let idx = self.position(id)? as isize;
        let next = (idx + offset).rem_euclid(len) as usize;
        self.stations.get(next)
    }

    pub fn add(
        &mut self,
        name: &str,
        url: &str,
        image: Option<&str>,
    ) -> Result<&Station, CatalogError> {
        let (name, url) = validate(name, url)?;
        let image = image.map(str::trim).filter(|s| !s.is_empty()).map(str::to_owned);
        let station = Station::new(name, url, image);
        tracing::info!(station_id = %station.id, name = %station.name, "station added");
        self.stations.push(station);
        self.persist()?;
        Ok(&self.stations[self.stations.len() - 1])
    }

    pub fn update(&mut self, id: &str, edit: StationEdit) -> Result<&Station, CatalogError> {
        let idx = self
            .position(id)
            .ok_or_else(|| CatalogError::NotFound(id.to_owned()))?;
        let current = &self.stations[idx];
        let name = edit.name.as_deref().unwrap_or(&current.name);
        let url = edit.url.as_deref().unwrap_or(&current.url);
        let (name, url) = validate(name, url)?;

        let station = &mut self.stations[idx];
        station.name = name;
        station.url = url;
        if let Some(image) = edit.image {
            station.image = image.map(|s| s.trim().to_owned()).filter(|s| !s.is_empty());
        }
        tracing::info!(station_id = %id, "station updated");
        self.persist()?;
        Ok(&self.stations[idx])
    }

    pub fn remove(&mut self, id: &str) -> Result<Station, CatalogError> {
        let idx = self
            .position(id)
            .ok_or_else(|| CatalogError::NotFound(id.to_owned()))?;
        let removed = self.stations.remove(idx);
        tracing::info!(station_id = %id, name = %removed.name, "station removed");
        self.persist()?;
        Ok(removed)
    }

    /// Moves a station to `index` (0-based, clamped to the end of the list).
    pub fn move_to(&mut self, id: &str, index: usize) -> Result<(), CatalogError> {
        let from = self
            .position(id)
            .ok_or_else(|| CatalogError::NotFound(id.to_owned()))?;
        let station = self.stations.remove(from);
        let to = index.min(self.stations.len());
        self.stations.insert(to, station);
        tracing::debug!(station_id = %id, from, to, "station moved");
        self.persist()?;
        Ok(())
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.stations.iter().position(|s| s.id == id)
    }

    fn persist(&self) -> Result<(), CatalogError> {
        self.store.save(STATIONS_KEY, &self.stations)?;
        Ok(())
    }
}

fn validate(name: &str, url: &str) -> Result<(String, String), CatalogError> {
    let name = name.trim();
    let url = url.trim();
    if name.is_empty() {
        return Err(CatalogError::MissingField("name"));
    }
    if url.is_empty() {
        return Err(CatalogError::MissingField("URL"));
    }
    let parsed = Url::parse(url).map_err(|e| CatalogError::InvalidUrl {
        url: url.to_owned(),
        reason: e.to_string(),
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(CatalogError::InvalidUrl {
            url: url.to_owned(),
            reason: format!("unsupported scheme {}", parsed.scheme()),
        });
    }
    Ok((name.to_owned(), url.to_owned()))
}
