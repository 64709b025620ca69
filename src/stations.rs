//! Station registry for the krasecology.ru air-quality report.
//!
//! Defines the canonical list of monitoring posts queried on every run.
//! This is the single source of truth for station ids, all other modules
//! should take stations from here (via `Config`) rather than hardcoding ids.

// ---------------------------------------------------------------------------
// Station metadata
// ---------------------------------------------------------------------------

/// A monitoring post: the numeric id used by the sensor-list endpoint and
/// the display name that becomes its worksheet name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Station {
    pub id: u32,
    pub name: &'static str,
}

/// All monitoring posts published on krasecology.ru/operative/air,
/// in ascending id order.
pub static STATION_REGISTRY: &[Station] = &[
    Station { id: 1, name: "Ачинск-Юго-Восточный" },
    Station { id: 2, name: "Красноярск-Северный" },
    Station { id: 3, name: "Красноярск-Березовка" },
    Station { id: 4, name: "Красноярск-Солнечный" },
    Station { id: 5, name: "Красноярск-Черемушки" },
    Station { id: 6, name: "Красноярск-Кубеково" },
];

/// Returns the registry as an owned list, sorted by id.
pub fn default_stations() -> Vec<Station> {
    let mut stations = STATION_REGISTRY.to_vec();
    stations.sort_by_key(|s| s.id);
    stations
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
