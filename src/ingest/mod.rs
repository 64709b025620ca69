/// Source clients.
///
/// Submodules:
/// - `krasecology` — sensor list and sensor data endpoints of krasecology.ru.

pub mod krasecology;
