//! Locale data: per-language campus datasets and message catalogs

pub mod catalog;
pub mod dataset;
pub mod store;

pub use catalog::{keys, MessageCatalog};
pub use dataset::{
    normalize_location, same_location, DirectionStep, LocaleDataset, LocaleLoadError, Location,
    MilestoneMarker, PathRecord,
};
pub use store::{LocaleStore, DEFAULT_LOCALE};
