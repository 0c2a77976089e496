pub mod circles;

pub use circles::{CirclesSettings, CircleSummary, UpdateCirclesSettingsRequest};
