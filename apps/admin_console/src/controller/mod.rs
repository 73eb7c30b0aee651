//! Controller layer: admin settings view-model, save orchestration, and UI error modeling.

pub mod admin_settings;
pub mod events;
