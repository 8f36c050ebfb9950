pub mod alert_policy;
pub mod background_model;
pub mod frame;
pub mod motion_classifier;
pub mod notifier;
pub mod region_extractor;
