//! Inbound ports (driving side): extension points driven by the application.

pub mod strategy;
