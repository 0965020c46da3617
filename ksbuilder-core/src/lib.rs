//! ksbuilder library exports

pub mod chart;
pub mod cloud;
pub mod cluster;
pub mod config;
pub mod extension;
pub mod lint;
pub mod resources;
pub mod scaffold;
