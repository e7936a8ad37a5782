//! Zevenet load balancer client.
//!
//! Typed models and an asynchronous client for farms, network interfaces and
//! system information, built on the [`zapi_core`] session.

#![deny(missing_docs)]

pub mod client;
pub mod models;

pub use client::{
    ZevenetClient, ZevenetClientBuilder, FARM_NOT_FOUND, VIRTUAL_INTERFACE_NOT_FOUND,
};
pub use models::{
    BackendDetails, CertificateInfo, FarmDetails, FarmInfo, NewFarm, NicInfo, ServiceDetails,
    SystemVersion, SystemVersionParams, TlsSettings, TlsSettingsWire, VirtualInterfaceDetails,
    VirtualInterfaceInfo,
};

/// Convenient result alias that reuses the shared ZAPI error type.
pub type Result<T> = zapi_core::Result<T>;
