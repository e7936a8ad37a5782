//! Asynchronous Zevenet client implementation.
//!
//! Every method goes through the generic verbs of [`ZapiSession`]. The
//! appliance reports a missing entity with the same status as a real failure,
//! so lookups recognise "not found" by the literal message text and turn it
//! into `None` (or `false`).

use crate::models::{
    FarmDetails, FarmDetailsResponse, FarmInfo, FarmListResponse, NewFarm, NewVirtualInterface,
    NicInfo, NicListResponse, SystemVersion, TlsSettings, TlsSettingsResponse, TlsSettingsWire,
    VirtualInterfaceDetails, VirtualInterfaceInfo, VirtualInterfaceListResponse,
    VirtualInterfaceResponse,
};
use crate::Result;
use tracing::debug;
use zapi_core::mapping::map;
use zapi_core::{ConfigOptions, ZapiConfig, ZapiSession};

/// Message the appliance returns for an unknown farm.
pub const FARM_NOT_FOUND: &str = "Farm not found";

/// Message the appliance returns for an unknown virtual interface.
pub const VIRTUAL_INTERFACE_NOT_FOUND: &str = "VirtInt not found";

/// Builder for [`ZevenetClient`].
#[derive(Debug, Clone)]
pub struct ZevenetClientBuilder {
    host: String,
    zapi_key: String,
    options: ConfigOptions,
}

impl ZevenetClientBuilder {
    /// Create a builder for the appliance at `host`.
    #[must_use]
    pub fn new(host: impl Into<String>, zapi_key: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            zapi_key: zapi_key.into(),
            options: ConfigOptions::new(),
        }
    }

    /// Override all session options.
    #[must_use]
    pub fn with_options(mut self, options: ConfigOptions) -> Self {
        self.options = options;
        self
    }

    /// Set the call timeout in seconds.
    #[must_use]
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.options = self.options.with_timeout(seconds);
        self
    }

    /// Set whether to verify the appliance's TLS certificate.
    #[must_use]
    pub fn with_tls_verify(mut self, verify: bool) -> Self {
        self.options = self.options.with_tls_verify(verify);
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> Result<ZevenetClient> {
        let session = ZapiSession::new(self.host, self.zapi_key, Some(self.options))?;
        Ok(ZevenetClient { session })
    }
}

/// Asynchronous client for farms, interfaces and system information.
#[derive(Debug, Clone)]
pub struct ZevenetClient {
    session: ZapiSession,
}

impl ZevenetClient {
    /// Connect to `host` with default options.
    ///
    /// # Errors
    ///
    /// Returns an error if the host is invalid.
    pub fn new(host: impl Into<String>, zapi_key: impl Into<String>) -> Result<Self> {
        ZevenetClientBuilder::new(host, zapi_key).build()
    }

    /// Construct a client from a full configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn from_config(config: &ZapiConfig) -> Result<Self> {
        Ok(Self {
            session: ZapiSession::from_config(config)?,
        })
    }

    /// Wrap an existing session.
    #[must_use]
    pub const fn from_session(session: ZapiSession) -> Self {
        Self { session }
    }

    /// Return the underlying session.
    #[must_use]
    pub const fn session(&self) -> &ZapiSession {
        &self.session
    }

    /// Fetch version information; also a cheap way to check the ZAPI key.
    pub async fn get_system_version(&self) -> Result<SystemVersion> {
        self.session.get(&["system", "version"]).await
    }

    /// List all farms.
    pub async fn get_all_farms(&self) -> Result<Vec<FarmInfo>> {
        let response: FarmListResponse = self.session.get(&["farms"]).await?;
        Ok(response.params)
    }

    /// Fetch a farm with its services, or `None` if it does not exist.
    pub async fn get_farm(&self, name: &str) -> Result<Option<FarmDetails>> {
        let response = self
            .session
            .get::<FarmDetailsResponse>(&["farms", name])
            .await;

        Ok(absent_if_not_found(response, FARM_NOT_FOUND)?.map(|r| r.into_details(name)))
    }

    /// Returns true if a farm named `name` exists.
    pub async fn farm_exists(&self, name: &str) -> Result<bool> {
        Ok(self.get_farm(name).await?.is_some())
    }

    /// Create a farm and return its details as stored by the appliance.
    pub async fn create_farm(&self, farm: &NewFarm) -> Result<Option<FarmDetails>> {
        self.session.create(farm, &["farms"]).await?;
        self.get_farm(&farm.name).await
    }

    /// Delete a farm. Returns `false` if it did not exist.
    pub async fn delete_farm(&self, name: &str) -> Result<bool> {
        if !self.farm_exists(name).await? {
            return Ok(false);
        }

        self.session.delete(&["farms", name]).await?;
        Ok(true)
    }

    /// Read the TLS protocol settings of an HTTPS farm.
    pub async fn get_farm_tls(&self, name: &str) -> Result<TlsSettings> {
        let response: TlsSettingsResponse = self.session.get(&["farms", name]).await?;

        let mut settings = TlsSettings::default();
        map(&mut settings, &response.params)?;
        Ok(settings)
    }

    /// Update the TLS protocol settings of an HTTPS farm.
    pub async fn update_farm_tls(&self, name: &str, settings: &TlsSettings) -> Result<()> {
        let mut wire = TlsSettingsWire::default();
        map(&mut wire, settings)?;

        self.session.update(&wire, &["farms", name]).await
    }

    /// List physical network interfaces.
    pub async fn get_all_nics(&self) -> Result<Vec<NicInfo>> {
        let response: NicListResponse = self.session.get(&["interfaces", "nic"]).await?;
        Ok(response.interfaces)
    }

    /// List virtual interfaces.
    pub async fn get_all_virtual_interfaces(&self) -> Result<Vec<VirtualInterfaceInfo>> {
        let response: VirtualInterfaceListResponse =
            self.session.get(&["interfaces", "virtual"]).await?;
        Ok(response.interfaces)
    }

    /// Fetch a virtual interface, or `None` if it does not exist.
    pub async fn get_virtual_interface(
        &self,
        name: &str,
    ) -> Result<Option<VirtualInterfaceDetails>> {
        let response = self
            .session
            .get::<VirtualInterfaceResponse>(&["interfaces", "virtual", name])
            .await;

        Ok(absent_if_not_found(response, VIRTUAL_INTERFACE_NOT_FOUND)?.map(|r| r.interface))
    }

    /// Create a virtual interface and return it as stored by the appliance.
    pub async fn create_virtual_interface(
        &self,
        name: &str,
        ip: &str,
    ) -> Result<Option<VirtualInterfaceDetails>> {
        let request = NewVirtualInterface { name, ip };
        self.session
            .create(&request, &["interfaces", "virtual"])
            .await?;
        self.get_virtual_interface(name).await
    }

    /// Delete a virtual interface. Returns `false` if it did not exist.
    pub async fn delete_virtual_interface(&self, name: &str) -> Result<bool> {
        if self.get_virtual_interface(name).await?.is_none() {
            return Ok(false);
        }

        self.session
            .delete(&["interfaces", "virtual", name])
            .await?;
        Ok(true)
    }
}

/// Turn an error carrying `phrase` into `Ok(None)`.
fn absent_if_not_found<T>(result: Result<T>, phrase: &str) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err) if err.api_error().is_some() && err.message_contains(phrase) => {
            debug!(%err, "entity does not exist");
            Ok(None)
        }
        Err(err) => Err(err),
    }
}
