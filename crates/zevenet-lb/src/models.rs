//! ZAPI resource models.
//!
//! Wire-shaped structs follow the JSON the appliance returns. Where the
//! appliance encodes booleans as strings, a domain struct with native
//! booleans is paired with its wire struct through [`zapi_core::field_map!`].

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use zapi_core::field_map;

/// Version information reported by `system/version`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SystemVersion {
    /// Operation description.
    #[serde(default)]
    pub description: String,
    /// Version details.
    #[serde(default)]
    pub params: SystemVersionParams,
}

/// Version details of the appliance.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SystemVersionParams {
    /// Appliance edition and release, e.g. `ZCE 5`.
    pub appliance_version: String,
    /// Host name of the appliance.
    pub hostname: String,
    /// Running kernel version.
    pub kernel_version: String,
    /// Appliance clock at the time of the call.
    pub system_date: String,
    /// Zevenet software version.
    pub zevenet_version: String,
}

impl SystemVersion {
    /// Returns true for the Community Edition (as opposed to Enterprise).
    #[must_use]
    pub fn is_community_edition(&self) -> bool {
        self.params.appliance_version.starts_with("ZCE")
    }
}

impl fmt::Display for SystemVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (v{})",
            self.params.appliance_version, self.params.zevenet_version
        )
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct FarmListResponse {
    #[serde(default)]
    pub params: Vec<FarmInfo>,
}

/// Summary of a farm as listed by `farms`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FarmInfo {
    /// Farm name.
    #[serde(rename = "farmname")]
    pub name: String,
    /// Farm profile (`http`, `l4xnat`, `datalink`, ...).
    #[serde(default)]
    pub profile: String,
    /// Farm status (`up`, `down`, `needed restart`, ...).
    #[serde(default)]
    pub status: String,
    /// Virtual IP.
    #[serde(default, rename = "vip")]
    pub virtual_ip: String,
    /// Virtual port; the list endpoint sends it as a string.
    #[serde(default, rename = "vport", deserialize_with = "number_or_string")]
    pub virtual_port: u16,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FarmDetailsResponse {
    #[serde(default)]
    pub params: FarmDetails,
    #[serde(default)]
    pub services: Vec<ServiceDetails>,
}

impl FarmDetailsResponse {
    /// The appliance omits the name and lists services beside the params.
    pub(crate) fn into_details(self, name: &str) -> FarmDetails {
        let mut details = self.params;
        details.name = name.to_string();
        details.services = self.services;
        details
    }
}

/// Full description of a farm.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FarmDetails {
    /// Farm name.
    #[serde(rename = "farmname")]
    pub name: String,
    /// Certificates bound to an HTTPS listener.
    #[serde(rename = "certlist")]
    pub certificates: Vec<CertificateInfo>,
    /// Custom cipher list.
    #[serde(rename = "cipherc")]
    pub ciphers_custom: String,
    /// Cipher profile.
    pub ciphers: String,
    /// Backend connection timeout in seconds.
    #[serde(rename = "contimeout", deserialize_with = "number_or_string")]
    pub connection_timeout_secs: u32,
    /// Custom 414 error page.
    #[serde(rename = "error414")]
    pub error_414: String,
    /// Custom 500 error page.
    #[serde(rename = "error500")]
    pub error_500: String,
    /// Custom 501 error page.
    #[serde(rename = "error501")]
    pub error_501: String,
    /// Custom 503 error page.
    #[serde(rename = "error503")]
    pub error_503: String,
    /// Accepted HTTP verb set.
    #[serde(rename = "httpverb")]
    pub http_verbs: String,
    /// Listener type (`http` or `https`).
    pub listener: String,
    /// Client request timeout in seconds.
    #[serde(rename = "reqtimeout", deserialize_with = "number_or_string")]
    pub request_timeout_secs: u32,
    /// Backend response timeout in seconds.
    #[serde(rename = "restimeout", deserialize_with = "number_or_string")]
    pub response_timeout_secs: u32,
    /// Interval between checks of dead backends, in seconds.
    #[serde(rename = "resurrectime", deserialize_with = "number_or_string")]
    pub resurrect_interval_secs: u32,
    /// Location header rewriting mode.
    #[serde(rename = "rewritelocation")]
    pub rewrite_location: String,
    /// Farm status.
    pub status: String,
    /// Virtual IP.
    #[serde(rename = "vip")]
    pub virtual_ip: String,
    /// Virtual port.
    #[serde(rename = "vport", deserialize_with = "number_or_string")]
    pub virtual_port: u16,
    /// Services of the farm.
    #[serde(skip_deserializing)]
    pub services: Vec<ServiceDetails>,
}

impl FarmDetails {
    /// Returns true if the farm listens for HTTP or HTTPS.
    #[must_use]
    pub fn is_http(&self) -> bool {
        self.listener.starts_with("http")
    }
}

impl fmt::Display for FarmDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.listener)
    }
}

/// Certificate bound to a farm.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CertificateInfo {
    /// Certificate file name.
    #[serde(rename = "file")]
    pub filename: String,
    /// Position in the certificate list.
    #[serde(default)]
    pub id: u32,
}

impl fmt::Display for CertificateInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.filename)
    }
}

/// Service of an HTTP farm.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServiceDetails {
    /// Service name.
    #[serde(rename = "id")]
    pub name: String,
    /// Whether the farm guardian health check is enabled.
    #[serde(rename = "fgenabled", deserialize_with = "wire_bool::fgenabled")]
    pub farm_guardian_enabled: bool,
    /// Whether farm guardian logs are enabled.
    #[serde(rename = "fglog", deserialize_with = "wire_bool::fglog")]
    pub farm_guardian_log: bool,
    /// Farm guardian check command.
    #[serde(rename = "fgscript")]
    pub farm_guardian_script: String,
    /// Farm guardian check interval in seconds.
    #[serde(rename = "fgtimecheck", deserialize_with = "number_or_string")]
    pub farm_guardian_interval_secs: u32,
    /// Whether backends are reached over HTTPS.
    #[serde(rename = "httpsb", deserialize_with = "wire_bool::httpsb")]
    pub encrypted_backends: bool,
    /// Whether least-response balancing is enabled.
    #[serde(rename = "leastresp", deserialize_with = "wire_bool::leastresp")]
    pub least_response: bool,
    /// Session persistence mode.
    pub persistence: String,
    /// Session identifier used for persistence.
    #[serde(rename = "sessionid")]
    pub persistence_id: String,
    /// Persistence timeout in seconds.
    #[serde(rename = "ttl", deserialize_with = "number_or_string")]
    pub persistence_ttl_secs: u32,
    /// Redirect target.
    pub redirect: String,
    /// Redirect type.
    #[serde(rename = "redirecttype")]
    pub redirect_type: String,
    /// URL pattern.
    #[serde(rename = "urlp")]
    pub url_pattern: String,
    /// Virtual host pattern.
    #[serde(rename = "vhost")]
    pub host_pattern: String,
    /// Backends of the service.
    pub backends: Vec<BackendDetails>,
}

impl fmt::Display for ServiceDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Backend server of a service.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BackendDetails {
    /// Backend identifier.
    #[serde(default)]
    pub id: u32,
    /// Backend IP address.
    #[serde(default, rename = "ip")]
    pub ip_address: String,
    /// Backend port.
    #[serde(default)]
    pub port: u16,
    /// Backend status.
    #[serde(default)]
    pub status: String,
    /// Backend timeout in seconds.
    #[serde(default, rename = "timeout")]
    pub timeout_secs: Option<u32>,
    /// Backend weight.
    #[serde(default)]
    pub weight: Option<u32>,
}

impl fmt::Display for BackendDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} (ID: {})", self.ip_address, self.port, self.id)
    }
}

/// Request payload for creating a farm.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewFarm {
    /// Farm name.
    #[serde(rename = "farmname")]
    pub name: String,
    /// Farm profile.
    pub profile: String,
    /// Virtual IP.
    #[serde(rename = "vip")]
    pub virtual_ip: String,
    /// Virtual port.
    #[serde(rename = "vport")]
    pub virtual_port: u16,
}

impl NewFarm {
    /// An HTTP farm listening on `virtual_ip:virtual_port`.
    #[must_use]
    pub fn http(name: impl Into<String>, virtual_ip: impl Into<String>, virtual_port: u16) -> Self {
        Self {
            name: name.into(),
            profile: "http".to_string(),
            virtual_ip: virtual_ip.into(),
            virtual_port,
        }
    }
}

/// TLS protocol settings of an HTTPS farm.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TlsSettings {
    /// Cipher profile.
    pub ciphers: String,
    /// Reject SSLv2 clients.
    pub disable_sslv2: bool,
    /// Reject SSLv3 clients.
    pub disable_sslv3: bool,
    /// Reject TLSv1.0 clients.
    pub disable_tlsv1: bool,
    /// Reject TLSv1.1 clients.
    pub disable_tlsv1_1: bool,
    /// Reject TLSv1.2 clients.
    pub disable_tlsv1_2: bool,
}

/// [`TlsSettings`] as sent and returned by the appliance.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TlsSettingsWire {
    /// Cipher profile.
    pub ciphers: String,
    /// `"true"` or `"false"`.
    pub disable_sslv2: String,
    /// `"true"` or `"false"`.
    pub disable_sslv3: String,
    /// `"true"` or `"false"`.
    pub disable_tlsv1: String,
    /// `"true"` or `"false"`.
    pub disable_tlsv1_1: String,
    /// `"true"` or `"false"`.
    pub disable_tlsv1_2: String,
}

field_map! {
    TlsSettings <=> TlsSettingsWire {
        ciphers,
        disable_sslv2 as TrueFalse,
        disable_sslv3 as TrueFalse,
        disable_tlsv1 as TrueFalse,
        disable_tlsv1_1 as TrueFalse,
        disable_tlsv1_2 as TrueFalse,
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct TlsSettingsResponse {
    #[serde(default)]
    pub params: TlsSettingsWire,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NicListResponse {
    #[serde(default)]
    pub interfaces: Vec<NicInfo>,
}

/// Physical network interface.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct NicInfo {
    /// Interface name.
    pub name: String,
    /// IP address.
    pub ip: String,
    /// Whether VLAN interfaces hang off this NIC.
    #[serde(deserialize_with = "wire_bool::has_vlan")]
    pub has_vlan: bool,
    /// Netmask.
    pub netmask: String,
    /// Gateway.
    pub gateway: String,
    /// MAC address.
    pub mac: String,
    /// Link status.
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VirtualInterfaceListResponse {
    #[serde(default)]
    pub interfaces: Vec<VirtualInterfaceInfo>,
}

/// Virtual interface as listed by `interfaces/virtual`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct VirtualInterfaceInfo {
    /// Interface name, e.g. `eth0:1`.
    pub name: String,
    /// Parent interface.
    pub parent: String,
    /// IP address.
    pub ip: String,
    /// Netmask.
    pub netmask: String,
    /// Gateway.
    pub gateway: String,
    /// MAC address.
    pub mac: String,
    /// Link status.
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VirtualInterfaceResponse {
    pub interface: VirtualInterfaceDetails,
}

/// Full description of a virtual interface.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct VirtualInterfaceDetails {
    /// Interface name.
    pub name: String,
    /// IP address.
    pub ip: String,
    /// Netmask.
    pub netmask: String,
    /// Gateway.
    pub gateway: String,
    /// MAC address.
    pub mac: String,
    /// Link status.
    pub status: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct NewVirtualInterface<'a> {
    pub name: &'a str,
    pub ip: &'a str,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(u64),
    String(String),
}

fn number_or_string<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<u64> + Default,
{
    use serde::de::Error;

    let number = match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(number) => number,
        NumberOrString::String(text) if text.is_empty() => return Ok(T::default()),
        NumberOrString::String(text) => text
            .trim()
            .parse::<u64>()
            .map_err(|err| D::Error::custom(format!("invalid number `{text}`: {err}")))?,
    };

    T::try_from(number).map_err(|_| D::Error::custom(format!("number {number} out of range")))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BoolOrString {
    Bool(bool),
    String(String),
}

/// Boolean readers for fields the appliance may send as strings. Each is
/// named after its wire field so a rejected token names the field.
mod wire_bool {
    use super::BoolOrString;
    use serde::{Deserialize, Deserializer};
    use zapi_core::mapping::parse_bool;

    fn read<'de, D>(field: &str, deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        match BoolOrString::deserialize(deserializer)? {
            BoolOrString::Bool(flag) => Ok(flag),
            BoolOrString::String(text) => {
                parse_bool(field, &text).map_err(serde::de::Error::custom)
            }
        }
    }

    macro_rules! wire_bool_fields {
        ($($field:ident),+ $(,)?) => {
            $(
                pub(super) fn $field<'de, D>(deserializer: D) -> Result<bool, D::Error>
                where
                    D: Deserializer<'de>,
                {
                    read(stringify!($field), deserializer)
                }
            )+
        };
    }

    wire_bool_fields!(fgenabled, fglog, httpsb, leastresp, has_vlan);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use zapi_core::mapping::map;

    #[test]
    fn farm_info_accepts_port_as_string() {
        let info: FarmInfo = serde_json::from_value(json!({
            "farmname": "web",
            "profile": "http",
            "status": "up",
            "vip": "10.0.0.10",
            "vport": "443"
        }))
        .unwrap();
        assert_eq!(info.virtual_port, 443);
    }

    #[test]
    fn farm_info_rejects_garbage_port() {
        let result = serde_json::from_value::<FarmInfo>(json!({
            "farmname": "web",
            "vport": "https"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn service_booleans_accept_every_representation() {
        let service: ServiceDetails = serde_json::from_value(json!({
            "id": "default",
            "fgenabled": "true",
            "fglog": "false",
            "httpsb": true,
            "leastresp": ""
        }))
        .unwrap();
        assert!(service.farm_guardian_enabled);
        assert!(!service.farm_guardian_log);
        assert!(service.encrypted_backends);
        assert!(!service.least_response);
    }

    #[test]
    fn service_boolean_rejects_unknown_token() {
        let result = serde_json::from_value::<ServiceDetails>(json!({"httpsb": "maybe"}));
        let err = result.unwrap_err();
        assert!(
            err.to_string()
                .contains("Unknown boolean conversion for httpsb: maybe"),
            "{err}"
        );
    }

    #[test]
    fn nic_boolean_error_names_field() {
        let err = serde_json::from_value::<NicInfo>(json!({"name": "eth0", "has_vlan": "sometimes"}))
            .unwrap_err();
        assert!(err.to_string().contains("has_vlan: sometimes"), "{err}");
    }

    #[test]
    fn tls_settings_round_trip() {
        let settings = TlsSettings {
            ciphers: "highsecurity".to_string(),
            disable_sslv2: true,
            disable_sslv3: true,
            ..TlsSettings::default()
        };

        let mut wire = TlsSettingsWire::default();
        map(&mut wire, &settings).unwrap();
        assert_eq!(wire.disable_sslv2, "true");
        assert_eq!(wire.disable_tlsv1, "false");

        let mut back = TlsSettings::default();
        map(&mut back, &wire).unwrap();
        assert_eq!(back, settings);
    }

    #[test]
    fn system_version_display() {
        let version = SystemVersion {
            params: SystemVersionParams {
                appliance_version: "ZCE 5".to_string(),
                zevenet_version: "5.0".to_string(),
                ..SystemVersionParams::default()
            },
            ..SystemVersion::default()
        };
        assert_eq!(version.to_string(), "ZCE 5 (v5.0)");
        assert!(version.is_community_edition());
    }

    #[test]
    fn new_farm_serializes_wire_names() {
        let farm = NewFarm::http("web", "10.0.0.10", 80);
        assert_eq!(
            serde_json::to_value(&farm).unwrap(),
            json!({"farmname": "web", "profile": "http", "vip": "10.0.0.10", "vport": 80})
        );
    }
}
