//! Domain types for smartconfig provisioning

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Maximum SSID length in bytes
pub const SSID_MAX_LEN: usize = 32;

/// Maximum password length in bytes
pub const PASSWORD_MAX_LEN: usize = 64;

/// Length of the reserved vendor data carried by the extended protocol variant
pub const RESERVED_DATA_LEN: usize = 33;

/// Placeholder printed instead of a password
const REDACTED: &str = "<redacted>";

/// Zero-initialized fixed-size credential buffer
///
/// Source bytes are truncated to `N` on copy. The content ends at the first
/// NUL byte or at the end of the buffer, so an unterminated source never
/// causes a read past `N`.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialBuffer<const N: usize> {
    bytes: [u8; N],
}

/// SSID buffer (32 bytes)
pub type SsidBuffer = CredentialBuffer<SSID_MAX_LEN>;

/// Password buffer (64 bytes)
pub type PasswordBuffer = CredentialBuffer<PASSWORD_MAX_LEN>;

impl<const N: usize> CredentialBuffer<N> {
    /// Create an empty (all-zero) buffer
    pub fn new() -> Self {
        Self { bytes: [0u8; N] }
    }

    /// Copy a possibly NUL-padded source into a zeroed buffer, truncating at `N`
    pub fn from_padded(source: &[u8]) -> Self {
        let mut buffer = Self::new();
        let len = source.len().min(N);
        buffer.bytes[..len].copy_from_slice(&source[..len]);
        buffer
    }

    /// Significant bytes (up to the first NUL)
    pub fn as_bytes(&self) -> &[u8] {
        let end = self.bytes.iter().position(|b| *b == 0).unwrap_or(N);
        &self.bytes[..end]
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes[0] == 0
    }

    /// Render the content as text, replacing invalid UTF-8 sequences
    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(self.as_bytes()).into_owned()
    }
}

impl<const N: usize> Default for CredentialBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> std::fmt::Debug for CredentialBuffer<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CredentialBuffer<{}>({:?})", N, self.to_string_lossy())
    }
}

impl<const N: usize> Serialize for CredentialBuffer<N> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(self.as_bytes()))
    }
}

impl<'de, const N: usize> Deserialize<'de> for CredentialBuffer<N> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bytes = hex_bytes::deserialize(deserializer)?;
        Ok(Self::from_padded(&bytes))
    }
}

/// Serde helper for hex-encoded byte fields
pub mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s).map_err(serde::de::Error::custom)
    }
}

/// Hardware (MAC) address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MacAddress(pub [u8; 6]);

impl std::fmt::Display for MacAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

impl TryFrom<String> for MacAddress {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let mut mac = [0u8; 6];
        let mut parts = value.split(':');
        for byte in mac.iter_mut() {
            let part = parts
                .next()
                .ok_or_else(|| format!("MAC address too short: {}", value))?;
            *byte = u8::from_str_radix(part, 16)
                .map_err(|e| format!("Invalid MAC address {}: {}", value, e))?;
        }
        if parts.next().is_some() {
            return Err(format!("MAC address too long: {}", value));
        }
        Ok(MacAddress(mac))
    }
}

impl From<MacAddress> for String {
    fn from(mac: MacAddress) -> Self {
        mac.to_string()
    }
}

/// Wire-format version of a decoded provisioning broadcast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialVariant {
    Basic,
    /// Carries additional vendor data fetched separately
    Extended,
}

/// Credentials decoded by the radio from a provisioning broadcast
///
/// The byte fields may be NUL-padded and are not guaranteed to be terminated.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedCredentials {
    #[serde(with = "hex_bytes")]
    pub ssid: Vec<u8>,
    #[serde(with = "hex_bytes")]
    pub password: Vec<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bssid: Option<MacAddress>,
    pub variant: CredentialVariant,
}

impl DecodedCredentials {
    pub fn new(ssid: &str, password: &str, variant: CredentialVariant) -> Self {
        Self {
            ssid: ssid.as_bytes().to_vec(),
            password: password.as_bytes().to_vec(),
            bssid: None,
            variant,
        }
    }

    pub fn with_bssid(mut self, bssid: MacAddress) -> Self {
        self.bssid = Some(bssid);
        self
    }
}

impl std::fmt::Debug for DecodedCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodedCredentials")
            .field("ssid", &String::from_utf8_lossy(&self.ssid))
            .field("password", &REDACTED)
            .field("bssid", &self.bssid)
            .field("variant", &self.variant)
            .finish()
    }
}

/// Radio operating mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RadioMode {
    Station,
}

/// Station (client) configuration applied to the radio
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StationConfig {
    pub ssid: SsidBuffer,
    pub password: PasswordBuffer,
    /// Connect only to this access point when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bssid: Option<MacAddress>,
}

impl StationConfig {
    pub fn new(ssid: SsidBuffer, password: PasswordBuffer) -> Self {
        Self {
            ssid,
            password,
            bssid: None,
        }
    }
}

impl std::fmt::Debug for StationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StationConfig")
            .field("ssid", &self.ssid)
            .field("password", &REDACTED)
            .field("bssid", &self.bssid)
            .finish()
    }
}

/// Provisioning protocol flavour the radio listens for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SmartConfigType {
    EspTouch,
    AirKiss,
    #[default]
    EspTouchAirKiss,
    EspTouchV2,
}

/// Parameters for starting the provisioning protocol
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SmartConfigStartConfig {
    pub enable_log: bool,
    /// 16-byte AES key for encrypted EspTouch v2 payloads
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub esptouch_v2_crypt_key: Option<String>,
}

/// Lifecycle of the background listening task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListenerState {
    NotStarted,
    Listening,
    /// Handshake acknowledged
    Completed,
    /// Stopped on request
    Cancelled,
    /// Attempt timeout elapsed
    TimedOut,
    /// A fatal error ended the task
    Failed(String),
}

impl ListenerState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ListenerState::NotStarted | ListenerState::Listening)
    }
}

/// Snapshot of the provisioning session
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionSnapshot {
    pub running: bool,
    pub ssid: SsidBuffer,
    pub password: PasswordBuffer,
}

/// Identifier of a single provisioning attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttemptId(uuid::Uuid);

impl AttemptId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for AttemptId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AttemptId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
