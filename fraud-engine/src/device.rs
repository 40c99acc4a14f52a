//! In-memory device and IP intelligence

use crate::signals::DeviceIntelligence;
use crate::types::DeviceReport;
use crate::{Error, Result};
use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use ipnetwork::IpNetwork;
use std::collections::HashMap;
use std::net::IpAddr;

/// Device intelligence held in process memory
///
/// Tracks which fingerprints each user has transacted from, fingerprints
/// flagged as emulators, and networks flagged as VPN/proxy/hosting ranges.
/// A fingerprint learned from a transaction is not recognized when that same
/// transaction is inspected again.
pub struct InMemoryDeviceIntelligence {
    // Map: user_id -> fingerprint -> registering transaction (None if registered directly)
    known_devices: DashMap<String, HashMap<String, Option<String>>>,
    emulator_fingerprints: DashSet<String>,
    proxy_networks: Vec<IpNetwork>,
}

impl InMemoryDeviceIntelligence {
    /// Create new device intelligence
    pub fn new(emulator_fingerprints: Vec<String>, proxy_networks: Vec<IpNetwork>) -> Self {
        Self {
            known_devices: DashMap::new(),
            emulator_fingerprints: emulator_fingerprints.into_iter().collect(),
            proxy_networks,
        }
    }

    /// Parse flagged networks from configuration strings
    pub fn from_config(emulator_fingerprints: Vec<String>, proxy_networks: &[String]) -> Result<Self> {
        let networks = proxy_networks
            .iter()
            .map(|n| {
                n.trim()
                    .parse::<IpNetwork>()
                    .map_err(|e| Error::InvalidConfig(format!("invalid IP network {}: {}", n, e)))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(emulator_fingerprints, networks))
    }

    /// Mark a fingerprint as known for a user
    pub fn register_device(&self, user_id: &str, fingerprint: &str) {
        self.known_devices
            .entry(user_id.to_string())
            .or_default()
            .insert(fingerprint.to_string(), None);
    }

    /// Learn a fingerprint from an assessed transaction; the first registration is kept
    pub fn register_device_from(&self, user_id: &str, fingerprint: &str, transaction_id: &str) {
        self.known_devices
            .entry(user_id.to_string())
            .or_default()
            .entry(fingerprint.to_string())
            .or_insert_with(|| Some(transaction_id.to_string()));
    }

    /// Flag a fingerprint as an emulator
    pub fn flag_emulator(&self, fingerprint: &str) {
        self.emulator_fingerprints.insert(fingerprint.to_string());
    }

    /// Whether the fingerprint is known for the user
    pub fn is_known(&self, user_id: &str, fingerprint: &str) -> bool {
        self.known_devices
            .get(user_id)
            .map(|devices| devices.contains_key(fingerprint))
            .unwrap_or(false)
    }

    /// Known for the user through anything other than `transaction_id` itself
    fn is_known_before(&self, user_id: &str, fingerprint: &str, transaction_id: &str) -> bool {
        self.known_devices
            .get(user_id)
            .and_then(|devices| {
                devices
                    .get(fingerprint)
                    .map(|source| source.as_deref() != Some(transaction_id))
            })
            .unwrap_or(false)
    }

    /// Whether the address falls in a flagged network. Unparseable addresses are not flagged.
    pub fn is_proxy(&self, ip_address: &str) -> bool {
        match ip_address.trim().parse::<IpAddr>() {
            Ok(ip) => self.proxy_networks.iter().any(|net| net.contains(ip)),
            Err(_) => false,
        }
    }

    fn report(
        &self,
        user_id: &str,
        transaction_id: &str,
        fingerprint: Option<&str>,
        ip_address: Option<&str>,
    ) -> DeviceReport {
        let fingerprint = fingerprint.map(str::trim).filter(|f| !f.is_empty());

        DeviceReport {
            emulated: fingerprint
                .map(|fp| self.emulator_fingerprints.contains(fp))
                .unwrap_or(false),
            proxy: ip_address.map(|ip| self.is_proxy(ip)).unwrap_or(false),
            recognized: fingerprint.map(|fp| self.is_known_before(user_id, fp, transaction_id)),
        }
    }
}

impl Default for InMemoryDeviceIntelligence {
    fn default() -> Self {
        Self::new(Vec::new(), Vec::new())
    }
}

#[async_trait]
impl DeviceIntelligence for InMemoryDeviceIntelligence {
    async fn inspect(
        &self,
        user_id: &str,
        transaction_id: &str,
        fingerprint: Option<&str>,
        ip_address: Option<&str>,
    ) -> Result<DeviceReport> {
        Ok(self.report(user_id, transaction_id, fingerprint, ip_address))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn intel(networks: &[&str]) -> InMemoryDeviceIntelligence {
        let networks: Vec<String> = networks.iter().map(|n| n.to_string()).collect();
        InMemoryDeviceIntelligence::from_config(vec!["emu-1".to_string()], &networks).unwrap()
    }

    #[test]
    fn test_proxy_network_matching() {
        let di = intel(&["10.8.0.0/16", "203.0.113.7", "2001:db8::/32"]);

        assert!(di.is_proxy("10.8.44.1"));
        assert!(!di.is_proxy("10.9.0.1"));
        assert!(di.is_proxy("203.0.113.7"));
        assert!(!di.is_proxy("203.0.113.8"));
        assert!(di.is_proxy("2001:db8:1::5"));
        assert!(!di.is_proxy("::1"));
        assert!(!di.is_proxy("garbage"));

        assert!(intel(&["0.0.0.0/0"]).is_proxy("192.0.2.1"));
    }

    #[test]
    fn test_invalid_networks_rejected() {
        for bad in ["10.0.0.0/33", "not-an-ip", "10.0.0.0/x"] {
            let result = InMemoryDeviceIntelligence::from_config(vec![], &[bad.to_string()]);
            assert!(matches!(result, Err(Error::InvalidConfig(_))), "{} accepted", bad);
        }
    }

    #[test]
    fn test_report_fields() {
        let intel = intel(&["198.51.100.0/24"]);
        intel.register_device("user-1", "fp-home");

        let report = intel.report("user-1", "tx-1", Some("fp-home"), Some("192.0.2.10"));
        assert_eq!(
            report,
            DeviceReport {
                emulated: false,
                proxy: false,
                recognized: Some(true)
            }
        );

        let report = intel.report("user-1", "tx-2", Some("emu-1"), Some("198.51.100.20"));
        assert!(report.emulated);
        assert!(report.proxy);
        assert_eq!(report.recognized, Some(false));

        let report = intel.report("user-2", "tx-3", None, Some("garbage"));
        assert_eq!(report, DeviceReport::default());
    }

    #[test]
    fn test_known_devices_are_per_user() {
        let intel = InMemoryDeviceIntelligence::default();
        intel.register_device("user-1", "fp");
        assert!(intel.is_known("user-1", "fp"));
        assert!(!intel.is_known("user-2", "fp"));

        intel.flag_emulator("fp");
        let report = intel.report("user-1", "tx-1", Some("fp"), None);
        assert!(report.emulated);
    }

    #[test]
    fn test_device_learned_from_transaction_not_recognized_for_that_transaction() {
        let intel = InMemoryDeviceIntelligence::default();
        intel.register_device_from("user-1", "fp-new", "tx-1");

        assert!(intel.is_known("user-1", "fp-new"));
        assert_eq!(intel.report("user-1", "tx-1", Some("fp-new"), None).recognized, Some(false));
        assert_eq!(intel.report("user-1", "tx-2", Some("fp-new"), None).recognized, Some(true));

        // a later transaction does not take over the registration
        intel.register_device_from("user-1", "fp-new", "tx-2");
        assert_eq!(intel.report("user-1", "tx-2", Some("fp-new"), None).recognized, Some(true));
    }
}
