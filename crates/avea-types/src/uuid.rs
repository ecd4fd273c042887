//! Bluetooth UUIDs for Avea lamps.
//!
//! This module contains the identifiers needed to talk to an Elgato Avea
//! bulb over Bluetooth Low Energy. The vendor part of the custom UUIDs
//! (`456c-6761-746f-4d756e696368`) is ASCII for "ElgatoMunich".

use uuid::{Uuid, uuid};

/// Custom service exposing the lamp's control characteristic.
pub const COLOR_SERVICE: Uuid = uuid!("f815e810-456c-6761-746f-4d756e696368");

/// Write characteristic accepting color and brightness commands.
pub const COLOR_CHARACTERISTIC: Uuid = uuid!("f815e811-456c-6761-746f-4d756e696368");

/// Substring advertised in the local name of every Avea bulb.
pub const ADVERTISED_NAME_FRAGMENT: &str = "Avea";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_service_uuid() {
        let expected = "f815e810-456c-6761-746f-4d756e696368";
        assert_eq!(COLOR_SERVICE.to_string(), expected);
    }

    #[test]
    fn test_color_characteristic_uuid() {
        let expected = "f815e811-456c-6761-746f-4d756e696368";
        assert_eq!(COLOR_CHARACTERISTIC.to_string(), expected);
    }

    #[test]
    fn test_service_and_characteristic_are_distinct() {
        assert_ne!(COLOR_SERVICE, COLOR_CHARACTERISTIC);
    }

    #[test]
    fn test_characteristic_lives_under_vendor_prefix() {
        // Both identifiers share the f815e81x vendor prefix
        assert!(COLOR_SERVICE.to_string().starts_with("f815e81"));
        assert!(COLOR_CHARACTERISTIC.to_string().starts_with("f815e81"));
    }

    #[test]
    fn test_advertised_name_fragment() {
        assert_eq!(ADVERTISED_NAME_FRAGMENT, "Avea");
    }
}
