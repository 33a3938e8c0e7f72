//! Names of well-known 16-bit UUIDs
//!
//! Only the assigned numbers a discovery listing commonly runs into are kept
//! here; anything else prints without a name.

use crate::uuid::Uuid;

static NAMES: &[(u16, &str)] = &[
    // Services
    (0x1800, "Generic Access"),
    (0x1801, "Generic Attribute"),
    (0x1802, "Immediate Alert"),
    (0x1803, "Link Loss"),
    (0x1804, "Tx Power"),
    (0x1805, "Current Time"),
    (0x180A, "Device Information"),
    (0x180D, "Heart Rate"),
    (0x180F, "Battery"),
    (0x1812, "Human Interface Device"),
    (0x1814, "Running Speed and Cadence"),
    (0x1816, "Cycling Speed and Cadence"),
    (0x181C, "User Data"),
    (0x1826, "Fitness Machine"),
    // Declarations
    (0x2800, "Primary Service"),
    (0x2801, "Secondary Service"),
    (0x2802, "Include"),
    (0x2803, "Characteristic"),
    // Descriptors
    (0x2900, "Characteristic Extended Properties"),
    (0x2901, "Characteristic User Description"),
    (0x2902, "Client Characteristic Configuration"),
    (0x2903, "Server Characteristic Configuration"),
    (0x2904, "Characteristic Presentation Format"),
    (0x2905, "Characteristic Aggregate Format"),
    (0x2908, "Report Reference"),
    // Characteristics
    (0x2A00, "Device Name"),
    (0x2A01, "Appearance"),
    (0x2A02, "Peripheral Privacy Flag"),
    (0x2A03, "Reconnection Address"),
    (0x2A04, "Peripheral Preferred Connection Parameters"),
    (0x2A05, "Service Changed"),
    (0x2A06, "Alert Level"),
    (0x2A07, "Tx Power Level"),
    (0x2A19, "Battery Level"),
    (0x2A23, "System ID"),
    (0x2A24, "Model Number String"),
    (0x2A25, "Serial Number String"),
    (0x2A26, "Firmware Revision String"),
    (0x2A27, "Hardware Revision String"),
    (0x2A28, "Software Revision String"),
    (0x2A29, "Manufacturer Name String"),
    (0x2A2B, "Current Time"),
    (0x2A37, "Heart Rate Measurement"),
    (0x2A38, "Body Sensor Location"),
    (0x2A4A, "HID Information"),
    (0x2A4B, "Report Map"),
    (0x2A4C, "HID Control Point"),
    (0x2A4D, "Report"),
    (0x2A50, "PnP ID"),
    (0x2AA6, "Central Address Resolution"),
    (0x2AC9, "Resolvable Private Address Only"),
    (0x2B29, "Client Supported Features"),
    (0x2B2A, "Database Hash"),
    (0x2B3A, "Server Supported Features"),
];

/// Looks up the assigned name of a short UUID
pub fn uuid_name(uuid: &Uuid) -> Option<&'static str> {
    let value = uuid.as_short()?;
    NAMES
        .binary_search_by_key(&value, |&(key, _)| key)
        .ok()
        .map(|i| NAMES[i].1)
}
