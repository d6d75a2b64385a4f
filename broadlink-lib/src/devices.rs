//! Known device types and the header bytes each hardware revision expects.
//!
//! The RM2 generation (RM mini, RM pro) takes raw payloads. The RM4
//! generation, and RM mini 3 units on newer firmware, prefix every control
//! payload with a family-specific header and echo it back in replies.

/// Header bytes for RM2-generation devices (none)
const RM2_REQUEST_HEADER: &[u8] = &[];
const RM2_CODE_SENDING_HEADER: &[u8] = &[];

/// Header bytes for RM4-generation devices
const RM4_REQUEST_HEADER: &[u8] = &[0x04, 0x00];
const RM4_CODE_SENDING_HEADER: &[u8] = &[0xd0, 0x00];

/// Static characteristics of one device type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceCharacteristics {
    pub device_type: u16,
    pub supported: bool,
    pub model: &'static str,
    /// Prefix of query payloads (e.g. the sensor request)
    pub request_header: &'static [u8],
    /// Prefix of code-sending payloads
    pub code_sending_header: &'static [u8],
}

impl DeviceCharacteristics {
    const fn rm2(device_type: u16, model: &'static str) -> Self {
        Self {
            device_type,
            supported: true,
            model,
            request_header: RM2_REQUEST_HEADER,
            code_sending_header: RM2_CODE_SENDING_HEADER,
        }
    }

    const fn rm4(device_type: u16, model: &'static str) -> Self {
        Self {
            device_type,
            supported: true,
            model,
            request_header: RM4_REQUEST_HEADER,
            code_sending_header: RM4_CODE_SENDING_HEADER,
        }
    }

    const fn unsupported(device_type: u16) -> Self {
        Self {
            device_type,
            supported: false,
            model: "unknown",
            request_header: &[],
            code_sending_header: &[],
        }
    }

    /// Look up a device type. Unknown ids yield `supported == false`.
    pub fn lookup(device_type: u16) -> Self {
        KNOWN_DEVICES
            .iter()
            .find(|d| d.device_type == device_type)
            .copied()
            .unwrap_or(Self::unsupported(device_type))
    }

    /// All supported device types
    pub fn known() -> &'static [DeviceCharacteristics] {
        KNOWN_DEVICES
    }
}

#[rustfmt::skip]
static KNOWN_DEVICES: &[DeviceCharacteristics] = &[
    // RM2 generation
    DeviceCharacteristics::rm2(0x2712, "RM pro/pro+"),
    DeviceCharacteristics::rm2(0x272a, "RM pro"),
    DeviceCharacteristics::rm2(0x2737, "RM mini 3"),
    DeviceCharacteristics::rm2(0x273d, "RM pro"),
    DeviceCharacteristics::rm2(0x277c, "RM home"),
    DeviceCharacteristics::rm2(0x2783, "RM home"),
    DeviceCharacteristics::rm2(0x2787, "RM pro"),
    DeviceCharacteristics::rm2(0x278b, "RM plus"),
    DeviceCharacteristics::rm2(0x278f, "RM mini"),
    DeviceCharacteristics::rm2(0x2797, "RM pro+"),
    DeviceCharacteristics::rm2(0x279d, "RM pro+"),
    DeviceCharacteristics::rm2(0x27a1, "RM plus"),
    DeviceCharacteristics::rm2(0x27a6, "RM plus"),
    DeviceCharacteristics::rm2(0x27a9, "RM pro+"),
    DeviceCharacteristics::rm2(0x27c2, "RM mini 3"),
    DeviceCharacteristics::rm2(0x27c3, "RM pro+"),
    DeviceCharacteristics::rm2(0x27c7, "RM mini 3"),
    DeviceCharacteristics::rm2(0x27cc, "RM mini 3"),
    DeviceCharacteristics::rm2(0x27cd, "RM mini 3"),
    DeviceCharacteristics::rm2(0x27d0, "RM mini 3"),
    DeviceCharacteristics::rm2(0x27d1, "RM mini 3"),
    DeviceCharacteristics::rm2(0x27d3, "RM mini 3"),
    DeviceCharacteristics::rm2(0x27dc, "RM mini 3"),
    DeviceCharacteristics::rm2(0x27de, "RM mini 3"),
    // RM mini 3 on newer firmware
    DeviceCharacteristics::rm4(0x5f36, "RM mini 3"),
    DeviceCharacteristics::rm4(0x6508, "RM mini 3"),
    // RM4 generation
    DeviceCharacteristics::rm4(0x51da, "RM4 mini"),
    DeviceCharacteristics::rm4(0x5209, "RM4 TV mate"),
    DeviceCharacteristics::rm4(0x6026, "RM4 pro"),
    DeviceCharacteristics::rm4(0x6070, "RM4C mini"),
    DeviceCharacteristics::rm4(0x610e, "RM4 mini"),
    DeviceCharacteristics::rm4(0x610f, "RM4C mini"),
    DeviceCharacteristics::rm4(0x6184, "RM4C pro"),
    DeviceCharacteristics::rm4(0x61a2, "RM4 pro"),
    DeviceCharacteristics::rm4(0x62bc, "RM4 mini"),
    DeviceCharacteristics::rm4(0x62be, "RM4C mini"),
    DeviceCharacteristics::rm4(0x6364, "RM4S"),
    DeviceCharacteristics::rm4(0x648d, "RM4 mini"),
    DeviceCharacteristics::rm4(0x649b, "RM4 pro"),
    DeviceCharacteristics::rm4(0x6539, "RM4C mini"),
    DeviceCharacteristics::rm4(0x653a, "RM4 mini"),
    DeviceCharacteristics::rm4(0x653c, "RM4 pro"),
];
