pub const EOF: u8 = 0xFF;
pub const GESTURE_MARKER: u8 = 0xFC;
pub const Z_MARKER: u8 = 0xFB;
pub const X_MARKER: u8 = 0xFA;
pub const IDLE: u8 = 0x00;

// Gesture codes above this value mean "no gesture".
pub const GESTURE_CODE_MAX: u8 = 240;

pub const DEFAULT_BAUD: u32 = 115_200;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u8)]
pub enum Marker {
    X = X_MARKER,
    Z = Z_MARKER,
    Gesture = GESTURE_MARKER,
}

impl Marker {
    pub const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            X_MARKER => Some(Self::X),
            Z_MARKER => Some(Self::Z),
            GESTURE_MARKER => Some(Self::Gesture),
            _ => None,
        }
    }

    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    pub const fn sample(self, payload: u8) -> Sample {
        match self {
            Self::X => Sample::X(payload),
            Self::Z => Sample::Z(payload),
            Self::Gesture => Sample::Gesture(payload),
        }
    }
}

/// One decoded payload, tagged by the marker byte that introduced it.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Sample {
    X(u8),
    Z(u8),
    Gesture(u8),
}

impl Sample {
    pub const fn value(self) -> u8 {
        match self {
            Self::X(v) | Self::Z(v) | Self::Gesture(v) => v,
        }
    }

    pub const fn marker(self) -> Marker {
        match self {
            Self::X(_) => Marker::X,
            Self::Z(_) => Marker::Z,
            Self::Gesture(_) => Marker::Gesture,
        }
    }
}

pub const fn is_payload(byte: u8) -> bool {
    byte < X_MARKER
}

pub const fn is_gesture_code(byte: u8) -> bool {
    byte <= GESTURE_CODE_MAX
}
