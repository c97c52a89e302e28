pub const NUM_POSITIONS: u8 = 4;
pub const MAX_BRIGHTNESS: u8 = 7; // 3 bits
pub const COLON_MASK: u8 = 0x80; // bit 7 of position 1
pub const BLANK: u8 = 0x00;
pub const SIGN_POSITION: u8 = 3;

// 2 x LPM on a 1.2 MHz ATtiny13
pub const DEFAULT_BIT_DELAY_US: u32 = 5;

pub const SAMPLES_PER_AVERAGE: u8 = 16;
pub const AVERAGE_SHIFT: u32 = 4; // log2(SAMPLES_PER_AVERAGE)
pub const ADC_RESOLUTION_BITS: u32 = 10;
pub const ADC_MAX: u16 = (1 << ADC_RESOLUTION_BITS) - 1;
pub const DEFAULT_REFERENCE_MV: u16 = 5000;

pub const NUMBERS: [u8; 10] = [0x3F, 0x06, 0x5B, 0x4F, 0x66, 0x6D, 0x7D, 0x07, 0x7F, 0x6F];
pub const DEGREE: u8 = 0x63;
pub const MINUS: u8 = 0x40;

#[allow(dead_code)]
pub mod command {
    pub const SET_DATA: u8 = 0x40;
    pub const SET_ADDRESS: u8 = 0xC0;
    pub const SET_DISPLAY: u8 = 0x80;

    pub mod data {
        pub const WRITE: u8 = 0x00; // write data to the display register
        pub const READ_KEYS: u8 = 0x02; // read the key scan data
        pub const AUTO_ADDRESS: u8 = 0x00; // automatic address increment
        pub const FIXED_ADDRESS: u8 = 0x04; // fixed address
        pub const MODE_NORMAL: u8 = 0x00;
        pub const MODE_TEST: u8 = 0x10;
    }

    pub mod display {
        pub const OFF: u8 = 0x00;
        pub const ON: u8 = 0x08;
    }
}
