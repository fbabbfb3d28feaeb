// I/O addresses of the EC port pair
/// Command port. Reading it returns the status byte
pub const EC_COMMAND_PORT: u16 = 0x29A;
/// Data port
pub const EC_DATA_PORT: u16 = 0x299;

// Command port status byte masks
/// EC has written data but host hasn't consumed it yet
pub const EC_STATUS_OBF: u8 = 0x01;
/// Host has written data/command but EC hasn't consumed it yet
pub const EC_STATUS_IBF: u8 = 0x02;

/// How often to poll the status byte before giving up
pub const EC_MAX_TIMEOUT_COUNT: u32 = 1000;
/// Delay between two polls of the status byte, in microseconds
pub const EC_UDELAY_TIME: u64 = 50;

/// Byte returned by the EC when an index, pin or table slot doesn't exist
pub const EC_INVALID: u8 = 0xFF;

// Commands for the EC internal RAM
pub const EC_HW_RAM_READ: u8 = 0x88;
pub const EC_HW_RAM_WRITE: u8 = 0x89;
pub const EC_HW_EXTEND_RAM_READ: u8 = 0x86;
pub const EC_HW_EXTEND_RAM_WRITE: u8 = 0x87;

// ACPI shadow RAM
pub const EC_ACPI_RAM_READ: u8 = 0x80;
pub const EC_ACPI_DATA_WRITE: u8 = 0x81;

// GPIO
/// Select the GPIO pin that the following status/direction command acts on
pub const EC_GPIO_INDEX_WRITE: u8 = 0x10;
pub const EC_GPIO_STATUS_READ: u8 = 0x11;
pub const EC_GPIO_STATUS_WRITE: u8 = 0x12;
pub const EC_GPIO_DIR_READ: u8 = 0x1D;
pub const EC_GPIO_DIR_WRITE: u8 = 0x1E;

// Analog to digital converter
/// Select the AD channel (by HW pin number)
pub const EC_AD_INDEX_WRITE: u8 = 0x15;
pub const EC_AD_LSB_READ: u8 = 0x16;
pub const EC_AD_MSB_READ: u8 = 0x1F;
/// AD readings are 10 bit wide
pub const EC_AD_VALUE_MASK: u32 = 0x3FF;
/// Fixed factor applied on top of the caller's multiplier
pub const EC_AD_SCALE: u32 = 100;

/// One Key Recovery flag. Same opcode to read and to set a flag
pub const EC_ONE_KEY_FLAG: u8 = 0x9C;

// OEM status bytes
pub const EC_ASG_OEM: u8 = 0xEA;
/// Sub-command sent on the data port after EC_ASG_OEM
pub const EC_ASG_OEM_READ: u8 = 0x00;
pub const EC_ASG_OEM_WRITE: u8 = 0x01;

// Dynamic control table
/// Select a table item by index. EC answers with the index or 0xFF
pub const EC_TBL_WRITE_ITEM: u8 = 0x20;
/// Get the HW pin number of the selected item
pub const EC_TBL_GET_PIN: u8 = 0x21;
/// Get the device ID of the selected item
pub const EC_TBL_GET_DEVID: u8 = 0x22;
/// Number of slots in the dynamic table. Item indices are 0..31
pub const EC_MAX_TBL_NUM: usize = 32;

// SMBus proxy cells in EC RAM
// Laid out like the ACPI SMBus host controller interface
pub const EC_SMBUS_PROTOCOL: u8 = 0xC0;
pub const EC_SMBUS_STATUS: u8 = 0xC1;
pub const EC_SMBUS_SLV_ADDR: u8 = 0xC2;
pub const EC_SMBUS_CMD: u8 = 0xC3;
pub const EC_SMBUS_DATA: u8 = 0xC4;
/// Select which of the EC's SMBus channels the transaction goes to
pub const EC_SMBUS_CHANNEL: u8 = 0x2B;

/// Address of the n-th data byte of an SMBus transaction
pub const fn ec_smbus_dat_offset(n: u8) -> u8 {
    EC_SMBUS_DATA + n
}

/// Value of EC_SMBUS_STATUS after a successful transaction
pub const EC_SMBUS_STATUS_DONE: u8 = 0x80;
/// Lower bits of EC_SMBUS_STATUS hold the failure reason
pub const EC_SMBUS_STATUS_CODE_MASK: u8 = 0x1F;
