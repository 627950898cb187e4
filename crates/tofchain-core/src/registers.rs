//! VL6180X register map and initialization tables

use serde::Serialize;

/// Factory default 7-bit address every VL6180X boots at
pub const DEFAULT_ADDRESS: u8 = 0x29;

pub const IDENTIFICATION_MODEL_ID: u16 = 0x000;
pub const IDENTIFICATION_MODEL_REV_MAJOR: u16 = 0x001;
pub const IDENTIFICATION_MODEL_REV_MINOR: u16 = 0x002;
pub const IDENTIFICATION_MODULE_REV_MAJOR: u16 = 0x003;
pub const IDENTIFICATION_MODULE_REV_MINOR: u16 = 0x004;
pub const IDENTIFICATION_DATE: u16 = 0x006;
pub const IDENTIFICATION_TIME: u16 = 0x008;

pub const SYSTEM_MODE_GPIO0: u16 = 0x010;
pub const SYSTEM_MODE_GPIO1: u16 = 0x011;
pub const SYSTEM_HISTORY_CTRL: u16 = 0x012;
pub const SYSTEM_INTERRUPT_CONFIG_GPIO: u16 = 0x014;
pub const SYSTEM_INTERRUPT_CLEAR: u16 = 0x015;
pub const SYSTEM_FRESH_OUT_OF_RESET: u16 = 0x016;
pub const SYSTEM_GROUPED_PARAMETER_HOLD: u16 = 0x017;

pub const SYSRANGE_START: u16 = 0x018;
pub const SYSRANGE_THRESH_HIGH: u16 = 0x019;
pub const SYSRANGE_THRESH_LOW: u16 = 0x01A;
pub const SYSRANGE_INTERMEASUREMENT_PERIOD: u16 = 0x01B;
pub const SYSRANGE_MAX_CONVERGENCE_TIME: u16 = 0x01C;
pub const SYSRANGE_CROSSTALK_COMPENSATION_RATE: u16 = 0x01E;
pub const SYSRANGE_CROSSTALK_VALID_HEIGHT: u16 = 0x021;
pub const SYSRANGE_EARLY_CONVERGENCE_ESTIMATE: u16 = 0x022;
pub const SYSRANGE_PART_TO_PART_RANGE_OFFSET: u16 = 0x024;
pub const SYSRANGE_RANGE_IGNORE_VALID_HEIGHT: u16 = 0x025;
pub const SYSRANGE_RANGE_IGNORE_THRESHOLD: u16 = 0x026;
pub const SYSRANGE_MAX_AMBIENT_LEVEL_MULT: u16 = 0x02C;
pub const SYSRANGE_RANGE_CHECK_ENABLES: u16 = 0x02D;
pub const SYSRANGE_VHV_RECALIBRATE: u16 = 0x02E;
pub const SYSRANGE_VHV_REPEAT_RATE: u16 = 0x031;

pub const SYSALS_START: u16 = 0x038;
pub const SYSALS_THRESH_HIGH: u16 = 0x03A;
pub const SYSALS_THRESH_LOW: u16 = 0x03C;
pub const SYSALS_INTERMEASUREMENT_PERIOD: u16 = 0x03E;
pub const SYSALS_ANALOGUE_GAIN: u16 = 0x03F;
pub const SYSALS_INTEGRATION_PERIOD: u16 = 0x040;

pub const RESULT_RANGE_STATUS: u16 = 0x04D;
pub const RESULT_ALS_STATUS: u16 = 0x04E;
pub const RESULT_INTERRUPT_STATUS_GPIO: u16 = 0x04F;
pub const RESULT_ALS_VAL: u16 = 0x050;
pub const RESULT_HISTORY_BUFFER_0: u16 = 0x052;
pub const RESULT_RANGE_VAL: u16 = 0x062;
pub const RESULT_RANGE_RAW: u16 = 0x064;
pub const RESULT_RANGE_RETURN_RATE: u16 = 0x066;
pub const RESULT_RANGE_REFERENCE_RATE: u16 = 0x068;
pub const RESULT_RANGE_RETURN_SIGNAL_COUNT: u16 = 0x06C;
pub const RESULT_RANGE_REFERENCE_SIGNAL_COUNT: u16 = 0x070;
pub const RESULT_RANGE_RETURN_AMB_COUNT: u16 = 0x074;
pub const RESULT_RANGE_REFERENCE_AMB_COUNT: u16 = 0x078;
pub const RESULT_RANGE_RETURN_CONV_TIME: u16 = 0x07C;
pub const RESULT_RANGE_REFERENCE_CONV_TIME: u16 = 0x080;

/// Undocumented in the datasheet; see ST's STSW-IMG003 API (vl6180x_def.h)
pub const RANGE_SCALER: u16 = 0x096;

pub const READOUT_AVERAGING_SAMPLE_PERIOD: u16 = 0x10A;
pub const FIRMWARE_BOOTUP: u16 = 0x119;
pub const FIRMWARE_RESULT_SCALER: u16 = 0x120;
pub const I2C_SLAVE_DEVICE_ADDRESS: u16 = 0x212;
pub const INTERLEAVED_MODE_ENABLE: u16 = 0x2A3;

/// `RESULT__INTERRUPT_STATUS_GPIO`: range "new sample ready"
pub const INTERRUPT_RANGE_READY: u8 = 0x04;
/// `RESULT__INTERRUPT_STATUS_GPIO`: ALS "new sample ready"
pub const INTERRUPT_ALS_READY: u8 = 0x20;
/// `SYSTEM__INTERRUPT_CLEAR` bits
pub const CLEAR_RANGE_INTERRUPT: u8 = 0x01;
pub const CLEAR_ALS_INTERRUPT: u8 = 0x02;
pub const CLEAR_ALL_INTERRUPTS: u8 = 0x07;

/// `SYSRANGE__START` / `SYSALS__START` values
pub const START_SINGLE_SHOT: u8 = 0x01;
pub const START_CONTINUOUS: u8 = 0x03;

/// `SYSTEM__MODE_GPIO1` values driving the chained reset output
pub const GPIO1_DRIVE_LOW: u8 = 0b0011_0000;
pub const GPIO1_DRIVE_HIGH: u8 = 0b0000_0000;

/// Width of a register in bits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Width {
    Byte,
    Word,
    Long,
}

/// One entry of the register map
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RegisterInfo {
    pub address: u16,
    pub width: Width,
    pub name: &'static str,
}

const fn byte(address: u16, name: &'static str) -> RegisterInfo {
    RegisterInfo {
        address,
        width: Width::Byte,
        name,
    }
}

const fn word(address: u16, name: &'static str) -> RegisterInfo {
    RegisterInfo {
        address,
        width: Width::Word,
        name,
    }
}

const fn long(address: u16, name: &'static str) -> RegisterInfo {
    RegisterInfo {
        address,
        width: Width::Long,
        name,
    }
}

/// Every documented register, in address order
pub const REGISTER_MAP: &[RegisterInfo] = &[
    byte(IDENTIFICATION_MODEL_ID, "IDENTIFICATION__MODEL_ID"),
    byte(IDENTIFICATION_MODEL_REV_MAJOR, "IDENTIFICATION__MODEL_REV_MAJOR"),
    byte(IDENTIFICATION_MODEL_REV_MINOR, "IDENTIFICATION__MODEL_REV_MINOR"),
    byte(IDENTIFICATION_MODULE_REV_MAJOR, "IDENTIFICATION__MODULE_REV_MAJOR"),
    byte(IDENTIFICATION_MODULE_REV_MINOR, "IDENTIFICATION__MODULE_REV_MINOR"),
    word(IDENTIFICATION_DATE, "IDENTIFICATION__DATE"),
    word(IDENTIFICATION_TIME, "IDENTIFICATION__TIME"),
    byte(SYSTEM_MODE_GPIO0, "SYSTEM__MODE_GPIO0"),
    byte(SYSTEM_MODE_GPIO1, "SYSTEM__MODE_GPIO1"),
    byte(SYSTEM_HISTORY_CTRL, "SYSTEM__HISTORY_CTRL"),
    byte(SYSTEM_INTERRUPT_CONFIG_GPIO, "SYSTEM__INTERRUPT_CONFIG_GPIO"),
    byte(SYSTEM_INTERRUPT_CLEAR, "SYSTEM__INTERRUPT_CLEAR"),
    byte(SYSTEM_FRESH_OUT_OF_RESET, "SYSTEM__FRESH_OUT_OF_RESET"),
    byte(SYSTEM_GROUPED_PARAMETER_HOLD, "SYSTEM__GROUPED_PARAMETER_HOLD"),
    byte(SYSRANGE_START, "SYSRANGE__START"),
    byte(SYSRANGE_THRESH_HIGH, "SYSRANGE__THRESH_HIGH"),
    byte(SYSRANGE_THRESH_LOW, "SYSRANGE__THRESH_LOW"),
    byte(SYSRANGE_INTERMEASUREMENT_PERIOD, "SYSRANGE__INTERMEASUREMENT_PERIOD"),
    byte(SYSRANGE_MAX_CONVERGENCE_TIME, "SYSRANGE__MAX_CONVERGENCE_TIME"),
    word(SYSRANGE_CROSSTALK_COMPENSATION_RATE, "SYSRANGE__CROSSTALK_COMPENSATION_RATE"),
    byte(SYSRANGE_CROSSTALK_VALID_HEIGHT, "SYSRANGE__CROSSTALK_VALID_HEIGHT"),
    word(SYSRANGE_EARLY_CONVERGENCE_ESTIMATE, "SYSRANGE__EARLY_CONVERGENCE_ESTIMATE"),
    byte(SYSRANGE_PART_TO_PART_RANGE_OFFSET, "SYSRANGE__PART_TO_PART_RANGE_OFFSET"),
    byte(SYSRANGE_RANGE_IGNORE_VALID_HEIGHT, "SYSRANGE__RANGE_IGNORE_VALID_HEIGHT"),
    word(SYSRANGE_RANGE_IGNORE_THRESHOLD, "SYSRANGE__RANGE_IGNORE_THRESHOLD"),
    byte(SYSRANGE_MAX_AMBIENT_LEVEL_MULT, "SYSRANGE__MAX_AMBIENT_LEVEL_MULT"),
    byte(SYSRANGE_RANGE_CHECK_ENABLES, "SYSRANGE__RANGE_CHECK_ENABLES"),
    byte(SYSRANGE_VHV_RECALIBRATE, "SYSRANGE__VHV_RECALIBRATE"),
    byte(SYSRANGE_VHV_REPEAT_RATE, "SYSRANGE__VHV_REPEAT_RATE"),
    byte(SYSALS_START, "SYSALS__START"),
    byte(SYSALS_THRESH_HIGH, "SYSALS__THRESH_HIGH"),
    byte(SYSALS_THRESH_LOW, "SYSALS__THRESH_LOW"),
    byte(SYSALS_INTERMEASUREMENT_PERIOD, "SYSALS__INTERMEASUREMENT_PERIOD"),
    byte(SYSALS_ANALOGUE_GAIN, "SYSALS__ANALOGUE_GAIN"),
    word(SYSALS_INTEGRATION_PERIOD, "SYSALS__INTEGRATION_PERIOD"),
    byte(RESULT_RANGE_STATUS, "RESULT__RANGE_STATUS"),
    byte(RESULT_ALS_STATUS, "RESULT__ALS_STATUS"),
    byte(RESULT_INTERRUPT_STATUS_GPIO, "RESULT__INTERRUPT_STATUS_GPIO"),
    word(RESULT_ALS_VAL, "RESULT__ALS_VAL"),
    word(RESULT_HISTORY_BUFFER_0, "RESULT__HISTORY_BUFFER_0"),
    byte(RESULT_RANGE_VAL, "RESULT__RANGE_VAL"),
    byte(RESULT_RANGE_RAW, "RESULT__RANGE_RAW"),
    word(RESULT_RANGE_RETURN_RATE, "RESULT__RANGE_RETURN_RATE"),
    word(RESULT_RANGE_REFERENCE_RATE, "RESULT__RANGE_REFERENCE_RATE"),
    long(RESULT_RANGE_RETURN_SIGNAL_COUNT, "RESULT__RANGE_RETURN_SIGNAL_COUNT"),
    long(RESULT_RANGE_REFERENCE_SIGNAL_COUNT, "RESULT__RANGE_REFERENCE_SIGNAL_COUNT"),
    long(RESULT_RANGE_RETURN_AMB_COUNT, "RESULT__RANGE_RETURN_AMB_COUNT"),
    long(RESULT_RANGE_REFERENCE_AMB_COUNT, "RESULT__RANGE_REFERENCE_AMB_COUNT"),
    long(RESULT_RANGE_RETURN_CONV_TIME, "RESULT__RANGE_RETURN_CONV_TIME"),
    long(RESULT_RANGE_REFERENCE_CONV_TIME, "RESULT__RANGE_REFERENCE_CONV_TIME"),
    word(RANGE_SCALER, "RANGE_SCALER"),
    byte(READOUT_AVERAGING_SAMPLE_PERIOD, "READOUT__AVERAGING_SAMPLE_PERIOD"),
    byte(FIRMWARE_BOOTUP, "FIRMWARE__BOOTUP"),
    byte(FIRMWARE_RESULT_SCALER, "FIRMWARE__RESULT_SCALER"),
    byte(I2C_SLAVE_DEVICE_ADDRESS, "I2C_SLAVE__DEVICE_ADDRESS"),
    byte(INTERLEAVED_MODE_ENABLE, "INTERLEAVED_MODE__ENABLE"),
];

/// Private tuning settings from ST's application note AN4545, written
/// verbatim at bring-up
pub(crate) const FACTORY_TUNING: &[(u16, u8)] = &[
    (0x0207, 0x01),
    (0x0208, 0x01),
    (0x0096, 0x00),
    (0x0097, 0xfd),
    (0x00e3, 0x00),
    (0x00e4, 0x04),
    (0x00e5, 0x02),
    (0x00e6, 0x01),
    (0x00e7, 0x03),
    (0x00f5, 0x02),
    (0x00d9, 0x05),
    (0x00db, 0xce),
    (0x00dc, 0x03),
    (0x00dd, 0xf8),
    (0x009f, 0x00),
    (0x00a3, 0x3c),
    (0x00b7, 0x00),
    (0x00bb, 0x3c),
    (0x00b2, 0x09),
    (0x00ca, 0x09),
    (0x0198, 0x01),
    (0x01b0, 0x17),
    (0x01ad, 0x00),
    (0x00ff, 0x05),
    (0x0100, 0x05),
    (0x0199, 0x05),
    (0x01a6, 0x1b),
    (0x01ac, 0x3e),
    (0x01a7, 0x1f),
    (0x0030, 0x00),
];

/// Recommended default settings, applied inside a grouped parameter hold
pub(crate) const DEFAULT_SETTINGS: &[(u16, u8)] = &[
    (READOUT_AVERAGING_SAMPLE_PERIOD, 48),
    // ALS gain 1 (nominal; 1.01 per datasheet table 14)
    (SYSALS_ANALOGUE_GAIN, 0x46),
    // VHV temperature recalibration every 255 range measurements
    (SYSRANGE_VHV_REPEAT_RATE, 0xff),
    (SYSRANGE_VHV_RECALIBRATE, 0x01),
    // 100 ms
    (SYSRANGE_INTERMEASUREMENT_PERIOD, 0x09),
    // 500 ms
    (SYSALS_INTERMEASUREMENT_PERIOD, 0x31),
    // new sample ready interrupt for both range and ALS
    (SYSTEM_INTERRUPT_CONFIG_GPIO, 0x24),
    // 49 ms
    (SYSRANGE_MAX_CONVERGENCE_TIME, 0x31),
    (INTERLEAVED_MODE_ENABLE, 0x00),
    (SYSTEM_INTERRUPT_CLEAR, CLEAR_ALL_INTERRUPTS),
    (SYSRANGE_START, 0x00),
];

/// Default ALS integration period (100 ms)
pub(crate) const DEFAULT_ALS_INTEGRATION_PERIOD: u16 = 0x0063;

/// `RANGE_SCALER` values indexed by scaling factor
pub(crate) const SCALER_VALUES: [u16; 4] = [0, 253, 127, 84];

/// Crosstalk valid height at 1x scaling, in mm
pub(crate) const DEFAULT_CROSSTALK_VALID_HEIGHT: u8 = 20;

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_register_map_is_sorted_and_unique() {
        let addresses: Vec<u16> = REGISTER_MAP.iter().map(|r| r.address).collect();
        let mut sorted = addresses.clone();
        sorted.sort_unstable();
        assert_eq!(addresses, sorted);

        let unique: HashSet<u16> = addresses.iter().copied().collect();
        assert_eq!(unique.len(), addresses.len());
    }

    #[test]
    fn test_default_settings_do_not_touch_the_hold_register() {
        assert!(DEFAULT_SETTINGS
            .iter()
            .all(|(reg, _)| *reg != SYSTEM_GROUPED_PARAMETER_HOLD));
    }
}
