//! Type system enforcement tests for I2C domain newtypes.
//! These newtypes keep reserved addresses and oversized transfers out of the
//! request arena at construction time.
#![allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::arithmetic_side_effects)]

// ── I2cAddress ───────────────────────────────────────────────────────────────

#[test]
fn i2c_address_new_masks_to_seven_bits() {
    use platform::I2cAddress;
    assert_eq!(I2cAddress::new(0x98).get(), 0x18);
    assert_eq!(I2cAddress::new(0x7F).get(), 0x7F);
}

#[test]
fn i2c_address_try_new_rejects_reserved_low_range() {
    use platform::I2cAddress;
    for addr in 0x00..=0x07 {
        assert!(
            I2cAddress::try_new(addr).is_err(),
            "0x{addr:02X} is reserved and must be rejected"
        );
    }
}

#[test]
fn i2c_address_try_new_rejects_reserved_high_range() {
    use platform::I2cAddress;
    for addr in 0x78..=0xFF {
        assert!(I2cAddress::try_new(addr).is_err());
    }
}

#[test]
fn i2c_address_try_new_accepts_sensor_addresses() {
    use platform::I2cAddress;
    // LIS3DH, VCNL4020, TMP102
    for addr in [0x18, 0x13, 0x48] {
        assert_eq!(I2cAddress::try_new(addr).unwrap().get(), addr);
    }
}

#[test]
fn i2c_address_error_reports_bounds() {
    use platform::{I2cAddress, OutOfRangeError};
    let err = I2cAddress::try_new(0x7C).unwrap_err();
    assert_eq!(
        err,
        OutOfRangeError {
            value: 0x7C,
            min: 0x08,
            max: 0x77
        }
    );
    assert_eq!(err.to_string(), "value 124 outside 8..=119");
}

#[test]
fn i2c_address_all_covers_non_reserved_range() {
    use platform::I2cAddress;
    let all: Vec<u8> = I2cAddress::all().map(I2cAddress::get).collect();
    assert_eq!(all.len(), 0x70);
    assert_eq!(all.first(), Some(&0x08));
    assert_eq!(all.last(), Some(&0x77));
}

#[test]
fn i2c_address_displays_as_hex() {
    use platform::I2cAddress;
    assert_eq!(I2cAddress::new(0x0A).to_string(), "0x0A");
}

#[test]
fn i2c_address_is_one_byte() {
    use platform::I2cAddress;
    assert_eq!(core::mem::size_of::<I2cAddress>(), 1);
}

// ── TransferLen ──────────────────────────────────────────────────────────────

#[test]
fn transfer_len_rejects_zero() {
    use platform::TransferLen;
    assert!(TransferLen::new(0).is_err());
}

#[test]
fn transfer_len_rejects_over_max() {
    use platform::{config::MAX_TRANSFER_BYTES, TransferLen};
    assert!(TransferLen::new(MAX_TRANSFER_BYTES + 1).is_err());
    assert!(TransferLen::new(usize::MAX).is_err());
}

#[test]
fn transfer_len_accepts_bounds() {
    use platform::{config::MAX_TRANSFER_BYTES, TransferLen};
    assert_eq!(TransferLen::new(1).unwrap(), TransferLen::ONE);
    assert_eq!(
        TransferLen::new(MAX_TRANSFER_BYTES).unwrap().get(),
        MAX_TRANSFER_BYTES
    );
}

#[test]
fn transfer_len_defaults_to_one_byte() {
    use platform::TransferLen;
    assert_eq!(TransferLen::default().get(), 1);
}
