//! Domain model: relay status, time slots, and slot validation.
//!
//! The wire types from `relay-api` double as the domain types here --
//! the device surface is small enough that a conversion layer would
//! only add noise.

use chrono::NaiveTime;

pub use relay_api::{DeviceStatus, RelayMode, TimeSlot};

use crate::error::CoreError;

/// Hard cap on configured time slots, fixed by the device firmware.
pub const MAX_TIME_SLOTS: usize = 14;

/// Validate a full replacement set of time slots.
///
/// Checks the firmware cap and that every boundary parses as "HH:MM".
/// Ordering between slots is the user's business -- the device applies
/// them as given.
pub fn validate_slots(slots: &[TimeSlot]) -> Result<(), CoreError> {
    if slots.len() > MAX_TIME_SLOTS {
        return Err(CoreError::validation(format!(
            "at most {MAX_TIME_SLOTS} time slots are allowed (got {})",
            slots.len()
        )));
    }

    for (idx, slot) in slots.iter().enumerate() {
        validate_boundary(idx, "start", &slot.start)?;
        validate_boundary(idx, "end", &slot.end)?;
    }

    Ok(())
}

fn validate_boundary(idx: usize, which: &str, value: &str) -> Result<(), CoreError> {
    // chrono tolerates unpadded fields ("6:3"), so pin the exact width too.
    let well_formed = value.len() == 5 && NaiveTime::parse_from_str(value, "%H:%M").is_ok();
    if !well_formed {
        return Err(CoreError::validation(format!(
            "slot {}: invalid {which} time {value:?} (expected HH:MM)",
            idx + 1
        )));
    }
    Ok(())
}
