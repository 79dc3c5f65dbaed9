//! Per-identifier decoding strategies
//!
//! Each known identifier has one [`MessageDecoder`] variant. A variant knows its
//! identifier, its message name and how to turn a payload into a
//! [`VehicleMessage`]. Formulas follow the vehicle documentation bit for bit,
//! including the odd ones (see the 0x615 temperature boundary).

use crate::bits::{bit, combine_le, round_to, signed_byte_wrap, unsigned_nibble};
use crate::messages::{
    Climate, EngineData, EngineRpm, EngineStatus, LateralAccel, Odometer, SteeringAngle,
    VehicleMessage, VehicleSpeed, WheelSpeed,
};
use crate::types::{DecoderError, Result};

/// Bounds-checked view of a payload handed to a decoder
#[derive(Debug, Clone, Copy)]
pub struct Payload<'a> {
    id: u16,
    bytes: &'a [u8],
}

impl<'a> Payload<'a> {
    pub fn new(id: u16, bytes: &'a [u8]) -> Self {
        Self { id, bytes }
    }

    /// Byte at `index`, or [`DecoderError::PayloadTooShort`]
    pub fn byte(&self, index: usize) -> Result<u8> {
        self.bytes
            .get(index)
            .copied()
            .ok_or(DecoderError::PayloadTooShort {
                id: self.id,
                index,
                len: self.bytes.len(),
            })
    }
}

/// Decoding strategy for one known identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageDecoder {
    AbsWheelSpeed,
    DmeRpm,
    DmeEngineData,
    DmeStatus,
    IkeOdometer,
    IkeClimate,
    AscSpeed,
    LwsSteering,
    DscLatAccel,
}

impl MessageDecoder {
    /// Every known decoder, in registration order
    pub const ALL: [MessageDecoder; 9] = [
        MessageDecoder::AbsWheelSpeed,
        MessageDecoder::DmeRpm,
        MessageDecoder::DmeEngineData,
        MessageDecoder::DmeStatus,
        MessageDecoder::IkeOdometer,
        MessageDecoder::IkeClimate,
        MessageDecoder::AscSpeed,
        MessageDecoder::LwsSteering,
        MessageDecoder::DscLatAccel,
    ];

    /// CAN identifier this decoder handles
    pub fn id(&self) -> u16 {
        match self {
            MessageDecoder::AbsWheelSpeed => 0x1F0,
            MessageDecoder::DmeRpm => 0x316,
            MessageDecoder::DmeEngineData => 0x329,
            MessageDecoder::DmeStatus => 0x545,
            MessageDecoder::IkeOdometer => 0x613,
            MessageDecoder::IkeClimate => 0x615,
            MessageDecoder::AscSpeed => 0x153,
            MessageDecoder::LwsSteering => 0x1F5,
            MessageDecoder::DscLatAccel => 0x1F3,
        }
    }

    /// Name tag of the message this decoder produces
    pub fn name(&self) -> &'static str {
        match self {
            MessageDecoder::AbsWheelSpeed => "ABS_WheelSpeed",
            MessageDecoder::DmeRpm => "DME_RPM",
            MessageDecoder::DmeEngineData => "DME_EngineData",
            MessageDecoder::DmeStatus => "DME_Status",
            MessageDecoder::IkeOdometer => "IKE_Odometer",
            MessageDecoder::IkeClimate => "IKE_Climate",
            MessageDecoder::AscSpeed => "ASC_Speed",
            MessageDecoder::LwsSteering => "LWS_Steering",
            MessageDecoder::DscLatAccel => "DSC_LatAccel",
        }
    }

    /// Decode a payload into a typed message
    pub fn decode(&self, payload: &Payload<'_>) -> Result<VehicleMessage> {
        match self {
            MessageDecoder::AbsWheelSpeed => decode_wheel_speed(payload),
            MessageDecoder::DmeRpm => decode_rpm(payload),
            MessageDecoder::DmeEngineData => decode_engine_data(payload),
            MessageDecoder::DmeStatus => decode_engine_status(payload),
            MessageDecoder::IkeOdometer => decode_odometer(payload),
            MessageDecoder::IkeClimate => decode_climate(payload),
            MessageDecoder::AscSpeed => decode_vehicle_speed(payload),
            MessageDecoder::LwsSteering => decode_steering(payload),
            MessageDecoder::DscLatAccel => decode_lateral_accel(payload),
        }
    }
}

/// 12-bit wheel speed: low byte plus low nibble of the high byte, 1/16 kph
fn wheel_kph(payload: &Payload<'_>, low: usize) -> Result<f64> {
    let raw = u16::from(payload.byte(low)?)
        + (u16::from(unsigned_nibble(payload.byte(low + 1)?, false)) << 8);
    Ok(f64::from(raw) / 16.0)
}

fn decode_wheel_speed(payload: &Payload<'_>) -> Result<VehicleMessage> {
    Ok(VehicleMessage::WheelSpeed(WheelSpeed {
        lf_kph: wheel_kph(payload, 0)?,
        rf_kph: wheel_kph(payload, 2)?,
        lr_kph: wheel_kph(payload, 4)?,
        rr_kph: wheel_kph(payload, 6)?,
    }))
}

fn decode_rpm(payload: &Payload<'_>) -> Result<VehicleMessage> {
    let raw = combine_le(payload.byte(2)?, payload.byte(3)?);
    Ok(VehicleMessage::EngineRpm(EngineRpm {
        rpm: round_to(f64::from(raw) / 6.4, 2),
    }))
}

fn decode_engine_data(payload: &Payload<'_>) -> Result<VehicleMessage> {
    let coolant = f64::from(payload.byte(1)?) * 0.75 - 48.373;
    let throttle = f64::from(payload.byte(5)?) / 254.0 * 100.0;
    let flags = payload.byte(6)?;

    Ok(VehicleMessage::EngineData(EngineData {
        coolant_c: round_to(coolant, 1),
        throttle_pct: round_to(throttle, 1),
        brake_pedal: bit(flags, 0),
        kickdown: bit(flags, 2),
    }))
}

fn decode_engine_status(payload: &Payload<'_>) -> Result<VehicleMessage> {
    let oil = f64::from(payload.byte(4)?) - 48.373;

    Ok(VehicleMessage::EngineStatus(EngineStatus {
        oil_c: round_to(oil, 1),
        check_engine: bit(payload.byte(0)?, 1),
        overheat: bit(payload.byte(3)?, 3),
        fuel_cons_raw: combine_le(payload.byte(1)?, payload.byte(2)?),
    }))
}

fn decode_odometer(payload: &Payload<'_>) -> Result<VehicleMessage> {
    Ok(VehicleMessage::Odometer(Odometer {
        odo_km: u32::from(combine_le(payload.byte(0)?, payload.byte(1)?)) * 10,
        fuel_level_raw: payload.byte(2)?,
        clock_mins: combine_le(payload.byte(3)?, payload.byte(4)?),
    }))
}

fn decode_climate(payload: &Payload<'_>) -> Result<VehicleMessage> {
    // Sign-magnitude with bias 128; 128 itself stays positive
    let raw = i16::from(payload.byte(3)?);
    let outside_c = if raw > 128 { -(raw - 128) } else { raw };

    Ok(VehicleMessage::Climate(Climate {
        outside_c,
        ac_on: payload.byte(0)? == 0x80,
    }))
}

fn decode_vehicle_speed(payload: &Payload<'_>) -> Result<VehicleMessage> {
    let raw = combine_le(payload.byte(1)?, payload.byte(2)?);
    Ok(VehicleMessage::VehicleSpeed(VehicleSpeed {
        speed_kmh: f64::from(raw) / 128.0,
    }))
}

fn decode_steering(payload: &Payload<'_>) -> Result<VehicleMessage> {
    let low = payload.byte(0)?;
    let high = payload.byte(1)?;

    // 15-bit magnitude, sign in the top bit of byte 1
    let magnitude = (i32::from(high & 0x7F) << 8) | i32::from(low);
    let signed_raw = if bit(high, 7) { -magnitude } else { magnitude };

    Ok(VehicleMessage::SteeringAngle(SteeringAngle {
        angle_deg: round_to(f64::from(signed_raw) * 0.043945, 2),
    }))
}

fn decode_lateral_accel(payload: &Payload<'_>) -> Result<VehicleMessage> {
    Ok(VehicleMessage::LateralAccel(LateralAccel {
        lat_raw: signed_byte_wrap(payload.byte(3)?),
        byte4: signed_byte_wrap(payload.byte(4)?),
        byte5: signed_byte_wrap(payload.byte(5)?),
    }))
}
