//! Typed records for the known vehicle messages
//!
//! One struct per identifier. Each serializes with the same stable keys that
//! [`VehicleMessage::fields`] exposes, so archived JSON and in-memory lookups
//! agree on naming.

use crate::types::FieldValue;
use serde::{Deserialize, Serialize};

/// 0x1F0 - wheel speeds from the ABS module
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WheelSpeed {
    #[serde(rename = "LF_Speed_kph")]
    pub lf_kph: f64,
    #[serde(rename = "RF_Speed_kph")]
    pub rf_kph: f64,
    #[serde(rename = "LR_Speed_kph")]
    pub lr_kph: f64,
    #[serde(rename = "RR_Speed_kph")]
    pub rr_kph: f64,
}

/// 0x316 - engine speed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineRpm {
    #[serde(rename = "RPM")]
    pub rpm: f64,
}

/// 0x329 - coolant, throttle and pedal flags
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineData {
    #[serde(rename = "CoolantTemp_C")]
    pub coolant_c: f64,
    #[serde(rename = "Throttle_Pct")]
    pub throttle_pct: f64,
    #[serde(rename = "BrakePedal")]
    pub brake_pedal: bool,
    #[serde(rename = "Kickdown")]
    pub kickdown: bool,
}

/// 0x545 - oil temperature, warning lamps and fuel counter
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineStatus {
    #[serde(rename = "OilTemp_C")]
    pub oil_c: f64,
    #[serde(rename = "CheckEngine")]
    pub check_engine: bool,
    #[serde(rename = "Overheat")]
    pub overheat: bool,
    /// Monotonic counter, wraps on overflow
    #[serde(rename = "FuelCons_Raw")]
    pub fuel_cons_raw: u16,
}

/// 0x613 - instrument cluster odometer, fuel level and running clock
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Odometer {
    #[serde(rename = "Odometer_km")]
    pub odo_km: u32,
    #[serde(rename = "FuelLevel_Raw")]
    pub fuel_level_raw: u8,
    #[serde(rename = "RunningClock_Mins")]
    pub clock_mins: u16,
}

/// 0x615 - outside temperature and A/C state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Climate {
    #[serde(rename = "OutsideTemp_C")]
    pub outside_c: i16,
    #[serde(rename = "AC_On")]
    pub ac_on: bool,
}

/// 0x153 - vehicle speed from the traction control module
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VehicleSpeed {
    #[serde(rename = "Speed_kmh")]
    pub speed_kmh: f64,
}

/// 0x1F5 - steering wheel angle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SteeringAngle {
    #[serde(rename = "Angle_Deg")]
    pub angle_deg: f64,
}

/// 0x1F3 - lateral acceleration (unscaled; calibration unknown)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LateralAccel {
    #[serde(rename = "LatAccel_Raw")]
    pub lat_raw: i8,
    pub byte4: i8,
    pub byte5: i8,
}

/// A decoded message from one of the known identifiers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name")]
pub enum VehicleMessage {
    #[serde(rename = "ABS_WheelSpeed")]
    WheelSpeed(WheelSpeed),
    #[serde(rename = "DME_RPM")]
    EngineRpm(EngineRpm),
    #[serde(rename = "DME_EngineData")]
    EngineData(EngineData),
    #[serde(rename = "DME_Status")]
    EngineStatus(EngineStatus),
    #[serde(rename = "IKE_Odometer")]
    Odometer(Odometer),
    #[serde(rename = "IKE_Climate")]
    Climate(Climate),
    #[serde(rename = "ASC_Speed")]
    VehicleSpeed(VehicleSpeed),
    #[serde(rename = "LWS_Steering")]
    SteeringAngle(SteeringAngle),
    #[serde(rename = "DSC_LatAccel")]
    LateralAccel(LateralAccel),
}

impl VehicleMessage {
    /// Message name tag
    pub fn name(&self) -> &'static str {
        match self {
            VehicleMessage::WheelSpeed(_) => "ABS_WheelSpeed",
            VehicleMessage::EngineRpm(_) => "DME_RPM",
            VehicleMessage::EngineData(_) => "DME_EngineData",
            VehicleMessage::EngineStatus(_) => "DME_Status",
            VehicleMessage::Odometer(_) => "IKE_Odometer",
            VehicleMessage::Climate(_) => "IKE_Climate",
            VehicleMessage::VehicleSpeed(_) => "ASC_Speed",
            VehicleMessage::SteeringAngle(_) => "LWS_Steering",
            VehicleMessage::LateralAccel(_) => "DSC_LatAccel",
        }
    }

    /// Fields in declaration order, keyed the same way they serialize
    pub fn fields(&self) -> Vec<(&'static str, FieldValue)> {
        match self {
            VehicleMessage::WheelSpeed(m) => vec![
                ("LF_Speed_kph", m.lf_kph.into()),
                ("RF_Speed_kph", m.rf_kph.into()),
                ("LR_Speed_kph", m.lr_kph.into()),
                ("RR_Speed_kph", m.rr_kph.into()),
            ],
            VehicleMessage::EngineRpm(m) => vec![("RPM", m.rpm.into())],
            VehicleMessage::EngineData(m) => vec![
                ("CoolantTemp_C", m.coolant_c.into()),
                ("Throttle_Pct", m.throttle_pct.into()),
                ("BrakePedal", m.brake_pedal.into()),
                ("Kickdown", m.kickdown.into()),
            ],
            VehicleMessage::EngineStatus(m) => vec![
                ("OilTemp_C", m.oil_c.into()),
                ("CheckEngine", m.check_engine.into()),
                ("Overheat", m.overheat.into()),
                ("FuelCons_Raw", i64::from(m.fuel_cons_raw).into()),
            ],
            VehicleMessage::Odometer(m) => vec![
                ("Odometer_km", i64::from(m.odo_km).into()),
                ("FuelLevel_Raw", i64::from(m.fuel_level_raw).into()),
                ("RunningClock_Mins", i64::from(m.clock_mins).into()),
            ],
            VehicleMessage::Climate(m) => vec![
                ("OutsideTemp_C", i64::from(m.outside_c).into()),
                ("AC_On", m.ac_on.into()),
            ],
            VehicleMessage::VehicleSpeed(m) => vec![("Speed_kmh", m.speed_kmh.into())],
            VehicleMessage::SteeringAngle(m) => vec![("Angle_Deg", m.angle_deg.into())],
            VehicleMessage::LateralAccel(m) => vec![
                ("LatAccel_Raw", i64::from(m.lat_raw).into()),
                ("byte4", i64::from(m.byte4).into()),
                ("byte5", i64::from(m.byte5).into()),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialized_keys_match_field_keys() {
        let message = VehicleMessage::EngineData(EngineData {
            coolant_c: 89.6,
            throttle_pct: 12.2,
            brake_pedal: true,
            kickdown: false,
        });
        let json = serde_json::to_value(message).unwrap();
        assert_eq!(json["name"], "DME_EngineData");
        for (key, _) in message.fields() {
            assert!(json.get(key).is_some(), "missing key {}", key);
        }
    }

    #[test]
    fn test_json_roundtrip_keeps_variant() {
        let message = VehicleMessage::Climate(Climate {
            outside_c: -4,
            ac_on: true,
        });
        let json = serde_json::to_string(&message).unwrap();
        let back: VehicleMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(back, message);
    }
}
