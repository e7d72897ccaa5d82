//! Property descriptor serialization (spec.md §3, §4.2).
//!
//! A `PropertyDescriptor` is emitted once per non-base property in reply to
//! `GetProperties`. The `spec` union is always written at its full frozen
//! width (the `Enum` variant, the largest) regardless of `type_tag`, so
//! every descriptor on the wire is the same fixed size.

use byteorder::{ByteOrder, LittleEndian};

use crate::error::ProtoError;
use crate::fixed_str::{decode_fixed, encode_fixed};

pub const NAME_LEN: usize = 128;
pub const NICK_LEN: usize = 128;
pub const BLURB_LEN: usize = 128;
pub const ENUM_MAX_VALUES: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum PropertyType {
    Bool = 0,
    String = 1,
    Enum = 2,
    Int32 = 3,
    Int64 = 4,
    UInt32 = 5,
    UInt64 = 6,
    Float32 = 7,
    Float64 = 8,
}

impl PropertyType {
    pub fn from_u32(v: u32) -> Option<Self> {
        use PropertyType::*;
        Some(match v {
            0 => Bool,
            1 => String,
            2 => Enum,
            3 => Int32,
            4 => Int64,
            5 => UInt32,
            6 => UInt64,
            7 => Float32,
            8 => Float64,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropertySpec {
    Bool { default: bool },
    String { default: String },
    Numeric { min: f64, max: f64, default: f64 },
    Enum {
        default: i32,
        min: i32,
        max: i32,
        values: Vec<i32>,
        value_names: Vec<String>,
        value_nicks: Vec<String>,
    },
}

/// Size of the `spec` union on the wire: the `Enum` variant dominates.
/// default(4) + min(4) + max(4) + n_values(4)
/// + values[32] (4 each) + value_names[32] (128 each) + value_nicks[32] (128 each)
pub const SPEC_UNION_LEN: usize =
    4 + 4 + 4 + 4 + ENUM_MAX_VALUES * 4 + ENUM_MAX_VALUES * NAME_LEN + ENUM_MAX_VALUES * NAME_LEN;

fn encode_spec(spec: &PropertySpec, out: &mut [u8]) {
    debug_assert_eq!(out.len(), SPEC_UNION_LEN);
    out.fill(0);
    match spec {
        PropertySpec::Bool { default } => {
            out[0] = *default as u8;
        }
        PropertySpec::String { default } => {
            encode_fixed(&mut out[..NAME_LEN], default);
        }
        PropertySpec::Numeric { min, max, default } => {
            LittleEndian::write_f64(&mut out[0..8], *min);
            LittleEndian::write_f64(&mut out[8..16], *max);
            LittleEndian::write_f64(&mut out[16..24], *default);
        }
        PropertySpec::Enum {
            default,
            min,
            max,
            values,
            value_names,
            value_nicks,
        } => {
            LittleEndian::write_i32(&mut out[0..4], *default);
            LittleEndian::write_i32(&mut out[4..8], *min);
            LittleEndian::write_i32(&mut out[8..12], *max);
            let n = values.len().min(ENUM_MAX_VALUES);
            if values.len() > ENUM_MAX_VALUES {
                tracing::warn!(
                    n_values = values.len(),
                    max = ENUM_MAX_VALUES,
                    "enum property truncated to {} values on the wire",
                    ENUM_MAX_VALUES
                );
            }
            LittleEndian::write_u32(&mut out[12..16], n as u32);

            let values_off = 16;
            for (i, v) in values.iter().take(n).enumerate() {
                LittleEndian::write_i32(&mut out[values_off + i * 4..values_off + i * 4 + 4], *v);
            }

            let names_off = values_off + ENUM_MAX_VALUES * 4;
            for (i, name) in value_names.iter().take(n).enumerate() {
                let slot = &mut out[names_off + i * NAME_LEN..names_off + (i + 1) * NAME_LEN];
                encode_fixed(slot, name);
            }

            let nicks_off = names_off + ENUM_MAX_VALUES * NAME_LEN;
            for (i, nick) in value_nicks.iter().take(n).enumerate() {
                let slot = &mut out[nicks_off + i * NAME_LEN..nicks_off + (i + 1) * NAME_LEN];
                encode_fixed(slot, nick);
            }
        }
    }
}

fn decode_spec(type_tag: PropertyType, buf: &[u8]) -> Result<PropertySpec, ProtoError> {
    debug_assert_eq!(buf.len(), SPEC_UNION_LEN);
    Ok(match type_tag {
        PropertyType::Bool => PropertySpec::Bool { default: buf[0] != 0 },
        PropertyType::String => PropertySpec::String {
            default: decode_fixed(&buf[..NAME_LEN])?,
        },
        PropertyType::Int32
        | PropertyType::Int64
        | PropertyType::UInt32
        | PropertyType::UInt64
        | PropertyType::Float32
        | PropertyType::Float64 => PropertySpec::Numeric {
            min: LittleEndian::read_f64(&buf[0..8]),
            max: LittleEndian::read_f64(&buf[8..16]),
            default: LittleEndian::read_f64(&buf[16..24]),
        },
        PropertyType::Enum => {
            let default = LittleEndian::read_i32(&buf[0..4]);
            let min = LittleEndian::read_i32(&buf[4..8]);
            let max = LittleEndian::read_i32(&buf[8..12]);
            let n = (LittleEndian::read_u32(&buf[12..16]) as usize).min(ENUM_MAX_VALUES);

            let values_off = 16;
            let mut values = Vec::with_capacity(n);
            for i in 0..n {
                values.push(LittleEndian::read_i32(
                    &buf[values_off + i * 4..values_off + i * 4 + 4],
                ));
            }

            let names_off = values_off + ENUM_MAX_VALUES * 4;
            let mut value_names = Vec::with_capacity(n);
            for i in 0..n {
                value_names.push(decode_fixed(
                    &buf[names_off + i * NAME_LEN..names_off + (i + 1) * NAME_LEN],
                )?);
            }

            let nicks_off = names_off + ENUM_MAX_VALUES * NAME_LEN;
            let mut value_nicks = Vec::with_capacity(n);
            for i in 0..n {
                value_nicks.push(decode_fixed(
                    &buf[nicks_off + i * NAME_LEN..nicks_off + (i + 1) * NAME_LEN],
                )?);
            }

            PropertySpec::Enum {
                default,
                min,
                max,
                values,
                value_names,
                value_nicks,
            }
        }
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDescriptor {
    pub type_tag: PropertyType,
    pub flags: u32,
    pub name: String,
    pub nick: String,
    pub blurb: String,
    pub valid: bool,
    pub spec: PropertySpec,
}

/// type_tag(4) + flags(4) + name(128) + nick(128) + blurb(128) + valid(1) + spec(SPEC_UNION_LEN)
pub const DESCRIPTOR_LEN: usize = 4 + 4 + NAME_LEN + NICK_LEN + BLURB_LEN + 1 + SPEC_UNION_LEN;

impl PropertyDescriptor {
    pub fn encode(&self, out: &mut [u8]) {
        debug_assert_eq!(out.len(), DESCRIPTOR_LEN);
        LittleEndian::write_u32(&mut out[0..4], self.type_tag as u32);
        LittleEndian::write_u32(&mut out[4..8], self.flags);
        let mut off = 8;
        encode_fixed(&mut out[off..off + NAME_LEN], &self.name);
        off += NAME_LEN;
        encode_fixed(&mut out[off..off + NICK_LEN], &self.nick);
        off += NICK_LEN;
        encode_fixed(&mut out[off..off + BLURB_LEN], &self.blurb);
        off += BLURB_LEN;
        out[off] = self.valid as u8;
        off += 1;
        encode_spec(&self.spec, &mut out[off..off + SPEC_UNION_LEN]);
    }

    pub fn decode(buf: &[u8]) -> Result<Self, ProtoError> {
        debug_assert_eq!(buf.len(), DESCRIPTOR_LEN);
        let type_tag_raw = LittleEndian::read_u32(&buf[0..4]);
        let flags = LittleEndian::read_u32(&buf[4..8]);
        let mut off = 8;
        let name = decode_fixed(&buf[off..off + NAME_LEN])?;
        off += NAME_LEN;
        let nick = decode_fixed(&buf[off..off + NICK_LEN])?;
        off += NICK_LEN;
        let blurb = decode_fixed(&buf[off..off + BLURB_LEN])?;
        off += BLURB_LEN;
        let valid = buf[off] != 0;
        off += 1;

        let type_tag = match PropertyType::from_u32(type_tag_raw) {
            Some(t) => t,
            None => {
                // Unsupported/unknown type: caller treats `valid == false`
                // as "skip with a warning" per spec.md §4.2.
                return Ok(PropertyDescriptor {
                    type_tag: PropertyType::String,
                    flags,
                    name,
                    nick,
                    blurb,
                    valid: false,
                    spec: PropertySpec::String { default: String::new() },
                });
            }
        };
        let spec = decode_spec(type_tag, &buf[off..off + SPEC_UNION_LEN])?;

        Ok(PropertyDescriptor {
            type_tag,
            flags,
            name,
            nick,
            blurb,
            valid,
            spec,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_numeric_descriptor() {
        let d = PropertyDescriptor {
            type_tag: PropertyType::Float64,
            flags: 0,
            name: "exposure-time".into(),
            nick: "Exposure Time".into(),
            blurb: "Exposure time in seconds".into(),
            valid: true,
            spec: PropertySpec::Numeric { min: 0.0, max: 10.0, default: 1.0 },
        };
        let mut buf = vec![0u8; DESCRIPTOR_LEN];
        d.encode(&mut buf);
        assert_eq!(PropertyDescriptor::decode(&buf).unwrap(), d);
    }

    #[test]
    fn round_trips_enum_descriptor_and_truncates_overflow() {
        let values: Vec<i32> = (0..40).collect();
        let names: Vec<String> = values.iter().map(|v| format!("v{v}")).collect();
        let d = PropertyDescriptor {
            type_tag: PropertyType::Enum,
            flags: 0,
            name: "trigger-mode".into(),
            nick: "Trigger Mode".into(),
            blurb: "".into(),
            valid: true,
            spec: PropertySpec::Enum {
                default: 0,
                min: 0,
                max: 39,
                values: values.clone(),
                value_names: names.clone(),
                value_nicks: names,
            },
        };
        let mut buf = vec![0u8; DESCRIPTOR_LEN];
        d.encode(&mut buf);
        let decoded = PropertyDescriptor::decode(&buf).unwrap();
        match decoded.spec {
            PropertySpec::Enum { values, .. } => assert_eq!(values.len(), ENUM_MAX_VALUES),
            _ => panic!("expected enum spec"),
        }
    }

    #[test]
    fn invalid_type_tag_decodes_as_invalid_descriptor() {
        let mut buf = vec![0u8; DESCRIPTOR_LEN];
        LittleEndian::write_u32(&mut buf[0..4], 99);
        let decoded = PropertyDescriptor::decode(&buf).unwrap();
        assert!(!decoded.valid);
    }
}
