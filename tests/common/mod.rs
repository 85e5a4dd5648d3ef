//! Minimal reader for checking encoder output in tests

#![allow(dead_code)]

/// A decoded value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    Utf8(String),
    Object(Vec<(String, Value)>),
}

impl Value {
    /// Field of an object by name
    pub fn get(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Object(fields) => fields.iter().find(|(key, _)| key == name).map(|(_, v)| v),
            _ => None,
        }
    }
}

fn read_len(buf: &[u8], width: usize) -> usize {
    buf[..width]
        .iter()
        .fold(0usize, |acc, byte| acc << 8 | *byte as usize)
}

/// Read one key, returning the name and bytes consumed
pub fn read_key(buf: &[u8]) -> (String, usize) {
    let lead = buf[0];
    let (len, start) = match lead >> 4 {
        0xE => ((lead & 0x0F) as usize, 1),
        0xD => {
            assert_eq!(lead & 0x0F, 1, "extended key with unexpected length width");
            (buf[1] as usize, 2)
        }
        other => panic!("expected key, found type code {other:#x}"),
    };
    let name = std::str::from_utf8(&buf[start..start + len]).expect("key is not utf-8");
    (name.to_string(), start + len)
}

/// Read one value, returning it and the bytes consumed
pub fn read_value(buf: &[u8]) -> (Value, usize) {
    let lead = buf[0];
    let param = (lead & 0x0F) as usize;
    match lead >> 4 {
        0x1 => match param {
            1 => (Value::Bool(true), 1),
            2 => (Value::Bool(false), 1),
            other => panic!("unexpected tiny value {other}"),
        },
        0x2 => {
            assert_eq!(param, 8);
            let bytes: [u8; 8] = buf[1..9].try_into().unwrap();
            (Value::Int64(i64::from_be_bytes(bytes)), 9)
        }
        0x4 => match param {
            4 => {
                let bytes: [u8; 4] = buf[1..5].try_into().unwrap();
                (Value::Float32(f32::from_be_bytes(bytes)), 5)
            }
            8 => {
                let bytes: [u8; 8] = buf[1..9].try_into().unwrap();
                (Value::Float64(f64::from_be_bytes(bytes)), 9)
            }
            other => panic!("unexpected float width {other}"),
        },
        0x5 => {
            let len = read_len(&buf[1..], param);
            let start = 1 + param;
            let text = std::str::from_utf8(&buf[start..start + len]).expect("invalid utf-8");
            (Value::Utf8(text.to_string()), start + len)
        }
        0xA => {
            let len = read_len(&buf[1..], param);
            let start = 1 + param;
            let content = &buf[start..start + len];

            let mut fields = Vec::new();
            let mut pos = 0;
            while pos < content.len() {
                let (name, key_len) = read_key(&content[pos..]);
                pos += key_len;
                let (value, value_len) = read_value(&content[pos..]);
                pos += value_len;
                fields.push((name, value));
            }
            assert_eq!(pos, len, "object content overran its length");
            (Value::Object(fields), start + len)
        }
        other => panic!("unknown type code {other:#x}"),
    }
}
