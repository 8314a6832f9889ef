#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttrType {
    Float,
    Int,
    Bool,
    Vec2,
    Vec3,
    Vec4,
}

impl AttrType {
    pub const ALL: [AttrType; 6] = [
        AttrType::Float,
        AttrType::Int,
        AttrType::Bool,
        AttrType::Vec2,
        AttrType::Vec3,
        AttrType::Vec4,
    ];

    pub fn name(self) -> &'static str {
        match self {
            AttrType::Float => "float",
            AttrType::Int => "int",
            AttrType::Bool => "bool",
            AttrType::Vec2 => "vec2",
            AttrType::Vec3 => "vec3",
            AttrType::Vec4 => "vec4",
        }
    }

    pub fn default_value(self) -> AttrValue {
        match self {
            AttrType::Float => AttrValue::Float(0.0),
            AttrType::Int => AttrValue::Int(0),
            AttrType::Bool => AttrValue::Bool(false),
            AttrType::Vec2 => AttrValue::Vec2([0.0; 2]),
            AttrType::Vec3 => AttrValue::Vec3([0.0; 3]),
            AttrType::Vec4 => AttrValue::Vec4([0.0; 4]),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AttrValue {
    Float(f32),
    Int(i32),
    Bool(bool),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
}

impl AttrValue {
    pub fn data_type(self) -> AttrType {
        match self {
            AttrValue::Float(_) => AttrType::Float,
            AttrValue::Int(_) => AttrType::Int,
            AttrValue::Bool(_) => AttrType::Bool,
            AttrValue::Vec2(_) => AttrType::Vec2,
            AttrValue::Vec3(_) => AttrType::Vec3,
            AttrValue::Vec4(_) => AttrType::Vec4,
        }
    }

    pub fn try_convert(self, to: AttrType) -> Option<AttrValue> {
        converter(self.data_type(), to).map(|f| f(self))
    }
}

pub type ConvertFn = fn(AttrValue) -> AttrValue;

/// Looks up the conversion routine for a (from, to) type pair. Returns
/// `None` when the pair is unsupported; callers are expected to fall back.
pub fn converter(from: AttrType, to: AttrType) -> Option<ConvertFn> {
    use AttrType::*;
    if from == to {
        return Some(|v| v);
    }
    let f: ConvertFn = match (from, to) {
        (Float, Int) | (Bool, Int) => |v| AttrValue::Int(as_i32(v)),
        (Int, Float) | (Bool, Float) => |v| AttrValue::Float(as_f32(v)),
        (Float, Bool) | (Int, Bool) => |v| AttrValue::Bool(as_bool(v)),
        (Float, Vec2) | (Int, Vec2) => |v| {
            let x = as_f32(v);
            AttrValue::Vec2([x, x])
        },
        (Float, Vec3) | (Int, Vec3) => |v| {
            let x = as_f32(v);
            AttrValue::Vec3([x, x, x])
        },
        (Float, Vec4) | (Int, Vec4) => |v| {
            let x = as_f32(v);
            AttrValue::Vec4([x, x, x, x])
        },
        (Vec2, Vec3) => |v| {
            let a = as_vec2(v);
            AttrValue::Vec3([a[0], a[1], 0.0])
        },
        (Vec2, Vec4) => |v| {
            let a = as_vec2(v);
            AttrValue::Vec4([a[0], a[1], 0.0, 0.0])
        },
        (Vec3, Vec4) => |v| {
            let a = as_vec3(v);
            AttrValue::Vec4([a[0], a[1], a[2], 0.0])
        },
        (Vec3, Vec2) => |v| {
            let a = as_vec3(v);
            AttrValue::Vec2([a[0], a[1]])
        },
        (Vec4, Vec2) => |v| {
            let a = as_vec4(v);
            AttrValue::Vec2([a[0], a[1]])
        },
        (Vec4, Vec3) => |v| {
            let a = as_vec4(v);
            AttrValue::Vec3([a[0], a[1], a[2]])
        },
        _ => return None,
    };
    Some(f)
}

fn as_f32(value: AttrValue) -> f32 {
    match value {
        AttrValue::Float(x) => x,
        AttrValue::Int(x) => x as f32,
        AttrValue::Bool(x) => {
            if x {
                1.0
            } else {
                0.0
            }
        }
        AttrValue::Vec2(a) => a[0],
        AttrValue::Vec3(a) => a[0],
        AttrValue::Vec4(a) => a[0],
    }
}

fn as_i32(value: AttrValue) -> i32 {
    match value {
        AttrValue::Int(x) => x,
        AttrValue::Bool(x) => x as i32,
        other => as_f32(other).round() as i32,
    }
}

fn as_bool(value: AttrValue) -> bool {
    match value {
        AttrValue::Bool(x) => x,
        AttrValue::Int(x) => x != 0,
        other => as_f32(other) != 0.0,
    }
}

fn as_vec2(value: AttrValue) -> [f32; 2] {
    match value {
        AttrValue::Vec2(a) => a,
        AttrValue::Vec3(a) => [a[0], a[1]],
        AttrValue::Vec4(a) => [a[0], a[1]],
        other => {
            let x = as_f32(other);
            [x, x]
        }
    }
}

fn as_vec3(value: AttrValue) -> [f32; 3] {
    match value {
        AttrValue::Vec3(a) => a,
        AttrValue::Vec2(a) => [a[0], a[1], 0.0],
        AttrValue::Vec4(a) => [a[0], a[1], a[2]],
        other => {
            let x = as_f32(other);
            [x, x, x]
        }
    }
}

fn as_vec4(value: AttrValue) -> [f32; 4] {
    match value {
        AttrValue::Vec4(a) => a,
        AttrValue::Vec2(a) => [a[0], a[1], 0.0, 0.0],
        AttrValue::Vec3(a) => [a[0], a[1], a[2], 0.0],
        other => {
            let x = as_f32(other);
            [x, x, x, x]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_conversion_exists_for_all_types() {
        for ty in AttrType::ALL {
            let convert = converter(ty, ty).unwrap();
            let value = ty.default_value();
            assert_eq!(convert(value), value);
        }
    }

    #[test]
    fn float_int_round_trip() {
        let convert = converter(AttrType::Float, AttrType::Int).unwrap();
        assert_eq!(convert(AttrValue::Float(2.6)), AttrValue::Int(3));
        let convert = converter(AttrType::Int, AttrType::Float).unwrap();
        assert_eq!(convert(AttrValue::Int(-4)), AttrValue::Float(-4.0));
    }

    #[test]
    fn bool_maps_to_zero_one() {
        assert_eq!(
            AttrValue::Bool(true).try_convert(AttrType::Float),
            Some(AttrValue::Float(1.0))
        );
        assert_eq!(
            AttrValue::Float(0.0).try_convert(AttrType::Bool),
            Some(AttrValue::Bool(false))
        );
        assert_eq!(
            AttrValue::Float(-2.0).try_convert(AttrType::Bool),
            Some(AttrValue::Bool(true))
        );
    }

    #[test]
    fn scalar_broadcasts_to_vectors() {
        assert_eq!(
            AttrValue::Float(2.0).try_convert(AttrType::Vec3),
            Some(AttrValue::Vec3([2.0, 2.0, 2.0]))
        );
        assert_eq!(
            AttrValue::Int(1).try_convert(AttrType::Vec2),
            Some(AttrValue::Vec2([1.0, 1.0]))
        );
    }

    #[test]
    fn vector_widening_zero_extends() {
        assert_eq!(
            AttrValue::Vec2([1.0, 2.0]).try_convert(AttrType::Vec4),
            Some(AttrValue::Vec4([1.0, 2.0, 0.0, 0.0]))
        );
        assert_eq!(
            AttrValue::Vec4([1.0, 2.0, 3.0, 4.0]).try_convert(AttrType::Vec3),
            Some(AttrValue::Vec3([1.0, 2.0, 3.0]))
        );
    }

    #[test]
    fn vector_to_scalar_is_unsupported() {
        assert!(converter(AttrType::Vec3, AttrType::Float).is_none());
        assert!(converter(AttrType::Vec2, AttrType::Bool).is_none());
        assert_eq!(AttrValue::Vec3([1.0; 3]).try_convert(AttrType::Int), None);
    }
}
