//! CPU-side uniform blocks addressed by name.
//!
//! A [`UniformLayout`] mirrors one WGSL `struct` bound in the uniform address
//! space. Offsets follow the WGSL alignment rules for that space: scalars align
//! to 4, vectors and matrices to 16, `mat3x3` columns are padded to 16 bytes,
//! array elements are strided to a multiple of 16, and the struct size is
//! rounded up to 16.

use glam::{Mat3, Mat4, Vec3, Vec4};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniformKind {
    Int,
    Float,
    Vec3,
    Vec4,
    Mat3,
    Mat4,
}

impl UniformKind {
    fn align(self) -> u32 {
        match self {
            UniformKind::Int | UniformKind::Float => 4,
            _ => 16,
        }
    }

    fn size(self) -> u32 {
        match self {
            UniformKind::Int | UniformKind::Float => 4,
            UniformKind::Vec3 => 12,
            UniformKind::Vec4 => 16,
            UniformKind::Mat3 => 48,
            UniformKind::Mat4 => 64,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Int(i32),
    Float(f32),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat3(Mat3),
    Mat4(Mat4),
}

impl UniformValue {
    pub fn kind(&self) -> UniformKind {
        match self {
            UniformValue::Int(_) => UniformKind::Int,
            UniformValue::Float(_) => UniformKind::Float,
            UniformValue::Vec3(_) => UniformKind::Vec3,
            UniformValue::Vec4(_) => UniformKind::Vec4,
            UniformValue::Mat3(_) => UniformKind::Mat3,
            UniformValue::Mat4(_) => UniformKind::Mat4,
        }
    }
}

macro_rules! uniform_value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(impl From<$ty> for UniformValue {
            fn from(v: $ty) -> Self {
                UniformValue::$variant(v)
            }
        })*
    };
}

uniform_value_from!(i32 => Int, f32 => Float, Vec3 => Vec3, Vec4 => Vec4, Mat3 => Mat3, Mat4 => Mat4);

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum UniformError {
    #[error("no uniform named '{0}'")]
    Unknown(String),
    #[error("uniform '{name}' is {expected:?}, got {actual:?}")]
    KindMismatch {
        name: String,
        expected: UniformKind,
        actual: UniformKind,
    },
    #[error("uniform '{name}' index {index} out of range (len {len})")]
    IndexOutOfRange { name: String, index: u32, len: u32 },
}

#[derive(Debug, Clone, PartialEq)]
struct UniformField {
    name: String,
    kind: UniformKind,
    offset: u32,
    count: u32,
    stride: u32,
}

/// Byte layout of a uniform struct.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UniformLayout {
    fields: Vec<UniformField>,
    size: u32,
}

impl UniformLayout {
    pub fn builder() -> UniformLayoutBuilder {
        UniformLayoutBuilder::default()
    }

    /// Struct size in bytes, a multiple of 16 and never zero.
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Byte offset of a field or array element (`name` or `name[i]`).
    pub fn offset_of(&self, name: &str) -> Result<u32, UniformError> {
        self.locate(name).map(|(_, offset)| offset)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    fn locate(&self, name: &str) -> Result<(&UniformField, u32), UniformError> {
        let (base, index) = split_index(name);
        let field = self
            .fields
            .iter()
            .find(|f| f.name == base)
            .ok_or_else(|| UniformError::Unknown(name.to_string()))?;
        let index = index.unwrap_or(0);
        if index >= field.count {
            return Err(UniformError::IndexOutOfRange {
                name: base.to_string(),
                index,
                len: field.count,
            });
        }
        Ok((field, field.offset + index * field.stride))
    }
}

fn split_index(name: &str) -> (&str, Option<u32>) {
    if let Some(open) = name.find('[') {
        if let Some(idx) = name[open + 1..]
            .strip_suffix(']')
            .and_then(|i| i.parse().ok())
        {
            return (&name[..open], Some(idx));
        }
    }
    (name, None)
}

fn round_up(value: u32, align: u32) -> u32 {
    value.div_ceil(align) * align
}

#[derive(Debug, Default)]
pub struct UniformLayoutBuilder {
    fields: Vec<UniformField>,
    cursor: u32,
}

impl UniformLayoutBuilder {
    pub fn field(self, name: &str, kind: UniformKind) -> Self {
        self.push(name, kind, 1, kind.size())
    }

    /// A fixed-size array. The element stride is rounded up to 16 bytes.
    pub fn array(self, name: &str, kind: UniformKind, count: u32) -> Self {
        self.push(name, kind, count, round_up(kind.size(), 16))
    }

    fn push(mut self, name: &str, kind: UniformKind, count: u32, stride: u32) -> Self {
        let (align, span) = if count > 1 {
            (16, stride * count)
        } else {
            (kind.align(), kind.size())
        };
        let offset = round_up(self.cursor, align);
        self.cursor = offset + span;
        self.fields.push(UniformField {
            name: name.to_string(),
            kind,
            offset,
            count,
            stride,
        });
        self
    }

    pub fn build(self) -> UniformLayout {
        UniformLayout {
            size: round_up(self.cursor.max(1), 16),
            fields: self.fields,
        }
    }
}

/// The current value of every uniform in one layout, as raw bytes.
#[derive(Debug, Clone)]
pub struct UniformBlock {
    layout: UniformLayout,
    bytes: Vec<u8>,
}

impl UniformBlock {
    /// A zero-initialised block.
    pub fn new(layout: UniformLayout) -> Self {
        let bytes = vec![0; layout.size() as usize];
        Self { layout, bytes }
    }

    pub fn layout(&self) -> &UniformLayout {
        &self.layout
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn set(&mut self, name: &str, value: UniformValue) -> Result<(), UniformError> {
        let (field, offset) = self.layout.locate(name)?;
        if field.kind != value.kind() {
            return Err(UniformError::KindMismatch {
                name: name.to_string(),
                expected: field.kind,
                actual: value.kind(),
            });
        }
        let offset = offset as usize;
        match value {
            UniformValue::Int(v) => self.write(offset, &v.to_le_bytes()),
            UniformValue::Float(v) => self.write_floats(offset, &[v]),
            UniformValue::Vec3(v) => self.write_floats(offset, &v.to_array()),
            UniformValue::Vec4(v) => self.write_floats(offset, &v.to_array()),
            UniformValue::Mat3(m) => {
                for (i, col) in m.to_cols_array_2d().iter().enumerate() {
                    self.write_floats(offset + i * 16, col);
                }
            }
            UniformValue::Mat4(m) => self.write_floats(offset, &m.to_cols_array()),
        }
        Ok(())
    }

    pub fn set_int(&mut self, name: &str, v: i32) -> Result<(), UniformError> {
        self.set(name, UniformValue::Int(v))
    }

    pub fn set_float(&mut self, name: &str, v: f32) -> Result<(), UniformError> {
        self.set(name, UniformValue::Float(v))
    }

    pub fn set_vec3(&mut self, name: &str, v: Vec3) -> Result<(), UniformError> {
        self.set(name, UniformValue::Vec3(v))
    }

    pub fn set_mat3(&mut self, name: &str, m: Mat3) -> Result<(), UniformError> {
        self.set(name, UniformValue::Mat3(m))
    }

    pub fn set_mat4(&mut self, name: &str, m: Mat4) -> Result<(), UniformError> {
        self.set(name, UniformValue::Mat4(m))
    }

    fn write_floats(&mut self, offset: usize, values: &[f32]) {
        for (i, v) in values.iter().enumerate() {
            self.write(offset + i * 4, &v.to_le_bytes());
        }
    }

    fn write(&mut self, offset: usize, bytes: &[u8]) {
        self.bytes[offset..offset + bytes.len()].copy_from_slice(bytes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_f32(block: &UniformBlock, offset: usize) -> f32 {
        f32::from_le_bytes(block.bytes()[offset..offset + 4].try_into().unwrap())
    }

    #[test]
    fn offsets_follow_wgsl_uniform_rules() {
        let layout = UniformLayout::builder()
            .field("model", UniformKind::Mat4)
            .field("normal_matrix", UniformKind::Mat3)
            .field("cam_pos", UniformKind::Vec3)
            .field("metallic", UniformKind::Float)
            .field("roughness", UniformKind::Float)
            .field("light_dir", UniformKind::Vec3)
            .build();

        assert_eq!(layout.offset_of("model").unwrap(), 0);
        assert_eq!(layout.offset_of("normal_matrix").unwrap(), 64);
        assert_eq!(layout.offset_of("cam_pos").unwrap(), 112);
        // a scalar packs into the vec3's trailing padding
        assert_eq!(layout.offset_of("metallic").unwrap(), 124);
        assert_eq!(layout.offset_of("roughness").unwrap(), 128);
        assert_eq!(layout.offset_of("light_dir").unwrap(), 144);
        assert_eq!(layout.size(), 160);
    }

    #[test]
    fn arrays_use_sixteen_byte_stride() {
        let layout = UniformLayout::builder()
            .field("ao", UniformKind::Float)
            .array("light_positions", UniformKind::Vec3, 4)
            .field("exposure", UniformKind::Float)
            .build();

        assert_eq!(layout.offset_of("light_positions").unwrap(), 16);
        assert_eq!(layout.offset_of("light_positions[0]").unwrap(), 16);
        assert_eq!(layout.offset_of("light_positions[3]").unwrap(), 64);
        assert_eq!(layout.offset_of("exposure").unwrap(), 80);
        assert_eq!(layout.size(), 96);
    }

    #[test]
    fn empty_layout_still_has_size() {
        assert_eq!(UniformLayout::builder().build().size(), 16);
    }

    #[test]
    fn set_writes_little_endian_values() {
        let layout = UniformLayout::builder()
            .field("near_plane", UniformKind::Float)
            .field("mode", UniformKind::Int)
            .field("normal_matrix", UniformKind::Mat3)
            .build();
        let mut block = UniformBlock::new(layout);

        block.set_float("near_plane", 0.5).unwrap();
        block.set_int("mode", -2).unwrap();
        block
            .set_mat3("normal_matrix", Mat3::from_cols(Vec3::X, Vec3::Y * 2.0, Vec3::Z * 3.0))
            .unwrap();

        assert_eq!(read_f32(&block, 0), 0.5);
        assert_eq!(i32::from_le_bytes(block.bytes()[4..8].try_into().unwrap()), -2);
        assert_eq!(read_f32(&block, 16), 1.0);
        assert_eq!(read_f32(&block, 32 + 4), 2.0);
        assert_eq!(read_f32(&block, 48 + 8), 3.0);
    }

    #[test]
    fn values_persist_until_overwritten() {
        let layout = UniformLayout::builder()
            .field("a", UniformKind::Float)
            .field("b", UniformKind::Float)
            .build();
        let mut block = UniformBlock::new(layout);
        block.set_float("a", 1.0).unwrap();
        block.set_float("b", 2.0).unwrap();
        block.set_float("b", 3.0).unwrap();
        assert_eq!(read_f32(&block, 0), 1.0);
        assert_eq!(read_f32(&block, 4), 3.0);
    }

    #[test]
    fn set_rejects_unknown_and_mismatched() {
        let layout = UniformLayout::builder()
            .field("model", UniformKind::Mat4)
            .array("colors", UniformKind::Vec3, 2)
            .build();
        let mut block = UniformBlock::new(layout);

        assert_eq!(
            block.set_float("missing", 1.0),
            Err(UniformError::Unknown("missing".into()))
        );
        assert!(matches!(
            block.set_float("model", 1.0),
            Err(UniformError::KindMismatch { .. })
        ));
        assert!(matches!(
            block.set_vec3("colors[2]", Vec3::ONE),
            Err(UniformError::IndexOutOfRange { index: 2, len: 2, .. })
        ));
    }
}
