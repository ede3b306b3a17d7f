//! Typed, bounds-checked decoding of glTF accessors.
//!
//! An accessor describes `count` rows inside a buffer view. Each row holds
//! `component_count(shape)` little-endian values of one numeric width, and
//! consecutive rows are `byteStride` bytes apart (tightly packed when the
//! buffer view has no stride).
//!
//! ```ignore
//! use vrm_core::accessor::read_accessor;
//!
//! let positions = read_accessor(doc, bin, 0)?.to_vec3()?;
//! ```

use byteorder::{ByteOrder, LittleEndian};
use num_traits::{Bounded, ToPrimitive};

use crate::document::Document;
use crate::error::ValidationError;
use crate::math::{Mat4, UVec4, Vec2, Vec3, Vec4};

/// Numeric width of one accessor component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentType {
    F32,
    U32,
    U16,
    U8,
}

impl ComponentType {
    /// Maps a glTF `componentType` code.
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            5126 => Some(ComponentType::F32),
            5125 => Some(ComponentType::U32),
            5123 => Some(ComponentType::U16),
            5121 => Some(ComponentType::U8),
            _ => None,
        }
    }

    pub fn byte_length(self) -> usize {
        match self {
            ComponentType::F32 | ComponentType::U32 => 4,
            ComponentType::U16 => 2,
            ComponentType::U8 => 1,
        }
    }

    pub fn is_integral(self) -> bool {
        !matches!(self, ComponentType::F32)
    }

    pub fn name(self) -> &'static str {
        match self {
            ComponentType::F32 => "FLOAT",
            ComponentType::U32 => "UNSIGNED_INT",
            ComponentType::U16 => "UNSIGNED_SHORT",
            ComponentType::U8 => "UNSIGNED_BYTE",
        }
    }
}

/// Row shape of an accessor (`type` in glTF JSON).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementShape {
    Scalar,
    Vec2,
    Vec3,
    Vec4,
    Mat4,
}

impl ElementShape {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "SCALAR" => Some(ElementShape::Scalar),
            "VEC2" => Some(ElementShape::Vec2),
            "VEC3" => Some(ElementShape::Vec3),
            "VEC4" => Some(ElementShape::Vec4),
            "MAT4" => Some(ElementShape::Mat4),
            _ => None,
        }
    }

    pub fn component_count(self) -> usize {
        match self {
            ElementShape::Scalar => 1,
            ElementShape::Vec2 => 2,
            ElementShape::Vec3 => 3,
            ElementShape::Vec4 => 4,
            ElementShape::Mat4 => 16,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ElementShape::Scalar => "SCALAR",
            ElementShape::Vec2 => "VEC2",
            ElementShape::Vec3 => "VEC3",
            ElementShape::Vec4 => "VEC4",
            ElementShape::Mat4 => "MAT4",
        }
    }
}

/// One decoded component value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Component {
    Float(f32),
    Uint(u32),
}

/// One decoded row: a bare scalar, or the ordered components of a tuple.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Element<'a> {
    Scalar(Component),
    Tuple(&'a [Component]),
}

/// Owned result of [`read_accessor`].
#[derive(Debug, Clone)]
pub struct DecodedAccessor {
    index: usize,
    component_type: ComponentType,
    shape: ElementShape,
    normalized: bool,
    values: Vec<Component>,
}

impl DecodedAccessor {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn component_type(&self) -> ComponentType {
        self.component_type
    }

    pub fn shape(&self) -> ElementShape {
        self.shape
    }

    pub fn normalized(&self) -> bool {
        self.normalized
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.values.len() / self.shape.component_count()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Components of row `i`, in declaration order.
    pub fn row(&self, i: usize) -> Option<&[Component]> {
        let n = self.shape.component_count();
        self.values.get(i * n..(i + 1) * n)
    }

    pub fn element(&self, i: usize) -> Option<Element<'_>> {
        self.row(i).map(|row| match row {
            [single] if self.shape == ElementShape::Scalar => Element::Scalar(*single),
            tuple => Element::Tuple(tuple),
        })
    }

    pub fn elements(&self) -> impl Iterator<Item = Element<'_>> + '_ {
        (0..self.len()).filter_map(move |i| self.element(i))
    }

    pub fn to_vec2(&self) -> Result<Vec<Vec2>, ValidationError> {
        self.float_rows::<2>(ElementShape::Vec2)
    }

    pub fn to_vec3(&self) -> Result<Vec<Vec3>, ValidationError> {
        self.float_rows::<3>(ElementShape::Vec3)
    }

    pub fn to_vec4(&self) -> Result<Vec<Vec4>, ValidationError> {
        self.float_rows::<4>(ElementShape::Vec4)
    }

    pub fn to_uvec4(&self) -> Result<Vec<UVec4>, ValidationError> {
        self.uint_rows::<4>(ElementShape::Vec4)
    }

    pub fn to_u32_scalars(&self) -> Result<Vec<u32>, ValidationError> {
        Ok(self
            .uint_rows::<1>(ElementShape::Scalar)?
            .into_iter()
            .map(|[v]| v)
            .collect())
    }

    /// MAT4 rows, interpreted as column-major like every glTF matrix.
    pub fn to_mat4(&self) -> Result<Vec<Mat4>, ValidationError> {
        Ok(self
            .float_rows::<16>(ElementShape::Mat4)?
            .iter()
            .map(Mat4::from_cols_array)
            .collect())
    }

    fn expect_shape(&self, expected: ElementShape) -> Result<(), ValidationError> {
        if self.shape != expected {
            return Err(ValidationError::UnexpectedShape {
                accessor: self.index,
                expected: expected.name(),
                found: self.shape.name(),
            });
        }
        Ok(())
    }

    fn float_rows<const N: usize>(&self, shape: ElementShape) -> Result<Vec<[f32; N]>, ValidationError> {
        self.expect_shape(shape)?;
        let ty = self.component_type;
        let normalized = self.normalized;
        Ok(self
            .values
            .chunks_exact(N)
            .map(|row| {
                let mut out = [0.0f32; N];
                for (dst, c) in out.iter_mut().zip(row) {
                    *dst = match *c {
                        Component::Float(v) => v,
                        Component::Uint(v) if normalized => unorm(ty, v),
                        Component::Uint(v) => v as f32,
                    };
                }
                out
            })
            .collect())
    }

    fn uint_rows<const N: usize>(&self, shape: ElementShape) -> Result<Vec<[u32; N]>, ValidationError> {
        self.expect_shape(shape)?;
        if !self.component_type.is_integral() {
            return Err(ValidationError::UnexpectedComponentType {
                accessor: self.index,
                expected: "unsigned integer",
                found: self.component_type.name(),
            });
        }
        Ok(self
            .values
            .chunks_exact(N)
            .map(|row| {
                let mut out = [0u32; N];
                for (dst, c) in out.iter_mut().zip(row) {
                    if let Component::Uint(v) = *c {
                        *dst = v;
                    }
                }
                out
            })
            .collect())
    }
}

/// Maps a normalized unsigned integer onto `[0, 1]`.
fn unorm(ty: ComponentType, value: u32) -> f32 {
    fn scale<T: Bounded + ToPrimitive>(value: u32) -> f32 {
        let max = T::max_value().to_f32().unwrap_or(1.0);
        (value as f32 / max).min(1.0)
    }

    match ty {
        ComponentType::U8 => scale::<u8>(value),
        ComponentType::U16 => scale::<u16>(value),
        ComponentType::U32 => scale::<u32>(value),
        ComponentType::F32 => value as f32,
    }
}

/// Decode accessor `accessor_index` from the BIN chunk.
///
/// Every precondition of the supported subset is checked before any byte is
/// read, and the full row range is validated up front so a corrupt `count`
/// cannot trigger an oversized allocation or a truncated read.
pub fn read_accessor(
    doc: &Document,
    bin: Option<&[u8]>,
    accessor_index: usize,
) -> Result<DecodedAccessor, ValidationError> {
    doc.validate_single_buffer()?;

    let accessor = doc.accessor(accessor_index)?;
    if accessor.sparse.is_some() {
        return Err(ValidationError::SparseAccessor {
            accessor: accessor_index,
        });
    }

    let component_type = ComponentType::from_code(accessor.component_type).ok_or(
        ValidationError::UnsupportedComponentType {
            accessor: accessor_index,
            component_type: accessor.component_type,
        },
    )?;
    let shape = ElementShape::from_name(&accessor.accessor_type).ok_or_else(|| {
        ValidationError::UnsupportedElementShape {
            accessor: accessor_index,
            shape: accessor.accessor_type.clone(),
        }
    })?;

    let buffer_view_index = accessor.buffer_view.ok_or(ValidationError::MissingBufferView {
        accessor: accessor_index,
    })?;
    let view = buffer_view_slice(doc, bin, buffer_view_index)?;
    let buffer_view = doc.buffer_view(buffer_view_index)?;

    let component_size = component_type.byte_length();
    let component_count = shape.component_count();
    let element_size = component_size * component_count;
    let stride = buffer_view.byte_stride.unwrap_or(element_size);
    if stride < element_size {
        return Err(ValidationError::InvalidStride {
            buffer_view: buffer_view_index,
            stride,
            element_size,
        });
    }

    let count = accessor.count;
    if count == 0 {
        return Ok(DecodedAccessor {
            index: accessor_index,
            component_type,
            shape,
            normalized: accessor.normalized,
            values: Vec::new(),
        });
    }

    // Rows are monotonic in offset, so the last row bounds them all.
    let last_row = count - 1;
    let last_end = last_row
        .checked_mul(stride)
        .and_then(|v| v.checked_add(accessor.byte_offset))
        .and_then(|v| v.checked_add(element_size));
    match last_end {
        Some(end) if end <= view.len() => {}
        _ => {
            return Err(ValidationError::AccessorBounds {
                accessor: accessor_index,
                row: last_row,
                end: buffer_view
                    .byte_offset
                    .saturating_add(last_end.unwrap_or(usize::MAX)),
                available: buffer_view.byte_offset + view.len(),
            });
        }
    }

    let mut values = Vec::with_capacity(count * component_count);
    for row in 0..count {
        let start = accessor.byte_offset + row * stride;
        let bytes = &view[start..start + element_size];
        for raw in bytes.chunks_exact(component_size) {
            values.push(match component_type {
                ComponentType::F32 => Component::Float(LittleEndian::read_f32(raw)),
                ComponentType::U32 => Component::Uint(LittleEndian::read_u32(raw)),
                ComponentType::U16 => Component::Uint(LittleEndian::read_u16(raw) as u32),
                ComponentType::U8 => Component::Uint(raw[0] as u32),
            });
        }
    }

    Ok(DecodedAccessor {
        index: accessor_index,
        component_type,
        shape,
        normalized: accessor.normalized,
        values,
    })
}

/// Bytes of buffer view `index` within the BIN chunk.
pub fn buffer_view_slice<'a>(
    doc: &Document,
    bin: Option<&'a [u8]>,
    index: usize,
) -> Result<&'a [u8], ValidationError> {
    let buffer_view = doc.buffer_view(index)?;
    if buffer_view.buffer != 0 {
        return Err(ValidationError::UnsupportedBuffer {
            buffer_view: index,
            buffer: buffer_view.buffer,
        });
    }

    let bin = bin.ok_or(ValidationError::MissingBinaryChunk)?;
    let start = buffer_view.byte_offset;
    match start.checked_add(buffer_view.byte_length) {
        Some(end) if end <= bin.len() => Ok(&bin[start..end]),
        end => Err(ValidationError::BufferViewBounds {
            buffer_view: index,
            end: end.unwrap_or(usize::MAX),
            available: bin.len(),
        }),
    }
}
