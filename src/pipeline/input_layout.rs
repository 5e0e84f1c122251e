use serde::{Deserialize, Serialize};

/// Format of one vertex input element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputFormat {
    Float,
    Float2,
    Float3,
    Float4,
}

impl InputFormat {
    #[must_use]
    pub fn size(self) -> u32 {
        match self {
            Self::Float => 4,
            Self::Float2 => 8,
            Self::Float3 => 12,
            Self::Float4 => 16,
        }
    }

    #[must_use]
    pub fn as_wgpu(self) -> wgpu::VertexFormat {
        match self {
            Self::Float => wgpu::VertexFormat::Float32,
            Self::Float2 => wgpu::VertexFormat::Float32x2,
            Self::Float3 => wgpu::VertexFormat::Float32x3,
            Self::Float4 => wgpu::VertexFormat::Float32x4,
        }
    }
}

/// One element of a vertex input layout.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InputElement {
    /// Semantic name (e.g. `POSITION`), used for display only.
    pub semantic: String,
    pub format: InputFormat,
    /// Byte offset inside the vertex.
    pub offset: u32,
}

/// Vertex input description of a shader pass.
///
/// Element `i` is fed to `@location(i)` of the vertex entry point. Offsets
/// are packed in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InputLayout {
    elements: Vec<InputElement>,
}

impl InputLayout {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `POSITION: float3, NORMAL: float3, TEXCOORD: float2`, the layout of
    /// every [`primitives`](crate::geometry::primitives) mesh.
    #[must_use]
    pub fn position_normal_texcoord() -> Self {
        Self::new()
            .with("POSITION", InputFormat::Float3)
            .with("NORMAL", InputFormat::Float3)
            .with("TEXCOORD", InputFormat::Float2)
    }

    #[must_use]
    pub fn with(mut self, semantic: impl Into<String>, format: InputFormat) -> Self {
        self.add(semantic, format);
        self
    }

    pub fn add(&mut self, semantic: impl Into<String>, format: InputFormat) {
        let offset = self.stride();
        self.elements.push(InputElement {
            semantic: semantic.into(),
            format,
            offset,
        });
    }

    pub fn clear(&mut self) {
        self.elements.clear();
    }

    #[must_use]
    pub fn elements(&self) -> &[InputElement] {
        &self.elements
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Bytes covered by the declared elements.
    #[must_use]
    pub fn stride(&self) -> u32 {
        self.elements
            .last()
            .map_or(0, |e| e.offset + e.format.size())
    }

    /// wgpu attributes, `shader_location` = element index.
    #[must_use]
    pub fn wgpu_attributes(&self) -> Vec<wgpu::VertexAttribute> {
        self.elements
            .iter()
            .enumerate()
            .map(|(i, e)| wgpu::VertexAttribute {
                format: e.format.as_wgpu(),
                offset: u64::from(e.offset),
                shader_location: i as u32,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_are_packed_in_order() {
        let layout = InputLayout::position_normal_texcoord();
        let offsets: Vec<u32> = layout.elements().iter().map(|e| e.offset).collect();
        assert_eq!(offsets, vec![0, 12, 24]);
        assert_eq!(layout.stride(), 32);

        let attributes = layout.wgpu_attributes();
        assert_eq!(attributes[2].shader_location, 2);
        assert_eq!(attributes[2].format, wgpu::VertexFormat::Float32x2);
    }
}
