//! Shape materials

const KIND_MASK: u32 = 0xF;
const SHADING_MASK: u32 = 0xF00;
const TEXTURE_TRANSLUCENT: u32 = 0x1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterialKind {
    Null,
    /// Flat color taken from the palette
    Palette,
    /// Flat color stored in the material
    Rgb,
    Texture,
    Unknown(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shading {
    Unspecified,
    None,
    Flat,
    Smooth,
}

/// What a renderer should sample for a material
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterialSource<'a> {
    Bitmap(&'a str),
    PaletteColor(u8),
    Rgb([u8; 3]),
    None,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub flags: u32,
    pub alpha: f32,
    pub palette_index: u32,
    pub rgb: [u8; 3],
    /// Bitmap file name, empty for untextured materials
    pub bitmap: String,
    pub surface_type: u32,
    pub elasticity: f32,
    pub friction: f32,
    pub use_default_props: bool,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            flags: 0,
            alpha: 1.0,
            palette_index: 0,
            rgb: [0; 3],
            bitmap: String::new(),
            surface_type: 0,
            elasticity: 0.0,
            friction: 0.0,
            use_default_props: true,
        }
    }
}

impl Material {
    /// A textured material referencing `bitmap`.
    pub fn textured(bitmap: impl Into<String>) -> Self {
        Self {
            flags: 3,
            bitmap: bitmap.into(),
            ..Self::default()
        }
    }

    pub fn kind(&self) -> MaterialKind {
        match self.flags & KIND_MASK {
            0 => MaterialKind::Null,
            1 => MaterialKind::Palette,
            2 => MaterialKind::Rgb,
            3 => MaterialKind::Texture,
            other => MaterialKind::Unknown(other),
        }
    }

    pub fn shading(&self) -> Shading {
        match self.flags & SHADING_MASK {
            0x100 => Shading::None,
            0x200 => Shading::Flat,
            0x300 => Shading::Smooth,
            _ => Shading::Unspecified,
        }
    }

    pub fn is_translucent(&self) -> bool {
        self.flags & TEXTURE_TRANSLUCENT != 0
    }

    /// Bitmaps win whenever a name is present, regardless of kind.
    pub fn source(&self) -> MaterialSource<'_> {
        if !self.bitmap.is_empty() {
            return MaterialSource::Bitmap(&self.bitmap);
        }
        match self.kind() {
            MaterialKind::Palette => MaterialSource::PaletteColor((self.palette_index & 0xFF) as u8),
            MaterialKind::Rgb => MaterialSource::Rgb(self.rgb),
            _ => MaterialSource::None,
        }
    }
}

/// Materials of a shape, laid out detail-major.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaterialList {
    pub detail_count: u32,
    pub materials: Vec<Material>,
}

impl MaterialList {
    pub fn new(materials: Vec<Material>) -> Self {
        Self {
            detail_count: 1,
            materials,
        }
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Material> {
        self.materials.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Material> {
        self.materials.iter()
    }

    /// Map a face material index to a list index.
    ///
    /// Negative indices are not drawn; indices past the end use material 0.
    pub fn resolve(&self, index: i32) -> Option<usize> {
        let index = usize::try_from(index).ok()?;
        if self.materials.is_empty() {
            None
        } else if index < self.materials.len() {
            Some(index)
        } else {
            Some(0)
        }
    }
}
