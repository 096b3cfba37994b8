//! Surface and cube materials.
//!
//! Each material is a small procedural texture plus PBR parameters. Textures
//! use repeat addressing so a surface can tile them once per world unit.

use bevy::asset::RenderAssetUsages;
use bevy::image::{ImageAddressMode, ImageSampler, ImageSamplerDescriptor};
use bevy::prelude::*;
use bevy::render::render_resource::{Extent3d, TextureDimension, TextureFormat};

/// Texture edge length in texels.
pub const TEXTURE_SIZE: u32 = 64;

/// Materials the user can cycle through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MaterialKind {
    /// Glowing grid lines, the default surface look.
    #[default]
    TronGrid,
    Granite,
    OakFloor,
    RustedIron,
    Floorboards,
}

impl MaterialKind {
    pub const ALL: [MaterialKind; 5] = [
        MaterialKind::TronGrid,
        MaterialKind::Granite,
        MaterialKind::OakFloor,
        MaterialKind::RustedIron,
        MaterialKind::Floorboards,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MaterialKind::TronGrid => "tron grid",
            MaterialKind::Granite => "granite",
            MaterialKind::OakFloor => "oak floor",
            MaterialKind::RustedIron => "rusted iron",
            MaterialKind::Floorboards => "floorboards",
        }
    }

    /// The material after this one, wrapping around.
    pub fn next(self) -> MaterialKind {
        let index = Self::ALL.iter().position(|kind| *kind == self).unwrap_or(0);
        Self::ALL[(index + 1) % Self::ALL.len()]
    }

    pub fn roughness(self) -> f32 {
        match self {
            MaterialKind::TronGrid => 0.3,
            MaterialKind::Granite => 0.6,
            MaterialKind::OakFloor | MaterialKind::Floorboards => 0.75,
            MaterialKind::RustedIron => 0.85,
        }
    }

    pub fn metallic(self) -> f32 {
        match self {
            MaterialKind::RustedIron => 0.7,
            _ => 0.0,
        }
    }

    /// Color of one texel of the material's tile.
    pub fn texel(self, x: u32, y: u32) -> [u8; 4] {
        match self {
            MaterialKind::TronGrid => {
                let line = x % 16 == 0 || y % 16 == 0;
                if line {
                    [40, 200, 255, 255]
                } else {
                    [6, 12, 24, 255]
                }
            }
            MaterialKind::Granite => {
                let speckle = (x.wrapping_mul(73) ^ y.wrapping_mul(151)) % 7;
                let v = 110 + speckle as u8 * 12;
                [v, v, v.saturating_add(6), 255]
            }
            MaterialKind::OakFloor => {
                let grain = ((x + y / 3) % 9) as u8;
                [150 + grain * 4, 105 + grain * 3, 60, 255]
            }
            MaterialKind::RustedIron => {
                let streak = ((x * 5 + y) % 13) as u8;
                [120 + streak * 6, 60 + streak * 2, 30, 255]
            }
            MaterialKind::Floorboards => {
                let seam = y % 16 == 0 || (x + (y / 16) * 24) % 48 == 0;
                if seam {
                    [60, 40, 25, 255]
                } else {
                    [180, 140, 95, 255]
                }
            }
        }
    }

    /// Tileable texture of this material.
    pub fn texture(self) -> Image {
        let mut data = Vec::with_capacity((TEXTURE_SIZE * TEXTURE_SIZE * 4) as usize);
        for y in 0..TEXTURE_SIZE {
            for x in 0..TEXTURE_SIZE {
                data.extend_from_slice(&self.texel(x, y));
            }
        }

        let mut image = Image::new(
            Extent3d {
                width: TEXTURE_SIZE,
                height: TEXTURE_SIZE,
                depth_or_array_layers: 1,
            },
            TextureDimension::D2,
            data,
            TextureFormat::Rgba8UnormSrgb,
            RenderAssetUsages::default(),
        );
        image.sampler = ImageSampler::Descriptor(ImageSamplerDescriptor {
            address_mode_u: ImageAddressMode::Repeat,
            address_mode_v: ImageAddressMode::Repeat,
            ..ImageSamplerDescriptor::linear()
        });
        image
    }
}

/// Per-face material of a surface box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaceMaterial {
    /// Fully transparent; the face is not drawn.
    Transparent,
    Textured(MaterialKind),
}

impl FaceMaterial {
    pub fn is_visible(self) -> bool {
        matches!(self, FaceMaterial::Textured(_))
    }
}
