use std::collections::VecDeque;
use std::path::Path;

use glam::{
  Mat4,
  Vec2,
  Vec3,
};
use image::{
  Rgba,
  RgbaImage,
};

use crate::error::HalaMeshError;
use super::obj_writer::{
  HalaObjContent,
  write_mtl,
  write_obj,
};
use super::{
  marked_sibling_path,
  HalaConversion,
  HalaFormatConverter,
  HalaMeshFormat,
  MATERIAL_FILE_NAME,
  MERGED_TEXTURE_FILE_NAME,
};

const MATERIAL_NAME: &str = "material_0";

/// The glTF to OBJ converter.
/// All triangle primitives reachable from the scene are merged into one mesh in encounter order.
pub struct HalaGltfConverter;

/// The vertex range one primitive occupies in the merged mesh.
struct _PrimitiveRange {
  start: usize,
  end: usize,
  material_index: Option<usize>,
}

/// The merged geometry of a glTF document, in glTF texture convention.
#[derive(Default)]
struct _MergedMesh {
  positions: Vec<Vec3>,
  tex_coords: Vec<Vec2>,
  faces: Vec<[u32; 3]>,
  ranges: Vec<_PrimitiveRange>,
  missing_tex_coords: bool,
}

impl HalaFormatConverter for HalaGltfConverter {
  fn can_convert(&self, format: &HalaMeshFormat) -> bool {
    format.is_gltf_family()
  }

  fn convert(&self, path: &Path) -> Result<HalaConversion, HalaMeshError> {
    let (document, buffers, images) = gltf::import(path)
      .map_err(|err| HalaMeshError::conversion(&format!("Load glTF file \"{}\" failed.", path.to_string_lossy()), Some(Box::new(err))))?;

    let merged = Self::merge_meshes(&document, &buffers)?;
    if merged.faces.is_empty() {
      return Err(HalaMeshError::conversion(&format!("No triangles in glTF file \"{}\".", path.to_string_lossy()), None));
    }

    // Texture atlas of every material slot, only worth building when some material is textured.
    let slots = Self::material_slots(&merged);
    let is_textured = slots.iter().any(|slot| {
      slot.and_then(|index| document.materials().nth(index))
        .map_or(false, |material| material.pbr_metallic_roughness().base_color_texture().is_some())
    });
    let has_tex_coords = !merged.missing_tex_coords;
    if is_textured && !has_tex_coords {
      log::warn!("Some primitives of \"{}\" have no texture coordinates, the textures are dropped.", path.to_string_lossy());
    }

    let texture_path = if is_textured && has_tex_coords {
      let tiles = slots.iter()
        .map(|slot| Self::material_tile(&document, &images, *slot))
        .collect::<Vec<_>>();
      let tile_size = tiles.iter().map(|tile| tile.width().max(tile.height())).max().unwrap_or(1);
      let atlas = pack_tiles(&tiles, tile_size);
      let texture_path = path.with_file_name(MERGED_TEXTURE_FILE_NAME);
      atlas.save(&texture_path)
        .map_err(|err| HalaMeshError::conversion(&format!("Save merged texture \"{}\" failed.", texture_path.to_string_lossy()), Some(Box::new(err))))?;
      log::info!("Merged {} materials into \"{}\".", slots.len(), texture_path.to_string_lossy());
      Some(texture_path)
    } else {
      None
    };

    let tex_coords = if has_tex_coords {
      let num_of_slots = if texture_path.is_some() { slots.len() } else { 0 };
      Some(Self::obj_tex_coords(&merged, &slots, num_of_slots))
    } else {
      None
    };

    let converted_path = marked_sibling_path(path, "-converted", "obj");
    write_obj(&converted_path, &HalaObjContent {
      vertices: &merged.positions,
      tex_coords: tex_coords.as_deref(),
      faces: &merged.faces,
      material_lib: Some(MATERIAL_FILE_NAME),
      material_name: Some(MATERIAL_NAME),
    })?;
    let material_path = path.with_file_name(MATERIAL_FILE_NAME);
    write_mtl(&material_path, MATERIAL_NAME, texture_path.as_ref().map(|_| MERGED_TEXTURE_FILE_NAME))?;

    log::debug!(
      "Converted glTF file \"{}\": {} vertices, {} triangles.",
      path.to_string_lossy(), merged.positions.len(), merged.faces.len(),
    );
    Ok(HalaConversion {
      converted_path,
      filtered_path: None,
      material_path,
      texture_path,
    })
  }
}

/// The implementation of the glTF converter.
impl HalaGltfConverter {
  /// Merge every triangle primitive reachable from the scene, applying node world transforms.
  /// param document: The glTF document.
  /// param buffers: The glTF buffers.
  /// return: The merged mesh.
  fn merge_meshes(document: &gltf::Document, buffers: &[gltf::buffer::Data]) -> Result<_MergedMesh, HalaMeshError> {
    let mut instances = Vec::new();
    match document.default_scene().or_else(|| document.scenes().next()) {
      Some(scene) => {
        log::debug!("Merging scene \"{}\".", scene.name().unwrap_or("<Unnamed>"));
        let mut node_queue = VecDeque::new();
        node_queue.extend(scene.nodes().map(|node| (Mat4::IDENTITY, node)));
        while let Some((parent_transform, node)) = node_queue.pop_front() {
          let world_transform = parent_transform * Mat4::from_cols_array_2d(&node.transform().matrix());
          if let Some(mesh) = node.mesh() {
            instances.push((mesh, world_transform));
          }
          node_queue.extend(node.children().map(|child| (world_transform, child)));
        }
      },
      None => {
        instances.extend(document.meshes().map(|mesh| (mesh, Mat4::IDENTITY)));
      },
    }

    let mut merged = _MergedMesh::default();
    for (mesh, transform) in instances {
      let mesh_name = mesh.name().unwrap_or("<Unnamed>");
      for primitive in mesh.primitives() {
        Self::merge_primitive(&mut merged, &primitive, mesh_name, &transform, buffers)?;
      }
    }
    Ok(merged)
  }

  /// Append one primitive to the merged mesh.
  fn merge_primitive(
    merged: &mut _MergedMesh,
    primitive: &gltf::Primitive,
    mesh_name: &str,
    transform: &Mat4,
    buffers: &[gltf::buffer::Data],
  ) -> Result<(), HalaMeshError> {
    let mode = primitive.mode();
    if !matches!(mode, gltf::mesh::Mode::Triangles | gltf::mesh::Mode::TriangleStrip | gltf::mesh::Mode::TriangleFan) {
      log::warn!("Skipping {:?} primitive {} of mesh \"{}\".", mode, primitive.index(), mesh_name);
      return Ok(());
    }
    log::debug!("Merging primitive {} from mesh \"{}\".", primitive.index(), mesh_name);

    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| data.0.as_slice()));
    let positions = reader.read_positions()
      .ok_or(HalaMeshError::conversion(&format!("Read positions from mesh \"{}\" failed.", mesh_name), None))?
      .map(Vec3::from)
      .collect::<Vec<_>>();
    let tex_coords = reader.read_tex_coords(0)
      .map(|tex_coords| tex_coords.into_f32().map(Vec2::from).collect::<Vec<_>>());
    let indices = match reader.read_indices() {
      Some(indices) => indices.into_u32().collect::<Vec<_>>(),
      None => (0..positions.len() as u32).collect(),
    };
    if let Some(index) = indices.iter().find(|&&index| index as usize >= positions.len()) {
      return Err(HalaMeshError::conversion(
        &format!("Mesh \"{}\" index {} out of range (0..{}).", mesh_name, index, positions.len()),
        None,
      ));
    }

    let base = merged.positions.len() as u32;
    merged.faces.extend(triangles_of(mode, &indices).into_iter().map(|[a, b, c]| [a + base, b + base, c + base]));
    merged.positions.extend(positions.iter().map(|p| transform.transform_point3(*p)));
    match tex_coords {
      Some(tex_coords) if tex_coords.len() == positions.len() => merged.tex_coords.extend(tex_coords),
      _ => {
        merged.missing_tex_coords = true;
        merged.tex_coords.extend(std::iter::repeat(Vec2::ZERO).take(positions.len()));
      },
    }
    merged.ranges.push(_PrimitiveRange {
      start: base as usize,
      end: merged.positions.len(),
      material_index: primitive.material().index(),
    });
    Ok(())
  }

  /// The distinct materials in encounter order; `None` is the default material.
  fn material_slots(merged: &_MergedMesh) -> Vec<Option<usize>> {
    let mut slots = Vec::new();
    for range in merged.ranges.iter() {
      if !slots.contains(&range.material_index) {
        slots.push(range.material_index);
      }
    }
    slots
  }

  /// The tile image of one material: its base color texture, or its base color factor.
  fn material_tile(document: &gltf::Document, images: &[gltf::image::Data], slot: Option<usize>) -> RgbaImage {
    let material = match slot.and_then(|index| document.materials().nth(index)) {
      Some(material) => material,
      None => return RgbaImage::from_pixel(1, 1, Rgba([255, 255, 255, 255])),
    };
    log::debug!("Packing material \"{}\".", material.name().unwrap_or("<Unnamed>"));
    let pbr = material.pbr_metallic_roughness();
    let texture = pbr.base_color_texture()
      .and_then(|info| images.get(info.texture().source().index()))
      .and_then(to_rgba_image);
    texture.unwrap_or_else(|| {
      let [r, g, b, a] = pbr.base_color_factor().map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8);
      RgbaImage::from_pixel(1, 1, Rgba([r, g, b, a]))
    })
  }

  /// The OBJ texture coordinates: V flipped, and moved into the material tile when an atlas exists.
  fn obj_tex_coords(merged: &_MergedMesh, slots: &[Option<usize>], num_of_slots: usize) -> Vec<Vec2> {
    let mut tex_coords = merged.tex_coords.clone();
    for range in merged.ranges.iter() {
      let slot = slots.iter().position(|slot| *slot == range.material_index).unwrap_or(0);
      for uv in tex_coords[range.start..range.end].iter_mut() {
        *uv = if num_of_slots > 0 {
          Vec2::new((slot as f32 + wrap_unit(uv.x)) / num_of_slots as f32, 1.0 - wrap_unit(uv.y))
        } else {
          Vec2::new(uv.x, 1.0 - uv.y)
        };
      }
    }
    tex_coords
  }
}

/// The triangles of an index list drawn with the given mode.
fn triangles_of(mode: gltf::mesh::Mode, indices: &[u32]) -> Vec<[u32; 3]> {
  match mode {
    gltf::mesh::Mode::Triangles => indices.chunks_exact(3).map(|tri| [tri[0], tri[1], tri[2]]).collect(),
    gltf::mesh::Mode::TriangleStrip => (0..indices.len().saturating_sub(2))
      .map(|i| if i % 2 == 0 {
        [indices[i], indices[i + 1], indices[i + 2]]
      } else {
        [indices[i + 1], indices[i], indices[i + 2]]
      })
      .collect(),
    gltf::mesh::Mode::TriangleFan => (1..indices.len().saturating_sub(1))
      .map(|i| [indices[0], indices[i], indices[i + 1]])
      .collect(),
    _ => Vec::new(),
  }
}

/// Keep [0, 1] as is and wrap anything outside into it.
fn wrap_unit(x: f32) -> f32 {
  if (0.0..=1.0).contains(&x) {
    x
  } else {
    x.rem_euclid(1.0)
  }
}

/// Convert decoded glTF image data to RGBA8.
fn to_rgba_image(image_data: &gltf::image::Data) -> Option<RgbaImage> {
  let pixels = match image_data.format {
    gltf::image::Format::R8G8B8A8 => image_data.pixels.clone(),
    gltf::image::Format::R8G8B8 => {
      let mut pixels = Vec::with_capacity(image_data.pixels.len() / 3 * 4);
      for rgb in image_data.pixels.chunks_exact(3) {
        pixels.extend_from_slice(&[rgb[0], rgb[1], rgb[2], 255]);
      }
      pixels
    },
    gltf::image::Format::R8 => image_data.pixels.iter().flat_map(|&l| [l, l, l, 255]).collect(),
    gltf::image::Format::R8G8 => image_data.pixels.chunks_exact(2).flat_map(|la| [la[0], la[0], la[0], la[1]]).collect(),
    format => {
      log::warn!("Texture format {:?} is not packed, using the base color instead.", format);
      return None;
    },
  };
  RgbaImage::from_raw(image_data.width, image_data.height, pixels)
}

/// Pack square tiles left to right into one image.
/// param tiles: The tile images, resized to `tile_size` when needed.
/// param tile_size: The tile edge length.
/// return: The atlas, `tiles.len() * tile_size` wide and `tile_size` high.
pub(crate) fn pack_tiles(tiles: &[RgbaImage], tile_size: u32) -> RgbaImage {
  let mut atlas = RgbaImage::new(tile_size * tiles.len().max(1) as u32, tile_size);
  for (i, tile) in tiles.iter().enumerate() {
    let x = i as i64 * tile_size as i64;
    if tile.width() == tile_size && tile.height() == tile_size {
      image::imageops::replace(&mut atlas, tile, x, 0);
    } else {
      let resized = image::imageops::resize(tile, tile_size, tile_size, image::imageops::FilterType::Triangle);
      image::imageops::replace(&mut atlas, &resized, x, 0);
    }
  }
  atlas
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn triangle_list() {
    assert_eq!(triangles_of(gltf::mesh::Mode::Triangles, &[0, 1, 2, 2, 1, 3]), vec![[0, 1, 2], [2, 1, 3]]);
  }

  #[test]
  fn triangle_strip_keeps_winding() {
    assert_eq!(triangles_of(gltf::mesh::Mode::TriangleStrip, &[0, 1, 2, 3]), vec![[0, 1, 2], [2, 1, 3]]);
  }

  #[test]
  fn triangle_fan() {
    assert_eq!(triangles_of(gltf::mesh::Mode::TriangleFan, &[0, 1, 2, 3]), vec![[0, 1, 2], [0, 2, 3]]);
  }

  #[test]
  fn lines_have_no_triangles() {
    assert!(triangles_of(gltf::mesh::Mode::Lines, &[0, 1, 2, 3]).is_empty());
  }

  #[test]
  fn wrap_only_outside_unit_range() {
    assert_eq!(wrap_unit(1.0), 1.0);
    assert_eq!(wrap_unit(0.25), 0.25);
    assert!((wrap_unit(1.25) - 0.25).abs() < 1e-6);
    assert!((wrap_unit(-0.25) - 0.75).abs() < 1e-6);
  }

  #[test]
  fn tiles_are_packed_horizontally() {
    let red = RgbaImage::from_pixel(4, 4, Rgba([255, 0, 0, 255]));
    let blue = RgbaImage::from_pixel(1, 1, Rgba([0, 0, 255, 255]));
    let atlas = pack_tiles(&[red, blue], 4);
    assert_eq!(atlas.dimensions(), (8, 4));
    assert_eq!(atlas.get_pixel(0, 0), &Rgba([255, 0, 0, 255]));
    assert_eq!(atlas.get_pixel(7, 3), &Rgba([0, 0, 255, 255]));
    assert_eq!(atlas.width() / atlas.height(), 2);
  }

  #[test]
  fn rgb_image_gets_alpha() {
    let data = gltf::image::Data {
      pixels: vec![10, 20, 30, 40, 50, 60],
      format: gltf::image::Format::R8G8B8,
      width: 2,
      height: 1,
    };
    let image = to_rgba_image(&data).unwrap();
    assert_eq!(image.get_pixel(1, 0), &Rgba([40, 50, 60, 255]));
  }

  #[test]
  fn tex_coords_move_into_their_tile() {
    let merged = _MergedMesh {
      positions: vec![Vec3::ZERO; 4],
      tex_coords: vec![Vec2::new(0.0, 0.0), Vec2::new(1.0, 1.0), Vec2::new(0.5, 0.25), Vec2::new(1.5, 0.0)],
      faces: Vec::new(),
      ranges: vec![
        _PrimitiveRange { start: 0, end: 2, material_index: Some(3) },
        _PrimitiveRange { start: 2, end: 4, material_index: None },
      ],
      missing_tex_coords: false,
    };
    let slots = HalaGltfConverter::material_slots(&merged);
    assert_eq!(slots, vec![Some(3), None]);

    let atlas_uvs = HalaGltfConverter::obj_tex_coords(&merged, &slots, 2);
    assert_eq!(atlas_uvs[0], Vec2::new(0.0, 1.0));
    assert_eq!(atlas_uvs[1], Vec2::new(0.5, 0.0));
    assert_eq!(atlas_uvs[2], Vec2::new(0.75, 0.75));
    assert!((atlas_uvs[3] - Vec2::new(0.75, 1.0)).length() < 1e-6);

    let plain_uvs = HalaGltfConverter::obj_tex_coords(&merged, &slots, 0);
    assert_eq!(plain_uvs[3], Vec2::new(1.5, 1.0));
  }
}
