//! 3MF decoding.
//!
//! A 3MF file is a ZIP package. The root model part is located through
//! `_rels/.rels`, then its XML is streamed for `<object>` meshes,
//! `<components>` and `<build>` items. Component and item transforms are
//! applied and the model `unit` is converted to millimeters, so the result
//! is in the same space as an STL export of the same part.

use std::collections::HashMap;
use std::io::{Cursor, Read};

use nalgebra::{Matrix4, Vector4};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use zip::ZipArchive;

use crate::error::{MeshError, Result};
use crate::mesh::TriangleMesh;
use crate::stl::MAX_TRIANGLES;
use crate::MeshFormat;

const RELS_PATH: &str = "_rels/.rels";
const DEFAULT_MODEL_PATH: &str = "3D/3dmodel.model";
const MODEL_REL_SUFFIX: &str = "/3dmodel";
const MAX_COMPONENT_DEPTH: usize = 32;
/// Largest decompressed package part that will be read.
const MAX_PART_BYTES: u64 = 512 * 1024 * 1024;
/// Vertex budget for the expanded model; keeps indices within `u32`.
const MAX_VERTICES: u64 = 3 * MAX_TRIANGLES as u64;

/// Decode a 3MF package into a single mesh containing every build item.
pub fn parse_3mf(bytes: &[u8]) -> Result<TriangleMesh> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| corrupt(format!("not a ZIP archive: {e}")))?;

    let path = root_model_path(&mut archive)?;
    tracing::debug!(part = %path, entries = archive.len(), "decoding 3MF model part");

    let xml = read_entry(&mut archive, &path)?;
    let model = parse_model_xml(&xml)?;
    model.into_mesh()
}

type Archive<'a> = ZipArchive<Cursor<&'a [u8]>>;

/// Find the root model part, preferring the package relationship.
fn root_model_path(archive: &mut Archive<'_>) -> Result<String> {
    if let Some(rels) = find_entry(archive, RELS_PATH) {
        let xml = read_entry(archive, &rels)?;
        if let Some(target) = model_relationship_target(&xml)? {
            return find_entry(archive, target.trim_start_matches('/')).ok_or_else(|| {
                corrupt(format!("relationship points at missing part `{target}`"))
            });
        }
    }
    if let Some(path) = find_entry(archive, DEFAULT_MODEL_PATH) {
        return Ok(path);
    }
    archive
        .file_names()
        .find(|name| name.to_ascii_lowercase().ends_with(".model"))
        .map(str::to_string)
        .ok_or_else(|| corrupt("package has no 3D model part"))
}

/// Entry name matching `wanted`, ignoring ASCII case.
fn find_entry(archive: &Archive<'_>, wanted: &str) -> Option<String> {
    archive
        .file_names()
        .find(|name| name.eq_ignore_ascii_case(wanted))
        .map(str::to_string)
}

fn read_entry(archive: &mut Archive<'_>, path: &str) -> Result<String> {
    let entry = archive
        .by_name(path)
        .map_err(|e| corrupt(format!("cannot open `{path}`: {e}")))?;
    if entry.size() > MAX_PART_BYTES {
        return Err(too_large(path));
    }
    let mut buf = Vec::new();
    entry
        .take(MAX_PART_BYTES + 1)
        .read_to_end(&mut buf)
        .map_err(|e| corrupt(format!("cannot read `{path}`: {e}")))?;
    if buf.len() as u64 > MAX_PART_BYTES {
        return Err(too_large(path));
    }
    String::from_utf8(buf).map_err(|_| corrupt(format!("`{path}` is not valid UTF-8")))
}

fn too_large(path: &str) -> MeshError {
    corrupt(format!("`{path}` exceeds {MAX_PART_BYTES} bytes once decompressed"))
}

fn model_relationship_target(xml: &str) -> Result<Option<String>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e))
                if e.local_name().as_ref() == b"Relationship" =>
            {
                let is_model = attribute(&e, b"Type")?
                    .is_some_and(|t| t.to_ascii_lowercase().ends_with(MODEL_REL_SUFFIX));
                if is_model {
                    return attribute(&e, b"Target");
                }
            }
            Ok(Event::Eof) => return Ok(None),
            Ok(_) => {}
            Err(e) => return Err(xml_error(&reader, e)),
        }
    }
}

/// A parsed `<object>`.
#[derive(Debug, Default)]
struct Object {
    mesh: Option<TriangleMesh>,
    components: Vec<Component>,
}

#[derive(Debug, Clone, Copy)]
struct Component {
    object_id: u32,
    transform: Matrix4<f64>,
}

/// The root model part after parsing.
#[derive(Debug)]
struct Model {
    /// Millimeters per model unit.
    unit_scale: f64,
    objects: HashMap<u32, Object>,
    build: Vec<Component>,
}

fn parse_model_xml(xml: &str) -> Result<Model> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut model = Model {
        unit_scale: 1.0,
        objects: HashMap::new(),
        build: Vec::new(),
    };
    let mut current: Option<(u32, Object)> = None;

    loop {
        let event = reader.read_event().map_err(|e| xml_error(&reader, e))?;
        let (e, is_empty) = match event {
            Event::Start(e) => (e, false),
            Event::Empty(e) => (e, true),
            Event::End(e) => {
                if e.local_name().as_ref() == b"object" {
                    if let Some((id, object)) = current.take() {
                        finish_object(&mut model, id, object)?;
                    }
                }
                continue;
            }
            Event::Eof => break,
            _ => continue,
        };

        match e.local_name().as_ref() {
            b"model" => {
                if let Some(unit) = attribute(&e, b"unit")? {
                    model.unit_scale = unit_scale(&unit)?;
                }
            }
            b"object" => {
                let id = required_u32(&e, b"id")?;
                if is_empty {
                    finish_object(&mut model, id, Object::default())?;
                } else {
                    current = Some((id, Object::default()));
                }
            }
            b"mesh" => {
                let (_, object) = current
                    .as_mut()
                    .ok_or_else(|| corrupt("<mesh> outside of an <object>"))?;
                object.mesh = Some(TriangleMesh::new());
            }
            b"vertex" => {
                let mesh = current_mesh(&mut current, "vertex")?;
                let p = [
                    required_f64(&e, b"x")?,
                    required_f64(&e, b"y")?,
                    required_f64(&e, b"z")?,
                ];
                mesh.push_vertex(p);
            }
            b"triangle" => {
                let mesh = current_mesh(&mut current, "triangle")?;
                let tri = [
                    required_u32(&e, b"v1")?,
                    required_u32(&e, b"v2")?,
                    required_u32(&e, b"v3")?,
                ];
                mesh.indices.extend_from_slice(&tri);
            }
            b"component" => {
                let (_, object) = current
                    .as_mut()
                    .ok_or_else(|| corrupt("<component> outside of an <object>"))?;
                object.components.push(parse_component(&e)?);
            }
            b"item" => model.build.push(parse_component(&e)?),
            _ => {}
        }
    }

    if current.is_some() {
        return Err(corrupt("document ends inside an <object>"));
    }
    Ok(model)
}

fn current_mesh<'a>(
    current: &'a mut Option<(u32, Object)>,
    element: &str,
) -> Result<&'a mut TriangleMesh> {
    current
        .as_mut()
        .and_then(|(_, object)| object.mesh.as_mut())
        .ok_or_else(|| corrupt(format!("<{element}> outside of a <mesh>")))
}

fn finish_object(model: &mut Model, id: u32, object: Object) -> Result<()> {
    if let Some(mesh) = &object.mesh {
        let vertex_count = mesh.num_vertices() as u32;
        if let Some(bad) = mesh.indices.iter().find(|&&i| i >= vertex_count) {
            return Err(corrupt(format!(
                "object {id} references vertex {bad} but has {vertex_count} vertices"
            )));
        }
    }
    if model.objects.insert(id, object).is_some() {
        return Err(corrupt(format!("duplicate object id {id}")));
    }
    Ok(())
}

fn parse_component(e: &BytesStart<'_>) -> Result<Component> {
    let object_id = required_u32(e, b"objectid")?;
    let transform = match attribute(e, b"transform")? {
        Some(text) => parse_transform(&text)?,
        None => Matrix4::identity(),
    };
    Ok(Component {
        object_id,
        transform,
    })
}

/// Parse a 3MF `m00 m01 m02 m10 m11 m12 m20 m21 m22 m30 m31 m32` transform.
///
/// 3MF multiplies row vectors on the left; the returned matrix acts on
/// column vectors.
fn parse_transform(text: &str) -> Result<Matrix4<f64>> {
    let values: Vec<f64> = text
        .split_ascii_whitespace()
        .map(|t| t.parse::<f64>().ok().filter(|v| v.is_finite()))
        .collect::<Option<_>>()
        .ok_or_else(|| corrupt(format!("invalid transform `{text}`")))?;
    let [m00, m01, m02, m10, m11, m12, m20, m21, m22, m30, m31, m32] = values[..] else {
        return Err(corrupt(format!("transform needs 12 values, got {}", values.len())));
    };
    Ok(Matrix4::new(
        m00, m10, m20, m30, //
        m01, m11, m21, m31, //
        m02, m12, m22, m32, //
        0.0, 0.0, 0.0, 1.0,
    ))
}

fn unit_scale(unit: &str) -> Result<f64> {
    Ok(match unit {
        "micron" => 0.001,
        "millimeter" => 1.0,
        "centimeter" => 10.0,
        "inch" => 25.4,
        "foot" => 304.8,
        "meter" => 1000.0,
        other => return Err(corrupt(format!("unknown unit `{other}`"))),
    })
}

impl Model {
    fn into_mesh(self) -> Result<TriangleMesh> {
        let scale = Matrix4::new_scaling(self.unit_scale);

        let roots: Vec<(u32, Matrix4<f64>)> = if self.build.is_empty() {
            // No build section: emit every mesh object in id order.
            let mut ids: Vec<u32> = self
                .objects
                .iter()
                .filter(|(_, o)| o.mesh.is_some())
                .map(|(&id, _)| id)
                .collect();
            ids.sort_unstable();
            ids.into_iter().map(|id| (id, scale)).collect()
        } else {
            self.build
                .iter()
                .map(|item| (item.object_id, scale * item.transform))
                .collect()
        };

        let mut sizes = HashMap::new();
        let (mut triangles, mut vertices) = (0u64, 0u64);
        for &(id, _) in &roots {
            let (t, v) = self.expanded_size(id, 0, &mut sizes)?;
            triangles = triangles.saturating_add(t);
            vertices = vertices.saturating_add(v);
        }
        if triangles > u64::from(MAX_TRIANGLES) || vertices > MAX_VERTICES {
            return Err(corrupt(format!(
                "model expands to {triangles} triangles and {vertices} vertices, \
                 limit is {MAX_TRIANGLES} triangles"
            )));
        }
        tracing::debug!(triangles, vertices, "expanding 3MF build");

        let mut out = TriangleMesh::new();
        for (id, transform) in &roots {
            self.emit(*id, transform, &mut out)?;
        }
        Ok(out)
    }

    /// Triangle and vertex counts of object `id` with its components
    /// expanded. Also rejects missing references and cycles.
    fn expanded_size(
        &self,
        id: u32,
        depth: usize,
        sizes: &mut HashMap<u32, (u64, u64)>,
    ) -> Result<(u64, u64)> {
        if let Some(&size) = sizes.get(&id) {
            return Ok(size);
        }
        if depth > MAX_COMPONENT_DEPTH {
            return Err(corrupt(format!("component nesting too deep at object {id}")));
        }
        let object = self.object(id)?;

        let (mut triangles, mut vertices) = object.mesh.as_ref().map_or((0, 0), |mesh| {
            (mesh.num_triangles() as u64, mesh.num_vertices() as u64)
        });
        for component in &object.components {
            let (t, v) = self.expanded_size(component.object_id, depth + 1, sizes)?;
            triangles = triangles.saturating_add(t);
            vertices = vertices.saturating_add(v);
        }
        sizes.insert(id, (triangles, vertices));
        Ok((triangles, vertices))
    }

    fn object(&self, id: u32) -> Result<&Object> {
        self.objects
            .get(&id)
            .ok_or_else(|| corrupt(format!("reference to missing object {id}")))
    }

    /// Append object `id` and its components. Sizes and references were
    /// checked by [`Model::expanded_size`].
    fn emit(&self, id: u32, transform: &Matrix4<f64>, out: &mut TriangleMesh) -> Result<()> {
        let object = self.object(id)?;

        if let Some(mesh) = &object.mesh {
            let mut placed = TriangleMesh {
                vertices: Vec::with_capacity(mesh.vertices.len()),
                indices: mesh.indices.clone(),
            };
            for chunk in mesh.vertices.chunks_exact(3) {
                let p = transform * Vector4::new(chunk[0], chunk[1], chunk[2], 1.0);
                if !(p.x.is_finite() && p.y.is_finite() && p.z.is_finite()) {
                    return Err(corrupt(format!("object {id} transforms to a non-finite vertex")));
                }
                placed.push_vertex([p.x, p.y, p.z]);
            }
            out.merge(&placed);
        }

        for component in &object.components {
            self.emit(component.object_id, &(transform * component.transform), out)?;
        }
        Ok(())
    }
}

fn attribute(e: &BytesStart<'_>, name: &[u8]) -> Result<Option<String>> {
    for attr in e.attributes() {
        let attr = attr.map_err(|err| corrupt(format!("malformed attribute: {err}")))?;
        if attr.key.local_name().as_ref() == name {
            let value = attr
                .unescape_value()
                .map_err(|err| corrupt(format!("malformed attribute value: {err}")))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

fn required(e: &BytesStart<'_>, name: &[u8]) -> Result<String> {
    attribute(e, name)?.ok_or_else(|| {
        corrupt(format!(
            "<{}> is missing `{}`",
            String::from_utf8_lossy(e.local_name().as_ref()),
            String::from_utf8_lossy(name)
        ))
    })
}

fn required_f64(e: &BytesStart<'_>, name: &[u8]) -> Result<f64> {
    let text = required(e, name)?;
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| corrupt(format!("invalid number `{text}`")))
}

fn required_u32(e: &BytesStart<'_>, name: &[u8]) -> Result<u32> {
    let text = required(e, name)?;
    text.trim()
        .parse::<u32>()
        .map_err(|_| corrupt(format!("invalid index `{text}`")))
}

fn xml_error(reader: &Reader<&[u8]>, err: quick_xml::Error) -> MeshError {
    corrupt(format!("XML error at byte {}: {err}", reader.buffer_position()))
}

fn corrupt(message: impl Into<String>) -> MeshError {
    MeshError::corrupt(MeshFormat::ThreeMf, message)
}
