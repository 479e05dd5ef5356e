//! STL decoding (binary and ASCII).
//!
//! Binary layout:
//!
//! | bytes    | contents                                              |
//! |----------|-------------------------------------------------------|
//! | 0..80    | header (ignored)                                      |
//! | 80..84   | triangle count, `u32` little-endian                   |
//! | 84..     | 50 bytes per triangle: normal, 3 vertices, attribute  |
//!
//! Facet normals are skipped in both variants.

use crate::error::{MeshError, Result};
use crate::mesh::TriangleMesh;
use crate::MeshFormat;

const HEADER_LEN: usize = 80;
const TRIANGLE_LEN: usize = 50;

/// Upper bound on the triangle count a binary header may declare.
pub const MAX_TRIANGLES: u32 = 50_000_000;

/// Decode an STL file, detecting binary vs ASCII from the byte layout.
pub fn parse_stl(bytes: &[u8]) -> Result<TriangleMesh> {
    if let Some(count) = binary_triangle_count(bytes) {
        tracing::debug!(triangles = count, "decoding binary STL");
        return parse_binary(bytes, count);
    }
    if looks_ascii(bytes) {
        tracing::debug!(size = bytes.len(), "decoding ASCII STL");
        return parse_ascii(bytes);
    }
    if bytes.len() < HEADER_LEN + 4 {
        return Err(corrupt("file too small for binary header"));
    }
    let declared = u32::from_le_bytes([bytes[80], bytes[81], bytes[82], bytes[83]]);
    Err(corrupt(format!(
        "header declares {} triangles but file has {} bytes",
        declared,
        bytes.len()
    )))
}

/// Triangle count if `bytes` is laid out as a binary STL.
///
/// Exporters sometimes pad the end of the file, so up to one header's worth
/// of trailing bytes is tolerated.
fn binary_triangle_count(bytes: &[u8]) -> Option<usize> {
    if bytes.len() < HEADER_LEN + 4 {
        return None;
    }
    let count = u32::from_le_bytes([bytes[80], bytes[81], bytes[82], bytes[83]]);
    if count > MAX_TRIANGLES {
        return None;
    }
    let expected = HEADER_LEN + 4 + count as usize * TRIANGLE_LEN;
    (bytes.len() >= expected && bytes.len() < expected + HEADER_LEN).then_some(count as usize)
}

fn looks_ascii(bytes: &[u8]) -> bool {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    bytes[start..].starts_with(b"solid")
}

fn parse_binary(bytes: &[u8], count: usize) -> Result<TriangleMesh> {
    let mut mesh = TriangleMesh::with_capacity(count);
    let body = &bytes[HEADER_LEN + 4..HEADER_LEN + 4 + count * TRIANGLE_LEN];

    for (t, record) in body.chunks_exact(TRIANGLE_LEN).enumerate() {
        // Skip the 12-byte normal.
        let mut corners = [[0.0f64; 3]; 3];
        for (v, corner) in corners.iter_mut().enumerate() {
            for (axis, value) in corner.iter_mut().enumerate() {
                let offset = 12 + v * 12 + axis * 4;
                let raw = f32::from_le_bytes([
                    record[offset],
                    record[offset + 1],
                    record[offset + 2],
                    record[offset + 3],
                ]);
                if !raw.is_finite() {
                    return Err(corrupt(format!("non-finite coordinate in triangle {t}")));
                }
                *value = raw as f64;
            }
        }
        mesh.push_triangle(corners[0], corners[1], corners[2]);
    }

    Ok(mesh)
}

fn parse_ascii(bytes: &[u8]) -> Result<TriangleMesh> {
    let text = std::str::from_utf8(bytes).map_err(|_| corrupt("ASCII STL is not valid UTF-8"))?;

    let mut mesh = TriangleMesh::new();
    let mut facet: Option<Vec<[f64; 3]>> = None;
    let mut in_loop = false;

    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let mut tokens = line.split_ascii_whitespace();
        let Some(keyword) = tokens.next() else {
            continue;
        };

        match keyword.to_ascii_lowercase().as_str() {
            "solid" | "endsolid" => {
                if facet.is_some() {
                    return Err(at_line(line_no, "solid boundary inside a facet"));
                }
            }
            "facet" => {
                if facet.is_some() {
                    return Err(at_line(line_no, "facet opened before previous endfacet"));
                }
                facet = Some(Vec::with_capacity(3));
            }
            "outer" => {
                if facet.is_none() || in_loop {
                    return Err(at_line(line_no, "unexpected outer loop"));
                }
                in_loop = true;
            }
            "vertex" => {
                let corners = match (&mut facet, in_loop) {
                    (Some(corners), true) => corners,
                    _ => return Err(at_line(line_no, "vertex outside of a facet loop")),
                };
                if corners.len() == 3 {
                    return Err(at_line(line_no, "facet has more than three vertices"));
                }
                let mut p = [0.0; 3];
                for value in &mut p {
                    let token = tokens
                        .next()
                        .ok_or_else(|| at_line(line_no, "vertex needs three coordinates"))?;
                    *value = parse_coordinate(token)
                        .ok_or_else(|| at_line(line_no, format!("invalid coordinate `{token}`")))?;
                }
                corners.push(p);
            }
            "endloop" => {
                if !in_loop {
                    return Err(at_line(line_no, "endloop without outer loop"));
                }
                in_loop = false;
            }
            "endfacet" => {
                let corners = facet
                    .take()
                    .ok_or_else(|| at_line(line_no, "endfacet without facet"))?;
                if in_loop {
                    return Err(at_line(line_no, "endfacet before endloop"));
                }
                if corners.len() != 3 {
                    return Err(at_line(
                        line_no,
                        format!("facet has {} vertices, expected 3", corners.len()),
                    ));
                }
                mesh.push_triangle(corners[0], corners[1], corners[2]);
            }
            other => {
                return Err(at_line(line_no, format!("unexpected keyword `{other}`")));
            }
        }
    }

    if facet.is_some() {
        return Err(corrupt("file ends inside a facet"));
    }

    Ok(mesh)
}

fn parse_coordinate(token: &str) -> Option<f64> {
    token.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn corrupt(message: impl Into<String>) -> MeshError {
    MeshError::corrupt(MeshFormat::Stl, message)
}

fn at_line(line: usize, message: impl AsRef<str>) -> MeshError {
    corrupt(format!("line {line}: {}", message.as_ref()))
}

/// Serialize triangles as a binary STL. Used to build fixtures.
#[cfg(test)]
pub(crate) fn to_binary_stl(triangles: &[[[f32; 3]; 3]]) -> Vec<u8> {
    let mut data = Vec::with_capacity(84 + triangles.len() * TRIANGLE_LEN);
    let mut header = [b' '; HEADER_LEN];
    header[..11].copy_from_slice(b"solid-ish  ");
    data.extend_from_slice(&header);
    data.extend_from_slice(&(triangles.len() as u32).to_le_bytes());
    for tri in triangles {
        // Deliberately bogus normal; decoders must ignore it.
        for n in [9.0f32, 9.0, 9.0] {
            data.extend_from_slice(&n.to_le_bytes());
        }
        for v in tri {
            for c in v {
                data.extend_from_slice(&c.to_le_bytes());
            }
        }
        data.extend_from_slice(&0u16.to_le_bytes());
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRI: [[f32; 3]; 3] = [[0.0, 0.0, 0.0], [10.0, 0.0, 0.0], [0.0, 10.0, 0.0]];

    #[test]
    fn test_binary_roundtrip_order() {
        let bytes = to_binary_stl(&[TRI, TRI]);
        let mesh = parse_stl(&bytes).unwrap();
        assert_eq!(mesh.num_triangles(), 2);
        assert_eq!(&mesh.vertices[..9], &[0.0, 0.0, 0.0, 10.0, 0.0, 0.0, 0.0, 10.0, 0.0]);
    }

    #[test]
    fn test_binary_header_starting_with_solid() {
        let mut bytes = to_binary_stl(&[TRI]);
        bytes[..5].copy_from_slice(b"solid");
        let mesh = parse_stl(&bytes).unwrap();
        assert_eq!(mesh.num_triangles(), 1);
    }

    #[test]
    fn test_binary_trailing_padding_tolerated() {
        let mut bytes = to_binary_stl(&[TRI]);
        bytes.extend_from_slice(&[0u8; 16]);
        assert_eq!(parse_stl(&bytes).unwrap().num_triangles(), 1);
    }

    #[test]
    fn test_binary_truncated() {
        let mut bytes = to_binary_stl(&[TRI, TRI]);
        bytes.truncate(bytes.len() - 10);
        assert!(matches!(parse_stl(&bytes), Err(MeshError::CorruptFile { .. })));
    }

    #[test]
    fn test_binary_nan_rejected() {
        let bytes = to_binary_stl(&[[[f32::NAN, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]]);
        assert!(matches!(parse_stl(&bytes), Err(MeshError::CorruptFile { .. })));
    }

    #[test]
    fn test_ascii() {
        let text = "solid part\n\
            facet normal 0 0 1\n\
              outer loop\n\
                vertex 0 0 0\n\
                vertex 1 0 0\n\
                vertex 0 1 0\n\
              endloop\n\
            endfacet\n\
            FACET NORMAL 0 0 1\n\
              OUTER LOOP\n\
                VERTEX 0 0 1\n\
                VERTEX 1 0 1\n\
                VERTEX 0 1 1.5e0\n\
              ENDLOOP\n\
            ENDFACET\n\
            endsolid part\n";
        let mesh = parse_stl(text.as_bytes()).unwrap();
        assert_eq!(mesh.num_triangles(), 2);
        assert_eq!(mesh.vertices[17], 1.5);
    }

    #[test]
    fn test_ascii_multiple_solids() {
        let facet = "facet normal 0 0 0\nouter loop\nvertex 0 0 0\nvertex 1 0 0\nvertex 0 1 0\nendloop\nendfacet\n";
        let text = format!("solid a\n{facet}endsolid a\nsolid b\n{facet}{facet}endsolid b\n");
        assert_eq!(parse_stl(text.as_bytes()).unwrap().num_triangles(), 3);
    }

    #[test]
    fn test_ascii_wrong_vertex_count() {
        let text = "solid x\nfacet normal 0 0 1\nouter loop\nvertex 0 0 0\nvertex 1 0 0\nendloop\nendfacet\nendsolid x\n";
        let err = parse_stl(text.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("line 7"), "{err}");
    }

    #[test]
    fn test_ascii_bad_number() {
        let text = "solid x\nfacet normal 0 0 1\nouter loop\nvertex 0 zero 0\n";
        assert!(matches!(parse_stl(text.as_bytes()), Err(MeshError::CorruptFile { .. })));
    }

    #[test]
    fn test_ascii_infinite_coordinate() {
        let text = "solid x\nfacet normal 0 0 1\nouter loop\nvertex inf 0 0\nvertex 1 0 0\nvertex 0 1 0\nendloop\nendfacet\nendsolid\n";
        assert!(matches!(parse_stl(text.as_bytes()), Err(MeshError::CorruptFile { .. })));
    }

    #[test]
    fn test_ascii_unterminated() {
        let text = "solid x\nfacet normal 0 0 1\nouter loop\nvertex 0 0 0\n";
        assert!(matches!(parse_stl(text.as_bytes()), Err(MeshError::CorruptFile { .. })));
    }

    #[test]
    fn test_garbage() {
        assert!(matches!(parse_stl(b"hello"), Err(MeshError::CorruptFile { .. })));
        assert!(matches!(parse_stl(&[0xffu8; 200]), Err(MeshError::CorruptFile { .. })));
    }

    #[test]
    fn test_empty_ascii_solid() {
        let mesh = parse_stl(b"solid empty\nendsolid empty\n").unwrap();
        assert!(mesh.is_empty());
    }
}
