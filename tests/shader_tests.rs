//! Validate the viewer's WGSL without a GPU.

use evergreen::{GeometryKind, InstanceData};

const SHADER: &str = include_str!("../src/shader.wgsl");

fn parse() -> naga::Module {
    match naga::front::wgsl::parse_str(SHADER) {
        Ok(module) => module,
        Err(err) => panic!("WGSL parse failed:\n{}", err.emit_to_string(SHADER)),
    }
}

#[test]
fn test_shader_validates() {
    let module = parse();
    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    );
    if let Err(err) = validator.validate(&module) {
        panic!("WGSL validation failed:\n{}", err.emit_to_string(SHADER));
    }
}

#[test]
fn test_shader_entry_points() {
    let module = parse();
    let names: Vec<&str> = module.entry_points.iter().map(|e| e.name.as_str()).collect();
    assert!(names.contains(&"vs_main"));
    assert!(names.contains(&"fs_main"));
}

#[test]
fn test_kind_constants_match_geometry() {
    for (name, kind) in [
        ("POINT_SPRITE", GeometryKind::PointSprite),
        ("SPHERE", GeometryKind::Sphere),
        ("BOX", GeometryKind::Box),
        ("OCTAHEDRON", GeometryKind::Octahedron),
        ("CYLINDER", GeometryKind::Cylinder),
    ] {
        let line = format!("const {}: u32 = {}u;", name, kind as u32);
        assert!(SHADER.contains(&line), "missing `{}`", line);
    }
}

#[test]
fn test_instance_stride() {
    assert_eq!(std::mem::size_of::<InstanceData>(), 64);
}
