use std::path::PathBuf;

use base64::{Engine, engine::general_purpose::STANDARD};
use cgmath::Rotation3;
use flow_ar::{
    data_structures::scene_graph,
    error::LoadError,
    resources::{
        AssetLoader, GltfLoader,
        animation::{AnimationPlayer, Interpolation, Keyframes},
    },
};

use crate::common::test_utils::{approx_eq, approx_quat, approx_vec};

mod common;

const SOFA_GLTF: &str = r#"{
    "asset": { "version": "2.0" },
    "scene": 0,
    "scenes": [{ "name": "Showroom", "nodes": [0] }],
    "nodes": [
        { "name": "Root", "children": [1, 2, 3] },
        { "name": "Node" },
        { "name": "Text_Sofa", "translation": [0.0, 1.0, 0.0] },
        { "scale": [2.0, 2.0, 2.0] }
    ]
}"#;

const NO_SCENE_GLTF: &str = r#"{ "asset": { "version": "2.0" }, "nodes": [{ "name": "Lonely" }] }"#;

/// Animated sofa: node 0 turns a quarter around Y (linear), node 1 rises by two
/// (cubic spline) and node 2 snaps from scale 1 to 3 (step), all over one second.
const ANIMATED_GLTF: &str = r#"{
    "asset": { "version": "2.0" },
    "scenes": [{ "nodes": [0, 2] }],
    "nodes": [
        { "name": "Sofa", "children": [1] },
        { "name": "Text_Sofa" },
        { "name": "Lamp" }
    ],
    "buffers": [{ BUFFER_SOURCE "byteLength": 136 }],
    "bufferViews": [
        { "buffer": 0, "byteOffset": 0, "byteLength": 8 },
        { "buffer": 0, "byteOffset": 8, "byteLength": 32 },
        { "buffer": 0, "byteOffset": 40, "byteLength": 72 },
        { "buffer": 0, "byteOffset": 112, "byteLength": 24 }
    ],
    "accessors": [
        { "bufferView": 0, "componentType": 5126, "count": 2, "type": "SCALAR", "min": [0.0], "max": [1.0] },
        { "bufferView": 1, "componentType": 5126, "count": 2, "type": "VEC4" },
        { "bufferView": 2, "componentType": 5126, "count": 6, "type": "VEC3" },
        { "bufferView": 3, "componentType": 5126, "count": 2, "type": "VEC3" }
    ],
    "animations": [{
        "name": "Idle",
        "samplers": [
            { "input": 0, "output": 1, "interpolation": "LINEAR" },
            { "input": 0, "output": 2, "interpolation": "CUBICSPLINE" },
            { "input": 0, "output": 3, "interpolation": "STEP" }
        ],
        "channels": [
            { "sampler": 0, "target": { "node": 0, "path": "rotation" } },
            { "sampler": 1, "target": { "node": 1, "path": "translation" } },
            { "sampler": 2, "target": { "node": 2, "path": "scale" } }
        ]
    }]
}"#;

fn animation_buffer() -> Vec<u8> {
    let half = std::f32::consts::FRAC_1_SQRT_2;
    #[rustfmt::skip]
    let floats: [f32; 34] = [
        // timestamps
        0.0, 1.0,
        // rotations as [x, y, z, w]
        0.0, 0.0, 0.0, 1.0,
        0.0, half, 0.0, half,
        // (in-tangent, value, out-tangent) per key
        0.0, 5.0, 0.0,  0.0, 0.0, 0.0,  0.0, 5.0, 0.0,
        0.0, 7.0, 0.0,  0.0, 2.0, 0.0,  0.0, 7.0, 0.0,
        // scales
        1.0, 1.0, 1.0,
        3.0, 3.0, 3.0,
    ];
    floats.iter().flat_map(|f| f.to_le_bytes()).collect()
}

fn chunk(kind: &[u8; 4], mut data: Vec<u8>, pad: u8) -> Vec<u8> {
    while data.len() % 4 != 0 {
        data.push(pad);
    }
    let mut out = (data.len() as u32).to_le_bytes().to_vec();
    out.extend_from_slice(kind);
    out.extend(data);
    out
}

fn animated_glb() -> Vec<u8> {
    let json = ANIMATED_GLTF.replace("BUFFER_SOURCE", "");
    let mut body = chunk(b"JSON", json.into_bytes(), b' ');
    body.extend(chunk(b"BIN\0", animation_buffer(), 0));

    let mut glb = b"glTF".to_vec();
    glb.extend(2u32.to_le_bytes());
    glb.extend((12 + body.len() as u32).to_le_bytes());
    glb.extend(body);
    glb
}

fn animated_gltf_with_data_uri() -> String {
    let uri = format!(
        "\"uri\": \"data:application/octet-stream;base64,{}\",",
        STANDARD.encode(animation_buffer())
    );
    ANIMATED_GLTF.replace("BUFFER_SOURCE", &uri)
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("flow-ar-{}-{}", name, std::process::id()));
    std::fs::create_dir_all(dir.join("models")).expect("create scratch dir");
    dir
}

#[test]
fn parse_builds_the_node_tree() {
    let asset = GltfLoader::parse(SOFA_GLTF.as_bytes()).expect("valid asset");

    assert_eq!(asset.root.borrow().name, "Showroom");
    assert_eq!(asset.nodes.len(), 4);
    assert!(asset.clips.is_empty());

    let root = asset.root.borrow().children[0].clone();
    assert_eq!(root.borrow().name, "Root");
    let names: Vec<String> = root
        .borrow()
        .children
        .iter()
        .map(|child| child.borrow().name.clone())
        .collect();
    assert_eq!(names, ["Node", "Text_Sofa", "node_3"]);

    let text = scene_graph::find(&asset.root, "Text_Sofa").expect("text node");
    assert!(approx_eq(text.borrow().transform.position.y, 1.0));
    assert!(std::rc::Rc::ptr_eq(&text, &asset.nodes[&2]));
    assert!(approx_eq(asset.nodes[&3].borrow().transform.scale.x, 2.0));
}

#[test]
fn parse_rejects_assets_without_a_scene() {
    let result = GltfLoader::parse(NO_SCENE_GLTF.as_bytes());
    assert!(matches!(result, Err(LoadError::NoScene)));
}

#[test]
fn parse_rejects_garbage() {
    let result = GltfLoader::parse(b"definitely not gltf");
    assert!(matches!(result, Err(LoadError::Gltf(_))));
}

#[tokio::test]
async fn load_reads_from_the_asset_root() {
    let dir = scratch_dir("load");
    std::fs::write(dir.join("models/sofa.gltf"), SOFA_GLTF).expect("write asset");

    let loader = GltfLoader::new(dir.to_string_lossy());
    let asset = loader.load("/models/sofa.gltf").await.expect("asset loads");
    assert!(scene_graph::find(&asset.root, "Node").is_some());
    assert!(scene_graph::find(&asset.root, "Text_Sofa").is_some());

    std::fs::remove_dir_all(dir).ok();
}

#[tokio::test]
async fn missing_file_is_a_fetch_error() {
    let dir = scratch_dir("missing");
    let loader = GltfLoader::new(dir.to_string_lossy());

    match loader.load("/models/immersaltest.glb").await {
        Err(LoadError::Fetch { url, .. }) => assert_eq!(url, "/models/immersaltest.glb"),
        Err(e) => panic!("unexpected error: {}", e),
        Ok(_) => panic!("load should fail"),
    }

    std::fs::remove_dir_all(dir).ok();
}

#[tokio::test]
async fn missing_external_buffer_names_the_buffer() {
    let dir = scratch_dir("buffer");
    let gltf = r#"{
        "asset": { "version": "2.0" },
        "buffers": [{ "uri": "sofa.bin", "byteLength": 4 }],
        "scenes": [{ "nodes": [0] }],
        "nodes": [{ "name": "Root" }]
    }"#;
    std::fs::write(dir.join("models/sofa.gltf"), gltf).expect("write asset");

    let loader = GltfLoader::new(dir.to_string_lossy());
    match loader.load("/models/sofa.gltf").await {
        Err(LoadError::Fetch { url, .. }) => assert_eq!(url, "/models/sofa.bin"),
        Err(e) => panic!("unexpected error: {}", e),
        Ok(_) => panic!("load should fail"),
    }

    std::fs::remove_dir_all(dir).ok();
}

#[test]
fn glb_animation_is_extracted() {
    let asset = GltfLoader::parse(&animated_glb()).expect("valid glb");
    assert_eq!(asset.clips.len(), 1);

    let clip = &asset.clips[0];
    assert_eq!(clip.name, "Idle");
    assert!(approx_eq(clip.duration(), 1.0));
    let targets: Vec<usize> = clip.channels.iter().map(|c| c.target).collect();
    assert_eq!(targets, [0, 1, 2]);
    let interpolations: Vec<Interpolation> =
        clip.channels.iter().map(|c| c.interpolation).collect();
    assert_eq!(
        interpolations,
        [
            Interpolation::Linear,
            Interpolation::CubicSpline,
            Interpolation::Step
        ]
    );

    let quarter_turn = cgmath::Quaternion::from_angle_y(cgmath::Deg(90.0));
    match &clip.channels[0].keyframes {
        Keyframes::Rotation(rotations) => {
            assert_eq!(rotations.len(), 2);
            assert!(approx_quat(rotations[1], quarter_turn));
        }
        _ => panic!("expected rotation keyframes"),
    }
    // tangents are dropped, only the value of each key survives
    match &clip.channels[1].keyframes {
        Keyframes::Translation(translations) => {
            assert_eq!(translations.len(), 2);
            assert!(approx_vec(translations[1], cgmath::Vector3::new(0.0, 2.0, 0.0)));
        }
        _ => panic!("expected translation keyframes"),
    }
}

#[test]
fn glb_animation_drives_the_nodes() {
    let asset = GltfLoader::parse(&animated_glb()).expect("valid glb");
    let clip = asset.clips.into_iter().next().expect("one clip");
    let mut player = AnimationPlayer::new(clip, &asset.nodes);
    player.advance(0.5);

    let sofa = scene_graph::find(&asset.root, "Sofa").expect("sofa");
    let eighth_turn = cgmath::Quaternion::from_angle_y(cgmath::Deg(45.0));
    assert!(approx_quat(sofa.borrow().transform.rotation, eighth_turn));

    let text = scene_graph::find(&asset.root, "Text_Sofa").expect("text");
    assert!(approx_vec(
        text.borrow().transform.position,
        cgmath::Vector3::new(0.0, 1.0, 0.0)
    ));

    let lamp = scene_graph::find(&asset.root, "Lamp").expect("lamp");
    assert!(approx_eq(lamp.borrow().transform.scale.y, 1.0));
}

#[test]
fn data_uri_buffers_are_decoded() {
    let gltf = animated_gltf_with_data_uri();
    let asset = GltfLoader::parse(gltf.as_bytes()).expect("embedded buffer");
    assert_eq!(asset.clips.len(), 1);
    assert!(approx_eq(asset.clips[0].duration(), 1.0));
}

#[test]
fn unknown_data_uri_is_rejected() {
    let gltf = ANIMATED_GLTF.replace("BUFFER_SOURCE", r#""uri": "data:text/plain;base64,AAAA","#);
    let result = GltfLoader::parse(gltf.as_bytes());
    assert!(matches!(
        result,
        Err(LoadError::BufferFormatUnsupported { index: 0 })
    ));
}

#[tokio::test]
async fn load_reads_glb_and_embedded_gltf_alike() {
    let dir = scratch_dir("embedded");
    std::fs::write(dir.join("models/sofa.glb"), animated_glb()).expect("write glb");
    std::fs::write(
        dir.join("models/sofa.gltf"),
        animated_gltf_with_data_uri(),
    )
    .expect("write gltf");

    let loader = GltfLoader::new(dir.to_string_lossy());
    for url in ["/models/sofa.glb", "/models/sofa.gltf"] {
        let asset = loader.load(url).await.expect("asset loads");
        assert_eq!(asset.clips.len(), 1, "{}", url);
        assert_eq!(asset.nodes.len(), 3, "{}", url);
    }

    std::fs::remove_dir_all(dir).ok();
}
