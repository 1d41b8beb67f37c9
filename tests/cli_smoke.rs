use std::path::PathBuf;

fn exe() -> PathBuf {
    std::env::var_os("CARGO_BIN_EXE_pointcloud")
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            let mut p = PathBuf::from("target").join("debug");
            p.push(if cfg!(windows) {
                "pointcloud.exe"
            } else {
                "pointcloud"
            });
            p
        })
}

fn fixture_dir(name: &str) -> PathBuf {
    let dir = PathBuf::from("target").join("cli_smoke").join(name);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(
        dir.join("shape.svg"),
        r##"<svg xmlns="http://www.w3.org/2000/svg">
            <rect x="0" y="0" width="40" height="30" fill="#3366cc"/>
            <defs><path d="M0,0 L500,500"/></defs>
        </svg>"##,
    )
    .unwrap();
    dir
}

#[test]
fn cli_frame_writes_png() {
    let dir = fixture_dir("frame");
    let scene_path = dir.join("scene.json");
    let out_path = dir.join("out.png");
    let _ = std::fs::remove_file(&out_path);

    let scene = serde_json::json!({
        "source": "shape.svg",
        "config": {"width": 64, "height": 48, "entry_duration": 0.2, "seed": 1},
        "fps": 30,
        "frames": 20,
        "pointer": [{"frame": 10, "kind": "move", "x": 20, "y": 20}]
    });
    std::fs::write(&scene_path, serde_json::to_vec_pretty(&scene).unwrap()).unwrap();

    let status = std::process::Command::new(exe())
        .args(["frame", "--in"])
        .arg(&scene_path)
        .args(["--frame", "15", "--out"])
        .arg(&out_path)
        .status()
        .unwrap();

    assert!(status.success());
    let img = image::open(&out_path).unwrap().to_rgba8();
    assert_eq!(img.dimensions(), (64, 48));
    assert!(img.pixels().any(|p| p.0[3] > 0));
}

#[test]
fn cli_sample_prints_shape_stats() {
    let dir = fixture_dir("sample");
    let output = std::process::Command::new(exe())
        .args(["sample", "--svg"])
        .arg(dir.join("shape.svg"))
        .output()
        .unwrap();

    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let shapes = report["shapes"].as_array().unwrap();
    assert_eq!(shapes.len(), 1);
    assert_eq!(shapes[0]["color"], "rgb(51,102,204)");
    assert_eq!(shapes[0]["points"], 141);
    assert_eq!(report["total_points"], 141);
}

#[test]
fn cli_reports_a_bad_scene() {
    let dir = fixture_dir("bad");
    let scene_path = dir.join("scene.json");
    std::fs::write(&scene_path, r#"{"source": "shape.svg", "frames": 0}"#).unwrap();

    let status = std::process::Command::new(exe())
        .args(["frame", "--in"])
        .arg(&scene_path)
        .args(["--frame", "0", "--out"])
        .arg(dir.join("never.png"))
        .status()
        .unwrap();
    assert!(!status.success());
}
