use std::path::PathBuf;

fn exe() -> PathBuf {
    std::env::var_os("CARGO_BIN_EXE_brotpool")
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            let mut p = PathBuf::from("target").join("debug");
            p.push(if cfg!(windows) {
                "brotpool.exe"
            } else {
                "brotpool"
            });
            p
        })
}

#[test]
fn cli_frame_writes_png() {
    let dir = PathBuf::from("target").join("cli_smoke");
    std::fs::create_dir_all(&dir).unwrap();

    let view_path = dir.join("view.json");
    let out_path = dir.join("out.png");
    let _ = std::fs::remove_file(&out_path);

    let view = brotpool::ViewState {
        center_x: -0.5,
        iterations: 64,
        ..brotpool::ViewState::default()
    };
    let f = std::fs::File::create(&view_path).unwrap();
    serde_json::to_writer_pretty(f, &view).unwrap();

    let status = std::process::Command::new(exe())
        .args(["frame", "--width", "48", "--height", "32", "--workers", "2"])
        .args(["--tile-size", "16", "--double", "--view"])
        .arg(&view_path)
        .arg("--out")
        .arg(&out_path)
        .status()
        .unwrap();

    assert!(status.success());
    let img = image::open(&out_path).unwrap().to_rgba8();
    assert_eq!(img.dimensions(), (48, 32));
    assert!(img.pixels().all(|p| p.0[3] == 255));
}

#[test]
fn cli_rejects_zero_workers() {
    let dir = PathBuf::from("target").join("cli_smoke");
    std::fs::create_dir_all(&dir).unwrap();
    let status = std::process::Command::new(exe())
        .args(["frame", "--width", "8", "--height", "8", "--workers", "0", "--out"])
        .arg(dir.join("never.png"))
        .status()
        .unwrap();
    assert!(!status.success());
}
