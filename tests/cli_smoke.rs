use std::io::{Cursor, Write as _};
use std::path::PathBuf;
use std::process::{Command, Stdio};

const FONT: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data/fonts/DejaVuSans.ttf");

fn exe() -> PathBuf {
    std::env::var_os("CARGO_BIN_EXE_labelcard")
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            let mut p = PathBuf::from("target").join("debug");
            p.push(if cfg!(windows) {
                "labelcard.exe"
            } else {
                "labelcard"
            });
            p
        })
}

fn setup(name: &str) -> PathBuf {
    let dir = PathBuf::from("target").join("cli_smoke").join(name);
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(dir.join("images")).unwrap();

    let img = image::RgbImage::from_pixel(80, 60, image::Rgb([30, 60, 90]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Jpeg)
        .unwrap();
    for i in 1..=9 {
        std::fs::write(dir.join("images").join(format!("{i:02}.jpg")), &buf).unwrap();
    }
    dir
}

#[test]
fn cli_writes_png_from_flags() {
    let dir = setup("flags");
    let out_path = dir.join("out").join("card.png");

    let output = Command::new(exe())
        .args(["--text", "Hello", "--width", "160", "--height", "120", "--size", "24"])
        .arg("--font")
        .arg(FONT)
        .arg("--images-dir")
        .arg(dir.join("images"))
        .args(["--seed", "9", "--out"])
        .arg(&out_path)
        .output()
        .unwrap();

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Image created successfully as"), "{stdout}");
    let img = image::open(&out_path).unwrap();
    assert_eq!((img.width(), img.height()), (160, 120));
}

#[test]
fn cli_prompts_for_text_on_stdin() {
    let dir = setup("prompt");
    let out_path = dir.join("prompted.png");

    let mut child = Command::new(exe())
        .arg("--font")
        .arg(FONT)
        .arg("--background")
        .arg(dir.join("images").join("03.jpg"))
        .args(["--width", "100", "--height", "100", "--size", "18", "--placement", "center"])
        .arg("--out")
        .arg(&out_path)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"  spaced out  \n")
        .unwrap();
    let output = child.wait_with_output().unwrap();

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("Enter the word or phrase: "), "{stdout}");
    assert!(out_path.exists());
}

#[test]
fn cli_fails_without_output_on_missing_font() {
    let dir = setup("no_font");
    let out_path = dir.join("never.png");

    let output = Command::new(exe())
        .args(["--text", "x", "--font"])
        .arg(dir.join("missing.ttf"))
        .arg("--images-dir")
        .arg(dir.join("images"))
        .arg("--out")
        .arg(&out_path)
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("resource not found"));
    assert!(!out_path.exists());
}
