use std::env;
use std::path::{Path, PathBuf};

const WATCHED_VARIABLES: [&str; 4] = ["FFMPEG_DIR", "VCPKG_ROOT", "VCPKGRS_DYNAMIC", "VCPKGRS_TRIPLET"];

fn main() {
    for variable in WATCHED_VARIABLES {
        println!("cargo:rerun-if-env-changed={variable}");
    }

    // Only Windows needs help locating FFmpeg; pkg-config covers the rest.
    if env::var("CARGO_CFG_TARGET_OS").unwrap_or_default() != "windows" {
        return;
    }

    if env::var_os("FFMPEG_DIR").is_some() {
        return;
    }

    match vcpkg_ffmpeg_dir() {
        Some(directory) if directory.exists() => hint_detected(&directory),
        Some(directory) => println!(
            "cargo:warning=framepick: VCPKG_ROOT is set but {} does not contain an FFmpeg install.",
            directory.display(),
        ),
        None => println!(
            "cargo:warning=framepick: FFMPEG_DIR is not set. Install FFmpeg (e.g. via vcpkg) and point FFMPEG_DIR at it."
        ),
    }
}

fn vcpkg_ffmpeg_dir() -> Option<PathBuf> {
    let root = env::var("VCPKG_ROOT").ok()?;
    let triplet = env::var("VCPKGRS_TRIPLET").unwrap_or_else(|_| "x64-windows".to_string());
    Some(PathBuf::from(root).join("installed").join(triplet))
}

fn hint_detected(directory: &Path) {
    println!(
        "cargo:warning=framepick: found vcpkg FFmpeg at {0}; set FFMPEG_DIR={0} to silence this hint.",
        directory.display(),
    );
    if env::var_os("VCPKGRS_DYNAMIC").is_none() {
        println!("cargo:warning=framepick: dynamic vcpkg builds also need VCPKGRS_DYNAMIC=1.");
    }
}
