//! Shared fixture builders for integration tests.

use apkforge::env::ToolchainRole;
use apkforge::OfflineEnvironment;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Toolchain base with every role directory present.
#[allow(dead_code)]
pub fn provisioned_toolchains() -> (TempDir, OfflineEnvironment) {
    let dir = TempDir::new().unwrap();
    for role in ToolchainRole::ALL {
        fs::create_dir_all(dir.path().join(role.subdir())).unwrap();
    }
    let env = OfflineEnvironment::resolve(dir.path());
    (dir, env)
}

/// Plain web project: index.html, package.json without cross-js deps.
#[allow(dead_code)]
pub fn web_project() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("index.html"),
        "<html><head><title>demo</title></head><body></body></html>",
    )
    .unwrap();
    fs::write(
        dir.path().join("package.json"),
        r#"{"name": "demo-site", "version": "1.0.0"}"#,
    )
    .unwrap();
    fs::write(dir.path().join("app.js"), "document.title = 'demo';").unwrap();
    fs::write(dir.path().join("style.css"), "body { margin: 0; }").unwrap();
    dir
}

/// Native project: CMakeLists.txt plus `cpp_files` C++ sources.
#[allow(dead_code)]
pub fn native_project(cpp_files: usize) -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("CMakeLists.txt"),
        "cmake_minimum_required(VERSION 3.22)\nproject(demo)\n",
    )
    .unwrap();
    for i in 0..cpp_files {
        fs::write(
            dir.path().join(format!("source{}.cpp", i)),
            "int answer() { return 42; }\n",
        )
        .unwrap();
    }
    dir
}

/// .NET MAUI project with an Android target framework.
#[allow(dead_code)]
pub fn maui_project() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("Demo.csproj"),
        r#"<Project Sdk="Microsoft.NET.Sdk">
  <PropertyGroup>
    <TargetFrameworks>net8.0-android</TargetFrameworks>
    <UseMaui>true</UseMaui>
  </PropertyGroup>
</Project>"#,
    )
    .unwrap();
    fs::create_dir_all(dir.path().join("Platforms/Android")).unwrap();
    fs::write(dir.path().join("MauiProgram.cs"), "class MauiProgram {}").unwrap();
    dir
}

/// Expo-managed React Native project, no android/ subproject.
#[allow(dead_code)]
pub fn expo_project() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("package.json"),
        r#"{"name": "demo", "dependencies": {"expo": "50.0.0", "react-native": "0.73.0"}}"#,
    )
    .unwrap();
    fs::write(dir.path().join("app.json"), r#"{"expo": {"name": "demo"}}"#).unwrap();
    fs::write(dir.path().join("App.tsx"), "export default function App() {}").unwrap();
    dir
}

/// Unity-like engine project with both marker directories.
#[allow(dead_code)]
pub fn engine_project() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("Assets")).unwrap();
    fs::create_dir(dir.path().join("ProjectSettings")).unwrap();
    fs::write(
        dir.path().join("ProjectSettings/ProjectVersion.txt"),
        "m_EditorVersion: 2022.3.10f1",
    )
    .unwrap();
    fs::write(dir.path().join("Assets/Main.unity"), "").unwrap();
    dir
}

/// Snapshot of all file paths under a directory, for asserting a source
/// tree was not mutated.
#[allow(dead_code)]
pub fn tree_snapshot(root: &Path) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = walkdir(root);
    paths.sort();
    paths
}

fn walkdir(root: &Path) -> Vec<PathBuf> {
    let mut out = Vec::new();
    if let Ok(entries) = fs::read_dir(root) {
        for entry in entries.flatten() {
            let path = entry.path();
            out.push(path.clone());
            if path.is_dir() {
                out.extend(walkdir(&path));
            }
        }
    }
    out
}
