//! # pdfium-auto
//!
//! Locate, download and bind the [PDFium](https://pdfium.googlesource.com/pdfium/)
//! shared library at runtime, so `uscode-cite` works without a manual
//! `libpdfium` install or `LD_LIBRARY_PATH` setup.
//!
//! ## Resolution order
//!
//! 1. `PDFIUM_LIB_PATH`, when it names an existing file.
//! 2. The per-version cache directory (see [`pdfium_cache_dir`]).
//! 3. Download the platform `.tgz` from
//!    [bblanchon/pdfium-binaries](https://github.com/bblanchon/pdfium-binaries),
//!    extract the library into the cache, and use that.
//!
//! The resolved path is remembered for the rest of the process.
//!
//! ## Environment variable overrides
//!
//! - `PDFIUM_LIB_PATH` — path to an existing pdfium library; skips download.
//! - `PDFIUM_AUTO_CACHE_DIR` — override the default cache directory.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use pdfium_render::prelude::Pdfium;
use thiserror::Error;

/// The pdfium-binaries release tag used for downloads.
pub const PDFIUM_VERSION: &str = "7690";

const BASE_URL: &str = "https://github.com/bblanchon/pdfium-binaries/releases/download";

/// Application directory under the user cache dir.
const CACHE_APP_DIR: &str = "uscode-cite";

/// `(bytes_downloaded, total_bytes)` callback for the initial download.
pub type DownloadProgress<'a> = &'a dyn Fn(u64, Option<u64>);

/// Errors returned by pdfium-auto operations.
#[derive(Error, Debug)]
pub enum PdfiumAutoError {
    /// The current OS/architecture combination has no prebuilt library.
    #[error("Unsupported platform: {os}/{arch}")]
    UnsupportedPlatform { os: String, arch: String },

    /// Could not create the local cache directory.
    #[error("Cache directory error: {0}")]
    CacheDir(#[source] std::io::Error),

    /// Network download failed.
    #[error("Download failed: {0}")]
    Download(String),

    /// gzip/tar extraction failed.
    #[error("Archive extraction failed: {0}")]
    Extract(String),

    /// `pdfium-render` could not load the library.
    #[error("Failed to bind PDFium from '{path}': {reason}")]
    Bind { path: PathBuf, reason: String },
}

// ── Platform table ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PlatformAsset {
    os: &'static str,
    arch: &'static str,
    /// Release asset, e.g. `pdfium-linux-x64.tgz`.
    archive: &'static str,
    /// Member path inside the archive.
    member: &'static str,
    /// Filename written to the cache.
    lib_name: &'static str,
}

const fn asset(
    os: &'static str,
    arch: &'static str,
    archive: &'static str,
    member: &'static str,
    lib_name: &'static str,
) -> PlatformAsset {
    PlatformAsset {
        os,
        arch,
        archive,
        member,
        lib_name,
    }
}

const PLATFORMS: &[PlatformAsset] = &[
    asset("linux", "x86_64", "pdfium-linux-x64.tgz", "lib/libpdfium.so", "libpdfium.so"),
    asset("linux", "aarch64", "pdfium-linux-arm64.tgz", "lib/libpdfium.so", "libpdfium.so"),
    asset("macos", "aarch64", "pdfium-mac-arm64.tgz", "lib/libpdfium.dylib", "libpdfium.dylib"),
    asset("macos", "x86_64", "pdfium-mac-x64.tgz", "lib/libpdfium.dylib", "libpdfium.dylib"),
    asset("windows", "x86_64", "pdfium-win-x64.tgz", "bin/pdfium.dll", "pdfium.dll"),
    asset("windows", "aarch64", "pdfium-win-arm64.tgz", "bin/pdfium.dll", "pdfium.dll"),
    asset("windows", "x86", "pdfium-win-x86.tgz", "bin/pdfium.dll", "pdfium.dll"),
];

fn platform_for(os: &str, arch: &str) -> Result<&'static PlatformAsset, PdfiumAutoError> {
    PLATFORMS
        .iter()
        .find(|p| p.os == os && p.arch == arch)
        .ok_or_else(|| PdfiumAutoError::UnsupportedPlatform {
            os: os.to_string(),
            arch: arch.to_string(),
        })
}

fn current_platform() -> Result<&'static PlatformAsset, PdfiumAutoError> {
    platform_for(std::env::consts::OS, std::env::consts::ARCH)
}

// ── Cache directory ──────────────────────────────────────────────────────────

/// Per-version cache directory for the PDFium library.
///
/// `<user cache dir>/uscode-cite/pdfium-{VERSION}/`, or
/// `$PDFIUM_AUTO_CACHE_DIR/pdfium-{VERSION}/` when that is set.
pub fn pdfium_cache_dir() -> PathBuf {
    let versioned = format!("pdfium-{PDFIUM_VERSION}");
    if let Ok(override_dir) = std::env::var("PDFIUM_AUTO_CACHE_DIR") {
        return PathBuf::from(override_dir).join(versioned);
    }

    dirs::cache_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".cache")))
        .unwrap_or_else(std::env::temp_dir)
        .join(CACHE_APP_DIR)
        .join(versioned)
}

static RESOLVED_PATH: OnceLock<PathBuf> = OnceLock::new();

fn env_override() -> Option<PathBuf> {
    std::env::var_os("PDFIUM_LIB_PATH")
        .map(PathBuf::from)
        .filter(|p| p.exists())
}

// ── Public API ───────────────────────────────────────────────────────────────

/// `true` when no download is needed to bind PDFium.
pub fn is_pdfium_cached() -> bool {
    if RESOLVED_PATH.get().is_some() || env_override().is_some() {
        return true;
    }
    current_platform()
        .map(|info| pdfium_cache_dir().join(info.lib_name).exists())
        .unwrap_or(false)
}

/// Make sure the PDFium library is on disk and return its path.
///
/// Downloads at most once per process; later calls return the remembered
/// path immediately.
pub fn ensure_pdfium_library(
    on_progress: Option<DownloadProgress<'_>>,
) -> Result<PathBuf, PdfiumAutoError> {
    if let Some(path) = RESOLVED_PATH.get() {
        return Ok(path.clone());
    }

    let path = match env_override() {
        Some(p) => p,
        None => {
            let info = current_platform()?;
            let lib_path = pdfium_cache_dir().join(info.lib_name);
            if !lib_path.exists() {
                download_into_cache(info, &lib_path, on_progress)?;
            }
            lib_path
        }
    };

    let _ = RESOLVED_PATH.set(path.clone());
    Ok(path)
}

/// Bind to the PDFium library at `path` (usually the result of
/// [`ensure_pdfium_library`]).
pub fn bind_pdfium_from_path(path: &Path) -> Result<Pdfium, PdfiumAutoError> {
    Pdfium::bind_to_library(path)
        .map(Pdfium::new)
        .map_err(|e| PdfiumAutoError::Bind {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

// ── Download + extraction ────────────────────────────────────────────────────

fn download_into_cache(
    info: &PlatformAsset,
    lib_path: &Path,
    on_progress: Option<DownloadProgress<'_>>,
) -> Result<(), PdfiumAutoError> {
    let url = format!("{BASE_URL}/chromium%2F{PDFIUM_VERSION}/{}", info.archive);

    if let Some(dir) = lib_path.parent() {
        std::fs::create_dir_all(dir).map_err(PdfiumAutoError::CacheDir)?;
    }

    let archive = download_bytes(&url, on_progress)?;
    extract_member(&archive, info.member, lib_path)
}

/// Read `url` into memory, reporting progress every 64 KiB chunk.
fn download_bytes(
    url: &str,
    on_progress: Option<DownloadProgress<'_>>,
) -> Result<Vec<u8>, PdfiumAutoError> {
    let client = reqwest::blocking::Client::builder()
        .user_agent(concat!("pdfium-auto/", env!("CARGO_PKG_VERSION")))
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .map_err(|e| PdfiumAutoError::Download(e.to_string()))?;

    let mut response = client
        .get(url)
        .send()
        .map_err(|e| PdfiumAutoError::Download(format!("GET {url}: {e}")))?;

    if !response.status().is_success() {
        return Err(PdfiumAutoError::Download(format!(
            "HTTP {} for {url}",
            response.status()
        )));
    }

    let total = response.content_length();
    let mut buf = Vec::with_capacity(total.unwrap_or(35 * 1024 * 1024) as usize);
    let mut chunk = vec![0u8; 64 * 1024];

    loop {
        match response.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => {
                buf.extend_from_slice(&chunk[..n]);
                if let Some(cb) = on_progress {
                    cb(buf.len() as u64, total);
                }
            }
            Err(ref e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(PdfiumAutoError::Download(format!("Read error: {e}"))),
        }
    }

    Ok(buf)
}

/// Unpack the single archive member `member` of a `.tgz` into `dest`.
fn extract_member(archive_bytes: &[u8], member: &str, dest: &Path) -> Result<(), PdfiumAutoError> {
    use flate2::read::GzDecoder;
    use tar::Archive;

    let extract_err = |e: std::io::Error| PdfiumAutoError::Extract(e.to_string());
    let mut archive = Archive::new(GzDecoder::new(archive_bytes));

    for entry in archive.entries().map_err(extract_err)? {
        let mut entry = entry.map_err(extract_err)?;
        let is_member = entry.path().map_err(extract_err)?.to_string_lossy() == member;
        if is_member {
            entry
                .unpack(dest)
                .map_err(|e| PdfiumAutoError::Extract(format!("Unpack failed: {e}")))?;
            return Ok(());
        }
    }

    Err(PdfiumAutoError::Extract(format!(
        "'{member}' not found in archive"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tgz(files: &[(&str, &[u8])]) -> Vec<u8> {
        let gz = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::fast());
        let mut builder = tar::Builder::new(gz);
        for (name, data) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, name, *data).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap()
    }

    #[test]
    fn platform_lookup() {
        let linux = platform_for("linux", "x86_64").unwrap();
        assert_eq!(linux.lib_name, "libpdfium.so");
        assert!(linux.member.ends_with(linux.lib_name));

        let err = platform_for("plan9", "mips").unwrap_err();
        assert!(err.to_string().contains("plan9/mips"));
    }

    #[test]
    fn every_platform_member_matches_lib_name() {
        for p in PLATFORMS {
            assert!(p.member.ends_with(p.lib_name), "{p:?}");
            assert!(p.archive.ends_with(".tgz"), "{p:?}");
        }
    }

    #[test]
    fn cache_dir_is_versioned() {
        let d = pdfium_cache_dir();
        assert_eq!(d, pdfium_cache_dir());
        assert!(d.to_string_lossy().contains(PDFIUM_VERSION));
    }

    #[test]
    fn extracts_requested_member_only() {
        let archive = tgz(&[
            ("LICENSE", b"license text"),
            ("lib/libpdfium.so", b"\x7fELF fake library"),
        ]);
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("libpdfium.so");

        extract_member(&archive, "lib/libpdfium.so", &dest).unwrap();

        assert_eq!(std::fs::read(&dest).unwrap(), b"\x7fELF fake library");
        assert!(!dir.path().join("LICENSE").exists());
    }

    #[test]
    fn missing_member_is_an_error() {
        let archive = tgz(&[("README", b"nothing here")]);
        let dir = tempfile::tempdir().unwrap();
        let err = extract_member(&archive, "lib/libpdfium.so", &dir.path().join("x")).unwrap_err();
        assert!(matches!(err, PdfiumAutoError::Extract(_)));
    }

    #[test]
    fn corrupt_archive_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = extract_member(b"not gzip", "lib/libpdfium.so", &dir.path().join("x")).unwrap_err();
        assert!(matches!(err, PdfiumAutoError::Extract(_)));
    }
}
