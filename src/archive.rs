use anyhow::Context;
use std::fs::File;
use std::path::{Path, PathBuf};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Packages already-rendered document files into a single zip archive at
/// `out_path`, one entry per (entry name, source path) pair. Returns the
/// entry count.
pub fn bundle_documents(entries: &[(String, PathBuf)], out_path: &Path) -> anyhow::Result<usize> {
    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.to_string_lossy()))?;
    }

    let out_file = File::create(out_path).with_context(|| {
        format!(
            "failed to create output file {}",
            out_path.to_string_lossy()
        )
    })?;
    let mut zip = ZipWriter::new(out_file);
    let opts = FileOptions::default().compression_method(CompressionMethod::Deflated);

    for (name, path) in entries {
        zip.start_file(name, opts)
            .with_context(|| format!("failed to start archive entry {}", name))?;
        let mut doc = File::open(path)
            .with_context(|| format!("failed to open document {}", path.to_string_lossy()))?;
        std::io::copy(&mut doc, &mut zip)
            .with_context(|| format!("failed to write archive entry {}", name))?;
    }

    zip.finish().context("failed to finalize archive")?;
    Ok(entries.len())
}
