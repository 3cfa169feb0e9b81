//! Binding the pdfium shared library.
//!
//! Both PDF text extraction and report export drive pdfium through
//! `pdfium-render`. The library is located at runtime: an explicit path
//! (file or directory) when configured, otherwise the system library.

use crate::error::TriageError;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::debug;

/// Bind to pdfium, honouring an explicit library location.
///
/// A directory is resolved to the platform library name inside it
/// (`libpdfium.so`, `libpdfium.dylib`, `pdfium.dll`).
pub fn bind_pdfium(library_path: Option<&Path>) -> Result<Pdfium, TriageError> {
    let bindings = match library_path {
        Some(path) if path.is_dir() => {
            let lib = Pdfium::pdfium_platform_library_name_at_path(path);
            debug!("Binding pdfium from {}", lib.display());
            Pdfium::bind_to_library(lib)
        }
        Some(path) => {
            debug!("Binding pdfium from {}", path.display());
            Pdfium::bind_to_library(path)
        }
        None => {
            debug!("Binding system pdfium library");
            Pdfium::bind_to_system_library()
        }
    }
    .map_err(|e| TriageError::PdfiumBindingFailed(format!("{e:?}")))?;

    Ok(Pdfium::new(bindings))
}
