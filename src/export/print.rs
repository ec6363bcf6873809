use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::Context as _;

use crate::export::download::Artifact;
use crate::export::foreign::escape;
use crate::foundation::error::{CardError, CardResult};

/// A viewing surface that can show a document and hand it to the platform printer.
pub trait PrintView {
    fn show(&mut self, html: &str) -> CardResult<()>;
    fn print(&mut self) -> CardResult<()>;
}

/// Opens print views. `None` support is modelled by the caller simply not having one.
pub trait PrintSurface: Send {
    fn open(&mut self) -> CardResult<Box<dyn PrintView>>;
}

/// Minimal page showing `image` at full width, titled `title`.
pub fn print_page(title: &str, image: &Artifact) -> String {
    format!(
        r#"<html><head><title>{}</title></head><body style="margin:0"><img src="{}" style="width:100%;height:auto"/></body></html>"#,
        escape(title),
        image.data_uri()
    )
}

/// Writes the print page to `<dir>/<file_name>`. Printing itself is left to whoever opens it.
#[derive(Clone, Debug)]
pub struct HtmlPrintSurface {
    path: PathBuf,
}

impl HtmlPrintSurface {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PrintSurface for HtmlPrintSurface {
    fn open(&mut self) -> CardResult<Box<dyn PrintView>> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create print directory '{}'", parent.display()))?;
        }
        Ok(Box::new(HtmlPrintView {
            path: self.path.clone(),
            written: false,
        }))
    }
}

struct HtmlPrintView {
    path: PathBuf,
    written: bool,
}

impl PrintView for HtmlPrintView {
    fn show(&mut self, html: &str) -> CardResult<()> {
        std::fs::write(&self.path, html)
            .with_context(|| format!("write print page '{}'", self.path.display()))?;
        self.written = true;
        Ok(())
    }

    fn print(&mut self) -> CardResult<()> {
        if !self.written {
            return Err(CardError::encoding("print view has no content"));
        }
        tracing::info!(path = %self.path.display(), "print page ready; open it to print");
        Ok(())
    }
}

/// Record of one opened print view.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PrintedPage {
    pub html: String,
    pub printed: bool,
}

/// In-memory print surface. Clones share the page list; `refusing()` models a blocked window.
#[derive(Clone, Debug, Default)]
pub struct RecordingPrintSurface {
    pages: Arc<Mutex<Vec<PrintedPage>>>,
    refuse: bool,
}

impl RecordingPrintSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// A surface whose views never open.
    pub fn refusing() -> Self {
        Self {
            refuse: true,
            ..Self::default()
        }
    }

    pub fn pages(&self) -> Vec<PrintedPage> {
        self.pages
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }
}

impl PrintSurface for RecordingPrintSurface {
    fn open(&mut self) -> CardResult<Box<dyn PrintView>> {
        if self.refuse {
            return Err(CardError::surface_unavailable("print window could not be opened"));
        }
        let mut pages = self.pages.lock().unwrap_or_else(|p| p.into_inner());
        pages.push(PrintedPage::default());
        Ok(Box::new(RecordingPrintView {
            pages: self.pages.clone(),
            index: pages.len() - 1,
        }))
    }
}

struct RecordingPrintView {
    pages: Arc<Mutex<Vec<PrintedPage>>>,
    index: usize,
}

impl RecordingPrintView {
    fn with_page(&self, f: impl FnOnce(&mut PrintedPage)) {
        let mut pages = self.pages.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(page) = pages.get_mut(self.index) {
            f(page);
        }
    }
}

impl PrintView for RecordingPrintView {
    fn show(&mut self, html: &str) -> CardResult<()> {
        self.with_page(|p| p.html = html.to_string());
        Ok(())
    }

    fn print(&mut self) -> CardResult<()> {
        self.with_page(|p| p.printed = true);
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/export/print.rs"]
mod tests;
