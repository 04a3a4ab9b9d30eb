use std::cell::OnceCell;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::SiteConfig;
use crate::error::{Error, Result};
use crate::format::Format;
use crate::markdown::LinkMapping;
use crate::page::{AssetKind, Page};
use crate::util::{join_path, relative_path};
use crate::writer::{FileContent, Writer};

/// A page together with the directory it is exported under.
#[derive(Debug)]
pub struct MountedPage {
    pub path: Option<String>,
    pub page: Page,
}

impl MountedPage {
    fn mount_dir(&self) -> &str {
        self.path.as_deref().unwrap_or("")
    }
}

/// An associated file as seen from the site root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteFile {
    pub kind: AssetKind,
    pub external: bool,
    pub path: String,
}

type PageKey = (Option<String>, String);

/// A collection of pages, each mounted under a path and identified by its slug.
#[derive(Debug, Default)]
pub struct Site {
    pages: Vec<MountedPage>,
    keys: HashSet<PageKey>,
    file_type_paths: BTreeMap<AssetKind, String>,
    files: OnceCell<Vec<SiteFile>>,
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Site({} pages)", self.pages.len())
    }
}

impl Site {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: &SiteConfig) -> Self {
        let mut site = Self::new();
        site.file_type_paths = config.file_type_paths();
        site
    }

    pub fn pages(&self) -> &[MountedPage] {
        &self.pages
    }

    pub fn file_type_paths(&self) -> &BTreeMap<AssetKind, String> {
        &self.file_type_paths
    }

    /// Export every file of `kind` below `dir` instead of next to its page.
    pub fn set_file_type_path<S: Into<String>>(&mut self, kind: AssetKind, dir: S) {
        self.file_type_paths.insert(kind, dir.into());
    }

    /// Add pages under a mount path.
    ///
    /// Every page needs a slug, and a mount path / slug pair can only be
    /// used once.
    pub fn add_page<I>(&mut self, pages: I, path: Option<&str>) -> Result<()>
    where
        I: IntoIterator<Item = Page>,
    {
        self.files = OnceCell::new();
        for page in pages {
            let slug = page.slug();
            if slug.is_empty() {
                return Err(Error::MissingSlug {
                    page: page.to_string(),
                });
            }

            let key = (path.map(str::to_string), slug);
            if self.keys.contains(&key) {
                let key = match &key.0 {
                    Some(path) => format!("{path}/{}", key.1),
                    None => key.1,
                };
                return Err(Error::DuplicatePage { key });
            }

            tracing::debug!(page = %page, slug = %key.1, mount = ?path, "Added page");
            self.keys.insert(key);
            self.pages.push(MountedPage {
                path: path.map(str::to_string),
                page,
            });
        }

        Ok(())
    }

    /// Associated files of every page, local paths prefixed with the mount path.
    pub fn associated_files(&self) -> Result<&[SiteFile]> {
        if let Some(files) = self.files.get() {
            return Ok(files);
        }

        let mut files = Vec::new();
        for mounted in &self.pages {
            for file in mounted.page.associated_files()? {
                let path = if file.external {
                    file.path.clone()
                } else {
                    join_path(mounted.mount_dir(), &file.path)
                };
                files.push(SiteFile {
                    kind: file.kind,
                    external: file.external,
                    path,
                });
            }
        }

        Ok(self.files.get_or_init(|| files))
    }

    /// All exported files, page by page in insertion order: first the page's
    /// local assets, then the page itself.
    ///
    /// Assets shared between pages are yielded once. The iterator stops after
    /// the first error.
    pub fn iter_files(&self, format: Format) -> SiteFiles<'_> {
        SiteFiles {
            site: self,
            format,
            next_page: 0,
            assets: VecDeque::new(),
            page: None,
            exported: HashMap::new(),
            claimed: HashSet::new(),
            failed: false,
        }
    }

    /// Drain [`Site::iter_files`] into `writer` and hand it back.
    pub fn write_files<W: Writer>(&self, format: Format, mut writer: W) -> Result<W> {
        for file in self.iter_files(format) {
            let (filename, content) = file?;
            writer.write(&filename, content)?;
        }
        Ok(writer)
    }

    /// Preferred site-relative export path of a local asset.
    fn export_path(&self, mounted: &MountedPage, kind: AssetKind, path: &str) -> String {
        match self.file_type_paths.get(&kind) {
            Some(dir) => join_path(dir, path),
            None => join_path(mounted.mount_dir(), path),
        }
    }
}

struct PendingAsset {
    source: PathBuf,
    export: String,
    page: String,
}

/// Lazy iterator over `(export path, content)` pairs of a [`Site`].
pub struct SiteFiles<'a> {
    site: &'a Site,
    format: Format,
    next_page: usize,
    assets: VecDeque<PendingAsset>,
    page: Option<(&'a MountedPage, LinkMapping)>,
    /// Source file -> where it was exported.
    exported: HashMap<PathBuf, String>,
    /// Export paths already taken.
    claimed: HashSet<String>,
    failed: bool,
}

impl<'a> SiteFiles<'a> {
    /// Work out the assets of the next page and its link mapping.
    fn plan_page(&mut self, mounted: &'a MountedPage) -> Result<()> {
        let mut link_mapping = LinkMapping::new();

        for file in mounted.page.associated_files()? {
            if file.external {
                continue;
            }

            let source = PathBuf::from(&file.abs_path);
            let export = match self.exported.get(&source).cloned() {
                Some(export) => export,
                None => {
                    let preferred = self.site.export_path(mounted, file.kind, &file.path);
                    let export = self.claim(preferred, &source);
                    self.exported.insert(source.clone(), export.clone());
                    self.assets.push_back(PendingAsset {
                        source,
                        export: export.clone(),
                        page: mounted.page.to_string(),
                    });
                    export
                }
            };

            let link = relative_path(&export, mounted.mount_dir());
            if link != file.path {
                link_mapping.insert(file.path.clone(), link);
            }
        }

        self.page = Some((mounted, link_mapping));
        Ok(())
    }

    /// Reserve an export path for `source`. A path already taken by another
    /// source gets a numbered suffix: `logo.png`, `logo-1.png`, `logo-2.png`.
    fn claim(&mut self, preferred: String, source: &Path) -> String {
        let mut export = preferred.clone();
        let mut n = 0;
        while self.claimed.contains(&export) {
            n += 1;
            export = numbered_path(&preferred, n);
        }
        if n > 0 {
            tracing::debug!(source = %source.display(), preferred = %preferred, export = %export, "Export path taken, renamed asset");
        }
        self.claimed.insert(export.clone());
        export
    }

    fn read_asset(asset: PendingAsset) -> Result<(PathBuf, FileContent)> {
        if !asset.source.exists() {
            return Err(Error::MissingAsset {
                path: asset.source,
                page: asset.page,
            });
        }
        let bytes = std::fs::read(&asset.source)?;
        tracing::debug!(source = %asset.source.display(), export = %asset.export, "Exporting asset");
        Ok((PathBuf::from(asset.export), FileContent::Bytes(bytes)))
    }

    fn render_page(&self, mounted: &MountedPage, link_mapping: &LinkMapping) -> Result<(PathBuf, FileContent)> {
        let mut filename = format!("{}.{}", mounted.page.slug(), self.format.extension());
        if let Some(path) = mounted.path.as_deref().filter(|p| !p.is_empty()) {
            filename = join_path(path, &filename);
        }

        let content = mounted.page.render(self.format, link_mapping)?;
        tracing::debug!(page = %mounted.page, export = %filename, "Rendered page");
        Ok((PathBuf::from(filename), FileContent::Text(content)))
    }

    fn advance(&mut self) -> Option<Result<(PathBuf, FileContent)>> {
        loop {
            if let Some(asset) = self.assets.pop_front() {
                return Some(Self::read_asset(asset));
            }

            if let Some((mounted, link_mapping)) = self.page.take() {
                return Some(self.render_page(mounted, &link_mapping));
            }

            let mounted = self.site.pages.get(self.next_page)?;
            self.next_page += 1;
            if let Err(e) = self.plan_page(mounted) {
                return Some(Err(e));
            }
        }
    }
}

fn numbered_path(path: &str, n: usize) -> String {
    let (dir, name) = match path.rsplit_once('/') {
        Some((dir, name)) => (Some(dir), name),
        None => (None, path),
    };
    let name = match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{stem}-{n}.{ext}"),
        _ => format!("{name}-{n}"),
    };
    match dir {
        Some(dir) => format!("{dir}/{name}"),
        None => name,
    }
}

impl Iterator for SiteFiles<'_> {
    type Item = Result<(PathBuf, FileContent)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let item = self.advance();
        if matches!(item, Some(Err(_))) {
            self.failed = true;
        }
        item
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(text: &str) -> Page {
        Page::from_string(text, Format::Markdown, None).unwrap()
    }

    #[test]
    fn add_page_requires_slug() {
        let mut site = Site::new();
        let result = site.add_page([page("# No slug\n")], Some("docs"));
        assert!(matches!(result, Err(Error::MissingSlug { .. })));
        assert!(site.pages().is_empty());
    }

    #[test]
    fn duplicate_key_is_rejected() {
        let mut site = Site::new();
        site.add_page([page("---\nslug: a\nx: 1\n---\n# A\n")], Some("docs"))
            .unwrap();

        let err = site
            .add_page([page("---\nslug: a\nx: 2\n---\n# A again\n")], Some("docs"))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Trying to add page with existing path and slug 'docs/a'"
        );

        // Same slug under another mount path is fine.
        site.add_page([page("---\nslug: a\nx: 3\n---\n# A\n")], Some("blog"))
            .unwrap();
        site.add_page([page("---\nslug: a\nx: 4\n---\n# A\n")], None)
            .unwrap();
        assert_eq!(site.pages().len(), 3);
    }

    #[test]
    fn associated_files_are_prefixed_with_mount_path() {
        let mut site = Site::new();
        site.add_page(
            [page("---\nslug: a\ncss: //cdn.example.com/x.css\n---\n![i](img/i.png)\n")],
            Some("docs"),
        )
        .unwrap();

        assert_eq!(
            site.associated_files().unwrap(),
            &[
                SiteFile {
                    kind: AssetKind::Image,
                    external: false,
                    path: "docs/img/i.png".into(),
                },
                SiteFile {
                    kind: AssetKind::Css,
                    external: true,
                    path: "//cdn.example.com/x.css".into(),
                },
            ]
        );
    }

    #[test]
    fn associated_files_cache_is_reset_on_add() {
        let mut site = Site::new();
        site.add_page([page("---\nslug: a\nx: 1\n---\n![i](a.png)\n")], None)
            .unwrap();
        assert_eq!(site.associated_files().unwrap().len(), 1);

        site.add_page([page("---\nslug: b\nx: 1\n---\n![i](b.png)\n")], None)
            .unwrap();
        assert_eq!(site.associated_files().unwrap().len(), 2);
    }

    #[test]
    fn export_paths_follow_file_type_paths() {
        let mut site = Site::new();
        site.add_page([page("---\nslug: a\nx: 1\n---\nbody\n")], Some("docs"))
            .unwrap();
        let mounted = &site.pages()[0];

        assert_eq!(site.export_path(mounted, AssetKind::Image, "./a.png"), "docs/a.png");

        site.set_file_type_path(AssetKind::Image, "images");
        let mounted = &site.pages()[0];
        assert_eq!(
            site.export_path(mounted, AssetKind::Image, "sub/a.png"),
            "images/sub/a.png"
        );
    }

    #[test]
    fn numbered_paths() {
        assert_eq!(numbered_path("images/logo.png", 1), "images/logo-1.png");
        assert_eq!(numbered_path("logo.tar.gz", 2), "logo.tar-2.gz");
        assert_eq!(numbered_path("docs/.hidden", 1), "docs/.hidden-1");
        assert_eq!(numbered_path("README", 3), "README-3");
    }

    #[test]
    fn iteration_stops_after_missing_asset() {
        let mut site = Site::new();
        site.add_page(
            [page("---\nslug: a\nx: 1\n---\n![i](definitely-missing-asset.png)\n")],
            Some("docs"),
        )
        .unwrap();

        let mut files = site.iter_files(Format::Markdown);
        assert!(matches!(files.next(), Some(Err(Error::MissingAsset { .. }))));
        assert!(files.next().is_none());
    }
}
