//! The extract, convert, slice driver.
//!
//! A [`Session`] is opened once per run: it checks the archive, extracts
//! both catalogs and then processes batches strictly in sequence. Inside a
//! batch a failing item is logged and dropped; the rest carry on. Only
//! opening the session can fail as a whole.

use std::path::{Path, PathBuf};

use crate::archive::{ArchiveExtractor, ExtractionRecord, Layout};
use crate::catalog::Catalog;
use crate::convert::Converter;
use crate::error::{Result, SlicerError};
use crate::manifest::{CatalogPaths, Manifest, TextureRequest, DEFAULT_CONVERTER, DEFAULT_EXTRACTOR};
use crate::progress::Progress;
use crate::slice::slice_image;
use crate::tool::{ExternalTool, Tool};
use crate::types::{BankFile, ContainerKind, ExtractionResult, Texture, TextureContainer};

/// Containers whose internal path contains this use the divination catalog.
const DIVINATION_MARKER: &str = "divinationcards";

/// The general and divination card catalogs.
#[derive(Debug, Clone, Default)]
pub struct Catalogs {
    pub images: Catalog,
    pub divination: Catalog,
}

impl Catalogs {
    /// Load both catalogs from a previous run's output directory.
    pub fn from_output(output: &Path, paths: &CatalogPaths) -> Self {
        let load = |internal: &str| {
            let layout = Layout::new(output, internal, ContainerKind::Text);
            match layout.find_file() {
                Ok(Some(path)) => Catalog::load(path),
                _ => Catalog::load(layout.expected_file()),
            }
        };

        Self {
            images: load(&paths.images),
            divination: load(&paths.divination),
        }
    }

    /// The catalog that lists textures for `internal_path`.
    pub fn for_container(&self, internal_path: &str) -> &Catalog {
        if internal_path.to_lowercase().contains(DIVINATION_MARKER) {
            &self.divination
        } else {
            &self.images
        }
    }

    /// Textures for one container, optionally limited to `wanted` names.
    pub fn resolve<S: AsRef<str>>(&self, internal_path: &str, wanted: &[S]) -> Vec<Texture> {
        let catalog = self.for_container(internal_path);
        if wanted.is_empty() {
            catalog.textures_for(internal_path)
        } else {
            catalog.textures_for_wanted(internal_path, wanted)
        }
    }

    /// Turn rescanned texture records back into containers ready to convert.
    pub fn containers_from(&self, records: Vec<ExtractionRecord>) -> Vec<TextureContainer> {
        records
            .into_iter()
            .filter(|record| record.kind == ContainerKind::Texture)
            .map(|record| {
                let textures = self.resolve::<&str>(&record.internal_path, &[]);
                TextureContainer::new(record.internal_path, record.disk_path).with_textures(textures)
            })
            .collect()
    }
}

/// Which texture containers a run processes.
#[derive(Debug, Clone, Copy)]
pub enum TextureSelection<'a> {
    /// Every container the general catalog mentions.
    All,
    Only(&'a [TextureRequest]),
}

/// What a full run produced.
#[derive(Debug, Default)]
pub struct RunReport {
    pub textures: Vec<TextureContainer>,
    pub banks: Vec<BankFile>,
    /// Items that were requested but dropped after a failure.
    pub failed: usize,
}

impl RunReport {
    pub fn sliced(&self) -> usize {
        self.textures.iter().map(|c| c.sliced.len()).sum()
    }
}

/// One extraction run against one archive.
#[derive(Debug)]
pub struct Session<E, C> {
    extractor: ArchiveExtractor<E>,
    converter: Converter<C>,
    output: PathBuf,
    overwrite: bool,
    catalogs: Catalogs,
}

impl Session<ExternalTool, ExternalTool> {
    /// Locate the tools named by the manifest and open a session.
    pub fn from_manifest(manifest: &Manifest) -> Result<Self> {
        let tools = &manifest.tools;
        let extract_tool =
            ExternalTool::locate(&tools.extractor, DEFAULT_EXTRACTOR)?.with_timeout(tools.timeout());
        let convert_tool =
            ExternalTool::locate(&tools.converter, DEFAULT_CONVERTER)?.with_timeout(tools.timeout());

        let extractor = ArchiveExtractor::new(extract_tool, manifest.archive()?, manifest.overwrite)?;
        let converter =
            Converter::new(convert_tool, manifest.overwrite).with_flags(tools.convert_flags.clone());

        Self::open(extractor, converter, &manifest.output, &manifest.catalogs)
    }
}

impl<E: Tool, C: Tool> Session<E, C> {
    /// Create the output directory and extract both catalogs.
    ///
    /// Every later lookup depends on the catalogs, so failing to extract
    /// either one fails the session.
    pub fn open(
        extractor: ArchiveExtractor<E>,
        mut converter: Converter<C>,
        output: &Path,
        catalogs: &CatalogPaths,
    ) -> Result<Self> {
        std::fs::create_dir_all(output)
            .map_err(|e| SlicerError::io(output, format!("Failed to create output directory: {}", e)))?;

        let overwrite = extractor.overwrite();
        converter.set_overwrite(overwrite);
        tracing::info!(
            archive = %extractor.archive().display(),
            kind = ?extractor.kind(),
            output = %output.display(),
            overwrite,
            "opening session"
        );

        let load = |internal: &str| -> Result<Catalog> {
            let extracted = extractor.extract(output, internal).map_err(|e| SlicerError::Config {
                message: format!("Could not extract catalog {}: {}", internal, e),
                help: Some("Check the archive path and the extraction tool".to_string()),
            })?;
            let catalog = Catalog::load(&extracted.disk_path);
            tracing::info!(catalog = internal, textures = catalog.len(), "loaded catalog");
            Ok(catalog)
        };

        let catalogs = Catalogs {
            images: load(&catalogs.images)?,
            divination: load(&catalogs.divination)?,
        };

        Ok(Self {
            extractor,
            converter,
            output: output.to_path_buf(),
            overwrite,
            catalogs,
        })
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    pub fn catalogs(&self) -> &Catalogs {
        &self.catalogs
    }

    /// Extract one internal path and resolve what it is.
    pub fn extract(&self, internal_path: &str) -> Result<ExtractionResult> {
        self.extract_wanted::<&str>(internal_path, &[])
    }

    fn extract_wanted<S: AsRef<str>>(&self, internal_path: &str, wanted: &[S]) -> Result<ExtractionResult> {
        let extracted = self.extractor.extract(&self.output, internal_path)?;

        Ok(match extracted.kind {
            ContainerKind::Texture => {
                let textures = self.catalogs.resolve(internal_path, wanted);
                if textures.is_empty() {
                    tracing::warn!(internal_path, "no catalog entries for container");
                }
                ExtractionResult::Texture(
                    TextureContainer::new(extracted.internal_path, extracted.disk_path)
                        .with_textures(textures),
                )
            }
            ContainerKind::Bank => ExtractionResult::Bank(BankFile {
                internal_path: extracted.internal_path,
                disk_path: extracted.disk_path,
            }),
            ContainerKind::Text => ExtractionResult::CatalogFile(extracted.disk_path),
        })
    }

    /// Extract texture containers, dropping any that fail.
    pub fn extract_textures(
        &self,
        requests: &[TextureRequest],
        progress: &mut dyn Progress,
    ) -> Vec<TextureContainer> {
        progress.step_start("Extracting");
        let mut containers = Vec::with_capacity(requests.len());

        for (index, request) in requests.iter().enumerate() {
            match self.extract_wanted(&request.path, &request.textures) {
                Ok(ExtractionResult::Texture(container)) => containers.push(container),
                Ok(other) => {
                    tracing::warn!(internal_path = %request.path, path = %other.disk_path().display(), "not a texture container");
                }
                Err(e) => log_failure("extraction", &request.path, &e),
            }
            progress.advance(index + 1, requests.len());
        }

        containers
    }

    /// Extract every container listed in the general catalog.
    pub fn extract_all_textures(&self, progress: &mut dyn Progress) -> Vec<TextureContainer> {
        let requests = self.all_requests();
        tracing::info!(count = requests.len(), "extracting every catalogued container");
        self.extract_textures(&requests, progress)
    }

    fn all_requests(&self) -> Vec<TextureRequest> {
        self.catalogs
            .images
            .containers()
            .into_iter()
            .filter(|path| ContainerKind::of(path) == Some(ContainerKind::Texture))
            .map(|path| TextureRequest::all(path))
            .collect()
    }

    /// Extract audio banks, dropping any that fail.
    pub fn extract_banks(&self, paths: &[String], progress: &mut dyn Progress) -> Vec<BankFile> {
        progress.step_start("Extracting banks");
        let mut banks = Vec::with_capacity(paths.len());

        for (index, path) in paths.iter().enumerate() {
            match self.extract(path) {
                Ok(ExtractionResult::Bank(bank)) => banks.push(bank),
                Ok(other) => {
                    tracing::warn!(internal_path = %path, path = %other.disk_path().display(), "not a bank");
                }
                Err(e) => log_failure("extraction", path, &e),
            }
            progress.advance(index + 1, paths.len());
        }

        banks
    }

    /// Convert each container to PNG, dropping any that fail.
    pub fn convert(&self, containers: Vec<TextureContainer>, progress: &mut dyn Progress) -> Vec<TextureContainer> {
        progress.step_start("Converting");
        convert_all(&self.converter, containers, progress)
    }

    /// Crop the catalogued textures out of each converted container.
    pub fn slice(&self, containers: Vec<TextureContainer>, progress: &mut dyn Progress) -> Vec<TextureContainer> {
        progress.step_start("Slicing");
        slice_all(containers, self.overwrite, progress)
    }

    /// Extract, convert and slice the selected textures, then extract banks.
    pub fn run(&self, selection: TextureSelection<'_>, banks: &[String], progress: &mut dyn Progress) -> RunReport {
        let (extracted, requested) = match selection {
            TextureSelection::All => {
                let requests = self.all_requests();
                (self.extract_textures(&requests, progress), requests.len())
            }
            TextureSelection::Only(requests) => (self.extract_textures(requests, progress), requests.len()),
        };

        let converted = self.convert(extracted, progress);
        let textures = self.slice(converted, progress);
        let bank_files = self.extract_banks(banks, progress);

        let failed = requested.saturating_sub(textures.len()) + banks.len() - bank_files.len();
        RunReport {
            textures,
            banks: bank_files,
            failed,
        }
    }
}

/// Conversion step shared by live sessions and rescanned output.
pub fn convert_all<C: Tool>(
    converter: &Converter<C>,
    containers: Vec<TextureContainer>,
    progress: &mut dyn Progress,
) -> Vec<TextureContainer> {
    let total = containers.len();
    let mut converted = Vec::with_capacity(total);

    for (index, mut container) in containers.into_iter().enumerate() {
        match converter.convert(&container.disk_path) {
            Ok(png) => {
                container.converted = Some(png);
                converted.push(container);
            }
            Err(e) => log_failure("conversion", &container.internal_path, &e),
        }
        progress.advance(index + 1, total);
    }

    converted
}

/// Slicing step shared by live sessions and rescanned output.
pub fn slice_all(
    containers: Vec<TextureContainer>,
    overwrite: bool,
    progress: &mut dyn Progress,
) -> Vec<TextureContainer> {
    let total = containers.len();
    let mut sliced = Vec::with_capacity(total);

    for (index, mut container) in containers.into_iter().enumerate() {
        let Some(image) = container.converted.clone() else {
            tracing::warn!(internal_path = %container.internal_path, "not converted, skipping slice");
            progress.advance(index + 1, total);
            continue;
        };

        let out_dir = container.directory().to_path_buf();
        match slice_image(&image, &container.textures, &out_dir, overwrite) {
            Ok(done) => {
                container.sliced = done;
                sliced.push(container);
            }
            Err(e) => log_failure("slicing", &container.internal_path, &e),
        }
        progress.advance(index + 1, total);
    }

    sliced
}

fn log_failure(stage: &str, internal_path: &str, error: &SlicerError) {
    tracing::warn!(
        stage,
        internal_path,
        retryable = error.is_retryable(),
        error = %error,
        "item failed, continuing"
    );
}
