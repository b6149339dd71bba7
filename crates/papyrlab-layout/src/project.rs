//! Project document and persistence.
//!
//! A project ties the working area, the fragment registry and the optional
//! column grid together. It is saved as pretty-printed JSON; boxes are stored
//! as `[top, left, width, height]` and centres as `[x, y]`.

use crate::fragment::Fragment;
use crate::grid::ColumnGrid;
use crate::packing::{Packer, PackingOutcome};
use crate::registry::FragmentRegistry;
use chrono::{DateTime, Utc};
use papyrlab_core::types::lowest_free_id;
use papyrlab_core::{BoundingBox, Error, FragmentId, GroupId, InputError, Result, WorkingArea};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Project file format version
pub const PROJECT_FORMAT_VERSION: &str = "1.0";

/// A fragment to import whose size is already known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentSpec {
    pub name: String,
    pub width: u32,
    pub height: u32,
}

impl FragmentSpec {
    pub fn new(name: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            name: name.into(),
            width,
            height,
        }
    }
}

/// On-disk project structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectFile {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub metadata: ProjectMetadata,
    pub working_area: [u32; 2],
    #[serde(default)]
    pub fragments: Vec<FragmentRecord>,
    #[serde(default)]
    pub groups: Vec<GroupRecord>,
    #[serde(default)]
    pub grid: Option<ColumnGrid>,
}

fn default_version() -> String {
    PROJECT_FORMAT_VERSION.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectMetadata {
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

impl Default for ProjectMetadata {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            created: now,
            modified: now,
        }
    }
}

/// Serialized fragment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FragmentRecord {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub filename: PathBuf,
    /// `-1` when the fragment is not grouped.
    #[serde(rename = "group id", default = "ungrouped")]
    pub group_id: i64,
    #[serde(default)]
    pub note: String,
    /// `[top, left, width, height]`
    pub bbox: (i32, i32, u32, u32),
    /// `[x, y]`
    pub center: (f64, f64),
}

fn ungrouped() -> i64 {
    -1
}

/// Serialized group; membership is implied by the fragments' group ids.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupRecord {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub fragments: Vec<u32>,
}

impl From<&Fragment> for FragmentRecord {
    fn from(fragment: &Fragment) -> Self {
        let b = fragment.bbox;
        Self {
            id: fragment.id.0,
            name: fragment.name.clone(),
            filename: fragment.filename.clone(),
            group_id: fragment.group_id().map_or(-1, |g| g.0 as i64),
            note: fragment.note.clone(),
            bbox: (b.top, b.left, b.width, b.height),
            center: fragment.center,
        }
    }
}

impl FragmentRecord {
    fn into_fragment(self) -> Result<Fragment> {
        let group = match self.group_id {
            g if g < 0 => None,
            g => Some(GroupId(u32::try_from(g).map_err(|_| InputError::Malformed {
                reason: format!("group id {} of fragment {} is out of range", g, self.id),
            })?)),
        };
        let (top, left, width, height) = self.bbox;
        let mut fragment = Fragment::new(
            FragmentId(self.id),
            self.name,
            BoundingBox::new(top, left, width, height),
        )
        .with_center(self.center)
        .with_group(group);
        fragment.filename = self.filename;
        fragment.note = self.note;
        Ok(fragment)
    }
}

impl ProjectFile {
    /// Save project to file
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        Ok(())
    }

    /// Load project from file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let file: ProjectFile = serde_json::from_str(&content)?;
        Ok(file)
    }
}

/// An open reconstruction project.
#[derive(Debug, Clone)]
pub struct Project {
    pub filename: Option<PathBuf>,
    pub working_area: WorkingArea,
    pub registry: FragmentRegistry,
    pub grid: Option<ColumnGrid>,
    created: DateTime<Utc>,
    packer: Packer,
}

impl Project {
    pub fn new(working_area: WorkingArea) -> Self {
        Self {
            filename: None,
            working_area,
            registry: FragmentRegistry::new(),
            grid: None,
            created: Utc::now(),
            packer: Packer::default(),
        }
    }

    /// Uses `margin` when the working area has to grow during an import.
    pub fn with_packing_margin(mut self, margin: u32) -> Self {
        self.packer = Packer::new(margin);
        self
    }

    pub fn set_packing_margin(&mut self, margin: u32) {
        self.packer = Packer::new(margin);
    }

    /// Lays out a batch of pre-sized fragments below the existing content.
    ///
    /// Returns the new ids in input order.
    pub fn import_sizes(&mut self, specs: &[FragmentSpec]) -> Result<Vec<FragmentId>> {
        let sizes: Vec<(u32, u32)> = specs.iter().map(|s| (s.width, s.height)).collect();
        let (placed, area) = self.place_batch(&sizes)?;
        let ids = self.allocate_ids(specs.len());

        let fragments: Vec<Fragment> = specs
            .iter()
            .zip(placed)
            .zip(&ids)
            .map(|((spec, (x, y)), &id)| {
                Fragment::new(id, spec.name.clone(), BoundingBox::at(x, y, spec.width, spec.height))
            })
            .collect();
        self.commit_batch(fragments, area)?;
        Ok(ids)
    }

    /// Imports recto images, laying them out below the existing content.
    ///
    /// Paths mentioning `back` and images already in the project are skipped.
    pub fn import_images(&mut self, paths: &[PathBuf]) -> Result<Vec<FragmentId>> {
        let existing: BTreeSet<&Path> = self.registry.fragments().map(|f| f.filename.as_path()).collect();
        let mut selected: Vec<&PathBuf> = Vec::new();
        for path in paths {
            let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
            if name.contains("back") {
                debug!("Skipping back image {}", path.display());
                continue;
            }
            if existing.contains(path.as_path()) || selected.contains(&path) {
                debug!("Skipping already imported {}", path.display());
                continue;
            }
            selected.push(path);
        }

        let mut sizes = Vec::with_capacity(selected.len());
        for path in &selected {
            let dims = image::image_dimensions(path)
                .map_err(|e| Error::Image(format!("{}: {}", path.display(), e)))?;
            sizes.push(dims);
        }

        let (placed, area) = self.place_batch(&sizes)?;
        let ids = self.allocate_ids(selected.len());
        let mut fragments = Vec::with_capacity(selected.len());
        for ((path, (x, y)), &id) in selected.iter().zip(placed).zip(&ids) {
            fragments.push(Fragment::from_image(id, path, x, y)?);
        }
        self.commit_batch(fragments, area)?;
        info!("Imported {} fragment images", ids.len());
        Ok(ids)
    }

    /// Packs the sizes and offsets the positions below the current content.
    ///
    /// Returns the positions and the working area to adopt once the batch is
    /// committed. Nothing is mutated.
    fn place_batch(&self, sizes: &[(u32, u32)]) -> Result<(Vec<(i32, i32)>, WorkingArea)> {
        let PackingOutcome {
            positions,
            area,
            grown,
        } = self.packer.pack(sizes, self.working_area)?;

        let offset = i32::try_from(self.registry.bottom_edge())
            .map_err(|_| Error::other("canvas bottom edge out of range"))?;

        let area = if grown {
            self.working_area.expanded_to(&area)
        } else {
            self.working_area
        };
        Ok((
            positions.into_iter().map(|(x, y)| (x, y + offset)).collect(),
            area,
        ))
    }

    fn allocate_ids(&self, count: usize) -> Vec<FragmentId> {
        let mut used: Vec<u32> = self.registry.fragment_ids().map(|id| id.0).collect();
        let mut ids = Vec::with_capacity(count);
        for _ in 0..count {
            let id = lowest_free_id(used.iter().copied());
            used.push(id);
            ids.push(FragmentId(id));
        }
        ids
    }

    /// Adds a fully built batch and adopts `area`; on error nothing changes.
    fn commit_batch(&mut self, fragments: Vec<Fragment>, area: WorkingArea) -> Result<()> {
        let mut registry = self.registry.clone();
        for fragment in fragments {
            registry.add_fragment(fragment)?;
        }
        self.registry = registry;
        if area != self.working_area {
            self.working_area = area;
            info!(
                "Working area grown to {}x{}",
                self.working_area.width, self.working_area.height
            );
        }
        Ok(())
    }

    /// Builds the on-disk form of the project.
    pub fn to_file(&self) -> ProjectFile {
        ProjectFile {
            version: PROJECT_FORMAT_VERSION.to_string(),
            metadata: ProjectMetadata {
                created: self.created,
                modified: Utc::now(),
            },
            working_area: [self.working_area.width, self.working_area.height],
            fragments: self.registry.fragments().map(FragmentRecord::from).collect(),
            groups: self
                .registry
                .groups()
                .map(|g| GroupRecord {
                    id: g.id.0,
                    name: g.name.clone(),
                    fragments: g.members().iter().map(|id| id.0).collect(),
                })
                .collect(),
            grid: self.grid.clone(),
        }
    }

    /// Rebuilds a project; group membership comes from the fragments.
    pub fn from_file(file: ProjectFile) -> Result<Self> {
        if file.version != PROJECT_FORMAT_VERSION {
            warn!(
                "Project format version {} differs from {}",
                file.version, PROJECT_FORMAT_VERSION
            );
        }

        let mut registry = FragmentRegistry::new();
        for record in file.fragments {
            registry.add_fragment(record.into_fragment()?)?;
        }
        for group in file.groups {
            let gid = GroupId(group.id);
            if registry.group(gid).is_some() {
                registry.rename_group(gid, group.name)?;
            } else {
                debug!("Ignoring group {} without members", gid);
            }
        }

        let [width, height] = file.working_area;
        Ok(Self {
            filename: None,
            working_area: WorkingArea::new(width, height),
            registry,
            grid: file.grid,
            created: file.metadata.created,
            packer: Packer::default(),
        })
    }

    /// Saves the project and remembers the path.
    pub fn save(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.to_file().save_to_file(path)?;
        self.filename = Some(path.to_path_buf());
        info!("Saved project to {}", path.display());
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut project = Self::from_file(ProjectFile::load_from_file(path)?)?;
        project.filename = Some(path.to_path_buf());
        info!(
            "Loaded project {} with {} fragments",
            path.display(),
            project.registry.len()
        );
        Ok(project)
    }
}
