//! Session controller.
//!
//! Holds the open project, the operator's selection, the alignment state of
//! the loaded pairs and the configuration. Every mutation that touches more
//! than one of them goes through here so deletions reach the selection and
//! the alignment state together.

use papyrlab_core::{BoundingBox, FragmentId, GroupId, Result};
use papyrlab_layout::{FragmentRegistry, FragmentSpec, Project, Selection};
use papyrlab_matching::{AlignmentSession, Candidate, NavOutcome, ScoreSide, TierThresholds};
use papyrlab_settings::Config;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Which face of the fragments the canvas shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewSide {
    #[default]
    Recto,
    Verso,
}

#[derive(Debug, Clone)]
pub struct Session {
    config: Config,
    project: Project,
    selection: Selection,
    alignment: AlignmentSession,
    view: ViewSide,
}

fn thresholds(config: &Config) -> TierThresholds {
    let (high, medium) = config.score_thresholds();
    TierThresholds::new(high, medium)
}

fn empty_project(config: &Config) -> Project {
    Project::new(config.working_area.working_area())
        .with_packing_margin(config.alignment.packing_margin)
}

impl Default for Session {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl Session {
    pub fn new(config: Config) -> Self {
        Self {
            project: empty_project(&config),
            alignment: AlignmentSession::new(thresholds(&config)),
            selection: Selection::new(),
            view: ViewSide::default(),
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Replaces the configuration; tiers and packing margin take effect
    /// immediately, the working area only for new projects.
    pub fn set_config(&mut self, config: Config) -> Result<()> {
        config.validate().map_err(papyrlab_settings::SettingsError::from)?;
        self.alignment.set_thresholds(thresholds(&config));
        self.project.set_packing_margin(config.alignment.packing_margin);
        self.config = config;
        Ok(())
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn registry(&self) -> &FragmentRegistry {
        &self.project.registry
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn alignment(&self) -> &AlignmentSession {
        &self.alignment
    }

    pub fn view(&self) -> ViewSide {
        self.view
    }

    pub fn set_view(&mut self, view: ViewSide) {
        self.view = view;
    }

    /// Starts an empty project with the configured working area.
    pub fn new_project(&mut self) {
        self.project = empty_project(&self.config);
        self.selection.clear();
        self.alignment.clear();
        debug!("New project");
    }

    pub fn open_project(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut project = Project::load(path)?;
        project.set_packing_margin(self.config.alignment.packing_margin);
        self.project = project;
        self.selection.clear();
        self.alignment.clear();
        self.config.add_recent_file(path.to_path_buf());
        Ok(())
    }

    pub fn save_project(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.project.save(path)?;
        self.config.add_recent_file(path.to_path_buf());
        Ok(())
    }

    pub fn import_images(&mut self, paths: &[PathBuf]) -> Result<Vec<FragmentId>> {
        self.project.import_images(paths)
    }

    pub fn import_sizes(&mut self, specs: &[FragmentSpec]) -> Result<Vec<FragmentId>> {
        self.project.import_sizes(specs)
    }

    /// Toggles the fragment (or its whole group) under a canvas point.
    pub fn click(&mut self, x: f64, y: f64) -> Option<FragmentId> {
        self.selection.toggle_at(&self.project.registry, x, y)
    }

    pub fn move_selection(&mut self, dx: i32, dy: i32) {
        self.selection.move_by(&mut self.project.registry, dx, dy);
    }

    /// Groups the selected fragments.
    pub fn group_selection(&mut self) -> Result<GroupId> {
        let ids = self.selection.ids().to_vec();
        self.project.registry.group_fragments(&ids)
    }

    /// Dissolves every group touched by the selection.
    pub fn ungroup_selection(&mut self) -> Vec<GroupId> {
        let mut dissolved = Vec::new();
        for &id in self.selection.ids() {
            if let Some(gid) = self.project.registry.dissolve_group_of(id) {
                dissolved.push(gid);
            }
        }
        dissolved
    }

    /// Removes the selected fragments from the project.
    pub fn delete_selection(&mut self) -> Vec<FragmentId> {
        let ids = self.selection.ids().to_vec();
        let removed: Vec<FragmentId> = ids
            .into_iter()
            .filter(|&id| self.delete_fragment(id))
            .collect();
        info!("Deleted {} fragments", removed.len());
        removed
    }

    /// Removes one fragment and every reference to it.
    pub fn delete_fragment(&mut self, id: FragmentId) -> bool {
        let removed = self.project.registry.remove_fragment(id).is_some();
        self.selection.remove(id);
        self.alignment.forget_fragment(id);
        removed
    }

    /// Loads the pair artifacts of a directory; returns how many resolved.
    pub fn load_pair_results(&mut self, dir: impl AsRef<Path>) -> Result<usize> {
        self.alignment.load_directory(dir, &self.project.registry)
    }

    pub fn select_pair(&mut self, pair: usize) -> NavOutcome {
        self.alignment.select_pair(pair, &mut self.project.registry)
    }

    pub fn step(&mut self, pair: usize, direction: i32) -> NavOutcome {
        self.alignment.step(pair, direction, &mut self.project.registry)
    }

    pub fn set_flip(&mut self, pair: usize, flip: bool) -> NavOutcome {
        self.alignment.set_flip(pair, flip, &mut self.project.registry)
    }

    pub fn set_side(&mut self, pair: usize, side: ScoreSide) -> NavOutcome {
        self.alignment.set_side(pair, side, &mut self.project.registry)
    }

    pub fn set_solo(&mut self, pair: usize, enabled: bool) -> bool {
        self.alignment.set_solo(pair, enabled, &self.project.registry)
    }

    pub fn apply(&mut self, pair: usize) -> bool {
        self.alignment.apply(pair, &self.project.registry)
    }

    pub fn reset_alignment(&mut self) {
        self.alignment.reset_all(&mut self.project.registry);
    }

    pub fn current_candidate(&self, pair: usize) -> Option<Candidate> {
        self.alignment.current_candidate(pair, &self.project.registry)
    }

    /// False while another pair is shown solo.
    pub fn is_visible(&self, id: FragmentId) -> bool {
        !self.alignment.is_hidden(id)
    }

    /// Column grid cell as drawn in the current view.
    pub fn grid_cell_rect(&self, row: usize, col: usize) -> Option<BoundingBox> {
        let grid = self.project.grid.as_ref()?;
        grid.cell_rect(row, col, self.view == ViewSide::Verso)
    }
}
