//! The single owner of all mutable tree state.
//!
//! A [`Session`] holds the current tree, its prune set, the built view,
//! the highlighted node and the falling debris. The application loop
//! drives it once per frame and on discrete user actions.

use crate::codec::{self, TreeState};
use crate::config::{Config, ViewStyle};
use crate::debris::DebrisSim;
use crate::error::StateError;
use crate::picker::{Highlight, PickHit, Ray};
use crate::prune::{PruneOutcome, PruneSet};
use crate::scene::{NodeKind, SceneGraph, SceneId};
use crate::template::SegmentTemplate;
use crate::tree::Tree;
use crate::types::{NodeId, Seed};
use crate::view::{Skeleton, Solid, build_view};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::Path;
use std::sync::Arc;

pub struct Session {
    pub cfg: Config,
    tree: Tree,
    pruned: PruneSet,
    view: SceneGraph,
    highlight: Highlight,
    template: Option<Arc<SegmentTemplate>>,
    debris: DebrisSim,
    rng: StdRng,
}

impl Session {
    /// Starts with the configured default seed and nothing pruned.
    pub fn new(cfg: Config) -> Self {
        Self::with_rng(cfg, StdRng::from_os_rng())
    }

    /// Like [`Session::new`] but with a fixed source for debris kicks.
    pub fn with_rng(cfg: Config, rng: StdRng) -> Self {
        let tree = Tree::generate(cfg.default_seed);
        let mut session = Self {
            cfg,
            tree,
            pruned: PruneSet::new(),
            view: SceneGraph::default(),
            highlight: Highlight::default(),
            template: None,
            debris: DebrisSim::new(),
            rng,
        };
        session.rebuild();
        session
    }

    pub fn seed(&self) -> Seed {
        self.tree.seed
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn pruned(&self) -> &PruneSet {
        &self.pruned
    }

    pub fn view(&self) -> &SceneGraph {
        &self.view
    }

    pub fn debris(&self) -> &DebrisSim {
        &self.debris
    }

    pub fn template(&self) -> Option<&SegmentTemplate> {
        self.template.as_deref()
    }

    pub fn highlighted(&self) -> Option<SceneId> {
        self.highlight.current()
    }

    /// Regenerates the tree from `seed`, restoring `pruned`.
    pub fn generate(&mut self, seed: Seed, pruned: PruneSet) {
        log::info!("generating tree {seed} with {} pruned ids", pruned.len());
        self.tree = Tree::generate(seed);
        self.pruned = pruned;
        self.rebuild();
    }

    /// Parses user text as a seed. Returns `false` (and changes nothing)
    /// when it is not a valid seed.
    pub fn generate_from_text(&mut self, text: &str) -> bool {
        match text.trim().parse::<Seed>() {
            Ok(seed) => {
                self.generate(seed, PruneSet::new());
                true
            }
            Err(_) => {
                log::debug!("ignoring invalid seed input {text:?}");
                false
            }
        }
    }

    pub fn set_style(&mut self, style: ViewStyle) {
        if self.cfg.style != style {
            self.cfg.style = style;
            self.rebuild();
        }
    }

    /// Substitutes (or, with `None`, removes) the solid segment shape.
    pub fn set_template(&mut self, template: Option<SegmentTemplate>) {
        self.template = template.map(Arc::new);
        self.rebuild();
    }

    /// Drops the current view and builds a fresh one.
    pub fn rebuild(&mut self) {
        self.highlight.reset();
        drop(std::mem::take(&mut self.view));
        self.view = match self.cfg.style {
            ViewStyle::Solid => build_view(
                &self.tree,
                &self.pruned,
                &Solid {
                    template: self.template.clone(),
                },
            ),
            ViewStyle::Skeleton => build_view(&self.tree, &self.pruned, &Skeleton),
        };
    }

    /// Recomputes the highlight from a pointer ray (or clears it).
    ///
    /// The skeleton view is inspect-only and never highlights.
    pub fn update_highlight(&mut self, ray: Option<&Ray>) -> Option<PickHit> {
        self.highlight.clear(&mut self.view);
        if self.cfg.style == ViewStyle::Skeleton {
            return None;
        }
        let ray = ray?;
        self.highlight
            .update(&mut self.view, ray, self.cfg.highlight_emissive)
    }

    /// Prunes whatever is highlighted, dropping a copy of it as debris.
    ///
    /// Returns `None` when nothing is highlighted.
    pub fn prune_highlighted(&mut self) -> Option<PruneOutcome> {
        let node = self.highlight.current()?;
        let tag = self.view.node(node)?.tag?;

        let outcome = match tag.kind {
            NodeKind::Leaf { .. } => self.pruned.prune_leaf(&self.tree, tag.id),
            NodeKind::Segment { branch, index } => {
                self.pruned.prune_from_segment(&self.tree, branch, index)
            }
        };
        if !outcome.is_pruned() {
            return Some(outcome);
        }

        // The old view is still intact: copy the cut part before rebuilding.
        let fragment = self.view.extract_subtree(node);
        self.debris.spawn(fragment, &mut self.rng, &self.cfg);
        self.rebuild();
        Some(outcome)
    }

    /// Prunes by id without spawning debris, e.g. for scripted edits.
    pub fn prune_id(&mut self, id: NodeId) -> PruneOutcome {
        let outcome = self.pruned.prune_node(&self.tree, id);
        if outcome.is_pruned() {
            self.rebuild();
        }
        outcome
    }

    /// Advances falling debris by `dt` seconds.
    pub fn tick(&mut self, dt: f32) {
        self.debris.tick(dt, &self.cfg);
    }

    pub fn state(&self) -> TreeState {
        TreeState::new(self.seed(), &self.pruned)
    }

    pub fn state_string(&self) -> String {
        codec::encode(self.seed(), self.pruned.iter())
    }

    pub fn load_state(&mut self, state: &TreeState) {
        self.generate(state.seed, state.prune_set());
    }

    pub fn load_state_string(&mut self, text: &str) {
        let state = codec::decode(text);
        self.load_state(&state);
    }

    pub fn export_json(&self) -> Result<String, StateError> {
        self.state().to_json()
    }

    /// Loads a JSON state. On error the current tree is left untouched.
    pub fn import_json(&mut self, text: &str) -> Result<(), StateError> {
        let state = TreeState::from_json(text)?;
        self.load_state(&state);
        Ok(())
    }

    /// Suggested file name for [`Session::save_to`].
    pub fn file_name(&self) -> String {
        format!("tree-state-{}.json", self.seed())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), StateError> {
        std::fs::write(path, self.export_json()?)?;
        log::info!("saved tree state to {}", path.display());
        Ok(())
    }

    pub fn load_from(&mut self, path: &Path) -> Result<(), StateError> {
        let text = std::fs::read_to_string(path)?;
        self.import_json(&text)
    }
}
