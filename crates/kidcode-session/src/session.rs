//! The session: one program graph plus everything the presentation layer
//! keeps alongside it.

use std::sync::Arc;

use kidcode_codegen::{generate, generate_with_source_map, EmitterTable};
use kidcode_eval::{run_with_limits, HostApi, RunReport};
use kidcode_graph::{from_portable, to_portable, GraphStats, PortableDocument, ProgramGraph};
use kidcode_registry::BlockRegistry;
use kidcode_types::{BlockId, FieldValue};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::achievements::{self, CHARACTER_SELECTED};
use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::share;
use crate::storage::KeyValueStore;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

/// One editing session.
///
/// Graph edits go through the session so achievements are evaluated after
/// every structural change. Failed edits leave the graph as it was.
pub struct Session<S: KeyValueStore> {
    config: SessionConfig,
    registry: Arc<BlockRegistry>,
    emitters: Arc<EmitterTable>,
    store: S,
    graph: ProgramGraph,
    theme: Theme,
    character: Option<String>,
    /// Every unlocked milestone, in unlock order. Never shrinks.
    unlocked: Vec<String>,
    /// Unlocked but not yet announced.
    announced_up_to: usize,
    /// Fingerprint of the last saved or loaded document.
    saved: Option<String>,
}

impl<S: KeyValueStore> Session<S> {
    /// A session over the built-in catalog with an empty graph.
    pub fn new(config: SessionConfig, store: S) -> Self {
        Self::with_catalog(
            config,
            Arc::new(BlockRegistry::builtin()),
            Arc::new(EmitterTable::builtin()),
            store,
        )
    }

    pub fn with_catalog(
        config: SessionConfig,
        registry: Arc<BlockRegistry>,
        emitters: Arc<EmitterTable>,
        store: S,
    ) -> Self {
        Self {
            config,
            registry,
            emitters,
            store,
            graph: ProgramGraph::new(),
            theme: Theme::default(),
            character: None,
            unlocked: Vec::new(),
            announced_up_to: 0,
            saved: None,
        }
    }

    /// A session that starts from the saved program, if there is one.
    ///
    /// A saved program that no longer loads is skipped with a warning and
    /// the session starts empty; the stored value is left untouched.
    pub fn open(config: SessionConfig, store: S) -> Result<Self, SessionError> {
        let mut session = Self::new(config, store);
        match session.load() {
            Ok(_) => {}
            Err(SessionError::Block(e)) => {
                warn!(error = %e, "saved program could not be loaded; starting empty")
            }
            Err(e) => return Err(e),
        }
        Ok(session)
    }

    // ══════════════════════════════════════════════════════════════════════
    // Accessors
    // ══════════════════════════════════════════════════════════════════════

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn registry(&self) -> &BlockRegistry {
        &self.registry
    }

    pub fn graph(&self) -> &ProgramGraph {
        &self.graph
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn stats(&self) -> GraphStats {
        self.graph.stats(&self.registry)
    }

    // ══════════════════════════════════════════════════════════════════════
    // Editing
    // ══════════════════════════════════════════════════════════════════════

    pub fn insert_block(
        &mut self,
        type_id: &str,
        initial_fields: &[(&str, FieldValue)],
    ) -> Result<BlockId, SessionError> {
        let id = self
            .graph
            .insert_block_with(&self.registry, type_id, initial_fields)?;
        self.check_achievements();
        Ok(id)
    }

    pub fn set_field(
        &mut self,
        block: BlockId,
        name: &str,
        value: FieldValue,
    ) -> Result<(), SessionError> {
        Ok(self.graph.set_field(&self.registry, block, name, value)?)
    }

    pub fn connect_statement(&mut self, parent: BlockId, child: BlockId) -> Result<(), SessionError> {
        self.graph.connect_statement(&self.registry, parent, child)?;
        self.check_achievements();
        Ok(())
    }

    pub fn connect_value(
        &mut self,
        parent: BlockId,
        socket: &str,
        child: BlockId,
    ) -> Result<(), SessionError> {
        self.graph
            .connect_value(&self.registry, parent, socket, child)?;
        self.check_achievements();
        Ok(())
    }

    pub fn disconnect_statement(&mut self, block: BlockId) -> Result<(), SessionError> {
        self.graph.disconnect_statement(block)?;
        self.check_achievements();
        Ok(())
    }

    /// Empty `socket`; returns the block that was in it.
    pub fn disconnect_value(
        &mut self,
        parent: BlockId,
        socket: &str,
    ) -> Result<Option<BlockId>, SessionError> {
        let child = self.graph.disconnect_value(parent, socket)?;
        self.check_achievements();
        Ok(child)
    }

    /// Delete `block` and every value block under it. Returns removed ids.
    pub fn delete_block(&mut self, block: BlockId) -> Result<Vec<BlockId>, SessionError> {
        let removed = self.graph.delete_block(block)?;
        self.check_achievements();
        Ok(removed)
    }

    /// Remove every block.
    pub fn clear(&mut self) {
        self.graph = ProgramGraph::new();
        debug!("graph cleared");
    }

    // ══════════════════════════════════════════════════════════════════════
    // Generate & run
    // ══════════════════════════════════════════════════════════════════════

    /// The program text for the current graph.
    pub fn generate(&self) -> Result<String, SessionError> {
        Ok(generate(
            &self.graph,
            &self.registry,
            &self.emitters,
            self.config.generate_options(),
        )?)
    }

    /// Generate and run the program against `host`.
    ///
    /// A runtime fault names the statement block whose line faulted.
    pub fn run(&self, host: &mut dyn HostApi) -> Result<RunReport, SessionError> {
        let (text, source_map) = generate_with_source_map(
            &self.graph,
            &self.registry,
            &self.emitters,
            self.config.generate_options(),
        )?;
        info!(lines = source_map.len(), "running program");
        run_with_limits(&text, host, self.config.run_limits()).map_err(|error| {
            let block = error.line().and_then(|line| source_map.block_at(line));
            SessionError::Execution { error, block }
        })
    }

    // ══════════════════════════════════════════════════════════════════════
    // Persistence & sharing
    // ══════════════════════════════════════════════════════════════════════

    pub fn document(&self) -> PortableDocument {
        to_portable(&self.graph)
    }

    /// Store the program under the configured key, replacing what was there.
    pub fn save(&mut self) -> Result<(), SessionError> {
        let doc = self.document();
        self.store.put(&self.config.storage_key, &doc.to_json())?;
        self.saved = Some(doc.fingerprint());
        info!(blocks = doc.blocks.len(), "program saved");
        Ok(())
    }

    /// Replace the graph with the saved program. Returns `false` if nothing
    /// is saved. On error the current graph is kept.
    pub fn load(&mut self) -> Result<bool, SessionError> {
        let Some(text) = self.store.get(&self.config.storage_key)? else {
            debug!("no saved program");
            return Ok(false);
        };
        let doc = PortableDocument::from_json(&text)?;
        self.replace_graph(&doc)?;
        info!(blocks = self.graph.len(), "program loaded");
        Ok(true)
    }

    /// `<share_base_url>#code=<payload>` for the current program.
    pub fn share_link(&self) -> String {
        share::encode_link(&self.config.share_base_url, &self.document())
    }

    /// Replace the graph with the program in a share link. On error the
    /// current graph is kept.
    pub fn load_shared(&mut self, link: &str) -> Result<(), SessionError> {
        let doc = share::decode_link(link)?;
        self.replace_graph(&doc)?;
        info!(blocks = self.graph.len(), "shared program loaded");
        Ok(())
    }

    /// Whether the graph differs from what was last saved or loaded.
    pub fn has_unsaved_changes(&self) -> bool {
        match &self.saved {
            Some(fingerprint) => *fingerprint != self.document().fingerprint(),
            None => !self.graph.is_empty(),
        }
    }

    fn replace_graph(&mut self, doc: &PortableDocument) -> Result<(), SessionError> {
        self.graph = from_portable(doc, &self.registry)?;
        self.saved = Some(doc.fingerprint());
        self.check_achievements();
        Ok(())
    }

    // ══════════════════════════════════════════════════════════════════════
    // Character, theme, tutorial
    // ══════════════════════════════════════════════════════════════════════

    pub fn select_character(&mut self, character: impl Into<String>) {
        self.character = Some(character.into());
        self.unlock(CHARACTER_SELECTED);
    }

    pub fn character(&self) -> Option<&str> {
        self.character.as_deref()
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    /// Switch between light and dark; returns the new theme.
    pub fn toggle_theme(&mut self) -> Theme {
        self.theme = self.theme.toggled();
        self.theme
    }

    pub fn tutorial_shown(&self) -> Result<bool, SessionError> {
        Ok(self.store.get(&self.config.tutorial_key)?.is_some())
    }

    pub fn mark_tutorial_shown(&mut self) -> Result<(), SessionError> {
        self.store.put(&self.config.tutorial_key, "true")?;
        Ok(())
    }

    // ══════════════════════════════════════════════════════════════════════
    // Achievements
    // ══════════════════════════════════════════════════════════════════════

    /// Every milestone unlocked so far, in unlock order.
    pub fn achievements(&self) -> &[String] {
        &self.unlocked
    }

    /// Milestones unlocked since the last call, for announcing once.
    pub fn take_new_achievements(&mut self) -> Vec<String> {
        let new = self.unlocked[self.announced_up_to..].to_vec();
        self.announced_up_to = self.unlocked.len();
        new
    }

    fn check_achievements(&mut self) {
        let stats = self.graph.stats(&self.registry);
        for id in achievements::evaluate(&stats, self.unlocked.as_slice()) {
            self.unlock(id);
        }
    }

    fn unlock(&mut self, id: &str) {
        if !self.unlocked.iter().any(|u| u == id) {
            info!(achievement = id, "achievement unlocked");
            self.unlocked.push(id.to_string());
        }
    }
}
